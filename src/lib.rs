//! # tscatalog
//!
//! Qt Linguist translation catalogs (`.ts` files) for Rust applications.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`i18n`] (`tscatalog-i18n`): catalog reader, lookup, plural rules and
//!   placeholder formatting
//! - [`conf`] (`tscatalog-conf`, feature `conf`): layered settings that
//!   locate the languages directory and pick the active locale
//!
//! ## Feature Flags
//!
//! - `conf` (default) - settings from defaults, a TOML/JSON file and
//!   `TSCATALOG_*` environment variables
//!
//! ## Quick Example
//!
//! ```rust
//! use tscatalog::prelude::*;
//!
//! let catalog = CatalogBuilder::new("da")
//!     .translation("ConfigureAudio", "Audio", "Lyd")
//!     .unwrap()
//!     .build();
//!
//! let mut context = TranslationContext::new("da", "en");
//! context.add_catalog("da", catalog).unwrap();
//!
//! assert_eq!(context.translate("ConfigureAudio", "Audio", None), "Lyd");
//! assert_eq!(context.translate("ConfigureAudio", "Mute", None), "Mute");
//! ```

pub use tscatalog_i18n as i18n;

#[cfg(feature = "conf")]
pub use tscatalog_conf as conf;

pub use tscatalog_i18n::{
	Catalog, CatalogBuilder, CatalogError, CatalogStats, Context, ContextError, LocalizedString,
	Location, LookupError, Message, PluralRule, Translation, TranslationContext,
	TranslationStatus, TsReader, UnfinishedPolicy, format, substitute_count,
};

#[cfg(feature = "conf")]
pub use tscatalog_conf::{Settings, SettingsBuilder, SettingsError, UnfinishedSetting};

/// Commonly used items
pub mod prelude {
	pub use crate::{
		Catalog, CatalogBuilder, CatalogError, LocalizedString, LookupError, Translation,
		TranslationContext, TranslationStatus, TsReader, UnfinishedPolicy, format,
	};

	#[cfg(feature = "conf")]
	pub use crate::Settings;
}
