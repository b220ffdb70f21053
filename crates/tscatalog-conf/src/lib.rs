//! # tscatalog Configuration
//!
//! Layered settings for locating and loading translation catalogs.
//!
//! ## Sources
//!
//! - **Defaults**: `dist/languages`, locale `en`, unfinished strings fall back
//! - **Config file**: TOML or JSON, chosen by extension
//! - **Environment**: `TSCATALOG_LANGUAGES_DIR`, `TSCATALOG_LOCALE`,
//!   `TSCATALOG_FALLBACK_LOCALE`, `TSCATALOG_UNFINISHED_POLICY`
//!
//! ## Quick Start
//!
//! ```rust
//! use tscatalog_conf::{Settings, SettingsBuilder};
//! use tscatalog_conf::settings::sources::DefaultSource;
//!
//! let settings = SettingsBuilder::new()
//!     .add_source(Settings::default_source().unwrap())
//!     .add_source(DefaultSource::new().with_value("locale", "da".into()))
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.locale, "da");
//! ```

pub mod settings;

pub use settings::{ENV_PREFIX, Settings, SettingsBuilder, SettingsError, UnfinishedSetting};
