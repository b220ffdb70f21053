//! # tscatalog i18n
//!
//! Loader and lookup engine for Qt Linguist translation catalogs (`.ts` files).
//!
//! ## Features
//!
//! - **Streaming TS reader**: contexts, messages, locations, numerus forms and
//!   length variants, with entity decoding
//! - **Exact lookup**: by context, source string and optional disambiguating comment
//! - **Fallback**: unfinished or empty translations resolve to the source string
//! - **Plural rules**: numerus form selection for the catalog's target language
//! - **Placeholders**: Qt-style `%1`..`%99`, `%L1` and `%n` substitution
//! - **Locale chains**: [`TranslationContext`] walks active and fallback locales
//!
//! ## Quick Start
//!
//! ```rust
//! use tscatalog_i18n::Catalog;
//!
//! let catalog = Catalog::from_str(r#"<TS version="2.1" language="da">
//! <context>
//!     <name>GMainWindow</name>
//!     <message>
//!         <source>Scale: %1x</source>
//!         <translation>Skala: %1x</translation>
//!     </message>
//! </context>
//! </TS>"#).unwrap();
//!
//! let scale = catalog.lookup("GMainWindow", "Scale: %1x", None).unwrap();
//! assert_eq!(scale.format(&["2"]), "Skala: 2x");
//! ```
//!
//! ## Module Organization
//!
//! - [`catalog`]: catalog model, lookup and builder
//! - [`ts_parser`]: `.ts` XML reader
//! - [`plural`]: plural rules
//! - [`format`]: placeholder parsing and substitution
//! - [`context`]: multi-locale resolution

pub mod catalog;
pub mod context;
pub mod format;
pub mod plural;
pub mod ts_parser;

pub use catalog::{
	Catalog, CatalogBuilder, CatalogError, CatalogStats, Context, LocalizedString, Location,
	LookupError, Message, Translation, TranslationStatus, UnfinishedPolicy,
};
pub use context::{ContextError, TranslationContext};
pub use format::{Segment, Template, format, substitute_count};
pub use plural::PluralRule;
pub use ts_parser::TsReader;
