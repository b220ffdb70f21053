//! Settings for loading translation catalogs
//!
//! Values are layered from [`sources`]: built-in defaults, then an optional
//! TOML or JSON file, then `TSCATALOG_*` environment variables.

pub mod sources;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tscatalog_i18n::{ContextError, TranslationContext, TsReader, UnfinishedPolicy};

use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, auto_source};

/// Prefix of environment variables read by [`Settings::load`]
pub const ENV_PREFIX: &str = "TSCATALOG_";

/// Errors raised while building settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Configuration source error: {0}")]
	Source(#[from] SourceError),

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Validation error: {0}")]
	ValidationError(String),
}

/// How unfinished translations are treated, as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnfinishedSetting {
	/// Show the source string
	#[default]
	Fallback,
	/// Show the draft translation when there is one
	Draft,
}

/// Catalog loading settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Directory holding one `<locale>.ts` file per language
	pub languages_dir: PathBuf,

	/// Locale to translate into
	pub locale: String,

	/// Locale tried when the active one has no translation
	pub fallback_locale: String,

	pub unfinished_policy: UnfinishedSetting,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			languages_dir: PathBuf::from("dist/languages"),
			locale: "en".to_string(),
			fallback_locale: "en".to_string(),
			unfinished_policy: UnfinishedSetting::Fallback,
		}
	}
}

impl Settings {
	/// Load defaults, then `config` if given, then `TSCATALOG_*` variables
	///
	/// A configured file that does not exist contributes nothing.
	pub fn load(config: Option<&Path>) -> Result<Self, SettingsError> {
		let mut builder = SettingsBuilder::new().add_source(Self::default_source()?);
		if let Some(path) = config {
			builder = builder.add_boxed_source(auto_source(path)?);
		}
		builder
			.add_source(EnvSource::new().with_prefix(ENV_PREFIX))
			.build()
	}

	/// The defaults as a lowest-priority source
	pub fn default_source() -> Result<DefaultSource, SettingsError> {
		let Value::Object(values) = serde_json::to_value(Self::default())? else {
			return Err(SettingsError::ValidationError(
				"default settings are not an object".to_string(),
			));
		};
		Ok(values
			.into_iter()
			.fold(DefaultSource::new(), |source, (key, value)| {
				source.with_value(key, value)
			}))
	}

	/// Check values that deserialize but cannot be used
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.locale.trim().is_empty() {
			return Err(SettingsError::ValidationError(
				"locale must not be empty".to_string(),
			));
		}
		if self.fallback_locale.trim().is_empty() {
			return Err(SettingsError::ValidationError(
				"fallback_locale must not be empty".to_string(),
			));
		}
		Ok(())
	}

	/// Policy handed to the catalog reader
	pub fn unfinished_policy(&self) -> UnfinishedPolicy {
		match self.unfinished_policy {
			UnfinishedSetting::Fallback => UnfinishedPolicy::FallbackToSource,
			UnfinishedSetting::Draft => UnfinishedPolicy::UseDraftTranslation,
		}
	}

	/// Reader configured with these settings
	pub fn reader(&self) -> TsReader {
		TsReader::new().unfinished_policy(self.unfinished_policy())
	}

	/// Load every catalog in [`Settings::languages_dir`]
	pub fn translation_context(&self) -> Result<TranslationContext, ContextError> {
		TranslationContext::new(&self.locale, &self.fallback_locale)
			.with_reader(self.reader())
			.load_dir(&self.languages_dir)
	}
}

/// Merges configuration sources into [`Settings`]
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source(self, source: impl ConfigSource + 'static) -> Self {
		self.add_boxed_source(Box::new(source))
	}

	pub fn add_boxed_source(mut self, source: Box<dyn ConfigSource>) -> Self {
		self.sources.push(source);
		self
	}

	/// Merge all sources, lowest priority first, and deserialize the result
	///
	/// Sources of equal priority apply in the order they were added.
	pub fn build(mut self) -> Result<Settings, SettingsError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = serde_json::Map::new();
		for source in &self.sources {
			let values = source.load()?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"applied configuration source"
			);
			merged.extend(values);
		}

		let settings: Settings = serde_json::from_value(Value::Object(merged))?;
		settings.validate()?;
		Ok(settings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::env;
	use std::fs;
	use tempfile::TempDir;

	struct EnvGuard(Vec<&'static str>);

	impl Drop for EnvGuard {
		fn drop(&mut self) {
			for key in &self.0 {
				// SAFETY: tests touching the environment are serialized
				unsafe { env::remove_var(key) };
			}
		}
	}

	fn set_env(vars: &[(&'static str, &'static str)]) -> EnvGuard {
		for (key, value) in vars {
			// SAFETY: tests touching the environment are serialized
			unsafe { env::set_var(key, value) };
		}
		EnvGuard(vars.iter().map(|(key, _)| *key).collect())
	}

	#[rstest]
	#[serial(env)]
	fn test_defaults() {
		// Act
		let settings = Settings::load(None).unwrap();

		// Assert
		assert_eq!(settings, Settings::default());
		assert_eq!(settings.unfinished_policy(), UnfinishedPolicy::FallbackToSource);
	}

	#[rstest]
	#[serial(env)]
	fn test_layering_env_over_file_over_defaults() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let config = dir.path().join("tscatalog.toml");
		fs::write(
			&config,
			"locale = \"da\"\nfallback_locale = \"nl\"\nunfinished_policy = \"draft\"\n",
		)
		.unwrap();
		let _env = set_env(&[("TSCATALOG_LOCALE", "pt_PT")]);

		// Act
		let settings = Settings::load(Some(config.as_path())).unwrap();

		// Assert
		assert_eq!(settings.locale, "pt_PT");
		assert_eq!(settings.fallback_locale, "nl");
		assert_eq!(settings.languages_dir, PathBuf::from("dist/languages"));
		assert_eq!(
			settings.unfinished_policy(),
			UnfinishedPolicy::UseDraftTranslation
		);
	}

	#[rstest]
	#[serial(env)]
	fn test_json_config() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let config = dir.path().join("tscatalog.json");
		fs::write(&config, r#"{"languages_dir": "/srv/languages"}"#).unwrap();

		// Act
		let settings = Settings::load(Some(config.as_path())).unwrap();

		// Assert
		assert_eq!(settings.languages_dir, PathBuf::from("/srv/languages"));
	}

	#[rstest]
	#[serial(env)]
	#[case("TSCATALOG_UNFINISHED_POLICY", "sometimes")]
	#[case("TSCATALOG_LOCALE", " ")]
	fn test_rejects_bad_values(#[case] key: &'static str, #[case] value: &'static str) {
		// Arrange
		let _env = set_env(&[(key, value)]);

		// Act
		let result = Settings::load(None);

		// Assert
		assert!(result.is_err());
	}

	#[rstest]
	fn test_builder_equal_priority_keeps_insertion_order() {
		// Act
		let settings = SettingsBuilder::new()
			.add_source(DefaultSource::new().with_value("locale", "da".into()))
			.add_source(DefaultSource::new().with_value("locale", "fr".into()))
			.build()
			.unwrap();

		// Assert
		assert_eq!(settings.locale, "fr");
	}

	#[rstest]
	fn test_translation_context_uses_languages_dir() {
		// Arrange
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("da.ts"),
			r#"<TS version="2.1" language="da"><context><name>ConfigureAudio</name>
<message><source>Audio</source><translation>Lyd</translation></message></context></TS>"#,
		)
		.unwrap();
		let settings = Settings {
			languages_dir: dir.path().to_path_buf(),
			locale: "da".to_string(),
			..Settings::default()
		};

		// Act
		let ctx = settings.translation_context().unwrap();

		// Assert
		assert_eq!(ctx.translate("ConfigureAudio", "Audio", None), "Lyd");
	}
}
