//! Configuration sources for layered settings
//!
//! Sources are merged in priority order: environment variables override
//! configuration files, which override built-in defaults.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load the key/value pairs provided by this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Priority of this source (higher wins)
	fn priority(&self) -> u8;

	/// Human-readable description, used in logs
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid source: {0}")]
	InvalidSource(String),
}

/// Environment variable source
///
/// Keys are lowercased after the prefix is removed, so `TSCATALOG_LOCALE`
/// provides `locale`. Values are kept as strings.
pub struct EnvSource {
	prefix: Option<String>,
}

impl EnvSource {
	/// Create a source reading every environment variable
	///
	/// # Examples
	///
	/// ```
	/// use tscatalog_conf::settings::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new().with_prefix("TSCATALOG_");
	/// assert_eq!(source.priority(), 100);
	/// ```
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Only read variables starting with `prefix`
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();

		for (key, value) in std::env::vars_os() {
			let (Some(key), Some(value)) = (key.to_str(), value.to_str()) else {
				continue;
			};
			let key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest,
					None => continue,
				},
				None => key,
			};
			if key.is_empty() {
				continue;
			}
			config.insert(key.to_lowercase(), Value::String(value.to_string()));
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

/// TOML file source; a missing file provides nothing
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		into_map(json_value)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// JSON file source; a missing file provides nothing
pub struct JsonFileSource {
	path: PathBuf,
}

impl JsonFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for JsonFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		into_map(serde_json::from_str(&content)?)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("JSON file: {}", self.path.display())
	}
}

/// Fixed values, lowest priority
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// Pick the file source matching the extension of `path`
pub fn auto_source(path: impl AsRef<Path>) -> Result<Box<dyn ConfigSource>, SourceError> {
	let path = path.as_ref();
	let ext = path
		.extension()
		.and_then(|e| e.to_str())
		.ok_or_else(|| SourceError::InvalidSource("No file extension".to_string()))?;

	match ext {
		"toml" => Ok(Box::new(TomlFileSource::new(path))),
		"json" => Ok(Box::new(JsonFileSource::new(path))),
		_ => Err(SourceError::InvalidSource(format!(
			"Unsupported file extension: {}",
			ext
		))),
	}
}

fn into_map(value: Value) -> Result<IndexMap<String, Value>, SourceError> {
	match value {
		Value::Object(map) => Ok(map.into_iter().collect()),
		_ => Err(SourceError::Parse("Expected object at root".to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::env;
	use tempfile::TempDir;

	#[rstest]
	#[serial(env)]
	fn test_env_source_strips_prefix() {
		// SAFETY: serialized with every other test touching the environment
		unsafe {
			env::set_var("TSCATALOG_TEST_LOCALE", "pt_PT");
			env::set_var("OTHER_TEST_LOCALE", "ja_JP");
		}

		let config = EnvSource::new().with_prefix("TSCATALOG_TEST_").load().unwrap();

		// SAFETY: see above
		unsafe {
			env::remove_var("TSCATALOG_TEST_LOCALE");
			env::remove_var("OTHER_TEST_LOCALE");
		}
		assert_eq!(config.get("locale"), Some(&Value::String("pt_PT".into())));
		assert!(!config.values().any(|v| v == "ja_JP"));
	}

	#[rstest]
	fn test_toml_source() {
		// Arrange
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("tscatalog.toml");
		fs::write(
			&path,
			"languages_dir = \"dist/languages\"\nlocale = \"da\"\n",
		)
		.unwrap();

		// Act
		let config = TomlFileSource::new(&path).load().unwrap();

		// Assert
		assert_eq!(config.get("locale"), Some(&Value::String("da".into())));
		assert_eq!(
			config.get("languages_dir"),
			Some(&Value::String("dist/languages".into()))
		);
	}

	#[rstest]
	fn test_json_source_rejects_non_object() {
		// Arrange
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("tscatalog.json");
		fs::write(&path, "[1, 2]").unwrap();

		// Act
		let result = JsonFileSource::new(&path).load();

		// Assert
		assert!(matches!(result, Err(SourceError::Parse(_))));
	}

	#[rstest]
	fn test_missing_file_is_empty() {
		assert!(TomlFileSource::new("no/such/tscatalog.toml").load().unwrap().is_empty());
	}

	#[rstest]
	#[case("tscatalog.toml", true)]
	#[case("tscatalog.json", true)]
	#[case("tscatalog.yaml", false)]
	#[case("tscatalog", false)]
	fn test_auto_source(#[case] path: &str, #[case] supported: bool) {
		assert_eq!(auto_source(path).is_ok(), supported);
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(EnvSource::new().priority(), 100);
		assert_eq!(TomlFileSource::new("test.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
	}
}
