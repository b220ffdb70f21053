//! Translation catalog loaded from a Qt Linguist `.ts` file
//!
//! A [`Catalog`] is built once and never mutated afterwards, so a shared
//! reference can be used from any number of threads without locking.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::format::{format, substitute_count};
use crate::plural::PluralRule;
use crate::ts_parser::TsReader;

/// Errors raised while loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("XML error at line {line}: {message}")]
	Xml { line: usize, message: String },
	#[error("Malformed catalog at line {line}: {message}")]
	Malformed { line: usize, message: String },
}

/// A lookup that matched no live message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
	#[error("no translation for {source_text:?} in context {context:?}")]
	NotFound {
		context: String,
		source_text: String,
		disambiguation: Option<String>,
	},
}

/// Translation state recorded in the `type` attribute of `<translation>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
	/// No `type` attribute: reviewed and complete
	#[default]
	Finished,
	/// `type="unfinished"`: missing or not yet reviewed
	Unfinished,
	/// `type="vanished"`: the source string no longer exists in the UI
	Vanished,
	/// `type="obsolete"`: kept for reference by the translation tool
	Obsolete,
}

impl TranslationStatus {
	/// Parse the `type` attribute value
	pub fn from_type_attr(value: Option<&str>) -> Option<Self> {
		match value {
			None | Some("") => Some(Self::Finished),
			Some("unfinished") => Some(Self::Unfinished),
			Some("vanished") => Some(Self::Vanished),
			Some("obsolete") => Some(Self::Obsolete),
			Some(_) => None,
		}
	}

	/// Whether messages with this status take part in lookups
	pub fn is_live(self) -> bool {
		matches!(self, Self::Finished | Self::Unfinished)
	}
}

/// How lookups treat messages marked unfinished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnfinishedPolicy {
	/// Resolve to the source string
	#[default]
	FallbackToSource,
	/// Use the draft translation when it is not empty
	UseDraftTranslation,
}

/// Where a message was extracted from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
	pub filename: String,
	pub line: Option<u32>,
}

/// Translated text of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
	/// A plain translation
	Single(String),
	/// One entry per plural category, ordered by [`PluralRule::form_index`]
	Numerus(Vec<String>),
}

impl Translation {
	/// Whether no usable text was provided
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Single(text) => text.is_empty(),
			Self::Numerus(forms) => forms.iter().all(String::is_empty),
		}
	}
}

impl Default for Translation {
	fn default() -> Self {
		Self::Single(String::new())
	}
}

/// One translatable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
	source: String,
	comment: Option<String>,
	extra_comment: Option<String>,
	translator_comment: Option<String>,
	locations: Vec<Location>,
	status: TranslationStatus,
	translation: Translation,
}

impl Message {
	/// Create a finished message
	pub fn new(source: impl Into<String>, translation: Translation) -> Self {
		Self {
			source: source.into(),
			comment: None,
			extra_comment: None,
			translator_comment: None,
			locations: Vec::new(),
			status: TranslationStatus::Finished,
			translation,
		}
	}

	/// Set the disambiguating comment
	pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
		self.comment = Some(comment.into());
		self
	}

	/// Set the developer note shown to translators
	pub fn with_extra_comment(mut self, comment: impl Into<String>) -> Self {
		self.extra_comment = Some(comment.into());
		self
	}

	/// Set the translator's own note
	pub fn with_translator_comment(mut self, comment: impl Into<String>) -> Self {
		self.translator_comment = Some(comment.into());
		self
	}

	/// Set the translation status
	pub fn with_status(mut self, status: TranslationStatus) -> Self {
		self.status = status;
		self
	}

	/// Append a provenance location
	pub fn with_location(mut self, filename: impl Into<String>, line: Option<u32>) -> Self {
		self.locations.push(Location {
			filename: filename.into(),
			line,
		});
		self
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	/// The disambiguator, if any
	pub fn comment(&self) -> Option<&str> {
		self.comment.as_deref()
	}

	pub fn extra_comment(&self) -> Option<&str> {
		self.extra_comment.as_deref()
	}

	pub fn translator_comment(&self) -> Option<&str> {
		self.translator_comment.as_deref()
	}

	pub fn locations(&self) -> &[Location] {
		&self.locations
	}

	pub fn status(&self) -> TranslationStatus {
		self.status
	}

	pub fn translation(&self) -> &Translation {
		&self.translation
	}

	/// Whether this message carries plural forms
	pub fn is_numerus(&self) -> bool {
		matches!(self.translation, Translation::Numerus(_))
	}
}

/// Messages sharing one context name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
	name: String,
	messages: Vec<Message>,
	by_source: HashMap<String, Vec<usize>>,
}

impl Context {
	pub(crate) fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			messages: Vec::new(),
			by_source: HashMap::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Messages in file order
	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	/// Find the message with this exact source and disambiguator
	pub fn find(&self, source: &str, disambiguation: Option<&str>) -> Option<&Message> {
		self.by_source
			.get(source)?
			.iter()
			.map(|&i| &self.messages[i])
			.find(|m| m.comment() == disambiguation)
	}

	/// Append a message, rejecting a repeated (source, comment) pair
	pub(crate) fn push(&mut self, message: Message) -> Result<(), Message> {
		if self.find(&message.source, message.comment()).is_some() {
			return Err(message);
		}
		let index = self.messages.len();
		self.by_source
			.entry(message.source.clone())
			.or_default()
			.push(index);
		self.messages.push(message);
		Ok(())
	}
}

/// Message counts of a catalog, as reported by the release tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogStats {
	pub contexts: usize,
	pub messages: usize,
	pub finished: usize,
	pub unfinished: usize,
	pub vanished: usize,
	pub obsolete: usize,
	pub numerus: usize,
}

impl CatalogStats {
	/// Share of live messages that are finished, in percent
	pub fn completion(&self) -> f64 {
		let live = self.finished + self.unfinished;
		if live == 0 {
			return 100.0;
		}
		self.finished as f64 * 100.0 / live as f64
	}
}

/// Immutable translation catalog for one target language
///
/// # Example
/// ```
/// use tscatalog_i18n::Catalog;
///
/// let catalog = Catalog::from_str(r#"<?xml version="1.0" encoding="utf-8"?>
/// <!DOCTYPE TS>
/// <TS version="2.1" language="da" sourcelanguage="en_US">
/// <context>
///     <name>ConfigureAudio</name>
///     <message>
///         <location filename="../../src/yuzu/configuration/configure_audio.ui" line="14"/>
///         <source>Audio</source>
///         <translation>Lyd</translation>
///     </message>
/// </context>
/// </TS>"#).unwrap();
///
/// let audio = catalog.lookup("ConfigureAudio", "Audio", None).unwrap();
/// assert_eq!(audio.as_str(), "Lyd");
/// assert!(catalog.lookup("ConfigureAudio", "Video", None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
	version: Option<String>,
	language: Option<String>,
	source_language: Option<String>,
	contexts: Vec<Context>,
	by_name: HashMap<String, usize>,
	plural_rule: PluralRule,
	unfinished_policy: UnfinishedPolicy,
}

impl Catalog {
	pub(crate) fn empty(plural_rule: PluralRule, unfinished_policy: UnfinishedPolicy) -> Self {
		Self {
			version: None,
			language: None,
			source_language: None,
			contexts: Vec::new(),
			by_name: HashMap::new(),
			plural_rule,
			unfinished_policy,
		}
	}

	pub(crate) fn set_header(
		&mut self,
		version: Option<String>,
		language: Option<String>,
		source_language: Option<String>,
	) {
		if let Some(language) = &language {
			self.plural_rule = PluralRule::for_locale(language);
		}
		self.version = version;
		self.language = language;
		self.source_language = source_language;
	}

	/// The context with this name, created at the end of the catalog if absent
	pub(crate) fn context_entry(&mut self, name: &str) -> &mut Context {
		let index = match self.by_name.get(name) {
			Some(&index) => index,
			None => {
				let index = self.contexts.len();
				self.contexts.push(Context::new(name));
				self.by_name.insert(name.to_string(), index);
				index
			}
		};
		&mut self.contexts[index]
	}

	/// Load a catalog from TS XML text with default reader options
	#[allow(clippy::should_implement_trait)]
	pub fn from_str(input: &str) -> Result<Self, CatalogError> {
		TsReader::new().read_str(input)
	}

	/// Load a catalog from a reader with default reader options
	pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, CatalogError> {
		TsReader::new().read(reader)
	}

	/// Load a catalog from a `.ts` file with default reader options
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
		TsReader::new().read_path(path)
	}

	/// `version` attribute of the `<TS>` element
	pub fn version(&self) -> Option<&str> {
		self.version.as_deref()
	}

	/// Target language from the `<TS>` element
	pub fn language(&self) -> Option<&str> {
		self.language.as_deref()
	}

	pub fn source_language(&self) -> Option<&str> {
		self.source_language.as_deref()
	}

	pub fn plural_rule(&self) -> PluralRule {
		self.plural_rule
	}

	pub fn unfinished_policy(&self) -> UnfinishedPolicy {
		self.unfinished_policy
	}

	/// Contexts in file order
	pub fn contexts(&self) -> &[Context] {
		&self.contexts
	}

	pub fn context(&self, name: &str) -> Option<&Context> {
		self.by_name.get(name).map(|&i| &self.contexts[i])
	}

	/// All messages of all contexts, paired with their context name
	pub fn messages(&self) -> impl Iterator<Item = (&str, &Message)> {
		self.contexts
			.iter()
			.flat_map(|c| c.messages.iter().map(move |m| (c.name(), m)))
	}

	/// Resolve a message by exact context, source and disambiguator
	///
	/// Unfinished messages resolve to their source string under
	/// [`UnfinishedPolicy::FallbackToSource`], and finished messages with an
	/// empty translation always do. Vanished and obsolete messages are not
	/// matched.
	pub fn lookup(
		&self,
		context: &str,
		source: &str,
		disambiguation: Option<&str>,
	) -> Result<LocalizedString<'_>, LookupError> {
		let message = self
			.context(context)
			.and_then(|c| c.find(source, disambiguation))
			.filter(|m| m.status.is_live())
			.ok_or_else(|| LookupError::NotFound {
				context: context.to_string(),
				source_text: source.to_string(),
				disambiguation: disambiguation.map(str::to_string),
			})?;

		let fallback = message.translation.is_empty()
			|| (message.status == TranslationStatus::Unfinished
				&& self.unfinished_policy == UnfinishedPolicy::FallbackToSource);

		Ok(LocalizedString {
			message,
			plural_rule: self.plural_rule,
			fallback,
		})
	}

	/// Count messages by status
	pub fn stats(&self) -> CatalogStats {
		let mut stats = CatalogStats {
			contexts: self.contexts.len(),
			..Default::default()
		};
		for (_, message) in self.messages() {
			stats.messages += 1;
			if message.is_numerus() {
				stats.numerus += 1;
			}
			match message.status {
				TranslationStatus::Finished => stats.finished += 1,
				TranslationStatus::Unfinished => stats.unfinished += 1,
				TranslationStatus::Vanished => stats.vanished += 1,
				TranslationStatus::Obsolete => stats.obsolete += 1,
			}
		}
		stats
	}
}

/// Result of a successful lookup
///
/// Borrows from the catalog; either the translation or, when the catalog has
/// no usable one, the source string.
#[derive(Debug, Clone, Copy)]
pub struct LocalizedString<'a> {
	message: &'a Message,
	plural_rule: PluralRule,
	fallback: bool,
}

impl<'a> LocalizedString<'a> {
	/// The resolved text, with placeholders still in place
	///
	/// For numerus messages this is the first plural form.
	pub fn as_str(&self) -> &'a str {
		let message = self.message;
		self.first_text().unwrap_or(&message.source)
	}

	/// Whether [`LocalizedString::as_str`] returns the source string in place
	/// of a translation
	pub fn is_fallback(&self) -> bool {
		self.first_text().is_none()
	}

	/// The matched message
	pub fn message(&self) -> &'a Message {
		self.message
	}

	/// Select the plural form for `count` and substitute `%n`
	///
	/// A missing or empty form resolves to the source string.
	pub fn plural_form(&self, count: u64) -> String {
		self.plural_form_opt(count)
			.unwrap_or_else(|| substitute_count(&self.message.source, count))
	}

	/// Like [`LocalizedString::plural_form`], but `None` when the catalog has
	/// no usable text for `count`
	pub fn plural_form_opt(&self, count: u64) -> Option<String> {
		if self.fallback {
			return None;
		}
		let text = match &self.message.translation {
			Translation::Single(text) => text.as_str(),
			Translation::Numerus(forms) => forms
				.get(self.plural_rule.form_index(count))
				.filter(|f| !f.is_empty())?
				.as_str(),
		};
		Some(substitute_count(text, count))
	}

	fn first_text(&self) -> Option<&'a str> {
		if self.fallback {
			return None;
		}
		match &self.message.translation {
			Translation::Single(text) => Some(text.as_str()),
			Translation::Numerus(forms) => forms
				.first()
				.filter(|f| !f.is_empty())
				.map(String::as_str),
		}
	}

	/// Substitute positional arguments into [`LocalizedString::as_str`]
	pub fn format<S: AsRef<str>>(&self, args: &[S]) -> String {
		format(self.as_str(), args)
	}
}

impl fmt::Display for LocalizedString<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Builder for catalogs assembled in code
///
/// # Example
/// ```
/// use tscatalog_i18n::CatalogBuilder;
///
/// let catalog = CatalogBuilder::new("de")
///     .translation("menu", "File", "Datei")
///     .unwrap()
///     .build();
/// assert_eq!(catalog.lookup("menu", "File", None).unwrap().as_str(), "Datei");
/// ```
#[derive(Debug)]
pub struct CatalogBuilder {
	catalog: Catalog,
}

impl CatalogBuilder {
	/// Start a catalog for `language`
	pub fn new(language: &str) -> Self {
		let mut catalog = Catalog::empty(
			PluralRule::for_locale(language),
			UnfinishedPolicy::default(),
		);
		catalog.set_header(Some("2.1".to_string()), Some(language.to_string()), None);
		Self { catalog }
	}

	/// Set how unfinished messages resolve
	pub fn unfinished_policy(mut self, policy: UnfinishedPolicy) -> Self {
		self.catalog.unfinished_policy = policy;
		self
	}

	/// Add a message to `context`
	pub fn message(mut self, context: &str, message: Message) -> Result<Self, CatalogError> {
		if context.is_empty() || message.source.is_empty() {
			return Err(CatalogError::Malformed {
				line: 0,
				message: "context name and source must not be empty".to_string(),
			});
		}
		self.catalog
			.context_entry(context)
			.push(message)
			.map_err(|m| duplicate_error(context, &m, 0))?;
		Ok(self)
	}

	/// Add a finished single translation
	pub fn translation(
		self,
		context: &str,
		source: &str,
		translation: &str,
	) -> Result<Self, CatalogError> {
		self.message(
			context,
			Message::new(source, Translation::Single(translation.to_string())),
		)
	}

	/// Add a finished numerus message
	pub fn plural(self, context: &str, source: &str, forms: &[&str]) -> Result<Self, CatalogError> {
		self.message(
			context,
			Message::new(
				source,
				Translation::Numerus(forms.iter().map(|f| f.to_string()).collect()),
			),
		)
	}

	pub fn build(self) -> Catalog {
		self.catalog
	}
}

pub(crate) fn duplicate_error(context: &str, message: &Message, line: usize) -> CatalogError {
	CatalogError::Malformed {
		line,
		message: match message.comment() {
			Some(comment) => format!(
				"duplicate message {:?} (comment {:?}) in context {:?}",
				message.source, comment, context
			),
			None => format!(
				"duplicate message {:?} in context {:?}",
				message.source, context
			),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn danish() -> Catalog {
		CatalogBuilder::new("da")
			.translation("ConfigureAudio", "Audio", "Lyd")
			.unwrap()
			.message(
				"ConfigureGraphics",
				Message::new("Resolution:", Translation::Single(String::new()))
					.with_status(TranslationStatus::Unfinished),
			)
			.unwrap()
			.message(
				"ConfigureTouchFromButton",
				Message::new("X", Translation::Single("X-akse".into())).with_comment("X axis"),
			)
			.unwrap()
			.translation("ConfigureTouchFromButton", "X", "X")
			.unwrap()
			.plural("GMainWindow", "%n file(s) remaining", &["%n fil tilbage", "%n filer tilbage"])
			.unwrap()
			.message(
				"GMainWindow",
				Message::new("Old text", Translation::Single("Gammel tekst".into()))
					.with_status(TranslationStatus::Vanished),
			)
			.unwrap()
			.build()
	}

	#[rstest]
	fn test_lookup_finished_translation(danish: Catalog) {
		// Act
		let result = danish.lookup("ConfigureAudio", "Audio", None).unwrap();

		// Assert
		assert_eq!(result.as_str(), "Lyd");
		assert!(!result.is_fallback());
	}

	#[rstest]
	fn test_lookup_unfinished_falls_back_to_source(danish: Catalog) {
		// Act
		let result = danish
			.lookup("ConfigureGraphics", "Resolution:", None)
			.unwrap();

		// Assert
		assert_eq!(result.as_str(), "Resolution:");
		assert!(result.is_fallback());
	}

	#[rstest]
	fn test_lookup_unfinished_draft_policy() {
		// Arrange
		let catalog = CatalogBuilder::new("fr")
			.unfinished_policy(UnfinishedPolicy::UseDraftTranslation)
			.message(
				"GMainWindow",
				Message::new("Install", Translation::Single("Installer".into()))
					.with_status(TranslationStatus::Unfinished),
			)
			.unwrap()
			.build();

		// Act
		let result = catalog.lookup("GMainWindow", "Install", None).unwrap();

		// Assert
		assert_eq!(result.as_str(), "Installer");
		assert!(!result.is_fallback());
	}

	#[rstest]
	fn test_lookup_disambiguation(danish: Catalog) {
		// Act
		let with_comment = danish
			.lookup("ConfigureTouchFromButton", "X", Some("X axis"))
			.unwrap();
		let without_comment = danish
			.lookup("ConfigureTouchFromButton", "X", None)
			.unwrap();
		let wrong_comment = danish.lookup("ConfigureTouchFromButton", "X", Some("Y axis"));

		// Assert
		assert_eq!(with_comment.as_str(), "X-akse");
		assert_eq!(without_comment.as_str(), "X");
		assert!(wrong_comment.is_err());
	}

	#[rstest]
	fn test_lookup_missing_returns_not_found(danish: Catalog) {
		// Act
		let missing_source = danish.lookup("ConfigureAudio", "Volume:", None);
		let missing_context = danish.lookup("NoSuchDialog", "Audio", None);

		// Assert
		assert_eq!(
			missing_source.unwrap_err(),
			LookupError::NotFound {
				context: "ConfigureAudio".into(),
				source_text: "Volume:".into(),
				disambiguation: None,
			}
		);
		assert!(missing_context.is_err());
	}

	#[rstest]
	fn test_lookup_skips_vanished(danish: Catalog) {
		// Act
		let result = danish.lookup("GMainWindow", "Old text", None);

		// Assert
		assert!(result.is_err());
	}

	#[rstest]
	fn test_lookup_is_idempotent(danish: Catalog) {
		// Act
		let first = danish.lookup("ConfigureAudio", "Audio", None).unwrap().to_string();
		let second = danish.lookup("ConfigureAudio", "Audio", None).unwrap().to_string();

		// Assert
		assert_eq!(first, second);
	}

	#[rstest]
	#[case(1, "1 fil tilbage")]
	#[case(0, "0 filer tilbage")]
	#[case(12, "12 filer tilbage")]
	fn test_plural_form(danish: Catalog, #[case] count: u64, #[case] expected: &str) {
		// Arrange
		let result = danish
			.lookup("GMainWindow", "%n file(s) remaining", None)
			.unwrap();

		// Act
		let text = result.plural_form(count);

		// Assert
		assert_eq!(text, expected);
	}

	#[rstest]
	fn test_plural_form_missing_form_uses_source() {
		// Arrange
		let catalog = CatalogBuilder::new("ru")
			.plural("Main", "%n shader(s)", &["%n шейдер", "%n шейдера"])
			.unwrap()
			.build();
		let result = catalog.lookup("Main", "%n shader(s)", None).unwrap();

		// Act
		let many = result.plural_form(5);
		let few = result.plural_form(3);

		// Assert
		assert_eq!(many, "5 shader(s)");
		assert_eq!(few, "3 шейдера");
	}

	#[rstest]
	fn test_empty_first_form_is_fallback() {
		// Arrange
		let catalog = CatalogBuilder::new("da")
			.plural("GMainWindow", "%n file(s)", &["", "%n filer"])
			.unwrap()
			.build();

		// Act
		let result = catalog.lookup("GMainWindow", "%n file(s)", None).unwrap();

		// Assert
		assert_eq!(result.as_str(), "%n file(s)");
		assert!(result.is_fallback());
		assert_eq!(result.plural_form_opt(1), None);
		assert_eq!(result.plural_form_opt(4).as_deref(), Some("4 filer"));
		assert_eq!(result.plural_form(1), "1 file(s)");
	}

	#[rstest]
	fn test_stats(danish: Catalog) {
		// Act
		let stats = danish.stats();

		// Assert
		assert_eq!(stats.contexts, 4);
		assert_eq!(stats.messages, 6);
		assert_eq!(stats.finished, 4);
		assert_eq!(stats.unfinished, 1);
		assert_eq!(stats.vanished, 1);
		assert_eq!(stats.numerus, 1);
		assert!((stats.completion() - 80.0).abs() < f64::EPSILON);
	}

	#[rstest]
	fn test_builder_rejects_duplicate_message() {
		// Act
		let result = CatalogBuilder::new("da")
			.translation("ConfigureAudio", "Audio", "Lyd")
			.unwrap()
			.translation("ConfigureAudio", "Audio", "Lyd igen");

		// Assert
		assert!(matches!(result, Err(CatalogError::Malformed { .. })));
	}
}
