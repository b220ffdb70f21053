//! Catalogs for several locales, resolved through a fallback chain
//!
//! A [`TranslationContext`] owns one [`Catalog`] per locale and answers
//! lookups by walking from the active locale to the fallback locale. It is
//! read-only once built, so it can be shared across threads behind an `Arc`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, CatalogError, LocalizedString};
use crate::format::substitute_count;
use crate::ts_parser::TsReader;

/// Errors raised while assembling a translation context
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
	#[error("Invalid locale: {0:?}")]
	InvalidLocale(String),
	#[error("A catalog for locale {0} is already loaded")]
	DuplicateLocale(String),
	#[error("Failed to load {}: {source}", .path.display())]
	Catalog {
		path: PathBuf,
		#[source]
		source: CatalogError,
	},
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Catalogs keyed by locale with active/fallback resolution
///
/// # Example
/// ```
/// use tscatalog_i18n::{CatalogBuilder, TranslationContext};
///
/// let mut ctx = TranslationContext::new("pt_PT", "en");
/// ctx.add_catalog(
///     "pt",
///     CatalogBuilder::new("pt").translation("GameList", "Name", "Nome").unwrap().build(),
/// )
/// .unwrap();
///
/// assert_eq!(ctx.translate("GameList", "Name", None), "Nome");
/// assert_eq!(ctx.translate("GameList", "Size", None), "Size");
/// ```
#[derive(Debug, Clone)]
pub struct TranslationContext {
	active: String,
	fallback: String,
	reader: TsReader,
	catalogs: HashMap<String, Catalog>,
}

impl TranslationContext {
	/// Create an empty context
	///
	/// Locale tags are compared with `-` and `_` treated alike.
	pub fn new(active_locale: &str, fallback_locale: &str) -> Self {
		Self {
			active: normalize_locale(active_locale),
			fallback: normalize_locale(fallback_locale),
			reader: TsReader::new(),
			catalogs: HashMap::new(),
		}
	}

	/// Reader options used by [`TranslationContext::load_dir`]
	pub fn with_reader(mut self, reader: TsReader) -> Self {
		self.reader = reader;
		self
	}

	pub fn active_locale(&self) -> &str {
		&self.active
	}

	pub fn fallback_locale(&self) -> &str {
		&self.fallback
	}

	/// Register the catalog for `locale`
	pub fn add_catalog(&mut self, locale: &str, catalog: Catalog) -> Result<(), ContextError> {
		validate_locale(locale)?;
		let locale = normalize_locale(locale);
		if self.catalogs.contains_key(&locale) {
			return Err(ContextError::DuplicateLocale(locale));
		}
		self.catalogs.insert(locale, catalog);
		Ok(())
	}

	/// Load every `*.ts` file in `dir`, keyed by file stem (`da.ts` is `da`)
	///
	/// Other directory entries are skipped with a warning. The first file that
	/// fails to load aborts the whole operation.
	pub fn load_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, ContextError> {
		let dir = dir.as_ref();
		let mut paths = std::fs::read_dir(dir)?
			.map(|entry| entry.map(|e| e.path()))
			.collect::<Result<Vec<_>, _>>()?;
		paths.sort();

		let mut loaded = 0;
		for path in paths {
			let is_catalog =
				path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("ts");
			if !is_catalog {
				tracing::warn!(path = %path.display(), "skipping entry in languages directory");
				continue;
			}

			let locale = path
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or_default()
				.to_string();
			validate_locale(&locale)?;

			let catalog = self
				.reader
				.clone()
				.default_language(locale.clone())
				.read_path(&path)
				.map_err(|source| ContextError::Catalog {
					path: path.clone(),
					source,
				})?;
			self.add_catalog(&locale, catalog)?;
			loaded += 1;
		}

		tracing::info!(
			dir = %dir.display(),
			catalogs = loaded,
			active = %self.active,
			fallback = %self.fallback,
			"loaded translation catalogs"
		);
		Ok(self)
	}

	/// Loaded locales, sorted
	pub fn available_locales(&self) -> Vec<&str> {
		let mut locales: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
		locales.sort_unstable();
		locales
	}

	pub fn catalog(&self, locale: &str) -> Option<&Catalog> {
		self.catalogs.get(&normalize_locale(locale))
	}

	/// Translate `source`, falling back to the source string itself
	///
	/// Tries the active locale, its language, the fallback locale and its
	/// language, in that order. Entries that would resolve to their own source
	/// (unfinished or empty) do not stop the walk.
	pub fn translate<'a>(
		&'a self,
		context: &str,
		source: &'a str,
		disambiguation: Option<&str>,
	) -> Cow<'a, str> {
		match self.resolve(context, source, disambiguation) {
			Some(found) => Cow::Borrowed(found.as_str()),
			None => Cow::Borrowed(source),
		}
	}

	/// Translate a numerus message and substitute `%n` with `count`
	///
	/// A catalog whose form for `count` is missing or empty does not stop the
	/// walk.
	pub fn translate_plural(
		&self,
		context: &str,
		source: &str,
		disambiguation: Option<&str>,
		count: u64,
	) -> String {
		self.lookups(context, source, disambiguation)
			.find_map(|found| found.plural_form_opt(count))
			.unwrap_or_else(|| substitute_count(source, count))
	}

	fn resolve(
		&self,
		context: &str,
		source: &str,
		disambiguation: Option<&str>,
	) -> Option<LocalizedString<'_>> {
		self.lookups(context, source, disambiguation)
			.find(|found| !found.is_fallback())
	}

	/// Matching messages along the locale chain
	fn lookups<'s>(
		&'s self,
		context: &str,
		source: &str,
		disambiguation: Option<&str>,
	) -> impl Iterator<Item = LocalizedString<'s>> {
		self.chain()
			.into_iter()
			.filter_map(move |locale| self.catalogs.get(locale))
			.filter_map(move |catalog| catalog.lookup(context, source, disambiguation).ok())
	}

	/// Locales to try, most specific first, without repeats
	fn chain(&self) -> Vec<&str> {
		let mut chain: Vec<&str> = Vec::with_capacity(4);
		for locale in [
			self.active.as_str(),
			language_of(&self.active),
			self.fallback.as_str(),
			language_of(&self.fallback),
		] {
			if !locale.is_empty() && !chain.contains(&locale) {
				chain.push(locale);
			}
		}
		chain
	}
}

fn normalize_locale(locale: &str) -> String {
	locale.trim().replace('-', "_")
}

fn language_of(locale: &str) -> &str {
	locale.split('_').next().unwrap_or(locale)
}

fn validate_locale(locale: &str) -> Result<(), ContextError> {
	let valid = !locale.trim().is_empty()
		&& locale
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '@'));
	if valid {
		Ok(())
	} else {
		Err(ContextError::InvalidLocale(locale.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{CatalogBuilder, Message, Translation, TranslationStatus};
	use rstest::{fixture, rstest};

	#[fixture]
	fn portuguese() -> TranslationContext {
		let mut ctx = TranslationContext::new("pt-PT", "en");
		ctx.add_catalog(
			"pt_PT",
			CatalogBuilder::new("pt_PT")
				.translation("GameList", "Name", "Nome")
				.unwrap()
				.message(
					"GameList",
					Message::new("Compatibility", Translation::Single("Compat".into()))
						.with_status(TranslationStatus::Unfinished),
				)
				.unwrap()
				.build(),
		)
		.unwrap();
		ctx.add_catalog(
			"pt",
			CatalogBuilder::new("pt")
				.translation("GameList", "Compatibility", "Compatibilidade")
				.unwrap()
				.plural("GameList", "%n game(s)", &["%n jogo", "%n jogos"])
				.unwrap()
				.build(),
		)
		.unwrap();
		ctx.add_catalog(
			"en",
			CatalogBuilder::new("en")
				.translation("GameList", "Add-ons", "Add-ons and DLC")
				.unwrap()
				.build(),
		)
		.unwrap();
		ctx
	}

	#[rstest]
	#[case("Name", "Nome")]
	#[case("Compatibility", "Compatibilidade")]
	#[case("Add-ons", "Add-ons and DLC")]
	#[case("File type", "File type")]
	fn test_translate_walks_chain(
		portuguese: TranslationContext,
		#[case] source: &str,
		#[case] expected: &str,
	) {
		// Act
		let result = portuguese.translate("GameList", source, None);

		// Assert
		assert_eq!(result, expected);
	}

	#[rstest]
	#[case(1, "1 jogo")]
	#[case(4, "4 jogos")]
	fn test_translate_plural(
		portuguese: TranslationContext,
		#[case] count: u64,
		#[case] expected: &str,
	) {
		// Act
		let result = portuguese.translate_plural("GameList", "%n game(s)", None, count);

		// Assert
		assert_eq!(result, expected);
	}

	#[rstest]
	fn test_translate_plural_untranslated_substitutes_count(portuguese: TranslationContext) {
		// Act
		let result = portuguese.translate_plural("GameList", "%n file(s)", None, 3);

		// Assert
		assert_eq!(result, "3 file(s)");
	}

	#[rstest]
	fn test_available_locales_sorted(portuguese: TranslationContext) {
		assert_eq!(portuguese.available_locales(), vec!["en", "pt", "pt_PT"]);
		assert!(portuguese.catalog("pt-PT").is_some());
	}

	#[rstest]
	fn test_add_catalog_rejects_duplicate(mut portuguese: TranslationContext) {
		// Act
		let result = portuguese.add_catalog("pt-PT", CatalogBuilder::new("pt_PT").build());

		// Assert
		assert!(matches!(result, Err(ContextError::DuplicateLocale(l)) if l == "pt_PT"));
	}

	#[rstest]
	#[case("")]
	#[case("  ")]
	#[case("da/../x")]
	#[case("zh TW")]
	fn test_add_catalog_rejects_invalid_locale(#[case] locale: &str) {
		// Arrange
		let mut ctx = TranslationContext::new("da", "en");

		// Act
		let result = ctx.add_catalog(locale, CatalogBuilder::new("da").build());

		// Assert
		assert!(matches!(result, Err(ContextError::InvalidLocale(_))));
	}

	#[fixture]
	fn danish_over_dutch() -> TranslationContext {
		let mut ctx = TranslationContext::new("da", "nl");
		ctx.add_catalog(
			"da",
			CatalogBuilder::new("da")
				.plural("GMainWindow", "%n file(s)", &["%n fil"])
				.unwrap()
				.plural("GMainWindow", "%n shader(s)", &["", "%n shadere"])
				.unwrap()
				.build(),
		)
		.unwrap();
		ctx.add_catalog(
			"nl",
			CatalogBuilder::new("nl")
				.plural("GMainWindow", "%n file(s)", &["%n bestand", "%n bestanden"])
				.unwrap()
				.plural("GMainWindow", "%n shader(s)", &["%n shader", "%n shaders"])
				.unwrap()
				.build(),
		)
		.unwrap();
		ctx
	}

	#[rstest]
	#[case("%n file(s)", 1, "1 fil")]
	#[case("%n file(s)", 5, "5 bestanden")]
	#[case("%n shader(s)", 1, "1 shader")]
	#[case("%n shader(s)", 3, "3 shadere")]
	fn test_translate_plural_skips_missing_forms(
		danish_over_dutch: TranslationContext,
		#[case] source: &str,
		#[case] count: u64,
		#[case] expected: &str,
	) {
		// Act
		let result = danish_over_dutch.translate_plural("GMainWindow", source, None, count);

		// Assert
		assert_eq!(result, expected);
	}

	#[rstest]
	fn test_translate_skips_empty_first_form(danish_over_dutch: TranslationContext) {
		// Act
		let result = danish_over_dutch.translate("GMainWindow", "%n shader(s)", None);

		// Assert
		assert_eq!(result, "%n shader");
	}

	#[rstest]
	fn test_chain_skips_repeats() {
		// Arrange
		let ctx = TranslationContext::new("da", "da_DK");

		// Act & Assert
		assert_eq!(ctx.chain(), vec!["da", "da_DK"]);
	}

	#[rstest]
	fn test_context_is_shared_across_threads(portuguese: TranslationContext) {
		// Arrange
		let ctx = std::sync::Arc::new(portuguese);

		// Act
		let results: Vec<String> = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..4)
				.map(|_| {
					let ctx = std::sync::Arc::clone(&ctx);
					scope.spawn(move || ctx.translate("GameList", "Name", None).into_owned())
				})
				.collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});

		// Assert
		assert!(results.iter().all(|r| r == "Nome"));
	}
}
