//! Consistency checks run by `tscatalog-admin check`.

use std::fmt;

use tscatalog_i18n::{Catalog, Template, Translation, TranslationStatus};

/// A finished message that would render incorrectly
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Problem {
	pub context: String,
	pub source_text: String,
	pub kind: ProblemKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProblemKind {
	/// The translation uses `%N` tokens that the source never fills
	UnknownPlaceholders(Vec<u8>),
	/// A numerus message with the wrong number of forms for the language
	FormCount { expected: usize, found: usize },
}

impl fmt::Display for Problem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {:?}: ", self.context, self.source_text)?;
		match &self.kind {
			ProblemKind::UnknownPlaceholders(indices) => {
				let tokens: Vec<String> = indices.iter().map(|i| format!("%{}", i)).collect();
				write!(f, "translation uses {} not present in the source", tokens.join(", "))
			}
			ProblemKind::FormCount { expected, found } => {
				write!(f, "expected {} plural forms, found {}", expected, found)
			}
		}
	}
}

/// Check every finished message of `catalog`
///
/// Unfinished, vanished and obsolete messages are never shown, so they are
/// not checked.
pub(crate) fn check_catalog(catalog: &Catalog) -> Vec<Problem> {
	let rule = catalog.plural_rule();
	let mut problems = Vec::new();

	for (context, message) in catalog.messages() {
		if message.status() != TranslationStatus::Finished {
			continue;
		}
		let problem = |kind| Problem {
			context: context.to_string(),
			source_text: message.source().to_string(),
			kind,
		};

		let texts: Vec<&str> = match message.translation() {
			Translation::Single(text) => vec![text.as_str()],
			Translation::Numerus(forms) => {
				if forms.len() != rule.form_count() {
					problems.push(problem(ProblemKind::FormCount {
						expected: rule.form_count(),
						found: forms.len(),
					}));
				}
				forms.iter().map(String::as_str).collect()
			}
		};

		let known = Template::parse(message.source()).arg_indices();
		let mut unknown: Vec<u8> = texts
			.iter()
			.flat_map(|text| Template::parse(text).arg_indices())
			.filter(|index| !known.contains(index))
			.collect();
		unknown.sort_unstable();
		unknown.dedup();
		if !unknown.is_empty() {
			problems.push(problem(ProblemKind::UnknownPlaceholders(unknown)));
		}
	}

	problems
}
