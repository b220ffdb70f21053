//! Qt-style placeholder substitution
//!
//! Localized strings mark insertion points with `%1`..`%99` (positional
//! arguments), `%L1`.. (the localized variant, substituted the same way here)
//! and `%n` / `%Ln` (the plural count). A `%` that does not start one of those
//! tokens is plain text.
//!
//! Substitution is a single pass over the template: text inserted for one
//! token is never scanned for further tokens, and a token whose argument is
//! missing stays in the output unchanged.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One piece of a parsed template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
	/// Text copied to the output as-is
	Literal(&'a str),
	/// A positional token such as `%2` or `%L2`
	Arg {
		/// 1-based argument index as written (`%0` parses as index 0 and never resolves)
		index: u8,
		/// Whether the token was written with the `L` modifier
		localized: bool,
		/// The token text, used when no argument is available
		raw: &'a str,
	},
	/// The plural count token `%n` or `%Ln`
	Count {
		/// Whether the token was written with the `L` modifier
		localized: bool,
		/// The token text, used when no count is available
		raw: &'a str,
	},
}

/// A localized string split into literal text and placeholder tokens
///
/// # Example
/// ```
/// use tscatalog_i18n::Template;
///
/// let template = Template::parse("Installing file \"%1\" (%2 of %3)");
/// let text = template.render(&["mario.nsp", "1", "4"], None);
/// assert_eq!(text, "Installing file \"mario.nsp\" (1 of 4)");
///
/// let args = template.recover_args(&text).unwrap();
/// assert_eq!(args[&1u8], "mario.nsp");
/// assert_eq!(args[&3u8], "4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
	segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
	/// Split `text` into literals and tokens
	pub fn parse(text: &'a str) -> Self {
		let bytes = text.as_bytes();
		let mut segments = Vec::new();
		let mut literal_start = 0;
		let mut i = 0;

		while i < bytes.len() {
			if bytes[i] != b'%' {
				i += 1;
				continue;
			}

			let Some((segment, end)) = parse_token(text, i) else {
				i += 1;
				continue;
			};

			if literal_start < i {
				segments.push(Segment::Literal(&text[literal_start..i]));
			}
			segments.push(segment);
			i = end;
			literal_start = end;
		}

		if literal_start < text.len() {
			segments.push(Segment::Literal(&text[literal_start..]));
		}

		Self { segments }
	}

	/// Parsed segments in source order
	pub fn segments(&self) -> &[Segment<'a>] {
		&self.segments
	}

	/// Distinct positional indices used by the template, ascending
	pub fn arg_indices(&self) -> Vec<u8> {
		let mut indices: Vec<u8> = self
			.segments
			.iter()
			.filter_map(|segment| match segment {
				Segment::Arg { index, .. } => Some(*index),
				_ => None,
			})
			.collect();
		indices.sort_unstable();
		indices.dedup();
		indices
	}

	/// Whether the template contains a `%n` token
	pub fn has_count(&self) -> bool {
		self.segments
			.iter()
			.any(|segment| matches!(segment, Segment::Count { .. }))
	}

	/// Substitute `args` (for `%1`..) and `count` (for `%n`)
	///
	/// Tokens without a matching value are written back verbatim.
	pub fn render<S: AsRef<str>>(&self, args: &[S], count: Option<u64>) -> String {
		let mut out = String::new();
		for segment in &self.segments {
			match *segment {
				Segment::Literal(text) => out.push_str(text),
				Segment::Arg { index, raw, .. } => {
					match usize::from(index).checked_sub(1).and_then(|i| args.get(i)) {
						Some(arg) => out.push_str(arg.as_ref()),
						None => out.push_str(raw),
					}
				}
				Segment::Count { raw, .. } => match count {
					Some(n) => {
						let _ = write!(out, "{}", n);
					}
					None => out.push_str(raw),
				},
			}
		}
		out
	}

	/// Recover the argument values from a string rendered from this template
	///
	/// Every way of splitting `formatted` around the literal segments is
	/// tried. Returns `None` when `formatted` does not fit the template, when
	/// it fits in more than one way, when two tokens are adjacent (the
	/// boundary between them is unknowable), or when a repeated index was
	/// rendered with different values.
	pub fn recover_args(&self, formatted: &str) -> Option<BTreeMap<u8, String>> {
		let adjacent_tokens = self
			.segments
			.windows(2)
			.any(|pair| pair.iter().all(|s| !matches!(s, Segment::Literal(_))));
		if adjacent_tokens {
			return None;
		}

		let mut matches = Vec::new();
		match_segments(&self.segments, formatted, &mut BTreeMap::new(), &mut matches);
		match matches.len() {
			1 => matches.pop(),
			_ => None,
		}
	}
}

/// Collect the argument maps under which `segments` render to `rest`
///
/// Stops once a second match is found.
fn match_segments(
	segments: &[Segment<'_>],
	rest: &str,
	args: &mut BTreeMap<u8, String>,
	matches: &mut Vec<BTreeMap<u8, String>>,
) {
	if matches.len() > 1 {
		return;
	}
	let Some((segment, tail)) = segments.split_first() else {
		if rest.is_empty() {
			matches.push(args.clone());
		}
		return;
	};

	if let Segment::Literal(text) = *segment {
		if let Some(rest) = rest.strip_prefix(text) {
			match_segments(tail, rest, args, matches);
		}
		return;
	}

	let ends: Vec<usize> = match tail.first() {
		Some(Segment::Literal(next)) => rest
			.char_indices()
			.map(|(i, _)| i)
			.filter(|&i| rest[i..].starts_with(*next))
			.collect(),
		_ => vec![rest.len()],
	};

	for end in ends {
		let (captured, remaining) = rest.split_at(end);
		let inserted = match *segment {
			Segment::Arg { index, .. } => match args.get(&index) {
				Some(previous) if previous != captured => continue,
				Some(_) => None,
				None => {
					args.insert(index, captured.to_string());
					Some(index)
				}
			},
			_ => None,
		};

		match_segments(tail, remaining, args, matches);

		if let Some(index) = inserted {
			args.remove(&index);
		}
	}
}

/// Parse a token starting at the `%` at byte `start`
fn parse_token(text: &str, start: usize) -> Option<(Segment<'_>, usize)> {
	let bytes = text.as_bytes();
	let mut pos = start + 1;
	let localized = bytes.get(pos) == Some(&b'L');
	if localized {
		pos += 1;
	}

	match bytes.get(pos) {
		Some(b'n') => {
			let end = pos + 1;
			Some((
				Segment::Count {
					localized,
					raw: &text[start..end],
				},
				end,
			))
		}
		Some(d) if d.is_ascii_digit() => {
			let mut index = d - b'0';
			let mut end = pos + 1;
			if let Some(d2) = bytes.get(end).filter(|b| b.is_ascii_digit()) {
				index = index * 10 + (d2 - b'0');
				end += 1;
			}
			Some((
				Segment::Arg {
					index,
					localized,
					raw: &text[start..end],
				},
				end,
			))
		}
		_ => None,
	}
}

/// Substitute positional arguments into a localized string
///
/// # Example
/// ```
/// use tscatalog_i18n::format;
///
/// assert_eq!(format("Scale: %1x", &["1.5"]), "Scale: 1.5x");
/// assert_eq!(format("%1 of %2", &["3"]), "3 of %2");
/// ```
pub fn format<S: AsRef<str>>(text: &str, args: &[S]) -> String {
	Template::parse(text).render(args, None)
}

/// Replace `%n` / `%Ln` with `count`, leaving positional tokens untouched
pub fn substitute_count(text: &str, count: u64) -> String {
	Template::parse(text).render::<&str>(&[], Some(count))
}
