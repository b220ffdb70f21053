//! Qt Linguist `.ts` file reader
//!
//! Streams the XML with quick-xml and builds a [`Catalog`]. The reader keeps
//! only the elements that carry translation data; anything else is skipped.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::catalog::{
	Catalog, CatalogError, Location, Message, Translation, TranslationStatus, UnfinishedPolicy,
	duplicate_error,
};
use crate::plural::PluralRule;

/// Options for reading `.ts` files
///
/// # Examples
///
/// ```
/// use tscatalog_i18n::{TsReader, UnfinishedPolicy};
///
/// let catalog = TsReader::new()
///     .default_language("ja_JP")
///     .unfinished_policy(UnfinishedPolicy::UseDraftTranslation)
///     .read_str(r#"<TS version="2.1"><context><name>GameList</name>
///         <message><source>Name</source><translation>名前</translation></message>
///     </context></TS>"#)
///     .unwrap();
///
/// assert_eq!(catalog.language(), Some("ja_JP"));
/// assert_eq!(catalog.lookup("GameList", "Name", None).unwrap().as_str(), "名前");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TsReader {
	default_language: Option<String>,
	unfinished_policy: UnfinishedPolicy,
}

impl TsReader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Language to assume when the `<TS>` element has no `language` attribute
	pub fn default_language(mut self, language: impl Into<String>) -> Self {
		self.default_language = Some(language.into());
		self
	}

	/// How the loaded catalog resolves unfinished messages
	pub fn unfinished_policy(mut self, policy: UnfinishedPolicy) -> Self {
		self.unfinished_policy = policy;
		self
	}

	/// Read a `.ts` file from disk
	pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
		let input = std::fs::read_to_string(path)?;
		self.read_str(&input)
	}

	/// Read a `.ts` document from any reader
	pub fn read<R: Read>(&self, mut reader: R) -> Result<Catalog, CatalogError> {
		let mut input = String::new();
		reader.read_to_string(&mut input)?;
		self.read_str(&input)
	}

	/// Read a `.ts` document held in memory
	pub fn read_str(&self, input: &str) -> Result<Catalog, CatalogError> {
		let input = input.strip_prefix('\u{feff}').unwrap_or(input);
		let catalog = TsParser::new(input, self).run()?;

		let rule = catalog.plural_rule();
		let mismatched = catalog
			.messages()
			.filter(|(_, m)| m.status() == TranslationStatus::Finished)
			.filter(|(_, m)| match m.translation() {
				Translation::Numerus(forms) => forms.len() != rule.form_count(),
				Translation::Single(_) => false,
			})
			.count();
		if mismatched > 0 {
			tracing::warn!(
				language = catalog.language().unwrap_or("?"),
				expected_forms = rule.form_count(),
				mismatched,
				"numerus messages do not match the language plural rule"
			);
		}

		let stats = catalog.stats();
		tracing::debug!(
			language = catalog.language().unwrap_or("?"),
			contexts = stats.contexts,
			messages = stats.messages,
			unfinished = stats.unfinished,
			"loaded translation catalog"
		);
		Ok(catalog)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
	Ts,
	Context,
	Name,
	Message,
	Source,
	Comment,
	ExtraComment,
	TranslatorComment,
	Translation,
	NumerusForm,
	LengthVariant,
	Location,
	Byte,
	Other,
}

impl Element {
	fn classify(parent: Option<Element>, name: &[u8]) -> Self {
		match (parent, name) {
			(None, b"TS") => Self::Ts,
			(Some(Self::Ts), b"context") => Self::Context,
			(Some(Self::Context), b"name") => Self::Name,
			(Some(Self::Context), b"message") => Self::Message,
			(Some(Self::Message), b"source") => Self::Source,
			(Some(Self::Message), b"comment") => Self::Comment,
			(Some(Self::Message), b"extracomment") => Self::ExtraComment,
			(Some(Self::Message), b"translatorcomment") => Self::TranslatorComment,
			(Some(Self::Message), b"translation") => Self::Translation,
			(Some(Self::Message), b"location") => Self::Location,
			(Some(Self::Translation), b"numerusform") => Self::NumerusForm,
			(Some(Self::Source | Self::Translation | Self::NumerusForm), b"lengthvariant") => {
				Self::LengthVariant
			}
			(Some(parent), b"byte") if parent.captures_text() => Self::Byte,
			_ => Self::Other,
		}
	}

	/// Elements whose character data is kept
	fn captures_text(self) -> bool {
		matches!(
			self,
			Self::Name
				| Self::Source
				| Self::Comment
				| Self::ExtraComment
				| Self::TranslatorComment
				| Self::Translation
				| Self::NumerusForm
				| Self::LengthVariant
		)
	}
}

/// Text collected for the innermost text-bearing element
///
/// Only the first `<lengthvariant>` is kept; it replaces any text written
/// directly inside the element.
#[derive(Debug)]
struct Capture {
	element: Element,
	text: String,
	variant: Option<String>,
	variants: usize,
	in_variant: bool,
}

impl Capture {
	fn new(element: Element) -> Self {
		Self {
			element,
			text: String::new(),
			variant: None,
			variants: 0,
			in_variant: false,
		}
	}

	fn finish(self) -> String {
		self.variant.unwrap_or(self.text)
	}
}

#[derive(Debug, Default)]
struct ContextDraft {
	offset: usize,
	name: Option<String>,
	messages: Vec<(Message, usize)>,
	last_file: Option<String>,
	last_lines: HashMap<String, i64>,
}

#[derive(Debug, Default)]
struct MessageDraft {
	offset: usize,
	numerus: bool,
	source: Option<String>,
	comment: Option<String>,
	extra_comment: Option<String>,
	translator_comment: Option<String>,
	locations: Vec<Location>,
	status: Option<TranslationStatus>,
	text: Option<String>,
	forms: Vec<String>,
}

struct TsParser<'a> {
	input: &'a str,
	default_language: Option<&'a str>,
	catalog: Catalog,
	stack: Vec<Element>,
	capture: Option<Capture>,
	context: Option<ContextDraft>,
	message: Option<MessageDraft>,
}

impl<'a> TsParser<'a> {
	fn new(input: &'a str, options: &'a TsReader) -> Self {
		let rule = options
			.default_language
			.as_deref()
			.map(PluralRule::for_locale)
			.unwrap_or_default();
		Self {
			input,
			default_language: options.default_language.as_deref(),
			catalog: Catalog::empty(rule, options.unfinished_policy),
			stack: Vec::new(),
			capture: None,
			context: None,
			message: None,
		}
	}

	fn run(mut self) -> Result<Catalog, CatalogError> {
		let mut reader = Reader::from_str(self.input);
		let mut saw_root = false;

		loop {
			let offset = reader.buffer_position() as usize;
			let event = match reader.read_event() {
				Ok(event) => event,
				Err(e) => return Err(self.xml_error(reader.error_position() as usize, e)),
			};

			match event {
				Event::Start(e) => {
					saw_root = true;
					self.open(&e, offset)?;
				}
				Event::Empty(e) => {
					saw_root = true;
					self.open(&e, offset)?;
					self.close(offset)?;
				}
				Event::End(_) => self.close(offset)?,
				Event::Text(e) => {
					let text = e.xml_content().map_err(|err| self.xml_error(offset, err))?;
					self.push_text(&normalize_newlines(&text));
				}
				Event::CData(e) => {
					let text = String::from_utf8_lossy(e.into_inner().as_ref()).to_string();
					self.push_text(&normalize_newlines(&text));
				}
				Event::GeneralRef(e) => {
					let name = std::str::from_utf8(&e).map_err(|err| self.xml_error(offset, err))?;
					let resolved = resolve_reference(name).ok_or_else(|| {
						self.malformed(offset, format!("unknown entity reference &{};", name))
					})?;
					self.push_text(&resolved);
				}
				Event::Eof => break,
				_ => {}
			}
		}

		if !saw_root {
			return Err(self.malformed(self.input.len(), "missing <TS> root element"));
		}
		if let Some(open) = self.stack.last() {
			return Err(self.malformed(
				self.input.len(),
				format!("unexpected end of document inside {:?}", open),
			));
		}

		Ok(self.catalog)
	}

	fn open(&mut self, e: &BytesStart<'_>, offset: usize) -> Result<(), CatalogError> {
		let parent = self.stack.last().copied();
		let element = Element::classify(parent, e.name().as_ref());

		match element {
			Element::Ts => {
				let version = self.attribute(e, b"version", offset)?;
				let language = self
					.attribute(e, b"language", offset)?
					.filter(|l| !l.is_empty())
					.or_else(|| self.default_language.map(str::to_string));
				let source_language = self.attribute(e, b"sourcelanguage", offset)?;
				self.catalog.set_header(version, language, source_language);
			}
			Element::Other if parent.is_none() => {
				return Err(self.malformed(
					offset,
					format!(
						"root element must be <TS>, found <{}>",
						String::from_utf8_lossy(e.name().as_ref())
					),
				));
			}
			Element::Context => {
				self.context = Some(ContextDraft {
					offset,
					..Default::default()
				});
			}
			Element::Message => {
				let numerus = self.attribute(e, b"numerus", offset)?.as_deref() == Some("yes");
				self.message = Some(MessageDraft {
					offset,
					numerus,
					..Default::default()
				});
			}
			Element::Name
			| Element::Source
			| Element::Comment
			| Element::ExtraComment
			| Element::TranslatorComment
			| Element::NumerusForm => {
				self.capture = Some(Capture::new(element));
			}
			Element::Translation => {
				let kind = self.attribute(e, b"type", offset)?;
				let status = TranslationStatus::from_type_attr(kind.as_deref()).ok_or_else(|| {
					self.malformed(
						offset,
						format!("unknown translation type {:?}", kind.unwrap_or_default()),
					)
				})?;
				if let Some(message) = self.message.as_mut() {
					message.status = Some(status);
					if !message.numerus {
						self.capture = Some(Capture::new(element));
					}
				}
			}
			Element::LengthVariant => {
				if let Some(capture) = self.capture.as_mut() {
					capture.variants += 1;
					capture.in_variant = true;
				}
			}
			Element::Location => {
				let filename = self.attribute(e, b"filename", offset)?;
				let line = self.attribute(e, b"line", offset)?;
				self.push_location(filename, line);
			}
			Element::Byte => {
				let value = self.attribute(e, b"value", offset)?.unwrap_or_default();
				let ch = parse_char_code(&value).ok_or_else(|| {
					self.malformed(offset, format!("invalid <byte> value {:?}", value))
				})?;
				self.push_text(ch.encode_utf8(&mut [0; 4]));
			}
			Element::Other => {
				tracing::trace!(
					element = %String::from_utf8_lossy(e.name().as_ref()),
					"skipping unknown element"
				);
			}
		}

		self.stack.push(element);
		Ok(())
	}

	fn close(&mut self, offset: usize) -> Result<(), CatalogError> {
		let Some(element) = self.stack.pop() else {
			return Err(self.malformed(offset, "unexpected closing tag"));
		};

		match element {
			Element::Context => self.finish_context()?,
			Element::Message => self.finish_message()?,
			Element::Name => {
				let text = self.take_capture();
				if let Some(context) = self.context.as_mut() {
					context.name = Some(text);
				}
			}
			Element::Source
			| Element::Comment
			| Element::ExtraComment
			| Element::TranslatorComment
			| Element::NumerusForm => {
				let text = self.take_capture();
				if let Some(message) = self.message.as_mut() {
					let non_empty = (!text.is_empty()).then(|| text.clone());
					match element {
						Element::Source => message.source = Some(text),
						Element::Comment => message.comment = non_empty,
						Element::ExtraComment => message.extra_comment = non_empty,
						Element::TranslatorComment => message.translator_comment = non_empty,
						_ => message.forms.push(text),
					}
				}
			}
			Element::Translation => {
				let numerus = self.message.as_ref().is_some_and(|m| m.numerus);
				if !numerus {
					let text = self.take_capture();
					if let Some(message) = self.message.as_mut() {
						message.text = Some(text);
					}
				}
			}
			Element::LengthVariant => {
				if let Some(capture) = self.capture.as_mut() {
					capture.in_variant = false;
				}
			}
			_ => {}
		}
		Ok(())
	}

	fn push_text(&mut self, text: &str) {
		let top = self.stack.last().copied();
		let Some(capture) = self.capture.as_mut() else {
			return;
		};

		if capture.in_variant {
			if top == Some(Element::LengthVariant) && capture.variants == 1 {
				capture
					.variant
					.get_or_insert_with(String::new)
					.push_str(text);
			}
		} else if top == Some(capture.element) {
			capture.text.push_str(text);
		}
	}

	fn take_capture(&mut self) -> String {
		self.capture.take().map(Capture::finish).unwrap_or_default()
	}

	/// Resolve a `<location>`; `line="+N"` is relative to the previous
	/// location of the same file in this context
	fn push_location(&mut self, filename: Option<String>, line: Option<String>) {
		let (Some(context), Some(message)) = (self.context.as_mut(), self.message.as_mut()) else {
			return;
		};
		let Some(filename) = filename
			.filter(|f| !f.is_empty())
			.or_else(|| context.last_file.clone())
		else {
			tracing::trace!("skipping location without a file name");
			return;
		};

		let line = line.and_then(|raw| {
			let raw = raw.trim();
			if raw.starts_with(['+', '-']) {
				let delta: i64 = raw.trim_start_matches('+').parse().ok()?;
				let base = context.last_lines.get(&filename).copied().unwrap_or(0);
				Some(base + delta)
			} else {
				raw.parse::<i64>().ok()
			}
		});

		if let Some(line) = line {
			context.last_lines.insert(filename.clone(), line);
		}
		context.last_file = Some(filename.clone());
		message.locations.push(Location {
			filename,
			line: line.and_then(|l| u32::try_from(l).ok()),
		});
	}

	fn finish_message(&mut self) -> Result<(), CatalogError> {
		let Some(draft) = self.message.take() else {
			return Ok(());
		};
		let source = match draft.source {
			Some(source) if !source.is_empty() => source,
			Some(_) => return Err(self.malformed(draft.offset, "message has an empty <source>")),
			None => return Err(self.malformed(draft.offset, "message without <source>")),
		};

		let translation = if draft.numerus {
			Translation::Numerus(draft.forms)
		} else {
			Translation::Single(draft.text.unwrap_or_default())
		};
		let mut message = Message::new(source, translation)
			.with_status(draft.status.unwrap_or(TranslationStatus::Unfinished));
		if let Some(comment) = draft.comment {
			message = message.with_comment(comment);
		}
		if let Some(comment) = draft.extra_comment {
			message = message.with_extra_comment(comment);
		}
		if let Some(comment) = draft.translator_comment {
			message = message.with_translator_comment(comment);
		}
		for location in draft.locations {
			message = message.with_location(location.filename, location.line);
		}

		if let Some(context) = self.context.as_mut() {
			context.messages.push((message, draft.offset));
		}
		Ok(())
	}

	fn finish_context(&mut self) -> Result<(), CatalogError> {
		let Some(draft) = self.context.take() else {
			return Ok(());
		};
		let name = match draft.name {
			Some(name) if !name.is_empty() => name,
			Some(_) => return Err(self.malformed(draft.offset, "context has an empty <name>")),
			None => return Err(self.malformed(draft.offset, "context without <name>")),
		};

		for (message, offset) in draft.messages {
			if let Err(message) = self.catalog.context_entry(&name).push(message) {
				return Err(duplicate_error(&name, &message, self.line_at(offset)));
			}
		}
		Ok(())
	}

	fn attribute(
		&self,
		e: &BytesStart<'_>,
		key: &[u8],
		offset: usize,
	) -> Result<Option<String>, CatalogError> {
		for attr in e.attributes() {
			let attr = attr.map_err(|err| self.xml_error(offset, err))?;
			if attr.key.as_ref() != key {
				continue;
			}
			let raw = std::str::from_utf8(&attr.value).map_err(|err| self.xml_error(offset, err))?;
			let value =
				quick_xml::escape::unescape(raw).map_err(|err| self.xml_error(offset, err))?;
			return Ok(Some(value.into_owned()));
		}
		Ok(None)
	}

	fn line_at(&self, offset: usize) -> usize {
		let end = offset.min(self.input.len());
		self.input.as_bytes()[..end]
			.iter()
			.filter(|&&b| b == b'\n')
			.count() + 1
	}

	fn xml_error(&self, offset: usize, err: impl std::fmt::Display) -> CatalogError {
		CatalogError::Xml {
			line: self.line_at(offset),
			message: err.to_string(),
		}
	}

	fn malformed(&self, offset: usize, message: impl Into<String>) -> CatalogError {
		CatalogError::Malformed {
			line: self.line_at(offset),
			message: message.into(),
		}
	}
}

fn normalize_newlines(text: &str) -> Cow<'_, str> {
	if text.contains('\r') {
		Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
	} else {
		Cow::Borrowed(text)
	}
}

/// Resolve `&name;` to its text: numeric references and the five XML entities
fn resolve_reference(name: &str) -> Option<Cow<'static, str>> {
	if let Some(code) = name.strip_prefix('#') {
		return parse_char_code(code).map(|c| Cow::Owned(c.to_string()));
	}
	quick_xml::escape::resolve_predefined_entity(name).map(Cow::Borrowed)
}

/// Parse `x1F` / `X1F` (hex) or `31` (decimal) into a character
fn parse_char_code(code: &str) -> Option<char> {
	let value = match code.strip_prefix(['x', 'X']) {
		Some(hex) => u32::from_str_radix(hex, 16).ok()?,
		None => code.parse().ok()?,
	};
	char::from_u32(value)
}
