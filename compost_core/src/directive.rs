use std::ops::Range;

use derive_more::Display;
use serde::Serialize;

use crate::CompostError;
use crate::CompostResult;
use crate::error::UNKNOWN_FILE;
use crate::lexer::RawToken;
use crate::lexer::tokenize;
use crate::scanner::ScanState;
use crate::scanner::Strings;
use crate::scanner::find_keyword;
use crate::span::extract_body_span;
use crate::tokens::Token;

/// How a declared attribute is reflected on the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum AttributeKind {
	/// A string-valued DOM attribute, `name` or `name!`.
	#[display("plain")]
	Plain,
	/// A presence-valued DOM attribute, `name?`.
	#[display("boolean")]
	Boolean,
	/// Membership in the element's class list, `.name`.
	#[display("class")]
	ClassToggle,
}

/// One attribute declared in a component directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDescriptor {
	/// The DOM attribute or class name, hyphens included.
	pub name: String,
	pub kind: AttributeKind,
	pub required: bool,
}

impl AttributeDescriptor {
	/// The property name exposed on the element. Hyphens are not valid in
	/// identifiers, so `data-id` becomes `data_id`.
	pub fn member_name(&self) -> String {
		self.name.replace('-', "_")
	}
}

fn is_attribute_name(name: &str) -> bool {
	!name.is_empty()
		&& name
			.bytes()
			.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
}

/// Classify a single directive token by its shape.
///
/// | token   | kind        | required |
/// |---------|-------------|----------|
/// | `.name` | ClassToggle | no       |
/// | `name?` | Boolean     | no       |
/// | `name!` | Plain       | yes      |
/// | `name`  | Plain       | no       |
///
/// Returns `None` for tokens that do not name a valid attribute.
pub fn classify_attribute(token: &str) -> Option<AttributeDescriptor> {
	let token = token.trim();

	let (name, kind, required) = if let Some(rest) = token.strip_prefix('.') {
		(
			rest.trim_end_matches(['!', '?']),
			AttributeKind::ClassToggle,
			false,
		)
	} else if let Some(rest) = token.strip_suffix('?') {
		(rest, AttributeKind::Boolean, false)
	} else if let Some(rest) = token.strip_suffix('!') {
		(rest, AttributeKind::Plain, true)
	} else {
		(token, AttributeKind::Plain, false)
	};

	if !is_attribute_name(name) {
		return None;
	}

	Some(AttributeDescriptor {
		name: name.to_string(),
		kind,
		required,
	})
}

/// The parsed `// <tag-name attr…/>` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
	pub tag: String,
	pub attributes: Vec<AttributeDescriptor>,
	/// From the `//` up to and including the closing `/>`.
	pub span: Range<usize>,
}

/// Parse the text following `//` of a line comment as a directive for `tag`.
///
/// Returns the attributes and the length of the directive text, measured
/// from the start of `comment`, up to and including `/>`.
pub fn parse_directive_comment(
	comment: &str,
	tag: &str,
) -> Option<(Vec<AttributeDescriptor>, usize)> {
	let trimmed = comment.trim_start();
	let leading = comment.len() - trimmed.len();
	let after_tag = trimmed.strip_prefix('<')?.strip_prefix(tag)?;

	if !after_tag.starts_with(|ch: char| ch.is_whitespace() || ch == '/') {
		return None;
	}

	let close = after_tag.find("/>")?;
	let consumed = leading + 1 + tag.len() + close + 2;

	let mut attributes: Vec<AttributeDescriptor> = Vec::new();
	for raw in after_tag[..close].split_whitespace() {
		let Some(attribute) = classify_attribute(raw) else {
			tracing::debug!(token = raw, tag, "ignoring malformed attribute token");
			continue;
		};

		if attributes.iter().any(|existing| existing.name == attribute.name) {
			tracing::warn!(name = %attribute.name, tag, "duplicate attribute in directive ignored");
			continue;
		}

		attributes.push(attribute);
	}

	Some((attributes, consumed))
}

fn find_directive_in_tokens(
	source: &str,
	tokens: &[Token],
	tag: &str,
	range: &Range<usize>,
) -> Option<Directive> {
	let mut state = ScanState::new();

	for token in tokens {
		if token.start() >= range.end {
			break;
		}

		let opens_comment = token.kind == RawToken::LineCommentOpen && !state.in_comment();
		state.advance(source, token, Strings::Track);

		if !opens_comment || !state.in_line_comment() || token.start() < range.start {
			continue;
		}

		let line_end = source[token.end()..]
			.find('\n')
			.map_or(source.len(), |index| token.end() + index);
		let comment = &source[token.end()..line_end];

		if let Some((attributes, consumed)) = parse_directive_comment(comment, tag) {
			return Some(Directive {
				tag: tag.to_string(),
				attributes,
				span: token.start()..token.end() + consumed,
			});
		}
	}

	None
}

/// Find the directive comment for `tag` inside `range` of `source`.
pub fn find_directive(source: &str, tag: &str, range: Range<usize>) -> Option<Directive> {
	let tokens = tokenize(source);
	find_directive_in_tokens(source, &tokens, tag, &range)
}

/// Everything the generator needs to know about one component file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
	/// The custom element name, e.g. `my-thing`.
	pub tag_name: String,
	/// The class name, e.g. `MyThing`.
	pub class_name: String,
	pub attributes: Vec<AttributeDescriptor>,
	/// From the `class` keyword up to and including the closing `}`.
	pub body: Range<usize>,
	/// Span of the class name identifier.
	pub name_span: Range<usize>,
	/// Span of the directive comment.
	pub directive: Range<usize>,
	pub has_constructor: bool,
	pub has_extends: bool,
}

impl ComponentDescriptor {
	/// Names of the attributes that must be present when the element is
	/// attached.
	pub fn required_attributes(&self) -> Vec<&str> {
		self.attributes
			.iter()
			.filter(|attribute| attribute.required)
			.map(|attribute| attribute.name.as_str())
			.collect()
	}
}

fn is_ident_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Parse the first class in `source` into a [`ComponentDescriptor`] for the
/// element `tag`.
///
/// `source` is expected to have had its markup rewritten already, so the class
/// body contains plain code only.
pub fn parse_component(tag: &str, source: &str) -> CompostResult<ComponentDescriptor> {
	let tokens = tokenize(source);
	let missing_class = || {
		CompostError::MissingClass {
			file: UNKNOWN_FILE.to_string(),
		}
	};

	let class_start =
		find_keyword(source, &tokens, "class", 0..source.len()).ok_or_else(missing_class)?;
	let body = extract_body_span(source, class_start)?;

	let bytes = source.as_bytes();
	let mut name_start = class_start + "class".len();
	while bytes.get(name_start).is_some_and(u8::is_ascii_whitespace) {
		name_start += 1;
	}
	let mut name_end = name_start;
	while bytes.get(name_end).copied().is_some_and(is_ident_byte) {
		name_end += 1;
	}

	if name_start == name_end {
		return Err(missing_class());
	}

	let class_name = source[name_start..name_end].to_string();
	let header_end = source[name_end..body.end]
		.find('{')
		.map_or(body.end, |index| name_end + index);
	let has_extends = find_keyword(source, &tokens, "extends", name_end..header_end).is_some();
	let has_constructor = find_keyword(source, &tokens, "constructor", header_end..body.end).is_some();

	let directive =
		find_directive_in_tokens(source, &tokens, tag, &body).ok_or_else(|| {
			CompostError::MissingDirective {
				tag: tag.to_string(),
				file: UNKNOWN_FILE.to_string(),
			}
		})?;

	tracing::debug!(
		tag,
		class = %class_name,
		attributes = directive.attributes.len(),
		"parsed component"
	);

	Ok(ComponentDescriptor {
		tag_name: tag.to_string(),
		class_name,
		attributes: directive.attributes,
		body,
		name_span: name_start..name_end,
		directive: directive.span,
		has_constructor,
		has_extends,
	})
}
