use std::ops::Range;

use crate::lexer::RawToken;

/// A token together with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub kind: RawToken,
	pub span: Range<usize>,
}

impl Token {
	/// The source slice covered by this token.
	pub fn text<'a>(&self, source: &'a str) -> &'a str {
		&source[self.span.clone()]
	}

	pub fn start(&self) -> usize {
		self.span.start
	}

	pub fn end(&self) -> usize {
		self.span.end
	}
}

/// A tag matched at a `<` position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
	/// The tag name, e.g. `div` or `my-thing`.
	pub name: String,
	/// Byte length of the whole tag, from `<` up to and including `>`.
	pub len: usize,
	/// `</name>`
	pub closing: bool,
	/// `<name ... />`
	pub self_closing: bool,
}

/// HTML elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

impl TagMatch {
	/// Custom elements always carry a hyphen in their name.
	pub fn is_custom(&self) -> bool {
		self.name.contains('-')
	}

	/// Whether this tag moves the nesting depth at all.
	pub fn is_standalone(&self) -> bool {
		self.self_closing
			|| VOID_ELEMENTS
				.iter()
				.any(|void| void.eq_ignore_ascii_case(&self.name))
	}

	/// Render the explicit open/close pair for a self-closing tag:
	/// `<foo-bar a="1"/>` becomes `<foo-bar a="1"></foo-bar>`.
	pub fn expand(&self, raw: &str) -> String {
		let head = raw.strip_suffix("/>").unwrap_or(raw).trim_end();
		format!("{head}></{}>", self.name)
	}
}

fn is_word_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Try to match a tag at `offset`, which must point at a `<`.
///
/// The pattern is `</?` followed by a word character, a name made of word
/// characters and hyphens, and anything up to the first `>` on the same
/// line.
pub fn match_tag(source: &str, offset: usize) -> Option<TagMatch> {
	let bytes = source.as_bytes();
	if bytes.get(offset) != Some(&b'<') {
		return None;
	}

	let mut cursor = offset + 1;
	let closing = bytes.get(cursor) == Some(&b'/');
	if closing {
		cursor += 1;
	}

	let name_start = cursor;
	if !bytes.get(cursor).copied().is_some_and(is_word_byte) {
		return None;
	}

	while bytes
		.get(cursor)
		.copied()
		.is_some_and(|byte| is_word_byte(byte) || byte == b'-')
	{
		cursor += 1;
	}

	let name = &source[name_start..cursor];

	while let Some(&byte) = bytes.get(cursor) {
		match byte {
			b'>' => {
				let len = cursor + 1 - offset;
				let self_closing = !closing && cursor > name_start && bytes[cursor - 1] == b'/';
				return Some(TagMatch {
					name: name.to_string(),
					len,
					closing,
					self_closing,
				});
			}
			b'\n' => return None,
			_ => cursor += 1,
		}
	}

	None
}
