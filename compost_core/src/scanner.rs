//! The comment/string aware state machine shared by the markup rewriter and
//! the brace-matched span extractor.

use crate::lexer::RawToken;
use crate::tokens::Token;

/// Lexical contexts tracked while walking a token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
	/// Plain code.
	Code,
	/// `// ...` up to the end of the line.
	LineComment,
	/// `/* ... */`
	BlockComment,
	/// A `'` or `"` delimited string.
	String(u8),
	/// A `` ` `` delimited template literal.
	Template,
	/// Code inside `${ ... }` of a template literal, with the count of
	/// currently open inner braces.
	TemplateExpr { braces: usize },
}

/// Whether quote characters open strings while advancing. Markup blocks
/// suspend string tracking so that apostrophes in text do not swallow the
/// rest of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strings {
	Track,
	Ignore,
}

/// The scanner state: a stack of contexts with [`Context::Code`] at the
/// bottom, plus a pending backslash escape.
#[derive(Debug, Clone)]
pub struct ScanState {
	stack: Vec<Context>,
	escape_next: bool,
}

impl Default for ScanState {
	fn default() -> Self {
		Self::new()
	}
}

impl ScanState {
	pub fn new() -> Self {
		Self {
			stack: vec![Context::Code],
			escape_next: false,
		}
	}

	/// The innermost context.
	pub fn context(&self) -> Context {
		self.stack.last().copied().unwrap_or(Context::Code)
	}

	/// Plain code outside any string, template literal or comment.
	pub fn at_top_level(&self) -> bool {
		self.stack.len() == 1
	}

	pub fn in_line_comment(&self) -> bool {
		self.context() == Context::LineComment
	}

	pub fn in_block_comment(&self) -> bool {
		self.context() == Context::BlockComment
	}

	pub fn in_comment(&self) -> bool {
		self.in_line_comment() || self.in_block_comment()
	}

	fn pop(&mut self) {
		if self.stack.len() > 1 {
			self.stack.pop();
		}
	}

	/// Move the state machine past `token`.
	pub fn advance(&mut self, source: &str, token: &Token, strings: Strings) {
		if std::mem::take(&mut self.escape_next) {
			return;
		}

		match self.context() {
			Context::LineComment => {
				if token.kind == RawToken::Newline {
					self.pop();
				}
			}
			Context::BlockComment => {
				if token.kind == RawToken::BlockCommentClose {
					self.pop();
				}
			}
			Context::String(delimiter) => {
				match token.kind {
					RawToken::Backslash => self.escape_next = true,
					// `'` and `"` strings cannot span lines.
					RawToken::Newline => self.pop(),
					kind if kind.quote() == Some(delimiter) => self.pop(),
					_ => {}
				}
			}
			Context::Template => {
				match token.kind {
					RawToken::Backslash => self.escape_next = true,
					RawToken::Backtick => self.pop(),
					RawToken::TemplateExprOpen => self.stack.push(Context::TemplateExpr { braces: 0 }),
					_ => {}
				}
			}
			Context::Code | Context::TemplateExpr { .. } => self.advance_code(source, token, strings),
		}
	}

	fn advance_code(&mut self, source: &str, token: &Token, strings: Strings) {
		match token.kind {
			RawToken::LineCommentOpen if !preceded_by(source, token.start(), b':') => {
				self.stack.push(Context::LineComment);
			}
			RawToken::BlockCommentOpen => self.stack.push(Context::BlockComment),
			RawToken::DoubleQuote | RawToken::SingleQuote if strings == Strings::Track => {
				if let Some(delimiter) = token.kind.quote() {
					self.stack.push(Context::String(delimiter));
				}
			}
			RawToken::Backtick if strings == Strings::Track => self.stack.push(Context::Template),
			RawToken::BraceOpen | RawToken::TemplateExprOpen => {
				if let Some(Context::TemplateExpr { braces }) = self.stack.last_mut() {
					*braces += 1;
				}
			}
			RawToken::BraceClose => {
				if matches!(self.stack.last(), Some(Context::TemplateExpr { braces: 0 })) {
					self.pop();
				} else if let Some(Context::TemplateExpr { braces }) = self.stack.last_mut() {
					*braces -= 1;
				}
			}
			_ => {}
		}
	}
}

fn preceded_by(source: &str, offset: usize, byte: u8) -> bool {
	offset > 0 && source.as_bytes().get(offset - 1) == Some(&byte)
}

fn is_ident_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Find the first occurrence of `keyword` as a whole word in top-level code
/// (outside comments, strings and template literals) within `range`.
pub fn find_keyword(
	source: &str,
	tokens: &[Token],
	keyword: &str,
	range: std::ops::Range<usize>,
) -> Option<usize> {
	let bytes = source.as_bytes();
	let mut state = ScanState::new();

	for token in tokens {
		if token.start() >= range.end {
			break;
		}

		if token.kind == RawToken::Text && state.at_top_level() && token.end() > range.start {
			let text = token.text(source);
			for (index, _) in text.match_indices(keyword) {
				let start = token.start() + index;
				let end = start + keyword.len();
				if start < range.start || end > range.end {
					continue;
				}

				// `this.constructor` is a property access, not the keyword.
				let before_ok =
					start == 0 || !(is_ident_byte(bytes[start - 1]) || bytes[start - 1] == b'.');
				let after_ok = bytes.get(end).is_none_or(|byte| !is_ident_byte(*byte));
				if before_ok && after_ok {
					return Some(start);
				}
			}
		}

		state.advance(source, token, Strings::Track);
	}

	None
}
