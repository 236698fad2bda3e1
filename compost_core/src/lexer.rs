use logos::Logos;

use crate::tokens::Token;

/// Raw tokens produced by logos for flat tokenization of a component file.
///
/// Only the characters that can change the scanner context get their own
/// token. Everything else is collapsed into `Text` runs, so every byte of the
/// source belongs to exactly one token and concatenating the token slices
/// reproduces the input.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
	#[token("//")]
	LineCommentOpen,
	#[token("/*")]
	BlockCommentOpen,
	#[token("*/")]
	BlockCommentClose,
	#[token("\"")]
	DoubleQuote,
	#[token("'")]
	SingleQuote,
	#[token("`")]
	Backtick,
	#[token("${")]
	TemplateExprOpen,
	#[token("$")]
	Dollar,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("<")]
	AngleOpen,
	#[token(">")]
	AngleClose,
	#[token("\\")]
	Backslash,
	#[token("/")]
	Slash,
	#[token("*")]
	Star,
	#[token("\n")]
	Newline,
	#[regex(r#"[^/*"'`${}<>\\\n]+"#)]
	Text,
}

impl RawToken {
	pub fn quote(self) -> Option<u8> {
		match self {
			Self::DoubleQuote => Some(b'"'),
			Self::SingleQuote => Some(b'\''),
			Self::Backtick => Some(b'`'),
			_ => None,
		}
	}
}

/// Split the source into an immutable token stream.
pub fn tokenize(source: &str) -> Vec<Token> {
	RawToken::lexer(source)
		.spanned()
		.map(|(result, span)| {
			Token {
				// The `Text` regex covers every byte the other tokens do not, so
				// errors only appear on input logos cannot classify at all.
				kind: result.unwrap_or(RawToken::Text),
				span,
			}
		})
		.collect()
}
