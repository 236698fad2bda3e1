use std::ops::Range;

use crate::CompostError;
use crate::CompostResult;
use crate::error::UNKNOWN_FILE;
use crate::lexer::RawToken;
use crate::lexer::tokenize;
use crate::position::point_at;
use crate::scanner::ScanState;
use crate::scanner::Strings;
use crate::scanner::find_keyword;

/// Offset of the first `class` keyword in top-level code.
pub fn find_class_keyword(source: &str) -> Option<usize> {
	let tokens = tokenize(source);
	find_keyword(source, &tokens, "class", 0..source.len())
}

/// Return the span from `start` (the keyword introducing the body) up to and
/// including the `}` that balances the first `{` after it.
///
/// Braces inside comments, strings and template literals are not counted.
pub fn extract_body_span(source: &str, start: usize) -> CompostResult<Range<usize>> {
	let tokens = tokenize(source);
	let mut state = ScanState::new();
	let mut depth = 0usize;

	for token in tokens.iter().filter(|token| token.start() >= start) {
		if state.at_top_level() {
			match token.kind {
				RawToken::BraceOpen | RawToken::TemplateExprOpen => depth += 1,
				RawToken::BraceClose if depth > 0 => {
					depth -= 1;
					if depth == 0 {
						return Ok(start..token.end());
					}
				}
				_ => {}
			}
		}

		state.advance(source, token, Strings::Track);
	}

	let point = point_at(source, start);
	Err(CompostError::UnbalancedBody {
		file: UNKNOWN_FILE.to_string(),
		line: point.line,
		column: point.column,
	})
}
