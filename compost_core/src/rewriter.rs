use std::ops::Range;

use crate::lexer::RawToken;
use crate::lexer::tokenize;
use crate::position::point_at;
use crate::scanner::ScanState;
use crate::scanner::Strings;
use crate::tokens::TagMatch;
use crate::tokens::Token;
use crate::tokens::match_tag;

/// The runtime function that turns a markup string into an element.
pub const RENDER_HELPER: &str = "renderCompostHTML";

/// The reserved tag whose content becomes the component's own `innerHTML`.
pub const DEFAULT_SELF_RENDER_TAG: &str = "This";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
	/// Root tag name rewritten to a direct `this.innerHTML` assignment.
	pub self_render_tag: String,
}

impl Default for RewriteOptions {
	fn default() -> Self {
		Self {
			self_render_tag: DEFAULT_SELF_RENDER_TAG.to_string(),
		}
	}
}

/// A balanced, top-level markup region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupBlock {
	/// Byte span of the region in the input source.
	pub span: Range<usize>,
	/// Name of the outermost tag.
	pub root: String,
	/// The region's text with self-closing custom tags expanded.
	pub markup: String,
	/// Range of `markup` between the root's opening and closing tags.
	pub inner: Range<usize>,
}

/// The source split into untouched code and markup regions, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Code(Range<usize>),
	Markup(MarkupBlock),
}

/// A markup block that is still being collected.
struct OpenBlock {
	start: usize,
	root: String,
	depth: usize,
	markup: String,
	root_end: usize,
	/// Token index and scanner state at the opening tag, restored when the
	/// block never closes.
	cursor: usize,
	state: ScanState,
}

/// Walks the token stream, collecting markup blocks into segments.
struct MarkupWalker<'a> {
	source: &'a str,
	tokens: Vec<Token>,
	cursor: usize,
	state: ScanState,
	block: Option<OpenBlock>,
	segments: Vec<Segment>,
	code_start: usize,
	/// Offsets of opening tags whose block ran to the end of input.
	rejected: Vec<usize>,
}

impl<'a> MarkupWalker<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			tokens: tokenize(source),
			cursor: 0,
			state: ScanState::new(),
			block: None,
			segments: vec![],
			code_start: 0,
			rejected: vec![],
		}
	}

	fn process(mut self) -> Vec<Segment> {
		loop {
			self.walk();

			let Some(block) = self.block.take() else {
				break;
			};

			// Comparisons like `i<n; ... =>` look like an opening tag. Leave the
			// region as code and rescan from just after the `<`.
			let point = point_at(self.source, block.start);
			tracing::warn!(
				tag = %block.root,
				line = point.line,
				column = point.column,
				"markup block never closes, leaving it as code"
			);
			self.rejected.push(block.start);
			self.cursor = block.cursor;
			self.state = block.state;
		}

		if self.code_start < self.source.len() {
			self.segments
				.push(Segment::Code(self.code_start..self.source.len()));
		}

		self.segments
	}

	fn walk(&mut self) {
		while self.cursor < self.tokens.len() {
			let token = self.tokens[self.cursor].clone();
			let in_block = self.block.is_some();

			if token.kind == RawToken::AngleOpen {
				let detect = if in_block {
					!self.state.in_comment()
				} else {
					self.state.at_top_level() && !self.rejected.contains(&token.start())
				};

				if let Some(tag) = detect
					.then(|| match_tag(self.source, token.start()))
					.flatten()
					.filter(|tag| in_block || !tag.closing)
				{
					self.push_tag(&tag, token.start());
					continue;
				}
			}

			if let Some(block) = &mut self.block {
				block.markup.push_str(token.text(self.source));
				self.state.advance(self.source, &token, Strings::Ignore);
			} else {
				self.state.advance(self.source, &token, Strings::Track);
			}

			self.cursor += 1;
		}
	}

	/// Consume a matched tag at `offset`, opening a block if none is open and
	/// closing it once the depth returns to zero.
	fn push_tag(&mut self, tag: &TagMatch, offset: usize) {
		let source = self.source;
		let end = offset + tag.len;
		let raw = &source[offset..end];

		if self.block.is_none() {
			self.block = Some(OpenBlock {
				start: offset,
				root: tag.name.clone(),
				depth: 0,
				markup: String::new(),
				root_end: 0,
				cursor: self.cursor,
				state: self.state.clone(),
			});
		}

		let Some(block) = self.block.as_mut() else {
			return;
		};

		let tag_start = block.markup.len();
		if tag.self_closing && tag.is_custom() {
			block.markup.push_str(&tag.expand(raw));
		} else {
			block.markup.push_str(raw);
		}

		if tag_start == 0 {
			block.root_end = block.markup.len();
		}

		if !tag.is_standalone() {
			if tag.closing {
				block.depth = block.depth.saturating_sub(1);
			} else {
				block.depth += 1;
			}
		}

		// Tags never end inside a multi-byte token since `>` is always its own
		// token, so skipping by span lands exactly on the next token.
		while self.cursor < self.tokens.len() && self.tokens[self.cursor].start() < end {
			self.cursor += 1;
		}

		if block.depth > 0 {
			return;
		}

		let inner = if tag_start == 0 {
			block.root_end..block.root_end
		} else {
			block.root_end..tag_start
		};

		let Some(block) = self.block.take() else {
			return;
		};

		tracing::trace!(root = %block.root, start = block.start, end, "markup block closed");

		if self.code_start < block.start {
			self.segments.push(Segment::Code(self.code_start..block.start));
		}

		self.segments.push(Segment::Markup(MarkupBlock {
			span: block.start..end,
			root: block.root,
			markup: block.markup,
			inner,
		}));
		self.code_start = end;
	}
}

/// Split `source` into code and balanced markup regions. A region that never
/// closes is left as code.
pub fn scan_markup(source: &str) -> Vec<Segment> {
	MarkupWalker::new(source).process()
}

/// Rewrite every markup block in `source` with the default options.
pub fn rewrite_markup(source: &str) -> String {
	rewrite_markup_with_options(source, &RewriteOptions::default())
}

/// Rewrite every markup block in `source` into a runtime expression. The
/// result is built in a fresh buffer; `source` is never modified.
pub fn rewrite_markup_with_options(source: &str, options: &RewriteOptions) -> String {
	let segments = scan_markup(source);
	let mut output = String::with_capacity(source.len());

	for segment in &segments {
		match segment {
			Segment::Code(range) => output.push_str(&source[range.clone()]),
			Segment::Markup(block) => output.push_str(&render_block(block, options)),
		}
	}

	output
}

/// Render a single block as either a self-render assignment or a render
/// helper call.
pub fn render_block(block: &MarkupBlock, options: &RewriteOptions) -> String {
	if block.root == options.self_render_tag {
		let inner = transform_markup(&block.markup[block.inner.clone()]);
		format!("this.innerHTML = `{inner}`")
	} else {
		let markup = transform_markup(&block.markup);
		format!("{RENDER_HELPER}(`{markup}`)")
	}
}

/// Turn markup into the body of a template literal: `{/* x */}` becomes
/// `<!-- x -->`, top-level `{expr}` becomes `${expr}`, and backticks and
/// backslashes in literal text are escaped.
pub fn transform_markup(markup: &str) -> String {
	interpolate(&convert_comments(markup))
}

fn convert_comments(markup: &str) -> String {
	let mut output = String::with_capacity(markup.len());
	let mut rest = markup;

	while let Some(open) = rest.find("{/*") {
		let after = &rest[open + 3..];
		let Some(close) = after.find("*/}") else {
			break;
		};

		output.push_str(&rest[..open]);
		output.push_str("<!--");
		output.push_str(&after[..close]);
		output.push_str("-->");
		rest = &after[close + 3..];
	}

	output.push_str(rest);
	output
}

fn interpolate(markup: &str) -> String {
	let mut output = String::with_capacity(markup.len() + 8);
	let mut depth = 0usize;
	let mut quote: Option<char> = None;
	let mut escaped = false;

	for ch in markup.chars() {
		if let Some(open) = quote {
			output.push(ch);
			if escaped {
				escaped = false;
			} else if ch == '\\' {
				escaped = true;
			} else if ch == open {
				quote = None;
			}
			continue;
		}

		match ch {
			'{' if depth == 0 => {
				output.push_str("${");
				depth = 1;
			}
			'{' => {
				depth += 1;
				output.push(ch);
			}
			'}' if depth > 0 => {
				depth -= 1;
				output.push(ch);
			}
			'"' | '\'' | '`' if depth > 0 => {
				quote = Some(ch);
				output.push(ch);
			}
			'`' | '\\' if depth == 0 => {
				output.push('\\');
				output.push(ch);
			}
			_ => output.push(ch),
		}
	}

	output
}
