/// A 1-indexed line/column location together with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

/// Pre-computed table of line-start byte offsets for offset-to-point
/// conversion. Built once per source (O(n)), queried with a binary search.
pub struct LineTable {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	pub fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	pub fn point(&self, offset: usize) -> Point {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};

		Point {
			line: line_idx + 1,
			column: offset - self.line_starts[line_idx] + 1,
			offset,
		}
	}
}

/// Convert a single offset without keeping the table around.
pub fn point_at(content: &str, offset: usize) -> Point {
	LineTable::new(content).point(offset)
}
