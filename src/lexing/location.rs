//! Source location utilities for converting byte offsets to line/column positions

use super::tokens::Position;

/// Provides fast conversion from byte offsets to line/column positions
pub struct SourceLocation<'a> {
    source: &'a str,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl<'a> SourceLocation<'a> {
    /// Create a new SourceLocation from source code
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];

        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }

        Self {
            source,
            line_starts,
        }
    }

    /// Convert a byte offset to a 1-based line/column position
    ///
    /// Columns count characters, so multi-byte characters advance the column by one.
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);

        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..byte_offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(byte_offset - line_start);

        Position::new(line + 1, column + 1, byte_offset)
    }
}
