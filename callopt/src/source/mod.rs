///
/// Source Location and Span Module
///
/// Call expressions arrive from the front end already parsed, but every
/// call and parameter still carries the Span it was parsed from so compile
/// errors can point back at the original text.
///
/// Key types:
/// - Span: A range in source code (start offset, end offset, file id)
/// - Spanned: Trait for types that have an associated span
/// - SourceFile: Named source text used to turn offsets into line/column
///
/// Offsets are byte-based, not character-based.
///

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub file_id: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32, file_id: u32) -> Self {
        Self { start, end, file_id }
    }

    pub const fn dummy() -> Self {
        Self { start: 0, end: 0, file_id: 0 }
    }

    /// Spans come from unit files, so an inverted range is treated as empty.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}@{}", self.start, self.end, self.file_id)
    }
}

pub trait Spanned {
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i as u32 + 1),
            )
            .collect();

        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let col = offset - self.line_starts[line];
        (line + 1, col as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        assert_eq!(Span::new(10, 20, 0).len(), 10);
        assert_eq!(Span::new(30, 10, 0).len(), 0);
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new("test.zep", "let a = 1;\nlet parts = explode(\",\", s);\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(4), (1, 5));
        assert_eq!(file.line_col(11), (2, 1));
        assert_eq!(file.line_col(23), (2, 13));
    }
}
