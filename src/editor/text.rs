//! Document text with line lookup
//!
//! Offsets are UTF-8 byte offsets into the document. Lines are split on `\n`
//! and never include the terminating newline.

use std::fmt;

/// An immutable document buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text(String);

/// A single line of a [`Text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    /// Offset of the first byte of the line
    pub from: usize,
    /// Offset just past the last byte of the line (before the newline)
    pub to: usize,
    /// The line content
    pub text: &'a str,
}

impl Line<'_> {
    /// Length of the line in bytes
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    /// Returns true for an empty line
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Document length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `pos` is inside the document and on a char boundary
    pub fn is_boundary(&self, pos: usize) -> bool {
        self.0.is_char_boundary(pos)
    }

    /// Returns the text between two offsets, or an empty string when the
    /// range is invalid
    pub fn slice(&self, from: usize, to: usize) -> &str {
        self.0.get(from..to).unwrap_or("")
    }

    /// Number of lines (an empty document has one empty line)
    pub fn line_count(&self) -> usize {
        self.0.bytes().filter(|b| *b == b'\n').count() + 1
    }

    /// Returns the line containing `pos`. Positions past the end resolve to
    /// the last line.
    pub fn line_at(&self, pos: usize) -> Line<'_> {
        let bytes = self.0.as_bytes();
        let pos = pos.min(bytes.len());

        let from = bytes[..pos]
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let to = bytes[pos..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|i| pos + i)
            .unwrap_or(bytes.len());
        let number = bytes[..from].iter().filter(|b| **b == b'\n').count() + 1;

        Line {
            number,
            from,
            to,
            text: &self.0[from..to],
        }
    }

    /// Returns the line with the given 1-based number
    pub fn line(&self, number: usize) -> Option<Line<'_>> {
        if number == 0 {
            return None;
        }

        let mut from = 0;
        for (idx, text) in self.0.split('\n').enumerate() {
            if idx + 1 == number {
                return Some(Line {
                    number,
                    from,
                    to: from + text.len(),
                    text,
                });
            }
            from += text.len() + 1;
        }
        None
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
