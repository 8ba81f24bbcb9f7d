//! Source position tracking.

use core::fmt;

/// A position in a byte stream: absolute offset plus 1-based line/column.
///
/// `\r`, `\n`, and `\r\n` are all treated as a single line break (see
/// [`Position::advance`]); column counts bytes, not Unicode grapheme clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Absolute byte offset from the start of the stream.
    pub offset: u64,
    /// 1-based line number.
    pub line: u64,
    /// 1-based byte column.
    pub column: u64,
}

impl Position {
    /// The position at the very start of a stream: offset 0, line 1, column 1.
    pub const START: Self = Self {
        offset: 0,
        line: 1,
        column: 1,
    };

    /// Creates the starting position.
    #[inline]
    pub const fn new() -> Self {
        Self::START
    }

    /// Advances this position past a single consumed byte.
    ///
    /// `prev` is the byte consumed immediately before `byte` (or `None` at
    /// the start of the stream), needed to detect a `\r\n` pair so it counts
    /// as one line break rather than two.
    #[inline]
    pub fn advance(&mut self, byte: u8, prev: Option<u8>) {
        self.offset += 1;
        match byte {
            b'\n' => {
                if prev == Some(b'\r') {
                    // second half of a \r\n pair: already counted on the \r
                } else {
                    self.line += 1;
                    self.column = 1;
                }
            }
            b'\r' => {
                self.line += 1;
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
    }
}

impl Default for Position {
    #[inline]
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
