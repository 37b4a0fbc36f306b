//! Source location tracking
//!
//! Locations are not raw byte offsets. A location either points into a file
//! directly, or it was produced by macro expansion, in which case it carries
//! both the place the tokens were spelled and the place the macro was used.
//! Rewriting always happens at the point of use.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Index of a file in a [`crate::SourceMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A concrete position in a file (offset is in bytes, line and column are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub file: FileId,
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl FileLocation {
    pub fn new(file: FileId, offset: u32, line: u32, column: u32) -> Self {
        Self {
            file,
            offset,
            line,
            column,
        }
    }
}

/// Positions are only ordered within one file
impl PartialOrd for FileLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.file != other.file {
            return None;
        }
        Some(self.offset.cmp(&other.offset))
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A location in the translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceLocation {
    /// Compiler-synthesized, no position at all
    #[default]
    Invalid,

    /// Written directly in a file
    File(FileLocation),

    /// Produced by a macro expansion
    Macro {
        /// Where the tokens were spelled (macro body or argument), if known
        spelling: Option<FileLocation>,
        /// Where the macro was used
        expansion: FileLocation,
        /// True when the tokens come from a macro argument
        macro_arg: bool,
    },
}

impl SourceLocation {
    pub fn file(location: FileLocation) -> Self {
        SourceLocation::File(location)
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, SourceLocation::Invalid)
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, SourceLocation::Macro { .. })
    }

    /// Resolve to the concrete position a rewrite would touch.
    ///
    /// Macro locations resolve to their point of use, never to the macro
    /// definition.
    pub fn resolve(&self) -> Option<FileLocation> {
        match self {
            SourceLocation::Invalid => None,
            SourceLocation::File(location) => Some(*location),
            SourceLocation::Macro { expansion, .. } => Some(*expansion),
        }
    }

    /// Where the tokens were actually written
    pub fn spelling(&self) -> Option<FileLocation> {
        match self {
            SourceLocation::Invalid => None,
            SourceLocation::File(location) => Some(*location),
            SourceLocation::Macro { spelling, .. } => *spelling,
        }
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.resolve(), other.resolve()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }
}

impl From<FileLocation> for SourceLocation {
    fn from(location: FileLocation) -> Self {
        SourceLocation::File(location)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Invalid => write!(f, "<invalid>"),
            SourceLocation::File(location) => write!(f, "{location}"),
            SourceLocation::Macro { expansion, .. } => write!(f, "{expansion} (macro)"),
        }
    }
}

/// A span in a source file (from start to end location)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Create a span from a single location
    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            start: location,
            end: location,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Line table for one file's text.
///
/// Turns byte offsets into line/column pairs and finds line boundaries,
/// which is all the patcher needs to place text on its own line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new<T: AsRef<[u8]> + ?Sized>(text: &T) -> Self {
        let text = text.as_ref();
        let mut line_starts = vec![0];
        for (i, &byte) in text.iter().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// Zero-based line containing `offset`
    pub fn line_of(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Offset of the first byte of the line containing `offset`
    pub fn line_start(&self, offset: u32) -> u32 {
        self.line_starts[self.line_of(offset)]
    }

    /// Offset of the first byte of the zero-based `line`, if it exists
    pub fn start_of_line(&self, line: usize) -> Option<u32> {
        self.line_starts.get(line).copied()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Build the full location for `offset` (clamped to the end of text)
    pub fn location(&self, file: FileId, offset: u32) -> FileLocation {
        let offset = offset.min(self.len);
        let line = self.line_of(offset);
        let column = offset - self.line_starts[line] + 1;
        FileLocation::new(file, offset, line as u32 + 1, column)
    }
}
