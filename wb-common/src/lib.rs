//! insert-wb - Common Types and Utilities
//!
//! This crate contains the pieces shared by the AST provider, the
//! instrumentation pass and the driver: source locations, the file table
//! that knows which files are system headers, and the tool error type.

pub mod error;
pub mod source_loc;
pub mod source_map;

pub use error::ToolError;
pub use source_loc::{FileId, FileLocation, LineIndex, SourceLocation, SourceSpan};
pub use source_map::{FileKind, SourceFile, SourceMap};
