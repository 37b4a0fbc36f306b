//! Error handling for insert-wb
//!
//! Hard failures abort processing of one input file. Soft outcomes, such as
//! an assignment whose statement cannot be rewritten, are not errors and
//! never show up here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("input file does not exist: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("malformed AST dump: {message}")]
    Json { message: String },

    #[error("compilation database error: {message}")]
    CompileDb { message: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl ToolError {
    pub fn missing_file(path: impl Into<PathBuf>) -> Self {
        ToolError::MissingFile { path: path.into() }
    }

    pub fn parse_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn compile_db(message: impl Into<String>) -> Self {
        ToolError::CompileDb {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ToolError::Config {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Io {
            message: err.to_string(),
        }
    }
}

/// Convert from serde_json::Error
impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Json {
            message: err.to_string(),
        }
    }
}
