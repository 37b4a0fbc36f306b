//! File table for one translation unit
//!
//! Every location points at a [`FileId`]; the source map records what each
//! file is. The classifier asks it whether a declaration lives in a system
//! header, the patcher asks it which file is being rewritten.

use crate::source_loc::{FileId, SourceLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// What kind of file a location lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// The file being processed
    Main,
    /// A project header
    Header,
    /// A header from a system or library include directory
    SystemHeader,
    /// Compiler pseudo files such as `<built-in>` or `<scratch space>`
    Builtin,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Main => write!(f, "main"),
            FileKind::Header => write!(f, "header"),
            FileKind::SystemHeader => write!(f, "system header"),
            FileKind::Builtin => write!(f, "built-in"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    pub path: String,
    pub kind: FileKind,
}

#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    by_path: HashMap<String, FileId>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. A path already present keeps its first id and kind.
    pub fn add_file(&mut self, path: &str, kind: FileKind) -> FileId {
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            id,
            path: path.to_string(),
            kind,
        });
        self.by_path.insert(path.to_string(), id);
        id
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    pub fn lookup(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The file being processed
    pub fn main_file(&self) -> Option<FileId> {
        self.files
            .iter()
            .find(|file| file.kind == FileKind::Main)
            .map(|file| file.id)
    }

    pub fn kind_of(&self, location: &SourceLocation) -> Option<FileKind> {
        let resolved = location.resolve()?;
        self.file(resolved.file).map(|file| file.kind)
    }

    /// True if the location's point of use is inside a system header
    pub fn is_in_system_header(&self, location: &SourceLocation) -> bool {
        self.kind_of(location) == Some(FileKind::SystemHeader)
    }

    pub fn is_in_main_file(&self, location: &SourceLocation) -> bool {
        self.kind_of(location) == Some(FileKind::Main)
    }

    /// `path:line:col` for diagnostics
    pub fn describe(&self, location: &SourceLocation) -> String {
        match location.resolve() {
            Some(resolved) => {
                let path = self
                    .file(resolved.file)
                    .map(|file| file.path.as_str())
                    .unwrap_or("<unknown>");
                format!("{}:{}:{}", path, resolved.line, resolved.column)
            }
            None => "<invalid>".to_string(),
        }
    }
}
