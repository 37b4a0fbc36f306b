//! Decoding of clang JSON source locations
//!
//! clang writes `file` only when it differs from the previously written
//! location and `line` only when file or line changed. The decoder keeps the
//! same "last written" state and must see every location in document order:
//! `loc`, then `range.begin`, then `range.end`, then the children, with
//! `spellingLoc` before `expansionLoc` inside a macro location.

use super::dump::DumpLoc;
use crate::compile_db::normalize;
use log::trace;
use std::path::{Path, PathBuf};
use wb_common::{FileId, FileKind, FileLocation, SourceLocation, SourceMap};

/// Directories whose headers count as system headers unless configured otherwise
pub const DEFAULT_SYSTEM_DIRS: &[&str] = &[
    "/usr/include",
    "/usr/local/include",
    "/usr/lib/clang",
    "/usr/lib/gcc",
    "/usr/lib/llvm",
    "/opt/homebrew/include",
    "/Library/Developer/CommandLineTools",
    "/Applications/Xcode.app",
];

#[derive(Debug)]
pub struct LocationDecoder {
    system_dirs: Vec<PathBuf>,
    /// Relative paths in the dump are relative to this directory
    base: PathBuf,
    last_file: Option<FileId>,
    last_line: u32,
}

impl LocationDecoder {
    pub fn new(system_dirs: Vec<PathBuf>, base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let system_dirs = system_dirs.iter().map(|dir| normalize(dir, &base)).collect();
        Self {
            system_dirs,
            base,
            last_file: None,
            last_line: 0,
        }
    }

    pub fn decode(&mut self, loc: &DumpLoc, sources: &mut SourceMap) -> SourceLocation {
        if !loc.is_macro() {
            return match self.decode_bare(loc, sources) {
                Some(location) => SourceLocation::File(location),
                None => SourceLocation::Invalid,
            };
        }

        let spelling = loc
            .spelling_loc
            .as_deref()
            .and_then(|spelling| self.decode_bare(spelling, sources));
        let expansion = loc
            .expansion_loc
            .as_deref()
            .and_then(|expansion| self.decode_bare(expansion, sources).map(|at| (at, expansion)));

        match expansion {
            Some((expansion, raw)) => SourceLocation::Macro {
                spelling,
                expansion,
                macro_arg: raw.is_macro_arg_expansion,
            },
            None => SourceLocation::Invalid,
        }
    }

    fn decode_bare(&mut self, loc: &DumpLoc, sources: &mut SourceMap) -> Option<FileLocation> {
        // No offset means clang wrote nothing and its state did not move
        let offset = loc.offset?;

        if let Some(path) = &loc.file {
            let kind = self.classify(path, loc.included_from.is_some());
            let id = sources.add_file(path, kind);
            if self.last_file != Some(id) {
                trace!("location stream entered {} ({})", path, kind);
            }
            self.last_file = Some(id);
            if let Some(line) = loc.line {
                self.last_line = line;
            }
        } else if let Some(line) = loc.line {
            self.last_line = line;
        }

        let file = self.last_file?;
        Some(FileLocation::new(
            file,
            offset,
            self.last_line,
            loc.col.unwrap_or(0),
        ))
    }

    /// Decide what kind of file a path names the first time it is seen
    pub fn classify(&self, path: &str, included: bool) -> FileKind {
        if path.starts_with('<') {
            FileKind::Builtin
        } else if !included {
            FileKind::Main
        } else if self.is_system_path(path) {
            FileKind::SystemHeader
        } else {
            FileKind::Header
        }
    }

    fn is_system_path(&self, path: &str) -> bool {
        let path = normalize(Path::new(path), &self.base);
        self.system_dirs.iter().any(|dir| path.starts_with(dir))
    }
}
