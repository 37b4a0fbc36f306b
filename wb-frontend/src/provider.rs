//! AST providers
//!
//! The instrumentation pass only needs a typed tree; where it comes from is
//! behind [`AstProvider`]. [`ClangProvider`] runs clang and imports its JSON
//! dump, [`JsonFileProvider`] imports a dump saved earlier.

use crate::ast::TranslationUnit;
use crate::clang::{import, ImportOptions};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use wb_common::ToolError;

/// Environment variable naming the clang binary
pub const CLANG_ENV: &str = "INSERT_WB_CLANG";

/// One file to parse, with the flags the build uses for it
#[derive(Debug, Clone, Default)]
pub struct ParseRequest {
    pub path: PathBuf,
    pub compiler_args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Extra system header directories (`-isystem`)
    pub system_dirs: Vec<PathBuf>,
}

impl ParseRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

pub trait AstProvider {
    fn parse(&self, request: &ParseRequest) -> Result<TranslationUnit, ToolError>;
}

fn options_for(base: &ImportOptions, request: &ParseRequest) -> ImportOptions {
    let mut options = base.clone();
    options.system_dirs.extend(request.system_dirs.iter().cloned());
    if let Some(dir) = &request.working_dir {
        options.working_dir = Some(dir.clone());
    }
    options
}

/// Parses by running `clang -fsyntax-only -Xclang -ast-dump=json`
#[derive(Debug, Clone)]
pub struct ClangProvider {
    clang: PathBuf,
    options: ImportOptions,
}

impl ClangProvider {
    pub fn new(clang: PathBuf, options: ImportOptions) -> Self {
        Self { clang, options }
    }

    /// Find clang: an explicit path wins, then `clang` on `PATH`
    pub fn locate(explicit: Option<PathBuf>) -> Result<PathBuf, ToolError> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        which::which("clang").map_err(|e| {
            ToolError::config(format!(
                "cannot find clang ({}); pass --clang or set {}",
                e, CLANG_ENV
            ))
        })
    }

    pub fn clang(&self) -> &Path {
        &self.clang
    }
}

impl AstProvider for ClangProvider {
    fn parse(&self, request: &ParseRequest) -> Result<TranslationUnit, ToolError> {
        let path = fs::canonicalize(&request.path)?;

        let mut command = Command::new(&self.clang);
        command
            .args(["-fsyntax-only", "-fno-color-diagnostics", "-Xclang", "-ast-dump=json"])
            .args(&request.compiler_args)
            .arg(&path);
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }
        debug!("running {:?}", command);

        let output = command.output().map_err(|e| {
            ToolError::parse_error(
                request.path.display().to_string(),
                format!("cannot run {}: {}", self.clang.display(), e),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::parse_error(
                request.path.display().to_string(),
                stderr.trim().to_string(),
            ));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        info!("parsed {} ({} bytes of AST)", request.path.display(), json.len());
        import(&json, &options_for(&self.options, request))
    }
}

/// Imports a dump produced earlier, whatever file the request names
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    dump: PathBuf,
    options: ImportOptions,
}

impl JsonFileProvider {
    pub fn new(dump: PathBuf, options: ImportOptions) -> Self {
        Self { dump, options }
    }
}

impl AstProvider for JsonFileProvider {
    fn parse(&self, request: &ParseRequest) -> Result<TranslationUnit, ToolError> {
        let json = fs::read_to_string(&self.dump)?;
        debug!(
            "using saved AST {} for {}",
            self.dump.display(),
            request.path.display()
        );
        import(&json, &options_for(&self.options, request))
    }
}
