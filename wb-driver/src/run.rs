//! One invocation: check the inputs, pick a provider and a flag source, then
//! instrument each file in turn.

use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use wb_common::ToolError;
use wb_frontend::{
    AstProvider, ClangProvider, CompilationDatabase, ImportOptions, JsonFileProvider, ParseRequest,
};
use wb_instrument::{instrument, InstrumentConfig};

/// Where compiler flags for a file come from
enum FlagSource {
    /// `--ast-json`: nothing is compiled
    None,
    /// `--` arguments or `--build-path`
    Database(CompilationDatabase),
    /// Search upwards from each file
    PerFile,
}

/// Instrument every input, writing patched text to `out`.
///
/// Errors that concern the whole invocation are returned; errors for one
/// file are reported on stderr and the remaining files are still processed.
/// Returns whether every file succeeded.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<bool> {
    for file in &cli.files {
        if !file.exists() {
            return Err(ToolError::missing_file(file.clone()).into());
        }
    }
    if cli.ast_json.is_some() && cli.files.len() > 1 {
        bail!("--ast-json describes a single file, {} were given", cli.files.len());
    }

    let config = cli.instrument_config()?;
    let mut options = ImportOptions::default();
    options.system_dirs.extend(config.system_dirs.iter().cloned());

    let provider: Box<dyn AstProvider> = match &cli.ast_json {
        Some(dump) => Box::new(JsonFileProvider::new(dump.clone(), options)),
        None => {
            let clang = ClangProvider::locate(cli.clang.clone())?;
            debug!("using {}", clang.display());
            Box::new(ClangProvider::new(clang, options))
        }
    };

    let flags = if cli.ast_json.is_some() {
        FlagSource::None
    } else if !cli.compiler_args.is_empty() {
        FlagSource::Database(CompilationDatabase::fixed(cli.compiler_args.clone()))
    } else if let Some(dir) = &cli.build_path {
        FlagSource::Database(CompilationDatabase::load_from_dir(dir)?)
    } else {
        FlagSource::PerFile
    };

    let mut all_ok = true;
    for file in &cli.files {
        if let Err(e) = process_file(file, provider.as_ref(), &flags, &config, &mut *out) {
            eprintln!("insert-wb: error: {:#}", e);
            all_ok = false;
        }
    }
    Ok(all_ok)
}

fn process_file(
    file: &Path,
    provider: &dyn AstProvider,
    flags: &FlagSource,
    config: &InstrumentConfig,
    out: &mut impl Write,
) -> Result<()> {
    let source = fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let request = parse_request(file, flags)?;

    let tu = provider.parse(&request)?;
    let result = instrument(&tu, &source, config);
    info!("{}: {}", file.display(), result.report);

    result
        .patches
        .write_to(&source, &mut *out)
        .and_then(|()| out.flush())
        .or_else(ignore_broken_pipe)
        .with_context(|| format!("cannot write output for {}", file.display()))?;
    Ok(())
}

fn parse_request(file: &Path, flags: &FlagSource) -> Result<ParseRequest> {
    let mut request = ParseRequest::new(file);

    let detected;
    let database = match flags {
        FlagSource::None => return Ok(request),
        FlagSource::Database(database) => database,
        FlagSource::PerFile => {
            detected = CompilationDatabase::autodetect(file)?;
            match &detected {
                Some(database) => database,
                None => {
                    warn!(
                        "no compilation database found for {}; running clang without flags",
                        file.display()
                    );
                    return Ok(request);
                }
            }
        }
    };

    match database.flags_for(file) {
        Some(found) => {
            debug!("flags for {} from {}: {:?}", file.display(), database.describe(), found.args);
            request.compiler_args = found.args;
            request.working_dir = found.directory;
            request.system_dirs = found.system_dirs;
        }
        None => warn!(
            "{} has no entry for {}; running clang without flags",
            database.describe(),
            file.display()
        ),
    }
    Ok(request)
}

/// A closed stdout (`insert-wb gc.c | head`) is not a failure
fn ignore_broken_pipe(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        Ok(())
    } else {
        Err(e)
    }
}
