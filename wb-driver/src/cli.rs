use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wb_frontend::CLANG_ENV;
use wb_instrument::{AliasCheck, InstrumentConfig};

#[derive(Parser, Debug)]
#[command(
    name = "insert-wb",
    version,
    about = "Insert write barriers before stores of collector-tracked references"
)]
pub struct Cli {
    /// C source files to instrument; patched text goes to stdout
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Directory containing compile_commands.json
    #[arg(short = 'p', long = "build-path", value_name = "DIR")]
    pub build_path: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Barrier statement text [default: __write_barrier();]
    #[arg(long, value_name = "TEXT")]
    pub barrier: Option<String>,

    /// Opaque reference alias [default: VALUE]
    #[arg(long, value_name = "NAME")]
    pub opaque_alias: Option<String>,

    /// Canonical head field name [default: flag]
    #[arg(long, value_name = "NAME")]
    pub head_field: Option<String>,

    /// Which type the right operand's alias test uses [default: lhs]
    #[arg(long, value_name = "lhs|rhs")]
    pub rhs_alias_check: Option<AliasCheck>,

    /// Do not re-instrument statements already preceded by a barrier
    #[arg(long)]
    pub skip_instrumented: bool,

    /// Extra directory treated as a system header location
    #[arg(long = "system-dir", value_name = "DIR")]
    pub system_dirs: Vec<PathBuf>,

    /// clang executable
    #[arg(long, value_name = "PATH", env = CLANG_ENV)]
    pub clang: Option<PathBuf>,

    /// Read a pre-dumped clang JSON AST instead of running clang (single input)
    #[arg(long, value_name = "FILE")]
    pub ast_json: Option<PathBuf>,

    /// Enable logging (same as RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Compiler flags applied to every file, instead of a compilation database
    #[arg(last = true, value_name = "COMPILER_ARGS")]
    pub compiler_args: Vec<String>,
}

impl Cli {
    /// The configuration file, if any, with command line values on top
    pub fn instrument_config(&self) -> Result<InstrumentConfig> {
        let mut config = match &self.config {
            Some(path) => InstrumentConfig::from_json_file(path)?,
            None => InstrumentConfig::default(),
        };

        if let Some(barrier) = &self.barrier {
            config.barrier_call = barrier.clone();
        }
        if let Some(alias) = &self.opaque_alias {
            config.opaque_alias = alias.clone();
        }
        if let Some(field) = &self.head_field {
            config.head_field = field.clone();
        }
        if let Some(check) = self.rhs_alias_check {
            config.rhs_alias_check = check;
        }
        if self.skip_instrumented {
            config.skip_instrumented = true;
        }
        config.system_dirs.extend(self.system_dirs.iter().cloned());

        config
            .validate()
            .context("invalid command line options")?;
        Ok(config)
    }
}
