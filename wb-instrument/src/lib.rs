//! insert-wb - Write-barrier instrumentation
//!
//! This crate is the pass itself:
//! - Classifier: is a type a reference to a collector-tracked object?
//! - Scanner: which assignments store such a reference into such an object?
//! - Patcher: where does the barrier go in the original text?
//! - PatchSet: applying the insertions to produce the output
//!
//! ```text
//! TranslationUnit ──► Scanner ──► Classifier
//!                        │
//!                        ▼
//!                  SourcePatcher ──► PatchSet ──► patched text
//! ```

pub mod classifier;
pub mod config;
pub mod patch;
pub mod patcher;
pub mod report;
pub mod scanner;

#[cfg(test)]
mod fixtures;

pub use classifier::{Classifier, HeadField, Verdict};
pub use config::{AliasCheck, InstrumentConfig};
pub use patch::{Edit, PatchSet};
pub use patcher::{RecordOutcome, SourcePatcher};
pub use report::InstrumentReport;
pub use scanner::{Candidate, Scan, Scanner};

use log::info;
use wb_frontend::TranslationUnit;

/// Result of instrumenting one file
#[derive(Debug, Clone)]
pub struct Instrumented {
    pub patches: PatchSet,
    pub report: InstrumentReport,
}

/// Run the pass over `tu`, whose main file has the content `source`. The
/// source is taken as bytes and need not be UTF-8.
pub fn instrument<S: AsRef<[u8]> + ?Sized>(
    tu: &TranslationUnit,
    source: &S,
    config: &InstrumentConfig,
) -> Instrumented {
    let scan = Scanner::new(tu, config).scan();
    let mut patcher = SourcePatcher::new(tu.sources(), tu.main_file(), source, config);
    let mut report = InstrumentReport {
        assignments: scan.assignments,
        qualifying: scan.candidates.len(),
        ..InstrumentReport::default()
    };

    for candidate in &scan.candidates {
        let outcome = match candidate.anchor {
            Some(anchor) => patcher.record_barrier(tu.node(anchor).span.start),
            None => RecordOutcome::Unresolvable,
        };
        report.record(outcome);
    }

    info!("{}", report);
    Instrumented {
        patches: patcher.finish(),
        report,
    }
}

/// Run the pass and return the patched text
pub fn instrument_source(tu: &TranslationUnit, source: &str, config: &InstrumentConfig) -> String {
    instrument(tu, source, config).patches.apply(source)
}
