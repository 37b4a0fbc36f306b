use crate::patcher::RecordOutcome;
use serde::Serialize;
use std::fmt;

/// What one run of the pass did to one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstrumentReport {
    /// Simple assignments visited
    pub assignments: usize,
    /// Assignments that need a barrier
    pub qualifying: usize,
    pub barriers: usize,
    pub unresolvable: usize,
    pub duplicates: usize,
    pub already_instrumented: usize,
}

impl InstrumentReport {
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Recorded => self.barriers += 1,
            RecordOutcome::Unresolvable => self.unresolvable += 1,
            RecordOutcome::Duplicate => self.duplicates += 1,
            RecordOutcome::AlreadyInstrumented => self.already_instrumented += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.unresolvable + self.duplicates + self.already_instrumented
    }
}

impl fmt::Display for InstrumentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} assignments, {} need a barrier, {} inserted",
            self.assignments, self.qualifying, self.barriers
        )?;
        if self.skipped() > 0 {
            write!(
                f,
                " ({} unresolvable, {} duplicate, {} already instrumented)",
                self.unresolvable, self.duplicates, self.already_instrumented
            )?;
        }
        Ok(())
    }
}
