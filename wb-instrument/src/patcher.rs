//! Source patcher
//!
//! Turns statement start locations into barrier insertions. The barrier goes
//! on its own line right before the statement, and the statement keeps its
//! indentation. Locations that cannot be tied to a byte of the file being
//! processed are skipped, never guessed.

use crate::config::InstrumentConfig;
use crate::patch::{Edit, PatchSet};
use log::debug;
use wb_common::{FileId, LineIndex, SourceLocation, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// No position in the main file
    Unresolvable,
    /// The statement already has a barrier from this pass
    Duplicate,
    /// The statement already follows a barrier line
    AlreadyInstrumented,
}

pub struct SourcePatcher<'a> {
    sources: &'a SourceMap,
    file: Option<FileId>,
    text: &'a [u8],
    lines: LineIndex,
    config: &'a InstrumentConfig,
    patches: PatchSet,
}

impl<'a> SourcePatcher<'a> {
    /// Patcher for `text`, the content of `file`. The text is raw bytes;
    /// only ASCII whitespace and line endings are interpreted.
    pub fn new<T: AsRef<[u8]> + ?Sized>(
        sources: &'a SourceMap,
        file: Option<FileId>,
        text: &'a T,
        config: &'a InstrumentConfig,
    ) -> Self {
        let text = text.as_ref();
        Self {
            sources,
            file,
            text,
            lines: LineIndex::new(text),
            config,
            patches: PatchSet::new(),
        }
    }

    /// Request a barrier before the statement starting at `statement_start`
    pub fn record_barrier(&mut self, statement_start: SourceLocation) -> RecordOutcome {
        let Some(at) = statement_start.resolve() else {
            debug!("no barrier: statement has no source location");
            return RecordOutcome::Unresolvable;
        };
        let offset = at.offset as usize;
        if Some(at.file) != self.file || offset > self.text.len() {
            debug!(
                "no barrier: {} is outside the file being rewritten",
                self.sources.describe(&statement_start)
            );
            return RecordOutcome::Unresolvable;
        }

        if self.patches.contains(at.offset) {
            return RecordOutcome::Duplicate;
        }
        if self.config.skip_instrumented && self.follows_barrier(offset) {
            debug!(
                "no barrier: {} is already instrumented",
                self.sources.describe(&statement_start)
            );
            return RecordOutcome::AlreadyInstrumented;
        }

        let line_start = self.lines.line_start(at.offset) as usize;
        let indent = {
            let line = &self.text[line_start..offset];
            let end = line
                .iter()
                .position(|&b| b != b' ' && b != b'\t')
                .unwrap_or(line.len());
            String::from_utf8_lossy(&line[..end])
        };
        let newline = self.newline_at(offset);
        let text = format!("{}{}{}", self.config.barrier_call, newline, indent);

        debug!(
            "barrier before {}",
            self.sources.describe(&statement_start)
        );
        self.patches.insert(Edit { at, text });
        RecordOutcome::Recorded
    }

    /// Line ending used by the line containing `offset`
    fn newline_at(&self, offset: usize) -> &'static str {
        match self.text[offset..].iter().position(|&b| b == b'\n') {
            Some(end) if self.text[..offset + end].ends_with(b"\r") => "\r\n",
            Some(_) => "\n",
            // Last line without a terminator: follow the previous one
            None if self.text[..offset].windows(2).any(|w| w == b"\r\n") => "\r\n",
            None => "\n",
        }
    }

    /// The barrier text ends the same line before `offset` or the line above
    fn follows_barrier(&self, offset: usize) -> bool {
        let marker = self.config.barrier_call.trim().as_bytes();
        let line_start = self.lines.line_start(offset as u32) as usize;
        if self.text[line_start..offset].trim_ascii_end().ends_with(marker) {
            return true;
        }

        let line = self.lines.line_of(offset as u32);
        if line == 0 {
            return false;
        }
        match self.lines.start_of_line(line - 1) {
            Some(prev) => self.text[prev as usize..line_start]
                .trim_ascii()
                .ends_with(marker),
            None => false,
        }
    }

    pub fn patches(&self) -> &PatchSet {
        &self.patches
    }

    pub fn finish(self) -> PatchSet {
        self.patches
    }
}
