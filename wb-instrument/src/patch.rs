//! Insert-only edits and their application
//!
//! A [`PatchSet`] holds the edits for one file, keyed by byte offset. It is
//! filled while the tree is scanned and consumed once, producing the patched
//! text; everything between insertion points is copied through untouched.

use log::warn;
use std::collections::BTreeMap;
use std::io::{self, Write};
use wb_common::FileLocation;

/// Text to insert immediately before a position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub at: FileLocation,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    edits: BTreeMap<u32, Edit>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit. Returns false, keeping the first edit, if the position
    /// already has one.
    pub fn insert(&mut self, edit: Edit) -> bool {
        if self.edits.contains_key(&edit.at.offset) {
            return false;
        }
        self.edits.insert(edit.at.offset, edit);
        true
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.edits.contains_key(&offset)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits in ascending position order
    pub fn edits(&self) -> impl Iterator<Item = &Edit> {
        self.edits.values()
    }

    /// Apply every edit to a copy of `original`
    pub fn apply(self, original: &str) -> String {
        String::from_utf8_lossy(&self.apply_bytes(original.as_bytes())).into_owned()
    }

    /// Apply every edit to a copy of `original`, which need not be UTF-8
    pub fn apply_bytes(self, original: &[u8]) -> Vec<u8> {
        let inserted: usize = self.edits.values().map(|edit| edit.text.len()).sum();
        let mut out = Vec::with_capacity(original.len() + inserted);
        for piece in self.pieces(original) {
            out.extend_from_slice(piece);
        }
        out
    }

    /// Stream the patched text
    pub fn write_to<W: Write>(self, original: &[u8], out: &mut W) -> io::Result<()> {
        for piece in self.pieces(original) {
            out.write_all(piece)?;
        }
        out.flush()
    }

    /// Original bytes interleaved with inserted text, in order
    fn pieces<'s>(&'s self, original: &'s [u8]) -> Vec<&'s [u8]> {
        let mut pieces = Vec::with_capacity(self.edits.len() * 2 + 1);
        let mut pos = 0;
        for (&offset, edit) in &self.edits {
            let offset = offset as usize;
            if offset > original.len() {
                warn!("dropping edit at {} outside the text", edit.at);
                continue;
            }
            pieces.push(&original[pos..offset]);
            pieces.push(edit.text.as_bytes());
            pos = offset;
        }
        pieces.push(&original[pos..]);
        pieces
    }
}
