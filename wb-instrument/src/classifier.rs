//! Type classification
//!
//! Decides whether a type denotes a reference to a collector-tracked object.
//! The test is structural and loose: any pointer to a record declared
//! outside the system headers counts.

use crate::config::InstrumentConfig;
use std::fmt;
use wb_common::SourceMap;
use wb_frontend::TypeRef;

/// What the head field of a tracked record looked like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadField {
    /// Starts with the configured header field
    Canonical,
    /// Starts with some other field
    Other(String),
    /// No fields visible in this unit
    ForwardDeclared,
}

/// Why a type is, or is not, a tracked heap pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    NotPointer,
    NotRecord,
    NoDeclLocation,
    SystemDefined,
    Tracked(HeadField),
}

impl Verdict {
    pub fn is_tracked(&self) -> bool {
        matches!(self, Verdict::Tracked(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::NotPointer => write!(f, "not a pointer"),
            Verdict::NotRecord => write!(f, "pointee is not a struct or union"),
            Verdict::NoDeclLocation => write!(f, "record has no declaration location"),
            Verdict::SystemDefined => write!(f, "record is declared in a system header"),
            Verdict::Tracked(HeadField::Canonical) => write!(f, "tracked"),
            Verdict::Tracked(HeadField::Other(name)) => {
                write!(f, "tracked (head field `{name}`)")
            }
            Verdict::Tracked(HeadField::ForwardDeclared) => write!(f, "tracked (forward declared)"),
        }
    }
}

pub struct Classifier<'a> {
    sources: &'a SourceMap,
    config: &'a InstrumentConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(sources: &'a SourceMap, config: &'a InstrumentConfig) -> Self {
        Self { sources, config }
    }

    /// Classify a type, keeping the reason
    pub fn classify(&self, ty: TypeRef<'_>) -> Verdict {
        let Some(pointee) = ty.desugar().pointee() else {
            return Verdict::NotPointer;
        };
        let Some(record) = pointee.desugar().as_elaborated_record() else {
            return Verdict::NotRecord;
        };

        if !record.location.is_valid() {
            return Verdict::NoDeclLocation;
        }
        if self.sources.is_in_system_header(&record.location) {
            return Verdict::SystemDefined;
        }

        // Advisory only: every user record is tracked, the head field just
        // says how confident the match is
        match record.head_field() {
            None => Verdict::Tracked(HeadField::ForwardDeclared),
            Some(field) if field.name == self.config.head_field => {
                Verdict::Tracked(HeadField::Canonical)
            }
            Some(field) => Verdict::Tracked(HeadField::Other(field.name.clone())),
        }
    }

    pub fn is_tracked_heap_pointer(&self, ty: TypeRef<'_>) -> bool {
        self.classify(ty).is_tracked()
    }

    /// Exact match of the spelling as written, aliases and qualifiers included
    pub fn is_opaque_tracked_reference(&self, ty: TypeRef<'_>) -> bool {
        ty.spelling() == self.config.opaque_alias
    }
}
