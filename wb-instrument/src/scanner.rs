//! Assignment scanner
//!
//! Walks the whole unit once, in pre-order, and picks out the simple
//! assignments that store a tracked reference into a field or array slot.
//! Each one comes with the block item it belongs to, which is where the
//! barrier will be inserted.

use crate::classifier::{Classifier, Verdict};
use crate::config::{AliasCheck, InstrumentConfig};
use log::{debug, trace};
use wb_frontend::{NodeId, NodeKind, TranslationUnit};

/// An assignment that needs a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub assignment: NodeId,
    /// Innermost block item containing the assignment, `None` outside any
    /// function body
    pub anchor: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Simple assignments visited
    pub assignments: usize,
    /// Assignments needing a barrier, in source order
    pub candidates: Vec<Candidate>,
}

pub struct Scanner<'a> {
    tu: &'a TranslationUnit,
    classifier: Classifier<'a>,
    config: &'a InstrumentConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(tu: &'a TranslationUnit, config: &'a InstrumentConfig) -> Self {
        Self {
            tu,
            classifier: Classifier::new(tu.sources(), config),
            config,
        }
    }

    pub fn scan(&self) -> Scan {
        let mut scan = Scan::default();
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(self.tu.root(), None)];

        while let Some((id, anchor)) = stack.pop() {
            let node = self.tu.node(id);
            match &node.kind {
                NodeKind::Assign => {
                    scan.assignments += 1;
                    if self.needs_barrier(id) {
                        scan.candidates.push(Candidate {
                            assignment: id,
                            anchor,
                        });
                    }
                }
                NodeKind::CompoundAssign(op) => {
                    trace!("{}: `{}` is never instrumented", self.describe(id), op);
                }
                _ => {}
            }

            let in_block = matches!(node.kind, NodeKind::Compound);
            for &child in node.children.iter().rev() {
                let child_anchor = if in_block {
                    Some(self.block_item(child))
                } else {
                    anchor
                };
                stack.push((child, child_anchor));
            }
        }

        scan
    }

    /// Does this assignment store a tracked reference into a tracked slot?
    pub fn needs_barrier(&self, assignment: NodeId) -> bool {
        let tu = self.tu;
        let Some((lhs, rhs)) = tu.node(assignment).operands() else {
            return false;
        };

        if !tu.node(lhs).kind.is_store_target() {
            trace!("{}: not a field or element store", self.describe(assignment));
            return false;
        }

        let (Some(lhs_ty), Some(written), Some(converted)) = (
            tu.expr_type(lhs),
            tu.expr_type(tu.ignore_implicit_casts(rhs)),
            tu.expr_type(rhs),
        ) else {
            return false;
        };

        let lhs_verdict = self.classifier.classify(lhs_ty);
        let lhs_opaque = self.classifier.is_opaque_tracked_reference(lhs_ty);
        if lhs_verdict == Verdict::SystemDefined || (!lhs_verdict.is_tracked() && !lhs_opaque) {
            debug!(
                "{}: no barrier, target `{}` {}",
                self.describe(assignment),
                lhs_ty,
                lhs_verdict
            );
            return false;
        }

        // The value as written decides, unless it is not a record pointer at
        // all (array decay, `void *`, null); then the converted type does
        let (rhs_ty, rhs_verdict) = match self.classifier.classify(written) {
            Verdict::NotPointer | Verdict::NotRecord => {
                (converted, self.classifier.classify(converted))
            }
            verdict => (written, verdict),
        };
        if rhs_verdict == Verdict::SystemDefined {
            debug!(
                "{}: no barrier, stored value `{}` {}",
                self.describe(assignment),
                rhs_ty,
                rhs_verdict
            );
            return false;
        }

        let rhs_opaque = match self.config.rhs_alias_check {
            AliasCheck::Lhs => lhs_opaque,
            AliasCheck::Rhs => self.classifier.is_opaque_tracked_reference(written),
        };
        if !rhs_verdict.is_tracked() && !rhs_opaque {
            debug!(
                "{}: no barrier, stored value `{}` {}",
                self.describe(assignment),
                rhs_ty,
                rhs_verdict
            );
            return false;
        }

        debug!(
            "{}: barrier needed, `{}` stored into `{}`",
            self.describe(assignment),
            rhs_ty,
            lhs_ty
        );
        true
    }

    /// The statement a block child stands for, looking through labels
    fn block_item(&self, mut id: NodeId) -> NodeId {
        while self.tu.node(id).kind.is_label() {
            match self.tu.node(id).children.last() {
                Some(&sub) => id = sub,
                None => break,
            }
        }
        id
    }

    fn describe(&self, id: NodeId) -> String {
        self.tu.sources().describe(&self.tu.node(id).span.start)
    }
}
