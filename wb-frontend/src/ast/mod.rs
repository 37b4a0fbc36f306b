//! Typed syntax tree for one translation unit
//!
//! The unit owns every type, record and node in flat arenas addressed by
//! small ids. An AST provider fills it in once; afterwards it is read-only
//! for the whole pass.

pub mod nodes;
pub mod type_ref;
pub mod types;

pub use nodes::{Node, NodeKind};
pub use type_ref::TypeRef;
pub use types::{FieldDecl, QualType, Qualifiers, RecordDecl, TagKind, TypeKind};

use wb_common::{FileId, SourceMap};

/// Index of a type in the unit's type arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Index of a record declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

/// Index of a node in the syntax tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub(crate) sources: SourceMap,
    pub(crate) types: Vec<TypeKind>,
    pub(crate) records: Vec<RecordDecl>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl TranslationUnit {
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn main_file(&self) -> Option<FileId> {
        self.sources.main_file()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn type_kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0 as usize]
    }

    pub fn record(&self, id: RecordId) -> &RecordDecl {
        &self.records[id.0 as usize]
    }

    pub fn records(&self) -> &[RecordDecl] {
        &self.records
    }

    pub fn type_ref(&self, qt: QualType) -> TypeRef<'_> {
        TypeRef::new(self, qt)
    }

    /// Type of an expression node, if it has one
    pub fn expr_type(&self, id: NodeId) -> Option<TypeRef<'_>> {
        self.node(id).ty.map(|qt| self.type_ref(qt))
    }

    /// Skip compiler-inserted conversions to reach the expression as written
    pub fn ignore_implicit_casts(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::ImplicitCast(_) = self.node(id).kind {
            match self.node(id).children.first() {
                Some(&inner) => id = inner,
                None => break,
            }
        }
        id
    }
}
