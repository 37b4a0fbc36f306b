//! Construction of translation units
//!
//! Providers never touch the arenas directly; they go through the builder,
//! which interns structurally identical types so equal types share one id.
//! Tests use the same builder to hand-assemble small units.

use crate::ast::{
    FieldDecl, Node, NodeId, NodeKind, QualType, RecordDecl, RecordId, TagKind,
    TranslationUnit, TypeId, TypeKind,
};
use std::collections::HashMap;
use wb_common::{SourceLocation, SourceMap, SourceSpan};

#[derive(Debug, Default)]
pub struct TranslationUnitBuilder {
    sources: SourceMap,
    types: Vec<TypeKind>,
    interned: HashMap<TypeKind, TypeId>,
    records: Vec<RecordDecl>,
    nodes: Vec<Node>,
}

impl TranslationUnitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut SourceMap {
        &mut self.sources
    }

    /// Intern a type, returning the existing id for an identical kind
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn type_kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0 as usize]
    }

    pub fn builtin(&mut self, name: &str) -> QualType {
        QualType::new(self.intern(TypeKind::Builtin(name.to_string())))
    }

    pub fn typedef(&mut self, name: &str, underlying: QualType) -> QualType {
        QualType::new(self.intern(TypeKind::Typedef {
            name: name.to_string(),
            underlying,
        }))
    }

    pub fn pointer(&mut self, pointee: QualType) -> QualType {
        QualType::new(self.intern(TypeKind::Pointer(pointee)))
    }

    pub fn array(&mut self, element: QualType, size: Option<u64>) -> QualType {
        QualType::new(self.intern(TypeKind::Array { element, size }))
    }

    pub fn enum_type(&mut self, name: &str) -> QualType {
        let named = self.intern(TypeKind::Enum(name.to_string()));
        QualType::new(self.intern(TypeKind::Elaborated {
            tag: TagKind::Enum,
            named,
        }))
    }

    pub fn other(&mut self, spelling: &str) -> QualType {
        QualType::new(self.intern(TypeKind::Other(spelling.to_string())))
    }

    /// Register a record that so far has no fields
    pub fn declare_record(
        &mut self,
        tag: TagKind,
        name: Option<&str>,
        location: SourceLocation,
    ) -> RecordId {
        let id = RecordId(self.records.len() as u32);
        self.records.push(RecordDecl {
            name: name.map(str::to_string),
            tag,
            location,
            fields: Vec::new(),
            is_complete: false,
        });
        id
    }

    /// Attach the definition (location and fields) to a declared record
    pub fn define_record(&mut self, id: RecordId, location: SourceLocation, fields: Vec<FieldDecl>) {
        let record = &mut self.records[id.0 as usize];
        record.location = location;
        record.fields = fields;
        record.is_complete = true;
    }

    /// Give a record first seen only in a type spelling its declaration site
    pub fn relocate_record(&mut self, id: RecordId, location: SourceLocation) {
        self.records[id.0 as usize].location = location;
    }

    pub fn record(&self, id: RecordId) -> &RecordDecl {
        &self.records[id.0 as usize]
    }

    /// The bare record type, as a C++ class name would spell it
    pub fn record_type(&mut self, record: RecordId) -> QualType {
        QualType::new(self.intern(TypeKind::Record(record)))
    }

    /// `struct X` / `union X`
    pub fn elaborated(&mut self, tag: TagKind, record: RecordId) -> QualType {
        let named = self.intern(TypeKind::Record(record));
        QualType::new(self.intern(TypeKind::Elaborated { tag, named }))
    }

    pub fn node(
        &mut self,
        kind: NodeKind,
        span: SourceSpan,
        ty: Option<QualType>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            ty,
            children,
        });
        id
    }

    pub fn node_ref(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Replace the children of an already created node
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        self.nodes[id.0 as usize].children = children;
    }

    pub fn root(&mut self, children: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::TranslationUnit, SourceSpan::default(), None, children)
    }

    pub fn finish(self, root: NodeId) -> TranslationUnit {
        TranslationUnit {
            sources: self.sources,
            types: self.types,
            records: self.records,
            nodes: self.nodes,
            root,
        }
    }
}
