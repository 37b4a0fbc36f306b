//! Hand-built translation units for tests
//!
//! A fixture pairs a C snippet with a unit assembled through the builder.
//! Nodes are placed by searching the snippet for a needle, so tests read as
//! "the assignment starting at `obj->child`".

use wb_common::{FileId, FileKind, LineIndex, SourceLocation, SourceSpan};
use wb_frontend::{
    FieldDecl, NodeId, NodeKind, QualType, RecordId, TagKind, TranslationUnit,
    TranslationUnitBuilder,
};

pub struct Fixture {
    builder: TranslationUnitBuilder,
    text: String,
    lines: LineIndex,
    main: FileId,
    items: Vec<NodeId>,
}

impl Fixture {
    pub fn new(text: &str) -> Self {
        let mut builder = TranslationUnitBuilder::new();
        let main = builder.sources_mut().add_file("test.c", FileKind::Main);
        Self {
            builder,
            text: text.to_string(),
            lines: LineIndex::new(text),
            main,
            items: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn builder(&mut self) -> &mut TranslationUnitBuilder {
        &mut self.builder
    }

    /// Location of the `nth` occurrence (from zero) of `needle`
    pub fn at_nth(&self, needle: &str, nth: usize) -> SourceLocation {
        let offset = self
            .text
            .match_indices(needle)
            .nth(nth)
            .map(|(offset, _)| offset)
            .unwrap_or_else(|| panic!("`{needle}` occurs fewer than {} times", nth + 1));
        SourceLocation::File(self.lines.location(self.main, offset as u32))
    }

    pub fn at(&self, needle: &str) -> SourceLocation {
        self.at_nth(needle, 0)
    }

    pub fn system_header(&mut self, path: &str) -> FileId {
        self.builder.sources_mut().add_file(path, FileKind::SystemHeader)
    }

    pub fn header(&mut self, path: &str) -> FileId {
        self.builder.sources_mut().add_file(path, FileKind::Header)
    }

    /// A struct declared in the snippet at `struct <name>`, with `long` fields
    pub fn record(&mut self, name: &str, fields: &[&str]) -> RecordId {
        let location = self.at(&format!("struct {name}"));
        self.define(location, name, fields)
    }

    /// A struct declared in another file
    pub fn record_in(&mut self, file: FileId, offset: u32, name: &str, fields: &[&str]) -> RecordId {
        let location = SourceLocation::File(wb_common::FileLocation::new(file, offset, 1, 1));
        self.define(location, name, fields)
    }

    fn define(&mut self, location: SourceLocation, name: &str, fields: &[&str]) -> RecordId {
        let id = self.builder.declare_record(TagKind::Struct, Some(name), location);
        if !fields.is_empty() {
            let long = self.builder.builtin("long");
            let fields = fields
                .iter()
                .map(|field| FieldDecl {
                    name: field.to_string(),
                    ty: long,
                    location,
                })
                .collect();
            self.builder.define_record(id, location, fields);
        }
        id
    }

    /// `struct <record> *`
    pub fn pointer_to(&mut self, record: RecordId) -> QualType {
        let elaborated = self.builder.elaborated(TagKind::Struct, record);
        self.builder.pointer(elaborated)
    }

    /// `typedef unsigned long VALUE`
    pub fn value_type(&mut self) -> QualType {
        let long = self.builder.builtin("unsigned long");
        self.builder.typedef("VALUE", long)
    }

    fn expr(&mut self, kind: NodeKind, at: SourceLocation, ty: QualType, children: Vec<NodeId>) -> NodeId {
        self.builder
            .node(kind, SourceSpan::from_location(at), Some(ty), children)
    }

    /// Reference to a variable or function
    pub fn var(&mut self, needle: &str, ty: QualType) -> NodeId {
        let at = self.at(needle);
        self.expr(NodeKind::Expr("DeclRefExpr".to_string()), at, ty, vec![])
    }

    pub fn var_nth(&mut self, needle: &str, nth: usize, ty: QualType) -> NodeId {
        let at = self.at_nth(needle, nth);
        self.expr(NodeKind::Expr("DeclRefExpr".to_string()), at, ty, vec![])
    }

    /// `base->name`, starting where `base` starts
    pub fn arrow(&mut self, base: NodeId, name: &str, ty: QualType) -> NodeId {
        let at = self.start(base);
        let base = self.rvalue(base);
        let kind = NodeKind::Member {
            name: name.to_string(),
            arrow: true,
        };
        self.expr(kind, at, ty, vec![base])
    }

    /// `base[index]`
    pub fn subscript(&mut self, base: NodeId, index: NodeId, ty: QualType) -> NodeId {
        let at = self.start(base);
        self.expr(NodeKind::ArraySubscript, at, ty, vec![base, index])
    }

    /// `callee()`
    pub fn call(&mut self, callee: NodeId, ty: QualType) -> NodeId {
        let at = self.start(callee);
        self.expr(NodeKind::Expr("CallExpr".to_string()), at, ty, vec![callee])
    }

    /// Compiler-inserted conversion of `inner` to `ty`
    pub fn cast(&mut self, inner: NodeId, cast_kind: &str, ty: QualType) -> NodeId {
        let at = self.start(inner);
        self.expr(NodeKind::ImplicitCast(cast_kind.to_string()), at, ty, vec![inner])
    }

    /// Load of an lvalue, keeping its type
    pub fn rvalue(&mut self, inner: NodeId) -> NodeId {
        let ty = self.type_of(inner);
        self.cast(inner, "LValueToRValue", ty)
    }

    /// `lhs = rhs`; the right side is loaded and converted to the left's type
    pub fn assign(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let at = self.start(lhs);
        let ty = self.type_of(lhs);
        let rhs = self.rvalue(rhs);
        let rhs = if self.type_of(rhs) == ty {
            rhs
        } else {
            self.cast(rhs, "BitCast", ty)
        };
        self.expr(NodeKind::Assign, at, ty, vec![lhs, rhs])
    }

    /// `lhs op= rhs`
    pub fn compound_assign(&mut self, op: &str, lhs: NodeId, rhs: NodeId) -> NodeId {
        let at = self.start(lhs);
        let ty = self.type_of(lhs);
        let rhs = self.rvalue(rhs);
        self.expr(NodeKind::CompoundAssign(op.to_string()), at, ty, vec![lhs, rhs])
    }

    /// Any statement, starting at `needle`
    pub fn stmt(&mut self, kind: &str, needle: &str, children: Vec<NodeId>) -> NodeId {
        let at = self.at(needle);
        self.builder
            .node(NodeKind::Stmt(kind.to_string()), SourceSpan::from_location(at), None, children)
    }

    /// `needle: sub`
    pub fn label(&mut self, kind: NodeKind, needle: &str, mut children: Vec<NodeId>, sub: NodeId) -> NodeId {
        let at = self.at(needle);
        children.push(sub);
        self.builder
            .node(kind, SourceSpan::from_location(at), None, children)
    }

    /// `{ items }` opening at the `nth` brace
    pub fn block(&mut self, nth: usize, items: Vec<NodeId>) -> NodeId {
        let at = self.at_nth("{", nth);
        self.builder
            .node(NodeKind::Compound, SourceSpan::from_location(at), None, items)
    }

    /// A function definition with `body`, added to the unit
    pub fn function(&mut self, body: NodeId) -> NodeId {
        let span = self.node_span(body);
        let id = self
            .builder
            .node(NodeKind::Decl("FunctionDecl".to_string()), span, None, vec![body]);
        self.items.push(id);
        id
    }

    /// A file-scope declaration, added to the unit
    pub fn global(&mut self, needle: &str, init: Vec<NodeId>) -> NodeId {
        let at = self.at(needle);
        let id = self.builder.node(
            NodeKind::Decl("VarDecl".to_string()),
            SourceSpan::from_location(at),
            None,
            init,
        );
        self.items.push(id);
        id
    }

    pub fn finish(mut self) -> TranslationUnit {
        let root = self.builder.root(self.items);
        self.builder.finish(root)
    }

    fn start(&self, id: NodeId) -> SourceLocation {
        self.node_span(id).start
    }

    fn node_span(&self, id: NodeId) -> SourceSpan {
        self.builder.node_ref(id).span
    }

    fn type_of(&self, id: NodeId) -> QualType {
        self.builder
            .node_ref(id)
            .ty
            .unwrap_or_else(|| panic!("node {id:?} has no type"))
    }
}
