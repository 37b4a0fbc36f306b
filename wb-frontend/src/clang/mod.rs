//! Import of clang's JSON AST dump
//!
//! `clang -fsyntax-only -Xclang -ast-dump=json` prints the fully typed tree
//! of a translation unit. The importer replays it into a [`TranslationUnit`]:
//! locations are decoded in document order, types are rebuilt from their
//! printed spellings and declarations register the typedefs and records that
//! later spellings refer to.

pub mod dump;
pub mod locations;
pub mod type_spelling;

pub use locations::{LocationDecoder, DEFAULT_SYSTEM_DIRS};

use crate::ast::{FieldDecl, NodeId, NodeKind, TagKind, TranslationUnit};
use crate::builder::TranslationUnitBuilder;
use dump::DumpNode;
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;
use type_spelling::TypeResolver;
use wb_common::{SourceLocation, SourceSpan, ToolError};

/// Settings that influence how a dump is interpreted
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Headers below these directories are system headers
    pub system_dirs: Vec<PathBuf>,
    /// Directory clang ran in; the current directory when unset
    pub working_dir: Option<PathBuf>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            system_dirs: DEFAULT_SYSTEM_DIRS.iter().map(PathBuf::from).collect(),
            working_dir: None,
        }
    }
}

/// Build a translation unit from a JSON AST dump
pub fn import(json: &str, options: &ImportOptions) -> Result<TranslationUnit, ToolError> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    // Deeply nested expressions are common in macro-heavy C
    deserializer.disable_recursion_limit();
    let root = DumpNode::deserialize(&mut deserializer)?;
    deserializer.end()?;

    if root.kind != "TranslationUnitDecl" {
        return Err(ToolError::Json {
            message: format!("expected a TranslationUnitDecl at the top, found `{}`", root.kind),
        });
    }

    let mut importer = Importer::new(options);
    importer.locations(&root);
    let children = importer.children(&root.inner);
    let unit = importer.builder.root(children);
    let tu = importer.builder.finish(unit);

    debug!(
        "imported {} nodes, {} records, {} files",
        tu.node_count(),
        tu.records().len(),
        tu.sources().files().len()
    );
    Ok(tu)
}

struct Importer {
    builder: TranslationUnitBuilder,
    decoder: LocationDecoder,
    resolver: TypeResolver,
    /// Fields of the records currently being defined, innermost last
    fields: Vec<Vec<FieldDecl>>,
}

impl Importer {
    fn new(options: &ImportOptions) -> Self {
        let base = options
            .working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        Self {
            builder: TranslationUnitBuilder::new(),
            decoder: LocationDecoder::new(options.system_dirs.clone(), base),
            resolver: TypeResolver::new(),
            fields: Vec::new(),
        }
    }

    /// Decode `loc` and `range` of a node, in the order clang wrote them
    fn locations(&mut self, node: &DumpNode) -> (SourceLocation, SourceSpan) {
        let sources = self.builder.sources_mut();
        let loc = match &node.loc {
            Some(loc) => self.decoder.decode(loc, sources),
            None => SourceLocation::Invalid,
        };
        let span = match &node.range {
            Some(range) => {
                let begin = self.decoder.decode(&range.begin, sources);
                let end = self.decoder.decode(&range.end, sources);
                SourceSpan::new(begin, end)
            }
            None => SourceSpan::from_location(loc),
        };
        (loc, span)
    }

    /// Replay the locations of a subtree that produces no nodes
    fn skip(&mut self, node: &DumpNode) {
        self.locations(node);
        for child in &node.inner {
            self.skip(child);
        }
    }

    fn children(&mut self, inner: &[DumpNode]) -> Vec<NodeId> {
        inner.iter().filter_map(|child| self.import(child)).collect()
    }

    fn import(&mut self, node: &DumpNode) -> Option<NodeId> {
        if node.kind.is_empty() || node.is_auxiliary() {
            self.skip(node);
            return None;
        }

        let (loc, span) = self.locations(node);
        let kind = node.kind.as_str();

        if kind.ends_with("Decl") {
            return Some(self.import_decl(node, loc, span));
        }

        let node_kind = match kind {
            "CompoundStmt" => NodeKind::Compound,
            "LabelStmt" => NodeKind::Label,
            "CaseStmt" => NodeKind::Case,
            "DefaultStmt" => NodeKind::Default,
            "BinaryOperator" if node.opcode.as_deref() == Some("=") => NodeKind::Assign,
            "CompoundAssignOperator" => {
                NodeKind::CompoundAssign(node.opcode.clone().unwrap_or_default())
            }
            "MemberExpr" => NodeKind::Member {
                name: node.name.clone().unwrap_or_default(),
                arrow: node.is_arrow,
            },
            "ArraySubscriptExpr" => NodeKind::ArraySubscript,
            "ImplicitCastExpr" => NodeKind::ImplicitCast(node.cast_kind.clone().unwrap_or_default()),
            other if other.ends_with("Stmt") => NodeKind::Stmt(other.to_string()),
            other => NodeKind::Expr(other.to_string()),
        };

        let ty = match (&node_kind, &node.ty) {
            (NodeKind::Stmt(_), _) | (NodeKind::Compound, _) => None,
            (_, Some(ty)) => Some(self.resolver.resolve(&ty.qual_type, &mut self.builder)),
            (_, None) => None,
        };

        let children = self.children(&node.inner);
        Some(self.builder.node(node_kind, span, ty, children))
    }

    fn import_decl(&mut self, node: &DumpNode, loc: SourceLocation, span: SourceSpan) -> NodeId {
        let kind = node.kind.as_str();
        match kind {
            "RecordDecl" | "CXXRecordDecl" => return self.import_record(node, loc, span),
            "TypedefDecl" => {
                if let (Some(name), Some(ty)) = (&node.name, &node.ty) {
                    self.resolver.define_typedef(name, &ty.qual_type, &mut self.builder);
                }
            }
            "FieldDecl" => {
                self.resolver.forget_unnamed();
                if let Some(ty) = &node.ty {
                    let ty = self.resolver.resolve(&ty.qual_type, &mut self.builder);
                    if let Some(frame) = self.fields.last_mut() {
                        frame.push(FieldDecl {
                            name: node.name.clone().unwrap_or_default(),
                            ty,
                            location: loc,
                        });
                    }
                }
            }
            _ => self.resolver.forget_unnamed(),
        }

        let children = self.children(&node.inner);
        self.builder
            .node(NodeKind::Decl(kind.to_string()), span, None, children)
    }

    fn import_record(&mut self, node: &DumpNode, loc: SourceLocation, span: SourceSpan) -> NodeId {
        let tag = node
            .tag_used
            .as_deref()
            .and_then(TagKind::from_keyword)
            .unwrap_or(TagKind::Struct);
        let name = node.name.as_deref().filter(|name| !name.is_empty());
        let unnamed_key = match name {
            Some(_) => None,
            None => self.unnamed_key(loc),
        };
        let record = self
            .resolver
            .record_decl(tag, name, loc, unnamed_key, &mut self.builder);

        self.fields.push(Vec::new());
        let children = self.children(&node.inner);
        let fields = self.fields.pop().unwrap_or_default();

        if node.complete_definition && !self.builder.record(record).is_complete {
            self.builder.define_record(record, loc, fields);
        }
        match name {
            Some(_) => self.resolver.forget_unnamed(),
            None => self.resolver.offer_unnamed(record),
        }

        self.builder
            .node(NodeKind::Decl(node.kind.clone()), span, None, children)
    }

    /// `path:line:col`, the way clang prints the location of an unnamed tag
    fn unnamed_key(&self, loc: SourceLocation) -> Option<String> {
        let at = loc.resolve()?;
        let file = self.builder.sources().file(at.file)?;
        Some(format!("{}:{}:{}", file.path, at.line, at.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeKind;
    use indoc::indoc;
    use wb_common::FileKind;

    /// `struct RObject { long flags; }; void f(struct RObject *o, long v) { o->flags = v; }`
    const MEMBER_STORE: &str = indoc! {r#"
        {
          "id": "0x1", "kind": "TranslationUnitDecl", "loc": {}, "range": {"begin": {}, "end": {}},
          "inner": [
            {
              "id": "0x2", "kind": "TypedefDecl", "loc": {}, "range": {"begin": {}, "end": {}},
              "isImplicit": true, "name": "__int128_t", "type": {"qualType": "__int128"},
              "inner": [{"id": "0x3", "kind": "BuiltinType", "type": {"qualType": "__int128"}}]
            },
            {
              "id": "0x10", "kind": "RecordDecl",
              "loc": {"offset": 7, "file": "t.c", "line": 1, "col": 8, "tokLen": 7},
              "range": {"begin": {"offset": 0, "col": 1, "tokLen": 6}, "end": {"offset": 30, "col": 31, "tokLen": 1}},
              "name": "RObject", "tagUsed": "struct", "completeDefinition": true,
              "inner": [
                {
                  "id": "0x11", "kind": "FieldDecl",
                  "loc": {"offset": 22, "col": 23, "tokLen": 5},
                  "range": {"begin": {"offset": 17, "col": 18, "tokLen": 4}, "end": {"offset": 22, "col": 23, "tokLen": 5}},
                  "name": "flags", "type": {"qualType": "long"}
                }
              ]
            },
            {
              "id": "0x20", "kind": "FunctionDecl",
              "loc": {"offset": 39, "line": 2, "col": 6, "tokLen": 1},
              "range": {"begin": {"offset": 34, "col": 1, "tokLen": 4}, "end": {"offset": 88, "line": 4, "col": 1, "tokLen": 1}},
              "name": "f", "type": {"qualType": "void (struct RObject *, long)"},
              "inner": [
                {
                  "id": "0x21", "kind": "ParmVarDecl",
                  "loc": {"offset": 57, "line": 2, "col": 24, "tokLen": 1},
                  "range": {"begin": {"offset": 41, "col": 8, "tokLen": 6}, "end": {"offset": 57, "col": 24, "tokLen": 1}},
                  "name": "o", "type": {"qualType": "struct RObject *"}
                },
                {
                  "id": "0x22", "kind": "ParmVarDecl",
                  "loc": {"offset": 65, "col": 32, "tokLen": 1},
                  "range": {"begin": {"offset": 60, "col": 27, "tokLen": 4}, "end": {"offset": 65, "col": 32, "tokLen": 1}},
                  "name": "v", "type": {"qualType": "long"}
                },
                {
                  "id": "0x23", "kind": "CompoundStmt",
                  "range": {"begin": {"offset": 68, "col": 35, "tokLen": 1}, "end": {"offset": 88, "line": 4, "col": 1, "tokLen": 1}},
                  "inner": [
                    {
                      "id": "0x24", "kind": "BinaryOperator",
                      "range": {"begin": {"offset": 74, "line": 3, "col": 5, "tokLen": 1}, "end": {"offset": 85, "col": 16, "tokLen": 1}},
                      "type": {"qualType": "long"}, "valueCategory": "prvalue", "opcode": "=",
                      "inner": [
                        {
                          "id": "0x25", "kind": "MemberExpr",
                          "range": {"begin": {"offset": 74, "col": 5, "tokLen": 1}, "end": {"offset": 77, "col": 8, "tokLen": 5}},
                          "type": {"qualType": "long"}, "valueCategory": "lvalue", "name": "flags", "isArrow": true,
                          "inner": [
                            {
                              "id": "0x26", "kind": "ImplicitCastExpr",
                              "range": {"begin": {"offset": 74, "col": 5, "tokLen": 1}, "end": {"offset": 74, "col": 5, "tokLen": 1}},
                              "type": {"qualType": "struct RObject *"}, "castKind": "LValueToRValue",
                              "inner": [
                                {
                                  "id": "0x27", "kind": "DeclRefExpr",
                                  "range": {"begin": {"offset": 74, "col": 5, "tokLen": 1}, "end": {"offset": 74, "col": 5, "tokLen": 1}},
                                  "type": {"qualType": "struct RObject *"}
                                }
                              ]
                            }
                          ]
                        },
                        {
                          "id": "0x28", "kind": "ImplicitCastExpr",
                          "range": {"begin": {"offset": 85, "col": 16, "tokLen": 1}, "end": {"offset": 85, "col": 16, "tokLen": 1}},
                          "type": {"qualType": "long"}, "castKind": "LValueToRValue",
                          "inner": [
                            {
                              "id": "0x29", "kind": "DeclRefExpr",
                              "range": {"begin": {"offset": 85, "col": 16, "tokLen": 1}, "end": {"offset": 85, "col": 16, "tokLen": 1}},
                              "type": {"qualType": "long"}
                            }
                          ]
                        }
                      ]
                    }
                  ]
                }
              ]
            }
          ]
        }
    "#};

    fn find(tu: &TranslationUnit, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        (0..tu.node_count() as u32)
            .map(NodeId)
            .find(|&id| pred(&tu.node(id).kind))
    }

    #[test]
    fn test_import_member_store() {
        let tu = import(MEMBER_STORE, &ImportOptions::default()).unwrap();

        let main = tu.main_file().unwrap();
        assert_eq!(tu.sources().file(main).unwrap().path, "t.c");
        assert_eq!(tu.sources().file(main).unwrap().kind, FileKind::Main);

        let assign = find(&tu, |kind| matches!(kind, NodeKind::Assign)).unwrap();
        let (lhs, rhs) = tu.node(assign).operands().unwrap();
        assert!(tu.node(lhs).kind.is_store_target());
        assert_eq!(tu.expr_type(lhs).unwrap().spelling(), "long");
        assert!(matches!(tu.node(rhs).kind, NodeKind::ImplicitCast(ref k) if k == "LValueToRValue"));

        // Line 3 is only written on the assignment's begin location
        let start = tu.node(assign).span.start.resolve().unwrap();
        assert_eq!((start.offset, start.line, start.column), (74, 3, 5));
    }

    #[test]
    fn test_import_records() {
        let tu = import(MEMBER_STORE, &ImportOptions::default()).unwrap();
        let record = tu
            .records()
            .iter()
            .find(|r| r.name.as_deref() == Some("RObject"))
            .unwrap();
        assert!(record.is_complete);
        assert_eq!(record.head_field().unwrap().name, "flags");
        assert_eq!(record.location.resolve().unwrap().offset, 7);

        let deref = find(&tu, |kind| matches!(kind, NodeKind::Expr(k) if k == "DeclRefExpr")).unwrap();
        let ty = tu.expr_type(deref).unwrap();
        assert!(ty.is_pointer());
        let pointee = ty.pointee().unwrap();
        assert!(std::ptr::eq(pointee.as_elaborated_record().unwrap(), record));
    }

    #[test]
    fn test_auxiliary_nodes_are_dropped() {
        let tu = import(MEMBER_STORE, &ImportOptions::default()).unwrap();
        let typedef = find(&tu, |kind| matches!(kind, NodeKind::Decl(k) if k == "TypedefDecl")).unwrap();
        assert!(tu.node(typedef).children.is_empty());
    }

    #[test]
    fn test_typedef_names_unnamed_record() {
        let json = indoc! {r#"
            {
              "kind": "TranslationUnitDecl",
              "inner": [
                {
                  "kind": "RecordDecl",
                  "loc": {"offset": 8, "file": "/src/t.c", "line": 1, "col": 9, "tokLen": 6},
                  "range": {"begin": {"offset": 8, "col": 9, "tokLen": 6}, "end": {"offset": 25, "col": 26, "tokLen": 1}},
                  "tagUsed": "struct", "completeDefinition": true,
                  "inner": [
                    {
                      "kind": "FieldDecl",
                      "loc": {"offset": 21, "col": 22, "tokLen": 1},
                      "range": {"begin": {"offset": 17, "col": 18, "tokLen": 3}, "end": {"offset": 21, "col": 22, "tokLen": 1}},
                      "name": "a", "type": {"qualType": "int"}
                    }
                  ]
                },
                {
                  "kind": "TypedefDecl",
                  "loc": {"offset": 27, "col": 28, "tokLen": 4},
                  "range": {"begin": {"offset": 0, "col": 1, "tokLen": 7}, "end": {"offset": 27, "col": 28, "tokLen": 4}},
                  "name": "heap", "type": {"qualType": "struct heap"}
                },
                {
                  "kind": "VarDecl",
                  "loc": {"offset": 40, "line": 2, "col": 7, "tokLen": 1},
                  "range": {"begin": {"offset": 34, "col": 1, "tokLen": 4}, "end": {"offset": 40, "col": 7, "tokLen": 1}},
                  "name": "p", "type": {"qualType": "heap *"},
                  "inner": [
                    {
                      "kind": "ImplicitCastExpr",
                      "range": {"begin": {"offset": 44, "col": 11, "tokLen": 1}, "end": {"offset": 44, "col": 11, "tokLen": 1}},
                      "type": {"qualType": "struct (unnamed struct at /src/t.c:1:9) *"}, "castKind": "NullToPointer",
                      "inner": [
                        {
                          "kind": "IntegerLiteral",
                          "range": {"begin": {"offset": 44, "col": 11, "tokLen": 1}, "end": {"offset": 44, "col": 11, "tokLen": 1}},
                          "type": {"qualType": "int"}, "value": "0"
                        }
                      ]
                    }
                  ]
                }
              ]
            }
        "#};
        let tu = import(json, &ImportOptions::default()).unwrap();
        assert_eq!(tu.records().len(), 1);

        let cast = find(&tu, |kind| matches!(kind, NodeKind::ImplicitCast(_))).unwrap();
        let pointee = tu.expr_type(cast).unwrap().pointee().unwrap();
        let record = pointee.as_elaborated_record().unwrap();
        assert!(record.is_complete);
        assert_eq!(record.head_field().unwrap().name, "a");
    }

    #[test]
    fn test_unparseable_type_is_other() {
        let json = r#"{"kind": "TranslationUnitDecl", "inner": [
            {"kind": "DeclRefExpr", "range": {"begin": {"offset": 0, "file": "t.c", "line": 1, "col": 1}, "end": {"offset": 0}},
             "type": {"qualType": "int (*)(void)"}}
        ]}"#;
        let tu = import(json, &ImportOptions::default()).unwrap();
        let expr = find(&tu, |kind| matches!(kind, NodeKind::Expr(_))).unwrap();
        let ty = tu.expr_type(expr).unwrap();
        assert_eq!(ty.kind(), &TypeKind::Other("int (*)(void)".to_string()));
    }

    #[test]
    fn test_rejects_non_unit_dump() {
        let err = import(r#"{"kind": "FunctionDecl"}"#, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ToolError::Json { .. }));

        let err = import("{not json", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ToolError::Json { .. }));
    }
}
