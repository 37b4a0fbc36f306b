//! Syntax tree nodes
//!
//! Declarations, statements and expressions share one node type, the same
//! way clang treats every expression as a statement. Only the kinds the
//! instrumentation pass inspects get their own variant; everything else keeps
//! the provider's kind name for debugging.

use super::types::QualType;
use super::NodeId;
use wb_common::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: SourceSpan,
    /// Type of an expression node, `None` for declarations and statements
    pub ty: Option<QualType>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    TranslationUnit,

    /// Any declaration (`FunctionDecl`, `VarDecl`, `RecordDecl`, ...)
    Decl(String),

    /// `{ ... }`; its children are block items
    Compound,

    /// `name: stmt`
    Label,
    /// `case X: stmt`; the sub-statement is the last child
    Case,
    /// `default: stmt`
    Default,

    /// Any other statement (`IfStmt`, `ReturnStmt`, `DeclStmt`, ...)
    Stmt(String),

    /// Simple assignment `lhs = rhs`
    Assign,

    /// `lhs op= rhs`, with the opcode (`+=`, `|=`, ...)
    CompoundAssign(String),

    /// `obj->name` or `obj.name`
    Member { name: String, arrow: bool },

    /// `base[index]`
    ArraySubscript,

    /// Conversion inserted by the compiler, with its cast kind
    ImplicitCast(String),

    /// Any other expression (`DeclRefExpr`, `CallExpr`, `ParenExpr`, ...)
    Expr(String),
}

impl NodeKind {
    /// Label-like statements whose meaning lives in their last child
    pub fn is_label(&self) -> bool {
        matches!(self, NodeKind::Label | NodeKind::Case | NodeKind::Default)
    }

    /// Field or element store target
    pub fn is_store_target(&self) -> bool {
        matches!(self, NodeKind::Member { .. } | NodeKind::ArraySubscript)
    }
}

impl Node {
    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, NodeKind::Assign)
    }

    /// Left and right operand of a binary node
    pub fn operands(&self) -> Option<(NodeId, NodeId)> {
        match self.children.as_slice() {
            [lhs, rhs] => Some((*lhs, *rhs)),
            _ => None,
        }
    }
}
