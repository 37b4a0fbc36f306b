//! Borrowed view of a type
//!
//! [`TypeRef`] is the handle the instrumentation pass works with. It answers
//! the questions the classifier asks (alias stripping, pointer peeling, the
//! record behind an elaborated reference, canonical spelling) without ever
//! mutating the arena it borrows from.

use super::types::{QualType, RecordDecl, TypeKind};
use super::TranslationUnit;
use std::fmt;

/// Typedef chains longer than this are treated as ending here
const MAX_ALIAS_DEPTH: usize = 64;

#[derive(Clone, Copy)]
pub struct TypeRef<'tu> {
    tu: &'tu TranslationUnit,
    qt: QualType,
}

impl<'tu> TypeRef<'tu> {
    pub(crate) fn new(tu: &'tu TranslationUnit, qt: QualType) -> Self {
        Self { tu, qt }
    }

    pub fn qual_type(&self) -> QualType {
        self.qt
    }

    pub fn kind(&self) -> &'tu TypeKind {
        self.tu.type_kind(self.qt.ty)
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.kind(), TypeKind::Typedef { .. })
    }

    /// Strip exactly one typedef layer. Qualifiers on the alias carry over.
    pub fn desugar_once(&self) -> Option<TypeRef<'tu>> {
        match self.kind() {
            TypeKind::Typedef { underlying, .. } => Some(TypeRef::new(
                self.tu,
                underlying.with_quals(self.qt.quals),
            )),
            _ => None,
        }
    }

    /// Strip typedef layers until none remain.
    ///
    /// A type that is not an alias desugars to itself, so this is idempotent.
    pub fn desugar(&self) -> TypeRef<'tu> {
        let mut current = *self;
        for _ in 0..MAX_ALIAS_DEPTH {
            match current.desugar_once() {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind(), TypeKind::Pointer(_))
    }

    /// Peel one level of pointer indirection
    pub fn pointee(&self) -> Option<TypeRef<'tu>> {
        match self.kind() {
            TypeKind::Pointer(pointee) => Some(TypeRef::new(self.tu, *pointee)),
            _ => None,
        }
    }

    pub fn is_elaborated_record(&self) -> bool {
        self.as_elaborated_record().is_some()
    }

    /// The record behind a `struct X` / `union X` reference
    pub fn as_elaborated_record(&self) -> Option<&'tu RecordDecl> {
        match self.kind() {
            TypeKind::Elaborated { tag, named } if tag.is_record() => {
                match self.tu.type_kind(*named) {
                    TypeKind::Record(id) => Some(self.tu.record(*id)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// The record declaration this type names, elaborated or not
    pub fn record_declaration(&self) -> Option<&'tu RecordDecl> {
        match self.kind() {
            TypeKind::Record(id) => Some(self.tu.record(*id)),
            TypeKind::Elaborated { .. } => self.as_elaborated_record(),
            _ => None,
        }
    }

    /// Canonical spelling, qualifiers included (`const VALUE`, `struct RObject *`)
    pub fn spelling(&self) -> String {
        let quals = self.qt.quals;
        match self.kind() {
            TypeKind::Pointer(pointee) => {
                let inner = TypeRef::new(self.tu, *pointee).spelling();
                let mut spelled = if inner.ends_with('*') {
                    format!("{inner}*")
                } else {
                    format!("{inner} *")
                };
                if !quals.is_empty() {
                    spelled.push_str(&quals.to_string());
                }
                spelled
            }
            _ => {
                let base = self.base_spelling();
                if quals.is_empty() {
                    base
                } else {
                    format!("{quals} {base}")
                }
            }
        }
    }

    fn base_spelling(&self) -> String {
        match self.kind() {
            TypeKind::Builtin(name) | TypeKind::Enum(name) | TypeKind::Other(name) => name.clone(),
            TypeKind::Typedef { name, .. } => name.clone(),
            TypeKind::Elaborated { tag, named } => {
                let named = TypeRef::new(self.tu, QualType::new(*named));
                format!("{tag} {}", named.base_spelling())
            }
            TypeKind::Record(id) => self.tu.record(*id).display_name().to_string(),
            TypeKind::Array { element, size } => {
                let element = TypeRef::new(self.tu, *element).spelling();
                match size {
                    Some(n) => format!("{element} [{n}]"),
                    None => format!("{element} []"),
                }
            }
            TypeKind::Pointer(_) => TypeRef::new(self.tu, QualType::new(self.qt.ty)).spelling(),
        }
    }
}

impl PartialEq for TypeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tu, other.tu) && self.qt == other.qt
    }
}

impl fmt::Debug for TypeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.spelling())
    }
}

impl fmt::Display for TypeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling())
    }
}
