//! Type system definitions
//!
//! Types are stored once per unit in an arena and referred to by [`TypeId`].
//! Qualifiers live next to the id in a [`QualType`], so `const VALUE` and
//! `VALUE` share the same underlying type entry but spell differently.

use super::{RecordId, TypeId};
use wb_common::SourceLocation;
use std::fmt;

/// cv-qualifiers attached to a use of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

impl Qualifiers {
    pub const NONE: Qualifiers = Qualifiers {
        is_const: false,
        is_volatile: false,
        is_restrict: false,
    };

    pub fn constant() -> Self {
        Qualifiers {
            is_const: true,
            ..Self::NONE
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    pub fn union(self, other: Qualifiers) -> Qualifiers {
        Qualifiers {
            is_const: self.is_const || other.is_const,
            is_volatile: self.is_volatile || other.is_volatile,
            is_restrict: self.is_restrict || other.is_restrict,
        }
    }

    /// Apply a qualifier keyword. Returns false if `word` is not one.
    pub fn add_keyword(&mut self, word: &str) -> bool {
        match word {
            "const" => self.is_const = true,
            "volatile" => self.is_volatile = true,
            "restrict" | "__restrict" | "__restrict__" => self.is_restrict = true,
            _ => return false,
        }
        true
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = Vec::new();
        if self.is_const {
            words.push("const");
        }
        if self.is_volatile {
            words.push("volatile");
        }
        if self.is_restrict {
            words.push("restrict");
        }
        write!(f, "{}", words.join(" "))
    }
}

/// A type together with the qualifiers of this particular use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualType {
    pub ty: TypeId,
    pub quals: Qualifiers,
}

impl QualType {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            quals: Qualifiers::NONE,
        }
    }

    pub fn with_quals(self, quals: Qualifiers) -> Self {
        Self {
            ty: self.ty,
            quals: self.quals.union(quals),
        }
    }
}

/// Tag keyword of an elaborated type or record declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Struct,
    Union,
    Class,
    Enum,
}

impl TagKind {
    pub fn from_keyword(word: &str) -> Option<TagKind> {
        match word {
            "struct" => Some(TagKind::Struct),
            "union" => Some(TagKind::Union),
            "class" => Some(TagKind::Class),
            "enum" => Some(TagKind::Enum),
            _ => None,
        }
    }

    /// Struct, union and class tags name records; enum does not
    pub fn is_record(self) -> bool {
        !matches!(self, TagKind::Enum)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            TagKind::Struct => "struct",
            TagKind::Union => "union",
            TagKind::Class => "class",
            TagKind::Enum => "enum",
        };
        write!(f, "{keyword}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// `int`, `unsigned long`, `void`, ...
    Builtin(String),

    /// Pointer to another type
    Pointer(QualType),

    /// Typedef alias
    Typedef { name: String, underlying: QualType },

    /// Reference spelled with its tag keyword (`struct RBasic`)
    Elaborated { tag: TagKind, named: TypeId },

    /// The record itself, as seen through an elaborated reference or a bare
    /// C++ class name
    Record(RecordId),

    /// An enumeration, by name
    Enum(String),

    /// Array with optional size
    Array { element: QualType, size: Option<u64> },

    /// Anything the pass never needs to look inside (function types,
    /// pointers to arrays, vendor extensions); kept with its spelling
    Other(String),
}

/// Struct/union field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: QualType,
    pub location: SourceLocation,
}

/// A struct/union declaration as visible in the unit.
///
/// `fields` is empty while only a forward declaration is known.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub name: Option<String>,
    pub tag: TagKind,
    pub location: SourceLocation,
    pub fields: Vec<FieldDecl>,
    pub is_complete: bool,
}

impl RecordDecl {
    pub fn is_forward_declaration(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field, the "header" of tracked objects
    pub fn head_field(&self) -> Option<&FieldDecl> {
        self.fields.first()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(anonymous)")
    }
}
