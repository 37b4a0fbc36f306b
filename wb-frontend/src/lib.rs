//! insert-wb - Frontend
//!
//! This crate provides the typed view of C translation units that the
//! instrumentation pass works on:
//! - AST: arena-backed nodes, types and record declarations
//! - Builder: construction of translation units
//! - Clang: import of clang's JSON AST dump
//! - Compilation database: per-file compiler flags
//! - Providers: turning a source file into a translation unit

pub mod ast;
pub mod builder;
pub mod clang;
pub mod compile_db;
pub mod provider;

pub use ast::{
    FieldDecl, Node, NodeId, NodeKind, QualType, Qualifiers, RecordDecl, RecordId, TagKind,
    TranslationUnit, TypeId, TypeKind, TypeRef,
};
pub use builder::TranslationUnitBuilder;
pub use clang::{import, ImportOptions, DEFAULT_SYSTEM_DIRS};
pub use compile_db::{CompilationDatabase, CompileFlags};
pub use provider::{AstProvider, ClangProvider, JsonFileProvider, ParseRequest, CLANG_ENV};
