//! Rebuilding types from clang's printed spellings
//!
//! The JSON dump describes every type by its printed `qualType` string. The
//! resolver parses those strings back into arena types, resolving typedef
//! names and tag names against the declarations seen so far. Anything it
//! cannot take apart (function types, pointers to arrays, C++ templates)
//! becomes `TypeKind::Other` with the spelling preserved.

use crate::ast::{QualType, Qualifiers, RecordId, TagKind};
use crate::builder::TranslationUnitBuilder;
use log::trace;
use std::collections::HashMap;
use wb_common::SourceLocation;

const BUILTIN_WORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "bool", "_Complex", "__int128", "_Float16", "__fp16", "__bf16", "__float128", "_Float128",
    "wchar_t", "char8_t", "char16_t", "char32_t",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Star,
    /// Parenthesised name of an unnamed tag, e.g. `unnamed struct at t.c:3:9`
    Unnamed(String),
    /// `[N]` or `[]`
    Extent(Option<u64>),
}

#[derive(Debug, Default)]
pub struct TypeResolver {
    typedefs: HashMap<String, QualType>,
    records: HashMap<String, RecordId>,
    unnamed: HashMap<String, RecordId>,
    /// Most recent unnamed record, waiting for a typedef to name it
    pending_unnamed: Option<RecordId>,
    /// Typedef whose underlying type is being resolved right now
    defining: Option<String>,
    cache: HashMap<String, QualType>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a printed type
    pub fn resolve(&mut self, spelling: &str, builder: &mut TranslationUnitBuilder) -> QualType {
        if let Some(&qt) = self.cache.get(spelling) {
            return qt;
        }
        let qt = match tokenize(spelling) {
            Some(tokens) => self
                .build(&tokens, builder)
                .unwrap_or_else(|| builder.other(spelling.trim())),
            None => builder.other(spelling.trim()),
        };
        trace!("type `{}` resolved to {:?}", spelling, builder.type_kind(qt.ty));
        self.cache.insert(spelling.to_string(), qt);
        qt
    }

    /// Register `typedef <underlying> name;` and return the alias type
    pub fn define_typedef(
        &mut self,
        name: &str,
        underlying: &str,
        builder: &mut TranslationUnitBuilder,
    ) -> QualType {
        self.defining = Some(name.to_string());
        // The alias may change what `underlying` means for this name only,
        // so bypass the cache
        let resolved = match tokenize(underlying) {
            Some(tokens) => self
                .build(&tokens, builder)
                .unwrap_or_else(|| builder.other(underlying.trim())),
            None => builder.other(underlying.trim()),
        };
        self.defining = None;

        let alias = builder.typedef(name, resolved);
        self.typedefs.insert(name.to_string(), alias);
        self.cache.remove(name);
        alias
    }

    /// The record a `RecordDecl` refers to, created on first sight.
    ///
    /// `unnamed_key` is the `file:line:col` clang uses when printing an
    /// unnamed record.
    pub fn record_decl(
        &mut self,
        tag: TagKind,
        name: Option<&str>,
        location: SourceLocation,
        unnamed_key: Option<String>,
        builder: &mut TranslationUnitBuilder,
    ) -> RecordId {
        match name {
            Some(name) => {
                if let Some(&id) = self.records.get(name) {
                    if !builder.record(id).location.is_valid() {
                        builder.relocate_record(id, location);
                    }
                    return id;
                }
                let id = builder.declare_record(tag, Some(name), location);
                self.records.insert(name.to_string(), id);
                id
            }
            None => {
                if let Some(&id) = unnamed_key.as_ref().and_then(|key| self.unnamed.get(key)) {
                    if !builder.record(id).location.is_valid() {
                        builder.relocate_record(id, location);
                    }
                    return id;
                }
                let id = builder.declare_record(tag, None, location);
                if let Some(key) = unnamed_key {
                    self.unnamed.insert(key, id);
                }
                id
            }
        }
    }

    /// An unnamed record was just declared; a typedef that follows
    /// immediately may name it
    pub fn offer_unnamed(&mut self, id: RecordId) {
        self.pending_unnamed = Some(id);
    }

    /// Something other than a typedef followed the unnamed record
    pub fn forget_unnamed(&mut self) {
        self.pending_unnamed = None;
    }

    fn build(&mut self, tokens: &[Token], builder: &mut TranslationUnitBuilder) -> Option<QualType> {
        let mut quals = Qualifiers::default();
        let mut builtin_words: Vec<&str> = Vec::new();
        let mut base: Option<QualType> = None;
        let mut pos = 0;

        // Specifiers
        while pos < tokens.len() {
            match &tokens[pos] {
                Token::Word(word) if quals.add_keyword(word) => pos += 1,
                Token::Word(word) if BUILTIN_WORDS.contains(&word.as_str()) => {
                    builtin_words.push(word);
                    pos += 1;
                }
                Token::Word(word) if base.is_none() && builtin_words.is_empty() => {
                    if let Some(tag) = TagKind::from_keyword(word) {
                        let named = tokens.get(pos + 1)?;
                        base = Some(self.tagged(tag, named, builder));
                        pos += 2;
                    } else {
                        base = Some(self.named(word, builder));
                        pos += 1;
                    }
                }
                Token::Word(_) | Token::Unnamed(_) => return None,
                Token::Star | Token::Extent(_) => break,
            }
        }

        let mut current = match (base, builtin_words.is_empty()) {
            (Some(base), true) => base,
            (None, false) => builder.builtin(&builtin_words.join(" ")),
            _ => return None,
        }
        .with_quals(quals);

        // Pointer declarators, each with its own qualifiers
        while pos < tokens.len() && tokens[pos] == Token::Star {
            pos += 1;
            let mut pointer_quals = Qualifiers::default();
            while let Some(Token::Word(word)) = tokens.get(pos) {
                if !pointer_quals.add_keyword(word) {
                    return None;
                }
                pos += 1;
            }
            current = builder.pointer(current).with_quals(pointer_quals);
        }

        // Array extents, outermost first
        let mut extents = Vec::new();
        while let Some(Token::Extent(size)) = tokens.get(pos) {
            extents.push(*size);
            pos += 1;
        }
        for size in extents.into_iter().rev() {
            current = builder.array(current, size);
        }

        if pos != tokens.len() {
            return None;
        }
        Some(current)
    }

    fn tagged(&mut self, tag: TagKind, named: &Token, builder: &mut TranslationUnitBuilder) -> QualType {
        if tag == TagKind::Enum {
            return match named {
                Token::Word(name) => builder.enum_type(name),
                _ => builder.enum_type("(unnamed)"),
            };
        }

        let record = match named {
            Token::Word(name) => match self.records.get(name).copied() {
                Some(id) => id,
                None => match self.claim_pending(name) {
                    Some(id) => id,
                    None => {
                        let id = builder.declare_record(tag, Some(name), SourceLocation::Invalid);
                        self.records.insert(name.clone(), id);
                        id
                    }
                },
            },
            Token::Unnamed(text) => {
                let key = unnamed_key(text);
                match self.unnamed.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = builder.declare_record(tag, None, SourceLocation::Invalid);
                        self.unnamed.insert(key, id);
                        id
                    }
                }
            }
            _ => builder.declare_record(tag, None, SourceLocation::Invalid),
        };
        builder.elaborated(tag, record)
    }

    fn named(&mut self, name: &str, builder: &mut TranslationUnitBuilder) -> QualType {
        if self.defining.as_deref() != Some(name) {
            if let Some(&alias) = self.typedefs.get(name) {
                return alias;
            }
        }
        if let Some(id) = self.claim_pending(name) {
            let tag = builder.record(id).tag;
            return builder.elaborated(tag, id);
        }
        match self.records.get(name) {
            Some(&id) => builder.record_type(id),
            None => builder.other(name),
        }
    }

    /// `typedef struct { ... } name;` prints the unnamed record by the
    /// typedef's name; bind the two while that typedef is being defined.
    fn claim_pending(&mut self, name: &str) -> Option<RecordId> {
        if self.defining.as_deref() != Some(name) {
            return None;
        }
        let id = self.pending_unnamed.take()?;
        self.records.insert(name.to_string(), id);
        Some(id)
    }
}

fn tokenize(spelling: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = spelling.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '*' {
            tokens.push(Token::Star);
            i += 1;
        } else if c == '(' {
            // Only the parenthesised name of an unnamed tag is understood
            let after_tag = matches!(
                tokens.last(),
                Some(Token::Word(word)) if TagKind::from_keyword(word).is_some()
            );
            if !after_tag {
                return None;
            }
            let mut depth = 0;
            let start = i + 1;
            while i < chars.len() {
                match chars[i] {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            if i >= chars.len() {
                return None;
            }
            tokens.push(Token::Unnamed(chars[start..i].iter().collect()));
            i += 1;
        } else if c == '[' {
            let start = i + 1;
            while i < chars.len() && chars[i] != ']' {
                i += 1;
            }
            if i >= chars.len() {
                return None;
            }
            let inner: String = chars[start..i].iter().collect();
            let inner = inner.trim();
            let size = if inner.is_empty() {
                None
            } else {
                Some(inner.parse().ok()?)
            };
            tokens.push(Token::Extent(size));
            i += 1;
        } else if c.is_alphanumeric() || c == '_' || c == '$' || c == ':' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '$' | ':')) {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            return None;
        }
    }

    Some(tokens)
}

/// `unnamed struct at t.c:3:9` -> `t.c:3:9`
fn unnamed_key(text: &str) -> String {
    match text.rfind(" at ") {
        Some(pos) => text[pos + 4..].trim().to_string(),
        None => text.trim().to_string(),
    }
}
