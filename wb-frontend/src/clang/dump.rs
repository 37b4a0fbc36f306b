//! Serde model of clang's `-ast-dump=json` output
//!
//! Only the attributes the importer reads are modelled; serde skips the
//! rest. Locations are kept exactly as written because clang omits `file`
//! and `line` when they repeat the previously written location, so they can
//! only be decoded by replaying them in document order.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DumpNode {
    pub id: String,
    pub kind: String,
    pub loc: Option<DumpLoc>,
    pub range: Option<DumpRange>,
    pub name: Option<String>,
    #[serde(rename = "tagUsed")]
    pub tag_used: Option<String>,
    #[serde(rename = "completeDefinition")]
    pub complete_definition: bool,
    #[serde(rename = "isImplicit")]
    pub is_implicit: bool,
    #[serde(rename = "type")]
    pub ty: Option<DumpType>,
    pub opcode: Option<String>,
    #[serde(rename = "isArrow")]
    pub is_arrow: bool,
    #[serde(rename = "castKind")]
    pub cast_kind: Option<String>,
    pub inner: Vec<DumpNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DumpLoc {
    pub offset: Option<u32>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub col: Option<u32>,
    #[serde(rename = "tokLen")]
    pub tok_len: Option<u32>,
    #[serde(rename = "includedFrom")]
    pub included_from: Option<IncludedFrom>,
    #[serde(rename = "spellingLoc")]
    pub spelling_loc: Option<Box<DumpLoc>>,
    #[serde(rename = "expansionLoc")]
    pub expansion_loc: Option<Box<DumpLoc>>,
    #[serde(rename = "isMacroArgExpansion")]
    pub is_macro_arg_expansion: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IncludedFrom {
    pub file: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DumpRange {
    pub begin: DumpLoc,
    pub end: DumpLoc,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DumpType {
    #[serde(rename = "qualType")]
    pub qual_type: String,
    #[serde(rename = "desugaredQualType")]
    pub desugared_qual_type: Option<String>,
}

impl DumpNode {
    /// Type nodes, attributes and comments carry no statements
    pub fn is_auxiliary(&self) -> bool {
        self.kind.ends_with("Type") || self.kind.ends_with("Attr") || self.kind.ends_with("Comment")
    }
}

impl DumpLoc {
    pub fn is_macro(&self) -> bool {
        self.spelling_loc.is_some() || self.expansion_loc.is_some()
    }
}
