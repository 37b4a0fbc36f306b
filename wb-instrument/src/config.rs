//! Pass configuration, loaded from JSON and overridden from the command line

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::path::{Path, PathBuf};
use wb_common::ToolError;

pub const DEFAULT_BARRIER_CALL: &str = "__write_barrier();";
pub const DEFAULT_OPAQUE_ALIAS: &str = "VALUE";
pub const DEFAULT_HEAD_FIELD: &str = "flag";

/// Which type the right operand's opaque-alias test looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasCheck {
    /// The left operand's type, as the pass has always done
    #[default]
    Lhs,
    /// The right operand's own type
    Rhs,
}

impl fmt::Display for AliasCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasCheck::Lhs => write!(f, "lhs"),
            AliasCheck::Rhs => write!(f, "rhs"),
        }
    }
}

impl FromStr for AliasCheck {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lhs" => Ok(AliasCheck::Lhs),
            "rhs" => Ok(AliasCheck::Rhs),
            other => Err(ToolError::config(format!(
                "rhs_alias_check must be `lhs` or `rhs`, not `{}`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstrumentConfig {
    /// Statement inserted before each qualifying store
    pub barrier_call: String,
    /// Exact spelling of the opaque tracked-reference type
    pub opaque_alias: String,
    /// Name of the field tracked objects start with
    pub head_field: String,
    pub rhs_alias_check: AliasCheck,
    /// Leave statements alone that already follow a barrier line
    pub skip_instrumented: bool,
    /// Extra directories whose headers are system headers
    pub system_dirs: Vec<PathBuf>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            barrier_call: DEFAULT_BARRIER_CALL.to_string(),
            opaque_alias: DEFAULT_OPAQUE_ALIAS.to_string(),
            head_field: DEFAULT_HEAD_FIELD.to_string(),
            rhs_alias_check: AliasCheck::Lhs,
            skip_instrumented: false,
            system_dirs: Vec::new(),
        }
    }
}

impl InstrumentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ToolError> {
        let config: InstrumentConfig =
            serde_json::from_str(json).map_err(|e| ToolError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ToolError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ToolError::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: InstrumentConfig = serde_json::from_str(&content)
            .map_err(|e| ToolError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        if self.barrier_call.trim().is_empty() {
            return Err(ToolError::config("barrier_call must not be empty"));
        }
        if self.barrier_call.contains('\n') {
            return Err(ToolError::config("barrier_call must fit on one line"));
        }
        if self.opaque_alias.trim().is_empty() {
            return Err(ToolError::config("opaque_alias must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = InstrumentConfig::from_json_str("{}").unwrap();
        assert_eq!(config, InstrumentConfig::default());
        assert_eq!(config.barrier_call, "__write_barrier();");
        assert_eq!(config.opaque_alias, "VALUE");
        assert_eq!(config.rhs_alias_check, AliasCheck::Lhs);
    }

    #[test]
    fn test_partial_file() {
        let config = InstrumentConfig::from_json_str(
            r#"{"barrier_call": "rb_gc_wb();", "rhs_alias_check": "rhs", "system_dirs": ["/opt/sdk"]}"#,
        )
        .unwrap();
        assert_eq!(config.barrier_call, "rb_gc_wb();");
        assert_eq!(config.rhs_alias_check, AliasCheck::Rhs);
        assert_eq!(config.system_dirs, vec![PathBuf::from("/opt/sdk")]);
        assert_eq!(config.head_field, "flag");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(InstrumentConfig::from_json_str(r#"{"barrier": "x();"}"#).is_err());
        assert!(InstrumentConfig::from_json_str(r#"{"rhs_alias_check": "both"}"#).is_err());
        assert!(InstrumentConfig::from_json_str(r#"{"barrier_call": "  "}"#).is_err());
        assert!(InstrumentConfig::from_json_str(r#"{"barrier_call": "a();\nb();"}"#).is_err());
    }

    #[test]
    fn test_alias_check_from_str() {
        assert_eq!("lhs".parse::<AliasCheck>(), Ok(AliasCheck::Lhs));
        assert_eq!("rhs".parse::<AliasCheck>(), Ok(AliasCheck::Rhs));
        assert_eq!(AliasCheck::Rhs.to_string().parse::<AliasCheck>(), Ok(AliasCheck::Rhs));
        assert!(matches!("both".parse::<AliasCheck>(), Err(ToolError::Config { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insert-wb.json");
        std::fs::write(&path, r#"{"skip_instrumented": true}"#).unwrap();
        assert!(InstrumentConfig::from_json_file(&path).unwrap().skip_instrumented);

        let err = InstrumentConfig::from_json_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ToolError::Config { .. }));
    }
}
