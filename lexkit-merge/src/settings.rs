//! Merge settings, read from a TOML file.
//!
//! ```toml
//! [merge]
//! preserve-both-values = true
//! separator = " / "
//! deduplicate = false
//!
//! [signature]
//! fields = ["Gloss", "Definition"]
//! ```
//!
//! Every key is optional. An empty `fields` list means deep signatures.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::merger::MergePolicy;
use crate::signature::FieldSet;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MergeSection {
    pub preserve_both_values: bool,
    pub separator: String,
    /// Deduplicate the survivor's owned children after every merge. On by
    /// default.
    pub deduplicate: bool,
}

impl Default for MergeSection {
    fn default() -> Self {
        let policy = MergePolicy::default();
        Self {
            preserve_both_values: policy.preserve_both_values,
            separator: policy.separator,
            deduplicate: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SignatureSection {
    pub fields: Vec<String>,
}

/// Everything a merge run can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MergeSettings {
    pub merge: MergeSection,
    pub signature: SignatureSection,
}

impl MergeSettings {
    /// Parses settings, failing on malformed TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads settings from `path`, using the defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No merge settings at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(settings) => {
                    info!("Loaded merge settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!(
                        "Failed to parse merge settings {:?}: {}. Falling back to defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read merge settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn policy(&self) -> MergePolicy {
        MergePolicy {
            preserve_both_values: self.merge.preserve_both_values,
            separator: self.merge.separator.clone(),
        }
    }

    /// The fields duplicate detection compares.
    pub fn field_set(&self) -> FieldSet {
        if self.signature.fields.is_empty() {
            FieldSet::Deep
        } else {
            FieldSet::Fields(self.signature.fields.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let settings = MergeSettings::from_toml_str("").unwrap();
        assert_eq!(settings, MergeSettings::default());
        assert_eq!(settings.policy(), MergePolicy::default());
        assert_eq!(settings.field_set(), FieldSet::Deep);
        assert!(settings.merge.deduplicate);
    }

    #[test]
    fn parses_kebab_case_keys() {
        let settings = MergeSettings::from_toml_str(
            r#"
[merge]
preserve-both-values = true
separator = " / "
deduplicate = false

[signature]
fields = ["Gloss", "Definition"]
"#,
        )
        .unwrap();

        assert!(!settings.merge.deduplicate);
        assert_eq!(
            settings.policy(),
            MergePolicy {
                preserve_both_values: true,
                separator: " / ".to_string(),
            }
        );
        assert_eq!(
            settings.field_set(),
            FieldSet::Fields(vec!["Gloss".to_string(), "Definition".to_string()])
        );
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings = MergeSettings::from_toml_str("[merge]\ndeduplicate = false\n").unwrap();
        assert!(!settings.merge.deduplicate);
        assert_eq!(settings.merge.separator, "; ");
        assert!(!settings.merge.preserve_both_values);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(MergeSettings::from_toml_str("[merge\nseparator = 3").is_err());
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = MergeSettings::load_from(dir.path().join("merge.toml"));
        assert_eq!(settings, MergeSettings::default());
    }

    #[test]
    fn load_from_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        std::fs::write(&path, "[merge]\nseparator = 3\n").unwrap();
        assert_eq!(MergeSettings::load_from(&path), MergeSettings::default());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        std::fs::write(&path, "[merge]\npreserve-both-values = true\n").unwrap();
        assert!(MergeSettings::load_from(&path).merge.preserve_both_values);
    }
}
