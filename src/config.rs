//! Library configuration.
//!
//! Loaded from TOML. Every section and key is optional:
//!
//! ```toml
//! [constraints]
//! force = false
//! allow_duplicates = false
//! allow_multi_instance = false
//!
//! [ids]
//! set_constraint_prefix = "pcs"
//!
//! [removal]
//! report_dependants = true
//! report_references = true
//! ```

use crate::ids::id_problem;
use crate::reports::{ForceFlag, ForceFlags};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Main Config Schema
// ============================================================================

/// Configuration for CIB editing operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Constraint creation policy
    #[serde(default)]
    pub constraints: ConstraintsConfig,

    /// Id generation
    #[serde(default)]
    pub ids: IdsConfig,

    /// Element removal reporting
    #[serde(default)]
    pub removal: RemovalConfig,
}

impl Config {
    /// Load config from a TOML file, falling back to defaults when the file
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Save the config to a TOML file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Could not write config file: {}", path.display()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.ids.validate().context("Invalid [ids] section")
    }

    /// Override tokens implied by the `[constraints]` section.
    pub fn force_flags(&self) -> ForceFlags {
        let mut flags = ForceFlags::new();
        if self.constraints.force {
            flags.insert(ForceFlag::Force);
        }
        if self.constraints.allow_duplicates {
            flags.insert(ForceFlag::AllowDuplicates);
        }
        if self.constraints.allow_multi_instance {
            flags.insert(ForceFlag::AllowMultiInstance);
        }
        flags
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Constraint creation policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintsConfig {
    /// Downgrade every forceable error to a warning
    #[serde(default)]
    pub force: bool,

    /// Allow constraints duplicating existing ones
    #[serde(default)]
    pub allow_duplicates: bool,

    /// Allow constraining resources inside clones and bundles
    #[serde(default)]
    pub allow_multi_instance: bool,
}

/// Id generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsConfig {
    /// Leading part of generated set constraint ids
    #[serde(default = "default_set_constraint_prefix")]
    pub set_constraint_prefix: String,
}

fn default_set_constraint_prefix() -> String {
    "pcs".to_string()
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            set_constraint_prefix: default_set_constraint_prefix(),
        }
    }
}

impl IdsConfig {
    fn validate(&self) -> Result<()> {
        if let Some(reason) = id_problem(&self.set_constraint_prefix) {
            anyhow::bail!(
                "set_constraint_prefix '{}' cannot start an id: {reason}",
                self.set_constraint_prefix
            );
        }
        Ok(())
    }

    /// Id prefix for set constraints of the given tag, e.g.
    /// `pcs_rsc_colocation`.
    pub fn set_constraint_prefix_for(&self, constraint_tag: &str) -> String {
        format!("{}_{constraint_tag}", self.set_constraint_prefix)
    }
}

/// Element removal reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Report elements removed because of a requested removal
    #[serde(default = "default_true")]
    pub report_dependants: bool,

    /// Report references edited out of surviving elements
    #[serde(default = "default_true")]
    pub report_references: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            report_dependants: true,
            report_references: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.force_flags().is_empty());
        assert!(config.removal.report_dependants);
        assert_eq!(
            config.ids.set_constraint_prefix_for("rsc_order"),
            "pcs_rsc_order"
        );
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml_str(
            r#"
[constraints]
allow_duplicates = true

[removal]
report_references = false
"#,
        )
        .unwrap();
        let flags = config.force_flags();
        assert!(flags.contains(ForceFlag::AllowDuplicates));
        assert!(!flags.contains(ForceFlag::Force));
        assert!(config.removal.report_dependants);
        assert!(!config.removal.report_references);
    }

    #[test]
    fn test_invalid_prefix() {
        let err = Config::from_toml_str("[ids]\nset_constraint_prefix = \"1x\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("set_constraint_prefix"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("[constraints\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cibkit.toml");
        let mut config = Config::default();
        config.constraints.force = true;
        config.ids.set_constraint_prefix = "site".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.force_flags().contains(ForceFlag::Force));
    }
}
