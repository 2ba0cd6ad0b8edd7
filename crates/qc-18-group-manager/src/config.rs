//! # Lifecycle Configuration
//!
//! Node-local settings for group management: where group files live, which
//! node this is, and the templates new groups are generated from.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::{GenesisConfig, GroupConfig, NodeId};

/// Default tolerated distance between a group's creation timestamp and the
/// local clock.
pub const DEFAULT_TIMESTAMP_SKEW_SECS: u64 = 24 * 60 * 60;

/// Group lifecycle configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// This node's identity.
    pub node_id: NodeId,

    /// Directory holding `group.<id>.genesis` and `group.<id>.ini`.
    pub conf_dir: PathBuf,

    /// Directory holding per-group data and status markers.
    pub data_dir: PathBuf,

    /// Max distance between creation timestamp and local time; `None`
    /// disables the check.
    #[serde(default = "default_skew")]
    pub max_timestamp_skew_secs: Option<u64>,

    /// Template for new genesis files.
    #[serde(default)]
    pub genesis_template: GenesisConfig,

    /// Template for new group config files.
    #[serde(default)]
    pub group_template: GroupConfig,
}

fn default_skew() -> Option<u64> {
    Some(DEFAULT_TIMESTAMP_SKEW_SECS)
}

impl LifecycleConfig {
    /// Config rooted at `base` (`base/conf`, `base/data`).
    pub fn new(node_id: NodeId, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            node_id,
            conf_dir: base.join("conf"),
            data_dir: base.join("data"),
            max_timestamp_skew_secs: default_skew(),
            genesis_template: GenesisConfig::template(),
            group_template: GroupConfig::default(),
        }
    }

    /// Config for tests: no timestamp skew bound.
    pub fn for_testing(node_id: NodeId, base: impl AsRef<Path>) -> Self {
        Self {
            max_timestamp_skew_secs: None,
            ..Self::new(node_id, base)
        }
    }

    /// Apply `QC_GROUP_CONF_DIR`, `QC_GROUP_DATA_DIR` and
    /// `QC_GROUP_TIMESTAMP_SKEW_SECS`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("QC_GROUP_CONF_DIR") {
            info!("[qc-18] conf_dir overridden from environment: {}", dir);
            self.conf_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("QC_GROUP_DATA_DIR") {
            info!("[qc-18] data_dir overridden from environment: {}", dir);
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("QC_GROUP_TIMESTAMP_SKEW_SECS") {
            match raw.parse::<u64>() {
                Ok(0) => self.max_timestamp_skew_secs = None,
                Ok(secs) => self.max_timestamp_skew_secs = Some(secs),
                Err(_) => warn!("[qc-18] ignoring invalid QC_GROUP_TIMESTAMP_SKEW_SECS={}", raw),
            }
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.conf_dir.as_os_str().is_empty() {
            return Err("conf_dir must not be empty".to_string());
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }
        if self.genesis_template.consensus.consensus_type.is_empty() {
            return Err("genesis template needs a consensus_type".to_string());
        }
        if self.group_template.tx_pool.limit == 0 {
            return Err("group template tx_pool.limit must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> NodeId {
        NodeId::parse(&"ef".repeat(64)).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let config = LifecycleConfig::new(node(), "/var/qc");
        assert_eq!(config.conf_dir, PathBuf::from("/var/qc/conf"));
        assert_eq!(config.data_dir, PathBuf::from("/var/qc/data"));
        assert_eq!(config.max_timestamp_skew_secs, Some(DEFAULT_TIMESTAMP_SKEW_SECS));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config_has_no_skew() {
        let config = LifecycleConfig::for_testing(node(), "/tmp/x");
        assert!(config.max_timestamp_skew_secs.is_none());
    }

    #[test]
    fn test_validate_rejects_empty_dirs() {
        let mut config = LifecycleConfig::new(node(), "/var/qc");
        config.conf_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_defaults_fill_templates() {
        let text = format!(
            "node_id = \"{}\"\nconf_dir = \"/c\"\ndata_dir = \"/d\"\n",
            node()
        );
        let config: LifecycleConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.genesis_template, GenesisConfig::template());
        assert_eq!(config.max_timestamp_skew_secs, Some(DEFAULT_TIMESTAMP_SKEW_SECS));
    }
}
