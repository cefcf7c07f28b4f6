/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! TOML configuration for the synchronizer and the replay binary.
//!
//! Every field is optional; an empty file yields [`SimviewConfig::default`].
//!
//! ```toml
//! duplicate_nodes = "reject"
//! snapshot_after_live = "reset"
//! initial_view = "tree"
//! log_filter = "simview=debug"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimviewError;
use crate::model::TopologyKind;

/// What `add_node` does with an id that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateNodePolicy {
    /// Re-initialize the node: fresh metadata, no edges, membership kept.
    #[default]
    Overwrite,
    /// Refuse with `SimviewError::DuplicateNode`.
    Reject,
}

/// What the dispatcher does with a snapshot that arrives once already live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotPolicy {
    #[default]
    Ignore,
    /// Drop all state and repopulate from the new snapshot.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimviewConfig {
    pub duplicate_nodes: DuplicateNodePolicy,
    pub snapshot_after_live: SnapshotPolicy,
    pub initial_view: TopologyKind,
    /// `EnvFilter` directive used by the replay binary.
    pub log_filter: String,
}

impl Default for SimviewConfig {
    fn default() -> Self {
        Self {
            duplicate_nodes: DuplicateNodePolicy::default(),
            snapshot_after_live: SnapshotPolicy::default(),
            initial_view: TopologyKind::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl SimviewConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, SimviewError> {
        toml::from_str(raw).map_err(|e| SimviewError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SimviewError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SimviewError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SimviewConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimviewConfig::default());
        assert_eq!(config.duplicate_nodes, DuplicateNodePolicy::Overwrite);
        assert_eq!(config.snapshot_after_live, SnapshotPolicy::Ignore);
        assert_eq!(config.initial_view, TopologyKind::Physical);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_parses_all_fields() {
        let config = SimviewConfig::from_toml_str(
            r#"
            duplicate_nodes = "reject"
            snapshot_after_live = "reset"
            initial_view = "snake"
            log_filter = "simview=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.duplicate_nodes, DuplicateNodePolicy::Reject);
        assert_eq!(config.snapshot_after_live, SnapshotPolicy::Reset);
        assert_eq!(config.initial_view, TopologyKind::Snake);
        assert_eq!(config.log_filter, "simview=debug");
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let error = SimviewConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(error, SimviewError::Config(_)));
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "initial_view = \"tree\"").unwrap();
        let config = SimviewConfig::load(file.path()).unwrap();
        assert_eq!(config.initial_view, TopologyKind::Tree);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = SimviewConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(error, SimviewError::Io(_)));
    }
}
