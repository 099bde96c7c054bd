//! Browse session restoration across restarts.
//!
//! Only the filters (including the search text) and the scroll anchor survive;
//! entries are always reloaded through the repository.

use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::state::ScrollAnchor;
use crate::catalog::FilterSet;

/// Snapshot file name inside the data directory
const SNAPSHOT_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
  #[serde(default)]
  pub filters: FilterSet,
  #[serde(default)]
  pub scroll_anchor: ScrollAnchor,
}

impl SessionSnapshot {
  pub fn default_path() -> Result<PathBuf> {
    Ok(Config::data_dir()?.join(SNAPSHOT_FILE))
  }

  /// Read a snapshot; a missing file yields `None`.
  pub fn load(path: &Path) -> Result<Option<Self>> {
    if !path.exists() {
      return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read session file {}: {}", path.display(), e))?;

    let snapshot = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse session file {}: {}", path.display(), e))?;

    Ok(Some(snapshot))
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(self)
      .map_err(|e| eyre!("Failed to serialize session: {}", e))?;
    std::fs::write(path, contents)
      .map_err(|e| eyre!("Failed to write session file {}: {}", path.display(), e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
      SessionSnapshot::load(&dir.path().join("session.json")).unwrap(),
      None
    );
  }

  #[test]
  fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("session.json");
    let snapshot = SessionSnapshot {
      filters: FilterSet::default().with_name("rick").with_status("dead"),
      scroll_anchor: ScrollAnchor {
        index: 37,
        offset: 120,
      },
    };

    snapshot.save(&path).unwrap();

    assert_eq!(SessionSnapshot::load(&path).unwrap(), Some(snapshot));
  }

  #[test]
  fn test_partial_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"filters": {"name": "morty"}}"#).unwrap();

    let snapshot = SessionSnapshot::load(&path).unwrap().unwrap();

    assert_eq!(snapshot.filters.name.as_deref(), Some("morty"));
    assert_eq!(snapshot.scroll_anchor, ScrollAnchor::default());
  }

  #[test]
  fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(SessionSnapshot::load(&path).is_err());
  }
}
