use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public character API root
pub const DEFAULT_API_URL: &str = "https://rickandmortyapi.com/api/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Never touch the network; serve everything from the local cache
  #[serde(default)]
  pub offline: bool,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Per-request timeout; an expired request counts as a transport failure
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Timeout of the reachability probe made before each page fetch
  #[serde(default = "default_probe_timeout_ms")]
  pub probe_timeout_ms: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      timeout_secs: default_timeout_secs(),
      probe_timeout_ms: default_probe_timeout_ms(),
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout_ms)
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  15
}

fn default_probe_timeout_ms() -> u64 {
  1500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Database file (default: $XDG_DATA_HOME/rmdex/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Concurrent page requests during `rmdex sync`
  #[serde(default = "default_sync_concurrency")]
  pub concurrency: usize,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      concurrency: default_sync_concurrency(),
    }
  }
}

fn default_sync_concurrency() -> usize {
  4
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rmdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rmdex/config.yaml
  ///
  /// Falls back to built-in defaults when no file exists.
  /// `RMDEX_API_URL` overrides `api.url` either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("RMDEX_API_URL") {
      config.api.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rmdex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rmdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Per-user data directory holding the cache, session snapshot and logs.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("rmdex"))
  }

  pub fn cache_path(&self) -> Result<PathBuf> {
    match &self.cache.path {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("cache.db")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_document_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.api.url, DEFAULT_API_URL);
    assert_eq!(config.api.timeout(), Duration::from_secs(15));
    assert_eq!(config.sync.concurrency, 4);
    assert!(!config.offline);
    assert!(config.cache.path.is_none());
  }

  #[test]
  fn test_partial_sections() {
    let yaml = r#"
api:
  url: http://localhost:8080/api/
  probe_timeout_ms: 200
cache:
  path: /tmp/rmdex-test.db
offline: true
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.url, "http://localhost:8080/api/");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.api.probe_timeout(), Duration::from_millis(200));
    assert!(config.offline);
    assert_eq!(
      config.cache_path().unwrap(),
      PathBuf::from("/tmp/rmdex-test.db")
    );
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
