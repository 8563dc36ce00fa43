use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Remote API; without it the synthetic data source is used
  pub api: Option<ApiConfig>,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  pub page_size: u32,
  /// Initial sort, `field` or `-field` for descending
  pub sort: String,
  pub cache: CacheConfig,
  /// Number of log lines kept for the log panel
  pub log_buffer: usize,
  /// Spinner frame interval in milliseconds
  pub tick_rate_ms: u64,
  pub mock: MockConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: None,
      title: None,
      page_size: 25,
      sort: "-created_at".to_string(),
      cache: CacheConfig::default(),
      log_buffer: 500,
      tick_rate_ms: 120,
      mock: MockConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  /// Transport timeout; the only bound on a fetch's lifetime
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
  /// SQLite file under the user cache directory
  #[default]
  Sqlite,
  /// Process memory only
  Memory,
  /// No caching at all
  None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend: CacheBackendKind,
  /// Override for the SQLite file location
  pub path: Option<PathBuf>,
  pub list_ttl_secs: u64,
  pub detail_ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackendKind::default(),
      path: None,
      list_ttl_secs: 60,
      detail_ttl_secs: 300,
    }
  }
}

impl CacheConfig {
  pub fn list_ttl(&self) -> Duration {
    Duration::from_secs(self.list_ttl_secs)
  }

  pub fn detail_ttl(&self) -> Duration {
    Duration::from_secs(self.detail_ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockConfig {
  /// Simulated network latency for the synthetic source
  pub latency_ms: u64,
}

impl Default for MockConfig {
  fn default() -> Self {
    Self { latency_ms: 300 }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./inctui.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/inctui/config.yaml
  ///
  /// Without any file the defaults apply.
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("inctui.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("inctui").join("config.yaml");
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

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.page_size == 0 {
      return Err(eyre!("page_size must be at least 1"));
    }
    Ok(config)
  }

  /// Get the API token from the environment.
  ///
  /// Checks INCTUI_API_TOKEN. A missing token means unauthenticated requests.
  pub fn get_api_token() -> Option<String> {
    std::env::var("INCTUI_API_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }

  /// Header title: explicit title, else the API host, else "mock".
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    match &self.api {
      Some(api) => url::Url::parse(&api.url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| api.url.clone()),
      None => "mock data".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert!(config.api.is_none());
    assert_eq!(config.page_size, 25);
    assert_eq!(config.cache.backend, CacheBackendKind::Sqlite);
    assert_eq!(config.cache.list_ttl(), Duration::from_secs(60));
    assert_eq!(config.cache.detail_ttl(), Duration::from_secs(300));
    assert_eq!(config.display_title(), "mock data");
  }

  #[test]
  fn test_full_file() {
    let yaml = r#"
api:
  url: https://oncall.example.com/api/v1
page_size: 50
sort: severity
cache:
  backend: memory
  list_ttl_secs: 10
mock:
  latency_ms: 0
"#;
    let config = Config::parse(yaml).unwrap();
    let api = config.api.as_ref().unwrap();

    assert_eq!(api.timeout_secs, 30);
    assert_eq!(config.page_size, 50);
    assert_eq!(config.sort, "severity");
    assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    assert_eq!(config.cache.list_ttl_secs, 10);
    assert_eq!(config.cache.detail_ttl_secs, 300);
    assert_eq!(config.mock.latency_ms, 0);
    assert_eq!(config.display_title(), "oncall.example.com");
  }

  #[test]
  fn test_disabled_cache_backend() {
    let config = Config::parse("cache:\n  backend: none\n").unwrap();
    assert_eq!(config.cache.backend, CacheBackendKind::None);
  }

  #[test]
  fn test_zero_page_size_is_rejected() {
    assert!(Config::parse("page_size: 0").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/definitely/not/here.yaml"))).is_err());
  }
}
