use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::KeywordPolicy;

pub const CONFIG_PATH_ENV: &str = "AURA_CONFIG";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_CONFIG_PATH: &str = "aura.json";
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(1);

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
  pub bind_address: String,
  pub database_path: PathBuf,
  pub seed_path: Option<PathBuf>,
  pub gemini_api_base: String,
  pub gemini_model: String,
  pub request_timeout_secs: u64,
  pub keyword_policy: KeywordPolicy,
  pub log_level: String,
  pub log_path: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      bind_address: "127.0.0.1:5000".to_string(),
      database_path: PathBuf::from("aura.sqlite3"),
      seed_path: None,
      gemini_api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
      gemini_model: "gemini-1.5-pro-latest".to_string(),
      request_timeout_secs: 60,
      keyword_policy: KeywordPolicy::MatchEmpty,
      log_level: "info".to_string(),
      log_path: None,
    }
  }
}

impl AppConfig {
  /// Deadline for one chat request's text generation.
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  /// HTTP client deadline. Kept above `request_timeout` so a slow upstream
  /// always surfaces as a generation timeout.
  pub fn client_timeout(&self) -> Duration {
    self.request_timeout() + CLIENT_TIMEOUT_MARGIN
  }

  fn validate(&self) -> anyhow::Result<()> {
    if self.request_timeout_secs == 0 {
      anyhow::bail!("request_timeout_secs must be greater than 0");
    }
    Ok(())
  }
}

pub fn config_path() -> PathBuf {
  std::env::var_os(CONFIG_PATH_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn api_key() -> anyhow::Result<String> {
  let key = std::env::var(API_KEY_ENV).unwrap_or_default();
  if key.trim().is_empty() {
    anyhow::bail!("{API_KEY_ENV} is not set");
  }
  Ok(key)
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if path.exists() {
    let data = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    Ok(config)
  }
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json)?;
  Ok(())
}
