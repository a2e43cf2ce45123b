//! Layered client settings: defaults, then `labo.toml`, then `LABO_*`
//! environment variables. Command-line flags are applied last by `main`.

use std::{path::Path, time::Duration};

use anyhow::Context as _;
use labo_client::ApiConfig;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub base_url:       String,
  pub token:          Option<String>,
  pub timeout_secs:   u64,
  pub cache_ttl_secs: u64,
  /// The address that lands on the dashboard after login.
  pub admin_email:    String,
  /// Who is running the console; decides the default view.
  pub user_email:     Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      base_url:       "http://localhost:8888".to_string(),
      token:          None,
      timeout_secs:   30,
      cache_ttl_secs: 300,
      admin_email:    "admin@lab.com".to_string(),
      user_email:     None,
    }
  }
}

impl Settings {
  /// Read `path` (optional) and the `LABO_` environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LABO"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      base_url: self.base_url.clone(),
      token:    self.token.clone(),
      timeout:  Duration::from_secs(self.timeout_secs),
    }
  }

  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }
}
