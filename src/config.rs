use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

const API_URL_ENV: &str = "PADEL_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub club: ClubConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClubConfig {
    pub id: i64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl ClubConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_refresh_secs() -> u64 {
    300
}

impl Config {
    /// Session file path; relative paths resolve next to the config file.
    pub fn session_path(&self, config_path: &Path) -> PathBuf {
        let dir = config_path.parent().unwrap_or(Path::new("."));
        match &self.session.path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => dir.join(p),
            None => dir.join("session.json"),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse_config(&content, std::env::var(API_URL_ENV).ok())
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

fn parse_config(content: &str, api_url_override: Option<String>) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    if let Some(url) = api_url_override.filter(|u| !u.trim().is_empty()) {
        config.api.base_url = url;
    }
    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
    config.club.tz()?;
    Ok(config)
}
