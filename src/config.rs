use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::app::ports::{ProviderKind, Region};
use crate::constants::*;
use crate::domain::Credentials;
use crate::error::{Result, ScraperError};

/// Pipeline configuration: defaults, then `config.toml`, then environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub overpass: OverpassConfig,
    pub elevation: ElevationConfig,
    pub validation: ValidationConfig,
    pub upload: UploadConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverpassConfig {
    pub url: String,
    pub area_name: String,
    pub admin_level: u8,
    /// Timeout directive embedded in the query text
    pub query_timeout_seconds: u32,
    pub timeout_seconds: u64,
    /// Pause between the station and accommodation queries
    pub query_pause_ms: u64,
    pub max_retries: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OVERPASS_URL.to_string(),
            area_name: DEFAULT_AREA_NAME.to_string(),
            admin_level: DEFAULT_ADMIN_LEVEL,
            query_timeout_seconds: 300,
            timeout_seconds: 300,
            query_pause_ms: DEFAULT_QUERY_PAUSE_MS,
            max_retries: 3,
        }
    }
}

impl OverpassConfig {
    pub fn region(&self) -> Region {
        Region {
            name: self.area_name.clone(),
            admin_level: self.admin_level,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub provider: ProviderKind,
    pub opentopo_url: String,
    pub open_elevation_url: String,
    /// Delay applied after every lookup
    pub rate_limit_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenTopoData,
            opentopo_url: DEFAULT_OPENTOPO_URL.to_string(),
            open_elevation_url: DEFAULT_OPEN_ELEVATION_URL.to_string(),
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_elevation: f64,
    pub max_elevation: f64,
    /// How many invalid reasons to log per category
    pub example_limit: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_elevation: DEFAULT_MIN_ELEVATION,
            max_elevation: DEFAULT_MAX_ELEVATION,
            example_limit: DEFAULT_INVALID_EXAMPLE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub api_url: String,
    pub changeset_comment: String,
    pub created_by: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OSM_API_URL.to_string(),
            changeset_comment: DEFAULT_CHANGESET_COMMENT.to_string(),
            created_by: CREATED_BY.to_string(),
            username: None,
            password: None,
            access_token: None,
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

impl UploadConfig {
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(
            self.username.clone(),
            self.password.clone(),
            self.access_token.clone(),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub csv_file: String,
    pub log_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            csv_file: DEFAULT_CSV_FILE.to_string(),
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl OutputConfig {
    pub fn csv_path(&self) -> PathBuf {
        self.directory.join(&self.csv_file)
    }
}

impl Config {
    /// Load from a TOML file. A missing file is not an error: defaults apply.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("No config file at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; blank values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("OVERPASS_URL") {
            self.overpass.url = url;
        }
        if let Some(url) = get("OPENTOPO_URL") {
            self.elevation.opentopo_url = url;
        }
        if let Some(url) = get("OPEN_ELEVATION_URL") {
            self.elevation.open_elevation_url = url;
        }
        if let Some(provider) = get("ELEVATION_PROVIDER") {
            self.elevation.provider = ProviderKind::from_str(&provider).map_err(ScraperError::Config)?;
        }
        if let Some(url) = get("OSM_API_URL") {
            self.upload.api_url = url;
        }
        if let Some(ms) = get("API_RATE_LIMIT_MS") {
            self.elevation.rate_limit_ms = parse_number("API_RATE_LIMIT_MS", &ms)?;
        }
        if let Some(secs) = get("API_TIMEOUT_SEC") {
            let secs: u64 = parse_number("API_TIMEOUT_SEC", &secs)?;
            self.elevation.timeout_seconds = secs;
            self.upload.timeout_seconds = secs;
        }
        if let Some(username) = get("OSM_USERNAME") {
            self.upload.username = Some(username);
        }
        if let Some(password) = get("OSM_PASSWORD") {
            self.upload.password = Some(password);
        }
        if let Some(token) = get("OSM_ACCESS_TOKEN") {
            self.upload.access_token = Some(token);
        }
        Ok(())
    }

    /// Sanity checks that would otherwise surface mid-run
    pub fn validate(&self) -> Result<()> {
        if self.validation.min_elevation > self.validation.max_elevation {
            return Err(ScraperError::Config(format!(
                "min_elevation {} is greater than max_elevation {}",
                self.validation.min_elevation, self.validation.max_elevation
            )));
        }
        if self.overpass.area_name.trim().is_empty() {
            return Err(ScraperError::Config("overpass.area_name must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ScraperError::Config(format!("{key} must be a number, got '{value}'")))
}
