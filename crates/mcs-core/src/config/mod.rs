//! Runtime configuration.
//!
//! Values come from `<config dir>/mycarsetting/config.json` when it exists,
//! then `MCS_API_URL`, `MCS_API_TOKEN` and `MCS_DB_PATH` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::remote::HttpGateway;
use crate::util::{is_http_url, normalize_text_option};

const APP_DIR: &str = "mycarsetting";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "mycarsetting.db";

pub const ENV_API_URL: &str = "MCS_API_URL";
pub const ENV_API_TOKEN: &str = "MCS_API_TOKEN";
pub const ENV_DB_PATH: &str = "MCS_DB_PATH";

/// Upper bounds accepted for the duration settings
pub const MAX_REMINDER_LOOKAHEAD_HOURS: u64 = 366 * 24;
pub const MAX_SYNC_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 10 * 60;

const SECS_PER_HOUR: u64 = 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Backend root; without it the app runs offline
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_lookahead_hours")]
    pub reminder_lookahead_hours: u64,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_lookahead_hours() -> u64 {
    72
}

const fn default_sync_interval_secs() -> u64 {
    15 * 60
}

const fn default_request_timeout_secs() -> u64 {
    15
}

/// `count` hours, saturating at the largest representable duration
#[must_use]
pub const fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(SECS_PER_HOUR))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            db_path: None,
            reminder_lookahead_hours: default_lookahead_hours(),
            sync_interval_secs: default_sync_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// `<config dir>/mycarsetting/config.json`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

impl AppConfig {
    /// Load from the default location and the process environment.
    pub fn load() -> Result<Self> {
        let config = match default_config_path() {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };
        config
            .with_overrides(|key| std::env::var(key).ok())
            .validate()
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::InvalidInput(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })
    }

    /// Apply environment-style overrides looked up through `lookup`.
    #[must_use]
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_base_url: normalize_text_option(lookup(ENV_API_URL)).or(self.api_base_url),
            api_token: normalize_text_option(lookup(ENV_API_TOKEN)).or(self.api_token),
            db_path: normalize_text_option(lookup(ENV_DB_PATH))
                .map(PathBuf::from)
                .or(self.db_path),
            ..self
        }
    }

    /// Trim optional values and reject unusable ones.
    pub fn validate(self) -> Result<Self> {
        let api_base_url = normalize_text_option(self.api_base_url)
            .map(|url| url.trim_end_matches('/').to_string());
        if let Some(url) = &api_base_url {
            if !is_http_url(url) {
                return Err(Error::InvalidInput(format!(
                    "api_base_url must start with http:// or https:// (got {url})"
                )));
            }
        }
        for (name, value, max) in [
            (
                "reminder_lookahead_hours",
                self.reminder_lookahead_hours,
                MAX_REMINDER_LOOKAHEAD_HOURS,
            ),
            ("sync_interval_secs", self.sync_interval_secs, MAX_SYNC_INTERVAL_SECS),
            ("request_timeout_secs", self.request_timeout_secs, MAX_REQUEST_TIMEOUT_SECS),
        ] {
            if !(1..=max).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "{name} must be between 1 and {max} (got {value})"
                )));
            }
        }

        Ok(Self {
            api_base_url,
            api_token: normalize_text_option(self.api_token),
            ..self
        })
    }

    /// Database file to open: the configured path or the platform data dir.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(DB_FILE_NAME))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "No data directory on this platform; set {ENV_DB_PATH}"
                ))
            })
    }

    #[must_use]
    pub const fn reminder_lookahead(&self) -> Duration {
        hours(self.reminder_lookahead_hours)
    }

    #[must_use]
    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP gateway for the configured backend, `None` when offline
    pub fn gateway(&self) -> Result<Option<HttpGateway>> {
        self.api_base_url
            .as_deref()
            .map(|url| HttpGateway::with_timeout(url, self.api_token.clone(), self.request_timeout()))
            .transpose()
    }
}
