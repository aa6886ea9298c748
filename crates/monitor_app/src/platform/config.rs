use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::engine_info;
use monitor_core::{EstimatorConfig, MonitorSettings};
use monitor_engine::GatewaySettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cli::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Monitor configuration; a RON file may set any subset of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub poll_interval_ms: u64,
    pub assumed_total_ms: u64,
    pub navigation_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let monitor = MonitorSettings::default();
        let gateway = GatewaySettings::default();
        Self {
            api_base_url: gateway.base_url,
            api_token: None,
            poll_interval_ms: millis(monitor.poll_interval),
            assumed_total_ms: millis(monitor.estimator.assumed_total),
            navigation_delay_ms: millis(monitor.navigation_delay),
            connect_timeout_ms: millis(gateway.connect_timeout),
            request_timeout_ms: millis(gateway.request_timeout),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl MonitorConfig {
    /// Defaults when `path` is `None`; otherwise the file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        engine_info!("Loaded monitor config from {:?}", path);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(url) = &args.api_base_url {
            self.api_base_url = url.clone();
        }
        if let Some(token) = &args.token {
            self.api_token = Some(token.clone());
        }
        if let Some(interval) = args.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(total) = args.assumed_total_ms {
            self.assumed_total_ms = total;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be an http(s) URL, got {url:?}"
            )));
        }
        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            navigation_delay: Duration::from_millis(self.navigation_delay_ms),
            estimator: EstimatorConfig::default()
                .with_assumed_total(Duration::from_millis(self.assumed_total_ms)),
        }
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            base_url: self.api_base_url.trim().to_string(),
            api_token: self.api_token.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}
