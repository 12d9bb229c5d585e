//! # Configuration
//!
//! Layered settings: built-in defaults, then an optional JSON or TOML file,
//! then `VISTA_`-prefixed environment variables (`VISTA_DEFAULT_LIMIT=12`).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{Figment, providers::{Env, Format, Json, Serialized, Toml}};
use serde::{Deserialize, Serialize};

use crate::core::error::VistaError;
use crate::loggers::LogLevel;

/// Everything the library reads from the host site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VistaConfig {
    /// Listings proxy endpoint.
    pub remote_url: String,
    /// Shared basic-auth credential for the proxy.
    pub api_user: String,
    pub api_password: String,
    /// Timeout for the listings call. `0` disables it.
    pub request_timeout_secs: u64,
    /// Page size used when the visitor did not pass `limit`.
    pub default_limit: u32,
    /// Trim whitespace around split list tokens and drop empty ones.
    pub trim_list_tokens: bool,
    /// Site root used to build "View Listing" links.
    pub home_url: String,
    /// Path of the single-listing page, relative to `home_url`.
    pub listing_page: String,
    /// IANA timezone open-house times are rendered in.
    pub timezone: String,
    pub log_level: LogLevel,
}

impl Default for VistaConfig {
    fn default() -> Self {
        Self {
            remote_url: "https://vistawp.com/wp-json/vista/api/v1/rets".to_string(),
            api_user: "vista".to_string(),
            api_password: "vista".to_string(),
            request_timeout_secs: 30,
            default_limit: 20,
            trim_list_tokens: false,
            home_url: String::new(),
            listing_page: "/individual-listing/".to_string(),
            timezone: "UTC".to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl VistaConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

pub struct ConfigManager {
    current: ArcSwap<VistaConfig>,
    source_info: String,
}

impl ConfigManager {
    /// Defaults plus environment only.
    pub fn from_env() -> Result<Self, VistaError> {
        let data = Self::extract(None)?;
        Ok(Self {
            current: ArcSwap::from_pointee(data),
            source_info: "env".to_string(),
        })
    }

    /// Defaults, then the file at `path`, then `VISTA_` env vars. Fails if the file is missing.
    pub fn from_file(path: &str) -> Result<Self, VistaError> {
        let data = Self::extract(Some(path))?;
        Ok(Self {
            current: ArcSwap::from_pointee(data),
            source_info: format!("file:{}", path),
        })
    }

    /// Wraps an already-built config, mostly for tests and embedding hosts.
    pub fn from_config(config: VistaConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
            source_info: "inline".to_string(),
        }
    }

    fn extract(path: Option<&str>) -> Result<VistaConfig, VistaError> {
        let mut figment = Figment::from(Serialized::defaults(VistaConfig::default()));

        if let Some(path) = path {
            if !Path::new(path).exists() {
                return Err(VistaError::Configuration(format!("Config file not found: {}", path)));
            }
            figment = if path.ends_with(".toml") {
                figment.merge(Toml::file(path))
            } else {
                figment.merge(Json::file(path))
            };
        }

        figment
            .merge(Env::prefixed("VISTA_"))
            .extract()
            .map_err(|e| VistaError::Configuration(e.to_string()))
    }

    /// Re-reads the original source and swaps the current config in place.
    pub fn reload(&self) -> Result<(), VistaError> {
        let path = self.source_info.strip_prefix("file:");
        if self.source_info == "inline" {
            return Ok(());
        }
        let data = Self::extract(path)?;
        self.current.store(Arc::new(data));
        Ok(())
    }

    pub fn get(&self) -> Arc<VistaConfig> {
        self.current.load_full()
    }

    pub fn source(&self) -> &str {
        &self.source_info
    }
}
