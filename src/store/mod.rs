//! # Persisted Settings
//!
//! A string key-value store standing in for the host site's option table.
//! Writes are last-write-wins and unlocked across processes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::core::error::VistaError;

pub mod keys {
    /// Unix time of the last failed API call, or empty.
    pub const API_ERR_TIME: &str = "vsta_api_err_time";
    pub const LICENSE_KEY: &str = "vista_license_key";
    pub const LICENSE_VALID: &str = "vista_license_valid";
    pub const TIER: &str = "vista_tier";
}

/// How long a recorded failure keeps busting upstream caches.
pub const ERROR_MARKER_TTL_SECS: i64 = 86_400;

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), VistaError>;
    fn remove(&self, key: &str) -> Result<(), VistaError>;
}

/// In-process store. Snapshots are swapped atomically on every write.
#[derive(Default)]
pub struct MemoryStore {
    values: ArcSwap<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { values: ArcSwap::from_pointee(map) }
    }

    pub fn snapshot(&self) -> Arc<BTreeMap<String, String>> {
        self.values.load_full()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), VistaError> {
        self.values.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.insert(key.to_string(), value.to_string());
            next
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), VistaError> {
        self.values.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.remove(key);
            next
        });
        Ok(())
    }
}

/// Memory store mirrored to a pretty-printed JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VistaError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| VistaError::Configuration(format!("Read Error: {}", e)))?;
            let map: BTreeMap<String, String> = serde_json::from_str(&raw)
                .map_err(|e| VistaError::Configuration(format!("Invalid settings file: {}", e)))?;
            MemoryStore::with_values(map)
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    fn flush(&self) -> Result<(), VistaError> {
        let json = serde_json::to_string_pretty(&*self.inner.snapshot())
            .map_err(|e| VistaError::Internal(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| VistaError::Internal(format!("Write Error: {}", e)))
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), VistaError> {
        self.inner.set(key, value)?;
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), VistaError> {
        self.inner.remove(key)?;
        self.flush()
    }
}

/// License key, validity flag and tier as saved by the settings page.
/// Only the key travels with API calls; validity and tier are logged with
/// each request and otherwise belong to the host's settings screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct License {
    pub key: Option<String>,
    pub valid: bool,
    pub tier: Option<u32>,
}

impl License {
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self {
            key: store.get(keys::LICENSE_KEY).filter(|k| !k.is_empty()),
            valid: store
                .get(keys::LICENSE_VALID)
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            tier: store.get(keys::TIER).and_then(|t| t.trim().parse().ok()),
        }
    }

    /// Token sent with every API call. Empty means demo data.
    pub fn token(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }
}

/// Last-error timestamp used to defeat caching after a failed call.
pub struct ErrorMarker<'a> {
    store: &'a dyn SettingsStore,
}

impl<'a> ErrorMarker<'a> {
    pub fn new(store: &'a dyn SettingsStore) -> Self {
        Self { store }
    }

    pub fn record(&self, now: DateTime<Utc>) -> Result<(), VistaError> {
        self.store.set(keys::API_ERR_TIME, &now.timestamp().to_string())
    }

    pub fn clear(&self) -> Result<(), VistaError> {
        self.store.set(keys::API_ERR_TIME, "")
    }

    pub fn recorded_at(&self) -> Option<i64> {
        self.store
            .get(keys::API_ERR_TIME)
            .and_then(|v| v.trim().parse::<i64>().ok())
    }

    /// Timestamp to send as `nocache` when the last failure is under a day old.
    /// Older markers are cleared; a failed clear is returned to the caller.
    pub fn cache_buster(&self, now: DateTime<Utc>) -> Result<Option<i64>, VistaError> {
        let Some(recorded) = self.recorded_at() else {
            return Ok(None);
        };
        if now.timestamp().saturating_sub(recorded) < ERROR_MARKER_TTL_SECS {
            return Ok(Some(recorded));
        }
        self.clear()?;
        Ok(None)
    }
}
