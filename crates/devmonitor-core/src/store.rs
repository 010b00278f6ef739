use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::medium::StorageMedium;

/// Fixed application prefix; keeps collections clear of unrelated data in a
/// shared medium.
pub const STORAGE_PREFIX: &str = "devmonitor";

pub const USERS_KEY: &str = "users";
pub const DEVICES_KEY: &str = "devices";
pub const ACTIVITIES_KEY: &str = "activities";
pub const REPOSITORIES_KEY: &str = "repositories";
pub const ALERTS_KEY: &str = "alerts";
pub const SECURITY_SETTINGS_KEY: &str = "security_settings";
pub const DASHBOARD_KEY: &str = "dashboard";
pub const INITIALIZED_KEY: &str = "initialized";

pub const ALL_KEYS: [&str; 8] = [
    USERS_KEY,
    DEVICES_KEY,
    ACTIVITIES_KEY,
    REPOSITORIES_KEY,
    ALERTS_KEY,
    SECURITY_SETTINGS_KEY,
    DASHBOARD_KEY,
    INITIALIZED_KEY,
];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("write failed for {key}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize {key}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("security settings rejected: {0}")]
    InvalidSettings(String),
}

/// Generic get/set over named JSON documents in a durable medium.
pub struct DocumentStore<M> {
    medium: M,
}

impl<M: StorageMedium> DocumentStore<M> {
    pub fn new(medium: M) -> Self {
        Self { medium }
    }

    fn storage_key(name: &str) -> String {
        format!("{STORAGE_PREFIX}_{name}")
    }

    /// Read and parse one document. Malformed or unreadable content reads as
    /// absent so callers fall back to their default dataset.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = Self::storage_key(name);
        let raw = match self.medium.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %key, "storage read failed: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %key, "discarding malformed document: {err}");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let key = Self::storage_key(name);
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.clone(),
            source,
        })?;
        self.medium
            .write(&key, &json)
            .map_err(|source| StoreError::WriteFailed { key, source })
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let key = Self::storage_key(name);
        self.medium
            .remove(&key)
            .map_err(|source| StoreError::WriteFailed { key, source })
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = Self::storage_key(name);
        matches!(self.medium.read(&key), Ok(Some(_)))
    }
}
