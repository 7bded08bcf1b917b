use crate::error::ConfigError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key holding the generation provider settings
pub const API_CONFIG_KEY: &str = "rsa_builder_api_config";

/// Provider used when nothing is stored
pub const DEFAULT_PROVIDER: &str = "gemini-2.5-flash";

/// Selected generation provider and its credential
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct ApiConfig {
    pub provider: String,
    pub key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            provider: DEFAULT_PROVIDER.to_string(),
            key: String::new(),
        }
    }
}

impl ApiConfig {
    /// Generation is possible once both provider and key are set
    pub fn is_connected(&self) -> bool {
        !self.provider.is_empty() && !self.key.is_empty()
    }
}

/// Simple string key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
    fn remove(&self, key: &str) -> Result<(), ConfigError>;
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        FileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        debug!("Saved {} to {}", key, self.dir.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

#[derive(Deserialize)]
struct StoredConfig {
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Load the stored provider settings.
///
/// A missing or unreadable entry yields the default config; empty fields fall
/// back individually.
pub fn load_api_config(store: &dyn KeyValueStore) -> ApiConfig {
    let raw = match store.get(API_CONFIG_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ApiConfig::default(),
        Err(e) => {
            warn!("Failed to load saved API config: {}", e);
            return ApiConfig::default();
        }
    };

    match serde_json::from_str::<StoredConfig>(&raw) {
        Ok(stored) => {
            let default = ApiConfig::default();
            ApiConfig {
                provider: stored
                    .provider
                    .filter(|p| !p.is_empty())
                    .unwrap_or(default.provider),
                key: stored.key.filter(|k| !k.is_empty()).unwrap_or(default.key),
            }
        }
        Err(e) => {
            warn!("Failed to load saved API config: {}", e);
            ApiConfig::default()
        }
    }
}

pub fn save_api_config(store: &dyn KeyValueStore, config: &ApiConfig) -> Result<(), ConfigError> {
    store.set(API_CONFIG_KEY, &serde_json::to_string(config)?)
}

pub fn clear_api_config(store: &dyn KeyValueStore) -> Result<(), ConfigError> {
    store.remove(API_CONFIG_KEY)
}
