use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GitHubSettings;
use crate::launch::LaunchParams;

/// Storage key holding the serialized repository configuration.
pub const CONFIG_STORAGE_KEY: &str = "devnexus_github_config";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access storage file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string key/value store, the local analogue of browser storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Storage backed by a single JSON object on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "storage file is corrupt, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// In-process storage, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Credential and target repository for the issue tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Bearer token; may be empty, in which case only public reads are attempted.
    #[serde(rename = "token", default)]
    pub credential: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
}

impl RepoConfig {
    /// Trimmed owner and repo, if both are non-empty.
    pub fn repository(&self) -> Option<(&str, &str)> {
        let owner = self.owner.trim();
        let repo = self.repo.trim();
        if owner.is_empty() || repo.is_empty() {
            None
        } else {
            Some((owner, repo))
        }
    }

    /// Trimmed credential, if non-empty.
    pub fn credential(&self) -> Option<&str> {
        Some(self.credential.trim()).filter(|c| !c.is_empty())
    }
}

/// Persisted shape: every field optional so a partial record merges over defaults.
#[derive(Debug, Default, Deserialize)]
struct StoredConfig {
    token: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
}

/// Loads and saves the [`RepoConfig`] through an injected [`Storage`].
pub struct ConfigStore<'a> {
    storage: &'a dyn Storage,
    defaults: RepoConfig,
}

impl<'a> ConfigStore<'a> {
    pub fn new(storage: &'a dyn Storage, github: &GitHubSettings) -> Self {
        Self {
            storage,
            defaults: RepoConfig {
                credential: String::new(),
                owner: github.default_owner.clone(),
                repo: github.default_repo.clone(),
            },
        }
    }

    /// Merge hardcoded defaults, persisted storage, then launch overrides.
    ///
    /// Unreadable or malformed persisted data is logged and treated as absent.
    pub fn load(&self, launch: Option<&LaunchParams>) -> RepoConfig {
        let mut config = self.defaults.clone();

        match self.storage.get(CONFIG_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<StoredConfig>(&raw) {
                Ok(stored) => {
                    if let Some(token) = stored.token {
                        config.credential = token;
                    }
                    if let Some(owner) = stored.owner {
                        config.owner = owner;
                    }
                    if let Some(repo) = stored.repo {
                        config.repo = repo;
                    }
                    debug!(owner = %config.owner, repo = %config.repo, "loaded persisted configuration");
                }
                Err(err) => warn!(error = %err, "failed to parse saved configuration, using defaults"),
            },
            Ok(None) => debug!("no persisted configuration, using defaults"),
            Err(err) => warn!(error = %err, "failed to read saved configuration, using defaults"),
        }

        if let Some(params) = launch {
            if let (Some(owner), Some(repo)) = (&params.owner, &params.repo) {
                config.owner = owner.clone();
                config.repo = repo.clone();
                if let Some(token) = &params.token {
                    config.credential = token.clone();
                }
                debug!(owner = %config.owner, repo = %config.repo, "applied launch overrides");
            }
        }

        config
    }

    /// Serialize and persist the configuration.
    pub fn save(&self, config: &RepoConfig) -> Result<(), StorageError> {
        let raw = serde_json::to_string(config)?;
        self.storage.set(CONFIG_STORAGE_KEY, &raw)
    }
}
