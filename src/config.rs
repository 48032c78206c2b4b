use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = ".devnexus.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level settings loaded from .devnexus.toml.
///
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// GitHub endpoint and default repository
    #[serde(default)]
    pub github: GitHubSettings,

    /// Generative AI endpoint settings
    #[serde(default)]
    pub ai: AiSettings,

    /// Where the persisted repository configuration lives
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSettings {
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    /// Owner used when nothing has been saved yet.
    #[serde(default = "default_owner")]
    pub default_owner: String,
    #[serde(default = "default_repo")]
    pub default_repo: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            default_owner: default_owner(),
            default_repo: default_repo(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    /// API key for the AI service. If None, falls back to GEMINI_API_KEY, then API_KEY.
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_api_base")]
    pub api_base: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            api_base: default_ai_api_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "facebook".to_string()
}

fn default_repo() -> String {
    "react".to_string()
}

fn default_ai_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".devnexus/storage.json")
}

impl Settings {
    /// Load settings from the given path, or .devnexus.toml in the current
    /// directory. Returns defaults if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Settings::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Resolve the AI key: settings file value takes precedence, then
    /// GEMINI_API_KEY, then API_KEY. Blank values count as absent.
    pub fn ai_api_key(&self) -> Option<String> {
        resolve_ai_key(self.ai.api_key.clone(), |name| std::env::var(name).ok())
    }
}

fn resolve_ai_key(file_key: Option<String>, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    let present = |key: &String| !key.trim().is_empty();
    file_key
        .filter(present)
        .or_else(|| env("GEMINI_API_KEY").filter(present))
        .or_else(|| env("API_KEY").filter(present))
}
