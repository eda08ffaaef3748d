// src/config.rs
//
// Runtime configuration
//
// Loaded from an optional JSON file, then overridden by INKORA_*
// environment variables. Missing values fall back to a local backend
// under the platform data directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const ENV_BACKEND_URL: &str = "INKORA_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "INKORA_ANON_KEY";
pub const ENV_ACCESS_TOKEN: &str = "INKORA_ACCESS_TOKEN";
pub const ENV_DATABASE_PATH: &str = "INKORA_DATABASE_PATH";
pub const ENV_STORAGE_ROOT: &str = "INKORA_STORAGE_ROOT";

/// Which store backs the repositories, storage and auth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// SQLite database plus a filesystem object store
    Local {
        database_path: PathBuf,
        storage_root: PathBuf,
    },
    /// REST data/auth/storage service
    Hosted {
        url: String,
        anon_key: String,
        #[serde(default)]
        access_token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Comment page size on the story page
    pub story_comments_per_page: usize,
    /// Comment page size on the chapter page
    pub chapter_comments_per_page: usize,
    /// Attempts per step when deleting a story's dependents
    pub delete_max_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let root = default_data_dir();
        Self {
            backend: BackendConfig::Local {
                database_path: root.join("inkora.db"),
                storage_root: root.join("storage"),
            },
            story_comments_per_page: 5,
            chapter_comments_per_page: 10,
            delete_max_attempts: 3,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("inkora")
}

impl AppConfig {
    /// Defaults plus process environment
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(&std::env::vars().collect())?;
        config.validate()?;
        Ok(config)
    }

    /// JSON file (if it exists) plus process environment
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(&std::env::vars().collect())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply INKORA_* overrides from `vars`.
    ///
    /// A backend URL switches to the hosted backend; it then also needs an
    /// anon key from the file or `vars`.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> AppResult<()> {
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        if let Some(url) = get(ENV_BACKEND_URL) {
            let (anon_key, access_token) = match &self.backend {
                BackendConfig::Hosted { anon_key, access_token, .. } => {
                    (anon_key.clone(), access_token.clone())
                }
                BackendConfig::Local { .. } => (String::new(), None),
            };
            self.backend = BackendConfig::Hosted { url, anon_key, access_token };
        }

        match &mut self.backend {
            BackendConfig::Hosted { anon_key, access_token, .. } => {
                if let Some(key) = get(ENV_ANON_KEY) {
                    *anon_key = key;
                }
                if let Some(token) = get(ENV_ACCESS_TOKEN) {
                    *access_token = Some(token);
                }
            }
            BackendConfig::Local { database_path, storage_root } => {
                if let Some(path) = get(ENV_DATABASE_PATH) {
                    *database_path = PathBuf::from(path);
                }
                if let Some(path) = get(ENV_STORAGE_ROOT) {
                    *storage_root = PathBuf::from(path);
                }
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.story_comments_per_page == 0 || self.chapter_comments_per_page == 0 {
            return Err(AppError::invalid("comment page size must be at least 1"));
        }
        if self.delete_max_attempts == 0 {
            return Err(AppError::invalid("delete_max_attempts must be at least 1"));
        }
        if let BackendConfig::Hosted { url, anon_key, .. } = &self.backend {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::invalid(format!("backend url is not http(s): {}", url)));
            }
            if anon_key.trim().is_empty() {
                return Err(AppError::invalid("hosted backend requires an anon key"));
            }
        }
        Ok(())
    }
}
