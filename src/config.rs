use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::services::{ClientSettings, POCKET_API_URL};
use crate::store::{StoreSettings, ARCHIVED_FILE, LAST_SYNC_FILE, UNREAD_FILE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub consumer_key: String,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    pub access_token: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_unread_file")]
    pub unread_file: String,

    #[serde(default = "default_archived_file")]
    pub archived_file: String,

    #[serde(default = "default_last_sync_file")]
    pub last_sync_file: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_redirect_uri() -> String {
    "pocketmirror:authorizationFinished".to_string()
}

fn default_api_base_url() -> String {
    POCKET_API_URL.to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pocket-mirror")
}

fn default_unread_file() -> String {
    UNREAD_FILE.to_string()
}

fn default_archived_file() -> String {
    ARCHIVED_FILE.to_string()
}

fn default_last_sync_file() -> String {
    LAST_SYNC_FILE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            redirect_uri: default_redirect_uri(),
            access_token: None,
            api_base_url: default_api_base_url(),
            data_dir: default_data_dir(),
            unread_file: default_unread_file(),
            archived_file: default_archived_file(),
            last_sync_file: default_last_sync_file(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    /// Reads the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pocket-mirror")
            .join("config.toml")
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            data_dir: self.data_dir.clone(),
            unread_file: self.unread_file.clone(),
            archived_file: self.archived_file.clone(),
            last_sync_file: self.last_sync_file.clone(),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.clone(),
            consumer_key: self.consumer_key.clone(),
            access_token: self.access_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn require_consumer_key(&self) -> Result<&str> {
        if self.consumer_key.trim().is_empty() {
            return Err(AppError::Config(
                "consumer_key is not set, add it to the config file".to_string(),
            ));
        }
        Ok(&self.consumer_key)
    }
}
