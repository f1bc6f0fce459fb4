use crate::app_dirs::AppDirs;
use crate::session::SessionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// How a test decides it is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestMode {
    /// End after the configured number of words has been typed.
    Words,
    /// End when the time limit runs out.
    Time,
}

impl FromStr for TestMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "words" => Ok(TestMode::Words),
            "time" => Ok(TestMode::Time),
            _ => Err(ConfigError::InvalidValue {
                key: "mode".into(),
                value: s.into(),
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown setting `{0}`")]
    UnknownKey(String),

    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub user_name: String,
    pub mode: TestMode,
    pub word_count: usize,
    pub time_limit_secs: u64,
    pub log_level: String,
    pub sentences_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: "Unknown".to_string(),
            mode: TestMode::Words,
            word_count: 10,
            time_limit_secs: 60,
            log_level: "info".to_string(),
            sentences_file: None,
        }
    }
}

impl Config {
    /// Update one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "user_name" => self.user_name = value.to_string(),
            "mode" => self.mode = value.parse()?,
            "word_count" => self.word_count = value.parse().map_err(|_| invalid())?,
            "time_limit_secs" => {
                let secs: u64 = value.parse().map_err(|_| invalid())?;
                if secs == 0 {
                    return Err(invalid());
                }
                self.time_limit_secs = secs;
            }
            "log_level" => self.log_level = value.to_string(),
            "sentences_file" => {
                self.sentences_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            user_name: self.user_name.clone(),
            mode: self.mode,
            word_count: self.word_count,
            time_limit: Duration::from_secs(self.time_limit_secs),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("accutype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
