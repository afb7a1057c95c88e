use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::{self, APP_DIR_NAME};

pub const CONFIG_FILE: &str = "config.json";

fn default_data_dir() -> PathBuf {
    storage::default_data_dir().to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE)
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Follow the desktop's light/dark setting.
    #[default]
    System,
    Light,
    Dark,
}

impl ThemePreference {
    /// Whether to render dark, given what the desktop currently reports.
    pub fn resolve(&self, system_is_dark: bool) -> bool {
        match self {
            Self::System => system_is_dark,
            Self::Light => false,
            Self::Dark => true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    pub fn toggled(&self) -> Self {
        match self {
            Self::En => Self::Ko,
            Self::Ko => Self::En,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    pub debug_logging: bool,
    pub theme: ThemePreference,
    pub language: Language,
    /// Key for the AI import analyzer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            debug_logging: false,
            theme: ThemePreference::default(),
            language: Language::default(),
            api_key: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Read the config file, falling back to defaults when it is missing or broken.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed config {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&default_config_path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        storage::write_atomic(path, json.as_bytes())
    }

    pub fn set_api_key(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        self.api_key = Some(key.to_string());
        true
    }

    pub fn storage(&self) -> storage::Storage {
        storage::Storage::new(&self.data_directory)
    }
}
