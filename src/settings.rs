//! Persisted user preferences. The file holds the whole state and is
//! rewritten on every save.

use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub download_path: String,
}

impl Settings {
    pub fn with_platform_default() -> Self {
        Self {
            download_path: default_download_dir().to_string_lossy().into_owned(),
        }
    }
}

/// The user's Downloads folder, or the working directory as a last resort
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Never fails: a missing or unreadable file yields the platform default.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::with_platform_default();
        }
        match self.read() {
            Ok(settings) if !settings.download_path.trim().is_empty() => {
                log::info!("Loaded settings from {}", self.path.display());
                settings
            }
            Ok(_) => Settings::with_platform_default(),
            Err(e) => {
                log::error!("Error loading settings: {}", e);
                Settings::with_platform_default()
            }
        }
    }

    /// Errors are logged, not returned.
    pub fn save(&self, settings: &Settings) {
        if let Err(e) = self.write(settings) {
            log::error!("Error saving settings: {}", e);
        }
    }

    fn read(&self) -> Result<Settings, AppError> {
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| AppError::Settings(e.to_string()))
    }

    fn write(&self, settings: &Settings) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(settings).map_err(|e| AppError::Settings(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
