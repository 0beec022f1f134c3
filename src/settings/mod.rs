//! The settings gate: a persisted `{enablePopup, enableDebug}` snapshot plus
//! the cached copy the controller reads. The cache is an explicit owned
//! context refreshed by push (`apply`) and pull (`reload`), never a
//! process-wide singleton.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = "stringlens";
const SETTINGS_FILE: &str = "config.json";

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing HOME environment variable and XDG_CONFIG_HOME is unset")]
    MissingHomeDirectory,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persisted flags. Field names mirror the payload the settings-editing
/// surface broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enable_popup: bool,
    pub enable_debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_popup: true,
            enable_debug: false,
        }
    }
}

/// Cross-context broadcast from the settings-editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SettingsMessage {
    #[serde(rename = "SETTINGS_UPDATED")]
    SettingsUpdated { settings: Settings },
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub const fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_default_path() -> SettingsResult<Self> {
        let (xdg_config_home, home) = config_env_dirs();
        let path = settings_path(xdg_config_home.as_deref(), home.as_deref())?;
        Ok(Self::with_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is not an error; it means defaults.
    pub fn load(&self) -> SettingsResult<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn load_or_default(&self) -> Settings {
        self.load().unwrap_or_else(|err| {
            tracing::warn!(
                ?err,
                path = %self.path.display(),
                "failed to load settings; using defaults"
            );
            Settings::default()
        })
    }

    pub fn save(&self, settings: &Settings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// The controller's read-only cached snapshot.
#[derive(Debug, Clone, Default)]
pub struct SettingsContext {
    current: Settings,
}

impl SettingsContext {
    pub const fn new(current: Settings) -> Self {
        Self { current }
    }

    pub fn current(&self) -> Settings {
        self.current
    }

    /// Push refresh from a change notification.
    pub fn apply(&mut self, settings: Settings) {
        self.current = settings;
    }

    /// Pull refresh. A failed load keeps the cached snapshot; the condition
    /// is reported only when debug mode is already known to be on.
    pub fn reload(&mut self, store: &SettingsStore) {
        match store.load() {
            Ok(settings) => self.current = settings,
            Err(err) => {
                if self.current.enable_debug {
                    tracing::warn!(?err, "settings reload failed; keeping cached snapshot");
                }
            }
        }
    }
}

fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn settings_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> SettingsResult<PathBuf> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(APP_DIR);
    path.push(SETTINGS_FILE);
    Ok(path)
}

fn config_root(xdg_config_home: Option<&Path>, home: Option<&Path>) -> SettingsResult<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(SettingsError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
