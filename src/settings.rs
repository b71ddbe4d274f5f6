//! Skill configuration and persisted user settings.
//!
//! [`SkillConfig`] is read once at startup from TOML. [`Settings`] are the
//! user-facing switches that change at runtime; [`SettingsStore`] owns them,
//! writes them back to disk and notifies a registered callback on change.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::brightness::BrightnessTable;
use crate::color::ColorTable;
use crate::solar::Location;
use crate::{Error, Result};

/// Language with built-in color and brightness tables
pub const BUILTIN_LANG: &str = "en-us";

/// User settings, mirrored from the web settings page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Follow the sun with brightness
    pub auto_brightness: bool,
    /// Droop and dim the eyes when idle
    pub auto_dim_eyes: bool,
    /// Beep when the assistant starts listening
    pub use_listening_beep: bool,
    /// Eye color chosen on the web settings page
    pub eye_color: String,
    /// Eye color currently shown, as a descriptor
    pub current_eye_color: String,
    /// Web eye color last applied, so repeated syncs do not override local changes
    pub web_eye_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_brightness: false,
            auto_dim_eyes: true,
            use_listening_beep: true,
            eye_color: "default".to_string(),
            current_eye_color: "default".to_string(),
            web_eye_color: "default".to_string(),
        }
    }
}

type ChangeCallback = Arc<dyn Fn(&Settings) + Send + Sync>;

/// Owner of the live [`Settings`]
///
/// The callback runs after the store's lock is released, so it may read the
/// settings or change them again.
pub struct SettingsStore {
    settings: Mutex<Settings>,
    path: Option<PathBuf>,
    on_change: Mutex<Option<ChangeCallback>>,
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &*self.settings.lock())
            .field("path", &self.path)
            .field("on_change", &self.on_change.lock().is_some())
            .finish()
    }
}

impl SettingsStore {
    /// In-memory store
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            path: None,
            on_change: Mutex::new(None),
        }
    }

    /// Store backed by `path`. Existing file contents win over `defaults`.
    #[instrument(skip(defaults))]
    pub fn open(path: &Path, defaults: Settings) -> Result<Self> {
        let settings = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            let settings: Settings = toml::from_str(&text)?;
            debug!("Loaded settings from {}", path.display());
            settings
        } else {
            debug!("No settings at {}, using defaults", path.display());
            defaults
        };
        Ok(Self {
            settings: Mutex::new(settings),
            path: Some(path.to_path_buf()),
            on_change: Mutex::new(None),
        })
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> Settings {
        self.settings.lock().clone()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Registers the callback run after every change
    pub fn set_on_change(&self, callback: impl Fn(&Settings) + Send + Sync + 'static) {
        *self.on_change.lock() = Some(Arc::new(callback));
    }

    /// Applies `change`. Persists and notifies only when something changed.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<bool> {
        let changed = {
            let mut settings = self.settings.lock();
            let mut next = settings.clone();
            change(&mut next);
            self.commit(&mut settings, next)?
        };
        self.notify(changed)
    }

    /// Swaps in a whole new settings value, e.g. after a remote pull
    pub fn replace(&self, next: Settings) -> Result<bool> {
        let changed = {
            let mut settings = self.settings.lock();
            self.commit(&mut settings, next)?
        };
        self.notify(changed)
    }

    /// Writes `next` and only then makes it current
    fn commit(&self, current: &mut Settings, next: Settings) -> Result<Option<Settings>> {
        if next == *current {
            return Ok(None);
        }
        self.write(&next)?;
        *current = next;
        Ok(Some(current.clone()))
    }

    fn notify(&self, changed: Option<Settings>) -> Result<bool> {
        let Some(settings) = changed else {
            return Ok(false);
        };
        let callback = self.on_change.lock().clone();
        if let Some(callback) = callback {
            callback(&settings);
        }
        Ok(true)
    }

    /// Writes the settings to the backing file, if any
    pub fn save(&self) -> Result<()> {
        let settings = self.get();
        self.write(&settings)
    }

    fn write(&self, settings: &Settings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let text = toml::to_string_pretty(settings)?;
        std::fs::write(path, text).map_err(|e| Error::io(path, e))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

/// Startup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    /// Language of the color and brightness vocabularies
    pub lang: String,
    /// Directory holding `<lang>/colors.value` and `<lang>/brightness.levels.value`
    pub locale_dir: Option<PathBuf>,
    /// Where the faceplate is, for auto brightness
    pub location: Location,
    /// Initial settings
    pub settings: Settings,
    /// File the settings are persisted to
    pub settings_path: Option<PathBuf>,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            lang: BUILTIN_LANG.to_string(),
            locale_dir: None,
            location: Location::default(),
            settings: Settings::default(),
            settings_path: None,
        }
    }
}

impl SkillConfig {
    /// Reads a TOML config file
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Color vocabulary for the configured language
    pub fn color_table(&self) -> Result<ColorTable> {
        match &self.locale_dir {
            Some(dir) => ColorTable::load(dir, &self.lang),
            None if self.lang == BUILTIN_LANG => Ok(ColorTable::builtin()),
            None => Err(self.missing_locale()),
        }
    }

    /// Brightness words for the configured language
    pub fn brightness_table(&self) -> Result<BrightnessTable> {
        match &self.locale_dir {
            Some(dir) => BrightnessTable::load(dir, &self.lang),
            None if self.lang == BUILTIN_LANG => Ok(BrightnessTable::builtin()),
            None => Err(self.missing_locale()),
        }
    }

    /// Settings store, file backed when `settings_path` is set
    pub fn settings_store(&self) -> Result<SettingsStore> {
        match &self.settings_path {
            Some(path) => SettingsStore::open(path, self.settings.clone()),
            None => Ok(SettingsStore::new(self.settings.clone())),
        }
    }

    fn missing_locale(&self) -> Error {
        Error::Configuration(format!(
            "no built-in vocabulary for {:?}; set locale_dir",
            self.lang
        ))
    }
}
