// Expandrs Settings Module
// User-configurable toggles for trigger keys and undo

use std::path::{Path, PathBuf};

use crate::engine::TriggerKey;

/// Feature toggles read by the orchestrator on every keystroke.
///
/// Loaded from a TOML file (default: ~/.config/expandrs/settings.toml).
/// All triggers and undo default to enabled.
#[derive(Debug, Clone)]
pub struct Settings {
    trigger_space: bool,
    trigger_tab: bool,
    trigger_enter: bool,
    undo_enabled: bool,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trigger_space: true,
            trigger_tab: true,
            trigger_enter: true,
            undo_enabled: true,
            source_path: None,
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("no source path set")]
    NoSourcePath,
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    triggers: Option<TriggerSettings>,

    #[serde(default)]
    undo: Option<UndoSettings>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct TriggerSettings {
    #[serde(default)]
    space: Option<bool>,

    #[serde(default)]
    tab: Option<bool>,

    #[serde(default)]
    enter: Option<bool>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct UndoSettings {
    #[serde(default)]
    enabled: Option<bool>,
}

impl Settings {
    /// Create settings with all toggles enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();
        if let Some(triggers) = parsed.triggers {
            if let Some(space) = triggers.space {
                settings.trigger_space = space;
            }
            if let Some(tab) = triggers.tab {
                settings.trigger_tab = tab;
            }
            if let Some(enter) = triggers.enter {
                settings.trigger_enter = enter;
            }
        }
        if let Some(undo) = parsed.undo {
            if let Some(enabled) = undo.enabled {
                settings.undo_enabled = enabled;
            }
        }
        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("expandrs").join("settings.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file doesn't exist.
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// True when the given trigger key is enabled.
    pub fn trigger_enabled(&self, trigger: TriggerKey) -> bool {
        match trigger {
            TriggerKey::Space => self.trigger_space,
            TriggerKey::Tab => self.trigger_tab,
            TriggerKey::Enter => self.trigger_enter,
        }
    }

    pub fn set_trigger_enabled(&mut self, trigger: TriggerKey, enabled: bool) {
        match trigger {
            TriggerKey::Space => self.trigger_space = enabled,
            TriggerKey::Tab => self.trigger_tab = enabled,
            TriggerKey::Enter => self.trigger_enter = enabled,
        }
    }

    /// True when backspace-undo of the last expansion is enabled.
    pub fn undo_enabled(&self) -> bool {
        self.undo_enabled
    }

    pub fn set_undo_enabled(&mut self, enabled: bool) {
        self.undo_enabled = enabled;
    }

    /// Reload settings from the original file
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        match self.source_path.clone() {
            Some(path) => {
                *self = Self::from_file(path)?;
                Ok(())
            }
            None => Err(SettingsError::NoSourcePath),
        }
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Expandrs Settings
# Place this file at: ~/.config/expandrs/settings.toml

[triggers]
# Keys that fire abbreviation expansion
space = true
tab = true
enter = true

[undo]
# Backspace right after an expansion restores the typed abbreviation
enabled = true
"#
}
