// Persisted user preferences for Huddle
// A single boolean: whether the notification sound cue is enabled

use anyhow::{anyhow, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Preferences {
    #[serde(rename = "isSoundEnabled", default = "default_sound_enabled")]
    pub sound_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            sound_enabled: default_sound_enabled(),
        }
    }
}

fn default_sound_enabled() -> bool {
    true
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("huddle");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn prefs_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("preferences.json"))
}

/// Read the preference file, falling back to defaults when it is absent.
/// Called once at startup; toggles write through `save_preferences`.
pub fn load_preferences() -> Result<Preferences> {
    load_preferences_from(&prefs_path()?)
}

pub fn load_preferences_from(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        return Ok(Preferences::default());
    }
    let contents = fs::read_to_string(path)?;
    let preferences: Preferences = serde_json::from_str(&contents)?;
    info!("Loaded preferences from {}", path.display());
    Ok(preferences)
}

pub fn save_preferences(preferences: &Preferences) -> Result<()> {
    save_preferences_to(preferences, &prefs_path()?)
}

pub fn save_preferences_to(preferences: &Preferences, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, preferences)?;
    info!("Preferences saved to {}", path.display());
    Ok(())
}
