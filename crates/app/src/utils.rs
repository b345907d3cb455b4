//! Settings discovery and persistence for the Barchat app

use shared::settings::AppSettings;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
const SEED_SETTINGS_FILE: &str = "seed-settings.json";

/// Where the loaded settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    Config(PathBuf),
    Seed(PathBuf),
    Defaults,
}

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Barchat", "Barchat")
        .map(|proj| proj.config_dir().join(SETTINGS_FILE))
}

/// Directories that may hold a `seed-settings.json` bundled with the binary.
pub fn seed_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
            // On macOS app bundles, also check Contents/Resources
            if let Some(contents_dir) = exe_dir.parent() {
                dirs.push(contents_dir.join("Resources"));
            }
        }
    }
    dirs
}

fn try_load(path: &Path) -> Option<AppSettings> {
    if !path.exists() {
        return None;
    }
    match AppSettings::from_json_file(path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable settings file");
            None
        }
    }
}

/// Load settings: user config first, then a bundled seed file, then defaults.
///
/// A seed file that loads is copied to the config path so later runs use it.
pub fn load_settings(config: Option<&Path>, seeds: &[PathBuf]) -> (AppSettings, SettingsSource) {
    if let Some(path) = config {
        if let Some(settings) = try_load(path) {
            return (settings, SettingsSource::Config(path.to_path_buf()));
        }
    }

    for dir in seeds {
        let seed_path = dir.join(SEED_SETTINGS_FILE);
        if let Some(settings) = try_load(&seed_path) {
            if let Some(path) = config {
                save_settings(path, &settings);
            }
            return (settings, SettingsSource::Seed(seed_path));
        }
    }

    (AppSettings::default(), SettingsSource::Defaults)
}

pub fn load_settings_or_default() -> (AppSettings, SettingsSource) {
    load_settings(config_path().as_deref(), &seed_dirs())
}

/// Save settings to disk
pub fn save_settings(path: &Path, settings: &AppSettings) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(error = %e, dir = %parent.display(), "failed to create config dir");
            return;
        }
    }
    match serde_json::to_string_pretty(settings) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                tracing::warn!(error = %e, path = %path.display(), "failed to save settings");
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to serialize settings"),
    }
}
