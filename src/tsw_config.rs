// Startup settings: presentation, reset key and label policy
// Loaded once from an optional TOML file; the file is never written back

use directories::ProjectDirs;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::tsw_board::Geometry;
use crate::tsw_color::PaletteConfig;
use crate::tsw_grid::{GRID_SIZE, LabelPolicy};

/// User settings
/// Every key is optional; missing keys keep the reference values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,           // Terminal window title
    pub message: Option<String>, // Game-over overlay text; derived from reset_key if unset
    pub reset_key: char,         // Key that starts a new board
    pub label_policy: LabelPolicy,
    pub geometry: Geometry,
    pub palette: PaletteConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            title: "Minesweeper".to_string(),
            message: None,
            reset_key: ' ',
            label_policy: LabelPolicy::Constant,
            geometry: Geometry::default(),
            palette: PaletteConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(s: &str) -> Result<Settings, toml::de::Error> {
        toml::from_str(s)
    }

    /// Text drawn over the board once a mine is hit
    pub fn overlay_message(&self) -> String {
        match &self.message {
            Some(m) => m.clone(),
            None => {
                let key = match self.reset_key {
                    ' ' => "SPACE".to_string(),
                    c => c.to_uppercase().to_string(),
                };
                format!("Game Over! Press {} to reset", key)
            }
        }
    }
}

/// Get the settings file path
/// Uses the platform config directory (e.g., ~/.config/tinysweep/tinysweep.toml on Linux)
pub fn config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem().and_then(|s| s.to_str())?.to_string();
    match ProjectDirs::from("com", "xhbl", &name) {
        Some(proj) => {
            let mut path = proj.config_dir().to_path_buf();
            path.push(format!("{}.toml", name));
            Some(path)
        }
        None => {
            // fallback to current directory
            let mut path = env::current_dir().ok()?;
            path.push(format!("{}.toml", name));
            Some(path)
        }
    }
}

/// Read settings from `path`, falling back to defaults when absent or invalid
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match fs::read_to_string(path) {
        Ok(s) => match Settings::from_toml(&s) {
            Ok(mut settings) => {
                info!(path = %path.display(), "settings loaded");
                if settings.geometry.surface_size(GRID_SIZE).is_none() {
                    warn!(path = %path.display(), geometry = ?settings.geometry, "board geometry too large, using defaults");
                    settings.geometry = Geometry::default();
                }
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Settings::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read settings file, using defaults");
            Settings::default()
        }
    }
}

/// Load settings from the per-user config directory
pub fn load_settings() -> Settings {
    match config_path() {
        Some(path) => load_settings_from(&path),
        None => Settings::default(),
    }
}
