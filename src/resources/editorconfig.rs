//! Editor configuration resource.
//!
//! Settings loaded from an INI configuration file. Provides defaults for a
//! safe start and methods to load/save the configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [paths]
//! sheets_dir = sheets
//! zones_dir = zones
//!
//! [zone]
//! width = 40
//! height = 30
//! name = Unnamed
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::resources::zone::{DEFAULT_HEIGHT, DEFAULT_NAME, DEFAULT_WIDTH};

const DEFAULT_SHEETS_DIR: &str = "sheets";
const DEFAULT_ZONES_DIR: &str = "zones";
pub const DEFAULT_CONFIG_PATH: &str = "./deepzone.ini";

/// Editor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Directory scanned for sheet atlases.
    pub sheets_dir: PathBuf,
    /// Directory holding `.zone` files.
    pub zones_dir: PathBuf,
    /// Width in tiles of new zones.
    pub zone_width: usize,
    /// Height in tiles of new zones.
    pub zone_height: usize,
    /// Name given to new zones.
    pub zone_name: String,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            sheets_dir: PathBuf::from(DEFAULT_SHEETS_DIR),
            zones_dir: PathBuf::from(DEFAULT_ZONES_DIR),
            zone_width: DEFAULT_WIDTH,
            zone_height: DEFAULT_HEIGHT,
            zone_name: DEFAULT_NAME.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|reason| ConfigError::Load {
            path: self.config_path.clone(),
            reason,
        })?;

        // [paths] section
        if let Some(dir) = config.get("paths", "sheets_dir") {
            self.sheets_dir = PathBuf::from(dir);
        }
        if let Some(dir) = config.get("paths", "zones_dir") {
            self.zones_dir = PathBuf::from(dir);
        }

        // [zone] section
        if let Some(width) = config.getuint("zone", "width").ok().flatten() {
            self.zone_width = (width as usize).max(1);
        }
        if let Some(height) = config.getuint("zone", "height").ok().flatten() {
            self.zone_height = (height as usize).max(1);
        }
        if let Some(name) = config.get("zone", "name") {
            if !name.trim().is_empty() {
                self.zone_name = name.trim().to_string();
            }
        }

        info!(
            "Loaded config: sheets={:?}, zones={:?}, new zone '{}' {}x{}",
            self.sheets_dir, self.zones_dir, self.zone_name, self.zone_width, self.zone_height
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        // [paths] section
        config.set(
            "paths",
            "sheets_dir",
            Some(self.sheets_dir.to_string_lossy().into_owned()),
        );
        config.set(
            "paths",
            "zones_dir",
            Some(self.zones_dir.to_string_lossy().into_owned()),
        );

        // [zone] section
        config.set("zone", "width", Some(self.zone_width.to_string()));
        config.set("zone", "height", Some(self.zone_height.to_string()));
        config.set("zone", "name", Some(self.zone_name.clone()));

        config
            .write(&self.config_path)
            .map_err(|source| ConfigError::Save {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Size of new zones in tiles.
    pub fn zone_size(&self) -> (usize, usize) {
        (self.zone_width, self.zone_height)
    }
}
