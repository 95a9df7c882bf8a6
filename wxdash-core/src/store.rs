//! Persistent user preferences: the saved-city list and the unit choice.
//!
//! One JSON file in the platform data directory, read whole and written
//! whole. No schema versioning, no migration.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::{Place, UnitSystem};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub units: UnitSystem,
    /// Newest-first list of saved cities.
    #[serde(default)]
    pub saved_cities: Vec<Place>,
}

impl Preferences {
    /// Load preferences from disk, or return defaults if none were saved yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::store_file_path()?)
    }

    /// Save preferences to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::store_file_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;

        let prefs: Preferences = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences file: {}", path.display()))?;

        Ok(prefs)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize preferences to JSON")?;

        fs::write(path, json)
            .with_context(|| format!("Failed to write preferences file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the preferences file.
    pub fn store_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxdash", "wxdash")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("preferences.json"))
    }

    pub fn is_saved(&self, place: &Place) -> bool {
        self.saved_cities.iter().any(|city| city.same_spot(place))
    }

    /// Prepend a city to the list. Returns `false` if the same coordinates
    /// are already saved, leaving the list untouched.
    pub fn save_city(&mut self, place: Place) -> bool {
        if self.is_saved(&place) {
            return false;
        }

        self.saved_cities.insert(0, place);
        true
    }

    /// Drop every saved city at the given coordinates. Returns `false` when
    /// nothing matched.
    pub fn remove_city(&mut self, lat: f64, lon: f64) -> bool {
        let before = self.saved_cities.len();
        self.saved_cities.retain(|city| city.lat != lat || city.lon != lon);
        self.saved_cities.len() != before
    }

    /// Find a saved city by name, case-insensitively.
    pub fn find_city(&self, name: &str) -> Option<&Place> {
        self.saved_cities.iter().find(|city| city.name.eq_ignore_ascii_case(name))
    }
}
