//! Game settings and preferences
//!
//! Persisted separately from progression as a small JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Play mode; each carries its own spawn pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    #[default]
    Solo,
    Coop,
    Versus,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Solo => "Solo",
            GameMode::Coop => "Coop",
            GameMode::Versus => "Versus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "solo" | "single" => Some(GameMode::Solo),
            "coop" | "co-op" => Some(GameMode::Coop),
            "versus" | "vs" | "pvp" => Some(GameMode::Versus),
            _ => None,
        }
    }

    /// Spawn-rate multiplier (higher spawns faster)
    pub fn spawn_rate(&self) -> f32 {
        match self {
            GameMode::Solo => 1.0,
            GameMode::Coop => 1.5,
            GameMode::Versus => 1.25,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: GameMode,

    // === Difficulty ===
    /// Global multiplier on damage the player deals
    pub damage_dealt_scalar: f32,
    /// Global multiplier on damage the player takes
    pub damage_taken_scalar: f32,
    /// Multiplier on dropped XP orbs and currency
    pub loot_multiplier: f32,

    // === Multiplayer ===
    /// Snapshots published per second
    pub snapshot_rate: f32,

    /// Character picked for new runs
    pub character: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Solo,

            // Easy-mode scalars
            damage_dealt_scalar: 4.0,
            damage_taken_scalar: 0.25,
            loot_multiplier: 1.0,

            snapshot_rate: 10.0,

            character: "ranger".into(),
        }
    }
}

impl Settings {
    pub fn for_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Load settings, falling back to defaults on a missing or corrupt file
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::info!("Using default settings ({err})");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        for mode in [GameMode::Solo, GameMode::Coop, GameMode::Versus] {
            assert_eq!(GameMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(GameMode::from_str("PVP"), Some(GameMode::Versus));
        assert_eq!(GameMode::from_str("raid"), None);
    }

    #[test]
    fn test_default_scalars() {
        let s = Settings::default();
        assert_eq!(s.damage_dealt_scalar, 4.0);
        assert_eq!(s.damage_taken_scalar, 0.25);
        assert!(GameMode::Coop.spawn_rate() > GameMode::Solo.spawn_rate());
    }

    #[test]
    fn test_load_save_and_fallback() {
        let dir = std::env::temp_dir().join(format!("emberfall-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        let mut s = Settings::for_mode(GameMode::Coop);
        s.damage_dealt_scalar = 1.0;
        s.save(&path).unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded.mode, GameMode::Coop);
        assert_eq!(loaded.damage_dealt_scalar, 1.0);

        // Partial files keep defaults for missing fields
        std::fs::write(&path, r#"{ "mode": "Versus" }"#).unwrap();
        let partial = Settings::load(&path);
        assert_eq!(partial.mode, GameMode::Versus);
        assert_eq!(partial.damage_taken_scalar, 0.25);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load(&path).mode, GameMode::Solo);
        assert!(Settings::try_load(&dir.join("missing.json")).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
