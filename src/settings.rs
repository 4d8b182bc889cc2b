//! Player preferences, persisted apart from the leaderboard

use serde::{Deserialize, Serialize};

use crate::consts::LEVEL_COUNT;
use crate::persistence;
use crate::tuning::Tunables;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 0.0 - 1.0
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,

    /// Show the welcome sequence before the first level
    pub intro: bool,
    /// Number of levels in the progression
    pub level_count: usize,
    /// Fixed level seed; random per session when unset
    pub seed: Option<u64>,

    /// Last camera and car tunables
    pub tunables: Tunables,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            intro: true,
            level_count: LEVEL_COUNT,
            seed: None,
            tunables: Tunables::default(),
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "spectre_settings";

    /// Level count clamped to something playable
    pub fn effective_level_count(&self) -> usize {
        self.level_count.clamp(1, LEVEL_COUNT)
    }

    /// Stored settings; defaults when missing or unreadable
    pub fn load() -> Self {
        match persistence::read_json(Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored settings: {}", e);
                Self::default()
            }
        }
    }

    /// Best effort: a failed write is only logged
    pub fn save(&self) {
        match persistence::write_json(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Cannot save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"muted": true, "level_count": 3}"#)
            .expect("json");
        assert!(settings.muted);
        assert_eq!(settings.level_count, 3);
        assert!(settings.intro);
        assert_eq!(settings.tunables, Tunables::default());
    }

    #[test]
    fn test_native_load_falls_back_to_defaults() {
        assert_eq!(Settings::load(), Settings::default());
        Settings::default().save();
    }

    #[test]
    fn test_level_count_clamped() {
        let settings = Settings {
            level_count: 0,
            ..Settings::default()
        };
        assert_eq!(settings.effective_level_count(), 1);
        let settings = Settings {
            level_count: 10_000,
            ..Settings::default()
        };
        assert_eq!(settings.effective_level_count(), LEVEL_COUNT);
    }
}
