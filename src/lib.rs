//! Spectre - an arcade 3D driving game
//!
//! Core modules:
//! - `sim`: Level generation, interception detection, entities and the game state machine
//! - `ui`: HUD state machine and the text effect sequencer
//! - `platform`: Collaborator seams (input, scene graph, HUD display)
//! - `persistence`: Leaderboard storage backends
//! - `tuning`: Runtime tunables and telemetry readouts

pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use error::GameError;
pub use highscores::{Leaderboard, Rank};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Radius around the origin kept clear of walls (car spawn point)
    pub const FREE_CENTER_SIZE: f32 = 5.0;

    /// Wall dimensions (inclusive integer ranges)
    pub const WALL_MIN_WIDTH: u32 = 2;
    pub const WALL_MAX_WIDTH: u32 = 5;
    pub const WALL_MIN_HEIGHT: u32 = 1;
    pub const WALL_MAX_HEIGHT: u32 = 2;
    /// Wall thickness used for the bounding box
    pub const WALL_DEPTH: f32 = 0.1;

    /// Flag bounding cube edge
    pub const FLAG_SIZE: f32 = 1.0;
    /// Minimum squared distance between a flag and any other element
    pub const FLAG_MIN_DISTANCE_SQ: f32 = 2.0;

    /// Placement attempts before level generation gives up
    pub const MAX_FLAG_ATTEMPTS: u32 = 5;
    pub const MAX_WALL_ATTEMPTS: u32 = 1000;

    /// Car position history length
    pub const POSITION_BUFFER_SIZE: usize = 20;

    /// Drop-in sequence: start height and descent per tick
    pub const DROP_IN_HEIGHT: f32 = 20.0;
    pub const DROP_IN_STEP: f32 = 0.5;
    /// Scale factor applied every tick while the car falls
    pub const FALL_SCALE: f32 = 0.95;

    /// Shooting limits
    pub const MAX_SHOTS: usize = 5;
    pub const MIN_SHOT_INTERVAL_MS: f64 = 200.0;
    pub const SHOT_LIFETIME_MS: f64 = 1000.0;
    /// Projectile travel per tick
    pub const SHOT_SPEED: f32 = 1.0;

    /// HUD countdown step
    pub const TIMER_STEP_MS: f64 = 100.0;
    /// Telemetry readout throttle
    pub const TELEMETRY_INTERVAL_MS: f64 = 200.0;
    /// Color cycling period for walls, flags and the current leaderboard row
    pub const COLOR_CYCLE_MS: f64 = 50.0;
    pub const COLOR_CYCLE_HUE_STEP: f32 = 0.01;

    /// Leaderboard sizes: entries displayed and entries persisted
    pub const RANKING_SIZE: usize = 10;
    pub const RANKING_STORE_CAP: usize = 100;
    /// Maximum player name length
    pub const MAX_NAME_LEN: usize = 12;

    /// Number of levels generated by default
    pub const LEVEL_COUNT: usize = 100;
}

/// Convert degrees to radians
#[inline]
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Convert radians to degrees
#[inline]
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Round to a number of decimal digits
#[inline]
pub fn round_to(n: f32, digits: i32) -> f32 {
    let multiplier = 10f32.powi(digits);
    (n * multiplier).round() / multiplier
}

/// Radians with their degree equivalent, e.g. `1.571 (90°)`
pub fn pretty_radians(radians: f32) -> String {
    format!(
        "{} ({}°)",
        round_to(radians, 3),
        round_to(radians_to_degrees(radians), 3)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(12.34, 1), 12.3);
        assert_eq!(round_to(-0.05, 0), -0.0);
    }

    #[test]
    fn test_pretty_radians() {
        assert_eq!(pretty_radians(0.0), "0 (0°)");
        assert_eq!(pretty_radians(std::f32::consts::FRAC_PI_2), "1.571 (90°)");
    }
}
