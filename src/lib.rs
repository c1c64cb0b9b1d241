//! Math Racer - an arcade racing game for multiplication-table practice
//!
//! Core modules:
//! - `sim`: Deterministic race simulation (motion, laps, challenges, boost)
//! - `hud`: Render sink surface and display helpers
//! - `platform`: Browser/native platform abstraction (frame clock, storage)
//! - `persistence`: Versioned JSON save/load over a key-value store
//! - `settings`: Validated player settings
//! - `records`: Best race times leaderboard
//! - `audio`: Procedural sound effects for game events

pub mod audio;
pub mod hud;
pub mod persistence;
pub mod platform;
pub mod records;
pub mod settings;
pub mod sim;

pub use records::BestTimes;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Reference frame duration (ms); frame deltas are normalized to this
    pub const FRAME_MS: f64 = 16.67;
    /// Largest frame delta accepted (ms) before clamping (tab switches, stalls)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Distance a car must travel to complete one lap
    pub const LAP_DISTANCE: f32 = 3000.0;
    /// Fraction of lap overshoot kept as the next lap's starting offset
    pub const CARRY_OVER_FRACTION: f32 = 0.2;
    /// Racers on the grid (player + 3 computer cars)
    pub const RACER_COUNT: usize = 4;

    /// Turbo speed multiplier applied to the player's base speed
    pub const TURBO_MULTIPLIER: f32 = 2.5;
    /// Turbo window length (ms)
    pub const TURBO_DURATION_MS: f64 = 3000.0;
    /// Full boost charge
    pub const MAX_CHARGE: u8 = 100;

    /// Crescendo cars gain this much base speed at each lap boundary
    pub const CRESCENDO_LAP_GAIN: f32 = 0.15;
    /// Race time (ms) at which the crescendo time bonus saturates
    pub const CRESCENDO_TIME_SATURATION_MS: f64 = 60_000.0;

    /// Player speed units to displayed MPH
    pub const SPEED_DISPLAY_SCALE: f32 = 50.0;
    /// Top of the speed gauge (MPH)
    pub const MAX_DISPLAY_SPEED: f32 = 200.0;
    /// Per-frame smoothing factor for the speed gauge
    pub const SPEED_SMOOTHING: f32 = 0.08;

    /// Chance a generated problem hides the product rather than an operand
    pub const BLANK_PRODUCT_CHANCE: f32 = 0.7;
}

/// Format race time as `MM:SS.cc` (centiseconds)
pub fn format_race_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

/// English ordinal suffix for a race position (1st, 2nd, 3rd, 4th...)
pub fn ordinal_suffix(rank: usize) -> &'static str {
    match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Race position with its suffix, e.g. "2nd"
pub fn ordinal(rank: usize) -> String {
    format!("{}{}", rank, ordinal_suffix(rank))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_race_time() {
        assert_eq!(format_race_time(0), "00:00.00");
        assert_eq!(format_race_time(61_234), "01:01.23");
        assert_eq!(format_race_time(599_999), "09:59.99");
    }

    #[test]
    fn test_ordinal_suffix() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal(3), "3rd");
    }
}
