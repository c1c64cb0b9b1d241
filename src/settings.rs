//! Game settings and preferences
//!
//! Persisted separately from records through the key-value store. Every
//! write goes through `sanitized`, so out-of-range values are clamped rather
//! than rejected.

use serde::{Deserialize, Serialize};

use crate::persistence;
use crate::platform::storage::KeyValueStore;

/// Multiplier bounds
pub const MULTIPLIER_RANGE: (u32, u32) = (1, 12);
/// Seconds between challenges
pub const PROBLEM_INTERVAL_RANGE: (u32, u32) = (3, 30);
/// Seconds allowed per answer
pub const ANSWER_TIME_RANGE: (u32, u32) = (3, 15);
/// Laps per race
pub const LAPS_RANGE: (u32, u32) = (1, 10);

/// Player-tunable race settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub min_multiplier: u32,
    pub max_multiplier: u32,
    pub problem_interval_seconds: u32,
    pub answer_time_seconds: u32,
    pub num_laps: u32,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_multiplier: 1,
            max_multiplier: 10,
            problem_interval_seconds: 10,
            answer_time_seconds: 8,
            num_laps: 3,
            sound_enabled: true,
        }
    }
}

fn clamp_to(value: u32, (lo, hi): (u32, u32)) -> u32 {
    value.clamp(lo, hi)
}

/// Parse a numeric field typed into the settings panel. Negative numbers
/// become 0 and huge ones saturate, so `sanitized` can clamp them into range;
/// only text that is not a number at all yields `None`.
pub fn parse_field(raw: &str) -> Option<u32> {
    let value = raw.trim().parse::<i64>().ok()?;
    Some(value.clamp(0, u32::MAX as i64) as u32)
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "math_racer_settings";

    /// Copy with every field clamped into range and `min <= max`
    pub fn sanitized(&self) -> Self {
        let mut min = clamp_to(self.min_multiplier, MULTIPLIER_RANGE);
        let mut max = clamp_to(self.max_multiplier, MULTIPLIER_RANGE);
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self {
            min_multiplier: min,
            max_multiplier: max,
            problem_interval_seconds: clamp_to(self.problem_interval_seconds, PROBLEM_INTERVAL_RANGE),
            answer_time_seconds: clamp_to(self.answer_time_seconds, ANSWER_TIME_RANGE),
            num_laps: clamp_to(self.num_laps, LAPS_RANGE),
            sound_enabled: self.sound_enabled,
        }
    }

    pub fn problem_interval_ms(&self) -> f64 {
        self.problem_interval_seconds as f64 * 1000.0
    }

    /// Load settings, falling back to defaults when absent or malformed
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load::<Settings>(store, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save(store, Self::STORAGE_KEY, &self.sanitized());
        log::info!("Settings saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_are_valid() {
        let s = Settings::default();
        assert_eq!(s.sanitized(), s);
    }

    #[test]
    fn test_inverted_out_of_range_multipliers() {
        let s = Settings {
            min_multiplier: 20,
            max_multiplier: 1,
            ..Settings::default()
        }
        .sanitized();
        assert!(s.min_multiplier <= s.max_multiplier);
        assert_eq!((s.min_multiplier, s.max_multiplier), (1, 12));
    }

    #[test]
    fn test_clamps_timing_and_laps() {
        let s = Settings {
            problem_interval_seconds: 1,
            answer_time_seconds: 99,
            num_laps: 0,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(s.problem_interval_seconds, 3);
        assert_eq!(s.answer_time_seconds, 15);
        assert_eq!(s.num_laps, 1);
    }

    #[test]
    fn test_partial_blob_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"numLaps": 5}"#).unwrap();
        assert_eq!(s.num_laps, 5);
        assert_eq!(s.max_multiplier, Settings::default().max_multiplier);
    }

    #[test]
    fn test_load_save_and_malformed() {
        let mut store = MemoryStore::default();
        assert_eq!(Settings::load(&store), Settings::default());

        let custom = Settings {
            min_multiplier: 6,
            max_multiplier: 9,
            sound_enabled: false,
            ..Settings::default()
        };
        custom.save(&mut store);
        assert_eq!(Settings::load(&store), custom);

        store.set(Settings::STORAGE_KEY, "{not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_bare_blob_is_clamped_on_load() {
        let mut store = MemoryStore::default();
        store.set(Settings::STORAGE_KEY, r#"{"minMultiplier": 0, "answerTimeSeconds": 2}"#);
        let s = Settings::load(&store);
        assert_eq!(s.min_multiplier, 1);
        assert_eq!(s.answer_time_seconds, 3);
    }

    #[test]
    fn test_parse_field_clamps_instead_of_ignoring() {
        assert_eq!(parse_field(" 7 "), Some(7));
        assert_eq!(parse_field("-5"), Some(0));
        assert_eq!(parse_field("99999999999"), Some(u32::MAX));
        assert_eq!(parse_field("abc"), None);
        assert_eq!(parse_field(""), None);

        let laps = parse_field("-5").unwrap();
        let s = Settings {
            num_laps: laps,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(s.num_laps, LAPS_RANGE.0);
    }

    proptest! {
        #[test]
        fn prop_sanitized_in_range(min in any::<u32>(), max in any::<u32>(), interval in any::<u32>(), answer in any::<u32>(), laps in any::<u32>()) {
            let s = Settings {
                min_multiplier: min,
                max_multiplier: max,
                problem_interval_seconds: interval,
                answer_time_seconds: answer,
                num_laps: laps,
                sound_enabled: true,
            }
            .sanitized();
            prop_assert!(s.min_multiplier <= s.max_multiplier);
            prop_assert!((1..=12).contains(&s.min_multiplier));
            prop_assert!((1..=12).contains(&s.max_multiplier));
            prop_assert!((3..=30).contains(&s.problem_interval_seconds));
            prop_assert!((3..=15).contains(&s.answer_time_seconds));
            prop_assert!((1..=10).contains(&s.num_laps));
            prop_assert_eq!(s.sanitized(), s.clone());
        }
    }
}
