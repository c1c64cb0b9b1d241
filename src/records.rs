//! Best race times leaderboard
//!
//! Persisted through the key-value store, tracks the 10 fastest wins.

use serde::{Deserialize, Serialize};

use crate::persistence;
use crate::platform::storage::KeyValueStore;
use crate::sim::{RaceOutcome, RaceResult};

/// Maximum number of entries to keep
pub const MAX_BEST_TIMES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTimeEntry {
    /// Finish time of the race
    pub race_ms: u64,
    /// Laps the race was run over
    pub laps: u32,
    /// Problems solved during the race
    pub problems_solved: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Fastest winning races, quickest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestTimes {
    pub entries: Vec<BestTimeEntry>,
}

impl BestTimes {
    /// Storage key
    const STORAGE_KEY: &'static str = "math_racer_best_times";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a race time would make the board
    pub fn qualifies(&self, race_ms: u64) -> bool {
        if race_ms == 0 {
            return false;
        }
        if self.entries.len() < MAX_BEST_TIMES {
            return true;
        }
        self.entries.last().map(|e| race_ms < e.race_ms).unwrap_or(true)
    }

    /// Rank a time would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, race_ms: u64) -> Option<usize> {
        if !self.qualifies(race_ms) {
            return None;
        }
        let rank = self.entries.iter().position(|e| race_ms < e.race_ms);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Record a finished race. Only wins count.
    /// Returns the rank achieved (1-indexed) or None if it didn't make the board.
    pub fn record(&mut self, result: &RaceResult, laps: u32, timestamp: f64) -> Option<usize> {
        if result.outcome != RaceOutcome::Win || !self.qualifies(result.race_time_ms) {
            return None;
        }

        let entry = BestTimeEntry {
            race_ms: result.race_time_ms,
            laps,
            problems_solved: result.problems_solved,
            timestamp,
        };

        // Sorted ascending by time; ties keep the older entry first
        let pos = self.entries.iter().position(|e| entry.race_ms < e.race_ms);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_BEST_TIMES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fastest time, if any
    pub fn best(&self) -> Option<u64> {
        self.entries.first().map(|e| e.race_ms)
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load::<BestTimes>(store, Self::STORAGE_KEY) {
            Some(mut times) => {
                times.entries.sort_by_key(|e| e.race_ms);
                times.entries.truncate(MAX_BEST_TIMES);
                log::info!("Loaded {} best times", times.entries.len());
                times
            }
            None => {
                log::info!("No best times found, starting fresh");
                Self::new()
            }
        }
    }

    /// Wipe the board, in memory and in storage
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) {
        self.entries.clear();
        persistence::clear(store, Self::STORAGE_KEY);
        log::info!("Best times cleared");
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save(store, Self::STORAGE_KEY, self);
        log::info!("Best times saved ({} entries)", self.entries.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    fn win(race_time_ms: u64) -> RaceResult {
        RaceResult {
            outcome: RaceOutcome::Win,
            rank: 1,
            race_time_ms,
            problems_solved: 3,
            best_lap_ms: None,
        }
    }

    #[test]
    fn test_only_wins_are_recorded() {
        let mut times = BestTimes::new();
        let loss = RaceResult {
            outcome: RaceOutcome::Loss,
            ..win(40_000)
        };
        assert_eq!(times.record(&loss, 3, 0.0), None);
        assert!(times.is_empty());
        assert_eq!(times.record(&win(40_000), 3, 0.0), Some(1));
    }

    #[test]
    fn test_sorted_fastest_first() {
        let mut times = BestTimes::new();
        times.record(&win(50_000), 3, 0.0);
        times.record(&win(30_000), 3, 0.0);
        assert_eq!(times.record(&win(40_000), 3, 0.0), Some(2));
        assert_eq!(times.best(), Some(30_000));
        assert_eq!(times.potential_rank(10_000), Some(1));
        assert_eq!(times.potential_rank(60_000), Some(4));
    }

    #[test]
    fn test_board_is_capped() {
        let mut times = BestTimes::new();
        for i in 0..MAX_BEST_TIMES as u64 {
            times.record(&win(10_000 + i * 1000), 3, 0.0);
        }
        assert!(!times.qualifies(99_000));
        assert_eq!(times.record(&win(99_000), 3, 0.0), None);
        assert_eq!(times.record(&win(5_000), 3, 0.0), Some(1));
        assert_eq!(times.entries.len(), MAX_BEST_TIMES);
    }

    #[test]
    fn test_persisted() {
        let mut store = MemoryStore::default();
        let mut times = BestTimes::new();
        times.record(&win(42_000), 2, 1.0);
        times.save(&mut store);
        assert_eq!(BestTimes::load(&store), times);

        times.clear(&mut store);
        assert!(times.is_empty());
        assert!(BestTimes::load(&store).is_empty());

        store.set(BestTimes::STORAGE_KEY, "[1,2");
        assert!(BestTimes::load(&store).is_empty());
    }
}
