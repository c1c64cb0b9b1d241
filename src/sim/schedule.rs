//! Deferred one-shot actions
//!
//! Every delayed effect in a race (next challenge, answer deadline, turbo
//! expiry) is a row in this table, polled once per tick. Cancelling is just
//! removing the row, so a reset or finished race can never be touched by a
//! stale timer.

use serde::{Deserialize, Serialize};

/// Something the race will do at a later time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Pause the race and pose a new math problem
    NextChallenge,
    /// The open problem ran out of time
    ChallengeDeadline,
    /// The player's turbo window ends
    ExpireTurbo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    action: ScheduledAction,
    fire_at_ms: f64,
    /// Insertion order, breaks ties between equal fire times
    seq: u64,
}

/// Pending actions keyed by (action, fire time)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an action. An action kind has at most one pending entry;
    /// rescheduling replaces the old fire time.
    pub fn schedule(&mut self, action: ScheduledAction, fire_at_ms: f64) {
        self.cancel(action);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            action,
            fire_at_ms,
            seq,
        });
    }

    /// Remove a pending action (no-op if absent)
    pub fn cancel(&mut self, action: ScheduledAction) {
        self.entries.retain(|e| e.action != action);
    }

    /// Drop every pending action
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, action: ScheduledAction) -> bool {
        self.entries.iter().any(|e| e.action == action)
    }

    /// Fire time of a pending action
    pub fn fire_time(&self, action: ScheduledAction) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.action == action)
            .map(|e| e.fire_at_ms)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the earliest action due at `now_ms`, if any
    pub fn pop_due(&mut self, now_ms: f64) -> Option<ScheduledAction> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.fire_at_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.fire_at_ms
                    .partial_cmp(&b.fire_at_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i)?;
        Some(self.entries.remove(idx).action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_fire_order() {
        let mut schedule = Schedule::new();
        schedule.schedule(ScheduledAction::NextChallenge, 500.0);
        schedule.schedule(ScheduledAction::ExpireTurbo, 200.0);

        assert_eq!(schedule.pop_due(100.0), None);
        assert_eq!(schedule.pop_due(600.0), Some(ScheduledAction::ExpireTurbo));
        assert_eq!(schedule.pop_due(600.0), Some(ScheduledAction::NextChallenge));
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_reschedule_replaces() {
        let mut schedule = Schedule::new();
        schedule.schedule(ScheduledAction::NextChallenge, 500.0);
        schedule.schedule(ScheduledAction::NextChallenge, 900.0);

        assert_eq!(schedule.fire_time(ScheduledAction::NextChallenge), Some(900.0));
        assert_eq!(schedule.pop_due(600.0), None);
    }

    #[test]
    fn test_cancel_and_clear() {
        let mut schedule = Schedule::new();
        schedule.schedule(ScheduledAction::ChallengeDeadline, 10.0);
        schedule.schedule(ScheduledAction::ExpireTurbo, 10.0);

        schedule.cancel(ScheduledAction::ChallengeDeadline);
        assert!(!schedule.is_pending(ScheduledAction::ChallengeDeadline));
        assert!(schedule.is_pending(ScheduledAction::ExpireTurbo));

        schedule.clear();
        assert_eq!(schedule.pop_due(f64::MAX), None);
    }

    #[test]
    fn test_equal_times_fire_in_insertion_order() {
        let mut schedule = Schedule::new();
        schedule.schedule(ScheduledAction::ExpireTurbo, 100.0);
        schedule.schedule(ScheduledAction::NextChallenge, 100.0);

        assert_eq!(schedule.pop_due(100.0), Some(ScheduledAction::ExpireTurbo));
        assert_eq!(schedule.pop_due(100.0), Some(ScheduledAction::NextChallenge));
    }
}
