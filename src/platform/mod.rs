//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing (display-refresh timestamps to simulation deltas)
//! - Storage (LocalStorage on web, in-memory elsewhere)

pub mod clock;
pub mod storage;

pub use clock::FrameClock;
pub use storage::{KeyValueStore, MemoryStore};
