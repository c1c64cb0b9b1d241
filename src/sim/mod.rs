//! Deterministic race simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only from frame deltas handed to `tick`
//! - Injected RNG only
//! - Stable iteration order (car array order)
//! - No rendering or platform dependencies

pub mod boost;
pub mod challenge;
pub mod motion;
pub mod race;
pub mod rng;
pub mod schedule;
pub mod state;
pub mod tick;

pub use boost::BoostState;
pub use challenge::{BlankSlot, ChallengeOutcome, MathProblem};
pub use motion::{RaceProgress, SpeedModulator};
pub use rng::{ScriptedSource, UniformSource, seeded};
pub use schedule::{Schedule, ScheduledAction};
pub use state::{
    Car, Driver, GameEvent, PLAYER_INDEX, Personality, RaceOutcome, RacePhase, RaceResult,
    RaceState,
};
pub use tick::{TickInput, tick};
