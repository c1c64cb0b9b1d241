//! Car motion model
//!
//! Per tick, each car's speed is `base_speed + modulation`, where the
//! modulation comes from the driver's `SpeedModulator`. Positions integrate
//! `speed * delta` with `delta` measured in reference frames.

use super::rng::UniformSource;
use super::state::{Car, Driver, Personality};
use crate::consts::*;

/// How far into the race we are, as seen by speed modulators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceProgress {
    /// current_lap / total_laps
    pub lap_progress: f32,
    /// Race time over the saturation window, capped at 1
    pub time_progress: f32,
}

impl RaceProgress {
    pub fn new(current_lap: u32, total_laps: u32, elapsed_ms: f64) -> Self {
        let lap_progress = if total_laps == 0 {
            1.0
        } else {
            current_lap as f32 / total_laps as f32
        };
        let time_progress = (elapsed_ms / CRESCENDO_TIME_SATURATION_MS).clamp(0.0, 1.0) as f32;
        Self {
            lap_progress,
            time_progress,
        }
    }
}

/// Per-tick speed delta strategy
pub trait SpeedModulator {
    fn modulation(&self, car: &Car, progress: &RaceProgress, rng: &mut dyn UniformSource) -> f32;
}

/// Symmetric noise, no drift
pub struct Steady;

impl Steady {
    pub const VARIANCE: f32 = 0.3;
}

impl SpeedModulator for Steady {
    fn modulation(&self, _car: &Car, _progress: &RaceProgress, rng: &mut dyn UniformSource) -> f32 {
        rng.range(-Self::VARIANCE / 2.0, Self::VARIANCE / 2.0)
    }
}

/// Rare stumbles, occasional bursts, otherwise noise biased slow
pub struct Aggressive;

impl Aggressive {
    pub const VARIANCE: f32 = 0.4;
    pub const STUMBLE_CHANCE: f32 = 0.02;
    pub const STUMBLE: f32 = -0.8;
    pub const BURST_CHANCE: f32 = 0.10;
    pub const BURST: f32 = 0.5;
}

impl SpeedModulator for Aggressive {
    fn modulation(&self, _car: &Car, _progress: &RaceProgress, rng: &mut dyn UniformSource) -> f32 {
        if rng.next_unit() < Self::STUMBLE_CHANCE {
            return Self::STUMBLE;
        }
        if rng.next_unit() < Self::BURST_CHANCE {
            return Self::BURST;
        }
        (rng.next_unit() - 0.3) * Self::VARIANCE
    }
}

/// Speeds up with lap and time progress
pub struct Crescendo;

impl Crescendo {
    pub const VARIANCE: f32 = 0.3;
    pub const LAP_WEIGHT: f32 = 0.4;
    pub const TIME_WEIGHT: f32 = 0.3;
}

impl SpeedModulator for Crescendo {
    fn modulation(&self, _car: &Car, progress: &RaceProgress, rng: &mut dyn UniformSource) -> f32 {
        progress.lap_progress * Self::LAP_WEIGHT
            + progress.time_progress * Self::TIME_WEIGHT
            + rng.range(-Self::VARIANCE / 2.0, Self::VARIANCE / 2.0)
    }
}

/// Narrow jitter for the player's car; pace comes from turbo
pub struct PlayerJitter;

impl PlayerJitter {
    pub const VARIANCE: f32 = 0.15;
}

impl SpeedModulator for PlayerJitter {
    fn modulation(&self, _car: &Car, _progress: &RaceProgress, rng: &mut dyn UniformSource) -> f32 {
        rng.range(-Self::VARIANCE / 2.0, Self::VARIANCE / 2.0)
    }
}

impl Driver {
    pub fn modulator(&self) -> &'static dyn SpeedModulator {
        match self {
            Driver::Player => &PlayerJitter,
            Driver::Computer(Personality::Steady) => &Steady,
            Driver::Computer(Personality::Aggressive) => &Aggressive,
            Driver::Computer(Personality::Crescendo) => &Crescendo,
        }
    }
}

/// Speed for this tick. Never negative, so positions never move backwards.
pub fn car_speed(car: &Car, progress: &RaceProgress, rng: &mut dyn UniformSource) -> f32 {
    let delta = car.driver.modulator().modulation(car, progress, rng);
    (car.base_speed + delta).max(0.0)
}

/// Advance every car by `delta` reference frames (stable car order)
pub fn advance_cars(
    cars: &mut [Car],
    progress: &RaceProgress,
    rng: &mut dyn UniformSource,
    delta: f32,
) {
    let delta = delta.max(0.0);
    for car in cars.iter_mut() {
        car.speed = car_speed(car, progress, rng);
        car.position += car.speed * delta;
    }
}

/// Car indices from leader to last. Equal positions keep car-array order.
pub fn standings(cars: &[Car]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..cars.len()).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| {
        cars[b]
            .position
            .partial_cmp(&cars[a].position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Write 1-based ranks onto the cars
pub fn assign_ranks(cars: &mut [Car]) {
    for (place, idx) in standings(cars).into_iter().enumerate() {
        cars[idx].rank = place + 1;
    }
}

/// Lap boundary: every car keeps a fraction of its overshoot past the lap
/// line as its new offset (cars still short of it start behind the line by
/// the same fraction), and crescendo cars gain base speed.
pub fn apply_lap_boundary(cars: &mut [Car]) {
    for car in cars.iter_mut() {
        car.position = (car.position - LAP_DISTANCE) * CARRY_OVER_FRACTION;
        if car.personality() == Some(Personality::Crescendo) {
            car.base_speed += CRESCENDO_LAP_GAIN;
        }
    }
}
