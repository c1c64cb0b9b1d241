//! Race state and core simulation types
//!
//! Everything a race session mutates lives in `RaceState`; the shell owns
//! exactly one and hands it to `tick` every frame.

use serde::{Deserialize, Serialize};

use super::boost::BoostState;
use super::challenge::MathProblem;
use super::motion::assign_ranks;
use super::rng::UniformSource;
use super::schedule::Schedule;
use crate::consts::*;
use crate::settings::Settings;

/// Current phase of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// Cars on the grid, waiting for the start signal
    NotStarted,
    /// Cars moving
    Running,
    /// Motion frozen while the player answers a problem
    PausedForProblem,
    /// Race over, result recorded
    Finished,
}

/// Speed-modulation strategy of a computer car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Personality {
    /// Symmetric noise around base speed
    Steady,
    /// Mostly a bit slow, with occasional bursts and stumbles
    Aggressive,
    /// Gets faster as the race goes on
    Crescendo,
}

/// Who is driving a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Driver {
    Player,
    Computer(Personality),
}

/// A racer. Track is one-dimensional; `lane` is only a visual offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: u32,
    pub driver: Driver,
    pub lane: u8,
    /// Distance along the current lap
    pub position: f32,
    /// Speed computed on the last tick (units per reference frame)
    pub speed: f32,
    /// Speed floor the per-tick modulation is added to
    pub base_speed: f32,
    /// Player only: inside a turbo window
    pub boost_active: bool,
    /// 1-based race position, recomputed every tick
    pub rank: usize,
}

impl Car {
    pub fn new(id: u32, driver: Driver, lane: u8, position: f32, base_speed: f32) -> Self {
        Self {
            id,
            driver,
            lane,
            position,
            speed: 0.0,
            base_speed,
            boost_active: false,
            rank: id as usize + 1,
        }
    }

    pub fn is_player(&self) -> bool {
        self.driver == Driver::Player
    }

    pub fn personality(&self) -> Option<Personality> {
        match self.driver {
            Driver::Player => None,
            Driver::Computer(p) => Some(p),
        }
    }
}

/// Grid slot: driver, lane, offset from the start line, nominal base speed, speed spread
const GRID: [(Driver, u8, f32, f32, f32); RACER_COUNT] = [
    (Driver::Player, 2, -20.0, 2.5, 0.5),
    (Driver::Computer(Personality::Steady), 1, -10.0, 2.2, 0.6),
    (Driver::Computer(Personality::Aggressive), 3, 5.0, 2.3, 0.6),
    (Driver::Computer(Personality::Crescendo), 4, -5.0, 2.1, 0.6),
];

/// Start line position; the player starts slightly behind for drama
pub const START_LINE: f32 = 80.0;

/// Index of the player's car in `RaceState::cars`
pub const PLAYER_INDEX: usize = 0;

/// Build the starting grid with lightly randomized base speeds
pub fn starting_grid(rng: &mut dyn UniformSource) -> Vec<Car> {
    GRID.iter()
        .enumerate()
        .map(|(i, &(driver, lane, offset, nominal, spread))| {
            let base_speed = nominal + (rng.next_unit() - 0.5) * spread;
            Car::new(i as u32, driver, lane, START_LINE + offset, base_speed)
        })
        .collect()
}

/// How a finished race ended for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceOutcome {
    Win,
    Loss,
}

/// Final result of a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub outcome: RaceOutcome,
    /// Player's position at the finish
    pub rank: usize,
    pub race_time_ms: u64,
    pub problems_solved: u32,
    pub best_lap_ms: Option<u64>,
}

/// Notable things that happened during a tick, drained by the shell
/// (sound effects, flash messages, logs)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RaceStarted,
    ChallengeOpened { prompt: String },
    AnswerCorrect,
    /// A complete but wrong entry; `expected` is revealed
    AnswerWrong { expected: u32 },
    /// Time ran out; `expected` is revealed
    ChallengeTimedOut { expected: u32 },
    TurboStarted,
    TurboEnded,
    LapCompleted { lap: u32, lap_ms: u64 },
    RankChanged { rank: usize },
    RaceFinished(RaceResult),
}

/// Complete state of one race session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceState {
    pub phase: RacePhase,
    /// 1-based lap the player is on
    pub current_lap: u32,
    pub total_laps: u32,
    /// Race time since start; frozen while paused
    pub elapsed_ms: f64,
    /// Session clock; always advances, drives deadlines and scheduled actions
    pub clock_ms: f64,
    pub player_rank: usize,
    pub problems_solved: u32,
    pub problems_missed: u32,
    /// Player first, then computer cars (stable order breaks rank ties)
    pub cars: Vec<Car>,
    pub boost: BoostState,
    /// At most one open problem; `Some` exactly while PausedForProblem
    pub problem: Option<MathProblem>,
    pub settings: Settings,
    pub schedule: Schedule,
    /// Smoothed speed gauge value (MPH)
    pub display_speed: f32,
    /// Race time at which the current lap began
    pub lap_started_ms: f64,
    pub lap_times_ms: Vec<u64>,
    pub result: Option<RaceResult>,
    /// Pending events for the shell (not part of the race itself)
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl RaceState {
    /// Create a fresh race on the grid, waiting for the start
    pub fn new(settings: Settings, rng: &mut dyn UniformSource) -> Self {
        let settings = settings.sanitized();
        let mut cars = starting_grid(rng);
        assign_ranks(&mut cars);
        let player_rank = cars[PLAYER_INDEX].rank;
        Self {
            phase: RacePhase::NotStarted,
            current_lap: 1,
            total_laps: settings.num_laps,
            elapsed_ms: 0.0,
            clock_ms: 0.0,
            player_rank,
            problems_solved: 0,
            problems_missed: 0,
            cars,
            boost: BoostState::default(),
            problem: None,
            settings,
            schedule: Schedule::new(),
            display_speed: 0.0,
            lap_started_ms: 0.0,
            lap_times_ms: Vec::new(),
            result: None,
            events: Vec::new(),
        }
    }

    pub fn player(&self) -> &Car {
        &self.cars[PLAYER_INDEX]
    }

    pub fn player_mut(&mut self) -> &mut Car {
        &mut self.cars[PLAYER_INDEX]
    }

    pub fn best_lap_ms(&self) -> Option<u64> {
        self.lap_times_ms.iter().copied().min()
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
