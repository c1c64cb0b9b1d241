//! Race state machine
//!
//! `NotStarted -> Running <-> PausedForProblem -> Finished`, plus a full
//! reset back to `NotStarted`. Calls made in the wrong phase are ignored and
//! logged; duplicate UI events must never disturb a running race.

use super::challenge::{self, ChallengeOutcome};
use super::motion::{self, RaceProgress};
use super::rng::UniformSource;
use super::schedule::ScheduledAction;
use super::state::{GameEvent, PLAYER_INDEX, RaceOutcome, RacePhase, RaceResult, RaceState};
use crate::consts::*;
use crate::settings::Settings;

impl RaceState {
    /// Start the race. Only valid from `NotStarted`.
    pub fn start(&mut self) -> bool {
        if self.phase != RacePhase::NotStarted {
            log::debug!("start() ignored in {:?}", self.phase);
            return false;
        }
        self.phase = RacePhase::Running;
        self.elapsed_ms = 0.0;
        self.current_lap = 1;
        self.lap_started_ms = 0.0;
        self.schedule.clear();
        self.schedule.schedule(
            ScheduledAction::NextChallenge,
            self.clock_ms + self.settings.problem_interval_ms(),
        );
        self.emit(GameEvent::RaceStarted);
        log::info!("Race started ({} laps)", self.total_laps);
        true
    }

    /// Pause motion and pose a problem. Only valid from `Running`.
    pub fn request_challenge(&mut self, rng: &mut dyn UniformSource) -> bool {
        if self.phase != RacePhase::Running || self.problem.is_some() {
            log::debug!("request_challenge() ignored in {:?}", self.phase);
            return false;
        }
        let problem = challenge::generate(&self.settings, rng, self.clock_ms);
        self.schedule.cancel(ScheduledAction::NextChallenge);
        self.schedule
            .schedule(ScheduledAction::ChallengeDeadline, problem.deadline_ms);
        let prompt = problem.prompt();
        log::debug!("Challenge: {}", prompt);
        self.problem = Some(problem);
        self.phase = RacePhase::PausedForProblem;
        self.emit(GameEvent::ChallengeOpened { prompt });
        true
    }

    /// Close the open problem and resume. Only valid from `PausedForProblem`.
    pub fn resolve_challenge(&mut self, outcome: ChallengeOutcome) -> bool {
        if self.phase != RacePhase::PausedForProblem {
            log::debug!("resolve_challenge() ignored in {:?}", self.phase);
            return false;
        }
        let Some(problem) = self.problem.take() else {
            return false;
        };
        self.schedule.cancel(ScheduledAction::ChallengeDeadline);
        self.phase = RacePhase::Running;

        match outcome {
            ChallengeOutcome::Success => {
                self.problems_solved += 1;
                self.emit(GameEvent::AnswerCorrect);

                // Boost is earned in one go: full charge, then straight into turbo
                self.boost.charge_tick(MAX_CHARGE as i16);
                let now = self.clock_ms;
                if self.boost.activate_turbo(&mut self.cars[PLAYER_INDEX], now) {
                    let expiry = self.boost.turbo_expiry_ms.unwrap_or(now);
                    self.schedule.schedule(ScheduledAction::ExpireTurbo, expiry);
                    self.emit(GameEvent::TurboStarted);
                } else {
                    self.schedule_next_challenge();
                }
            }
            ChallengeOutcome::Failure => {
                self.problems_missed += 1;
                self.emit(GameEvent::AnswerWrong {
                    expected: problem.hidden_value(),
                });
                self.schedule_next_challenge();
            }
            ChallengeOutcome::Timeout => {
                self.problems_missed += 1;
                self.emit(GameEvent::ChallengeTimedOut {
                    expected: problem.hidden_value(),
                });
                self.schedule_next_challenge();
            }
        }
        log::debug!("Challenge closed: {:?}", outcome);
        true
    }

    /// Judge a typed answer for the open problem. Incomplete or non-numeric
    /// entries are left pending (`None`).
    pub fn submit_answer(&mut self, raw: &str) -> Option<ChallengeOutcome> {
        if self.phase != RacePhase::PausedForProblem {
            log::debug!("submit_answer() ignored in {:?}", self.phase);
            return None;
        }
        let outcome = challenge::evaluate_entry(self.problem.as_ref()?, raw)?;
        self.resolve_challenge(outcome);
        Some(outcome)
    }

    /// Throw the race away and line up a fresh grid. Valid from any phase.
    pub fn reset(&mut self, rng: &mut dyn UniformSource) {
        let clock_ms = self.clock_ms;
        let settings = self.settings.clone();
        *self = RaceState::new(settings, rng);
        // Session clock is not part of the race
        self.clock_ms = clock_ms;
        log::info!("Race reset");
    }

    /// Store new settings (clamped). Lap count only changes before the start.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        if self.phase == RacePhase::NotStarted {
            self.total_laps = self.settings.num_laps;
        }
        log::info!("Settings updated: {:?}", self.settings);
    }

    /// Run one scheduled action
    pub fn fire(&mut self, action: ScheduledAction, rng: &mut dyn UniformSource) {
        match action {
            ScheduledAction::NextChallenge => {
                self.request_challenge(rng);
            }
            ScheduledAction::ChallengeDeadline => {
                self.resolve_challenge(ChallengeOutcome::Timeout);
            }
            ScheduledAction::ExpireTurbo => {
                if self.boost.expire_turbo(&mut self.cars[PLAYER_INDEX]) {
                    self.emit(GameEvent::TurboEnded);
                    if self.phase == RacePhase::Running {
                        self.schedule_next_challenge();
                    }
                }
            }
        }
    }

    /// Motion, ranks, and lap/finish detection for one frame.
    /// No-op unless `Running`.
    pub fn advance(&mut self, frame_ms: f64, rng: &mut dyn UniformSource) {
        if self.phase != RacePhase::Running {
            return;
        }
        let frame_ms = frame_ms.max(0.0);
        self.elapsed_ms += frame_ms;

        let progress = RaceProgress::new(self.current_lap, self.total_laps, self.elapsed_ms);
        let delta = crate::platform::clock::frames(frame_ms);
        motion::advance_cars(&mut self.cars, &progress, rng, delta);
        self.update_ranks();
        self.check_laps();
    }

    /// Recompute ranks, noting when the player's changes
    pub fn update_ranks(&mut self) {
        motion::assign_ranks(&mut self.cars);
        let rank = self.cars[PLAYER_INDEX].rank;
        if rank != self.player_rank {
            self.player_rank = rank;
            self.emit(GameEvent::RankChanged { rank });
        }
    }

    /// Player finish first, then opponent finish, then an ordinary lap crossing
    fn check_laps(&mut self) {
        let player_crossed = self.cars[PLAYER_INDEX].position >= LAP_DISTANCE;
        let final_lap = self.current_lap >= self.total_laps;

        if final_lap && player_crossed {
            let outcome = if self.player_rank == 1 {
                RaceOutcome::Win
            } else {
                RaceOutcome::Loss
            };
            self.record_lap();
            self.finish(outcome);
            return;
        }

        if final_lap
            && self
                .cars
                .iter()
                .any(|c| !c.is_player() && c.position >= LAP_DISTANCE)
        {
            self.finish(RaceOutcome::Loss);
            return;
        }

        if player_crossed {
            self.record_lap();
            self.current_lap += 1;
            motion::apply_lap_boundary(&mut self.cars);
            self.update_ranks();
            log::info!("Lap {}/{}", self.current_lap, self.total_laps);
        }
    }

    fn record_lap(&mut self) {
        let lap_ms = (self.elapsed_ms - self.lap_started_ms).max(0.0) as u64;
        self.lap_times_ms.push(lap_ms);
        self.lap_started_ms = self.elapsed_ms;
        self.emit(GameEvent::LapCompleted {
            lap: self.current_lap,
            lap_ms,
        });
    }

    fn finish(&mut self, outcome: RaceOutcome) {
        self.schedule.clear();
        self.problem = None;
        if self.boost.expire_turbo(&mut self.cars[PLAYER_INDEX]) {
            self.emit(GameEvent::TurboEnded);
        }
        self.phase = RacePhase::Finished;

        let result = RaceResult {
            outcome,
            rank: self.player_rank,
            race_time_ms: self.elapsed_ms as u64,
            problems_solved: self.problems_solved,
            best_lap_ms: self.best_lap_ms(),
        };
        log::info!(
            "Race finished: {:?} in position {} ({} ms)",
            outcome,
            result.rank,
            result.race_time_ms
        );
        self.result = Some(result.clone());
        self.emit(GameEvent::RaceFinished(result));
    }

    fn schedule_next_challenge(&mut self) {
        self.schedule.schedule(
            ScheduledAction::NextChallenge,
            self.clock_ms + self.settings.problem_interval_ms(),
        );
    }
}
