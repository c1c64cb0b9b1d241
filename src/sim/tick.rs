//! Per-frame simulation tick
//!
//! Frame driver entry point: applies queued input, advances the session
//! clock, fires due scheduled actions, then moves the race along.

use super::rng::UniformSource;
use super::state::{RacePhase, RaceState};
use crate::consts::*;
use crate::settings::Settings;

/// Discrete input events collected since the last frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start button / Space / Enter
    pub start_race: bool,
    /// Current contents of the answer box
    pub answer: Option<String>,
    /// "Race again" after a finish (or a restart at any time)
    pub race_again: bool,
    /// New settings from the settings panel
    pub settings: Option<Settings>,
}

/// Advance the race by one display frame lasting `frame_ms`
pub fn tick(state: &mut RaceState, input: &TickInput, rng: &mut dyn UniformSource, frame_ms: f64) {
    if let Some(settings) = &input.settings {
        state.update_settings(settings.clone());
    }
    if input.race_again {
        state.reset(rng);
    }
    if input.start_race {
        state.start();
    }
    if let Some(answer) = &input.answer {
        state.submit_answer(answer);
    }

    let frame_ms = frame_ms.clamp(0.0, MAX_FRAME_MS);
    state.clock_ms += frame_ms;
    while let Some(action) = state.schedule.pop_due(state.clock_ms) {
        state.fire(action, rng);
    }

    state.advance(frame_ms, rng);
    update_display_speed(state);
}

/// Ease the speed gauge toward the player's current speed
fn update_display_speed(state: &mut RaceState) {
    let target = if state.phase == RacePhase::Running {
        (state.player().speed * SPEED_DISPLAY_SCALE).min(MAX_DISPLAY_SPEED)
    } else {
        0.0
    };
    state.display_speed += (target - state.display_speed) * SPEED_SMOOTHING;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::challenge::ChallengeOutcome;
    use crate::sim::rng::seeded;
    use crate::sim::schedule::ScheduledAction;
    use crate::sim::state::{GameEvent, RaceOutcome};

    const FRAME: f64 = 1000.0 / 60.0;

    fn run_frames(state: &mut RaceState, rng: &mut dyn UniformSource, frames: usize) {
        let input = TickInput::default();
        for _ in 0..frames {
            tick(state, &input, rng, FRAME);
        }
    }

    #[test]
    fn test_start_then_first_challenge() {
        let mut rng = seeded(1);
        let mut state = RaceState::new(Settings::default(), &mut rng);

        run_frames(&mut state, &mut rng, 30);
        assert_eq!(state.phase, RacePhase::NotStarted);
        assert_eq!(state.elapsed_ms, 0.0);

        let start = TickInput {
            start_race: true,
            ..Default::default()
        };
        tick(&mut state, &start, &mut rng, FRAME);
        assert_eq!(state.phase, RacePhase::Running);

        // Default interval is 10 s
        run_frames(&mut state, &mut rng, 590);
        assert_eq!(state.phase, RacePhase::Running);
        run_frames(&mut state, &mut rng, 15);
        assert_eq!(state.phase, RacePhase::PausedForProblem);
        assert!(state.problem.is_some());
    }

    #[test]
    fn test_answer_flow_through_input() {
        let mut rng = seeded(5);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        state.request_challenge(&mut rng);
        let answer = state.problem.as_ref().unwrap().hidden_value().to_string();
        let base = state.player().base_speed;

        let input = TickInput {
            answer: Some(answer),
            ..Default::default()
        };
        tick(&mut state, &input, &mut rng, FRAME);
        assert_eq!(state.phase, RacePhase::Running);
        assert!(state.player().boost_active);

        // Turbo lasts 3 s of session time
        run_frames(&mut state, &mut rng, 185);
        assert!(!state.player().boost_active);
        assert_eq!(state.player().base_speed, base);
        assert!(state.schedule.is_pending(ScheduledAction::NextChallenge));
    }

    #[test]
    fn test_deadline_times_out_while_paused() {
        let mut rng = seeded(9);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        state.request_challenge(&mut rng);
        state.drain_events();

        // Default answer time is 8 s; race time stays frozen meanwhile
        run_frames(&mut state, &mut rng, 485);
        assert_eq!(state.phase, RacePhase::Running);
        assert!(state.problem.is_none());
        assert_eq!(state.problems_missed, 1);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ChallengeTimedOut { .. }))
        );
    }

    #[test]
    fn test_elapsed_frozen_while_paused() {
        let mut rng = seeded(3);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        run_frames(&mut state, &mut rng, 10);
        let elapsed = state.elapsed_ms;

        state.request_challenge(&mut rng);
        run_frames(&mut state, &mut rng, 60);
        assert_eq!(state.elapsed_ms, elapsed);
        assert!(state.clock_ms > elapsed + 900.0);
    }

    #[test]
    fn test_race_again_resets() {
        let mut rng = seeded(11);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        run_frames(&mut state, &mut rng, 100);

        let input = TickInput {
            race_again: true,
            ..Default::default()
        };
        tick(&mut state, &input, &mut rng, FRAME);
        assert_eq!(state.phase, RacePhase::NotStarted);
        assert_eq!(state.elapsed_ms, 0.0);
    }

    #[test]
    fn test_display_speed_eases_toward_target() {
        let mut rng = seeded(4);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        tick(&mut state, &TickInput::default(), &mut rng, FRAME);
        let first = state.display_speed;
        assert!(first > 0.0);
        run_frames(&mut state, &mut rng, 120);
        assert!(state.display_speed > first);
        assert!(state.display_speed <= MAX_DISPLAY_SPEED);
    }

    #[test]
    fn test_full_race_finishes() {
        let mut rng = seeded(2025);
        let settings = Settings {
            num_laps: 1,
            ..Settings::default()
        };
        let mut state = RaceState::new(settings, &mut rng);
        state.start();

        let mut frames = 0;
        while state.phase != RacePhase::Finished && frames < 20_000 {
            let answer = state
                .problem
                .as_ref()
                .map(|p| p.hidden_value().to_string());
            let input = TickInput {
                answer,
                ..Default::default()
            };
            tick(&mut state, &input, &mut rng, FRAME);
            frames += 1;
        }

        assert_eq!(state.phase, RacePhase::Finished);
        let result = state.result.as_ref().unwrap();
        assert!(matches!(result.outcome, RaceOutcome::Win | RaceOutcome::Loss));
        assert!(state.problems_solved > 0);
        assert!(state.schedule.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut rng1 = seeded(99_999);
        let mut rng2 = seeded(99_999);
        let mut state1 = RaceState::new(Settings::default(), &mut rng1);
        let mut state2 = RaceState::new(Settings::default(), &mut rng2);
        state1.start();
        state2.start();

        run_frames(&mut state1, &mut rng1, 300);
        run_frames(&mut state2, &mut rng2, 300);

        for (a, b) in state1.cars.iter().zip(&state2.cars) {
            assert_eq!(a.position, b.position);
        }
        assert_eq!(state1.player_rank, state2.player_rank);
    }

    #[test]
    fn test_outcome_type_is_exposed() {
        let mut rng = seeded(8);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        state.request_challenge(&mut rng);
        assert_eq!(state.submit_answer("abc"), None);
        assert_ne!(state.submit_answer("999"), Some(ChallengeOutcome::Success));
    }
}
