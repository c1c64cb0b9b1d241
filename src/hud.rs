//! HUD and render sink
//!
//! The simulation never draws. Each frame the shell captures a `HudSnapshot`
//! from the race state and hands it to a `RenderSink`. Everything here is a
//! pure projection of state.

use glam::Vec2;

use crate::consts::*;
use crate::sim::{GameEvent, RaceOutcome, RacePhase, RaceState, ScheduledAction};

/// Lap counter as displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapView {
    pub current: u32,
    pub total: u32,
}

/// Boost gauge as displayed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostView {
    pub ready: bool,
    pub charge: u8,
    pub turbo_active: bool,
    pub turbo_remaining_ms: u64,
}

/// The open problem as displayed
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemView {
    pub prompt: String,
    pub answer_digits: usize,
    pub remaining_ms: u64,
    /// Remaining share of the answer time (1.0 = just posed)
    pub remaining_fraction: f32,
}

/// One car on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarView {
    pub position: f32,
    pub lane: u8,
    pub rank: usize,
    pub is_player: bool,
    pub boost_active: bool,
}

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub phase: RacePhase,
    pub lap: LapView,
    pub rank: usize,
    pub racers: usize,
    pub display_speed: u32,
    /// Gauge fill, 0..=1
    pub speed_fraction: f32,
    pub boost: BoostView,
    pub timer_elapsed_ms: u64,
    pub best_lap_ms: Option<u64>,
    pub problems_solved: u32,
    pub active_problem: Option<ProblemView>,
    /// Countdown to the next problem, while one is scheduled
    pub next_problem_in_ms: Option<u64>,
    pub cars: Vec<CarView>,
    pub outcome: Option<RaceOutcome>,
}

impl HudSnapshot {
    pub fn capture(state: &RaceState) -> Self {
        let now = state.clock_ms;
        let active_problem = state.problem.as_ref().map(|p| ProblemView {
            prompt: p.prompt(),
            answer_digits: p.answer_digits(),
            remaining_ms: p.remaining_ms(now) as u64,
            remaining_fraction: p.remaining_fraction(now),
        });
        let next_problem_in_ms = state
            .schedule
            .fire_time(ScheduledAction::NextChallenge)
            .map(|at| (at - now).max(0.0) as u64);

        Self {
            phase: state.phase,
            lap: LapView {
                current: state.current_lap,
                total: state.total_laps,
            },
            rank: state.player_rank,
            racers: state.cars.len(),
            display_speed: state.display_speed.round().max(0.0) as u32,
            speed_fraction: (state.display_speed / MAX_DISPLAY_SPEED).clamp(0.0, 1.0),
            boost: BoostView {
                ready: state.boost.ready,
                charge: state.boost.charge,
                turbo_active: state.boost.turbo_active(),
                turbo_remaining_ms: state.boost.turbo_remaining_ms(now) as u64,
            },
            timer_elapsed_ms: state.elapsed_ms as u64,
            best_lap_ms: state.best_lap_ms(),
            problems_solved: state.problems_solved,
            active_problem,
            next_problem_in_ms,
            cars: state
                .cars
                .iter()
                .map(|c| CarView {
                    position: c.position,
                    lane: c.lane,
                    rank: c.rank,
                    is_player: c.is_player(),
                    boost_active: c.boost_active,
                })
                .collect(),
            outcome: state.result.as_ref().map(|r| r.outcome),
        }
    }

    /// e.g. "2nd"
    pub fn rank_label(&self) -> String {
        crate::ordinal(self.rank)
    }

    /// e.g. "01:23.45"
    pub fn timer_label(&self) -> String {
        crate::format_race_time(self.timer_elapsed_ms)
    }
}

/// Consumer of per-frame HUD snapshots (DOM, terminal, test recorder)
pub trait RenderSink {
    fn render(&mut self, hud: &HudSnapshot);

    /// Discrete events raised since the last frame
    fn notify(&mut self, _event: &GameEvent) {}
}

/// Capture a snapshot, forward pending events, and render
pub fn publish(state: &mut RaceState, sink: &mut dyn RenderSink) {
    for event in state.drain_events() {
        sink.notify(&event);
    }
    sink.render(&HudSnapshot::capture(state));
}

/// Horizontal camera that keeps the player near the left third of the screen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub offset: f32,
}

impl Camera {
    /// Share of the viewport left of the player
    pub const PLAYER_ANCHOR: f32 = 0.3;
    /// Background scroll relative to the cars
    pub const PARALLAX: f32 = 0.5;

    pub fn follow(&mut self, player_position: f32, viewport_width: f32) {
        self.offset = (player_position - viewport_width * Self::PLAYER_ANCHOR).max(0.0);
    }

    pub fn parallax_offset(&self) -> f32 {
        self.offset * Self::PARALLAX
    }

    /// Screen point of a car: x from track position, y from lane
    pub fn car_point(&self, car: &CarView, lane_height: f32) -> Vec2 {
        Vec2::new(
            (car.position - self.offset).round(),
            (car.lane.saturating_sub(1)) as f32 * lane_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::{ScriptedSource, TickInput, tick};

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<HudSnapshot>,
        events: Vec<GameEvent>,
    }

    impl RenderSink for RecordingSink {
        fn render(&mut self, hud: &HudSnapshot) {
            self.frames.push(hud.clone());
        }

        fn notify(&mut self, event: &GameEvent) {
            self.events.push(event.clone());
        }
    }

    #[test]
    fn test_capture_waiting_race() {
        let mut rng = ScriptedSource::constant(0.5);
        let state = RaceState::new(Settings::default(), &mut rng);
        let hud = HudSnapshot::capture(&state);

        assert_eq!(hud.phase, RacePhase::NotStarted);
        assert_eq!(hud.lap, LapView { current: 1, total: 3 });
        assert_eq!(hud.racers, 4);
        assert_eq!(hud.display_speed, 0);
        assert!(hud.active_problem.is_none());
        assert_eq!(hud.timer_label(), "00:00.00");
        assert_eq!(hud.cars.iter().filter(|c| c.is_player).count(), 1);
    }

    #[test]
    fn test_capture_open_problem() {
        let mut rng = ScriptedSource::constant(0.5);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        state.request_challenge(&mut rng);
        state.clock_ms += 2000.0;

        let hud = HudSnapshot::capture(&state);
        let problem = hud.active_problem.unwrap();
        assert_eq!(problem.remaining_ms, 6000);
        assert!((problem.remaining_fraction - 0.75).abs() < 1e-6);
        assert!(problem.prompt.contains('?'));
        assert_eq!(hud.next_problem_in_ms, None);
    }

    #[test]
    fn test_countdown_keeps_window_of_posed_problem() {
        let mut rng = ScriptedSource::constant(0.5);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.start();
        state.request_challenge(&mut rng);
        state.clock_ms += 1000.0;

        state.update_settings(Settings {
            answer_time_seconds: 3,
            ..Settings::default()
        });

        let problem = HudSnapshot::capture(&state).active_problem.unwrap();
        assert_eq!(problem.remaining_ms, 7000);
        assert!((problem.remaining_fraction - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_next_problem_countdown() {
        let mut rng = ScriptedSource::constant(0.5);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        assert_eq!(HudSnapshot::capture(&state).next_problem_in_ms, None);

        state.start();
        state.clock_ms += 4000.0;
        assert_eq!(HudSnapshot::capture(&state).next_problem_in_ms, Some(6000));
    }

    #[test]
    fn test_publish_forwards_events_then_renders() {
        let mut rng = ScriptedSource::constant(0.5);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        let mut sink = RecordingSink::default();

        let input = TickInput {
            start_race: true,
            ..Default::default()
        };
        tick(&mut state, &input, &mut rng, 16.0);
        publish(&mut state, &mut sink);

        assert_eq!(sink.events.first(), Some(&GameEvent::RaceStarted));
        assert_eq!(sink.frames.len(), 1);
        assert_eq!(sink.frames[0].phase, RacePhase::Running);

        let seen = sink.events.len();
        publish(&mut state, &mut sink);
        assert_eq!(sink.frames.len(), 2);
        assert_eq!(sink.events.len(), seen);
    }

    #[test]
    fn test_rank_label() {
        let mut rng = ScriptedSource::constant(0.5);
        let mut state = RaceState::new(Settings::default(), &mut rng);
        state.player_rank = 3;
        assert_eq!(HudSnapshot::capture(&state).rank_label(), "3rd");
    }

    #[test]
    fn test_camera_follow() {
        let mut camera = Camera::default();
        camera.follow(100.0, 1000.0);
        assert_eq!(camera.offset, 0.0);

        camera.follow(1300.0, 1000.0);
        assert_eq!(camera.offset, 1000.0);
        assert_eq!(camera.parallax_offset(), 500.0);

        let car = CarView {
            position: 1300.4,
            lane: 3,
            rank: 1,
            is_player: true,
            boost_active: false,
        };
        assert_eq!(camera.car_point(&car, 40.0), Vec2::new(300.0, 80.0));
    }
}
