//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed.
//! Which effect a game event plays is decided on every target; the synth
//! itself only exists on wasm32.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Lights out
    RaceStart,
    /// A problem pops up
    ProblemAppear,
    /// Correct answer
    Correct,
    /// Wrong answer
    Wrong,
    /// Answer time ran out
    Timeout,
    /// Turbo kicks in
    Turbo,
    /// Player completed a lap
    LapComplete,
    /// Player moved into first place
    TakeLead,
    /// Race won
    Win,
    /// Race lost
    Lose,
}

impl SoundEffect {
    /// Effect to play for a game event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        use crate::sim::RaceOutcome;

        match event {
            GameEvent::RaceStarted => Some(Self::RaceStart),
            GameEvent::ChallengeOpened { .. } => Some(Self::ProblemAppear),
            GameEvent::AnswerCorrect => Some(Self::Correct),
            GameEvent::AnswerWrong { .. } => Some(Self::Wrong),
            GameEvent::ChallengeTimedOut { .. } => Some(Self::Timeout),
            GameEvent::TurboStarted => Some(Self::Turbo),
            GameEvent::LapCompleted { .. } => Some(Self::LapComplete),
            GameEvent::RankChanged { rank: 1 } => Some(Self::TakeLead),
            GameEvent::RaceFinished(result) => Some(match result.outcome {
                RaceOutcome::Win => Self::Win,
                RaceOutcome::Loss => Self::Lose,
            }),
            GameEvent::TurboEnded | GameEvent::RankChanged { .. } => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use synth::AudioManager;

#[cfg(target_arch = "wasm32")]
mod synth {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
        enabled: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: 0.6,
                enabled: true,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Follows `Settings::sound_enabled`
        pub fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            if !self.enabled || self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let vol = self.volume;
            match effect {
                SoundEffect::RaceStart => self.play_arpeggio(ctx, vol, &[392.0, 392.0, 784.0], 0.25),
                SoundEffect::ProblemAppear => self.play_blip(ctx, vol * 0.5, 660.0, 880.0, 0.12),
                SoundEffect::Correct => self.play_arpeggio(ctx, vol, &[523.25, 659.25, 783.99], 0.08),
                SoundEffect::Wrong => self.play_buzz(ctx, vol, 180.0, 0.3),
                SoundEffect::Timeout => self.play_buzz(ctx, vol, 120.0, 0.45),
                SoundEffect::Turbo => self.play_turbo(ctx, vol),
                SoundEffect::LapComplete => self.play_blip(ctx, vol * 0.6, 880.0, 1320.0, 0.15),
                SoundEffect::TakeLead => self.play_blip(ctx, vol * 0.4, 990.0, 1480.0, 0.1),
                SoundEffect::Win => {
                    self.play_arpeggio(ctx, vol, &[523.25, 659.25, 783.99, 1046.5], 0.15)
                }
                SoundEffect::Lose => self.play_arpeggio(ctx, vol, &[392.0, 311.13, 261.63], 0.25),
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Short pitch sweep
        fn play_blip(&self, ctx: &AudioContext, vol: f32, from: f32, to: f32, len: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, from, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + len * 0.8)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }

        /// Notes played one after another
        fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64) {
            let t = ctx.current_time();
            for (i, &freq) in notes.iter().enumerate() {
                let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Triangle) else {
                    continue;
                };
                let start = t + i as f64 * step;
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain().set_value_at_time(vol * 0.4, start).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, start + step * 1.5)
                    .ok();
                osc.start_with_when(start).ok();
                osc.stop_with_when(start + step * 1.6).ok();
            }
        }

        /// Low square buzz
        fn play_buzz(&self, ctx: &AudioContext, vol: f32, freq: f32, len: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();
            osc.frequency().set_value_at_time(freq, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(freq * 0.7, t + len)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }

        /// Engine roar rising in pitch
        fn play_turbo(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 90.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.8)
                    .ok();
                osc.frequency().set_value_at_time(90.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(420.0, t + 0.6)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.85).ok();
            }

            // Whoosh on top
            if let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.15, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                    .ok();
                osc.frequency().set_value_at_time(1200.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(2400.0, t + 0.3)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.45).ok();
            }
        }
    }
}
