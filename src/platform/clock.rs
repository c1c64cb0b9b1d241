//! Frame clock
//!
//! Turns the monotonically increasing timestamps delivered once per display
//! refresh into clamped frame durations.

use crate::consts::{FRAME_MS, MAX_FRAME_MS};

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_timestamp_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the previous frame. The first frame counts as one
    /// reference frame; long stalls are clamped; a timestamp going backwards
    /// yields zero.
    pub fn frame_ms(&mut self, timestamp_ms: f64) -> f64 {
        let elapsed = match self.last_timestamp_ms {
            Some(last) => (timestamp_ms - last).clamp(0.0, MAX_FRAME_MS),
            None => FRAME_MS,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        elapsed
    }

    /// Forget the previous timestamp (e.g. after the tab was hidden)
    pub fn reset(&mut self) {
        self.last_timestamp_ms = None;
    }
}

/// Frame duration expressed in reference frames
pub fn frames(frame_ms: f64) -> f32 {
    (frame_ms / FRAME_MS) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_one_reference_frame() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame_ms(5000.0), FRAME_MS);
        assert_eq!(clock.frame_ms(5020.0), 20.0);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut clock = FrameClock::new();
        clock.frame_ms(0.0);
        assert_eq!(clock.frame_ms(3000.0), MAX_FRAME_MS);
        assert_eq!(clock.frame_ms(2000.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::new();
        clock.frame_ms(0.0);
        clock.reset();
        assert_eq!(clock.frame_ms(10_000.0), FRAME_MS);
    }

    #[test]
    fn test_frames() {
        assert!((frames(FRAME_MS) - 1.0).abs() < 1e-6);
        assert!((frames(FRAME_MS * 2.0) - 2.0).abs() < 1e-6);
    }
}
