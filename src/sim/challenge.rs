//! Math challenge engine
//!
//! Poses one multiplication fact with one slot hidden, and judges answers.

use serde::{Deserialize, Serialize};

use super::rng::UniformSource;
use crate::consts::BLANK_PRODUCT_CHANCE;
use crate::settings::Settings;

/// Which part of `a × b = p` the player must supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlankSlot {
    OperandA,
    OperandB,
    Product,
}

/// How a challenge was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeOutcome {
    Success,
    Failure,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathProblem {
    pub operand_a: u32,
    pub operand_b: u32,
    pub correct_answer: u32,
    pub blank_slot: BlankSlot,
    /// Session-clock time the answer is due
    pub deadline_ms: f64,
    /// Answer time granted when the problem was posed
    pub window_ms: f64,
}

impl MathProblem {
    /// A problem posed at `issued_ms`, due `window_ms` later
    pub fn new(
        operand_a: u32,
        operand_b: u32,
        blank_slot: BlankSlot,
        issued_ms: f64,
        window_ms: f64,
    ) -> Self {
        let window_ms = window_ms.max(0.0);
        Self {
            operand_a,
            operand_b,
            correct_answer: operand_a * operand_b,
            blank_slot,
            deadline_ms: issued_ms + window_ms,
            window_ms,
        }
    }

    /// The value the player has to type
    pub fn hidden_value(&self) -> u32 {
        match self.blank_slot {
            BlankSlot::OperandA => self.operand_a,
            BlankSlot::OperandB => self.operand_b,
            BlankSlot::Product => self.correct_answer,
        }
    }

    /// Prompt with the blank shown as `?`, e.g. `7 × ? = 56`
    pub fn prompt(&self) -> String {
        let show = |slot: BlankSlot, value: u32| {
            if self.blank_slot == slot {
                "?".to_string()
            } else {
                value.to_string()
            }
        };
        format!(
            "{} × {} = {}",
            show(BlankSlot::OperandA, self.operand_a),
            show(BlankSlot::OperandB, self.operand_b),
            show(BlankSlot::Product, self.correct_answer)
        )
    }

    /// Digits in the expected answer
    pub fn answer_digits(&self) -> usize {
        self.hidden_value().to_string().len()
    }

    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        if self.is_expired(now_ms) {
            0.0
        } else {
            self.deadline_ms - now_ms
        }
    }

    /// Share of this problem's own answer window still left (1.0 = just posed).
    /// Unaffected by settings changed after the problem was posed.
    pub fn remaining_fraction(&self, now_ms: f64) -> f32 {
        if self.window_ms <= 0.0 {
            return 0.0;
        }
        (self.remaining_ms(now_ms) / self.window_ms).clamp(0.0, 1.0) as f32
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms >= self.deadline_ms
    }
}

/// Uniform integer in [lo, hi]
fn draw_in(rng: &mut dyn UniformSource, lo: u32, hi: u32) -> u32 {
    let span = (hi - lo + 1) as f32;
    (lo + (rng.next_unit() * span) as u32).min(hi)
}

/// Pose a new problem within the configured multiplier bounds
pub fn generate(settings: &Settings, rng: &mut dyn UniformSource, now_ms: f64) -> MathProblem {
    let settings = settings.sanitized();
    let lo = settings.min_multiplier;
    let hi = settings.max_multiplier;

    let a = draw_in(rng, lo, hi);
    let b = draw_in(rng, lo, hi);

    let roll = rng.next_unit();
    let operand_share = (1.0 - BLANK_PRODUCT_CHANCE) / 2.0;
    let blank_slot = if roll < BLANK_PRODUCT_CHANCE {
        BlankSlot::Product
    } else if roll < BLANK_PRODUCT_CHANCE + operand_share {
        BlankSlot::OperandA
    } else {
        BlankSlot::OperandB
    };

    let window_ms = settings.answer_time_seconds as f64 * 1000.0;
    MathProblem::new(a, b, blank_slot, now_ms, window_ms)
}

/// Judge a candidate value against the hidden slot
pub fn check(problem: &MathProblem, candidate: u32) -> ChallengeOutcome {
    if candidate == problem.hidden_value() {
        ChallengeOutcome::Success
    } else {
        ChallengeOutcome::Failure
    }
}

/// Parse raw typed input. Non-numeric input counts as no answer.
pub fn parse_answer(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// An entry is judged only once it has as many digits as the answer
pub fn entry_complete(problem: &MathProblem, raw: &str) -> bool {
    raw.trim().chars().filter(|c| c.is_ascii_digit()).count() >= problem.answer_digits()
}

/// Judge a typed entry. `None` means keep waiting (incomplete or not a number).
pub fn evaluate_entry(problem: &MathProblem, raw: &str) -> Option<ChallengeOutcome> {
    let candidate = parse_answer(raw)?;
    if !entry_complete(problem, raw) {
        return None;
    }
    Some(check(problem, candidate))
}
