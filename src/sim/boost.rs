//! Boost / turbo controller
//!
//! Charge fills to 100 to arm the boost; activating it spends the charge and
//! multiplies the player's base speed for a fixed window. The pre-boost base
//! speed is saved and put back exactly when the window ends.

use serde::{Deserialize, Serialize};

use super::state::Car;
use crate::consts::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostState {
    /// Boost may be activated. Never true while a turbo is running.
    pub ready: bool,
    /// 0..=100; ignored while a turbo is running
    pub charge: u8,
    /// Session-clock time the running turbo ends
    pub turbo_expiry_ms: Option<f64>,
    /// Base speed before the turbo multiplier was applied
    saved_base_speed: Option<f32>,
}

impl BoostState {
    pub fn turbo_active(&self) -> bool {
        self.turbo_expiry_ms.is_some()
    }

    /// Add (or drain, if negative) charge. Returns true if this call armed the boost.
    pub fn charge_tick(&mut self, amount: i16) -> bool {
        if self.turbo_active() {
            return false;
        }
        let was_ready = self.ready;
        let charge = (self.charge as i16 + amount).clamp(0, MAX_CHARGE as i16);
        self.charge = charge as u8;
        self.ready = self.charge == MAX_CHARGE;
        self.ready && !was_ready
    }

    /// Spend a full charge on a turbo window starting at `now_ms`
    pub fn activate_turbo(&mut self, car: &mut Car, now_ms: f64) -> bool {
        if !self.ready {
            log::debug!("Turbo requested without a full charge");
            return false;
        }
        self.ready = false;
        self.charge = 0;
        self.turbo_expiry_ms = Some(now_ms + TURBO_DURATION_MS);
        self.saved_base_speed = Some(car.base_speed);
        car.base_speed *= TURBO_MULTIPLIER;
        car.boost_active = true;
        true
    }

    /// End the turbo window, restoring the saved base speed
    pub fn expire_turbo(&mut self, car: &mut Car) -> bool {
        if self.turbo_expiry_ms.take().is_none() {
            return false;
        }
        if let Some(base) = self.saved_base_speed.take() {
            car.base_speed = base;
        }
        car.boost_active = false;
        true
    }

    /// Time left on the running turbo
    pub fn turbo_remaining_ms(&self, now_ms: f64) -> f64 {
        self.turbo_expiry_ms
            .map(|t| (t - now_ms).max(0.0))
            .unwrap_or(0.0)
    }
}
