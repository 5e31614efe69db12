//! Fixed-step simulation clock

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Relative slack when deciding whether `horizon / step` is a whole number
const TICK_COUNT_TOLERANCE: f64 = 1e-9;

/// Largest tick count whose `k * step` products stay exact integers in f64
pub const MAX_TICKS: u64 = 1 << 53;

/// Simulation time, advanced by exactly one step per tick
///
/// Time after `k` ticks is `k * step`, so long runs do not accumulate
/// rounding drift from repeated addition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    step: f64,
    horizon: f64,
    ticks: u64,
    total_ticks: u64,
}

impl SimulationClock {
    /// Validate `step > 0` and `horizon >= 0`
    pub fn new(step: f64, horizon: f64) -> Result<Self, ConfigurationError> {
        if !step.is_finite() {
            return Err(ConfigurationError::NonFiniteStep(step));
        }
        if step <= 0.0 {
            return Err(ConfigurationError::NonPositiveStep(step));
        }
        if !horizon.is_finite() {
            return Err(ConfigurationError::NonFiniteHorizon(horizon));
        }
        if horizon < 0.0 {
            return Err(ConfigurationError::NegativeHorizon(horizon));
        }

        let total_ticks = tick_count(step, horizon).ok_or(ConfigurationError::TooManyTicks {
            step,
            horizon,
            max: MAX_TICKS,
        })?;

        Ok(Self {
            step,
            horizon,
            ticks: 0,
            total_ticks,
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Ticks taken so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks needed to reach the horizon
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn current_time(&self) -> f64 {
        self.ticks as f64 * self.step
    }

    /// `current_time >= horizon`
    pub fn is_finished(&self) -> bool {
        self.ticks >= self.total_ticks
    }

    /// Advance one step and return the new time
    pub fn tick(&mut self) -> f64 {
        self.ticks += 1;
        self.current_time()
    }
}

/// Smallest `k` with `k * step >= horizon`, treating near-integral ratios as exact
///
/// `None` when the count would exceed [`MAX_TICKS`].
fn tick_count(step: f64, horizon: f64) -> Option<u64> {
    let ratio = horizon / step;
    if !ratio.is_finite() || ratio > MAX_TICKS as f64 {
        return None;
    }
    let nearest = ratio.round();
    let ticks = if (ratio - nearest).abs() <= TICK_COUNT_TOLERANCE * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    Some(ticks as u64)
}
