//! Run settings
//!
//! Loaded from an optional JSON file; any missing field takes its default.
//! The CLI overrides individual values on top.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigurationError, SimResult};
use crate::sim::{GridEvaluator, PairEvaluator, ParallelEvaluator, ReportPolicy, SimulationClock};

/// Relative slack when checking that a step prints exactly at the output precision
const DECIMAL_TOLERANCE: f64 = 1e-9;

/// Whether every multiple of `step` prints distinctly with `decimals` digits
fn step_fits_decimals(step: f64, decimals: usize) -> bool {
    let scaled = step * 10f64.powi(decimals.min(i32::MAX as usize) as i32);
    if !scaled.is_finite() {
        return true;
    }
    let nearest = scaled.round();
    nearest >= 1.0 && (scaled - nearest).abs() <= DECIMAL_TOLERANCE * nearest
}

/// Candidate-pair strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BroadPhase {
    /// Test every pair
    #[default]
    BruteForce,
    /// Spatial hash with the given cell edge length
    Grid { cell_size: f64 },
}

impl BroadPhase {
    pub fn grid() -> Self {
        BroadPhase::Grid {
            cell_size: DEFAULT_GRID_CELL_SIZE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Time increment per tick
    pub time_step: f64,
    /// Simulated time to reach
    pub horizon: f64,
    /// Worker pool size (clamped to hardware concurrency)
    pub workers: usize,
    /// Repeat-overlap reporting
    pub report_policy: ReportPolicy,
    pub broad_phase: BroadPhase,
    /// Decimals for times in the collision output
    pub time_decimals: usize,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            horizon: DEFAULT_HORIZON,
            workers: crate::default_worker_count(),
            report_policy: ReportPolicy::EveryStep,
            broad_phase: BroadPhase::BruteForce,
            time_decimals: DEFAULT_TIME_DECIMALS,
        }
    }
}

impl SimSettings {
    /// Check every field and build the run clock
    pub fn clock(&self) -> Result<SimulationClock, ConfigurationError> {
        if self.workers == 0 {
            return Err(ConfigurationError::ZeroWorkers);
        }
        if let BroadPhase::Grid { cell_size } = self.broad_phase {
            if !(cell_size.is_finite() && cell_size > 0.0) {
                return Err(ConfigurationError::NonPositiveCellSize(cell_size));
            }
        }
        let clock = SimulationClock::new(self.time_step, self.horizon)?;
        if !step_fits_decimals(self.time_step, self.time_decimals) {
            return Err(ConfigurationError::StepFinerThanOutput {
                step: self.time_step,
                decimals: self.time_decimals,
            });
        }
        Ok(clock)
    }

    /// Evaluator for this run; its worker pool lives as long as the evaluator
    pub fn build_evaluator(&self) -> SimResult<Box<dyn PairEvaluator>> {
        let evaluator: Box<dyn PairEvaluator> = match self.broad_phase {
            BroadPhase::BruteForce => Box::new(ParallelEvaluator::new(self.workers)?),
            BroadPhase::Grid { cell_size } => Box::new(GridEvaluator::new(self.workers, cell_size)?),
        };
        Ok(evaluator)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
