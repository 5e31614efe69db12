//! Asteroid Sim - time-stepped collision detection for circular bodies
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stepping, pairwise scan, collision log)
//! - `persistence`: Text loader/writer for asteroid and collision records
//! - `settings`: Run configuration
//! - `scenario`: Seeded asteroid field generation
//! - `error`: Error taxonomy

pub mod error;
pub mod persistence;
pub mod scenario;
pub mod settings;
pub mod sim;

pub use error::{ConfigurationError, SimError, WorkerFailure};
pub use settings::{BroadPhase, SimSettings};

/// Simulation defaults
pub mod consts {
    /// Time increment per tick (seconds)
    pub const DEFAULT_TIME_STEP: f64 = 0.1;
    /// Total simulated time (seconds)
    pub const DEFAULT_HORIZON: f64 = 10.0;
    /// Spatial hash cell edge length
    pub const DEFAULT_GRID_CELL_SIZE: f64 = 50.0;
    /// Decimals used when writing collision times
    pub const DEFAULT_TIME_DECIMALS: usize = 1;
}

/// Number of workers the host can usefully run (never less than 1)
#[inline]
pub fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}
