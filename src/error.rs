//! Error taxonomy for the simulation core
//!
//! Configuration problems are fatal before a run starts, worker failures are
//! fatal mid-run. Data-quality issues are not errors; see
//! [`crate::sim::DataQualityWarning`].

use crate::sim::BodyId;

/// Rejected run configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("time step must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("time step must be finite, got {0}")]
    NonFiniteStep(f64),

    #[error("horizon must not be negative, got {0}")]
    NegativeHorizon(f64),

    #[error("horizon must be finite, got {0}")]
    NonFiniteHorizon(f64),

    #[error("horizon {horizon} needs more than {max} steps of {step}")]
    TooManyTicks { step: f64, horizon: f64, max: u64 },

    #[error("time step {step} cannot be written with {decimals} decimals; raise time_decimals")]
    StepFinerThanOutput { step: f64, decimals: usize },

    #[error("body set is empty")]
    EmptyBodySet,

    #[error("body id {0} appears more than once")]
    DuplicateBodyId(BodyId),

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("grid cell size must be positive and finite, got {0}")]
    NonPositiveCellSize(f64),
}

/// A pairwise-check task that aborted instead of returning its chunk
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("worker for chunk {chunk} failed at step {step}: {message}")]
pub struct WorkerFailure {
    pub step: u64,
    pub chunk: usize,
    pub message: String,
}

/// Fatal simulation errors surfaced to the caller
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Worker(#[from] WorkerFailure),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("orchestrator cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

pub type SimResult<T> = Result<T, SimError>;
