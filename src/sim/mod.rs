//! Deterministic simulation module
//!
//! Everything here is pure and deterministic:
//! - Fixed timestep only
//! - Bodies mutated only by the stepper, between evaluations
//! - Stable output order (by time, then by body id pair)
//! - No file or platform dependencies

pub mod body;
pub mod clock;
pub mod collision_log;
pub mod event;
pub mod grid;
pub mod orchestrator;
pub mod pairs;
pub mod stepper;

pub use body::{Body, BodyField, BodyId, DataQualityWarning, Snapshot};
pub use clock::SimulationClock;
pub use collision_log::{CollisionLog, ReportPolicy};
pub use event::CollisionEvent;
pub use grid::GridEvaluator;
pub use orchestrator::{CancelToken, Orchestrator, RunPhase, RunReport};
pub use pairs::{
    ChunkPanic, PairEvaluator, ParallelEvaluator, SequentialEvaluator, WorkerPool, pair_count,
    split_ranges, unrank_pair,
};
pub use stepper::{Stepper, advance};
