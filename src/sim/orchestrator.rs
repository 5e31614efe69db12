//! Step loop driving stepper, evaluator and log
//!
//! `Idle → Running → Finished`. Each iteration advances bodies, evaluates
//! the new snapshot and records the result. The initial conditions at
//! `t = 0` are evaluated before the first advance. Cancellation is honoured
//! only between steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use super::body::{Body, DataQualityWarning};
use super::clock::SimulationClock;
use super::collision_log::{CollisionLog, ReportPolicy};
use super::event::CollisionEvent;
use super::pairs::PairEvaluator;
use super::stepper::Stepper;
use crate::error::{ConfigurationError, SimError, SimResult};
use crate::settings::SimSettings;

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Configured, not started
    Idle,
    /// Step loop in progress
    Running,
    /// Terminal; bodies and log are frozen
    Finished,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Finished => "finished",
        }
    }
}

/// Cooperative stop request, checked at step boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of a completed or cancelled run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Finalized collision log
    pub events: Vec<CollisionEvent>,
    /// Ticks advanced after the initial evaluation
    pub steps: u64,
    pub final_time: f64,
    /// Stopped early by a cancel request; `events` is a valid partial log
    pub cancelled: bool,
    pub warnings: Vec<DataQualityWarning>,
    /// Steps whose evaluation had to be retried after a worker failure
    pub retries: u32,
}

pub struct Orchestrator {
    phase: RunPhase,
    bodies: Vec<Body>,
    stepper: Stepper,
    evaluator: Box<dyn PairEvaluator>,
    log: CollisionLog,
    warnings: Vec<DataQualityWarning>,
    retries: u32,
    cancel: CancelToken,
}

impl Orchestrator {
    /// Validate the body set and prepare an idle run
    ///
    /// Bodies with non-finite fields are accepted and reported as warnings.
    pub fn new(
        bodies: Vec<Body>,
        clock: SimulationClock,
        evaluator: Box<dyn PairEvaluator>,
        policy: ReportPolicy,
    ) -> SimResult<Self> {
        if bodies.is_empty() {
            return Err(ConfigurationError::EmptyBodySet.into());
        }
        let mut ids: Vec<_> = bodies.iter().map(|b| b.id).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigurationError::DuplicateBodyId(pair[0]).into());
        }

        let warnings: Vec<_> = bodies.iter().flat_map(|b| b.quality_warnings()).collect();
        for warning in &warnings {
            log::warn!("Data quality: {}; its pairs will never collide", warning);
        }

        Ok(Self {
            phase: RunPhase::Idle,
            bodies,
            stepper: Stepper::new(clock),
            evaluator,
            log: CollisionLog::new(policy),
            warnings,
            retries: 0,
            cancel: CancelToken::new(),
        })
    }

    /// Build clock and evaluator from settings
    pub fn from_settings(bodies: Vec<Body>, settings: &SimSettings) -> SimResult<Self> {
        let clock = settings.clock()?;
        let evaluator = settings.build_evaluator()?;
        Self::new(bodies, clock, evaluator, settings.report_policy)
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn clock(&self) -> &SimulationClock {
        self.stepper.clock()
    }

    pub fn log(&self) -> &CollisionLog {
        &self.log
    }

    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    /// Handle for requesting an early stop from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run from `t = 0` to the horizon (or until cancelled)
    pub fn run(&mut self) -> SimResult<RunReport> {
        if self.phase != RunPhase::Idle {
            return Err(SimError::InvalidState {
                action: "start a run",
                state: self.phase.as_str(),
            });
        }
        self.phase = RunPhase::Running;
        log::info!(
            "Simulating {} bodies: step {}, horizon {}, evaluator {}, policy {}",
            self.bodies.len(),
            self.clock().step(),
            self.clock().horizon(),
            self.evaluator.name(),
            self.log.policy().as_str()
        );

        let result = self.step_loop();
        self.phase = RunPhase::Finished;
        let cancelled = result?;

        log::info!(
            "Run finished after {} steps at t={}: {} collisions recorded",
            self.clock().ticks(),
            self.clock().current_time(),
            self.log.len()
        );

        Ok(RunReport {
            events: self.log.finalize(),
            steps: self.clock().ticks(),
            final_time: self.clock().current_time(),
            cancelled,
            warnings: self.warnings.clone(),
            retries: self.retries,
        })
    }

    /// Returns whether the loop stopped on a cancel request
    fn step_loop(&mut self) -> SimResult<bool> {
        self.evaluate_step()?;
        while !self.stepper.clock().is_finished() {
            if self.cancel.is_cancelled() {
                log::info!(
                    "Run cancelled at t={}; returning partial log",
                    self.clock().current_time()
                );
                return Ok(true);
            }
            self.stepper.tick(&mut self.bodies);
            self.evaluate_step()?;
        }
        Ok(false)
    }

    /// Evaluate the current snapshot, retrying once if a worker fails
    fn evaluate_step(&mut self) -> SimResult<usize> {
        let snapshot = self.stepper.snapshot(&self.bodies);
        let events = match self.evaluator.find_collisions(&snapshot) {
            Ok(events) => events,
            Err(failure) => {
                log::warn!("{}; retrying step once", failure);
                self.retries += 1;
                self.evaluator.find_collisions(&snapshot)?
            }
        };

        let appended = self.log.record(events);
        log::trace!(
            "Step {} (t={}): {} collisions",
            snapshot.step,
            snapshot.time,
            appended
        );
        Ok(appended)
    }
}
