//! Constant-velocity position update

use super::body::{Body, Snapshot};
use super::clock::SimulationClock;

/// Move every body by `velocity * dt`
///
/// `dt > 0` is checked once when the clock is built, not here.
#[inline]
pub fn advance(bodies: &mut [Body], dt: f64) {
    for body in bodies.iter_mut() {
        body.pos += body.vel * dt;
    }
}

/// Owns the clock and is the only place bodies are mutated
#[derive(Debug, Clone)]
pub struct Stepper {
    clock: SimulationClock,
}

impl Stepper {
    pub fn new(clock: SimulationClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Advance bodies and time by one step, returning the new time
    pub fn tick(&mut self, bodies: &mut [Body]) -> f64 {
        advance(bodies, self.clock.step());
        self.clock.tick()
    }

    /// Read-only view of `bodies` tagged with the current tick and time
    pub fn snapshot<'a>(&self, bodies: &'a [Body]) -> Snapshot<'a> {
        Snapshot::new(self.clock.ticks(), self.clock.current_time(), bodies)
    }
}
