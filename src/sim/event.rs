//! Collision records

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::body::BodyId;

/// Two bodies overlapping at a given time
///
/// Always stored with `id_low < id_high` so the pair identity does not
/// depend on which body was visited first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub time: f64,
    pub id_low: BodyId,
    pub id_high: BodyId,
}

impl CollisionEvent {
    /// Build an event for an unordered pair of distinct ids
    pub fn new(time: f64, a: BodyId, b: BodyId) -> Self {
        debug_assert_ne!(a, b, "a body cannot collide with itself");
        let (id_low, id_high) = if a < b { (a, b) } else { (b, a) };
        Self {
            time,
            id_low,
            id_high,
        }
    }

    /// Canonical pair identity
    #[inline]
    pub fn pair(&self) -> (BodyId, BodyId) {
        (self.id_low, self.id_high)
    }

    /// Log order: time first, then pair
    pub fn log_order(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.pair().cmp(&other.pair()))
    }
}

impl fmt::Display for CollisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.time, self.id_low, self.id_high)
    }
}
