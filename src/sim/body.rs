//! Bodies and per-step snapshots
//!
//! A body is fixed-shape and validated at load time. Only the stepper moves
//! it; evaluators see it through a [`Snapshot`].

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Stable identity of a body for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub i64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A circular asteroid moving at constant velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
}

impl Body {
    pub fn new(id: i64, pos: DVec2, vel: DVec2, radius: f64) -> Self {
        Self {
            id: BodyId(id),
            pos,
            vel,
            radius,
        }
    }

    /// Position and radius are usable for overlap tests
    #[inline]
    pub fn is_measurable(&self) -> bool {
        self.pos.is_finite() && self.radius.is_finite()
    }

    /// Circles overlap or touch (tangency counts)
    ///
    /// Non-finite geometry on either side never collides.
    #[inline]
    pub fn overlaps(&self, other: &Body) -> bool {
        if !self.is_measurable() || !other.is_measurable() {
            return false;
        }
        self.pos.distance(other.pos) <= self.radius + other.radius
    }

    /// Every non-finite field on this body
    pub fn quality_warnings(&self) -> Vec<DataQualityWarning> {
        let checks = [
            (BodyField::PositionX, self.pos.x),
            (BodyField::PositionY, self.pos.y),
            (BodyField::VelocityX, self.vel.x),
            (BodyField::VelocityY, self.vel.y),
            (BodyField::Radius, self.radius),
        ];
        checks
            .into_iter()
            .filter(|(_, value)| !value.is_finite())
            .map(|(field, value)| DataQualityWarning {
                id: self.id,
                field,
                value,
            })
            .collect()
    }
}

/// Numeric field of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyField {
    PositionX,
    PositionY,
    VelocityX,
    VelocityY,
    Radius,
}

impl BodyField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyField::PositionX => "x",
            BodyField::PositionY => "y",
            BodyField::VelocityX => "vx",
            BodyField::VelocityY => "vy",
            BodyField::Radius => "radius",
        }
    }
}

/// Non-fatal: a body carries a NaN or infinite value
///
/// Pairs involving the body never report a collision; the run continues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub id: BodyId,
    pub field: BodyField,
    pub value: f64,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "body {} has non-finite {} ({})",
            self.id,
            self.field.as_str(),
            self.value
        )
    }
}

/// Read-only view of all bodies at one step
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Tick index (0 = initial conditions)
    pub step: u64,
    /// Simulation time of this snapshot
    pub time: f64,
    pub bodies: &'a [Body],
}

impl<'a> Snapshot<'a> {
    pub fn new(step: u64, time: f64, bodies: &'a [Body]) -> Self {
        Self { step, time, bodies }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
