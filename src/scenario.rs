//! Seeded asteroid field generation
//!
//! Same seed and parameters always give the same field, so generated inputs
//! can be used to reproduce runs and to compare worker pool sizes.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::Body;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("field extent must be positive and finite, got {0}")]
    Extent(f64),

    #[error("max speed must be non-negative and finite, got {0}")]
    Speed(f64),

    #[error("radius range must satisfy 0 < min <= max, got {min}..{max}")]
    Radius { min: f64, max: f64 },
}

/// Shape of a generated field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Positions fall in `[0, extent]` on both axes
    pub extent: f64,
    /// Velocity components fall in `[-max_speed, max_speed]`
    pub max_speed: f64,
    pub min_radius: f64,
    pub max_radius: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            extent: 1000.0,
            max_speed: 5.0,
            min_radius: 1.0,
            max_radius: 20.0,
        }
    }
}

impl FieldParams {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(ScenarioError::Extent(self.extent));
        }
        if !(self.max_speed.is_finite() && self.max_speed >= 0.0) {
            return Err(ScenarioError::Speed(self.max_speed));
        }
        let radii_ok = self.min_radius.is_finite()
            && self.max_radius.is_finite()
            && self.min_radius > 0.0
            && self.min_radius <= self.max_radius;
        if !radii_ok {
            return Err(ScenarioError::Radius {
                min: self.min_radius,
                max: self.max_radius,
            });
        }
        Ok(())
    }
}

/// Generate `count` bodies with ids `1..=count`
pub fn generate(count: usize, seed: u64, params: &FieldParams) -> Result<Vec<Body>, ScenarioError> {
    params.validate()?;
    let mut rng = Pcg32::seed_from_u64(seed);

    let bodies = (1..=count as i64)
        .map(|id| {
            let pos = DVec2::new(
                rng.random_range(0.0..=params.extent),
                rng.random_range(0.0..=params.extent),
            );
            let vel = DVec2::new(
                rng.random_range(-params.max_speed..=params.max_speed),
                rng.random_range(-params.max_speed..=params.max_speed),
            );
            let radius = rng.random_range(params.min_radius..=params.max_radius);
            Body::new(id, pos, vel, radius)
        })
        .collect();

    log::debug!("Generated {} asteroids from seed {}", count, seed);
    Ok(bodies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_field() {
        let params = FieldParams::default();
        let a = generate(50, 42, &params).unwrap();
        let b = generate(50, 42, &params).unwrap();
        let c = generate(50, 43, &params).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fields_respect_bounds() {
        let params = FieldParams {
            extent: 200.0,
            max_speed: 2.0,
            min_radius: 3.0,
            max_radius: 6.0,
        };
        let bodies = generate(200, 7, &params).unwrap();
        assert_eq!(bodies.len(), 200);
        assert_eq!(bodies[0].id.0, 1);
        assert_eq!(bodies[199].id.0, 200);
        for b in &bodies {
            assert!((0.0..=200.0).contains(&b.pos.x) && (0.0..=200.0).contains(&b.pos.y));
            assert!(b.vel.x.abs() <= 2.0 && b.vel.y.abs() <= 2.0);
            assert!((3.0..=6.0).contains(&b.radius));
        }
    }

    #[test]
    fn test_invalid_params() {
        let bad = FieldParams {
            min_radius: 5.0,
            max_radius: 1.0,
            ..Default::default()
        };
        assert!(matches!(generate(3, 1, &bad), Err(ScenarioError::Radius { .. })));

        let flat = FieldParams {
            extent: 0.0,
            ..Default::default()
        };
        assert_eq!(generate(3, 1, &flat), Err(ScenarioError::Extent(0.0)));
    }
}
