//! Spatial-hash broad phase
//!
//! Bodies are bucketed into square cells and each occupied cell is compared
//! with itself and its 8 neighbours. Cells are at least as wide as the
//! largest possible contact distance (`2 * max_radius`), so any colliding
//! pair lands in adjacent cells and the result matches the brute-force scan.

use std::collections::HashMap;

use super::body::{Body, Snapshot};
use super::event::CollisionEvent;
use super::pairs::{PairEvaluator, WorkerPool, merge_sorted};
use crate::error::{ConfigurationError, SimError, WorkerFailure};

type CellKey = (i64, i64);

const CELL_SLACK: f64 = 1e-9;

const NEIGHBOR_OFFSETS: [(i64, i64); 9] = [
    (0, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[inline]
fn cell_of(body: &Body, cell_size: f64) -> CellKey {
    (
        (body.pos.x / cell_size).floor() as i64,
        (body.pos.y / cell_size).floor() as i64,
    )
}

fn neighbor(cell: CellKey, offset: (i64, i64)) -> Option<CellKey> {
    Some((cell.0.checked_add(offset.0)?, cell.1.checked_add(offset.1)?))
}

/// Bucketed body indices for one snapshot
struct SpatialGrid {
    cells: HashMap<CellKey, Vec<usize>>,
    /// Occupied cells in sorted order, the unit of parallel work
    order: Vec<CellKey>,
}

impl SpatialGrid {
    fn build(bodies: &[Body], cell_size: f64) -> Self {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (idx, body) in bodies.iter().enumerate() {
            // Non-finite bodies cannot collide and would hash to garbage cells
            if body.is_measurable() {
                cells.entry(cell_of(body, cell_size)).or_default().push(idx);
            }
        }
        let mut order: Vec<CellKey> = cells.keys().copied().collect();
        order.sort_unstable();
        Self { cells, order }
    }

    /// Pairs with one member in `cell`, emitted only from the lower-id side
    fn collisions_around(&self, cell: CellKey, bodies: &[Body], time: f64) -> Vec<CollisionEvent> {
        let mut hits = Vec::new();
        let Some(home) = self.cells.get(&cell) else {
            return hits;
        };

        for offset in NEIGHBOR_OFFSETS {
            let Some(other) = neighbor(cell, offset).and_then(|key| self.cells.get(&key)) else {
                continue;
            };
            for &i in home {
                for &j in other {
                    let (a, b) = (&bodies[i], &bodies[j]);
                    if a.id < b.id && a.overlaps(b) {
                        hits.push(CollisionEvent::new(time, a.id, b.id));
                    }
                }
            }
        }
        hits
    }
}

/// Grid broad phase over a worker pool
pub struct GridEvaluator {
    pool: WorkerPool,
    cell_size: f64,
}

impl GridEvaluator {
    pub fn new(workers: usize, cell_size: f64) -> Result<Self, SimError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigurationError::NonPositiveCellSize(cell_size).into());
        }
        Ok(Self {
            pool: WorkerPool::new(workers)?,
            cell_size,
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Configured cell size, widened to cover the largest contact distance
    fn effective_cell_size(&self, bodies: &[Body]) -> f64 {
        let max_radius = bodies
            .iter()
            .filter(|b| b.is_measurable())
            .map(|b| b.radius)
            .fold(0.0_f64, f64::max);
        // Slack keeps tangent pairs within one cell after rounding in `floor(x / size)`
        self.cell_size.max(2.0 * max_radius * (1.0 + CELL_SLACK))
    }
}

impl PairEvaluator for GridEvaluator {
    fn find_collisions(
        &self,
        snapshot: &Snapshot<'_>,
    ) -> Result<Vec<CollisionEvent>, WorkerFailure> {
        let bodies = snapshot.bodies;
        let time = snapshot.time;
        let grid = SpatialGrid::build(bodies, self.effective_cell_size(bodies));

        let parts = self
            .pool
            .map_ranges(grid.order.len(), |range| {
                grid.order[range]
                    .iter()
                    .flat_map(|&cell| grid.collisions_around(cell, bodies, time))
                    .collect::<Vec<_>>()
            })
            .map_err(|failed| failed.at_step(snapshot.step))?;
        Ok(merge_sorted(parts))
    }

    fn name(&self) -> &'static str {
        "grid"
    }
}
