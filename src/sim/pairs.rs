//! Pairwise overlap scan
//!
//! Every unordered pair of distinct bodies is tested once per step. Pairs are
//! numbered row-major over `i < j`, and that index space is cut into
//! contiguous chunks that run on a [`WorkerPool`] against the same read-only
//! snapshot. Chunk results are concatenated and sorted by pair, so output
//! never depends on which worker finished first.

use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use super::body::{Body, Snapshot};
use super::event::CollisionEvent;
use crate::error::{SimError, WorkerFailure};

/// Strategy for finding the overlapping pairs of one snapshot
pub trait PairEvaluator: Send + Sync {
    /// All colliding pairs at `snapshot.time`, sorted by `(id_low, id_high)`
    fn find_collisions(
        &self,
        snapshot: &Snapshot<'_>,
    ) -> Result<Vec<CollisionEvent>, WorkerFailure>;

    /// Strategy name for logs
    fn name(&self) -> &'static str;
}

/// Number of unordered pairs among `n` bodies
#[inline]
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Map a pair index back to `(i, j)` with `i < j`
pub fn unrank_pair(mut k: usize, n: usize) -> (usize, usize) {
    debug_assert!(k < pair_count(n), "pair index {k} out of range for {n} bodies");
    let mut i = 0;
    loop {
        let row = n - 1 - i;
        if k < row {
            return (i, i + 1 + k);
        }
        k -= row;
        i += 1;
    }
}

/// Cut `0..total` into at most `parts` contiguous ranges whose sizes differ by at most one
pub fn split_ranges(total: usize, parts: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let parts = parts.clamp(1, total);
    let base = total / parts;
    let extra = total % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for part in 0..parts {
        let len = base + usize::from(part < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Test the pairs numbered by `range`
fn scan_pairs(bodies: &[Body], range: Range<usize>, time: f64) -> Vec<CollisionEvent> {
    let mut hits = Vec::new();
    if range.is_empty() {
        return hits;
    }

    let n = bodies.len();
    let (mut i, mut j) = unrank_pair(range.start, n);
    for _ in range {
        let (a, b) = (&bodies[i], &bodies[j]);
        if a.overlaps(b) {
            hits.push(CollisionEvent::new(time, a.id, b.id));
        }
        j += 1;
        if j == n {
            i += 1;
            j = i + 1;
        }
    }
    hits
}

/// Concatenate per-chunk results into canonical pair order
pub(crate) fn merge_sorted(parts: Vec<Vec<CollisionEvent>>) -> Vec<CollisionEvent> {
    let mut merged: Vec<CollisionEvent> = parts.into_iter().flatten().collect();
    merged.sort_unstable_by_key(|e| e.pair());
    merged
}

/// A chunk task that panicked instead of returning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPanic {
    pub chunk: usize,
    pub message: String,
}

impl ChunkPanic {
    pub fn at_step(self, step: u64) -> WorkerFailure {
        WorkerFailure {
            step,
            chunk: self.chunk,
            message: self.message,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Fixed-size worker pool, created once per run and reused every step
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Pool of `requested` workers, clamped to `1..=hardware concurrency`
    pub fn new(requested: usize) -> Result<Self, SimError> {
        let workers = requested.clamp(1, crate::default_worker_count());
        if workers != requested {
            log::debug!("Worker count {} clamped to {}", requested, workers);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("pair-scan-{}", idx))
            .build()
            .map_err(|e| SimError::WorkerPool(e.to_string()))?;

        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` over contiguous chunks of `0..total`, one chunk per worker
    ///
    /// Results come back in chunk order. Blocks until every chunk is done;
    /// a panicking chunk is reported instead of unwinding into the caller.
    pub fn map_ranges<T, F>(&self, total: usize, f: F) -> Result<Vec<T>, ChunkPanic>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync,
    {
        let ranges = split_ranges(total, self.workers);
        let results: Vec<Result<T, ChunkPanic>> = self.pool.install(|| {
            ranges
                .into_par_iter()
                .enumerate()
                .map(|(chunk, range)| {
                    panic::catch_unwind(AssertUnwindSafe(|| f(range))).map_err(|payload| {
                        ChunkPanic {
                            chunk,
                            message: panic_message(payload.as_ref()),
                        }
                    })
                })
                .collect()
        });
        results.into_iter().collect()
    }
}

/// Single-threaded reference scan
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialEvaluator;

impl PairEvaluator for SequentialEvaluator {
    fn find_collisions(
        &self,
        snapshot: &Snapshot<'_>,
    ) -> Result<Vec<CollisionEvent>, WorkerFailure> {
        let total = pair_count(snapshot.len());
        let hits = scan_pairs(snapshot.bodies, 0..total, snapshot.time);
        Ok(merge_sorted(vec![hits]))
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Brute-force scan fanned out over a worker pool
pub struct ParallelEvaluator {
    pool: WorkerPool,
}

impl ParallelEvaluator {
    pub fn new(workers: usize) -> Result<Self, SimError> {
        Ok(Self {
            pool: WorkerPool::new(workers)?,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }
}

impl PairEvaluator for ParallelEvaluator {
    fn find_collisions(
        &self,
        snapshot: &Snapshot<'_>,
    ) -> Result<Vec<CollisionEvent>, WorkerFailure> {
        let bodies = snapshot.bodies;
        let time = snapshot.time;
        let parts = self
            .pool
            .map_ranges(pair_count(bodies.len()), |range| {
                scan_pairs(bodies, range, time)
            })
            .map_err(|failed| failed.at_step(snapshot.step))?;
        Ok(merge_sorted(parts))
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BodyId;
    use glam::DVec2;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn still(id: i64, x: f64, y: f64, r: f64) -> Body {
        Body::new(id, DVec2::new(x, y), DVec2::ZERO, r)
    }

    fn shared_parallel() -> &'static ParallelEvaluator {
        static EVALUATOR: OnceLock<ParallelEvaluator> = OnceLock::new();
        EVALUATOR.get_or_init(|| ParallelEvaluator::new(4).unwrap())
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(5), 10);
    }

    #[test]
    fn test_unrank_walks_row_major() {
        let n = 5;
        let expected: Vec<_> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        let actual: Vec<_> = (0..pair_count(n)).map(|k| unrank_pair(k, n)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_split_ranges_contiguous_and_balanced() {
        let ranges = split_ranges(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);

        // More parts than work collapses to one item per part
        assert_eq!(split_ranges(2, 8), vec![0..1, 1..2]);
        // Zero parts still yields one chunk
        assert_eq!(split_ranges(5, 0), vec![0..5]);
        assert!(split_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_scan_chunks_cover_every_pair() {
        let bodies: Vec<Body> = (0..6).map(|i| still(i, 0.0, 0.0, 1.0)).collect();
        let total = pair_count(bodies.len());
        let hits: Vec<_> = split_ranges(total, 4)
            .into_iter()
            .flat_map(|r| scan_pairs(&bodies, r, 0.0))
            .collect();
        assert_eq!(hits.len(), total);
    }

    #[test]
    fn test_sequential_finds_overlaps_in_pair_order() {
        let bodies = vec![
            still(30, 0.0, 0.0, 5.0),
            still(10, 8.0, 0.0, 3.0),   // touches 30
            still(20, 100.0, 0.0, 1.0), // alone
            still(5, 1.0, 1.0, 1.0),    // inside 30
        ];
        let snap = Snapshot::new(0, 0.0, &bodies);
        let events = SequentialEvaluator.find_collisions(&snap).unwrap();
        let pairs: Vec<_> = events.iter().map(|e| (e.id_low.0, e.id_high.0)).collect();
        assert_eq!(pairs, vec![(5, 30), (10, 30)]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let bodies: Vec<Body> = (0..40)
            .map(|i| {
                let f = i as f64;
                still(100 - i, (f * 7.3) % 50.0, (f * 3.1) % 40.0, 2.0 + (i % 3) as f64)
            })
            .collect();
        let snap = Snapshot::new(3, 0.3, &bodies);
        let seq = SequentialEvaluator.find_collisions(&snap).unwrap();
        let par = shared_parallel().find_collisions(&snap).unwrap();
        assert!(!seq.is_empty());
        assert_eq!(seq, par);
        assert!(par.iter().all(|e| e.time == 0.3));
    }

    #[test]
    fn test_single_and_empty_snapshots() {
        let one = vec![still(1, 0.0, 0.0, 1.0)];
        let snap = Snapshot::new(0, 0.0, &one);
        assert!(shared_parallel().find_collisions(&snap).unwrap().is_empty());

        let none: Vec<Body> = Vec::new();
        let snap = Snapshot::new(0, 0.0, &none);
        assert!(SequentialEvaluator.find_collisions(&snap).unwrap().is_empty());
    }

    #[test]
    fn test_nan_body_never_collides() {
        let bodies = vec![
            still(1, 0.0, 0.0, 10.0),
            still(2, f64::NAN, 0.0, 10.0),
            still(3, 1.0, 0.0, 10.0),
        ];
        let snap = Snapshot::new(0, 0.0, &bodies);
        let events = shared_parallel().find_collisions(&snap).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pair(), (BodyId(1), BodyId(3)));
    }

    #[test]
    fn test_map_ranges_reports_panicking_chunk() {
        let pool = WorkerPool::new(1).unwrap();
        let result = pool.map_ranges(10, |range| {
            if range.contains(&3) {
                panic!("bad chunk");
            }
            range.len()
        });
        let failure = result.unwrap_err();
        assert_eq!(failure.chunk, 0);
        assert_eq!(failure.message, "bad chunk");

        let failure = failure.at_step(12);
        assert_eq!(failure.step, 12);
    }

    #[test]
    fn test_map_ranges_preserves_chunk_order() {
        let pool = WorkerPool::new(4).unwrap();
        let starts = pool.map_ranges(100, |range| range.start).unwrap();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
        assert_eq!(starts[0], 0);
    }

    fn arb_bodies() -> impl Strategy<Value = Vec<Body>> {
        prop::collection::vec((-60.0..60.0f64, -60.0..60.0f64, 0.5..12.0f64), 0..40).prop_map(
            |raw| {
                let len = raw.len() as i64;
                raw.into_iter()
                    .enumerate()
                    .map(|(idx, (x, y, r))| still(len - idx as i64, x, y, r))
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_parallel_equals_sequential(bodies in arb_bodies()) {
            let snap = Snapshot::new(1, 0.1, &bodies);
            let seq = SequentialEvaluator.find_collisions(&snap).unwrap();
            let par = shared_parallel().find_collisions(&snap).unwrap();
            prop_assert_eq!(seq, par);
        }

        #[test]
        fn prop_output_is_canonical_and_sorted(bodies in arb_bodies()) {
            let snap = Snapshot::new(1, 0.1, &bodies);
            let events = shared_parallel().find_collisions(&snap).unwrap();
            for e in &events {
                prop_assert!(e.id_low < e.id_high);
            }
            for w in events.windows(2) {
                prop_assert!(w[0].pair() < w[1].pair());
            }
        }

        #[test]
        fn prop_collision_iff_within_radius_sum(bodies in arb_bodies()) {
            let snap = Snapshot::new(0, 0.0, &bodies);
            let events = SequentialEvaluator.find_collisions(&snap).unwrap();
            for (i, a) in bodies.iter().enumerate() {
                for b in &bodies[i + 1..] {
                    let expected = a.pos.distance(b.pos) <= a.radius + b.radius;
                    let key = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
                    let reported = events.iter().any(|e| e.pair() == key);
                    prop_assert_eq!(reported, expected);
                }
            }
        }
    }
}
