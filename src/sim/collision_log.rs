//! Ordered collision log
//!
//! Accumulates one batch of events per step, kept sorted by time and then by
//! pair. Whether a pair that stays in contact is reported on every step or
//! only when contact starts is a [`ReportPolicy`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::body::BodyId;
use super::event::CollisionEvent;

/// How persistent overlaps are reported across steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPolicy {
    /// One record per step while the pair overlaps
    #[default]
    EveryStep,
    /// One record at the first step of each contact episode
    EpisodeStart,
}

impl ReportPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPolicy::EveryStep => "every-step",
            ReportPolicy::EpisodeStart => "episode-start",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "every-step" | "step" => Some(ReportPolicy::EveryStep),
            "episode-start" | "episode" => Some(ReportPolicy::EpisodeStart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionLog {
    policy: ReportPolicy,
    events: Vec<CollisionEvent>,
    /// Pairs overlapping in the most recent recorded step
    touching: HashSet<(BodyId, BodyId)>,
}

impl CollisionLog {
    pub fn new(policy: ReportPolicy) -> Self {
        Self {
            policy,
            events: Vec::new(),
            touching: HashSet::new(),
        }
    }

    pub fn policy(&self) -> ReportPolicy {
        self.policy
    }

    /// Append one step's events; call once per step, even with an empty batch
    ///
    /// Returns how many records were appended.
    pub fn record(&mut self, mut batch: Vec<CollisionEvent>) -> usize {
        batch.sort_by(|a, b| a.log_order(b));
        batch.dedup_by(|a, b| a.time == b.time && a.pair() == b.pair());

        if self.policy == ReportPolicy::EpisodeStart {
            let current: HashSet<_> = batch.iter().map(|e| e.pair()).collect();
            batch.retain(|e| !self.touching.contains(&e.pair()));
            self.touching = current;
        }

        let appended = batch.len();
        let in_order = match (self.events.last(), batch.first()) {
            (Some(last), Some(first)) => last.log_order(first).is_le(),
            _ => true,
        };
        self.events.extend(batch);
        if !in_order {
            self.events.sort_by(|a, b| a.log_order(b));
        }
        appended
    }

    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The full ordered log; repeatable and side-effect free
    pub fn finalize(&self) -> Vec<CollisionEvent> {
        self.events.clone()
    }
}
