//! Event records, the run log, outcome tracking, and trajectories
//!
//! Everything here is a passive value type. The stepper appends events in
//! step order; the experiment layer serializes one record per line and later
//! filters with the query helpers.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One recorded contact: the named pair and the step it began.
///
/// A persisting contact produces a single event at the step the pair first
/// overlapped, not one per step it stays in contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub objects: (String, String),
    pub step: u64,
}

impl ContactEvent {
    /// True if either side of the pair is `name`.
    pub fn involves(&self, name: &str) -> bool {
        self.objects.0 == name || self.objects.1 == name
    }

    /// Order-insensitive pair match.
    pub fn is_pair(&self, a: &str, b: &str) -> bool {
        (self.objects.0 == a && self.objects.1 == b)
            || (self.objects.0 == b && self.objects.1 == a)
    }
}

/// Ordered record of everything observable about one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    /// Marble-marble contacts, nondecreasing by step.
    pub collisions: Vec<ContactEvent>,
    /// Marble-wall contacts, nondecreasing by step.
    pub wall_bounces: Vec<ContactEvent>,
    /// Final exit classification per outcome-tracked body.
    pub outcome: BTreeMap<String, bool>,
    /// Minimum squared exit distance per outcome-tracked body.
    pub outcome_dists: BTreeMap<String, f32>,
}

impl EventLog {
    /// True if the two named bodies collided at any step, in either order.
    pub fn pair_collided(&self, a: &str, b: &str) -> bool {
        self.collisions.iter().any(|e| e.is_pair(a, b))
    }

    /// Step of the first marble-marble collision, if any.
    pub fn first_collision_step(&self) -> Option<u64> {
        self.collisions.first().map(|e| e.step)
    }

    /// Number of wall bounces involving `name` strictly before `step`.
    pub fn bounces_involving_before(&self, name: &str, step: u64) -> usize {
        self.wall_bounces
            .iter()
            .filter(|e| e.involves(name) && e.step < step)
            .count()
    }

    /// Serialize to a single JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Sampled positions and velocities for one recorded body, one entry per
/// simulated step, taken before that step's physics update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub position: Vec<Vec2>,
    pub velocity: Vec<Vec2>,
}

/// Running minimum of squared exit distance per tracked body.
///
/// The minimum starts at a caller-supplied upper bound and never increases,
/// so the closest approach survives even when the body later bounces away.
#[derive(Debug, Clone, Default)]
pub struct OutcomeTracker {
    min_dist_sq: BTreeMap<String, f32>,
}

impl OutcomeTracker {
    /// Start tracking `name`, initialized to `upper_bound`.
    pub fn track(&mut self, name: &str, upper_bound: f32) {
        self.min_dist_sq.insert(name.to_string(), upper_bound);
    }

    /// Fold one sample into the running minimum. Untracked names are ignored.
    pub fn observe(&mut self, name: &str, dist_sq: f32) {
        if let Some(min) = self.min_dist_sq.get_mut(name) {
            if dist_sq < *min {
                *min = dist_sq;
            }
        }
    }

    /// Current running minimum for `name`.
    pub fn min_dist_sq(&self, name: &str) -> Option<f32> {
        self.min_dist_sq.get(name).copied()
    }

    /// Consume the tracker into the final per-body minimums.
    pub fn into_dists(self) -> BTreeMap<String, f32> {
        self.min_dist_sq
    }
}

/// Everything a finished run returns: the event log plus recorded paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub events: EventLog,
    pub paths: BTreeMap<String, Trajectory>,
}

impl RunRecord {
    /// Serialize as one line for append-only results files.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
