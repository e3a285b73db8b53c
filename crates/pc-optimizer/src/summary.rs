//! Diagnostics recorded for every selection call.

use chrono::{DateTime, Utc};
use pc_types::{Configuration, Origin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique selection call identifier.
pub type SelectionId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub id: SelectionId,
    pub selector: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Incumbent value the acquisition was updated with.
    pub eta: f64,

    pub local_search_starts: usize,
    pub exploit_count: usize,
    pub explore_count: usize,

    /// Acquisition value of the best exploitation candidate.
    pub best_acquisition_value: Option<f64>,

    /// How many returned challengers came from each generator.
    pub origins: BTreeMap<Origin, usize>,
}

impl SelectionSummary {
    pub fn start(selector: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            selector: selector.to_string(),
            started_at: Utc::now(),
            duration_ms: 0,
            eta: 0.0,
            local_search_starts: 0,
            exploit_count: 0,
            explore_count: 0,
            best_acquisition_value: None,
            origins: BTreeMap::new(),
        }
    }

    /// Record the returned challengers and stop the clock.
    pub fn finish(&mut self, challengers: &[Configuration]) {
        self.origins.clear();
        for config in challengers {
            *self.origins.entry(config.origin()).or_insert(0) += 1;
        }
        self.duration_ms = (Utc::now() - self.started_at).num_milliseconds().max(0) as u64;
    }

    pub fn challenger_count(&self) -> usize {
        self.origins.values().sum()
    }

    pub fn count(&self, origin: Origin) -> usize {
        self.origins.get(&origin).copied().unwrap_or(0)
    }
}
