use chrono::{DateTime, Utc};
use hybrid_common::{SourceName, SourceOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::summary::{Summary, summarize};

/// Outcome of one source within a fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceName,
    pub outcome: SourceOutcome,
    /// Wall time from dispatch to outcome (or to the deadline).
    pub elapsed_ms: u64,
}

/// Everything one invocation produced. Built once, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub id: Uuid,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    /// One record per requested source, in request order.
    pub outcomes: Vec<SourceReport>,
    pub summary: Summary,
}

impl AggregateReport {
    /// Stamp a new report and derive its summary from `outcomes`.
    pub fn new(query: impl Into<String>, outcomes: Vec<SourceReport>) -> Self {
        let summary = summarize(&outcomes);
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            timestamp: Utc::now(),
            outcomes,
            summary,
        }
    }

    pub fn outcome(&self, source: SourceName) -> Option<&SourceOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.source == source)
            .map(|r| &r.outcome)
    }

    pub fn succeeded(&self) -> Vec<SourceName> {
        self.outcomes
            .iter()
            .filter(|r| r.outcome.is_success())
            .map(|r| r.source)
            .collect()
    }

    pub fn failed(&self) -> Vec<SourceName> {
        self.outcomes
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.source)
            .collect()
    }

    pub fn all_failed(&self) -> bool {
        self.outcomes.iter().all(|r| !r.outcome.is_success())
    }
}
