//! Fan-out coordinator: one task per requested source, one outcome per source.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hybrid_common::{ErrorDetail, HybridError, SearchRequest, SourceName, SourceOutcome};
use hybrid_report::{AggregateReport, SourceReport};
use hybrid_sources::{CredentialStatus, SourceAdapter};
use tokio::time::Instant;

use crate::group::{DeadlineGroup, Joined, Settled};

/// Registry of adapters keyed by the source they serve.
#[derive(Clone, Default)]
pub struct Coordinator {
    adapters: HashMap<SourceName, Arc<dyn SourceAdapter>>,
}

enum Plan {
    Dispatch(Arc<dyn SourceAdapter>),
    /// `needs` names what would make the source usable.
    Skip { detail: ErrorDetail, needs: String },
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under its own [`SourceAdapter::name`], replacing
    /// any adapter already registered for that source.
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    /// Registered sources in priority order.
    pub fn sources(&self) -> Vec<SourceName> {
        let mut names: Vec<_> = self.adapters.keys().copied().collect();
        names.sort_by_key(SourceName::priority);
        names
    }

    /// Query every requested source concurrently and collect the report.
    ///
    /// Duplicate names collapse onto their first occurrence. Errors are only
    /// returned when nothing could be attempted; individual source failures
    /// are part of the report.
    pub async fn run(
        &self,
        request: &SearchRequest,
        sources: &[SourceName],
    ) -> Result<AggregateReport, HybridError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(HybridError::EmptyQuery);
        }

        let mut requested: Vec<SourceName> = Vec::with_capacity(sources.len());
        for source in sources {
            if !requested.contains(source) {
                requested.push(*source);
            }
        }
        if requested.is_empty() {
            return Err(HybridError::NoSourcesRequested);
        }

        let plans: Vec<Plan> = requested.iter().map(|s| self.plan(*s)).collect();
        if !plans.iter().any(|p| matches!(p, Plan::Dispatch(_))) {
            let mut missing: Vec<String> = Vec::new();
            for plan in &plans {
                if let Plan::Skip { needs, .. } = plan {
                    if !missing.contains(needs) {
                        missing.push(needs.clone());
                    }
                }
            }
            tracing::error!(sources = ?requested, missing = ?missing, "fanout.no_usable_sources");
            return Err(HybridError::MissingCredentials { missing });
        }

        let deadline = Instant::now() + request.deadline;
        tracing::info!(
            sources = ?requested,
            deadline_ms = request.deadline.as_millis() as u64,
            "fanout.start"
        );

        let mut group = DeadlineGroup::new();
        let mut skipped: Vec<Option<ErrorDetail>> = Vec::with_capacity(requested.len());
        for (source, plan) in requested.iter().zip(plans) {
            match plan {
                Plan::Dispatch(adapter) => {
                    let query = query.to_string();
                    let options = request.options.clone();
                    let timeout = request.deadline;
                    group.spawn(*source, async move {
                        adapter.fetch(&query, &options, timeout).await
                    });
                    skipped.push(None);
                }
                Plan::Skip { detail, .. } => {
                    tracing::warn!(%source, reason = %detail, "fanout.source.skipped");
                    skipped.push(Some(detail));
                }
            }
        }

        let mut settled = group.join_until(deadline).await.into_iter();
        let mut outcomes = Vec::with_capacity(requested.len());
        for (source, skip) in requested.iter().zip(skipped) {
            let report = match skip {
                Some(detail) => SourceReport {
                    source: *source,
                    outcome: SourceOutcome::Failure(detail),
                    elapsed_ms: 0,
                },
                // Dispatched slots settle in the same relative order they were spawned.
                None => match settled.next() {
                    Some(s) => settled_report(s, request.deadline),
                    None => SourceReport {
                        source: *source,
                        outcome: SourceOutcome::Failure(ErrorDetail::protocol(
                            "task finished without an outcome",
                        )),
                        elapsed_ms: 0,
                    },
                },
            };
            match &report.outcome {
                SourceOutcome::Success(result) => tracing::info!(
                    source = %report.source,
                    entries = result.entries.len(),
                    elapsed_ms = report.elapsed_ms,
                    "fanout.source.success"
                ),
                SourceOutcome::Failure(err) => tracing::warn!(
                    source = %report.source,
                    kind = %err.kind,
                    error = %err.message,
                    elapsed_ms = report.elapsed_ms,
                    "fanout.source.failure"
                ),
            }
            outcomes.push(report);
        }

        let report = AggregateReport::new(query, outcomes);
        tracing::info!(
            report_id = %report.id,
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            "fanout.complete"
        );
        Ok(report)
    }

    fn plan(&self, source: SourceName) -> Plan {
        match self.adapters.get(&source) {
            None => Plan::Skip {
                detail: ErrorDetail::configuration_missing(format!(
                    "no adapter registered for {source}"
                )),
                needs: format!("adapter for {source}"),
            },
            Some(adapter) => match adapter.credential_status() {
                CredentialStatus::Present => Plan::Dispatch(Arc::clone(adapter)),
                CredentialStatus::Missing { variable } => Plan::Skip {
                    detail: ErrorDetail::configuration_missing(format!("{variable} not set")),
                    needs: variable.to_string(),
                },
            },
        }
    }
}

fn settled_report(s: Settled<SourceName, SourceOutcome>, deadline: Duration) -> SourceReport {
    let outcome = match s.joined {
        Joined::Completed(outcome) => outcome,
        Joined::TimedOut => SourceOutcome::Failure(ErrorDetail::timeout(deadline)),
        Joined::Panicked(msg) => {
            SourceOutcome::Failure(ErrorDetail::protocol(format!("adapter panicked: {msg}")))
        }
    };
    SourceReport {
        source: s.key,
        outcome,
        elapsed_ms: s.elapsed.as_millis() as u64,
    }
}
