use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use hybrid_common::observability::{LogConfig, LogSink};
use hybrid_common::{
    Citation, ErrorDetail, NormalizedResult, SearchOptions, SourceName, SourceOutcome,
};
use hybrid_sources::{CredentialStatus, SourceAdapter};

static INIT: OnceLock<LogSink> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT.get_or_init(|| {
        let config = LogConfig {
            app_name: "hybrid-tests",
            to_file: false,
            default_filter: "debug".into(),
            ..LogConfig::default()
        };
        hybrid_common::observability::init_logging(config).unwrap_or(LogSink::Stderr)
    });
}

#[derive(Clone)]
pub enum Behavior {
    Succeed(NormalizedResult),
    SucceedAfter(Duration, NormalizedResult),
    Fail(ErrorDetail),
    Panic,
}

/// In-process adapter with scripted behavior and a call counter.
pub struct StubSource {
    name: SourceName,
    behavior: Behavior,
    has_credential: bool,
    pub calls: Arc<AtomicUsize>,
}

impl StubSource {
    pub fn new(name: SourceName, behavior: Behavior) -> Self {
        Self {
            name,
            behavior,
            has_credential: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn without_credential(mut self) -> Self {
        self.has_credential = false;
        self
    }
}

#[async_trait]
impl SourceAdapter for StubSource {
    fn name(&self) -> SourceName {
        self.name
    }

    fn credential_status(&self) -> CredentialStatus {
        if self.has_credential {
            CredentialStatus::Present
        } else {
            CredentialStatus::Missing {
                variable: match self.name {
                    SourceName::Google => "SERPER_API_KEY",
                    _ => "XAI_API_KEY",
                },
            }
        }
    }

    async fn fetch(
        &self,
        _query: &str,
        _options: &SearchOptions,
        _timeout: Duration,
    ) -> SourceOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed(result) => SourceOutcome::Success(result.clone()),
            Behavior::SucceedAfter(delay, result) => {
                tokio::time::sleep(*delay).await;
                SourceOutcome::Success(result.clone())
            }
            Behavior::Fail(err) => SourceOutcome::Failure(err.clone()),
            Behavior::Panic => panic!("stub adapter blew up"),
        }
    }
}

pub fn text_result(label: &str, content: &str) -> NormalizedResult {
    NormalizedResult {
        label: label.to_string(),
        content: content.to_string(),
        ..Default::default()
    }
}

pub fn ranked_result(titles: &[&str]) -> NormalizedResult {
    NormalizedResult {
        label: "Google (Serper)".to_string(),
        entries: titles
            .iter()
            .enumerate()
            .map(|(i, t)| Citation {
                title: t.to_string(),
                url: format!("https://example.com/{i}"),
                snippet: format!("snippet for {t}"),
                position: Some(i as u32 + 1),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}
