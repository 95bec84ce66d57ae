use super::types::{SerperResponse, SerperSearchRequest};
use crate::{CredentialStatus, SourceAdapter, classify_http_error, query_snippet};
use async_trait::async_trait;
use hybrid_common::{ErrorDetail, SearchOptions, SourceName, SourceOutcome};
use hybrid_config::{CredentialProvider, SERPER_API_KEY};
use hybrid_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const SERPER_API_BASE: &str = "https://google.serper.dev";

/// Serper-backed Google search adapter.
#[derive(Clone)]
pub struct GoogleSource {
    http: HttpClient,
    credentials: Arc<dyn CredentialProvider>,
}

impl GoogleSource {
    /// `endpoint` is the Serper base URL; tests point it at a mock server.
    pub fn new(
        endpoint: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(endpoint)?,
            credentials,
        })
    }

    async fn search(
        &self,
        api_key: &str,
        query: &str,
        options: &SearchOptions,
        timeout: Duration,
    ) -> Result<SerperResponse, HttpError> {
        let body = SerperSearchRequest::new(query, &options.google);
        self.http
            .post_json(
                "search",
                &body,
                RequestOpts {
                    timeout: Some(timeout),
                    auth: Some(Auth::header("x-api-key", api_key)?),
                    ..Default::default()
                },
            )
            .await
    }
}

#[async_trait]
impl SourceAdapter for GoogleSource {
    fn name(&self) -> SourceName {
        SourceName::Google
    }

    fn credential_status(&self) -> CredentialStatus {
        match self.credentials.get(SERPER_API_KEY) {
            Some(_) => CredentialStatus::Present,
            None => CredentialStatus::Missing {
                variable: SERPER_API_KEY,
            },
        }
    }

    async fn fetch(
        &self,
        query: &str,
        options: &SearchOptions,
        timeout: Duration,
    ) -> SourceOutcome {
        let Some(api_key) = self.credentials.get(SERPER_API_KEY) else {
            tracing::warn!(target: "source.google", "google.missing_credential");
            return SourceOutcome::Failure(ErrorDetail::configuration_missing(format!(
                "{SERPER_API_KEY} not set"
            )));
        };

        let started = Instant::now();
        tracing::info!(
            target: "source.google",
            query = %query_snippet(query),
            num = options.google.num,
            gl = %options.google.gl,
            hl = %options.google.hl,
            "google.search.start"
        );

        match self.search(&api_key, query, options, timeout).await {
            Ok(resp) => {
                let limit = options.google.num as usize;
                let result = resp.into_normalized(limit);
                if result.omitted_entries > 0 {
                    tracing::warn!(
                        target: "source.google",
                        requested = limit,
                        omitted = result.omitted_entries,
                        "google.search.extra_results"
                    );
                }
                tracing::info!(
                    target: "source.google",
                    entries = result.entries.len(),
                    has_answer_box = result.answer_box.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "google.search.success"
                );
                SourceOutcome::Success(result)
            }
            Err(err) => {
                let detail = classify_http_error(err);
                tracing::warn!(
                    target: "source.google",
                    kind = %detail.kind,
                    error = %detail.message,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "google.search.failure"
                );
                SourceOutcome::Failure(detail)
            }
        }
    }
}
