use super::types::{GrokRequest, GrokResponse, build_prompt, tools_for};
use crate::{CredentialStatus, SourceAdapter, classify_http_error, query_snippet};
use async_trait::async_trait;
use hybrid_common::{ErrorDetail, GrokMode, SearchOptions, SourceName, SourceOutcome};
use hybrid_config::{CredentialProvider, XAI_API_KEY};
use hybrid_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const XAI_API_BASE: &str = "https://api.x.ai/v1/";

// The search gateway rejects some non-browser agents.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Grok adapter bound to one search mode; register one per mode.
#[derive(Clone)]
pub struct GrokSource {
    mode: GrokMode,
    http: HttpClient,
    credentials: Arc<dyn CredentialProvider>,
}

impl GrokSource {
    pub fn new(
        mode: GrokMode,
        endpoint: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, HttpError> {
        Ok(Self {
            mode,
            http: HttpClient::new(endpoint)?,
            credentials,
        })
    }

    pub fn mode(&self) -> GrokMode {
        self.mode
    }

    async fn respond(
        &self,
        api_key: &str,
        query: &str,
        options: &SearchOptions,
        timeout: Duration,
    ) -> Result<GrokResponse, HttpError> {
        let req = GrokRequest {
            model: &options.grok.model,
            tools: tools_for(self.mode),
            input: build_prompt(self.mode, query, &options.grok.language),
            temperature: options.grok.temperature,
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        self.http
            .post_json(
                "responses",
                &req,
                RequestOpts {
                    timeout: Some(timeout),
                    auth: Some(Auth::Bearer(api_key)),
                    headers: Some(headers),
                },
            )
            .await
    }
}

#[async_trait]
impl SourceAdapter for GrokSource {
    fn name(&self) -> SourceName {
        self.mode.source()
    }

    fn credential_status(&self) -> CredentialStatus {
        match self.credentials.get(XAI_API_KEY) {
            Some(_) => CredentialStatus::Present,
            None => CredentialStatus::Missing {
                variable: XAI_API_KEY,
            },
        }
    }

    async fn fetch(
        &self,
        query: &str,
        options: &SearchOptions,
        timeout: Duration,
    ) -> SourceOutcome {
        let source = self.name();
        let Some(api_key) = self.credentials.get(XAI_API_KEY) else {
            tracing::warn!(target: "source.grok", %source, "grok.missing_credential");
            return SourceOutcome::Failure(ErrorDetail::configuration_missing(format!(
                "{XAI_API_KEY} not set"
            )));
        };

        let started = Instant::now();
        tracing::info!(
            target: "source.grok",
            %source,
            query = %query_snippet(query),
            model = %options.grok.model,
            "grok.search.start"
        );

        match self.respond(&api_key, query, options, timeout).await {
            Ok(resp) => {
                let result = resp.into_normalized(self.mode);
                tracing::info!(
                    target: "source.grok",
                    %source,
                    content_chars = result.content.chars().count(),
                    citations = result.entries.len(),
                    tool_calls = result.tool_calls.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "grok.search.success"
                );
                SourceOutcome::Success(result)
            }
            Err(err) => {
                let detail = classify_http_error(err);
                tracing::warn!(
                    target: "source.grok",
                    %source,
                    kind = %detail.kind,
                    error = %detail.message,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "grok.search.failure"
                );
                SourceOutcome::Failure(detail)
            }
        }
    }
}
