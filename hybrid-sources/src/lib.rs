//! Search backends behind one [`SourceAdapter`] trait.
//!
//! An adapter turns one query into exactly one [`SourceOutcome`]: every
//! failure (missing key, connection error, timeout, bad status, bad JSON) is
//! folded into a `Failure` value instead of an `Err`, so a fan-out never has
//! to special-case a misbehaving backend.
use async_trait::async_trait;
use hybrid_common::{ErrorDetail, SearchOptions, SourceName, SourceOutcome, ellipsize};
use hybrid_http::HttpError;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub mod google;
pub mod grok;

pub use google::GoogleSource;
pub use grok::GrokSource;

/// Whether an adapter can authenticate, checked before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Present,
    /// The named environment variable has no usable value.
    Missing { variable: &'static str },
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> SourceName;

    fn credential_status(&self) -> CredentialStatus;

    /// Run one search. `timeout` bounds the whole HTTP exchange.
    async fn fetch(&self, query: &str, options: &SearchOptions, timeout: Duration)
    -> SourceOutcome;
}

/// Map a transport-level error onto the per-source failure taxonomy.
pub fn classify_http_error(err: HttpError) -> ErrorDetail {
    match err {
        HttpError::Timeout(after) => ErrorDetail::timeout(after),
        HttpError::Network(msg) => ErrorDetail::transport(msg),
        HttpError::Credential(msg) => ErrorDetail::configuration_missing(msg),
        HttpError::Url(msg) | HttpError::Build(msg) => {
            ErrorDetail::transport(format!("request could not be sent: {msg}"))
        }
        HttpError::Decode {
            message,
            body_snippet,
        } => {
            let mut detail = ErrorDetail::protocol(format!("malformed response body: {message}"));
            detail.body = Some(body_snippet);
            detail
        }
        HttpError::Api {
            status,
            message,
            body,
            ..
        } => ErrorDetail::http_status(
            status.as_u16(),
            format!("HTTP {}: {}", status.as_u16(), message),
            (!body.is_empty()).then_some(body),
        ),
    }
}

/// Backends send `null` where a field is empty; treat it like an absent key.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

/// Query text safe to put in a log line.
pub(crate) fn query_snippet(query: &str) -> String {
    ellipsize(query, 160)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_common::ErrorKind;

    #[test]
    fn timeouts_and_statuses_classify_distinctly() {
        let t = classify_http_error(HttpError::Timeout(Duration::from_millis(250)));
        assert_eq!(t.kind, ErrorKind::Timeout);
        assert!(t.message.contains("250"));

        let n = classify_http_error(HttpError::Network("connection refused".into()));
        assert_eq!(n.kind, ErrorKind::TransportFailure);

        let d = classify_http_error(HttpError::Decode {
            message: "expected value".into(),
            body_snippet: "<html>".into(),
        });
        assert_eq!(d.kind, ErrorKind::ProtocolFailure);
        assert_eq!(d.body.as_deref(), Some("<html>"));

        let a = classify_http_error(HttpError::Api {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".into(),
            body: "{\"message\":\"slow down\"}".into(),
            request_id: "-".into(),
        });
        assert_eq!(a.kind, ErrorKind::ProtocolFailure);
        assert_eq!(a.http_status, Some(429));
        assert!(a.message.contains("slow down"));
    }

    #[test]
    fn unusable_credentials_are_configuration_errors() {
        let c = classify_http_error(HttpError::Credential("API key contains non-ASCII bytes".into()));
        assert_eq!(c.kind, ErrorKind::ConfigurationMissing);
        assert!(c.message.contains("non-ASCII"));
    }
}
