//! Minimal JSON HTTP client with safe logging, flexible auth and timeout
//! classification.
//!
//! - Request options: headers, `Auth`, timeout
//! - One attempt per call: callers own any retry policy
//! - Redacts sensitive headers and query params; never logs secret values
//! - Distinguishes transport failures, elapsed timeouts, non-2xx statuses and
//!   undecodable bodies so callers can classify failures precisely
//! - Optional *raw* request/response logging via `HYBRID_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), hybrid_http::HttpError> {
//! let client = hybrid_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .post_json("v1/search", &serde_json::json!({"q": "rust"}), hybrid_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/header/none), not the secret.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "HYBRID_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_name(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "x-api-key"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: &[u8]) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, value) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, value.replace('\'', r"'\''")));
    }
    match std::str::from_utf8(body) {
        Ok(s) => {
            let s = truncate_utf8(s, RAW_MAX_BODY);
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        }
        Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", body.len())),
    }
    let (host_path, query) = redact_query(url);
    let query = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let scheme = url.scheme();
    if query.is_empty() {
        parts.push(format!("'{scheme}://{host_path}'"));
    } else {
        parts.push(format!("'{scheme}://{host_path}?{query}'"));
    }
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_name(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!(
        "{}{}{}",
        url.host_str().unwrap_or("-"),
        url.port().map(|p| format!(":{p}")).unwrap_or_default(),
        url.path()
    );
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = if is_secret_name(&k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k, v)
        })
        .collect();
    (host_path, redacted)
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    /// The credential cannot be encoded into a request; nothing was sent.
    #[error("unusable credential: {0}")]
    Credential(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("decode error: {message}, body_snippet: {body_snippet}")]
    Decode {
        message: String,
        body_snippet: String,
    },
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        body: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use hybrid_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header (e.g., Serper: X-API-KEY)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
}

impl<'a> Auth<'a> {
    /// Build a header credential, validating the value up front.
    ///
    /// ```
    /// use hybrid_http::Auth;
    ///
    /// assert!(Auth::header("x-api-key", "abc").is_ok());
    /// assert!(Auth::header("x-api-key", "bad\nvalue").is_err());
    /// ```
    pub fn header(name: &'static str, value: &str) -> Result<Self, HttpError> {
        let mut value = HeaderValue::from_str(value.trim())
            .map_err(|e| HttpError::Credential(format!("invalid {name} header: {e}")))?;
        value.set_sensitive(true);
        Ok(Auth::Header {
            name: HeaderName::from_static(name),
            value,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use hybrid_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Bearer("demo")),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use hybrid_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        // `join` drops the last path segment unless the base ends with '/'.
        let base = if base.ends_with('/') {
            Cow::Borrowed(base)
        } else {
            Cow::Owned(format!("{base}/"))
        };
        let base = Url::parse(&base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use hybrid_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let method = Method::POST;
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);

        // Serialize up front so the exact bytes can be logged.
        let request_body_bytes =
            serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        rb = rb
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request_body_bytes.clone());

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
            }
            Some(Auth::Header { name, value }) => {
                rb = rb.header(name, value);
            }
            None => {}
        }

        let auth_kind = opts.auth.as_ref().map(Auth::kind).unwrap_or("none");
        let (host_path, redacted_q) = redact_query(&url);
        let req_id = uuid::Uuid::new_v4().simple().to_string();

        tracing::debug!(
            req_id = %req_id,
            method = %method,
            host_path = %host_path,
            query = ?redacted_q,
            timeout_ms = timeout.as_millis() as u64,
            auth_kind,
            body_bytes = request_body_bytes.len(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(
                &method,
                &url,
                opts.headers.as_ref().unwrap_or(&HeaderMap::new()),
                &request_body_bytes,
            );
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|err| classify_send_error(&req_id, err, timeout))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| classify_send_error(&req_id, err, timeout))?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id = %req_id,
            %status,
            duration_ms = dur_ms,
            body_len = bytes.len(),
            x_request_id = %req_hdr_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let text = String::from_utf8_lossy(&bytes);
            let truncated = text.len() > RAW_MAX_BODY;
            tracing::info!(
                target: "http.raw",
                %req_id,
                status = %status,
                duration_ms = dur_ms,
                headers = ?hdrs,
                body = %truncate_utf8(&text, RAW_MAX_BODY),
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id = %req_id, body_snippet = %snippet, "http.response.body_snippet");

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id = %req_id,
                    serde_line = %e.line(),
                    serde_col = %e.column(),
                    serde_err = %e,
                    body_snippet = %snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode {
                    message: e.to_string(),
                    body_snippet: snippet,
                }
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id = %req_id,
            %status,
            message = %message,
            x_request_id = %req_hdr_id,
            body_snippet = %snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            request_id: req_hdr_id,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn classify_send_error(req_id: &str, err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        tracing::warn!(req_id = %req_id, timeout_ms = timeout.as_millis() as u64, "http.timeout");
        return HttpError::Timeout(timeout);
    }
    if err.is_builder() {
        return HttpError::Build(err.to_string());
    }
    // Include the source chain: reqwest's top-level message hides DNS/connect details.
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    tracing::warn!(req_id = %req_id, message = %message, "http.network_error");
    HttpError::Network(message)
}

fn extract_error_message(body: &[u8]) -> String {
    // OpenAI/xAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorEnvelopeDetail,
    }
    #[derive(Deserialize)]
    struct ErrorEnvelopeDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn truncate_utf8(s: &str, max: usize) -> Cow<'_, str> {
    if s.len() <= max {
        return Cow::Borrowed(s);
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    Cow::Owned(format!("{}...", &s[..cut]))
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    truncate_utf8(&text, SNIPPET_MAX).into_owned()
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Credential("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Credential("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Credential(
            "API key contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Credential(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_api_key("  \"xai-abc 123\n\" ").unwrap(), "xai-abc123");
        assert!(matches!(sanitize_api_key("   "), Err(HttpError::Credential(_))));
        assert!(matches!(sanitize_api_key("ключ"), Err(HttpError::Credential(_))));
        assert!(matches!(
            Auth::header("x-api-key", "ключ"),
            Err(HttpError::Credential(_))
        ));
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        assert_eq!(
            extract_error_message(br#"{"error":{"message":"bad key"}}"#),
            "bad key"
        );
        assert_eq!(
            extract_error_message(br#"{"message":"Unauthorized."}"#),
            "Unauthorized."
        );
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }

    #[test]
    fn secrets_are_redacted_from_query_and_headers() {
        let url = Url::parse("https://example.com/v1/search?q=rust&api_key=s3cret").unwrap();
        let (host_path, pairs) = redact_query(&url);
        assert_eq!(host_path, "example.com/v1/search");
        assert!(pairs.contains(&("api_key".to_string(), "<redacted>".to_string())));
        assert!(pairs.contains(&("q".to_string(), "rust".to_string())));

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("s3cret"));
        headers.insert("user-agent", HeaderValue::from_static("test"));
        let redacted = redact_headers(&headers);
        assert!(redacted.contains(&("x-api-key".to_string(), "<redacted>".to_string())));
        assert!(redacted.contains(&("user-agent".to_string(), "test".to_string())));
    }

    #[test]
    fn curl_never_contains_the_secret() {
        let url = Url::parse("https://example.com/search?key=s3cret").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer s3cret"));
        let curl = make_curl(&Method::POST, &url, &headers, br#"{"q":"x"}"#);
        assert!(!curl.contains("s3cret"));
        assert!(curl.contains("-d '{\"q\":\"x\"}'"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(400);
        let out = truncate_utf8(&s, 501);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 504);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = HttpClient::new("https://api.x.ai/v1").unwrap();
        assert_eq!(client.base().as_str(), "https://api.x.ai/v1/");
        assert_eq!(
            client.base().join("responses").unwrap().as_str(),
            "https://api.x.ai/v1/responses"
        );
    }
}
