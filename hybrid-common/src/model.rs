//! Backend-agnostic domain model.
//!
//! Every adapter maps its native JSON into [`NormalizedResult`] or
//! [`ErrorDetail`]; nothing downstream ever sees a backend-specific shape.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ==============================
// Sources
// ==============================

/// Identifier of one search backend.
///
/// Declaration order is the presentation priority used by the summary and
/// the text renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    Google,
    GrokWeb,
    GrokX,
    GrokBoth,
}

impl SourceName {
    /// Every known source, in priority order.
    pub const ALL: [SourceName; 4] = [
        SourceName::Google,
        SourceName::GrokWeb,
        SourceName::GrokX,
        SourceName::GrokBoth,
    ];

    /// Sources used by a hybrid search when the caller does not choose.
    pub const DEFAULT_SET: [SourceName; 3] =
        [SourceName::Google, SourceName::GrokWeb, SourceName::GrokX];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Google => "google",
            SourceName::GrokWeb => "grok_web",
            SourceName::GrokX => "grok_x",
            SourceName::GrokBoth => "grok_both",
        }
    }

    /// Human-readable section title.
    pub fn label(&self) -> &'static str {
        match self {
            SourceName::Google => "Google",
            SourceName::GrokWeb => "Grok Web",
            SourceName::GrokX => "X/Twitter",
            SourceName::GrokBoth => "Grok Web + X",
        }
    }

    /// Lower sorts first.
    pub fn priority(&self) -> u8 {
        *self as u8
    }

    /// Structured sources return ranked entries; the rest return prose.
    pub fn is_structured(&self) -> bool {
        matches!(self, SourceName::Google)
    }

    /// Grok search mode backing this source, if it is a Grok source.
    pub fn grok_mode(&self) -> Option<GrokMode> {
        match self {
            SourceName::Google => None,
            SourceName::GrokWeb => Some(GrokMode::Web),
            SourceName::GrokX => Some(GrokMode::X),
            SourceName::GrokBoth => Some(GrokMode::Both),
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown source '{0}' (expected one of: google, grok_web, grok_x, grok_both)")]
pub struct ParseSourceError(pub String);

impl FromStr for SourceName {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "google" => Ok(SourceName::Google),
            "grok_web" => Ok(SourceName::GrokWeb),
            "grok_x" => Ok(SourceName::GrokX),
            "grok_both" => Ok(SourceName::GrokBoth),
            _ => Err(ParseSourceError(s.to_string())),
        }
    }
}

/// Which search tools the Grok backend may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrokMode {
    Web,
    X,
    Both,
}

impl GrokMode {
    pub fn source(&self) -> SourceName {
        match self {
            GrokMode::Web => SourceName::GrokWeb,
            GrokMode::X => SourceName::GrokX,
            GrokMode::Both => SourceName::GrokBoth,
        }
    }
}

impl FromStr for GrokMode {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(GrokMode::Web),
            "x" | "twitter" => Ok(GrokMode::X),
            "both" => Ok(GrokMode::Both),
            _ => Err(ParseSourceError(s.to_string())),
        }
    }
}

// ==============================
// Request
// ==============================

/// Options for the Serper-backed Google search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleOptions {
    /// Number of organic results requested (and kept).
    pub num: u32,
    /// Country code, e.g. `tw`.
    pub gl: String,
    /// Interface language, e.g. `zh-TW`.
    pub hl: String,
}

impl Default for GoogleOptions {
    fn default() -> Self {
        Self {
            num: 10,
            gl: "tw".to_string(),
            hl: "zh-TW".to_string(),
        }
    }
}

/// Options for the xAI Grok Responses API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrokOptions {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Language the answer should be written in.
    pub language: String,
}

impl Default for GrokOptions {
    fn default() -> Self {
        Self {
            model: "grok-4-1-fast-reasoning".to_string(),
            temperature: None,
            language: "Traditional Chinese".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub google: GoogleOptions,
    pub grok: GrokOptions,
}

/// One immutable search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub options: SearchOptions,
    /// Shared deadline for the whole fan-out.
    pub deadline: Duration,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, deadline: Duration) -> Self {
        Self {
            query: query.into(),
            options: SearchOptions::default(),
            deadline,
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

// ==============================
// Results
// ==============================

/// One ranked result or citation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerBox {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePanel {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
}

/// A tool invocation reported by an agentic backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Backend-agnostic successful response. Built once by an adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Display name of the backend, e.g. `Google (Serper)`.
    pub label: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub entries: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_box: Option<AnswerBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgePanel>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Entries the backend returned beyond what was requested.
    #[serde(default)]
    pub omitted_entries: usize,
}

impl NormalizedResult {
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.entries.is_empty() && self.answer_box.is_none()
    }
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ConfigurationMissing,
    TransportFailure,
    ProtocolFailure,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationMissing => "configuration-missing",
            ErrorKind::TransportFailure => "transport-failure",
            ErrorKind::ProtocolFailure => "protocol-failure",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one source failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Raw response body, when the backend sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ErrorDetail {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            body: None,
        }
    }

    pub fn configuration_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationMissing, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFailure, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolFailure, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("no response within {} ms", after.as_millis()),
        )
    }

    /// Non-2xx response.
    pub fn http_status(status: u16, message: impl Into<String>, body: Option<String>) -> Self {
        Self {
            kind: ErrorKind::ProtocolFailure,
            message: message.into(),
            http_status: Some(status),
            body,
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.kind, status, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Exactly one per requested source once a fan-out completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Success(NormalizedResult),
    Failure(ErrorDetail),
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Success(_))
    }

    pub fn result(&self) -> Option<&NormalizedResult> {
        match self {
            SourceOutcome::Success(r) => Some(r),
            SourceOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            SourceOutcome::Success(_) => None,
            SourceOutcome::Failure(e) => Some(e),
        }
    }
}

/// Cap `text` at `max_chars` Unicode scalar values, appending `...` only
/// when something was cut.
///
/// ```
/// use hybrid_common::ellipsize;
///
/// assert_eq!(ellipsize("short", 10), "short");
/// assert_eq!(ellipsize("台灣今日新聞", 2), "台灣...");
/// ```
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_round_trip_through_strings() {
        for name in SourceName::ALL {
            assert_eq!(name.as_str().parse::<SourceName>().unwrap(), name);
            assert_eq!(name.to_string(), name.as_str());
        }
        assert_eq!("Grok-Web".parse::<SourceName>().unwrap(), SourceName::GrokWeb);
        assert!("bing".parse::<SourceName>().is_err());
    }

    #[test]
    fn priority_follows_declaration_order() {
        let mut shuffled = vec![SourceName::GrokX, SourceName::Google, SourceName::GrokWeb];
        shuffled.sort_by_key(|s| s.priority());
        assert_eq!(shuffled, SourceName::DEFAULT_SET.to_vec());
    }

    #[test]
    fn grok_modes_map_to_sources() {
        assert_eq!(SourceName::Google.grok_mode(), None);
        for mode in [GrokMode::Web, GrokMode::X, GrokMode::Both] {
            assert_eq!(mode.source().grok_mode(), Some(mode));
        }
        assert_eq!("twitter".parse::<GrokMode>().unwrap(), GrokMode::X);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failure = SourceOutcome::Failure(ErrorDetail::http_status(
            503,
            "unavailable",
            Some("{}".into()),
        ));
        let v = serde_json::to_value(&failure).unwrap();
        assert_eq!(v["status"], "failure");
        assert_eq!(v["kind"], "protocol-failure");
        assert_eq!(v["http_status"], 503);

        let back: SourceOutcome = serde_json::from_value(v).unwrap();
        assert_eq!(back, failure);
    }

    #[test]
    fn ellipsize_counts_chars_not_bytes() {
        assert_eq!(ellipsize("abcdef", 6), "abcdef");
        assert_eq!(ellipsize("abcdef", 3), "abc...");
        assert_eq!(ellipsize("", 0), "");
        assert_eq!(ellipsize("é", 0), "...");
    }
}
