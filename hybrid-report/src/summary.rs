//! Cross-source summary.
//!
//! Sections follow a fixed source priority (the order of [`SourceName`]
//! declarations, shared with the text renderer), so the same outcomes always
//! yield byte-identical text regardless of the order they arrived in.
use hybrid_common::{ErrorKind, NormalizedResult, SourceName, SourceOutcome, ellipsize};
use serde::{Deserialize, Serialize};

use crate::report::SourceReport;

pub const NO_RESULTS_SENTINEL: &str = "No results could be retrieved from any source.";

const ANSWER_CAP: usize = 200;
const SNIPPET_CAP: usize = 100;
const CONTENT_CAP: usize = 500;
const FAILURE_MESSAGE_CAP: usize = 160;
const TOP_ENTRIES: usize = 3;
const EMPTY_RESPONSE: &str = "(empty response)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub body: SummaryBody,
    /// One note per failed source, in priority order.
    pub failures: Vec<FailureNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum SummaryBody {
    Narrative(String),
    NoResults,
}

impl SummaryBody {
    pub fn text(&self) -> &str {
        match self {
            SummaryBody::Narrative(text) => text,
            SummaryBody::NoResults => NO_RESULTS_SENTINEL,
        }
    }
}

impl Summary {
    pub fn text(&self) -> &str {
        self.body.text()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureNote {
    pub source: SourceName,
    pub kind: ErrorKind,
    pub message: String,
}

/// Build the summary for a set of per-source outcomes.
///
/// ```
/// use hybrid_common::{ErrorDetail, SourceName, SourceOutcome};
/// use hybrid_report::{summarize, SourceReport, SummaryBody};
///
/// let summary = summarize(&[SourceReport {
///     source: SourceName::Google,
///     outcome: SourceOutcome::Failure(ErrorDetail::transport("refused")),
///     elapsed_ms: 3,
/// }]);
/// assert_eq!(summary.body, SummaryBody::NoResults);
/// assert_eq!(summary.failures.len(), 1);
/// ```
pub fn summarize(reports: &[SourceReport]) -> Summary {
    let mut ordered: Vec<&SourceReport> = reports.iter().collect();
    ordered.sort_by_key(|r| r.source.priority());

    let mut sections = Vec::new();
    let mut failures = Vec::new();
    for report in ordered {
        match &report.outcome {
            SourceOutcome::Success(result) => sections.push(section(report.source, result)),
            SourceOutcome::Failure(err) => failures.push(FailureNote {
                source: report.source,
                kind: err.kind,
                message: ellipsize(&err.message, FAILURE_MESSAGE_CAP),
            }),
        }
    }

    let body = if sections.is_empty() {
        SummaryBody::NoResults
    } else {
        SummaryBody::Narrative(sections.join("\n\n"))
    };
    Summary { body, failures }
}

fn section(source: SourceName, result: &NormalizedResult) -> String {
    let mut lines = vec![format!("[{}]", source.label())];
    if source.is_structured() {
        if let Some(ab) = &result.answer_box {
            if !ab.answer.trim().is_empty() {
                lines.push(format!("Answer: {}", ellipsize(ab.answer.trim(), ANSWER_CAP)));
            }
        }
        for entry in result.entries.iter().take(TOP_ENTRIES) {
            lines.push(format!("- {}", entry.title.trim()));
            let snippet = entry.snippet.trim();
            if !snippet.is_empty() {
                lines.push(format!("  {}", ellipsize(snippet, SNIPPET_CAP)));
            }
        }
    } else {
        let content = result.content.trim();
        if !content.is_empty() {
            lines.push(ellipsize(content, CONTENT_CAP));
        }
    }
    if lines.len() == 1 {
        lines.push(EMPTY_RESPONSE.to_string());
    }
    lines.join("\n")
}
