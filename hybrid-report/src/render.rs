//! JSON and plain-text renderings of an [`AggregateReport`].
use std::fmt;

use hybrid_common::{NormalizedResult, Result, SourceName, SourceOutcome};

use crate::report::AggregateReport;

const RULE_WIDTH: usize = 60;
const SECTION_WIDTH: usize = 40;
const DETAIL_ENTRIES: usize = 5;

/// Pretty JSON with every outcome, error and the summary.
pub fn render_json(report: &AggregateReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_text(report: &AggregateReport) -> String {
    TextReport(report).to_string()
}

/// Human-readable layout: header, summary, per-source detail, then errors.
pub struct TextReport<'a>(pub &'a AggregateReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(f, "Hybrid search: {}", report.query)?;
        writeln!(f, "Time: {}", report.timestamp.to_rfc3339())?;
        writeln!(f, "Succeeded: {}", join_names(&report.succeeded()))?;
        let failed = report.failed();
        if !failed.is_empty() {
            writeln!(f, "Failed: {}", join_names(&failed))?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f)?;

        heading(f, "Summary")?;
        writeln!(f, "{}", report.summary.text())?;

        let mut successes: Vec<(SourceName, &NormalizedResult)> = report
            .outcomes
            .iter()
            .filter_map(|r| r.outcome.result().map(|res| (r.source, res)))
            .collect();
        successes.sort_by_key(|(source, _)| source.priority());

        for (source, result) in successes {
            if source.is_structured() {
                structured_detail(f, source, result)?;
            } else {
                citation_detail(f, source, result)?;
            }
        }

        let failures: Vec<_> = report
            .outcomes
            .iter()
            .filter_map(|r| match &r.outcome {
                SourceOutcome::Failure(err) => Some((r.source, err)),
                SourceOutcome::Success(_) => None,
            })
            .collect();
        if !failures.is_empty() {
            writeln!(f)?;
            heading(f, "Errors")?;
            for (source, err) in failures {
                writeln!(f, "- {source}: {err}")?;
            }
        }
        Ok(())
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(SECTION_WIDTH))
}

fn structured_detail(
    f: &mut fmt::Formatter<'_>,
    source: SourceName,
    result: &NormalizedResult,
) -> fmt::Result {
    if result.entries.is_empty() && result.knowledge_graph.is_none() {
        return Ok(());
    }
    writeln!(f)?;
    heading(f, &format!("{} results", source.label()))?;
    if let Some(kg) = &result.knowledge_graph {
        if kg.kind.is_empty() {
            writeln!(f, "* {}", kg.title)?;
        } else {
            writeln!(f, "* {} ({})", kg.title, kg.kind)?;
        }
        if !kg.description.is_empty() {
            writeln!(f, "  {}", kg.description)?;
        }
        if !kg.source.is_empty() {
            writeln!(f, "  {}", kg.source)?;
        }
        writeln!(f)?;
    }
    for (i, entry) in result.entries.iter().take(DETAIL_ENTRIES).enumerate() {
        writeln!(f, "{}. {}", i + 1, entry.title)?;
        writeln!(f, "   {}", entry.url)?;
        if let Some(date) = &entry.date {
            writeln!(f, "   {date}")?;
        }
    }
    Ok(())
}

fn citation_detail(
    f: &mut fmt::Formatter<'_>,
    source: SourceName,
    result: &NormalizedResult,
) -> fmt::Result {
    if result.entries.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    heading(f, &format!("{} citations", source.label()))?;
    for cite in result.entries.iter().take(DETAIL_ENTRIES) {
        if cite.title.is_empty() {
            writeln!(f, "- {}", cite.url)?;
        } else {
            writeln!(f, "- {} - {}", cite.title, cite.url)?;
        }
    }
    Ok(())
}

fn join_names(names: &[SourceName]) -> String {
    if names.is_empty() {
        return "none".to_string();
    }
    names
        .iter()
        .map(SourceName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
