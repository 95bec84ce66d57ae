//! The per-invocation report, its derived summary, and its renderings.
//!
//! Nothing here performs I/O: [`summarize`] is a pure function of the
//! outcomes and the renderers only format an existing [`AggregateReport`].
pub mod render;
pub mod report;
pub mod summary;

pub use render::{TextReport, render_json, render_text};
pub use report::{AggregateReport, SourceReport};
pub use summary::{FailureNote, NO_RESULTS_SENTINEL, Summary, SummaryBody, summarize};
