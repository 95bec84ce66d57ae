//! Common types and utilities shared across the hybrid-search crates.
//!
//! This crate defines the backend-agnostic domain model, the shared error
//! type, and the observability helpers used throughout the workspace. It is
//! kept dependency-light so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`SourceName`]: the closed set of search backends
//! - [`SearchRequest`] and [`SearchOptions`]: one immutable search invocation
//! - [`SourceOutcome`], [`NormalizedResult`], [`ErrorDetail`]: per-source results
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`HybridError`] and [`Result`]: fatal, run-level errors
//!
//! # Examples
//!
//! ```rust
//! use hybrid_common::{SearchRequest, SourceName};
//! use std::time::Duration;
//!
//! let req = SearchRequest::new("rust async", Duration::from_secs(30));
//! assert_eq!(req.query, "rust async");
//! assert_eq!("grok_x".parse::<SourceName>().unwrap(), SourceName::GrokX);
//! ```
pub mod model;
pub mod observability;

pub use model::*;

/// Run-level errors. Per-source failures are never reported through this
/// type; they materialize as [`SourceOutcome::Failure`].
#[derive(thiserror::Error, Debug)]
pub enum HybridError {
    /// The caller asked for zero sources.
    #[error("no sources requested")]
    NoSourcesRequested,

    /// The query was empty after trimming.
    #[error("search query must not be empty")]
    EmptyQuery,

    /// Every requested source lacks its credential; nothing can be attempted.
    #[error("missing credentials for every requested source: {}", missing.join(", "))]
    MissingCredentials { missing: Vec<String> },

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rendering the report failed.
    #[error("render error: {0}")]
    Render(#[from] serde_json::Error),
}

/// Convenient alias for results that use [`HybridError`].
pub type Result<T> = std::result::Result<T, HybridError>;
