//! xAI Grok search through the Responses API with server-side search tools.
pub mod client;
pub mod types;

pub use client::GrokSource;
