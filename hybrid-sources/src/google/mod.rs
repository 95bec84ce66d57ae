//! Google web search through the Serper API.
//!
//! `client` owns the HTTP exchange; `types` holds the wire structs and the
//! mapping into [`hybrid_common::NormalizedResult`].
pub mod client;
pub mod types;

pub use client::GoogleSource;
