//! Concurrent fan-out across search sources under one shared deadline.
//!
//! [`DeadlineGroup`] is the generic task group; [`Coordinator`] uses it to
//! run every requested [`hybrid_sources::SourceAdapter`] and assemble the
//! [`hybrid_report::AggregateReport`].
pub mod coordinator;
pub mod group;

pub use coordinator::Coordinator;
pub use group::{DeadlineGroup, Joined, Settled};
