//! Consensus engine
//!
//! The orchestrator fans the selected agents out as tokio tasks, then the
//! aggregator merges their results into a [`Recommendation`].

pub mod aggregation;
pub mod insights;
pub mod orchestrator;
pub mod recommendation;

pub use aggregation::Aggregator;
pub use insights::{opportunity_phrase, risk_phrase};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use recommendation::Recommendation;
