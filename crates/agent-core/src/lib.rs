//! Core abstractions for the multi-agent recommendation engine
//!
//! This crate defines the contract every scoring agent implements and the
//! value types that flow from the agents to the aggregator.

pub mod agent;
pub mod context;
pub mod error;
pub mod result;
pub mod signal;

pub use agent::{Agent, AgentId};
pub use context::{AnalysisContext, InvestmentPreference};
pub use error::{Error, Result};
pub use result::{
    AgentResult, FAILURE_CONFIDENCE, KeyMetrics, NEUTRAL_SCORE, SubScore, SubScoreSet, clamp_score,
};
pub use signal::{Signal, SignalThresholds};
