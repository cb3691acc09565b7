//! Multi-agent scoring and consensus engine
//!
//! This crate turns a per-ticker market data bundle and a free-text question
//! into a single investment recommendation. It includes:
//!
//! - Five scoring agents (fundamental, technical, peer comparison, macro
//!   context, risk assessment) producing normalized sub-scores
//! - A keyword router that picks the agents relevant to the question
//! - An orchestrator that runs the agents concurrently and tolerates failures
//! - Weighted aggregation with consensus moderation and confidence blending
//! - Insight, risk and opportunity extraction
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_consensus::{EngineConfig, Orchestrator, StaticDataProvider};
//! use agent_core::InvestmentPreference;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(StaticDataProvider::from_json_file("bundle.json")?);
//!     let orchestrator = Orchestrator::new(Arc::new(EngineConfig::default()), provider)?;
//!
//!     let recommendation = orchestrator
//!         .analyze_stock("TCS.NS", "Is it a good time to buy?", InvestmentPreference::Balanced)
//!         .await?;
//!     println!("{}", recommendation.headline());
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod interface;
pub mod router;

// Re-export main types for convenience
pub use agents::{
    FundamentalAgent, MacroContextAgent, PeerComparisonAgent, RiskAssessmentAgent, ScoreCard,
    TechnicalAgent, default_agents,
};
pub use config::{AgentWeights, ConsensusPolicy, EngineConfig, EngineConfigBuilder};
pub use data::{CachedProvider, MarketDataProvider, MarketSnapshot, StaticDataProvider};
pub use engine::{Aggregator, Orchestrator, OrchestratorBuilder, Recommendation};
pub use error::{ConsensusError, Result};
pub use router::{AgentSelector, KeywordCategory, Selection};
