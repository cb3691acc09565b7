//! Scoring agents
//!
//! Each agent reads the ticker's [`MarketSnapshot`](crate::data::MarketSnapshot)
//! from the shared provider, scores one aspect of the stock with fixed
//! piecewise curves and returns an [`AgentResult`](agent_core::AgentResult).

pub mod fundamental;
pub mod macro_context;
pub mod peer_comparison;
pub mod risk_assessment;
pub(crate) mod scoring;
pub mod technical;

pub use fundamental::{FundamentalAgent, FundamentalScores};
pub use macro_context::{MacroContextAgent, MacroScores};
pub use peer_comparison::{PeerComparisonAgent, PeerScores};
pub use risk_assessment::{RiskAssessmentAgent, RiskScores};
pub use technical::{TechnicalAgent, TechnicalScores};

use crate::config::EngineConfig;
use crate::data::MarketDataProvider;
use agent_core::{Agent, Error, Result, SubScoreSet};
use std::sync::Arc;

/// Typed sub-scores of one agent
pub trait ScoreCard {
    /// Sub-scores as `(name, value)` pairs, in reporting order
    fn named_scores(&self) -> Vec<(&'static str, f64)>;

    /// Generic view consumed by the aggregator
    fn to_sub_scores(&self) -> SubScoreSet {
        self.named_scores().into_iter().collect()
    }
}

/// The five standard agents sharing one provider and configuration
pub fn default_agents(
    config: &Arc<EngineConfig>,
    provider: &Arc<dyn MarketDataProvider>,
) -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(FundamentalAgent::new(Arc::clone(config), Arc::clone(provider))),
        Arc::new(TechnicalAgent::new(Arc::clone(config), Arc::clone(provider))),
        Arc::new(PeerComparisonAgent::new(Arc::clone(config), Arc::clone(provider))),
        Arc::new(MacroContextAgent::new(Arc::clone(config), Arc::clone(provider))),
        Arc::new(RiskAssessmentAgent::new(Arc::clone(config), Arc::clone(provider))),
    ]
}

/// Reject blank tickers before touching the provider
pub(crate) fn require_ticker(ticker: &str) -> Result<&str> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(Error::InvalidTicker(ticker.to_string()));
    }
    Ok(ticker)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::EngineConfig;
    use crate::data::{MarketDataProvider, MarketSnapshot, StaticDataProvider};
    use std::sync::Arc;

    pub fn config() -> Arc<EngineConfig> {
        Arc::new(EngineConfig::default())
    }

    pub fn provider(snapshot: MarketSnapshot) -> Arc<dyn MarketDataProvider> {
        let provider = StaticDataProvider::new()
            .with_snapshot(snapshot)
            .expect("valid ticker");
        Arc::new(provider)
    }
}
