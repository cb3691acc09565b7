//! Final recommendation produced by the engine

use agent_core::{AgentId, AgentResult, InvestmentPreference, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consensus recommendation for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub query: String,
    pub preference: InvestmentPreference,
    /// Final signal after consensus moderation
    pub signal: Signal,
    /// Signal of the weighted score before moderation
    pub base_signal: Signal,
    /// Weighted score, rounded to three decimals
    pub score: f64,
    /// Blended confidence, rounded to three decimals
    pub confidence: f64,
    /// Overall score of each contributing agent
    pub agent_scores: BTreeMap<AgentId, f64>,
    /// Failure message of each agent that could not complete
    pub agent_errors: BTreeMap<AgentId, String>,
    pub summary: String,
    pub key_insights: Vec<String>,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
    /// Agents consulted, in selection order
    pub active_agents: Vec<AgentId>,
    pub contributing_agents: usize,
    pub agent_results: BTreeMap<AgentId, AgentResult>,
    pub generated_at: DateTime<Utc>,
}

impl Recommendation {
    /// Whether any consulted agent failed or none contributed
    pub fn is_degraded(&self) -> bool {
        self.contributing_agents == 0 || !self.agent_errors.is_empty()
    }

    /// True when consensus moderation changed the base signal
    pub fn was_moderated(&self) -> bool {
        self.signal != self.base_signal
    }

    /// One-line verdict, e.g. `AAPL: BUY (score 0.682, confidence 0.741)`
    pub fn headline(&self) -> String {
        format!(
            "{}: {} (score {:.3}, confidence {:.3})",
            self.ticker, self.signal, self.score, self.confidence
        )
    }
}
