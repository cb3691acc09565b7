//! Core Agent trait definition

use crate::{AgentResult, AnalysisContext, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a scoring agent
///
/// The set is closed: the engine knows every perspective it can consult and
/// the configuration keys weights by these identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Fundamental,
    Technical,
    PeerComparison,
    MacroContext,
    RiskAssessment,
}

impl AgentId {
    /// Every agent, in canonical order
    pub const ALL: [Self; 5] = [
        Self::Fundamental,
        Self::Technical,
        Self::PeerComparison,
        Self::MacroContext,
        Self::RiskAssessment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental",
            Self::Technical => "technical",
            Self::PeerComparison => "peer_comparison",
            Self::MacroContext => "macro_context",
            Self::RiskAssessment => "risk_assessment",
        }
    }

    /// Human-readable name used in summaries
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fundamental => "Fundamental",
            Self::Technical => "Technical",
            Self::PeerComparison => "Peer Comparison",
            Self::MacroContext => "Macro Context",
            Self::RiskAssessment => "Risk Assessment",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| Error::Generic(format!("Unknown agent: {s}")))
    }
}

/// Core trait that all scoring agents must implement
///
/// An agent examines one ticker from a single perspective and reports a
/// bounded score. Failures are returned as errors; the orchestrator turns
/// them into neutral placeholder results so one agent never aborts a run.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Score a ticker from this agent's perspective
    async fn analyze(&self, ticker: &str, context: &AnalysisContext) -> Result<AgentResult>;

    /// Which perspective this agent provides
    fn id(&self) -> AgentId;

    /// Static contribution of this agent to the weighted consensus
    fn weight(&self) -> f64;
}
