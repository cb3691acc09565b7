//! Keyword router for choosing which agents answer a query
//!
//! The user's free-text question is scanned for keyword categories in a
//! fixed priority order. The first category with a matching keyword decides
//! the active agents; no match means every agent is consulted.

use agent_core::AgentId;
use serde::{Deserialize, Serialize};

/// Default keyword categories, highest priority first
mod keywords {
    pub const FUNDAMENTAL: &[&str] = &[
        "fundamental",
        "valuation",
        "p/e",
        "financial",
        "balance sheet",
    ];

    pub const TECHNICAL: &[&str] = &["technical", "chart", "trend", "momentum", "rsi", "macd"];

    pub const COMPARISON: &[&str] = &["compare", "peer", "sector", "vs", "against"];

    pub const MACRO: &[&str] = &["macro", "economy", "gdp", "inflation", "interest rate"];

    pub const RISK: &[&str] = &["risk", "safe", "downside", "volatility"];

    pub const INVESTMENT: &[&str] = &["buy", "sell", "invest", "recommendation"];
}

/// A named group of keywords and the agents it activates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub keywords: Vec<String>,
    pub agents: Vec<AgentId>,
}

impl KeywordCategory {
    pub fn new(name: impl Into<String>, keywords: &[&str], agents: &[AgentId]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|kw| (*kw).to_string()).collect(),
            agents: agents.to_vec(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.keywords
            .iter()
            .any(|kw| !kw.is_empty() && query.contains(kw.as_str()))
    }
}

/// Built-in category table
pub fn default_categories() -> Vec<KeywordCategory> {
    use AgentId::{Fundamental, MacroContext, PeerComparison, RiskAssessment, Technical};

    vec![
        KeywordCategory::new(
            "fundamental",
            keywords::FUNDAMENTAL,
            &[Fundamental, PeerComparison, RiskAssessment],
        ),
        KeywordCategory::new("technical", keywords::TECHNICAL, &[Technical, RiskAssessment]),
        KeywordCategory::new(
            "comparison",
            keywords::COMPARISON,
            &[Fundamental, PeerComparison, Technical],
        ),
        KeywordCategory::new(
            "macro",
            keywords::MACRO,
            &[MacroContext, Fundamental, RiskAssessment],
        ),
        KeywordCategory::new("risk", keywords::RISK, &[RiskAssessment, Fundamental, Technical]),
        KeywordCategory::new("investment", keywords::INVESTMENT, &AgentId::ALL),
    ]
}

/// Result of routing a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Name of the matched category, `None` when falling back to all agents
    pub category: Option<String>,
    /// Agents to invoke, in priority order, without duplicates
    pub agents: Vec<AgentId>,
}

/// Rule-based agent selector
#[derive(Debug, Clone)]
pub struct AgentSelector {
    categories: Vec<KeywordCategory>,
}

impl Default for AgentSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentSelector {
    /// Create a selector with the built-in category table
    pub fn new() -> Self {
        Self::with_categories(default_categories())
    }

    /// Create a selector with a custom category table; order is priority
    pub fn with_categories(categories: Vec<KeywordCategory>) -> Self {
        let categories = categories
            .into_iter()
            .map(|mut category| {
                category.keywords = category
                    .keywords
                    .iter()
                    .map(|kw| kw.trim().to_lowercase())
                    .collect();
                category
            })
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> &[KeywordCategory] {
        &self.categories
    }

    /// Agents to consult for a query
    pub fn select_active(&self, query: &str) -> Vec<AgentId> {
        self.route(query).agents
    }

    /// Route a query and report which category matched
    pub fn route(&self, query: &str) -> Selection {
        let query_lower = query.to_lowercase();

        let matched = self
            .categories
            .iter()
            .find(|category| !category.agents.is_empty() && category.matches(&query_lower));

        let selection = match matched {
            Some(category) => Selection {
                category: Some(category.name.clone()),
                agents: dedup_in_order(&category.agents),
            },
            None => Selection {
                category: None,
                agents: AgentId::ALL.to_vec(),
            },
        };

        tracing::debug!(
            category = selection.category.as_deref().unwrap_or("default"),
            agents = ?selection.agents,
            "Selected agents for query"
        );

        selection
    }
}

fn dedup_in_order(agents: &[AgentId]) -> Vec<AgentId> {
    let mut unique = Vec::with_capacity(agents.len());
    for agent in agents {
        if !unique.contains(agent) {
            unique.push(*agent);
        }
    }
    unique
}
