//! Analysis context for agents
//!
//! The `AnalysisContext` carries the per-request information every agent
//! sees: which ticker is being analysed, the user's question, and their
//! investment preference. It is created once per request and shared
//! read-only across all agents.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Investing style the user leans towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentPreference {
    Value,
    Growth,
    #[default]
    Balanced,
}

impl InvestmentPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Growth => "growth",
            Self::Balanced => "balanced",
        }
    }
}

impl fmt::Display for InvestmentPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "growth" => Ok(Self::Growth),
            "balanced" | "" => Ok(Self::Balanced),
            other => Err(Error::Generic(format!(
                "Unknown investment preference: {other} (expected value, growth or balanced)"
            ))),
        }
    }
}

/// Immutable request context shared by all agents
///
/// # Example
///
/// ```
/// use agent_core::{AnalysisContext, InvestmentPreference};
///
/// let ctx = AnalysisContext::new("AAPL", "Is it a good buy?", InvestmentPreference::Value);
///
/// assert_eq!(ctx.ticker(), "AAPL");
/// assert_eq!(ctx.preference(), InvestmentPreference::Value);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    ticker: String,
    query: String,
    preference: InvestmentPreference,
    timestamp: DateTime<Utc>,
}

impl AnalysisContext {
    /// Create a context stamped with the current time
    pub fn new(
        ticker: impl Into<String>,
        query: impl Into<String>,
        preference: InvestmentPreference,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            query: query.into(),
            preference,
            timestamp: Utc::now(),
        }
    }

    /// Override the creation timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn preference(&self) -> InvestmentPreference {
        self.preference
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_preference_parsing() {
        assert_eq!(
            "VALUE".parse::<InvestmentPreference>().unwrap(),
            InvestmentPreference::Value
        );
        assert_eq!(
            " growth ".parse::<InvestmentPreference>().unwrap(),
            InvestmentPreference::Growth
        );
        assert_eq!(
            "".parse::<InvestmentPreference>().unwrap(),
            InvestmentPreference::Balanced
        );
        assert!("momentum".parse::<InvestmentPreference>().is_err());
    }

    #[test]
    fn test_default_preference_is_balanced() {
        assert_eq!(
            InvestmentPreference::default(),
            InvestmentPreference::Balanced
        );
    }

    #[test]
    fn test_context_accessors() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let ctx = AnalysisContext::new("MSFT", "technical setup?", InvestmentPreference::Growth)
            .with_timestamp(ts);

        assert_eq!(ctx.ticker(), "MSFT");
        assert_eq!(ctx.query(), "technical setup?");
        assert_eq!(ctx.preference(), InvestmentPreference::Growth);
        assert_eq!(ctx.timestamp(), ts);
    }
}
