//! Fundamental analysis agent
//!
//! Scores valuation multiples, profitability, balance-sheet leverage and
//! revenue growth.

use agent_core::{
    Agent, AgentId, AgentResult, AnalysisContext, InvestmentPreference, KeyMetrics, Result,
    clamp_score,
};
use async_trait::async_trait;
use std::sync::Arc;

use super::ScoreCard;
use super::scoring::{count_present, finite, fmt_num, fmt_pct};
use crate::config::EngineConfig;
use crate::data::{Fundamentals, MarketDataProvider};

/// Sub-scores produced by [`FundamentalAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalScores {
    pub valuation: f64,
    pub profitability: f64,
    pub financial_health: f64,
    pub growth: f64,
}

impl FundamentalScores {
    pub fn compute(fundamentals: &Fundamentals) -> Self {
        Self {
            valuation: valuation_score(
                finite(fundamentals.pe_ratio),
                finite(fundamentals.pb_ratio),
            ),
            profitability: profitability_score(
                finite(fundamentals.roe),
                finite(fundamentals.profit_margin),
            ),
            financial_health: financial_health_score(finite(fundamentals.debt_to_equity)),
            growth: growth_score(finite(fundamentals.revenue_growth)),
        }
    }
}

impl ScoreCard for FundamentalScores {
    fn named_scores(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("valuation_score", self.valuation),
            ("profitability_score", self.profitability),
            ("financial_health_score", self.financial_health),
            ("growth_score", self.growth),
        ]
    }
}

fn valuation_score(pe: Option<f64>, pb: Option<f64>) -> f64 {
    let mut score = 0.5;

    if let Some(pe) = pe {
        if pe <= 0.0 {
            score -= 0.2;
        } else if pe < 10.0 {
            score += 0.4;
        } else if pe <= 20.0 {
            score += 0.3;
        } else if pe > 30.0 {
            score -= 0.2;
        }
    }

    if let Some(pb) = pb {
        if pb > 0.0 && pb < 1.0 {
            score += 0.3;
        } else if (1.0..=3.0).contains(&pb) {
            score += 0.2;
        }
    }

    clamp_score(score)
}

fn profitability_score(roe: Option<f64>, margin: Option<f64>) -> f64 {
    let mut score = 0.5;

    match roe {
        Some(roe) if roe >= 0.15 => score += 0.3,
        Some(roe) if roe >= 0.10 => score += 0.2,
        _ => {},
    }

    match margin {
        Some(margin) if margin >= 0.15 => score += 0.2,
        Some(margin) if margin >= 0.10 => score += 0.1,
        _ => {},
    }

    clamp_score(score)
}

fn financial_health_score(debt_to_equity: Option<f64>) -> f64 {
    match debt_to_equity {
        None => 0.5,
        Some(de) if de <= 0.3 => 0.9,
        Some(de) if de <= 0.6 => 0.7,
        Some(de) if de <= 1.0 => 0.5,
        Some(_) => 0.3,
    }
}

fn growth_score(revenue_growth: Option<f64>) -> f64 {
    match revenue_growth {
        None => 0.5,
        Some(g) if g >= 0.15 => 0.9,
        Some(g) if g >= 0.10 => 0.7,
        Some(g) if g >= 0.05 => 0.6,
        Some(g) if g < 0.0 => 0.3,
        Some(_) => 0.5,
    }
}

/// Agent scoring company fundamentals
pub struct FundamentalAgent {
    config: Arc<EngineConfig>,
    provider: Arc<dyn MarketDataProvider>,
}

impl FundamentalAgent {
    /// Create a new fundamental agent
    pub fn new(config: Arc<EngineConfig>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { config, provider }
    }

    /// Score a set of fundamentals
    pub fn evaluate(
        &self,
        fundamentals: &Fundamentals,
        preference: InvestmentPreference,
    ) -> AgentResult {
        let scores = FundamentalScores::compute(fundamentals);

        let available = count_present(&[
            fundamentals.pe_ratio,
            fundamentals.roe,
            fundamentals.debt_to_equity,
            fundamentals.profit_margin,
        ]);
        let confidence = (0.5 + 0.4 * available as f64 / 4.0).min(0.95);

        AgentResult::new(
            self.id(),
            self.weight(),
            scores.to_sub_scores(),
            &self.config.thresholds,
        )
        .with_rationale(rationale(fundamentals, &scores, preference))
        .with_key_metrics(key_metrics(fundamentals))
        .with_confidence(confidence)
    }
}

fn rationale(
    fundamentals: &Fundamentals,
    scores: &FundamentalScores,
    preference: InvestmentPreference,
) -> String {
    let mut parts = vec![format!(
        "P/E: {}, ROE: {}, D/E: {}, Revenue growth: {}.",
        fmt_num(fundamentals.pe_ratio, 1),
        fmt_pct(fundamentals.roe),
        fmt_num(fundamentals.debt_to_equity, 2),
        fmt_pct(fundamentals.revenue_growth),
    )];

    if scores.valuation >= 0.7 {
        parts.push("Valuation looks attractive.".to_string());
    } else if scores.valuation <= 0.4 {
        parts.push("Valuation looks stretched.".to_string());
    }

    if scores.profitability >= 0.7 {
        parts.push("Profitability is strong.".to_string());
    }

    if scores.financial_health >= 0.7 {
        parts.push("Balance sheet is conservatively financed.".to_string());
    } else if scores.financial_health <= 0.3 {
        parts.push("Leverage is elevated.".to_string());
    }

    if scores.growth >= 0.7 {
        parts.push("Revenue growth is robust.".to_string());
    } else if scores.growth <= 0.3 {
        parts.push("Revenue is contracting.".to_string());
    }

    match preference {
        InvestmentPreference::Value if scores.valuation >= 0.7 => {
            parts.push("Fits a value-oriented approach.".to_string());
        },
        InvestmentPreference::Value if scores.valuation <= 0.4 => {
            parts.push("Pricing leaves little room for a value investor.".to_string());
        },
        InvestmentPreference::Growth if scores.growth >= 0.7 => {
            parts.push("Fits a growth-oriented approach.".to_string());
        },
        InvestmentPreference::Growth if scores.growth <= 0.5 => {
            parts.push("Growth profile is modest for a growth investor.".to_string());
        },
        _ => {},
    }

    parts.join(" ")
}

fn key_metrics(fundamentals: &Fundamentals) -> KeyMetrics {
    KeyMetrics::new()
        .with("pe_ratio", finite(fundamentals.pe_ratio))
        .with("pb_ratio", finite(fundamentals.pb_ratio))
        .with("roe", finite(fundamentals.roe))
        .with("debt_to_equity", finite(fundamentals.debt_to_equity))
        .with("profit_margin", finite(fundamentals.profit_margin))
        .with("revenue_growth", finite(fundamentals.revenue_growth))
        .with("market_cap", finite(fundamentals.market_cap))
        .with("sector", fundamentals.sector.as_deref())
}

#[async_trait]
impl Agent for FundamentalAgent {
    async fn analyze(&self, ticker: &str, context: &AnalysisContext) -> Result<AgentResult> {
        let ticker = super::require_ticker(ticker)?;
        let snapshot = self.provider.snapshot(ticker).await?;

        let result = self.evaluate(&snapshot.fundamentals, context.preference());
        tracing::debug!(
            ticker,
            score = result.overall_score(),
            signal = %result.signal(),
            "Fundamental analysis complete"
        );
        Ok(result)
    }

    fn id(&self) -> AgentId {
        AgentId::Fundamental
    }

    fn weight(&self) -> f64 {
        self.config.weights.weight(AgentId::Fundamental)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support;
    use crate::data::MarketSnapshot;
    use agent_core::Signal;

    fn cheap_quality() -> Fundamentals {
        Fundamentals {
            pe_ratio: Some(12.0),
            pb_ratio: Some(1.5),
            roe: Some(0.22),
            debt_to_equity: Some(0.2),
            profit_margin: Some(0.18),
            revenue_growth: Some(0.16),
            ..Fundamentals::default()
        }
    }

    #[test]
    fn test_valuation_curve() {
        assert!((valuation_score(Some(8.0), None) - 0.9).abs() < 1e-9);
        assert!((valuation_score(Some(15.0), Some(2.0)) - 1.0).abs() < 1e-9);
        assert!((valuation_score(Some(25.0), None) - 0.5).abs() < 1e-9);
        assert!((valuation_score(Some(45.0), None) - 0.3).abs() < 1e-9);
        assert!((valuation_score(Some(-12.0), None) - 0.3).abs() < 1e-9);
        assert!((valuation_score(None, Some(0.5)) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_growth_and_health_bands() {
        assert_eq!(growth_score(Some(0.2)), 0.9);
        assert_eq!(growth_score(Some(0.07)), 0.6);
        assert_eq!(growth_score(Some(0.02)), 0.5);
        assert_eq!(growth_score(Some(-0.05)), 0.3);
        assert_eq!(financial_health_score(Some(0.5)), 0.7);
        assert_eq!(financial_health_score(Some(150.0)), 0.3);
        assert_eq!(financial_health_score(None), 0.5);
    }

    #[test]
    fn test_missing_data_is_neutral_with_low_confidence() {
        let agent = FundamentalAgent::new(
            test_support::config(),
            test_support::provider(MarketSnapshot::new("X")),
        );
        let result = agent.evaluate(&Fundamentals::default(), InvestmentPreference::Balanced);

        for (_, value) in result.scores().iter() {
            assert!((value - 0.5).abs() < 1e-9);
        }
        assert!((result.confidence() - 0.5).abs() < 1e-9);
        assert_eq!(result.key_metrics().number("pe_ratio"), None);
        assert!(result.rationale().contains("P/E: N/A"));
    }

    #[test]
    fn test_pathological_inputs_stay_bounded() {
        let fundamentals = Fundamentals {
            pe_ratio: Some(-1e12),
            pb_ratio: Some(f64::INFINITY),
            roe: Some(f64::NAN),
            debt_to_equity: Some(250.0),
            profit_margin: Some(-3.0),
            revenue_growth: Some(1e9),
            ..Fundamentals::default()
        };
        let scores = FundamentalScores::compute(&fundamentals);
        for (_, value) in scores.named_scores() {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[tokio::test]
    async fn test_analyze_quality_company() {
        let mut snapshot = MarketSnapshot::new("INFY.NS");
        snapshot.fundamentals = cheap_quality();
        let agent = FundamentalAgent::new(test_support::config(), test_support::provider(snapshot));
        let ctx = AnalysisContext::new("INFY.NS", "", InvestmentPreference::Value);

        let result = agent.analyze("INFY.NS", &ctx).await.unwrap();

        assert_eq!(result.agent(), AgentId::Fundamental);
        assert!((result.weight() - 0.30).abs() < f64::EPSILON);
        assert!(result.overall_score() > 0.85);
        assert_eq!(result.signal(), Signal::StrongBuy);
        assert!((result.confidence() - 0.9).abs() < 1e-9);
        assert!(result.rationale().contains("value-oriented"));
        assert_eq!(result.key_metrics().number("roe"), Some(0.22));
    }

    #[tokio::test]
    async fn test_analyze_errors_on_missing_snapshot() {
        let agent = FundamentalAgent::new(
            test_support::config(),
            test_support::provider(MarketSnapshot::new("AAPL")),
        );
        let ctx = AnalysisContext::new("MSFT", "", InvestmentPreference::Balanced);

        assert!(agent.analyze("MSFT", &ctx).await.is_err());
        assert!(matches!(
            agent.analyze("", &ctx).await,
            Err(agent_core::Error::InvalidTicker(_))
        ));
    }
}
