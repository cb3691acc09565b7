//! Insight, risk and opportunity extraction
//!
//! Strong and weak sub-scores are translated to fixed phrases through a
//! per-agent lookup table. Key insights come from a handful of raw metrics.

use crate::config::ExtractionConfig;
use agent_core::{AgentId, AgentResult};

/// Phrase for a weak sub-score, if the metric has one
pub fn risk_phrase(agent: AgentId, metric: &str) -> Option<&'static str> {
    let phrase = match (agent, metric) {
        (AgentId::Fundamental, "valuation_score") => "Expensive valuation multiples",
        (AgentId::Fundamental, "profitability_score") => "Weak profitability metrics",
        (AgentId::Fundamental, "financial_health_score") => "Poor financial health",
        (AgentId::Fundamental, "growth_score") => "Declining revenue",

        (AgentId::Technical, "momentum_score") => "Negative price momentum",
        (AgentId::Technical, "trend_score") => "Bearish trend signals",
        (AgentId::Technical, "macd_score") => "Bearish MACD crossover",
        (AgentId::Technical, "volatility_score") => "Price stretched toward upper Bollinger Band",
        (AgentId::Technical, "price_position_score") => "Extended within 52-week range",

        (AgentId::PeerComparison, "relative_valuation_score") => "Valuation premium to peers",
        (AgentId::PeerComparison, "relative_profitability_score") => "Profitability lags peers",
        (AgentId::PeerComparison, "relative_growth_score") => "Growth trails peers",
        (AgentId::PeerComparison, "peer_ranking_score") => "Bottom-tier peer ranking",

        (AgentId::MacroContext, "gdp_impact_score") => "Weak economic growth backdrop",
        (AgentId::MacroContext, "interest_rate_impact_score") => {
            "Unfavourable interest rate environment"
        },
        (AgentId::MacroContext, "inflation_impact_score") => "Elevated inflation pressure",
        (AgentId::MacroContext, "currency_impact_score") => "Adverse currency conditions",
        (AgentId::MacroContext, "market_sentiment_score") => "Negative market sentiment",

        (AgentId::RiskAssessment, "valuation_risk_score") => "High valuation risk",
        (AgentId::RiskAssessment, "financial_risk_score") => "Elevated financial risk",
        (AgentId::RiskAssessment, "volatility_risk_score") => "High price volatility",
        (AgentId::RiskAssessment, "liquidity_risk_score") => "Limited trading liquidity",
        (AgentId::RiskAssessment, "safety_margin_score") => "Limited safety margin",
        (AgentId::RiskAssessment, "downside_risk_score") => "Elevated downside risk",

        _ => return None,
    };
    Some(phrase)
}

/// Phrase for a strong sub-score, if the metric has one
pub fn opportunity_phrase(agent: AgentId, metric: &str) -> Option<&'static str> {
    let phrase = match (agent, metric) {
        (AgentId::Fundamental, "valuation_score") => "Attractive valuation opportunity",
        (AgentId::Fundamental, "profitability_score") => "Strong profitability metrics",
        (AgentId::Fundamental, "financial_health_score") => "Conservative balance sheet",
        (AgentId::Fundamental, "growth_score") => "Solid growth prospects",

        (AgentId::Technical, "momentum_score") => "Positive momentum building",
        (AgentId::Technical, "trend_score") => "Strong uptrend in place",
        (AgentId::Technical, "macd_score") => "Bullish MACD crossover",
        (AgentId::Technical, "volatility_score") => "Price near lower Bollinger Band",
        (AgentId::Technical, "price_position_score") => "Healthy position within 52-week range",

        (AgentId::PeerComparison, "relative_valuation_score") => "Valuation discount to peers",
        (AgentId::PeerComparison, "relative_profitability_score") => "Profitability ahead of peers",
        (AgentId::PeerComparison, "relative_growth_score") => "Growth outpacing peers",
        (AgentId::PeerComparison, "peer_ranking_score") => "Top-tier peer ranking",

        (AgentId::MacroContext, "gdp_impact_score") => "Favorable economic environment",
        (AgentId::MacroContext, "interest_rate_impact_score") => {
            "Supportive interest rate environment"
        },
        (AgentId::MacroContext, "inflation_impact_score") => "Benign inflation",
        (AgentId::MacroContext, "currency_impact_score") => "Currency tailwind",
        (AgentId::MacroContext, "market_sentiment_score") => "Positive market sentiment",

        (AgentId::RiskAssessment, "valuation_risk_score") => "Low valuation risk",
        (AgentId::RiskAssessment, "financial_risk_score") => "Low financial risk",
        (AgentId::RiskAssessment, "volatility_risk_score") => "Low price volatility",
        (AgentId::RiskAssessment, "liquidity_risk_score") => "Highly liquid stock",
        (AgentId::RiskAssessment, "safety_margin_score") => "Healthy margin of safety",
        (AgentId::RiskAssessment, "downside_risk_score") => "Limited downside risk",

        _ => return None,
    };
    Some(phrase)
}

/// Risk factors and opportunities from sub-scores, in result order
pub(crate) fn risks_and_opportunities(
    results: &[&AgentResult],
    config: &ExtractionConfig,
) -> (Vec<String>, Vec<String>) {
    let mut risks = Vec::new();
    let mut opportunities = Vec::new();

    for result in results {
        for (metric, value) in result.scores().iter() {
            if value >= config.opportunity_threshold {
                if let Some(phrase) = opportunity_phrase(result.agent(), metric) {
                    push_unique(&mut opportunities, phrase, config.max_opportunities);
                }
            } else if value <= config.risk_threshold {
                if let Some(phrase) = risk_phrase(result.agent(), metric) {
                    push_unique(&mut risks, phrase, config.max_risks);
                }
            }
        }
    }

    (risks, opportunities)
}

fn push_unique(list: &mut Vec<String>, phrase: &str, cap: usize) {
    if list.len() < cap && !list.iter().any(|existing| existing == phrase) {
        list.push(phrase.to_string());
    }
}

/// First value of a metric among the preferred agents' results
fn metric(results: &[&AgentResult], agents: &[AgentId], key: &str) -> Option<f64> {
    agents.iter().find_map(|agent| {
        results
            .iter()
            .find(|result| result.agent() == *agent)
            .and_then(|result| result.key_metrics().number(key))
    })
}

/// Threshold-based observations on P/E, ROE, RSI and leverage
pub(crate) fn key_insights(results: &[&AgentResult], max: usize) -> Vec<String> {
    use AgentId::{Fundamental, RiskAssessment, Technical};

    let mut insights = Vec::new();

    if let Some(pe) = metric(results, &[Fundamental, RiskAssessment], "pe_ratio") {
        if pe > 0.0 && pe < 15.0 {
            insights.push(format!("Attractive valuation with P/E of {pe:.1}"));
        }
    }

    if let Some(roe) = metric(results, &[Fundamental, RiskAssessment], "roe") {
        if roe > 0.15 {
            insights.push(format!(
                "Strong profitability with ROE of {:.1}%",
                roe * 100.0
            ));
        }
    }

    if let Some(rsi) = metric(results, &[Technical], "rsi14") {
        if rsi < 30.0 {
            insights.push("Oversold conditions may present buying opportunity".to_string());
        } else if rsi > 70.0 {
            insights.push("Overbought conditions suggest caution".to_string());
        }
    }

    if let Some(de) = metric(results, &[RiskAssessment, Fundamental], "debt_to_equity") {
        if de < 0.3 {
            insights.push("Conservative balance sheet with low debt".to_string());
        } else if de > 1.0 {
            insights.push("High debt levels warrant careful monitoring".to_string());
        }
    }

    insights.truncate(max);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{KeyMetrics, SignalThresholds, SubScoreSet};

    fn result(agent: AgentId, scores: &[(&str, f64)], metrics: KeyMetrics) -> AgentResult {
        let scores: SubScoreSet = scores.iter().map(|(n, v)| (*n, *v)).collect();
        AgentResult::new(agent, 0.2, scores, &SignalThresholds::default()).with_key_metrics(metrics)
    }

    #[test]
    fn test_phrase_tables() {
        assert_eq!(
            risk_phrase(AgentId::Fundamental, "valuation_score"),
            Some("Expensive valuation multiples")
        );
        assert_eq!(
            opportunity_phrase(AgentId::MacroContext, "gdp_impact_score"),
            Some("Favorable economic environment")
        );
        assert_eq!(risk_phrase(AgentId::Technical, "valuation_score"), None);
    }

    #[test]
    fn test_extraction_thresholds_and_order() {
        let fundamental = result(
            AgentId::Fundamental,
            &[("valuation_score", 0.9), ("financial_health_score", 0.3), ("growth_score", 0.55)],
            KeyMetrics::new(),
        );
        let technical = result(
            AgentId::Technical,
            &[("momentum_score", 0.4), ("trend_score", 0.7)],
            KeyMetrics::new(),
        );

        let (risks, opportunities) =
            risks_and_opportunities(&[&fundamental, &technical], &ExtractionConfig::default());

        assert_eq!(risks, vec!["Poor financial health", "Negative price momentum"]);
        assert_eq!(
            opportunities,
            vec!["Attractive valuation opportunity", "Strong uptrend in place"]
        );
    }

    #[test]
    fn test_extraction_caps() {
        let risk = result(
            AgentId::RiskAssessment,
            &[
                ("valuation_risk_score", 0.1),
                ("financial_risk_score", 0.1),
                ("volatility_risk_score", 0.1),
                ("liquidity_risk_score", 0.1),
                ("safety_margin_score", 0.1),
                ("downside_risk_score", 0.1),
            ],
            KeyMetrics::new(),
        );

        let (risks, opportunities) =
            risks_and_opportunities(&[&risk], &ExtractionConfig::default());
        assert_eq!(risks.len(), 4);
        assert!(opportunities.is_empty());
    }

    #[test]
    fn test_key_insights() {
        let fundamental = result(
            AgentId::Fundamental,
            &[],
            KeyMetrics::new()
                .with("pe_ratio", 12.0)
                .with("roe", 0.21)
                .with("debt_to_equity", 1.4),
        );
        let technical = result(AgentId::Technical, &[], KeyMetrics::new().with("rsi14", 25.0));
        let risk = result(
            AgentId::RiskAssessment,
            &[],
            KeyMetrics::new().with("debt_to_equity", 0.0),
        );

        let insights = key_insights(&[&fundamental, &technical, &risk], 5);
        assert_eq!(
            insights,
            vec![
                "Attractive valuation with P/E of 12.0",
                "Strong profitability with ROE of 21.0%",
                "Oversold conditions may present buying opportunity",
                "Conservative balance sheet with low debt",
            ]
        );

        assert_eq!(key_insights(&[&fundamental, &technical, &risk], 2).len(), 2);
    }

    #[test]
    fn test_negative_pe_is_not_attractive() {
        let fundamental = result(
            AgentId::Fundamental,
            &[],
            KeyMetrics::new().with("pe_ratio", -6.0),
        );
        assert!(key_insights(&[&fundamental], 5).is_empty());
    }
}
