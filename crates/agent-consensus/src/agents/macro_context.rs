//! Macro context agent
//!
//! Scores the economic backdrop (growth, rates, inflation, currency and
//! market mood) and tilts it by how sensitive the company's sector is to
//! each driver.

use agent_core::{Agent, AgentId, AgentResult, AnalysisContext, KeyMetrics, Result, clamp_score};
use async_trait::async_trait;
use std::sync::Arc;

use super::ScoreCard;
use super::scoring::{count_present, finite};
use crate::config::{EngineConfig, MacroConfig, SectorSensitivity};
use crate::data::{FlowDirection, MacroIndicators, MarketDataProvider, MarketSentiment};

/// Sub-scores produced by [`MacroContextAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroScores {
    pub gdp_impact: f64,
    pub interest_rate_impact: f64,
    pub inflation_impact: f64,
    pub currency_impact: f64,
    pub market_sentiment: f64,
}

impl MacroScores {
    pub fn compute(
        indicators: &MacroIndicators,
        sector: Option<&str>,
        config: &MacroConfig,
    ) -> Self {
        let sensitivity = config.sensitivity(sector);
        Self {
            gdp_impact: gdp_score(finite(indicators.gdp_growth), sensitivity),
            interest_rate_impact: interest_rate_score(finite(indicators.policy_rate), sensitivity),
            inflation_impact: inflation_score(finite(indicators.inflation_rate)),
            currency_impact: currency_score(
                finite(indicators.fx_rate),
                finite(indicators.fx_volatility),
                config.is_export_sector(sector),
                config,
            ),
            market_sentiment: sentiment_score(
                indicators.market_sentiment,
                indicators.foreign_flows,
            ),
        }
    }
}

impl ScoreCard for MacroScores {
    fn named_scores(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("gdp_impact_score", self.gdp_impact),
            ("interest_rate_impact_score", self.interest_rate_impact),
            ("inflation_impact_score", self.inflation_impact),
            ("currency_impact_score", self.currency_impact),
            ("market_sentiment_score", self.market_sentiment),
        ]
    }
}

fn gdp_score(gdp_growth: Option<f64>, sensitivity: SectorSensitivity) -> f64 {
    let Some(gdp) = gdp_growth else {
        return 0.5;
    };
    let band = if gdp >= 7.0 {
        0.8
    } else if gdp >= 6.0 {
        0.7
    } else if gdp >= 5.0 {
        0.5
    } else {
        0.3
    };
    clamp_score(0.5 + (band - 0.5) * sensitivity.gdp_growth.abs())
}

fn interest_rate_score(policy_rate: Option<f64>, sensitivity: SectorSensitivity) -> f64 {
    let Some(rate) = policy_rate else {
        return 0.5;
    };
    let band: f64 = if rate <= 5.0 {
        0.7
    } else if rate <= 6.5 {
        0.6
    } else if rate <= 8.0 {
        0.4
    } else {
        0.3
    };

    let s = sensitivity.interest_rates;
    let score = if s < 0.0 {
        // Rate-sensitive sector: the same rate move matters more.
        0.5 + (band - 0.5) * (1.0 + s.abs())
    } else if s > 0.0 {
        // Beneficiary of higher rates, e.g. lenders.
        0.5 - (band - 0.5) * s
    } else {
        band
    };
    clamp_score(score)
}

fn inflation_score(inflation: Option<f64>) -> f64 {
    match inflation {
        None => 0.5,
        Some(i) if i <= 4.0 => 0.7,
        Some(i) if i <= 6.0 => 0.6,
        Some(i) if i <= 8.0 => 0.4,
        Some(_) => 0.2,
    }
}

fn currency_score(
    fx_rate: Option<f64>,
    fx_volatility: Option<f64>,
    export_sector: bool,
    config: &MacroConfig,
) -> f64 {
    let mut score = 0.5;

    if export_sector {
        match fx_rate {
            Some(fx) if fx >= config.fx_favorable => score = 0.7,
            Some(fx) if fx <= config.fx_unfavorable => score = 0.4,
            _ => {},
        }
    }

    match fx_volatility {
        Some(vol) if vol <= 0.5 => score += 0.1,
        Some(vol) if vol >= 2.0 => score -= 0.1,
        _ => {},
    }

    clamp_score(score)
}

fn sentiment_score(sentiment: Option<MarketSentiment>, flows: Option<FlowDirection>) -> f64 {
    let mut score = 0.5;

    match sentiment {
        Some(MarketSentiment::Bullish) => score += 0.2,
        Some(MarketSentiment::Bearish) => score -= 0.2,
        _ => {},
    }

    match flows {
        Some(FlowDirection::Positive) => score += 0.1,
        Some(FlowDirection::Negative) => score -= 0.1,
        _ => {},
    }

    clamp_score(score)
}

/// Agent weighing the macroeconomic environment
pub struct MacroContextAgent {
    config: Arc<EngineConfig>,
    provider: Arc<dyn MarketDataProvider>,
}

impl MacroContextAgent {
    /// Create a new macro context agent
    pub fn new(config: Arc<EngineConfig>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { config, provider }
    }

    pub fn evaluate(&self, indicators: &MacroIndicators, sector: Option<&str>) -> AgentResult {
        let macro_config = &self.config.macro_context;
        let scores = MacroScores::compute(indicators, sector, macro_config);

        let available = count_present(&[
            indicators.gdp_growth,
            indicators.inflation_rate,
            indicators.policy_rate,
            indicators.fx_rate,
        ]);
        let confidence = (0.5 + 0.3 * available as f64 / 4.0).min(0.85);

        AgentResult::new(
            self.id(),
            self.weight(),
            scores.to_sub_scores(),
            &self.config.thresholds,
        )
        .with_rationale(rationale(indicators, sector, &scores, macro_config))
        .with_key_metrics(key_metrics(indicators, sector, macro_config))
        .with_confidence(confidence)
    }
}

fn rationale(
    m: &MacroIndicators,
    sector: Option<&str>,
    scores: &MacroScores,
    config: &MacroConfig,
) -> String {
    let mut parts = Vec::new();

    if let Some(gdp) = finite(m.gdp_growth) {
        let view = if scores.gdp_impact > 0.5 {
            "supports demand"
        } else if scores.gdp_impact < 0.5 {
            "weighs on demand"
        } else {
            "is broadly neutral"
        };
        parts.push(format!("GDP growth of {gdp:.1}% {view}."));
    }

    if let Some(rate) = finite(m.policy_rate) {
        let view = if scores.interest_rate_impact >= 0.6 {
            "accommodative"
        } else if scores.interest_rate_impact <= 0.4 {
            "restrictive"
        } else {
            "neutral"
        };
        parts.push(format!(
            "Policy rate of {rate:.2}% is {view} for this business."
        ));
    }

    if let Some(inflation) = finite(m.inflation_rate) {
        if inflation <= 4.0 {
            parts.push(format!(
                "Inflation at {inflation:.1}% sits within the central bank comfort zone."
            ));
        } else if inflation > 6.0 {
            parts.push(format!("Inflation at {inflation:.1}% squeezes margins."));
        }
    }

    if config.is_export_sector(sector) {
        if let Some(fx) = finite(m.fx_rate) {
            if fx >= config.fx_favorable {
                parts.push(format!("Exchange rate of {fx:.2} favours export earnings."));
            } else if fx <= config.fx_unfavorable {
                parts.push(format!("Exchange rate of {fx:.2} pressures export earnings."));
            }
        }
        if let Some(growth) = finite(m.sector_spending_growth) {
            parts.push(format!("Sector spending is growing at {growth:.1}%."));
        }
    }

    let sector_name = sector.unwrap_or_default();
    if sector_name.eq_ignore_ascii_case("Energy") {
        if let Some(crude) = finite(m.crude_oil_price) {
            parts.push(format!("Crude at {crude:.1} drives sector earnings."));
        }
    }
    let lender = sector_name.eq_ignore_ascii_case("Banking");
    if lender && config.sensitivity(sector).interest_rates > 0.0 {
        parts.push("Lenders tend to earn wider margins when rates are high.".to_string());
    }

    match m.market_sentiment {
        Some(MarketSentiment::Bullish) => parts.push("Market sentiment is bullish.".to_string()),
        Some(MarketSentiment::Bearish) => parts.push("Market sentiment is bearish.".to_string()),
        _ => {},
    }
    match m.foreign_flows {
        Some(FlowDirection::Positive) => {
            parts.push("Foreign investors are net buyers.".to_string());
        },
        Some(FlowDirection::Negative) => {
            parts.push("Foreign investors are net sellers.".to_string());
        },
        _ => {},
    }

    if parts.is_empty() {
        return "Macro indicators unavailable; economic backdrop treated as neutral.".to_string();
    }
    parts.join(" ")
}

fn key_metrics(m: &MacroIndicators, sector: Option<&str>, config: &MacroConfig) -> KeyMetrics {
    let sensitivity = config.sensitivity(sector);
    KeyMetrics::new()
        .with("gdp_growth", finite(m.gdp_growth))
        .with("inflation_rate", finite(m.inflation_rate))
        .with("policy_rate", finite(m.policy_rate))
        .with("fx_rate", finite(m.fx_rate))
        .with("fx_volatility", finite(m.fx_volatility))
        .with("market_sentiment", m.market_sentiment)
        .with("foreign_flows", m.foreign_flows)
        .with("crude_oil_price", finite(m.crude_oil_price))
        .with("sector_spending_growth", finite(m.sector_spending_growth))
        .with("sector", sector)
        .with("interest_rate_sensitivity", sensitivity.interest_rates)
        .with("gdp_sensitivity", sensitivity.gdp_growth)
}

#[async_trait]
impl Agent for MacroContextAgent {
    async fn analyze(&self, ticker: &str, _context: &AnalysisContext) -> Result<AgentResult> {
        let ticker = super::require_ticker(ticker)?;
        let snapshot = self.provider.snapshot(ticker).await?;

        let result = self.evaluate(
            &snapshot.macro_indicators,
            snapshot.fundamentals.sector.as_deref(),
        );
        tracing::debug!(
            ticker,
            score = result.overall_score(),
            signal = %result.signal(),
            "Macro analysis complete"
        );
        Ok(result)
    }

    fn id(&self) -> AgentId {
        AgentId::MacroContext
    }

    fn weight(&self) -> f64 {
        self.config.weights.weight(AgentId::MacroContext)
    }
}
