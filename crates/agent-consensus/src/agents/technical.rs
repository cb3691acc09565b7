//! Technical analysis agent
//!
//! Scores momentum (RSI), moving-average trend, MACD, Bollinger Band
//! position and position within the 52-week range. Indicators are computed
//! upstream; this agent only interprets them.

use agent_core::{Agent, AgentId, AgentResult, AnalysisContext, KeyMetrics, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::ScoreCard;
use super::scoring::{count_present, finite, range_position};
use crate::config::EngineConfig;
use crate::data::{MarketDataProvider, MarketSnapshot};

/// Sub-scores produced by [`TechnicalAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalScores {
    pub momentum: f64,
    pub trend: f64,
    pub macd: f64,
    pub volatility: f64,
    pub price_position: f64,
}

/// Inputs after resolving the current price and dropping non-finite values
#[derive(Debug, Clone, Copy, Default)]
struct Readings {
    price: Option<f64>,
    rsi: Option<f64>,
    sma20: Option<f64>,
    sma50: Option<f64>,
    sma200: Option<f64>,
    macd: Option<f64>,
    macd_signal: Option<f64>,
    bb_upper: Option<f64>,
    bb_lower: Option<f64>,
    high_52w: Option<f64>,
    low_52w: Option<f64>,
}

impl Readings {
    fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let t = &snapshot.technicals;
        Self {
            price: finite(snapshot.current_price()),
            rsi: finite(t.rsi14),
            sma20: finite(t.sma20),
            sma50: finite(t.sma50),
            sma200: finite(t.sma200),
            macd: finite(t.macd),
            macd_signal: finite(t.macd_signal),
            bb_upper: finite(t.bb_upper),
            bb_lower: finite(t.bb_lower),
            high_52w: finite(snapshot.price.high_52w),
            low_52w: finite(snapshot.price.low_52w),
        }
    }

    fn bollinger_position(&self) -> Option<f64> {
        match (self.price, self.bb_lower, self.bb_upper) {
            (Some(price), Some(lower), Some(upper)) => range_position(price, lower, upper),
            _ => None,
        }
    }

    fn range_52w_position(&self) -> Option<f64> {
        match (self.price, self.low_52w, self.high_52w) {
            (Some(price), Some(low), Some(high)) => range_position(price, low, high),
            _ => None,
        }
    }
}

impl TechnicalScores {
    pub fn compute(snapshot: &MarketSnapshot) -> Self {
        Self::from_readings(&Readings::from_snapshot(snapshot))
    }

    fn from_readings(r: &Readings) -> Self {
        Self {
            momentum: momentum_score(r.rsi),
            trend: trend_score(r.price, r.sma20, r.sma50, r.sma200),
            macd: macd_score(r.macd, r.macd_signal),
            volatility: bollinger_score(r.bollinger_position()),
            price_position: range_score(r.range_52w_position()),
        }
    }
}

impl ScoreCard for TechnicalScores {
    fn named_scores(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("momentum_score", self.momentum),
            ("trend_score", self.trend),
            ("macd_score", self.macd),
            ("volatility_score", self.volatility),
            ("price_position_score", self.price_position),
        ]
    }
}

fn momentum_score(rsi: Option<f64>) -> f64 {
    match rsi {
        None => 0.5,
        Some(rsi) if rsi < 30.0 => 0.9,
        Some(rsi) if rsi < 40.0 => 0.8,
        Some(rsi) if rsi < 60.0 => 0.6,
        Some(rsi) if rsi < 70.0 => 0.4,
        Some(rsi) if rsi < 80.0 => 0.3,
        Some(_) => 0.2,
    }
}

fn trend_score(
    price: Option<f64>,
    sma20: Option<f64>,
    sma50: Option<f64>,
    sma200: Option<f64>,
) -> f64 {
    let (Some(price), Some(sma20)) = (price, sma20) else {
        return 0.5;
    };

    if let Some(sma50) = sma50 {
        if price > sma20 && sma20 > sma50 {
            return if sma200.is_some_and(|sma200| sma50 > sma200) {
                0.9
            } else {
                0.8
            };
        }
        if price < sma20 && sma20 < sma50 {
            return if sma200.is_some_and(|sma200| sma50 < sma200) {
                0.1
            } else {
                0.2
            };
        }
    }

    if price > sma20 {
        0.6
    } else if price < sma20 {
        0.4
    } else {
        0.5
    }
}

fn macd_score(macd: Option<f64>, signal: Option<f64>) -> f64 {
    match (macd, signal) {
        (Some(macd), Some(signal)) if macd > signal => {
            if macd > 0.0 {
                0.8
            } else {
                0.6
            }
        },
        (Some(macd), Some(_)) => {
            if macd < 0.0 {
                0.2
            } else {
                0.4
            }
        },
        _ => 0.5,
    }
}

fn bollinger_score(position: Option<f64>) -> f64 {
    match position {
        Some(p) if (0.3..=0.7).contains(&p) => 0.7,
        Some(p) if p < 0.2 => 0.8,
        Some(p) if p > 0.8 => 0.3,
        _ => 0.5,
    }
}

fn range_score(position: Option<f64>) -> f64 {
    match position {
        Some(q) if (0.6..=0.8).contains(&q) => 0.8,
        Some(q) if (0.4..0.6).contains(&q) => 0.6,
        Some(q) if q < 0.3 => 0.7,
        Some(q) if q > 0.9 => 0.4,
        _ => 0.5,
    }
}

/// Agent interpreting technical indicators
pub struct TechnicalAgent {
    config: Arc<EngineConfig>,
    provider: Arc<dyn MarketDataProvider>,
}

impl TechnicalAgent {
    /// Create a new technical agent
    pub fn new(config: Arc<EngineConfig>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { config, provider }
    }

    pub fn evaluate(&self, snapshot: &MarketSnapshot) -> AgentResult {
        let readings = Readings::from_snapshot(snapshot);
        let scores = TechnicalScores::from_readings(&readings);

        let available = count_present(&[
            readings.rsi,
            readings.sma20,
            readings.sma50,
            readings.macd,
            readings.bb_upper,
        ]);
        let confidence = (0.6 + 0.3 * available as f64 / 5.0).min(0.95);

        AgentResult::new(
            self.id(),
            self.weight(),
            scores.to_sub_scores(),
            &self.config.thresholds,
        )
        .with_rationale(rationale(&readings, &scores))
        .with_key_metrics(key_metrics(&readings))
        .with_confidence(confidence)
    }
}

fn rationale(r: &Readings, scores: &TechnicalScores) -> String {
    let mut parts = Vec::new();

    match r.rsi {
        Some(rsi) if rsi < 30.0 => {
            parts.push(format!("RSI at {rsi:.1} signals oversold conditions."));
        },
        Some(rsi) if rsi > 70.0 => {
            parts.push(format!("RSI at {rsi:.1} signals overbought conditions."));
        },
        Some(rsi) => parts.push(format!("RSI at {rsi:.1} is in neutral territory.")),
        None => parts.push("RSI unavailable.".to_string()),
    }

    if scores.trend >= 0.8 {
        parts.push("Price is above rising moving averages, confirming an uptrend.".to_string());
    } else if scores.trend <= 0.2 {
        parts.push("Price is below falling moving averages, confirming a downtrend.".to_string());
    } else if scores.trend > 0.5 {
        parts.push("Price holds above its 20-day average.".to_string());
    } else if scores.trend < 0.5 {
        parts.push("Price trades below its 20-day average.".to_string());
    }

    if let (Some(macd), Some(signal)) = (r.macd, r.macd_signal) {
        if macd > signal {
            parts.push("MACD is above its signal line.".to_string());
        } else {
            parts.push("MACD is below its signal line.".to_string());
        }
    }

    if let Some(p) = r.bollinger_position() {
        if p < 0.2 {
            parts.push("Price is near the lower Bollinger Band.".to_string());
        } else if p > 0.8 {
            parts.push("Price is near the upper Bollinger Band.".to_string());
        }
    }

    if let Some(q) = r.range_52w_position() {
        parts.push(format!(
            "Trading at {:.0}% of the 52-week range.",
            (q * 100.0).clamp(0.0, 100.0)
        ));
    }

    parts.join(" ")
}

fn key_metrics(r: &Readings) -> KeyMetrics {
    KeyMetrics::new()
        .with("current_price", r.price)
        .with("rsi14", r.rsi)
        .with("sma20", r.sma20)
        .with("sma50", r.sma50)
        .with("sma200", r.sma200)
        .with("macd", r.macd)
        .with("macd_signal", r.macd_signal)
        .with("bb_upper", r.bb_upper)
        .with("bb_lower", r.bb_lower)
        .with("high_52w", r.high_52w)
        .with("low_52w", r.low_52w)
        .with("bollinger_position", r.bollinger_position())
        .with("range_position_52w", r.range_52w_position())
}

#[async_trait]
impl Agent for TechnicalAgent {
    async fn analyze(&self, ticker: &str, _context: &AnalysisContext) -> Result<AgentResult> {
        let ticker = super::require_ticker(ticker)?;
        let snapshot = self.provider.snapshot(ticker).await?;

        let result = self.evaluate(&snapshot);
        tracing::debug!(
            ticker,
            score = result.overall_score(),
            signal = %result.signal(),
            "Technical analysis complete"
        );
        Ok(result)
    }

    fn id(&self) -> AgentId {
        AgentId::Technical
    }

    fn weight(&self) -> f64 {
        self.config.weights.weight(AgentId::Technical)
    }
}
