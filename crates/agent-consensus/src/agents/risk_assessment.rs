//! Risk assessment agent
//!
//! Higher scores mean lower risk. Covers valuation risk, leverage,
//! realized volatility, liquidity, margin of safety and downside to the
//! 52-week low.

use agent_core::{
    Agent, AgentId, AgentResult, AnalysisContext, InvestmentPreference, KeyMetrics, Result,
    clamp_score,
};
use async_trait::async_trait;
use std::sync::Arc;

use super::ScoreCard;
use super::scoring::{count_present, finite, format_market_cap, range_position};
use crate::config::EngineConfig;
use crate::data::{MarketDataProvider, MarketSnapshot};

/// Sub-scores produced by [`RiskAssessmentAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskScores {
    pub valuation_risk: f64,
    pub financial_risk: f64,
    pub volatility_risk: f64,
    pub liquidity_risk: f64,
    pub safety_margin: f64,
    pub downside_risk: f64,
}

impl ScoreCard for RiskScores {
    fn named_scores(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("valuation_risk_score", self.valuation_risk),
            ("financial_risk_score", self.financial_risk),
            ("volatility_risk_score", self.volatility_risk),
            ("liquidity_risk_score", self.liquidity_risk),
            ("safety_margin_score", self.safety_margin),
            ("downside_risk_score", self.downside_risk),
        ]
    }
}

/// Finite inputs gathered from the snapshot
#[derive(Debug, Clone, Copy, Default)]
struct RiskInputs {
    price: Option<f64>,
    pe: Option<f64>,
    pb: Option<f64>,
    debt_to_equity: Option<f64>,
    roe: Option<f64>,
    market_cap: Option<f64>,
    volume_avg: Option<f64>,
    high_52w: Option<f64>,
    low_52w: Option<f64>,
    volatility: Option<f64>,
    max_drawdown: Option<f64>,
}

impl RiskInputs {
    fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let f = &snapshot.fundamentals;
        let p = &snapshot.price;
        Self {
            price: finite(snapshot.current_price()),
            pe: finite(f.pe_ratio),
            pb: finite(f.pb_ratio),
            debt_to_equity: finite(f.debt_to_equity),
            roe: finite(f.roe),
            market_cap: finite(f.market_cap),
            volume_avg: finite(p.volume_avg),
            high_52w: finite(p.high_52w),
            low_52w: finite(p.low_52w),
            volatility: finite(p.annualized_volatility),
            max_drawdown: finite(p.max_drawdown),
        }
    }

    /// P/E a company of this quality deserves
    fn fair_pe(&self) -> f64 {
        match self.roe {
            Some(roe) if roe >= 0.20 => 20.0,
            Some(roe) if roe >= 0.15 => 18.0,
            Some(roe) if roe <= 0.10 => 12.0,
            _ => 15.0,
        }
    }

    fn intrinsic_value(&self) -> Option<f64> {
        match (self.price, self.pe) {
            (Some(price), Some(pe)) if pe > 0.0 && price > 0.0 => {
                Some(price / pe * self.fair_pe())
            },
            _ => None,
        }
    }

    fn safety_margin(&self) -> Option<f64> {
        match (self.intrinsic_value(), self.price) {
            (Some(intrinsic), Some(price)) if intrinsic > 0.0 => {
                Some((intrinsic - price) / intrinsic)
            },
            _ => None,
        }
    }

    fn range_position(&self) -> Option<f64> {
        match (self.price, self.low_52w, self.high_52w) {
            (Some(price), Some(low), Some(high)) => range_position(price, low, high),
            _ => None,
        }
    }

    fn downside_to_low(&self) -> Option<f64> {
        match (self.price, self.low_52w) {
            (Some(price), Some(low)) if price > 0.0 => Some((price - low) / price),
            _ => None,
        }
    }
}

impl RiskScores {
    pub fn compute(snapshot: &MarketSnapshot) -> Self {
        Self::from_inputs(&RiskInputs::from_snapshot(snapshot))
    }

    fn from_inputs(inputs: &RiskInputs) -> Self {
        Self {
            valuation_risk: valuation_risk_score(inputs.pe, inputs.pb),
            financial_risk: financial_risk_score(inputs.debt_to_equity),
            volatility_risk: volatility_risk_score(inputs.volatility),
            liquidity_risk: liquidity_risk_score(inputs.market_cap, inputs.volume_avg),
            safety_margin: safety_margin_score(inputs.safety_margin()),
            downside_risk: downside_risk_score(inputs.range_position(), inputs.max_drawdown),
        }
    }
}

fn valuation_risk_score(pe: Option<f64>, pb: Option<f64>) -> f64 {
    let mut score = 0.5;

    if let Some(pe) = pe {
        if pe <= 0.0 {
            score -= 0.3;
        } else if pe <= 15.0 {
            score += 0.3;
        } else if pe <= 25.0 {
            score += 0.1;
        } else if pe >= 40.0 {
            score -= 0.3;
        } else if pe >= 30.0 {
            score -= 0.1;
        }
    }

    if let Some(pb) = pb {
        if pb > 0.0 && pb <= 2.0 {
            score += 0.2;
        } else if pb >= 5.0 {
            score -= 0.2;
        }
    }

    clamp_score(score)
}

fn financial_risk_score(debt_to_equity: Option<f64>) -> f64 {
    match debt_to_equity {
        None => 0.5,
        Some(de) if de <= 0.3 => 0.9,
        Some(de) if de <= 0.6 => 0.7,
        Some(de) if de <= 1.0 => 0.4,
        Some(_) => 0.2,
    }
}

fn volatility_risk_score(volatility: Option<f64>) -> f64 {
    match volatility {
        None => 0.5,
        Some(v) if v <= 0.20 => 0.8,
        Some(v) if v <= 0.35 => 0.6,
        Some(v) if v <= 0.50 => 0.4,
        Some(_) => 0.2,
    }
}

fn liquidity_risk_score(market_cap: Option<f64>, volume_avg: Option<f64>) -> f64 {
    let mut score = match market_cap {
        None => 0.5,
        Some(cap) if cap >= 1e11 => 0.8,
        Some(cap) if cap >= 5e10 => 0.6,
        Some(cap) if cap >= 1e10 => 0.4,
        Some(_) => 0.3,
    };

    match volume_avg {
        Some(volume) if volume > 1e6 => score = f64::min(1.0, score + 0.1),
        Some(volume) if volume < 1e5 => score = f64::max(0.1, score - 0.2),
        _ => {},
    }

    clamp_score(score)
}

fn safety_margin_score(margin: Option<f64>) -> f64 {
    match margin {
        None => 0.5,
        Some(m) if m >= 0.3 => 0.9,
        Some(m) if m >= 0.2 => 0.8,
        Some(m) if m >= 0.1 => 0.7,
        Some(m) if m >= 0.0 => 0.6,
        Some(m) if m >= -0.2 => 0.4,
        Some(_) => 0.2,
    }
}

fn downside_risk_score(position: Option<f64>, max_drawdown: Option<f64>) -> f64 {
    let mut score = match position {
        None => 0.5,
        Some(q) if q >= 0.8 => 0.3,
        Some(q) if q >= 0.6 => 0.5,
        Some(q) if q >= 0.4 => 0.6,
        Some(q) if q >= 0.2 => 0.7,
        Some(_) => 0.8,
    };

    match max_drawdown {
        Some(dd) if dd <= 0.2 => score = f64::min(1.0, score + 0.1),
        Some(dd) if dd >= 0.5 => score = f64::max(0.1, score - 0.2),
        _ => {},
    }

    clamp_score(score)
}

/// Agent assessing downside and balance-sheet risk
pub struct RiskAssessmentAgent {
    config: Arc<EngineConfig>,
    provider: Arc<dyn MarketDataProvider>,
}

impl RiskAssessmentAgent {
    /// Create a new risk assessment agent
    pub fn new(config: Arc<EngineConfig>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { config, provider }
    }

    pub fn evaluate(
        &self,
        snapshot: &MarketSnapshot,
        preference: InvestmentPreference,
    ) -> AgentResult {
        let inputs = RiskInputs::from_snapshot(snapshot);
        let scores = RiskScores::from_inputs(&inputs);

        let available = count_present(&[inputs.pe, inputs.debt_to_equity, inputs.market_cap]);
        let history = if inputs.volatility.is_some() && inputs.max_drawdown.is_some() {
            1.0
        } else {
            0.5
        };
        let confidence = (0.4 + 0.3 * available as f64 / 3.0 + 0.2 * history).min(0.9);

        AgentResult::new(
            self.id(),
            self.weight(),
            scores.to_sub_scores(),
            &self.config.thresholds,
        )
        .with_rationale(rationale(&inputs, &scores, preference))
        .with_key_metrics(key_metrics(&inputs))
        .with_confidence(confidence)
    }
}

fn rationale(inputs: &RiskInputs, scores: &RiskScores, preference: InvestmentPreference) -> String {
    let mut parts = Vec::new();

    if scores.valuation_risk >= 0.7 {
        parts.push("Valuation risk is low.".to_string());
    } else if scores.valuation_risk <= 0.3 {
        parts.push("Valuation risk is high.".to_string());
    }

    if scores.financial_risk >= 0.7 {
        parts.push("Leverage is modest.".to_string());
    } else if scores.financial_risk <= 0.4 {
        parts.push("Debt levels raise financial risk.".to_string());
    }

    if let Some(vol) = inputs.volatility {
        parts.push(format!("Annualized volatility of {:.0}%.", vol * 100.0));
    }

    if let Some(cap) = inputs.market_cap {
        let liquidity = if scores.liquidity_risk >= 0.6 { "ample" } else { "thin" };
        parts.push(format!(
            "Market cap {} with {liquidity} liquidity.",
            format_market_cap(cap)
        ));
    }

    if let Some(margin) = inputs.safety_margin() {
        if margin >= 0.0 {
            parts.push(format!("Estimated margin of safety {:.0}%.", margin * 100.0));
        } else {
            parts.push(format!(
                "Price exceeds estimated intrinsic value by {:.0}%.",
                margin.abs() * 100.0
            ));
        }
    }

    if let Some(downside) = inputs.downside_to_low() {
        parts.push(format!(
            "Downside to 52-week low: {:.1}%.",
            (downside * 100.0).max(0.0)
        ));
    }

    match preference {
        InvestmentPreference::Value if scores.safety_margin >= 0.7 => {
            parts.push("Margin of safety suits a value investor.".to_string());
        },
        InvestmentPreference::Growth if scores.volatility_risk <= 0.4 => {
            parts.push("Expect the elevated volatility typical of growth names.".to_string());
        },
        _ => {},
    }

    if parts.is_empty() {
        return "Insufficient data for a detailed risk assessment; risk treated as neutral."
            .to_string();
    }
    parts.join(" ")
}

fn key_metrics(inputs: &RiskInputs) -> KeyMetrics {
    KeyMetrics::new()
        .with("current_price", inputs.price)
        .with("pe_ratio", inputs.pe)
        .with("pb_ratio", inputs.pb)
        .with("debt_to_equity", inputs.debt_to_equity)
        .with("roe", inputs.roe)
        .with("market_cap", inputs.market_cap)
        .with("volume_avg", inputs.volume_avg)
        .with("high_52w", inputs.high_52w)
        .with("low_52w", inputs.low_52w)
        .with("annualized_volatility", inputs.volatility)
        .with("max_drawdown", inputs.max_drawdown)
        .with("fair_pe", inputs.fair_pe())
        .with("estimated_intrinsic_value", inputs.intrinsic_value())
        .with(
            "safety_margin_percent",
            inputs.safety_margin().map(|m| m * 100.0),
        )
}

#[async_trait]
impl Agent for RiskAssessmentAgent {
    async fn analyze(&self, ticker: &str, context: &AnalysisContext) -> Result<AgentResult> {
        let ticker = super::require_ticker(ticker)?;
        let snapshot = self.provider.snapshot(ticker).await?;

        let result = self.evaluate(&snapshot, context.preference());
        tracing::debug!(
            ticker,
            score = result.overall_score(),
            signal = %result.signal(),
            "Risk assessment complete"
        );
        Ok(result)
    }

    fn id(&self) -> AgentId {
        AgentId::RiskAssessment
    }

    fn weight(&self) -> f64 {
        self.config.weights.weight(AgentId::RiskAssessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support;

    fn agent() -> RiskAssessmentAgent {
        RiskAssessmentAgent::new(
            test_support::config(),
            test_support::provider(MarketSnapshot::new("X")),
        )
    }

    fn blue_chip() -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new("HDFCBANK.NS");
        snapshot.fundamentals.pe_ratio = Some(10.0);
        snapshot.fundamentals.pb_ratio = Some(1.8);
        snapshot.fundamentals.roe = Some(0.22);
        snapshot.fundamentals.debt_to_equity = Some(0.25);
        snapshot.fundamentals.market_cap = Some(2e11);
        snapshot.price.current = Some(100.0);
        snapshot.price.volume_avg = Some(5e6);
        snapshot.price.high_52w = Some(150.0);
        snapshot.price.low_52w = Some(90.0);
        snapshot.price.annualized_volatility = Some(0.18);
        snapshot.price.max_drawdown = Some(0.15);
        snapshot
    }

    #[test]
    fn test_valuation_risk_curve() {
        assert!((valuation_risk_score(Some(12.0), Some(1.5)) - 1.0).abs() < 1e-9);
        assert!((valuation_risk_score(Some(35.0), None) - 0.4).abs() < 1e-9);
        assert!((valuation_risk_score(Some(50.0), Some(6.0)) - 0.0).abs() < 1e-9);
        assert!((valuation_risk_score(Some(-4.0), Some(-1.0)) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_liquidity_without_market_cap_keeps_neutral_base() {
        assert!((liquidity_risk_score(None, None) - 0.5).abs() < 1e-9);
        assert!((liquidity_risk_score(None, Some(2e6)) - 0.6).abs() < 1e-9);
        assert!((liquidity_risk_score(Some(5e9), Some(5e4)) - 0.1).abs() < 1e-9);
        assert!((liquidity_risk_score(Some(2e11), Some(2e6)) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_downside_and_drawdown() {
        assert!((downside_risk_score(Some(0.1), Some(0.1)) - 0.9).abs() < 1e-9);
        assert!((downside_risk_score(Some(0.9), Some(0.6)) - 0.1).abs() < 1e-9);
        assert!((downside_risk_score(None, None) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_blue_chip_is_low_risk() {
        let result = agent().evaluate(&blue_chip(), InvestmentPreference::Value);

        // Fair P/E 20 against 10 implies a 50% margin of safety.
        assert_eq!(result.scores().get("safety_margin_score"), Some(0.9));
        assert_eq!(result.scores().get("financial_risk_score"), Some(0.9));
        assert_eq!(result.scores().get("volatility_risk_score"), Some(0.8));
        assert!(result.overall_score() >= 0.75);
        assert!((result.confidence() - 0.9).abs() < 1e-9);
        assert_eq!(result.key_metrics().number("fair_pe"), Some(20.0));
        assert!(result.rationale().contains("value investor"));
        assert!(result.rationale().contains("Downside to 52-week low: 10.0%"));
    }

    #[test]
    fn test_pathological_inputs_stay_bounded() {
        let mut snapshot = MarketSnapshot::new("X");
        snapshot.fundamentals.pe_ratio = Some(-1e9);
        snapshot.fundamentals.debt_to_equity = Some(400.0);
        snapshot.price.current = Some(50.0);
        snapshot.price.high_52w = Some(50.0);
        snapshot.price.low_52w = Some(50.0);
        snapshot.price.annualized_volatility = Some(f64::NAN);
        snapshot.price.max_drawdown = Some(3.0);

        let scores = RiskScores::compute(&snapshot);
        for (_, value) in scores.named_scores() {
            assert!((0.0..=1.0).contains(&value));
        }
        assert_eq!(scores.safety_margin, 0.5);
        assert_eq!(scores.volatility_risk, 0.5);
    }

    #[test]
    fn test_current_price_matches_technical_agent() {
        let mut snapshot = blue_chip();
        snapshot.technicals.current_price = Some(140.0);

        let risk = agent().evaluate(&snapshot, InvestmentPreference::Balanced);
        let technical = crate::agents::TechnicalAgent::new(
            test_support::config(),
            test_support::provider(MarketSnapshot::new("X")),
        )
        .evaluate(&snapshot);

        assert_eq!(risk.key_metrics().number("current_price"), Some(140.0));
        assert_eq!(
            risk.key_metrics().number("current_price"),
            technical.key_metrics().number("current_price")
        );
    }

    #[test]
    fn test_sparse_data_confidence() {
        let result = agent().evaluate(&MarketSnapshot::new("X"), InvestmentPreference::Balanced);
        assert!((result.confidence() - 0.5).abs() < 1e-9);
        assert!(result.rationale().contains("risk treated as neutral"));
    }
}
