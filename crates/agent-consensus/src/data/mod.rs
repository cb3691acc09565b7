//! Per-ticker market data bundle consumed by the agents
//!
//! Every numeric field is optional. A field the upstream source could not
//! supply is `None`; agents score it as neutral instead of failing.

pub mod cache;
pub mod provider;

pub use cache::{CachedProvider, SnapshotCache};
pub use provider::{MarketDataProvider, StaticDataProvider};

use serde::{Deserialize, Serialize};

/// Price history summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceData {
    pub current: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    /// Average daily traded volume
    pub volume_avg: Option<f64>,
    /// Annualized volatility as a fraction (0.25 = 25%)
    pub annualized_volatility: Option<f64>,
    /// Maximum peak-to-trough drawdown as a fraction
    pub max_drawdown: Option<f64>,
}

/// Company fundamentals; ratios are fractions (0.18 ROE = 18%)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fundamentals {
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// Precomputed technical indicators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalIndicators {
    pub current_price: Option<f64>,
    pub rsi14: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

/// Broad market mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSentiment {
    Bullish,
    Neutral,
    Bearish,
}

/// Direction of foreign institutional money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Positive,
    Neutral,
    Negative,
}

/// Economy-wide indicators; rates are percentages (6.5 = 6.5%)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroIndicators {
    pub gdp_growth: Option<f64>,
    pub inflation_rate: Option<f64>,
    pub policy_rate: Option<f64>,
    /// Home currency per US dollar
    pub fx_rate: Option<f64>,
    pub fx_volatility: Option<f64>,
    pub market_sentiment: Option<MarketSentiment>,
    pub foreign_flows: Option<FlowDirection>,
    pub crude_oil_price: Option<f64>,
    /// Growth of spending in the company's sector, percent
    pub sector_spending_growth: Option<f64>,
}

/// Fundamentals of one comparable company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerFundamentals {
    pub ticker: String,
    #[serde(flatten)]
    pub fundamentals: Fundamentals,
}

/// Everything the agents know about one ticker at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    #[serde(default)]
    pub price: PriceData,
    #[serde(default)]
    pub fundamentals: Fundamentals,
    #[serde(default)]
    pub technicals: TechnicalIndicators,
    #[serde(default)]
    pub peers: Vec<PeerFundamentals>,
    #[serde(default, rename = "macro")]
    pub macro_indicators: MacroIndicators,
}

impl MarketSnapshot {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    /// Latest price, preferring the technical feed. Every agent reads the price here.
    pub fn current_price(&self) -> Option<f64> {
        self.technicals.current_price.or(self.price.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_snapshot_deserializes() {
        let json = r#"{
            "ticker": "INFY.NS",
            "fundamentals": { "sector": "Technology", "pe_ratio": 24.1 },
            "peers": [{ "ticker": "TCS.NS", "pe_ratio": 29.5, "roe": 0.45 }],
            "macro": { "market_sentiment": "bullish" }
        }"#;
        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.fundamentals.pe_ratio, Some(24.1));
        assert_eq!(snapshot.fundamentals.roe, None);
        assert_eq!(snapshot.peers[0].fundamentals.roe, Some(0.45));
        assert_eq!(
            snapshot.macro_indicators.market_sentiment,
            Some(MarketSentiment::Bullish)
        );
        assert_eq!(snapshot.technicals, TechnicalIndicators::default());
        assert_eq!(snapshot.current_price(), None);
    }

    #[test]
    fn test_current_price_prefers_technicals() {
        let mut snapshot = MarketSnapshot::new("AAPL");
        snapshot.price.current = Some(190.0);
        assert_eq!(snapshot.current_price(), Some(190.0));

        snapshot.technicals.current_price = Some(191.5);
        assert_eq!(snapshot.current_price(), Some(191.5));
    }
}
