//! Discrete recommendation signals and the score bands that produce them

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Six-level recommendation signal, ordered from most bearish to most bullish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongSell,
    Sell,
    WeakHold,
    Hold,
    Buy,
    StrongBuy,
}

impl Signal {
    pub const ALL: [Self; 6] = [
        Self::StrongSell,
        Self::Sell,
        Self::WeakHold,
        Self::Hold,
        Self::Buy,
        Self::StrongBuy,
    ];

    /// Classify a score with the default band thresholds
    pub fn from_score(score: f64) -> Self {
        SignalThresholds::default().classify(score)
    }

    /// BUY or STRONG_BUY
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Buy | Self::StrongBuy)
    }

    /// SELL or STRONG_SELL
    pub fn is_negative(self) -> bool {
        matches!(self, Self::Sell | Self::StrongSell)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongSell => "STRONG_SELL",
            Self::Sell => "SELL",
            Self::WeakHold => "WEAK_HOLD",
            Self::Hold => "HOLD",
            Self::Buy => "BUY",
            Self::StrongBuy => "STRONG_BUY",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|signal| signal.as_str() == normalized)
            .ok_or_else(|| Error::Generic(format!("Unknown signal: {s}")))
    }
}

/// Lower bounds of each signal band; anything below `sell` is STRONG_SELL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub strong_buy: f64,
    pub buy: f64,
    pub hold: f64,
    pub weak_hold: f64,
    pub sell: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            strong_buy: 0.75,
            buy: 0.65,
            hold: 0.55,
            weak_hold: 0.45,
            sell: 0.35,
        }
    }
}

impl SignalThresholds {
    /// Map a score onto a signal band. Lower bounds are inclusive; NaN is HOLD.
    pub fn classify(&self, score: f64) -> Signal {
        if score.is_nan() {
            return Signal::Hold;
        }

        if score >= self.strong_buy {
            Signal::StrongBuy
        } else if score >= self.buy {
            Signal::Buy
        } else if score >= self.hold {
            Signal::Hold
        } else if score >= self.weak_hold {
            Signal::WeakHold
        } else if score >= self.sell {
            Signal::Sell
        } else {
            Signal::StrongSell
        }
    }

    /// Bands must be strictly descending and inside [0, 1]
    pub fn is_well_formed(&self) -> bool {
        let bounds = [
            self.strong_buy,
            self.buy,
            self.hold,
            self.weak_hold,
            self.sell,
        ];
        bounds.iter().all(|b| (0.0..=1.0).contains(b)) && bounds.windows(2).all(|w| w[0] > w[1])
    }
}
