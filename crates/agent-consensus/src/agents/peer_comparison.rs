//! Peer comparison agent
//!
//! Compares the company's valuation, profitability and growth against the
//! median of a small peer group.

use agent_core::{Agent, AgentId, AgentResult, AnalysisContext, KeyMetrics, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::ScoreCard;
use super::scoring::{finite, fmt_pct, mean, percentile_rank, upper_median};
use crate::config::EngineConfig;
use crate::data::{Fundamentals, MarketDataProvider, PeerFundamentals};

/// Sub-scores produced by [`PeerComparisonAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerScores {
    pub relative_valuation: f64,
    pub relative_profitability: f64,
    pub relative_growth: f64,
    pub peer_ranking: f64,
}

impl Default for PeerScores {
    fn default() -> Self {
        Self {
            relative_valuation: 0.5,
            relative_profitability: 0.5,
            relative_growth: 0.5,
            peer_ranking: 0.5,
        }
    }
}

impl ScoreCard for PeerScores {
    fn named_scores(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("relative_valuation_score", self.relative_valuation),
            ("relative_profitability_score", self.relative_profitability),
            ("relative_growth_score", self.relative_growth),
            ("peer_ranking_score", self.peer_ranking),
        ]
    }
}

/// Peer-group statistics behind the scores
#[derive(Debug, Clone, Default, PartialEq)]
struct PeerGroup {
    tickers: Vec<String>,
    pe: Vec<f64>,
    roe: Vec<f64>,
    growth: Vec<f64>,
    complete: usize,
}

impl PeerGroup {
    fn new(peers: &[PeerFundamentals]) -> Self {
        let mut group = Self::default();
        for peer in peers {
            group.tickers.push(peer.ticker.clone());

            let pe = finite(peer.fundamentals.pe_ratio).filter(|pe| *pe > 0.0);
            let roe = finite(peer.fundamentals.roe);
            if let Some(pe) = pe {
                group.pe.push(pe);
            }
            if let Some(roe) = roe {
                group.roe.push(roe);
            }
            if let Some(growth) = finite(peer.fundamentals.revenue_growth) {
                group.growth.push(growth);
            }
            if pe.is_some() && roe.is_some() {
                group.complete += 1;
            }
        }
        group
    }

    fn len(&self) -> usize {
        self.tickers.len()
    }

    fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Score a target against peers with ratio bands
///
/// A non-positive median makes ratios meaningless, so the comparison is
/// skipped and the score stays neutral.
fn relative_band(target: f64, median: f64, higher_is_better: bool) -> f64 {
    if median <= 0.0 {
        return 0.5;
    }
    let ratio = target / median;
    if higher_is_better {
        if ratio > 1.2 {
            0.8
        } else if ratio > 1.0 {
            0.7
        } else if ratio < 0.8 {
            0.3
        } else if ratio < 1.0 {
            0.4
        } else {
            0.5
        }
    } else if ratio < 0.8 {
        0.8
    } else if ratio < 1.0 {
        0.7
    } else if ratio > 1.2 {
        0.3
    } else if ratio > 1.0 {
        0.4
    } else {
        0.5
    }
}

impl PeerScores {
    pub fn compute(target: &Fundamentals, peers: &[PeerFundamentals]) -> Self {
        Self::from_group(target, &PeerGroup::new(peers))
    }

    fn from_group(target: &Fundamentals, group: &PeerGroup) -> Self {
        if group.is_empty() {
            return Self::default();
        }

        let target_pe = finite(target.pe_ratio).filter(|pe| *pe > 0.0);
        let target_roe = finite(target.roe);
        let target_growth = finite(target.revenue_growth);

        let compare = |target: Option<f64>, values: &[f64], higher_is_better: bool| {
            match (target, upper_median(values)) {
                (Some(target), Some(median)) => relative_band(target, median, higher_is_better),
                _ => 0.5,
            }
        };

        let mut ranks = Vec::new();
        if let Some(pe) = target_pe {
            if !group.pe.is_empty() {
                ranks.push(percentile_rank(pe, &group.pe, false));
            }
        }
        if let Some(roe) = target_roe {
            if !group.roe.is_empty() {
                ranks.push(percentile_rank(roe, &group.roe, true));
            }
        }

        Self {
            relative_valuation: compare(target_pe, &group.pe, false),
            relative_profitability: compare(target_roe, &group.roe, true),
            relative_growth: compare(target_growth, &group.growth, true),
            peer_ranking: mean(&ranks).map_or(0.5, agent_core::clamp_score),
        }
    }
}

/// Agent comparing a company with its peers
pub struct PeerComparisonAgent {
    config: Arc<EngineConfig>,
    provider: Arc<dyn MarketDataProvider>,
}

impl PeerComparisonAgent {
    /// Create a new peer comparison agent
    pub fn new(config: Arc<EngineConfig>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { config, provider }
    }

    pub fn evaluate(&self, target: &Fundamentals, peers: &[PeerFundamentals]) -> AgentResult {
        let considered = &peers[..peers.len().min(self.config.peers.max_peers)];
        let group = PeerGroup::new(considered);
        let scores = PeerScores::from_group(target, &group);

        let n = group.len();
        let confidence = if n == 0 {
            0.3
        } else {
            let coverage = (n as f64 / 3.0).min(1.0);
            let completeness = group.complete as f64 / n as f64;
            (0.4 + 0.3 * coverage + 0.2 * completeness).min(0.9)
        };

        AgentResult::new(
            self.id(),
            self.weight(),
            scores.to_sub_scores(),
            &self.config.thresholds,
        )
        .with_rationale(rationale(target, &group, &scores))
        .with_key_metrics(key_metrics(target, &group))
        .with_confidence(confidence)
    }
}

fn rationale(target: &Fundamentals, group: &PeerGroup, scores: &PeerScores) -> String {
    if group.is_empty() {
        return "Limited peer comparison: no comparable companies available.".to_string();
    }

    let mut parts = Vec::new();

    let target_pe = finite(target.pe_ratio).filter(|pe| *pe > 0.0);
    if let (Some(pe), Some(median)) = (target_pe, upper_median(&group.pe)) {
        let gap = (pe / median - 1.0) * 100.0;
        if gap < 0.0 {
            parts.push(format!(
                "Trades at a {:.0}% discount to the peer median P/E of {median:.1}.",
                gap.abs()
            ));
        } else {
            parts.push(format!(
                "Trades at a {gap:.0}% premium to the peer median P/E of {median:.1}."
            ));
        }
    }

    if let (Some(roe), Some(median)) = (finite(target.roe), upper_median(&group.roe)) {
        let relation = if roe >= median { "above" } else { "below" };
        parts.push(format!(
            "ROE of {} is {relation} the peer median of {}.",
            fmt_pct(Some(roe)),
            fmt_pct(Some(median))
        ));
    }

    if scores.relative_growth >= 0.7 {
        parts.push("Revenue is growing faster than peers.".to_string());
    } else if scores.relative_growth <= 0.4 {
        parts.push("Revenue growth trails peers.".to_string());
    }

    let tier = if scores.peer_ranking >= 0.7 {
        "top tier"
    } else if scores.peer_ranking >= 0.4 {
        "middle of the pack"
    } else {
        "bottom tier"
    };
    parts.push(format!(
        "Ranks in the {tier} of a {}-company group.",
        group.len() + 1
    ));

    let named: Vec<&str> = group.tickers.iter().take(3).map(String::as_str).collect();
    parts.push(format!("Compared against: {}.", named.join(", ")));

    parts.join(" ")
}

fn key_metrics(target: &Fundamentals, group: &PeerGroup) -> KeyMetrics {
    KeyMetrics::new()
        .with("target_pe", finite(target.pe_ratio))
        .with("target_roe", finite(target.roe))
        .with("target_revenue_growth", finite(target.revenue_growth))
        .with("target_market_cap", finite(target.market_cap))
        .with("peer_count", group.len())
        .with("peer_median_pe", upper_median(&group.pe))
        .with("peer_avg_pe", mean(&group.pe))
        .with("peer_median_roe", upper_median(&group.roe))
        .with("peer_avg_roe", mean(&group.roe))
        .with("peer_median_growth", upper_median(&group.growth))
        .with("peer_tickers", &group.tickers)
}

#[async_trait]
impl Agent for PeerComparisonAgent {
    async fn analyze(&self, ticker: &str, _context: &AnalysisContext) -> Result<AgentResult> {
        let ticker = super::require_ticker(ticker)?;
        let snapshot = self.provider.snapshot(ticker).await?;

        let result = self.evaluate(&snapshot.fundamentals, &snapshot.peers);
        tracing::debug!(
            ticker,
            peers = snapshot.peers.len(),
            score = result.overall_score(),
            "Peer comparison complete"
        );
        Ok(result)
    }

    fn id(&self) -> AgentId {
        AgentId::PeerComparison
    }

    fn weight(&self) -> f64 {
        self.config.weights.weight(AgentId::PeerComparison)
    }
}
