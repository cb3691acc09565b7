//! Weighted consensus over agent results
//!
//! Aggregation is synchronous and side-effect free: the same results, active
//! list and weights always produce the same recommendation (apart from the
//! generation timestamp).

use super::insights::{key_insights, risks_and_opportunities};
use super::recommendation::Recommendation;
use crate::config::{AgentWeights, ConsensusPolicy, EngineConfig, ExtractionConfig};
use agent_core::{
    AgentId, AgentResult, AnalysisContext, FAILURE_CONFIDENCE, NEUTRAL_SCORE, Signal,
    SignalThresholds,
};
use chrono::Utc;
use std::collections::BTreeMap;

/// Merges per-agent results into a [`Recommendation`]
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    thresholds: SignalThresholds,
    policy: ConsensusPolicy,
    extraction: ExtractionConfig,
}

impl Aggregator {
    pub fn new(
        thresholds: SignalThresholds,
        policy: ConsensusPolicy,
        extraction: ExtractionConfig,
    ) -> Self {
        Self {
            thresholds,
            policy,
            extraction,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.thresholds, config.consensus, config.extraction)
    }

    pub fn thresholds(&self) -> &SignalThresholds {
        &self.thresholds
    }

    pub fn policy(&self) -> &ConsensusPolicy {
        &self.policy
    }

    /// Aggregate the results of the active agents.
    ///
    /// Results for agents outside `active` are ignored. Error results count
    /// towards confidence and the summary but not towards the score.
    pub fn aggregate(
        &self,
        context: &AnalysisContext,
        results: &BTreeMap<AgentId, AgentResult>,
        active: &[AgentId],
        weights: &AgentWeights,
    ) -> Recommendation {
        let active = dedup(active);

        let consulted: Vec<&AgentResult> =
            active.iter().filter_map(|id| results.get(id)).collect();
        let contributing: Vec<&AgentResult> = consulted
            .iter()
            .copied()
            .filter(|result| !result.is_error())
            .collect();

        // No weighted evidence: neutral HOLD without moderation.
        let (score, base_signal, signal) = match weighted_score(&contributing, weights) {
            Some(score) => {
                let base_signal = self.thresholds.classify(score);
                (score, base_signal, self.moderate(base_signal, &contributing))
            },
            None => (NEUTRAL_SCORE, Signal::Hold, Signal::Hold),
        };
        let confidence = self.confidence(&consulted, &contributing);

        let (risk_factors, opportunities) = risks_and_opportunities(&consulted, &self.extraction);
        let key_insights = key_insights(&contributing, self.extraction.max_insights);

        let summary = summary(score, &consulted, contributing.len());

        let agent_scores = contributing
            .iter()
            .map(|result| (result.agent(), round3(result.overall_score())))
            .collect();
        let agent_errors = consulted
            .iter()
            .filter_map(|result| result.error().map(|err| (result.agent(), err.to_string())))
            .collect();
        let agent_results = consulted
            .iter()
            .map(|result| (result.agent(), (*result).clone()))
            .collect();

        Recommendation {
            ticker: context.ticker().to_string(),
            query: context.query().to_string(),
            preference: context.preference(),
            signal,
            base_signal,
            score: round3(score),
            confidence: round3(confidence),
            agent_scores,
            agent_errors,
            summary,
            key_insights,
            risk_factors,
            opportunities,
            active_agents: active,
            contributing_agents: contributing.len(),
            agent_results,
            generated_at: Utc::now(),
        }
    }

    /// Soften the base signal when enough agents disagree with it
    fn moderate(&self, base: Signal, contributing: &[&AgentResult]) -> Signal {
        if contributing.len() < self.policy.min_agents {
            return base;
        }

        let negatives = contributing
            .iter()
            .filter(|result| result.signal().is_negative())
            .count();
        let positives = contributing
            .iter()
            .filter(|result| result.signal().is_positive())
            .count();

        if base.is_positive() && negatives >= self.policy.dissent_count {
            Signal::Hold
        } else if base.is_negative() && positives >= self.policy.dissent_count {
            Signal::WeakHold
        } else {
            base
        }
    }

    fn confidence(&self, consulted: &[&AgentResult], contributing: &[&AgentResult]) -> f64 {
        let policy = &self.policy;

        let mean = if consulted.is_empty() {
            FAILURE_CONFIDENCE
        } else {
            consulted.iter().map(|result| result.confidence()).sum::<f64>() / consulted.len() as f64
        };

        if contributing.is_empty() {
            return mean.min(policy.starvation_confidence);
        }
        if contributing.len() < policy.min_agents_for_agreement {
            return mean;
        }

        let share = agreement(contributing);
        if share >= policy.high_agreement {
            (mean + policy.agreement_bonus)
                .min(policy.confidence_ceiling)
                .max(mean)
        } else if share <= policy.low_agreement {
            (mean - policy.disagreement_penalty).max(policy.confidence_floor.min(mean))
        } else {
            mean
        }
    }
}

fn dedup(active: &[AgentId]) -> Vec<AgentId> {
    let mut seen = Vec::with_capacity(active.len());
    for id in active {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

/// Weight-normalized mean of overall scores; `None` without any weight
pub(crate) fn weighted_score(
    contributing: &[&AgentResult],
    weights: &AgentWeights,
) -> Option<f64> {
    let (sum, total) = contributing
        .iter()
        .fold((0.0, 0.0), |(sum, total), result| {
            let weight = weights.weight(result.agent());
            (sum + result.overall_score() * weight, total + weight)
        });

    (total > 0.0).then(|| sum / total)
}

/// Share of contributing agents that voted for the most common signal
pub(crate) fn agreement(contributing: &[&AgentResult]) -> f64 {
    if contributing.is_empty() {
        return 0.0;
    }

    let mut counts: BTreeMap<Signal, usize> = BTreeMap::new();
    for result in contributing {
        *counts.entry(result.signal()).or_default() += 1;
    }
    let mode = counts.values().copied().max().unwrap_or(0);

    mode as f64 / contributing.len() as f64
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn overall_assessment(score: f64, contributing: usize) -> &'static str {
    if contributing == 0 {
        return "Insufficient data to form a view; no analysis completed successfully.";
    }
    match score {
        s if s >= 0.7 => "Overall analysis indicates strong investment potential.",
        s if s >= 0.6 => "Overall analysis shows positive investment characteristics.",
        s if s >= 0.5 => "Overall analysis presents a mixed investment picture.",
        s if s >= 0.4 => "Overall analysis suggests caution is warranted.",
        _ => "Overall analysis indicates weak investment prospects.",
    }
}

fn summary(score: f64, consulted: &[&AgentResult], contributing: usize) -> String {
    let mut parts = vec![overall_assessment(score, contributing).to_string()];
    parts.extend(
        consulted
            .iter()
            .filter(|result| !result.rationale().is_empty())
            .map(|result| format!("{}: {}", result.agent().display_name(), result.rationale())),
    );
    parts.join(" ")
}
