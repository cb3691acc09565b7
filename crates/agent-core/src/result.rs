//! Per-agent analysis results

use crate::{AgentId, Signal, SignalThresholds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Neutral score used wherever a value is missing or undefined
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Confidence assigned to a placeholder result for a failed agent
pub const FAILURE_CONFIDENCE: f64 = 0.1;

/// Clamp a score into [0, 1]; NaN becomes neutral
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL_SCORE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One named sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub name: String,
    pub value: f64,
}

/// Ordered set of named sub-scores, each within [0, 1]
///
/// Insertion order is kept because risk and opportunity extraction walk the
/// scores in the order the agent produced them. Deserialized lists go through
/// [`SubScoreSet::insert`], so they are clamped and deduplicated too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SubScore>", into = "Vec<SubScore>")]
pub struct SubScoreSet {
    entries: Vec<SubScore>,
}

impl SubScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a sub-score. The value is clamped.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        let value = clamp_score(value);
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.value = value,
            None => self.entries.push(SubScore { name, value }),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arithmetic mean of the sub-scores, neutral when empty
    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return NEUTRAL_SCORE;
        }
        let sum: f64 = self.entries.iter().map(|entry| entry.value).sum();
        sum / self.entries.len() as f64
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for SubScoreSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl From<Vec<SubScore>> for SubScoreSet {
    fn from(entries: Vec<SubScore>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.name, entry.value))
            .collect()
    }
}

impl From<SubScoreSet> for Vec<SubScore> {
    fn from(set: SubScoreSet) -> Self {
        set.entries
    }
}

/// Raw inputs an agent looked at, kept for insight extraction and display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMetrics(BTreeMap<String, serde_json::Value>);

impl KeyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a metric; values that fail to serialize are stored as null
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Numeric metric, `None` when absent or null
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(serde_json::Value::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(serde_json::Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of one agent's analysis
///
/// Built once by the agent (or by [`AgentResult::failed`] for a failure) and
/// read-only afterwards. The overall score is the mean of the sub-scores and
/// the signal is derived from it. Deserialized results keep their recorded
/// signal but have score and confidence clamped to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AgentResultRecord")]
pub struct AgentResult {
    agent: AgentId,
    weight: f64,
    scores: SubScoreSet,
    overall_score: f64,
    signal: Signal,
    rationale: String,
    key_metrics: KeyMetrics,
    confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

/// Wire shape of [`AgentResult`] before its values are clamped
#[derive(Deserialize)]
struct AgentResultRecord {
    agent: AgentId,
    weight: f64,
    #[serde(default)]
    scores: SubScoreSet,
    overall_score: f64,
    signal: Signal,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    key_metrics: KeyMetrics,
    confidence: f64,
    #[serde(default)]
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl From<AgentResultRecord> for AgentResult {
    fn from(record: AgentResultRecord) -> Self {
        Self {
            agent: record.agent,
            weight: record.weight,
            scores: record.scores,
            overall_score: clamp_score(record.overall_score),
            signal: record.signal,
            rationale: record.rationale,
            key_metrics: record.key_metrics,
            confidence: clamp_score(record.confidence),
            error: record.error,
            timestamp: record.timestamp,
        }
    }
}

impl AgentResult {
    /// Create a result from sub-scores, deriving overall score and signal
    pub fn new(
        agent: AgentId,
        weight: f64,
        scores: SubScoreSet,
        thresholds: &SignalThresholds,
    ) -> Self {
        let overall_score = clamp_score(scores.mean());
        Self {
            agent,
            weight,
            signal: thresholds.classify(overall_score),
            overall_score,
            scores,
            rationale: String::new(),
            key_metrics: KeyMetrics::new(),
            confidence: NEUTRAL_SCORE,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Neutral placeholder standing in for an agent that failed
    pub fn failed(agent: AgentId, weight: f64, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            agent,
            weight,
            scores: SubScoreSet::new(),
            overall_score: NEUTRAL_SCORE,
            signal: Signal::Hold,
            rationale: format!(
                "Unable to complete {} analysis: {error}",
                agent.display_name().to_lowercase()
            ),
            key_metrics: KeyMetrics::new(),
            confidence: FAILURE_CONFIDENCE,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_key_metrics(mut self, key_metrics: KeyMetrics) -> Self {
        self.key_metrics = key_metrics;
        self
    }

    /// Set confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_score(confidence);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn scores(&self) -> &SubScoreSet {
        &self.scores
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn key_metrics(&self) -> &KeyMetrics {
        &self.key_metrics
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_scores_are_clamped() {
        let scores = SubScoreSet::new()
            .with("valuation", 1.4)
            .with("growth", -0.2)
            .with("momentum", f64::NAN);

        assert_eq!(scores.get("valuation"), Some(1.0));
        assert_eq!(scores.get("growth"), Some(0.0));
        assert_eq!(scores.get("momentum"), Some(0.5));
    }

    #[test]
    fn test_sub_score_names_stay_unique_and_ordered() {
        let mut scores: SubScoreSet = [("b", 0.2), ("a", 0.4)].into_iter().collect();
        scores.insert("b", 0.9);

        let names: Vec<_> = scores.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("b"), Some(0.9));
    }

    #[test]
    fn test_mean_of_empty_set_is_neutral() {
        assert!((SubScoreSet::new().mean() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_result_derives_overall_and_signal() {
        let scores = SubScoreSet::new().with("a", 0.8).with("b", 0.9);
        let result = AgentResult::new(
            AgentId::Fundamental,
            0.3,
            scores,
            &SignalThresholds::default(),
        )
        .with_confidence(1.7);

        assert!((result.overall_score() - 0.85).abs() < 1e-12);
        assert_eq!(result.signal(), Signal::StrongBuy);
        assert!((result.confidence() - 1.0).abs() < f64::EPSILON);
        assert!(!result.is_error());
    }

    #[test]
    fn test_failed_result_is_neutral_placeholder() {
        let result = AgentResult::failed(AgentId::Technical, 0.25, "no price history");

        assert!(result.scores().is_empty());
        assert!((result.overall_score() - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.signal(), Signal::Hold);
        assert!((result.confidence() - FAILURE_CONFIDENCE).abs() < f64::EPSILON);
        assert_eq!(result.error(), Some("no price history"));
        assert!(result.rationale().contains("technical analysis"));
    }

    #[test]
    fn test_key_metrics_accessors() {
        let metrics = KeyMetrics::new()
            .with("pe_ratio", Some(12.5))
            .with("roe", None::<f64>)
            .with("sector", "Technology");

        assert_eq!(metrics.number("pe_ratio"), Some(12.5));
        assert_eq!(metrics.number("roe"), None);
        assert!(metrics.get("roe").is_some());
        assert_eq!(metrics.text("sector"), Some("Technology"));
        assert_eq!(metrics.number("missing"), None);
    }

    #[test]
    fn test_result_deserializes_from_recorded_json() {
        let json = serde_json::json!({
            "agent": "risk_assessment",
            "weight": 0.15,
            "overall_score": 0.42,
            "signal": "SELL",
            "confidence": 0.6,
            "timestamp": "2024-01-01T00:00:00Z"
        });
        let result: AgentResult = serde_json::from_value(json).unwrap();

        assert_eq!(result.agent(), AgentId::RiskAssessment);
        assert_eq!(result.signal(), Signal::Sell);
        assert_eq!(
            SignalThresholds::default().classify(result.overall_score()),
            Signal::Sell
        );
        assert!(result.scores().is_empty());
        assert!(result.error().is_none());
    }

    #[test]
    fn test_deserialized_sub_scores_are_clamped_and_unique() {
        let json = serde_json::json!([
            { "name": "a", "value": 3.5 },
            { "name": "b", "value": 0.4 },
            { "name": "a", "value": -2.0 }
        ]);
        let scores: SubScoreSet = serde_json::from_value(json).unwrap();

        let entries: Vec<_> = scores.iter().collect();
        assert_eq!(entries, vec![("a", 0.0), ("b", 0.4)]);
        assert!((scores.mean() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_deserialized_result_values_are_clamped() {
        let json = serde_json::json!({
            "agent": "technical",
            "weight": 0.25,
            "scores": [{ "name": "trend_score", "value": 7.0 }],
            "overall_score": 3.0,
            "signal": "STRONG_BUY",
            "confidence": -1.0,
            "timestamp": "2024-01-01T00:00:00Z"
        });
        let result: AgentResult = serde_json::from_value(json).unwrap();

        assert!((result.overall_score() - 1.0).abs() < f64::EPSILON);
        assert!(result.confidence().abs() < f64::EPSILON);
        assert_eq!(result.scores().get("trend_score"), Some(1.0));
    }

    #[test]
    fn test_serialized_result_reads_back_unchanged() {
        let result = AgentResult::new(
            AgentId::MacroContext,
            0.15,
            SubScoreSet::new().with("rate_score", 0.25).with("gdp_score", 0.75),
            &SignalThresholds::default(),
        )
        .with_confidence(0.625);

        let value = serde_json::to_value(&result).unwrap();
        assert!(value["scores"].is_array());
        let back: AgentResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }
}
