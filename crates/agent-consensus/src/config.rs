//! Configuration for the consensus engine
//!
//! Every tunable number of the engine lives here: agent weights, signal
//! bands, selector categories, consensus policy, extraction caps and the
//! macro sensitivity table. The whole structure deserializes from JSON with
//! every section optional.

use crate::error::{ConsensusError, Result};
use crate::router::{KeywordCategory, default_categories};
use agent_core::{AgentId, SignalThresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "CONSENSUS_CONFIG";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Static contribution of each agent to the weighted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentWeights(BTreeMap<AgentId, f64>);

impl Default for AgentWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (AgentId::Fundamental, 0.30),
            (AgentId::Technical, 0.25),
            (AgentId::PeerComparison, 0.15),
            (AgentId::MacroContext, 0.15),
            (AgentId::RiskAssessment, 0.15),
        ]))
    }
}

impl AgentWeights {
    pub fn new(weights: BTreeMap<AgentId, f64>) -> Self {
        Self(weights)
    }

    pub fn with(mut self, agent: AgentId, weight: f64) -> Self {
        self.0.insert(agent, weight);
        self
    }

    pub fn get(&self, agent: AgentId) -> Option<f64> {
        self.0.get(&agent).copied()
    }

    /// Weight of an agent, zero when unconfigured
    pub fn weight(&self, agent: AgentId) -> f64 {
        self.get(agent).unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, f64)> + '_ {
        self.0.iter().map(|(agent, weight)| (*agent, *weight))
    }

    fn validate(&self) -> Result<()> {
        for agent in AgentId::ALL {
            match self.get(agent) {
                None => {
                    return Err(ConsensusError::Config(format!(
                        "missing weight for agent {agent}"
                    )));
                },
                Some(w) if !w.is_finite() || w < 0.0 => {
                    return Err(ConsensusError::Config(format!(
                        "weight for agent {agent} must be a non-negative number, got {w}"
                    )));
                },
                Some(_) => {},
            }
        }

        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConsensusError::Config(format!(
                "agent weights must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

/// Keyword categories used by the agent selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub categories: Vec<KeywordCategory>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

/// Constants of the consensus moderation and confidence blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusPolicy {
    /// Contributing agents required before moderation applies
    pub min_agents: usize,
    /// Opposing signals needed to moderate the base signal
    pub dissent_count: usize,
    /// Contributing agents required for the agreement adjustment
    pub min_agents_for_agreement: usize,
    /// Mode share at or above which confidence is boosted
    pub high_agreement: f64,
    /// Mode share at or below which confidence is penalized
    pub low_agreement: f64,
    pub agreement_bonus: f64,
    pub disagreement_penalty: f64,
    pub confidence_ceiling: f64,
    pub confidence_floor: f64,
    /// Confidence cap when no agent produced a usable result
    pub starvation_confidence: f64,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            min_agents: 3,
            dissent_count: 2,
            min_agents_for_agreement: 2,
            high_agreement: 0.8,
            low_agreement: 0.4,
            agreement_bonus: 0.1,
            disagreement_penalty: 0.1,
            confidence_ceiling: 0.95,
            confidence_floor: 0.2,
            starvation_confidence: 0.2,
        }
    }
}

impl ConsensusPolicy {
    fn validate(&self) -> Result<()> {
        let bounded = [
            ("high_agreement", self.high_agreement),
            ("low_agreement", self.low_agreement),
            ("agreement_bonus", self.agreement_bonus),
            ("disagreement_penalty", self.disagreement_penalty),
            ("confidence_ceiling", self.confidence_ceiling),
            ("confidence_floor", self.confidence_floor),
            ("starvation_confidence", self.starvation_confidence),
        ];
        for (name, value) in bounded {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConsensusError::Config(format!(
                    "consensus.{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.confidence_floor > self.confidence_ceiling {
            return Err(ConsensusError::Config(
                "consensus.confidence_floor must not exceed confidence_ceiling".to_string(),
            ));
        }
        if self.low_agreement >= self.high_agreement {
            return Err(ConsensusError::Config(
                "consensus.low_agreement must be below high_agreement".to_string(),
            ));
        }
        if self.dissent_count == 0 {
            return Err(ConsensusError::Config(
                "consensus.dissent_count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Thresholds and caps for insight, risk and opportunity extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sub-scores at or above this become opportunities
    pub opportunity_threshold: f64,
    /// Sub-scores at or below this become risk factors
    pub risk_threshold: f64,
    pub max_opportunities: usize,
    pub max_risks: usize,
    pub max_insights: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            opportunity_threshold: 0.7,
            risk_threshold: 0.4,
            max_opportunities: 4,
            max_risks: 4,
            max_insights: 5,
        }
    }
}

/// How strongly a sector responds to macro drivers, each in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorSensitivity {
    /// Negative means higher rates hurt the sector
    pub interest_rates: f64,
    pub gdp_growth: f64,
}

impl Default for SectorSensitivity {
    fn default() -> Self {
        Self {
            interest_rates: 0.0,
            gdp_growth: 0.3,
        }
    }
}

impl SectorSensitivity {
    pub fn new(interest_rates: f64, gdp_growth: f64) -> Self {
        Self {
            interest_rates,
            gdp_growth,
        }
    }
}

/// Macro agent tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    /// Sector name to sensitivity; lookups ignore case
    pub sector_sensitivities: BTreeMap<String, SectorSensitivity>,
    /// Used for sectors missing from the table
    pub default_sensitivity: SectorSensitivity,
    /// Sectors whose earnings benefit from a weaker home currency
    pub export_sectors: Vec<String>,
    /// Exchange rate at or above which exporters benefit
    pub fx_favorable: f64,
    /// Exchange rate at or below which exporters suffer
    pub fx_unfavorable: f64,
}

impl Default for MacroConfig {
    fn default() -> Self {
        let sector_sensitivities = [
            ("Technology", SectorSensitivity::new(-0.3, 0.4)),
            ("Banking", SectorSensitivity::new(0.5, 0.6)),
            ("Energy", SectorSensitivity::new(-0.2, 0.3)),
            ("Consumer", SectorSensitivity::new(-0.4, 0.5)),
            ("Healthcare", SectorSensitivity::new(-0.1, 0.2)),
            ("Industrials", SectorSensitivity::new(-0.3, 0.7)),
            ("Materials", SectorSensitivity::new(-0.2, 0.6)),
        ]
        .into_iter()
        .map(|(sector, sensitivity)| (sector.to_string(), sensitivity))
        .collect();

        Self {
            sector_sensitivities,
            default_sensitivity: SectorSensitivity::default(),
            export_sectors: vec!["Technology".to_string()],
            fx_favorable: 82.0,
            fx_unfavorable: 78.0,
        }
    }
}

impl MacroConfig {
    /// Sensitivity for a sector, falling back to the default
    pub fn sensitivity(&self, sector: Option<&str>) -> SectorSensitivity {
        sector
            .and_then(|sector| {
                self.sector_sensitivities
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(sector.trim()))
                    .map(|(_, sensitivity)| *sensitivity)
            })
            .unwrap_or(self.default_sensitivity)
    }

    pub fn is_export_sector(&self, sector: Option<&str>) -> bool {
        sector.is_some_and(|sector| {
            self.export_sectors
                .iter()
                .any(|export| export.eq_ignore_ascii_case(sector.trim()))
        })
    }

    fn validate(&self) -> Result<()> {
        let all = self
            .sector_sensitivities
            .iter()
            .map(|(name, s)| (name.as_str(), *s))
            .chain(std::iter::once(("default", self.default_sensitivity)));
        for (name, sensitivity) in all {
            for value in [sensitivity.interest_rates, sensitivity.gdp_growth] {
                if !(-1.0..=1.0).contains(&value) {
                    return Err(ConsensusError::Config(format!(
                        "macro sensitivity for {name} must be within [-1, 1], got {value}"
                    )));
                }
            }
        }

        if self.fx_unfavorable > self.fx_favorable {
            return Err(ConsensusError::Config(
                "macro.fx_unfavorable must not exceed fx_favorable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Peer comparison limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Maximum number of peers compared against the target
    pub max_peers: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self { max_peers: 4 }
    }
}

/// Market data handling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Lifetime of a cached snapshot, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { cache_ttl_secs: 60 }
    }
}

impl DataConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Configuration for the consensus engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: AgentWeights,
    pub thresholds: SignalThresholds,
    pub selection: SelectionConfig,
    pub consensus: ConsensusPolicy,
    pub extraction: ExtractionConfig,
    #[serde(rename = "macro")]
    pub macro_context: MacroConfig,
    pub peers: PeerConfig,
    pub data: DataConfig,
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = agent_utils::load_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `CONSENSUS_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self> {
        match agent_utils::path_from_env(CONFIG_ENV_VAR) {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading engine configuration");
                Self::from_file(path)
            },
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if !self.thresholds.is_well_formed() {
            return Err(ConsensusError::Config(
                "signal thresholds must be strictly descending within [0, 1]".to_string(),
            ));
        }

        if self.selection.categories.is_empty() {
            return Err(ConsensusError::Config(
                "selection.categories must not be empty".to_string(),
            ));
        }
        for category in &self.selection.categories {
            if category.keywords.iter().all(|kw| kw.trim().is_empty()) {
                return Err(ConsensusError::Config(format!(
                    "selection category {} has no keywords",
                    category.name
                )));
            }
            if category.agents.is_empty() {
                return Err(ConsensusError::Config(format!(
                    "selection category {} has no agents",
                    category.name
                )));
            }
        }

        self.consensus.validate()?;

        let extraction = &self.extraction;
        if !(0.0..=1.0).contains(&extraction.opportunity_threshold)
            || !(0.0..=1.0).contains(&extraction.risk_threshold)
            || extraction.risk_threshold >= extraction.opportunity_threshold
        {
            return Err(ConsensusError::Config(
                "extraction thresholds must lie in [0, 1] with risk_threshold below \
                 opportunity_threshold"
                    .to_string(),
            ));
        }

        self.macro_context.validate()?;

        if self.peers.max_peers == 0 {
            return Err(ConsensusError::Config(
                "peers.max_peers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    weights: Option<AgentWeights>,
    thresholds: Option<SignalThresholds>,
    categories: Option<Vec<KeywordCategory>>,
    consensus: Option<ConsensusPolicy>,
    extraction: Option<ExtractionConfig>,
    macro_context: Option<MacroConfig>,
    max_peers: Option<usize>,
    cache_ttl: Option<Duration>,
}

impl EngineConfigBuilder {
    /// Replace all agent weights
    pub fn weights(mut self, weights: AgentWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set a single agent's weight, keeping the others
    pub fn weight(mut self, agent: AgentId, weight: f64) -> Self {
        let weights = self.weights.take().unwrap_or_default();
        self.weights = Some(weights.with(agent, weight));
        self
    }

    pub fn thresholds(mut self, thresholds: SignalThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn categories(mut self, categories: Vec<KeywordCategory>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn consensus(mut self, consensus: ConsensusPolicy) -> Self {
        self.consensus = Some(consensus);
        self
    }

    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = Some(extraction);
        self
    }

    pub fn macro_context(mut self, macro_context: MacroConfig) -> Self {
        self.macro_context = Some(macro_context);
        self
    }

    pub fn max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = Some(max_peers);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            weights: self.weights.unwrap_or(defaults.weights),
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
            selection: self
                .categories
                .map(|categories| SelectionConfig { categories })
                .unwrap_or(defaults.selection),
            consensus: self.consensus.unwrap_or(defaults.consensus),
            extraction: self.extraction.unwrap_or(defaults.extraction),
            macro_context: self.macro_context.unwrap_or(defaults.macro_context),
            peers: self
                .max_peers
                .map(|max_peers| PeerConfig { max_peers })
                .unwrap_or(defaults.peers),
            data: self
                .cache_ttl
                .map(|ttl| DataConfig {
                    cache_ttl_secs: ttl.as_secs(),
                })
                .unwrap_or(defaults.data),
        };

        config.validate()?;
        Ok(config)
    }
}
