//! Fan-out of the selected agents and fan-in into one recommendation

use super::aggregation::Aggregator;
use super::recommendation::Recommendation;
use crate::agents::default_agents;
use crate::config::EngineConfig;
use crate::data::MarketDataProvider;
use crate::error::{ConsensusError, Result};
use crate::router::AgentSelector;
use agent_core::{Agent, AgentId, AgentResult, AnalysisContext, InvestmentPreference};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runs agents concurrently and aggregates their results
pub struct Orchestrator {
    agents: BTreeMap<AgentId, Arc<dyn Agent>>,
    selector: AgentSelector,
    aggregator: Aggregator,
    config: Arc<EngineConfig>,
}

impl Orchestrator {
    /// Orchestrator with the five standard agents reading from `provider`
    pub fn new(config: Arc<EngineConfig>, provider: Arc<dyn MarketDataProvider>) -> Result<Self> {
        Self::builder(config).default_agents(&provider).build()
    }

    pub fn builder(config: Arc<EngineConfig>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn selector(&self) -> &AgentSelector {
        &self.selector
    }

    /// Ids of the registered agents
    pub fn registered_agents(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Analyze a ticker for a free-text query.
    ///
    /// Fails only on a blank ticker; agent failures are folded into the
    /// recommendation.
    pub async fn analyze_stock(
        &self,
        ticker: &str,
        query: &str,
        preference: InvestmentPreference,
    ) -> Result<Recommendation> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ConsensusError::InvalidSymbol(ticker.to_string()));
        }

        let context = AnalysisContext::new(ticker.to_uppercase(), query, preference);
        Ok(self.analyze_with_context(context).await)
    }

    /// Analyze with a prepared context
    pub async fn analyze_with_context(&self, context: AnalysisContext) -> Recommendation {
        let selection = self.selector.route(context.query());
        info!(
            ticker = context.ticker(),
            category = selection.category.as_deref().unwrap_or("default"),
            agents = selection.agents.len(),
            "Starting consensus analysis"
        );

        let context = Arc::new(context);
        let results = self.run_agents(&context, &selection.agents).await;

        let recommendation =
            self.aggregator
                .aggregate(&context, &results, &selection.agents, &self.config.weights);

        info!(
            ticker = %recommendation.ticker,
            signal = %recommendation.signal,
            score = recommendation.score,
            confidence = recommendation.confidence,
            contributing = recommendation.contributing_agents,
            "Consensus analysis complete"
        );

        recommendation
    }

    /// Execute the active agents in parallel, one task each
    async fn run_agents(
        &self,
        context: &Arc<AnalysisContext>,
        active: &[AgentId],
    ) -> BTreeMap<AgentId, AgentResult> {
        let mut launched: Vec<(AgentId, f64, JoinHandle<agent_core::Result<AgentResult>>)> =
            Vec::with_capacity(active.len());
        for id in active {
            let Some(agent) = self.agents.get(id) else {
                warn!(agent = %id, "Agent selected but not registered, skipping");
                continue;
            };
            if launched.iter().any(|(launched_id, _, _)| launched_id == id) {
                continue;
            }

            let agent = Arc::clone(agent);
            let ctx = Arc::clone(context);
            let weight = agent.weight();
            let handle = tokio::spawn(async move { agent.analyze(ctx.ticker(), &ctx).await });
            launched.push((*id, weight, handle));
        }

        let (meta, handles): (Vec<_>, Vec<_>) = launched
            .into_iter()
            .map(|(id, weight, handle)| ((id, weight), handle))
            .unzip();
        let outcomes = futures::future::join_all(handles).await;

        meta.into_iter()
            .zip(outcomes)
            .map(|((id, weight), outcome)| {
                let result = match outcome {
                    Ok(Ok(result)) => {
                        debug!(
                            agent = %id,
                            score = result.overall_score(),
                            signal = %result.signal(),
                            confidence = result.confidence(),
                            "Agent completed"
                        );
                        result
                    },
                    Ok(Err(e)) => {
                        warn!(agent = %id, error = %e, "Agent failed");
                        AgentResult::failed(id, weight, e.to_string())
                    },
                    Err(e) => {
                        warn!(agent = %id, error = %e, "Agent task aborted");
                        AgentResult::failed(id, weight, format!("agent task aborted: {e}"))
                    },
                };
                (id, result)
            })
            .collect()
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    config: Arc<EngineConfig>,
    agents: Vec<Arc<dyn Agent>>,
    selector: Option<AgentSelector>,
}

impl OrchestratorBuilder {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            config,
            agents: Vec::new(),
            selector: None,
        }
    }

    /// Register an agent; a later agent with the same id replaces it
    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    /// Register the five standard agents
    pub fn default_agents(mut self, provider: &Arc<dyn MarketDataProvider>) -> Self {
        self.agents.extend(default_agents(&self.config, provider));
        self
    }

    /// Override the selector built from the configured categories
    pub fn selector(mut self, selector: AgentSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;

        if self.agents.is_empty() {
            return Err(ConsensusError::Config(
                "orchestrator needs at least one agent".to_string(),
            ));
        }

        let agents: BTreeMap<AgentId, Arc<dyn Agent>> = self
            .agents
            .into_iter()
            .map(|agent| (agent.id(), agent))
            .collect();

        let categories = &self.config.selection.categories;
        let selector = self
            .selector
            .unwrap_or_else(|| AgentSelector::with_categories(categories.clone()));

        debug!(agents = ?agents.keys().collect::<Vec<_>>(), "Orchestrator ready");

        Ok(Orchestrator {
            agents,
            selector,
            aggregator: Aggregator::from_config(&self.config),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticDataProvider;
    use agent_core::{Signal, SignalThresholds, SubScoreSet};
    use async_trait::async_trait;

    mockall::mock! {
        pub ScoringAgent {}

        #[async_trait]
        impl Agent for ScoringAgent {
            async fn analyze(
                &self,
                ticker: &str,
                context: &AnalysisContext,
            ) -> agent_core::Result<AgentResult>;
            fn id(&self) -> AgentId;
            fn weight(&self) -> f64;
        }
    }

    fn result(id: AgentId, score: f64) -> AgentResult {
        AgentResult::new(
            id,
            0.2,
            SubScoreSet::new().with("score", score),
            &SignalThresholds::default(),
        )
        .with_confidence(0.7)
        .with_rationale(format!("{id} looked at it."))
    }

    fn scoring(id: AgentId, score: f64) -> Arc<dyn Agent> {
        let mut agent = MockScoringAgent::new();
        agent.expect_id().return_const(id);
        agent.expect_weight().return_const(0.2);
        agent
            .expect_analyze()
            .returning(move |_, _| Ok(result(id, score)));
        Arc::new(agent)
    }

    fn failing(id: AgentId) -> Arc<dyn Agent> {
        let mut agent = MockScoringAgent::new();
        agent.expect_id().return_const(id);
        agent.expect_weight().return_const(0.15);
        agent
            .expect_analyze()
            .returning(|_, _| Err(agent_core::Error::ProcessingFailed("feed down".to_string())));
        Arc::new(agent)
    }

    fn config() -> Arc<EngineConfig> {
        Arc::new(EngineConfig::default())
    }

    #[tokio::test]
    async fn test_all_agents_contribute() {
        let orchestrator = AgentId::ALL
            .iter()
            .fold(Orchestrator::builder(config()), |builder, id| {
                builder.agent(scoring(*id, 0.8))
            })
            .build()
            .unwrap();

        let rec = orchestrator
            .analyze_stock(" acme ", "", InvestmentPreference::Balanced)
            .await
            .unwrap();

        assert_eq!(rec.ticker, "ACME");
        assert_eq!(rec.contributing_agents, 5);
        assert_eq!(rec.score, 0.8);
        assert_eq!(rec.signal, Signal::StrongBuy);
        assert!(rec.agent_errors.is_empty());
    }

    #[tokio::test]
    async fn test_failing_agent_becomes_sentinel() {
        let orchestrator = Orchestrator::builder(config())
            .agent(scoring(AgentId::Technical, 0.7))
            .agent(failing(AgentId::RiskAssessment))
            .build()
            .unwrap();

        let rec = orchestrator
            .analyze_stock("ACME", "technical setup", InvestmentPreference::Balanced)
            .await
            .unwrap();

        assert_eq!(rec.active_agents, vec![AgentId::Technical, AgentId::RiskAssessment]);
        assert_eq!(rec.contributing_agents, 1);
        assert_eq!(rec.score, 0.7);

        let sentinel = &rec.agent_results[&AgentId::RiskAssessment];
        assert!(sentinel.is_error());
        assert_eq!(sentinel.overall_score(), 0.5);
        assert_eq!(sentinel.weight(), 0.15);
        assert!(rec.agent_errors[&AgentId::RiskAssessment].contains("feed down"));
    }

    #[tokio::test]
    async fn test_panicking_agent_does_not_stop_others() {
        let mut panicking = MockScoringAgent::new();
        panicking.expect_id().return_const(AgentId::RiskAssessment);
        panicking.expect_weight().return_const(0.15);
        panicking
            .expect_analyze()
            .returning(|_, _| panic!("division by zero"));

        let orchestrator = Orchestrator::builder(config())
            .agent(scoring(AgentId::Technical, 0.6))
            .agent(Arc::new(panicking))
            .build()
            .unwrap();

        let rec = orchestrator
            .analyze_stock("ACME", "chart", InvestmentPreference::Balanced)
            .await
            .unwrap();

        assert_eq!(rec.contributing_agents, 1);
        assert_eq!(rec.score, 0.6);
        assert!(rec.agent_errors[&AgentId::RiskAssessment].starts_with("agent task aborted"));
    }

    #[tokio::test]
    async fn test_unregistered_agents_are_skipped() {
        let orchestrator = Orchestrator::builder(config())
            .agent(scoring(AgentId::Technical, 0.7))
            .build()
            .unwrap();

        let rec = orchestrator
            .analyze_stock("ACME", "", InvestmentPreference::Growth)
            .await
            .unwrap();

        assert_eq!(rec.active_agents, AgentId::ALL.to_vec());
        assert_eq!(rec.agent_results.len(), 1);
        assert_eq!(rec.contributing_agents, 1);
        assert_eq!(rec.score, 0.7);
        assert_eq!(rec.preference, InvestmentPreference::Growth);
    }

    #[tokio::test]
    async fn test_blank_ticker_rejected() {
        let orchestrator = Orchestrator::builder(config())
            .agent(scoring(AgentId::Technical, 0.7))
            .build()
            .unwrap();

        let err = orchestrator
            .analyze_stock("   ", "buy?", InvestmentPreference::Balanced)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidSymbol(_)));
    }

    #[tokio::test]
    async fn test_missing_data_starves_consensus() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(StaticDataProvider::new());
        let orchestrator = Orchestrator::new(config(), provider).unwrap();

        let rec = orchestrator
            .analyze_stock("NOPE", "", InvestmentPreference::Balanced)
            .await
            .unwrap();

        assert_eq!(rec.contributing_agents, 0);
        assert_eq!(rec.score, 0.5);
        assert_eq!(rec.signal, Signal::Hold);
        assert!(rec.confidence <= 0.2);
        assert_eq!(rec.agent_errors.len(), 5);
    }

    #[test]
    fn test_builder_validates() {
        let bad = EngineConfig {
            peers: crate::config::PeerConfig { max_peers: 0 },
            ..EngineConfig::default()
        };
        let result = Orchestrator::builder(Arc::new(bad))
            .agent(scoring(AgentId::Technical, 0.5))
            .build();
        assert!(matches!(result, Err(ConsensusError::Config(_))));

        let result = Orchestrator::builder(config()).build();
        assert!(matches!(result, Err(ConsensusError::Config(_))));
    }

    #[test]
    fn test_registered_agents() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(StaticDataProvider::new());
        let orchestrator = Orchestrator::new(config(), provider).unwrap();
        assert_eq!(orchestrator.registered_agents(), AgentId::ALL.to_vec());
    }
}
