//! Consensus engine CLI
//!
//! Runs the multi-agent analysis over a JSON market data bundle.
//!
//! # Usage
//!
//! ```bash
//! # Full analysis with every agent
//! cargo run --bin consensus-cli -- analyze --ticker TCS.NS --data demos/bundle.json
//!
//! # Let the question pick the agents, print JSON
//! cargo run --bin consensus-cli -- analyze --ticker TCS.NS --data demos/bundle.json \
//!     --query "What's the technical setup?" --json
//!
//! # Show which agents a question activates
//! cargo run --bin consensus-cli -- select --query "compare with peers"
//! ```

use agent_consensus::interface::{FormatterFactory, OutputFormat};
use agent_consensus::{
    AgentSelector, CachedProvider, EngineConfig, MarketDataProvider, Orchestrator,
    StaticDataProvider,
};
use agent_core::InvestmentPreference;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_LOG_FILTER: &str = "warn,agent_consensus=info";

#[derive(Parser, Debug)]
#[command(name = "consensus-cli")]
#[command(about = "Multi-agent stock recommendation engine", long_about = None)]
struct Args {
    /// Engine configuration file (falls back to $CONSENSUS_CONFIG, then defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a ticker and print the recommendation
    Analyze {
        /// Ticker symbol, e.g. TCS.NS
        #[arg(short, long)]
        ticker: String,

        /// JSON file with one market snapshot or a list of them
        #[arg(short, long)]
        data: PathBuf,

        /// Free-text question used to pick the agents
        #[arg(short, long, default_value = "")]
        query: String,

        /// Investment style: value, growth or balanced
        #[arg(short, long, default_value = "balanced")]
        preference: InvestmentPreference,

        /// Print the recommendation as JSON
        #[arg(long, conflicts_with = "text")]
        json: bool,

        /// Print a plain text report instead of a table
        #[arg(long)]
        text: bool,
    },
    /// Show the agents a question would activate
    Select {
        #[arg(short, long)]
        query: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => EngineConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_json {
        agent_utils::init_tracing_json(DEFAULT_LOG_FILTER);
    } else {
        agent_utils::init_tracing_with_filter(DEFAULT_LOG_FILTER);
    }

    let config = Arc::new(load_config(args.config.as_ref())?);

    match args.command {
        Command::Analyze {
            ticker,
            data,
            query,
            preference,
            json,
            text,
        } => {
            let snapshots = StaticDataProvider::from_json_file(&data)
                .with_context(|| format!("loading market data from {}", data.display()))?;
            info!(tickers = snapshots.len(), "Loaded market data");

            let provider: Arc<dyn MarketDataProvider> =
                Arc::new(CachedProvider::new(snapshots, config.data.cache_ttl()));
            let orchestrator = Orchestrator::new(Arc::clone(&config), provider)?;

            let format = if json {
                OutputFormat::Json
            } else if text {
                OutputFormat::Text
            } else {
                OutputFormat::Table
            };
            let formatter = FormatterFactory::create(format);

            match orchestrator.analyze_stock(&ticker, &query, preference).await {
                Ok(recommendation) => {
                    println!("{}", formatter.format_recommendation(&recommendation)?);
                },
                Err(e) => {
                    eprintln!("{}", formatter.format_error(&e.to_string()));
                    std::process::exit(1);
                },
            }
        },
        Command::Select { query } => {
            let selector = AgentSelector::with_categories(config.selection.categories.clone());
            let selection = selector.route(&query);

            println!(
                "Category: {}",
                selection.category.as_deref().unwrap_or("none (all agents)")
            );
            for agent in selection.agents {
                println!("  - {} ({agent})", agent.display_name());
            }
        },
    }

    Ok(())
}
