//! Market data provider abstraction

use super::MarketSnapshot;
use crate::error::{ConsensusError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Source of per-ticker market snapshots
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the full data bundle for a ticker
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// JSON bundle file: a single snapshot or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<MarketSnapshot>),
    One(Box<MarketSnapshot>),
}

/// In-memory provider serving preloaded snapshots
#[derive(Debug, Clone, Default)]
pub struct StaticDataProvider {
    snapshots: HashMap<String, MarketSnapshot>,
}

impl StaticDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load snapshots from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file: SnapshotFile = agent_utils::load_json_file(path)?;
        let snapshots = match file {
            SnapshotFile::Many(snapshots) => snapshots,
            SnapshotFile::One(snapshot) => vec![*snapshot],
        };

        let mut provider = Self::new();
        for snapshot in snapshots {
            provider.insert(snapshot)?;
        }
        Ok(provider)
    }

    /// Add a snapshot, keyed by its upper-cased ticker
    pub fn insert(&mut self, snapshot: MarketSnapshot) -> Result<()> {
        let key = normalize(&snapshot.ticker);
        if key.is_empty() {
            return Err(ConsensusError::InvalidSymbol(snapshot.ticker));
        }
        self.snapshots.insert(key, snapshot);
        Ok(())
    }

    pub fn with_snapshot(mut self, snapshot: MarketSnapshot) -> Result<Self> {
        self.insert(snapshot)?;
        Ok(self)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl MarketDataProvider for StaticDataProvider {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
        self.snapshots
            .get(&normalize(ticker))
            .cloned()
            .ok_or_else(|| ConsensusError::data(ticker, "no snapshot loaded"))
    }

    fn name(&self) -> &str {
        "static"
    }
}

fn normalize(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
