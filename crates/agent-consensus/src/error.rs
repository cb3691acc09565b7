//! Error types for the consensus engine

use agent_utils::ConfigFileError;
use thiserror::Error;

/// Consensus engine specific errors
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Configuration was rejected by validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be loaded
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    /// Market data for the requested symbol is missing
    #[error("Data not available for {symbol}: {reason}")]
    Data { symbol: String, reason: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An agent reported a failure
    #[error("Agent error: {0}")]
    Agent(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),
}

impl ConsensusError {
    pub fn data(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Data {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for consensus operations
pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Convert ConsensusError to agent_core::Error
impl From<ConsensusError> for agent_core::Error {
    fn from(err: ConsensusError) -> Self {
        match err {
            ConsensusError::InvalidSymbol(symbol) => agent_core::Error::InvalidTicker(symbol),
            ConsensusError::Data { symbol, reason } => {
                agent_core::Error::data_unavailable(symbol, reason)
            },
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

/// Convert agent_core::Error to ConsensusError
impl From<agent_core::Error> for ConsensusError {
    fn from(err: agent_core::Error) -> Self {
        match err {
            agent_core::Error::InvalidTicker(symbol) => ConsensusError::InvalidSymbol(symbol),
            agent_core::Error::DataUnavailable { ticker, reason } => {
                ConsensusError::data(ticker, reason)
            },
            other => ConsensusError::Agent(other.to_string()),
        }
    }
}
