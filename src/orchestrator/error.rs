// ABOUTME: Error types for provider calls and orchestrator construction.
// ABOUTME: Provider errors are converted into failed outcomes and never escape submit().

use std::time::Duration;

use thiserror::Error;

use super::types::FailureKind;

/// Errors that can occur during a single provider call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("timeout")]
    Timeout(Duration),

    #[error("provider reported failure: {0}")]
    Failed(String),

    #[error("provider unavailable")]
    Unavailable,

    #[error("unknown capability: {0}")]
    NotFound(String),

    #[error("cancelled")]
    Cancelled,

    #[error("provider task panicked: {0}")]
    Panicked(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Timeout(_) => FailureKind::Timeout,
            ProviderError::Unavailable => FailureKind::Unavailable,
            ProviderError::NotFound(_) => FailureKind::NotFound,
            ProviderError::Cancelled => FailureKind::Cancelled,
            ProviderError::Failed(_) | ProviderError::Panicked(_) | ProviderError::Transport(_) => {
                FailureKind::ProviderError
            }
        }
    }
}

/// Errors raised while building an orchestrator from configuration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid pattern for capability {capability}: {source}")]
    Pattern {
        capability: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Invalid fallback chain for {capability}: {reason}")]
    InvalidFallback { capability: String, reason: String },
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
