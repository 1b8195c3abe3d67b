// src/error.rs

use thiserror::Error;

/// Errors raised by the simulation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A distribution or configuration parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reorder point above order-up-to level.
    #[error("invalid (s, S) policy: s = {reorder_point} exceeds S = {order_up_to}")]
    InvalidPolicy { reorder_point: i64, order_up_to: i64 },

    /// Replication count outside `1..=MAX_REPLICATIONS`.
    #[error("replications must be in 1..=2000 (got {0})")]
    InvalidReplicationCount(usize),

    /// The run observed its cancellation flag.
    #[error("simulation cancelled")]
    Cancelled,
}

impl SimError {
    /// Creates an invalid parameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config rejected: {0}")]
    Invalid(#[from] SimError),
}

pub type Result<T> = std::result::Result<T, SimError>;
