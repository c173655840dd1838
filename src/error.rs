//! Error taxonomy for the simulation core
//!
//! Expected outcomes ("no collision", "hit ignored during cooldown") are plain
//! return values. These errors are for malformed inputs and illegal transitions.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Malformed score, serve, offset or difficulty input
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation requested from a state that does not allow it
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Rule set rejected at construction time
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SimError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SimError::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        SimError::InvalidTransition(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    /// Whether the frame loop can carry on after dropping the offending step
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::Validation(_) | SimError::InvalidTransition(_) => true,
            SimError::Configuration(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
