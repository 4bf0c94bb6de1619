//! This module defines the error types used by the `tern-sim` crate.

/// Error type for simulator setup.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The time step or time limit is unusable.
    InvalidTimeStep(&'static str),
    /// A speed or noise limit is unusable.
    InvalidLimit(&'static str),
}

impl core::fmt::Display for SimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SimError::InvalidTimeStep(msg) => write!(f, "Invalid time step: {}", msg),
            SimError::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
        }
    }
}

impl core::error::Error for SimError {}
