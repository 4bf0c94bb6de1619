//! This module defines the error types used by the `tern-navigation` crate.

#![warn(missing_docs)]

/// Error type for navigation setup.
///
/// Per-tick control never fails; these errors are only produced when a set
/// of tunables is validated before a run starts.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// A speed (wheel rad/s or chassis m/s) is not strictly positive.
    InvalidSpeed(&'static str),
    /// A distance or range threshold is not strictly positive.
    InvalidThreshold(&'static str),
    /// An angular tolerance is not strictly positive.
    InvalidTolerance(&'static str),
    /// An arc or polygon description cannot be driven.
    InvalidGeometry(&'static str),
    /// The exploration run would never measure an obstacle.
    InvalidObstacleCount(&'static str),
}

impl core::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NavigationError::InvalidSpeed(msg) => write!(f, "Invalid speed: {}", msg),
            NavigationError::InvalidThreshold(msg) => write!(f, "Invalid threshold: {}", msg),
            NavigationError::InvalidTolerance(msg) => write!(f, "Invalid tolerance: {}", msg),
            NavigationError::InvalidGeometry(msg) => write!(f, "Invalid geometry: {}", msg),
            NavigationError::InvalidObstacleCount(msg) => {
                write!(f, "Invalid obstacle count: {}", msg)
            }
        }
    }
}

impl core::error::Error for NavigationError {}
