//! Error types for the kinematics library.

use core::fmt;

/// Errors that can occur when describing the drive base or integrating motion.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// A wheel radius that is not strictly positive was supplied.
    InvalidWheelRadius(&'static str),
    /// A track width that is not strictly positive was supplied.
    InvalidTrackWidth(&'static str),
    /// A negative time delta was used for pose integration.
    NegativeTimeDelta(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidWheelRadius(msg) => write!(f, "Invalid wheel radius: {}", msg),
            KinematicsError::InvalidTrackWidth(msg) => write!(f, "Invalid track width: {}", msg),
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
