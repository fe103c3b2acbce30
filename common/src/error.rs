//! Error types for node hardware and provisioning.

use thiserror::Error;

use crate::protocol::{Course, MAX_COURSES};

/// Hardware abstraction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HalError {
    /// Radio rejected the requested settings
    #[error("radio configuration rejected: {0}")]
    Config(&'static str),

    /// Frame could not be transmitted
    #[error("radio send failed")]
    SendFailed,

    /// Frame could not be read from the radio
    #[error("radio receive failed")]
    RecvFailed,

    /// Button state could not be read
    #[error("button input unavailable")]
    Input,
}

/// Provisioning errors, reported once at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[cfg(feature = "std")]
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for a node
    #[cfg(feature = "std")]
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Node has no course at all
    #[error("at least one course is required")]
    NoCourses,

    /// A compass follows exactly one course
    #[error("a compass must be bound to exactly one course, got {0}")]
    CompassCourses(usize),

    /// Same course listed twice
    #[error("course {0} is listed more than once")]
    DuplicateCourse(Course),

    /// More courses than a flag can announce
    #[error("at most {} courses are supported", MAX_COURSES)]
    TooManyCourses,

    /// Quantizer needs at least one bucket
    #[error("bucket_count must be between 1 and 360, got {0}")]
    BucketCount(u16),

    /// Radio setting out of the hardware range
    #[error("radio {field} must be at most {max}, got {value}")]
    Radio {
        field: &'static str,
        value: u8,
        max: u8,
    },
}
