//! Node provisioning: everything that used to be a per-device constant.
//!
//! A node is configured once at startup and the values never change while it
//! runs. Binaries load the configuration from TOML:
//!
//! ```toml
//! id = "A"
//! courses = ["1", "2", "5"]
//!
//! [radio]
//! power = 0
//!
//! [timing]
//! broadcast_pause_ms = 600
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::heading::DEFAULT_BUCKET_COUNT;
use crate::protocol::{Course, NodeId, MAX_COURSES};

/// Highest radio channel the hardware supports.
pub const MAX_CHANNEL: u8 = 83;
/// Highest transmit power level.
pub const MAX_POWER: u8 = 7;

/// Radio tuning shared by every node in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioSettings {
    /// Frequency channel
    pub channel: u8,
    /// Logical group; only nodes in the same group hear each other
    pub group: u8,
    /// Transmit power; kept at the lowest level so nodes must be close
    pub power: u8,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            channel: 7,
            group: 0,
            power: 0,
        }
    }
}

impl RadioSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel > MAX_CHANNEL {
            return Err(ConfigError::Radio {
                field: "channel",
                value: self.channel,
                max: MAX_CHANNEL,
            });
        }
        if self.power > MAX_POWER {
            return Err(ConfigError::Radio {
                field: "power",
                value: self.power,
                max: MAX_POWER,
            });
        }
        Ok(())
    }
}

/// Pauses and dwell times, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Pause after each needle update
    pub navigate_pause_ms: u32,
    /// Pause after each receive attempt while scanning
    pub scan_pause_ms: u32,
    /// Pause after each announcement
    pub broadcast_pause_ms: u32,
    /// Pause between input polls while choosing a course to review
    pub review_pause_ms: u32,
    /// How long each ledger entry stays on the display
    pub dwell_ms: u32,
    /// Pause on a blank display after a replay
    pub replay_pause_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigate_pause_ms: 100,
            scan_pause_ms: 200,
            broadcast_pause_ms: 600,
            review_pause_ms: 100,
            dwell_ms: 1000,
            replay_pause_ms: 1000,
        }
    }
}

/// Configuration of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Identity, unique among all nodes sharing the radio group
    pub id: NodeId,
    /// Bound courses; exactly one for a compass
    pub courses: heapless::Vec<Course, MAX_COURSES>,
    /// Needle directions for the heading quantizer
    #[serde(default = "default_bucket_count")]
    pub bucket_count: u16,
    #[serde(default)]
    pub radio: RadioSettings,
    #[serde(default)]
    pub timing: Timing,
}

fn default_bucket_count() -> u16 {
    DEFAULT_BUCKET_COUNT
}

impl NodeConfig {
    /// Build a configuration with default radio and timing settings.
    pub fn new(id: NodeId, courses: &[Course]) -> Result<Self, ConfigError> {
        let courses =
            heapless::Vec::from_slice(courses).map_err(|_| ConfigError::TooManyCourses)?;
        let config = Self {
            id,
            courses,
            bucket_count: DEFAULT_BUCKET_COUNT,
            radio: RadioSettings::default(),
            timing: Timing::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks shared by both roles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.courses.is_empty() {
            return Err(ConfigError::NoCourses);
        }
        for (i, course) in self.courses.iter().enumerate() {
            if self.courses[..i].contains(course) {
                return Err(ConfigError::DuplicateCourse(*course));
            }
        }
        if self.bucket_count == 0 || self.bucket_count > 360 {
            return Err(ConfigError::BucketCount(self.bucket_count));
        }
        self.radio.validate()
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "std")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    #[cfg(feature = "std")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
