#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod error;
pub mod hal;
pub mod heading;
pub mod ledger;
#[cfg(feature = "std")]
pub mod logging;
pub mod node;
pub mod protocol;

// Re-export the core types
pub use config::{NodeConfig, RadioSettings, Timing};
pub use error::{ConfigError, HalError};
pub use hal::{Display, Glyph, Hardware, Input, Radio};
pub use heading::quantize;
pub use ledger::{EncounterLedger, EncounterRecord};
pub use node::{NodeController, Role};
pub use protocol::{decode, encode, Course, Frame, Message, NodeId, ProducerKind};
