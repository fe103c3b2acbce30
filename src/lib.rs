//! Orienteering beacon network.
//!
//! Node logic lives in the workspace crates: `common` for the protocol,
//! ledger, controller and hardware layer, `compass` and `flag` for the two
//! roles. This crate adds a field simulation that runs a whole game on one
//! simulated ether.

pub mod field;

pub use common;
pub use compass;
pub use flag;

pub use field::{Field, FieldConfig, FieldError, NodeReport};
