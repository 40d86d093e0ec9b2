//! Core types: node identifiers, activation state, counters, configuration, errors.
//!
//! These are shared by every other module and carry no behavior of
//! their own beyond simple accessors.

pub mod id;
pub mod state;
pub mod config;
pub mod error;

pub use id::NodeId;
pub use state::{ActivationState, Counters};
pub use config::LinkConfig;
pub use error::{LinkError, LinkResult};
