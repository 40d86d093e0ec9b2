//! Effects and the action dispatcher.
//!
//! - [`Effect`]: What a node does when it fires
//! - [`EffectKind`]: Collaborator category for external effects
//! - [`ActionDispatcher`]: Fires nodes, applies effects, owns state transitions
//!
//! ## Design Philosophy
//!
//! The dispatcher only touches activation state and counters. Anything a
//! collaborator owns is reached through a callback table keyed by
//! [`EffectKind`], so the core never needs to know what "gold" or
//! "faction standing" is.

mod effect;
mod dispatcher;

pub use effect::{Effect, EffectKind};
pub use dispatcher::{ActionDispatcher, EffectHandler, EffectInvocation, EffectSink, FireOutcome};
