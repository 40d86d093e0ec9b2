//! # event-links
//!
//! Event linking and trigger propagation for 2D RPG map events.
//!
//! Map events declare conditions on other events and on global counters.
//! When a collaborator (quests, economy, factions, shops) reports a
//! change, the linker re-evaluates everything that depends on it and
//! fires whatever became ready, level by level.
//!
//! ## Design Principles
//!
//! 1. **Explicitly Owned State**: No globals. The host owns one
//!    [`EventLinker`] per session and passes it where it is needed.
//!
//! 2. **Cycles Are Allowed**: Mutual triggers are legitimate. A node
//!    fires at most once per generation, so every pass terminates.
//!
//! 3. **Deterministic**: Ties within a breadth level go to the node
//!    registered first. Identical inputs give identical firing sequences.
//!
//! 4. **Typed Collaborators**: External effects are routed by
//!    [`EffectKind`] to registered callbacks, never by inspecting types
//!    at runtime.
//!
//! ## Modules
//!
//! - `core`: Node IDs, activation state, counters, configuration, errors
//! - `registry`: Event nodes and dependency queries
//! - `conditions`: Trigger conditions and their evaluation
//! - `propagation`: Breadth-first propagation engine
//! - `effects`: Effects and the action dispatcher
//! - `linker`: The `EventLinker` facade and saved-state hand-off

pub mod core;
pub mod registry;
pub mod conditions;
pub mod propagation;
pub mod effects;
pub mod linker;

// Re-export commonly used types
pub use crate::core::{ActivationState, Counters, LinkConfig, LinkError, LinkResult, NodeId};

pub use crate::registry::{EventNode, Registry};

pub use crate::conditions::{Comparison, ConditionEvaluator, Readiness, Snapshot, TriggerCondition};

pub use crate::propagation::{
    Cause, PropagationEngine, PropagationResult, PropagationTask, StateChange,
};

pub use crate::effects::{
    ActionDispatcher, Effect, EffectInvocation, EffectKind, EffectSink, FireOutcome,
};

pub use crate::linker::{EventLinker, SavedState};
