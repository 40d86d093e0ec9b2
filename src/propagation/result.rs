//! Propagation output types.

use serde::{Deserialize, Serialize};

use crate::core::{ActivationState, NodeId};

/// Why a node changed state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cause {
    /// Reported by a collaborator (`"manual"`, `"quest_complete"`, ...).
    External(String),
    /// A node it depends on changed.
    Dependency(NodeId),
    /// A counter it reads changed.
    Counter(String),
    /// An effect of this node targeted it.
    Effect(NodeId),
    /// It fired in an earlier generation and was retired.
    Settle,
}

impl From<&str> for Cause {
    fn from(reason: &str) -> Self {
        Self::External(reason.to_string())
    }
}

impl From<String> for Cause {
    fn from(reason: String) -> Self {
        Self::External(reason)
    }
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External(reason) => write!(f, "external({reason})"),
            Self::Dependency(node) => write!(f, "dependency({node})"),
            Self::Counter(key) => write!(f, "counter({key})"),
            Self::Effect(node) => write!(f, "effect({node})"),
            Self::Settle => write!(f, "settle"),
        }
    }
}

/// One node's state change during a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub node: NodeId,
    pub state: ActivationState,
    pub cause: Cause,
}

impl StateChange {
    pub fn new(node: NodeId, state: ActivationState, cause: Cause) -> Self {
        Self { node, state, cause }
    }
}

/// Everything that changed during one top-level call.
///
/// Changes are listed in the order they happened, so a UI layer can
/// replay them frame by frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationResult {
    /// Generation this pass ran in.
    pub generation: u64,

    /// Ordered state changes.
    pub changes: Vec<StateChange>,

    /// Number of candidate condition evaluations performed.
    pub evaluations: usize,

    /// The pass stopped at the configured depth limit.
    pub truncated: bool,
}

impl PropagationResult {
    /// Create an empty result for a generation.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Record a change.
    pub fn push(&mut self, change: StateChange) {
        self.changes.push(change);
    }

    /// `(node, new state)` pairs in order.
    pub fn pairs(&self) -> Vec<(NodeId, ActivationState)> {
        self.changes.iter().map(|c| (c.node, c.state)).collect()
    }

    /// Nodes that fired, in firing order.
    pub fn fired(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.changes
            .iter()
            .filter(|c| c.state == ActivationState::Fired)
            .map(|c| c.node)
    }

    /// Did this node fire during the pass?
    #[must_use]
    pub fn did_fire(&self, node: NodeId) -> bool {
        self.fired().any(|n| n == node)
    }

    /// Number of changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
