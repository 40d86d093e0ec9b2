//! Event node definitions.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::conditions::TriggerCondition;
use crate::core::{ActivationState, NodeId};
use crate::effects::Effect;

/// A triggerable map entity.
///
/// Conditions and effects are fixed once the node is registered. The
/// activation state is owned by the registry and only changed by the
/// [`ActionDispatcher`](crate::effects::ActionDispatcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNode {
    /// Unique identifier.
    pub id: NodeId,

    /// Human-readable name (for debugging).
    pub name: String,

    /// Conditions that must all hold for the node to fire.
    /// Most map events declare one or two.
    pub conditions: SmallVec<[TriggerCondition; 2]>,

    /// Effects applied, in order, when the node fires.
    pub effects: Vec<Effect>,

    /// Repeatable nodes return to `Dormant` after firing;
    /// one-shot nodes become `Locked`.
    pub repeatable: bool,

    pub(crate) state: ActivationState,
}

impl EventNode {
    /// Create a new dormant, one-shot node with no conditions or effects.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            conditions: SmallVec::new(),
            effects: Vec::new(),
            repeatable: false,
            state: ActivationState::Dormant,
        }
    }

    /// Add a condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: TriggerCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Mark the node repeatable (builder pattern).
    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Set the initial state (builder pattern).
    ///
    /// Used when the host restores a node that was saved mid-session.
    #[must_use]
    pub fn with_state(mut self, state: ActivationState) -> Self {
        self.state = state;
        self
    }

    /// Current activation state.
    #[must_use]
    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Can this node fire in its current state?
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.state.can_fire(self.repeatable)
    }

    /// Nodes this node depends on, in declaration order.
    pub fn dependencies(&self) -> SmallVec<[NodeId; 4]> {
        let mut out: SmallVec<[NodeId; 4]> = SmallVec::new();
        for condition in &self.conditions {
            for node in condition.referenced_nodes() {
                if !out.contains(&node) {
                    out.push(node);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = EventNode::new(NodeId(3), "Gate")
            .with_condition(TriggerCondition::fired(NodeId(1)))
            .with_condition(TriggerCondition::counter_at_least("keys", 1))
            .with_effect(Effect::modify_counter("keys", -1))
            .repeatable();

        assert_eq!(node.id, NodeId(3));
        assert_eq!(node.name, "Gate");
        assert_eq!(node.conditions.len(), 2);
        assert_eq!(node.effects.len(), 1);
        assert!(node.repeatable);
        assert_eq!(node.state(), ActivationState::Dormant);
        assert!(node.can_fire());
    }

    #[test]
    fn test_locked_cannot_fire() {
        let node = EventNode::new(NodeId(1), "Chest").with_state(ActivationState::Locked);
        assert!(!node.can_fire());
    }

    #[test]
    fn test_dependencies_deduplicated() {
        let node = EventNode::new(NodeId(9), "Bridge")
            .with_condition(TriggerCondition::fired(NodeId(2)))
            .with_condition(TriggerCondition::any([
                TriggerCondition::has_fired(NodeId(4)),
                TriggerCondition::fired(NodeId(2)),
            ]));

        assert_eq!(node.dependencies().as_slice(), &[NodeId(2), NodeId(4)]);
    }
}
