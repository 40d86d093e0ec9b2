//! Condition evaluation.
//!
//! Evaluation is pure: it reads a [`Snapshot`] and returns a boolean.
//! A condition that reads a node that is not registered evaluates to
//! `false` as a whole, even under `Not`, so collaborators can remove events mid-session without breaking the
//! nodes that still point at them.

use crate::core::{ActivationState, Counters, NodeId};
use crate::registry::Registry;

use super::condition::TriggerCondition;

/// Read-only view of node states and counters.
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    /// Registry holding current node states.
    pub registry: &'a Registry,
    /// Global counters supplied by the caller.
    pub counters: &'a Counters,
}

impl<'a> Snapshot<'a> {
    /// Create a new snapshot.
    pub fn new(registry: &'a Registry, counters: &'a Counters) -> Self {
        Self { registry, counters }
    }

    /// Current state of a node, `None` if it is not registered.
    #[must_use]
    pub fn state_of(&self, node: NodeId) -> Option<ActivationState> {
        self.registry.state_of(node)
    }

    /// Current counter value.
    #[must_use]
    pub fn counter(&self, key: &str) -> i64 {
        self.counters.get(key)
    }
}

/// How far a node's condition list is from being satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// Every condition holds (or there are none).
    Ready,
    /// Some conditions hold.
    Partial { satisfied: usize, total: usize },
    /// No condition holds.
    Unmet,
}

impl Readiness {
    /// Check if every condition holds.
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Evaluator for trigger conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Check if a condition is satisfied.
    ///
    /// A reference to an unregistered node anywhere in the tree makes the
    /// whole condition false, negated or not.
    pub fn evaluate(condition: &TriggerCondition, snapshot: &Snapshot) -> bool {
        !Self::references_missing(condition, snapshot) && Self::holds(condition, snapshot)
    }

    fn holds(condition: &TriggerCondition, snapshot: &Snapshot) -> bool {
        match condition {
            TriggerCondition::StateEquals { node, state } => {
                snapshot.state_of(*node) == Some(*state)
            }

            TriggerCondition::HasFired(node) => {
                snapshot.state_of(*node).is_some_and(ActivationState::has_fired)
            }

            TriggerCondition::Counter { key, cmp, value } => {
                cmp.holds(snapshot.counter(key), *value)
            }

            TriggerCondition::AllOf(conditions) => {
                conditions.iter().all(|c| Self::holds(c, snapshot))
            }

            TriggerCondition::AnyOf(conditions) => {
                conditions.iter().any(|c| Self::holds(c, snapshot))
            }

            TriggerCondition::Not(inner) => !Self::holds(inner, snapshot),

            TriggerCondition::Always => true,

            TriggerCondition::Never => false,
        }
    }

    fn references_missing(condition: &TriggerCondition, snapshot: &Snapshot) -> bool {
        match condition {
            TriggerCondition::StateEquals { node, .. } | TriggerCondition::HasFired(node) => {
                snapshot.state_of(*node).is_none()
            }
            TriggerCondition::AllOf(conditions) | TriggerCondition::AnyOf(conditions) => {
                conditions.iter().any(|c| Self::references_missing(c, snapshot))
            }
            TriggerCondition::Not(inner) => Self::references_missing(inner, snapshot),
            TriggerCondition::Counter { .. } | TriggerCondition::Always | TriggerCondition::Never => {
                false
            }
        }
    }

    /// Check if every condition in a node's list holds, stopping at the first failure.
    pub fn all_hold(conditions: &[TriggerCondition], snapshot: &Snapshot) -> bool {
        conditions.iter().all(|c| Self::evaluate(c, snapshot))
    }

    /// Count how many of a node's conditions hold.
    ///
    /// Unlike [`all_hold`](Self::all_hold) this evaluates every top-level
    /// condition, since arming needs the partial count.
    pub fn readiness(conditions: &[TriggerCondition], snapshot: &Snapshot) -> Readiness {
        let total = conditions.len();
        let satisfied = conditions
            .iter()
            .filter(|c| Self::evaluate(c, snapshot))
            .count();

        if satisfied == total {
            Readiness::Ready
        } else if satisfied == 0 {
            Readiness::Unmet
        } else {
            Readiness::Partial { satisfied, total }
        }
    }
}
