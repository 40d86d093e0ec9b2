//! Trigger conditions.
//!
//! A condition is an immutable predicate over other nodes' activation
//! states and global counters. Conditions are what links nodes together:
//! every node or counter a condition mentions becomes a dependency edge.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{ActivationState, NodeId};

/// Comparison operator for counter thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// Apply the comparison as `lhs <op> rhs`.
    #[must_use]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// A condition that must hold for a node to fire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCondition {
    // === Node State ===

    /// Referenced node must be in exactly this state.
    StateEquals { node: NodeId, state: ActivationState },

    /// Referenced node has fired (`Fired` or `Locked`).
    HasFired(NodeId),

    // === Counters ===

    /// Global counter compared against a threshold.
    Counter { key: String, cmp: Comparison, value: i64 },

    // === Combinators ===

    /// All conditions must be true. Stops at the first false one.
    AllOf(Vec<TriggerCondition>),

    /// At least one condition must be true. Stops at the first true one.
    AnyOf(Vec<TriggerCondition>),

    /// Condition must be false.
    Not(Box<TriggerCondition>),

    // === Special ===

    /// Always matches.
    Always,

    /// Never matches.
    Never,
}

impl TriggerCondition {
    /// Require a node to be in a specific state.
    pub fn state_equals(node: NodeId, state: ActivationState) -> Self {
        Self::StateEquals { node, state }
    }

    /// Require a node to be `Fired` (this generation's pulse).
    pub fn fired(node: NodeId) -> Self {
        Self::state_equals(node, ActivationState::Fired)
    }

    /// Require a node to have fired at any point.
    pub fn has_fired(node: NodeId) -> Self {
        Self::HasFired(node)
    }

    /// Compare a counter against a threshold.
    pub fn counter(key: impl Into<String>, cmp: Comparison, value: i64) -> Self {
        Self::Counter { key: key.into(), cmp, value }
    }

    /// Require a counter to be at least `min`.
    pub fn counter_at_least(key: impl Into<String>, min: i64) -> Self {
        Self::counter(key, Comparison::Ge, min)
    }

    /// Create an AND condition.
    pub fn all(conditions: impl IntoIterator<Item = TriggerCondition>) -> Self {
        Self::AllOf(conditions.into_iter().collect())
    }

    /// Create an OR condition.
    pub fn any(conditions: impl IntoIterator<Item = TriggerCondition>) -> Self {
        Self::AnyOf(conditions.into_iter().collect())
    }

    /// Negate this condition.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Add another condition with AND.
    pub fn and(self, other: TriggerCondition) -> Self {
        match self {
            Self::AllOf(mut conditions) => {
                conditions.push(other);
                Self::AllOf(conditions)
            }
            _ => Self::AllOf(vec![self, other]),
        }
    }

    /// Add another condition with OR.
    pub fn or(self, other: TriggerCondition) -> Self {
        match self {
            Self::AnyOf(mut conditions) => {
                conditions.push(other);
                Self::AnyOf(conditions)
            }
            _ => Self::AnyOf(vec![self, other]),
        }
    }

    /// Every node this condition reads, in declaration order, without duplicates.
    pub fn referenced_nodes(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        self.collect_nodes(&mut out);
        out
    }

    /// Every counter this condition reads, in declaration order, without duplicates.
    pub fn referenced_counters(&self) -> SmallVec<[&str; 2]> {
        let mut out = SmallVec::new();
        self.collect_counters(&mut out);
        out
    }

    fn collect_nodes(&self, out: &mut SmallVec<[NodeId; 4]>) {
        match self {
            Self::StateEquals { node, .. } | Self::HasFired(node) => {
                if !out.contains(node) {
                    out.push(*node);
                }
            }
            Self::AllOf(conditions) | Self::AnyOf(conditions) => {
                for c in conditions {
                    c.collect_nodes(out);
                }
            }
            Self::Not(inner) => inner.collect_nodes(out),
            Self::Counter { .. } | Self::Always | Self::Never => {}
        }
    }

    fn collect_counters<'a>(&'a self, out: &mut SmallVec<[&'a str; 2]>) {
        match self {
            Self::Counter { key, .. } => {
                if !out.contains(&key.as_str()) {
                    out.push(key.as_str());
                }
            }
            Self::AllOf(conditions) | Self::AnyOf(conditions) => {
                for c in conditions {
                    c.collect_counters(out);
                }
            }
            Self::Not(inner) => inner.collect_counters(out),
            Self::StateEquals { .. } | Self::HasFired(_) | Self::Always | Self::Never => {}
        }
    }
}
