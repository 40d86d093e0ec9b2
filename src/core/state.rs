//! Activation state and global counters.
//!
//! ## ActivationState
//!
//! The lifecycle of one event node:
//!
//! ```text
//! Dormant --partial--> Armed --all met--> Fired --settle--> Locked   (one-shot)
//!    ^                   |                  |
//!    +------unmet--------+                  +--settle--> Dormant     (repeatable)
//! ```
//!
//! ## Counters
//!
//! Global `i64` values shared with collaborators (gold, kill counts,
//! faction standing). Backed by `im::OrdMap` so snapshots are O(1) to
//! clone and iterate in key order.
//!
//! To store non-integer values:
//! - Booleans: use 0/1
//! - Node references: use NodeId.0 as i64

use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Activation state of an event node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivationState {
    /// Waiting; none of its conditions are known to hold.
    #[default]
    Dormant,
    /// Some, but not all, of its conditions hold.
    Armed,
    /// All conditions held and its effects were applied.
    Fired,
    /// Terminal. A one-shot node that already fired.
    Locked,
}

impl ActivationState {
    /// Can a node in this state fire?
    ///
    /// `Fired` nodes may only fire again when repeatable (which only
    /// happens when settling between generations is disabled).
    #[must_use]
    pub const fn can_fire(self, repeatable: bool) -> bool {
        match self {
            Self::Dormant | Self::Armed => true,
            Self::Fired => repeatable,
            Self::Locked => false,
        }
    }

    /// Has the node fired at some point (including retired one-shots)?
    #[must_use]
    pub const fn has_fired(self) -> bool {
        matches!(self, Self::Fired | Self::Locked)
    }

    /// Short lowercase name, used in log fields.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dormant => "dormant",
            Self::Armed => "armed",
            Self::Fired => "fired",
            Self::Locked => "locked",
        }
    }
}

impl std::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Global counter table.
///
/// Missing keys read as `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    values: OrdMap<String, i64>,
}

impl Counters {
    /// Create an empty counter table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a counter value (`0` when unset).
    #[must_use]
    pub fn get(&self, key: &str) -> i64 {
        self.values.get(key).copied().unwrap_or(0)
    }

    /// Set a counter. Returns `true` if the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: i64) -> bool {
        let key = key.into();
        let previous = self.get(&key);
        self.values.insert(key, value);
        previous != value
    }

    /// Add `delta` to a counter. Returns `true` if the stored value changed.
    pub fn modify(&mut self, key: impl Into<String>, delta: i64) -> bool {
        let key = key.into();
        let next = self.get(&key).saturating_add(delta);
        self.set(key, next)
    }

    /// Is this counter explicitly set?
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of explicitly set counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no counters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate counters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.values.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for Counters {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        assert_eq!(ActivationState::default(), ActivationState::Dormant);
    }

    #[test]
    fn test_can_fire() {
        assert!(ActivationState::Dormant.can_fire(false));
        assert!(ActivationState::Armed.can_fire(false));
        assert!(!ActivationState::Fired.can_fire(false));
        assert!(ActivationState::Fired.can_fire(true));
        assert!(!ActivationState::Locked.can_fire(true));
    }

    #[test]
    fn test_has_fired() {
        assert!(!ActivationState::Dormant.has_fired());
        assert!(!ActivationState::Armed.has_fired());
        assert!(ActivationState::Fired.has_fired());
        assert!(ActivationState::Locked.has_fired());
    }

    #[test]
    fn test_counters_default_zero() {
        let counters = Counters::new();
        assert_eq!(counters.get("gold"), 0);
        assert!(!counters.contains("gold"));
    }

    #[test]
    fn test_counters_set_and_modify() {
        let mut counters = Counters::new();

        assert!(counters.set("gold", 10));
        assert!(!counters.set("gold", 10));
        assert!(counters.modify("gold", 5));
        assert_eq!(counters.get("gold"), 15);
        assert!(!counters.modify("gold", 0));
        assert_eq!(counters.len(), 1);
    }

    #[test]
    fn test_counters_saturate() {
        let mut counters = Counters::new();
        counters.set("big", i64::MAX);
        counters.modify("big", 1);
        assert_eq!(counters.get("big"), i64::MAX);
    }

    #[test]
    fn test_counters_clone_is_independent() {
        let mut counters: Counters = [("kills", 3)].into_iter().collect();
        let snapshot = counters.clone();

        counters.modify("kills", 1);

        assert_eq!(snapshot.get("kills"), 3);
        assert_eq!(counters.get("kills"), 4);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ActivationState::Armed).unwrap();
        let state: ActivationState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, ActivationState::Armed);
    }
}
