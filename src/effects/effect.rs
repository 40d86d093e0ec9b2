//! Effect definitions.
//!
//! Effects are what a node does when it fires. The dispatcher applies
//! counter and node-state effects itself; everything a collaborator owns
//! (gold, factions, quests, shops) is an [`Effect::External`] routed by
//! its [`EffectKind`] to registered handlers.

use serde::{Deserialize, Serialize};

use crate::core::NodeId;

/// Collaborator category an external effect is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Party gold and prices.
    Economy,
    /// Secondary currencies (tokens, medals).
    Currency,
    /// Faction standing.
    Faction,
    /// Kill-count quests.
    KillQuest,
    /// Shop stock and unlocks.
    Shop,
    /// Damage reflection toggles.
    ReflectDamage,
    /// Face graphics (portraits, animations).
    Face,
    /// Host-defined category.
    Custom(u16),
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Economy => f.write_str("economy"),
            Self::Currency => f.write_str("currency"),
            Self::Faction => f.write_str("faction"),
            Self::KillQuest => f.write_str("kill_quest"),
            Self::Shop => f.write_str("shop"),
            Self::ReflectDamage => f.write_str("reflect_damage"),
            Self::Face => f.write_str("face"),
            Self::Custom(id) => write!(f, "custom({id})"),
        }
    }
}

/// An effect applied when a node fires.
///
/// ## Counter Effects
///
/// - `ModifyCounter`: Add `delta` to a global counter
/// - `SetCounter`: Set a global counter
///
/// Changed counters re-evaluate every node that reads them.
///
/// ## Node Effects
///
/// - `LockNode`: Move another node straight to `Locked`
/// - `ResetNode`: Move another node back to `Dormant`
/// - `Activate`: Fire another node on the next level, ignoring its conditions
///
/// ## Collaborator Effects
///
/// - `External`: Handed to the handlers registered for `kind`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    // === Counters ===

    /// Modify a counter (add delta).
    ModifyCounter { key: String, delta: i64 },

    /// Set a counter directly.
    SetCounter { key: String, value: i64 },

    // === Nodes ===

    /// Lock a node.
    LockNode(NodeId),

    /// Return a node to dormant.
    ResetNode(NodeId),

    /// Request a node to fire.
    Activate(NodeId),

    // === Collaborators ===

    /// Delegated to external handlers.
    External { kind: EffectKind, key: String, value: i64 },
}

impl Effect {
    /// Create a counter delta effect.
    pub fn modify_counter(key: impl Into<String>, delta: i64) -> Self {
        Self::ModifyCounter { key: key.into(), delta }
    }

    /// Create a counter assignment effect.
    pub fn set_counter(key: impl Into<String>, value: i64) -> Self {
        Self::SetCounter { key: key.into(), value }
    }

    /// Create a lock effect.
    pub fn lock(node: NodeId) -> Self {
        Self::LockNode(node)
    }

    /// Create a reset effect.
    pub fn reset(node: NodeId) -> Self {
        Self::ResetNode(node)
    }

    /// Create an activation effect.
    pub fn activate(node: NodeId) -> Self {
        Self::Activate(node)
    }

    /// Create a collaborator effect.
    pub fn external(kind: EffectKind, key: impl Into<String>, value: i64) -> Self {
        Self::External { kind, key: key.into(), value }
    }

    /// Give (or take, if negative) party gold.
    pub fn gold(amount: i64) -> Self {
        Self::external(EffectKind::Economy, "gold", amount)
    }

    /// Change standing with a faction.
    pub fn standing(faction: impl Into<String>, delta: i64) -> Self {
        Self::external(EffectKind::Faction, faction, delta)
    }

    /// The collaborator kind, for external effects.
    #[must_use]
    pub fn kind(&self) -> Option<EffectKind> {
        match self {
            Self::External { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        assert_eq!(
            Effect::modify_counter("kills", 1),
            Effect::ModifyCounter { key: "kills".to_string(), delta: 1 }
        );
        assert_eq!(
            Effect::gold(50),
            Effect::External { kind: EffectKind::Economy, key: "gold".to_string(), value: 50 }
        );
        assert_eq!(Effect::standing("guild", -2).kind(), Some(EffectKind::Faction));
        assert_eq!(Effect::lock(NodeId(1)).kind(), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EffectKind::KillQuest.to_string(), "kill_quest");
        assert_eq!(EffectKind::Custom(7).to_string(), "custom(7)");
    }

    #[test]
    fn test_effect_serialization() {
        let effect = Effect::external(EffectKind::Custom(3), "fish", 2);
        let json = serde_json::to_string(&effect).unwrap();
        let deserialized: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(effect, deserialized);
    }
}
