//! Action dispatch - the only place node state changes.
//!
//! The `ActionDispatcher` fires nodes, walks them through the activation
//! state machine and applies their effects. Counter and node effects are
//! applied directly; external effects go to handlers that collaborators
//! register per [`EffectKind`].

use rustc_hash::FxHashMap;

use crate::core::{ActivationState, Counters, NodeId};
use crate::propagation::{Cause, StateChange};
use crate::registry::Registry;

use super::{Effect, EffectKind};

/// Callback for external effects.
///
/// Called synchronously while a node fires. Use the [`EffectSink`] to
/// feed changes back into the current pass.
pub type EffectHandler = Box<dyn FnMut(&EffectInvocation<'_>, &mut EffectSink)>;

/// What an effect handler is asked to apply.
#[derive(Clone, Copy, Debug)]
pub struct EffectInvocation<'a> {
    /// The node that fired.
    pub node: NodeId,
    /// Collaborator category.
    pub kind: EffectKind,
    /// Collaborator-defined key (currency name, faction, quest id).
    pub key: &'a str,
    /// Collaborator-defined amount.
    pub value: i64,
    /// Generation of the current pass.
    pub generation: u64,
    /// Counters as they were when the effect was reached.
    pub counters: &'a Counters,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum CounterWrite {
    Set(String, i64),
    Modify(String, i64),
}

/// Feedback channel for effect handlers.
///
/// Writes are applied after the handler returns, in the order made.
#[derive(Debug, Default)]
pub struct EffectSink {
    writes: Vec<CounterWrite>,
    activations: Vec<NodeId>,
}

impl EffectSink {
    /// Set a counter.
    pub fn set_counter(&mut self, key: impl Into<String>, value: i64) {
        self.writes.push(CounterWrite::Set(key.into(), value));
    }

    /// Add `delta` to a counter.
    pub fn modify_counter(&mut self, key: impl Into<String>, delta: i64) {
        self.writes.push(CounterWrite::Modify(key.into(), delta));
    }

    /// Ask for a node to fire on the next level.
    pub fn activate(&mut self, node: NodeId) {
        self.activations.push(node);
    }
}

/// Everything that happened while one node fired.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FireOutcome {
    /// State changes, starting with the fired node itself.
    pub changes: Vec<StateChange>,
    /// Counters whose value changed, without duplicates.
    pub changed_counters: Vec<String>,
    /// Nodes requested to fire next.
    pub activations: Vec<NodeId>,
    /// External effects that found no handler.
    pub unhandled: usize,
}

impl FireOutcome {
    fn note_counter(&mut self, key: &str) {
        if !self.changed_counters.iter().any(|k| k == key) {
            self.changed_counters.push(key.to_string());
        }
    }
}

/// Applies effects and owns every activation state transition.
#[derive(Default)]
pub struct ActionDispatcher {
    handlers: FxHashMap<EffectKind, Vec<EffectHandler>>,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self
            .handlers
            .iter()
            .map(|(kind, list)| (kind.to_string(), list.len()))
            .collect();
        kinds.sort();
        f.debug_struct("ActionDispatcher")
            .field("handlers", &kinds)
            .finish()
    }
}

impl ActionDispatcher {
    /// Create a dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an effect kind.
    ///
    /// Several handlers may share a kind; they run in registration order.
    pub fn register_handler<F>(&mut self, kind: EffectKind, handler: F)
    where
        F: FnMut(&EffectInvocation<'_>, &mut EffectSink) + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Number of handlers registered for a kind.
    #[must_use]
    pub fn handler_count(&self, kind: EffectKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Fire a node: transition it to `Fired` and apply its effects.
    ///
    /// Returns `None` if the node is not registered or cannot fire in
    /// its current state.
    pub fn fire(
        &mut self,
        registry: &mut Registry,
        counters: &mut Counters,
        id: NodeId,
        generation: u64,
        cause: Cause,
    ) -> Option<FireOutcome> {
        let node = registry.get(id).ok()?;
        if !node.can_fire() {
            tracing::debug!(node = %id, state = %node.state(), "node cannot fire");
            return None;
        }
        let effects = node.effects.clone();

        registry.set_state(id, ActivationState::Fired);
        tracing::debug!(node = %id, generation, cause = %cause, "node fired");

        let mut outcome = FireOutcome::default();
        outcome.changes.push(StateChange::new(id, ActivationState::Fired, cause));

        for effect in &effects {
            self.apply(registry, counters, id, generation, effect, &mut outcome);
        }

        Some(outcome)
    }

    /// Dormant -> Armed.
    pub fn arm(&mut self, registry: &mut Registry, id: NodeId, cause: Cause) -> Option<StateChange> {
        self.transition(registry, id, ActivationState::Dormant, ActivationState::Armed, cause)
    }

    /// Armed -> Dormant.
    pub fn disarm(&mut self, registry: &mut Registry, id: NodeId, cause: Cause) -> Option<StateChange> {
        self.transition(registry, id, ActivationState::Armed, ActivationState::Dormant, cause)
    }

    /// Move a node to `Locked` from any other state.
    pub fn lock(&mut self, registry: &mut Registry, id: NodeId, cause: Cause) -> Option<StateChange> {
        self.force(registry, id, ActivationState::Locked, cause)
    }

    /// Move a node back to `Dormant` from any other state.
    pub fn reset(&mut self, registry: &mut Registry, id: NodeId, cause: Cause) -> Option<StateChange> {
        self.force(registry, id, ActivationState::Dormant, cause)
    }

    /// Retire nodes that fired in a previous generation.
    ///
    /// One-shot nodes become `Locked`, repeatable nodes `Dormant`.
    /// Returns the changes made, in registration order.
    pub fn settle(&mut self, registry: &mut Registry) -> Vec<StateChange> {
        let fired: Vec<(NodeId, bool)> = registry
            .iter()
            .filter(|n| n.state() == ActivationState::Fired)
            .map(|n| (n.id, n.repeatable))
            .collect();

        fired
            .into_iter()
            .map(|(id, repeatable)| {
                let next = if repeatable {
                    ActivationState::Dormant
                } else {
                    ActivationState::Locked
                };
                registry.set_state(id, next);
                tracing::debug!(node = %id, state = %next, "settled");
                StateChange::new(id, next, Cause::Settle)
            })
            .collect()
    }

    /// Write a counter on behalf of a collaborator. Returns `true` if it changed.
    ///
    /// Counters carry no activation state, so this needs no dispatcher.
    pub fn write_counter(counters: &mut Counters, key: &str, value: i64) -> bool {
        let changed = counters.set(key, value);
        tracing::trace!(key, value, changed, "counter written");
        changed
    }

    fn transition(
        &mut self,
        registry: &mut Registry,
        id: NodeId,
        from: ActivationState,
        to: ActivationState,
        cause: Cause,
    ) -> Option<StateChange> {
        if registry.state_of(id)? != from {
            return None;
        }
        registry.set_state(id, to);
        tracing::trace!(node = %id, from = %from, to = %to, "transition");
        Some(StateChange::new(id, to, cause))
    }

    fn force(
        &mut self,
        registry: &mut Registry,
        id: NodeId,
        to: ActivationState,
        cause: Cause,
    ) -> Option<StateChange> {
        let from = registry.state_of(id)?;
        if from == to {
            return None;
        }
        registry.set_state(id, to);
        tracing::debug!(node = %id, from = %from, to = %to, "forced transition");
        Some(StateChange::new(id, to, cause))
    }

    fn apply(
        &mut self,
        registry: &mut Registry,
        counters: &mut Counters,
        source: NodeId,
        generation: u64,
        effect: &Effect,
        outcome: &mut FireOutcome,
    ) {
        match effect {
            Effect::ModifyCounter { key, delta } => {
                if counters.modify(key.as_str(), *delta) {
                    outcome.note_counter(key);
                }
            }

            Effect::SetCounter { key, value } => {
                if counters.set(key.as_str(), *value) {
                    outcome.note_counter(key);
                }
            }

            Effect::LockNode(target) => {
                if let Some(change) = self.lock(registry, *target, Cause::Effect(source)) {
                    outcome.changes.push(change);
                }
            }

            Effect::ResetNode(target) => {
                if let Some(change) = self.reset(registry, *target, Cause::Effect(source)) {
                    outcome.changes.push(change);
                }
            }

            Effect::Activate(target) => outcome.activations.push(*target),

            Effect::External { kind, key, value } => {
                let Some(handlers) = self.handlers.get_mut(kind) else {
                    tracing::debug!(node = %source, kind = %kind, "no handler for effect");
                    outcome.unhandled += 1;
                    return;
                };

                let mut sink = EffectSink::default();
                for handler in handlers.iter_mut() {
                    let invocation = EffectInvocation {
                        node: source,
                        kind: *kind,
                        key: key.as_str(),
                        value: *value,
                        generation,
                        counters: &*counters,
                    };
                    handler(&invocation, &mut sink);
                }

                for write in sink.writes {
                    let (key, changed) = match write {
                        CounterWrite::Set(key, value) => {
                            let changed = counters.set(key.as_str(), value);
                            (key, changed)
                        }
                        CounterWrite::Modify(key, delta) => {
                            let changed = counters.modify(key.as_str(), delta);
                            (key, changed)
                        }
                    };
                    if changed {
                        outcome.note_counter(&key);
                    }
                }
                outcome.activations.extend(sink.activations);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::registry::EventNode;

    fn setup(nodes: Vec<EventNode>) -> (Registry, Counters, ActionDispatcher) {
        let mut registry = Registry::new();
        for node in nodes {
            registry.register(node).unwrap();
        }
        (registry, Counters::new(), ActionDispatcher::new())
    }

    #[test]
    fn test_fire_transitions_and_reports() {
        let (mut registry, mut counters, mut dispatcher) =
            setup(vec![EventNode::new(NodeId(1), "Lever")]);

        let outcome = dispatcher
            .fire(&mut registry, &mut counters, NodeId(1), 1, "manual".into())
            .unwrap();

        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].state, ActivationState::Fired);
        assert_eq!(registry.state_of(NodeId(1)), Some(ActivationState::Fired));
    }

    #[test]
    fn test_fire_refused_when_locked_or_missing() {
        let (mut registry, mut counters, mut dispatcher) = setup(vec![
            EventNode::new(NodeId(1), "Chest").with_state(ActivationState::Locked),
        ]);

        assert!(dispatcher
            .fire(&mut registry, &mut counters, NodeId(1), 1, "manual".into())
            .is_none());
        assert!(dispatcher
            .fire(&mut registry, &mut counters, NodeId(2), 1, "manual".into())
            .is_none());
    }

    #[test]
    fn test_counter_effects() {
        let (mut registry, mut counters, mut dispatcher) = setup(vec![EventNode::new(NodeId(1), "Slime")
            .with_effect(Effect::modify_counter("kills", 1))
            .with_effect(Effect::set_counter("boss", 0))
            .with_effect(Effect::modify_counter("kills", 1))]);

        let outcome = dispatcher
            .fire(&mut registry, &mut counters, NodeId(1), 1, "manual".into())
            .unwrap();

        assert_eq!(counters.get("kills"), 2);
        // "boss" was already 0, so it did not change
        assert_eq!(outcome.changed_counters, vec!["kills".to_string()]);
    }

    #[test]
    fn test_node_effects() {
        let (mut registry, mut counters, mut dispatcher) = setup(vec![
            EventNode::new(NodeId(1), "Switch")
                .with_effect(Effect::lock(NodeId(2)))
                .with_effect(Effect::reset(NodeId(3)))
                .with_effect(Effect::activate(NodeId(4))),
            EventNode::new(NodeId(2), "Door"),
            EventNode::new(NodeId(3), "Trap").with_state(ActivationState::Armed),
            EventNode::new(NodeId(4), "Alarm"),
        ]);

        let outcome = dispatcher
            .fire(&mut registry, &mut counters, NodeId(1), 1, "manual".into())
            .unwrap();

        assert_eq!(registry.state_of(NodeId(2)), Some(ActivationState::Locked));
        assert_eq!(registry.state_of(NodeId(3)), Some(ActivationState::Dormant));
        assert_eq!(outcome.changes.len(), 3);
        assert_eq!(outcome.changes[1].cause, Cause::Effect(NodeId(1)));
        assert_eq!(outcome.activations, vec![NodeId(4)]);
    }

    #[test]
    fn test_external_handlers_in_order() {
        let (mut registry, mut counters, mut dispatcher) = setup(vec![
            EventNode::new(NodeId(1), "Reward").with_effect(Effect::gold(25)),
        ]);

        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            dispatcher.register_handler(
                EffectKind::Economy,
                move |inv, sink| {
                    log.borrow_mut().push((tag, inv.key.to_string(), inv.value));
                    sink.modify_counter("gold", inv.value);
                },
            );
        }
        assert_eq!(dispatcher.handler_count(EffectKind::Economy), 2);

        let outcome = dispatcher
            .fire(&mut registry, &mut counters, NodeId(1), 1, "manual".into())
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![("first", "gold".to_string(), 25), ("second", "gold".to_string(), 25)]
        );
        assert_eq!(counters.get("gold"), 50);
        assert_eq!(outcome.changed_counters, vec!["gold".to_string()]);
    }

    #[test]
    fn test_unhandled_external_is_skipped() {
        let (mut registry, mut counters, mut dispatcher) = setup(vec![
            EventNode::new(NodeId(1), "Mirror").with_effect(Effect::external(EffectKind::ReflectDamage, "mirror", 1)),
        ]);

        let outcome = dispatcher
            .fire(&mut registry, &mut counters, NodeId(1), 1, "manual".into())
            .unwrap();

        assert_eq!(outcome.unhandled, 1);
        assert_eq!(registry.state_of(NodeId(1)), Some(ActivationState::Fired));
    }

    #[test]
    fn test_arm_and_disarm() {
        let (mut registry, _, mut dispatcher) = setup(vec![EventNode::new(NodeId(1), "Plate")]);

        assert!(dispatcher.disarm(&mut registry, NodeId(1), "test".into()).is_none());
        assert!(dispatcher.arm(&mut registry, NodeId(1), "test".into()).is_some());
        assert!(dispatcher.arm(&mut registry, NodeId(1), "test".into()).is_none());
        assert_eq!(registry.state_of(NodeId(1)), Some(ActivationState::Armed));
        assert!(dispatcher.disarm(&mut registry, NodeId(1), "test".into()).is_some());
        assert_eq!(registry.state_of(NodeId(1)), Some(ActivationState::Dormant));
    }

    #[test]
    fn test_settle() {
        let (mut registry, _, mut dispatcher) = setup(vec![
            EventNode::new(NodeId(1), "Once").with_state(ActivationState::Fired),
            EventNode::new(NodeId(2), "Again").repeatable().with_state(ActivationState::Fired),
            EventNode::new(NodeId(3), "Idle"),
        ]);

        let changes = dispatcher.settle(&mut registry);
        assert_eq!(
            changes,
            vec![
                StateChange::new(NodeId(1), ActivationState::Locked, Cause::Settle),
                StateChange::new(NodeId(2), ActivationState::Dormant, Cause::Settle),
            ]
        );
        assert_eq!(registry.state_of(NodeId(1)), Some(ActivationState::Locked));
        assert_eq!(registry.state_of(NodeId(2)), Some(ActivationState::Dormant));
        assert_eq!(registry.state_of(NodeId(3)), Some(ActivationState::Dormant));
        assert!(dispatcher.settle(&mut registry).is_empty());
    }

    #[test]
    fn test_write_counter_reports_change() {
        let mut counters = Counters::new();
        assert!(ActionDispatcher::write_counter(&mut counters, "gold", 5));
        assert!(!ActionDispatcher::write_counter(&mut counters, "gold", 5));
        assert!(!ActionDispatcher::write_counter(&mut counters, "gems", 0));
        assert_eq!(counters.get("gold"), 5);
    }
}
