//! Event node registry.
//!
//! The registry is the authoritative store of event nodes. Besides plain
//! lookup it answers dependency queries ("who reads this node?") from a
//! dependency index that is built lazily and thrown away whenever the
//! node set changes.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{ActivationState, LinkError, LinkResult, NodeId};

use super::node::EventNode;

/// Dependents list. Most events are read by only a handful of others.
type Dependents = SmallVec<[NodeId; 4]>;

/// Reverse dependency edges, each list sorted by registration order.
#[derive(Clone, Debug, Default)]
struct DependencyIndex {
    by_node: FxHashMap<NodeId, Dependents>,
    by_counter: FxHashMap<String, Dependents>,
}

#[derive(Clone, Debug)]
struct Entry {
    node: EventNode,
    seq: u64,
}

/// Registry for event nodes.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    /// All registered nodes.
    nodes: FxHashMap<NodeId, Entry>,

    /// Registration order. Sequence numbers are never reused.
    by_seq: BTreeMap<u64, NodeId>,

    /// Next sequence number to allocate.
    next_seq: u64,

    /// Lazily built reverse edges.
    index: OnceCell<DependencyIndex>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node.
    ///
    /// Fails with [`LinkError::DuplicateId`] if the ID is taken; the
    /// registry is left untouched in that case.
    pub fn register(&mut self, node: EventNode) -> LinkResult<NodeId> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(LinkError::DuplicateId(id));
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.by_seq.insert(seq, id);
        self.nodes.insert(id, Entry { node, seq });
        self.index.take();
        Ok(id)
    }

    /// Unregister a node.
    ///
    /// Nodes that depend on it keep their references, which from now on
    /// evaluate to `false`.
    pub fn unregister(&mut self, id: NodeId) -> LinkResult<EventNode> {
        let entry = self.nodes.remove(&id).ok_or(LinkError::NotFound(id))?;
        self.by_seq.remove(&entry.seq);
        self.index.take();
        Ok(entry.node)
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> LinkResult<&EventNode> {
        self.nodes
            .get(&id)
            .map(|e| &e.node)
            .ok_or(LinkError::NotFound(id))
    }

    /// Check if a node is registered.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Current state of a node, `None` if it is not registered.
    #[must_use]
    pub fn state_of(&self, id: NodeId) -> Option<ActivationState> {
        self.nodes.get(&id).map(|e| e.node.state)
    }

    /// Registration sequence number of a node.
    #[must_use]
    pub fn registration_order(&self, id: NodeId) -> Option<u64> {
        self.nodes.get(&id).map(|e| e.seq)
    }

    /// Nodes whose conditions reference `id`, in registration order.
    pub fn dependents_of(&self, id: NodeId) -> &[NodeId] {
        self.index()
            .by_node
            .get(&id)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes whose conditions reference counter `key`, in registration order.
    pub fn counter_dependents(&self, key: &str) -> &[NodeId] {
        self.index()
            .by_counter
            .get(key)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Restore saved states at initialization.
    ///
    /// Unknown IDs are skipped: the host may have saved events that this
    /// session no longer registers.
    pub fn restore_states<I>(&mut self, states: I)
    where
        I: IntoIterator<Item = (NodeId, ActivationState)>,
    {
        for (id, state) in states {
            match self.nodes.get_mut(&id) {
                Some(entry) => entry.node.state = state,
                None => tracing::warn!(node = %id, "skipping saved state for unregistered node"),
            }
        }
    }

    /// Current states as plain key-value pairs, in registration order.
    pub fn states(&self) -> Vec<(NodeId, ActivationState)> {
        self.iter().map(|node| (node.id, node.state)).collect()
    }

    /// Get total node count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EventNode> {
        self.by_seq.values().map(|id| &self.nodes[id].node)
    }

    /// Set a node's state, returning the previous one.
    ///
    /// Only the action dispatcher calls this.
    pub(crate) fn set_state(&mut self, id: NodeId, state: ActivationState) -> Option<ActivationState> {
        self.nodes
            .get_mut(&id)
            .map(|e| std::mem::replace(&mut e.node.state, state))
    }

    fn index(&self) -> &DependencyIndex {
        self.index.get_or_init(|| self.build_index())
    }

    fn build_index(&self) -> DependencyIndex {
        let mut index = DependencyIndex::default();

        // Walking in registration order keeps every list sorted.
        for node in self.iter() {
            for target in node.dependencies() {
                push_unique(index.by_node.entry(target).or_default(), node.id);
            }
            for condition in &node.conditions {
                for key in condition.referenced_counters() {
                    push_unique(index.by_counter.entry(key.to_string()).or_default(), node.id);
                }
            }
        }

        tracing::trace!(
            nodes = self.nodes.len(),
            edges = index.by_node.values().map(|l| l.len()).sum::<usize>(),
            "rebuilt dependency index"
        );
        index
    }
}

fn push_unique(list: &mut Dependents, id: NodeId) {
    if list.last() != Some(&id) {
        list.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::TriggerCondition;

    fn node(id: u32) -> EventNode {
        EventNode::new(NodeId(id), format!("Event{id}"))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = Registry::new();
        let id = registry.register(node(1)).unwrap();

        assert_eq!(id, NodeId(1));
        assert_eq!(registry.get(id).unwrap().name, "Event1");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));
    }

    #[test]
    fn test_duplicate_leaves_registry_unchanged() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();

        let err = registry
            .register(EventNode::new(NodeId(1), "Impostor"))
            .unwrap_err();

        assert!(matches!(err, LinkError::DuplicateId(NodeId(1))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(NodeId(1)).unwrap().name, "Event1");
        assert_eq!(registry.registration_order(NodeId(1)), Some(0));
    }

    #[test]
    fn test_get_missing() {
        let registry = Registry::new();
        assert!(matches!(registry.get(NodeId(5)), Err(LinkError::NotFound(NodeId(5)))));
        assert_eq!(registry.state_of(NodeId(5)), None);
    }

    #[test]
    fn test_unregister() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();

        let removed = registry.unregister(NodeId(1)).unwrap();
        assert_eq!(removed.id, NodeId(1));
        assert!(registry.is_empty());
        assert!(matches!(registry.unregister(NodeId(1)), Err(LinkError::NotFound(_))));
    }

    #[test]
    fn test_iter_registration_order() {
        let mut registry = Registry::new();
        for id in [30, 10, 20] {
            registry.register(node(id)).unwrap();
        }

        let ids: Vec<_> = registry.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(30), NodeId(10), NodeId(20)]);
    }

    #[test]
    fn test_sequence_not_reused() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();
        registry.unregister(NodeId(1)).unwrap();
        registry.register(node(1)).unwrap();

        assert_eq!(registry.registration_order(NodeId(1)), Some(1));
    }

    #[test]
    fn test_dependents_sorted_by_registration() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();
        registry
            .register(node(9).with_condition(TriggerCondition::fired(NodeId(1))))
            .unwrap();
        registry
            .register(node(2).with_condition(TriggerCondition::fired(NodeId(1))))
            .unwrap();

        assert_eq!(registry.dependents_of(NodeId(1)), &[NodeId(9), NodeId(2)]);
        assert!(registry.dependents_of(NodeId(9)).is_empty());
    }

    #[test]
    fn test_dependents_listed_once() {
        let mut registry = Registry::new();
        registry
            .register(
                node(2)
                    .with_condition(TriggerCondition::fired(NodeId(1)))
                    .with_condition(TriggerCondition::has_fired(NodeId(1))),
            )
            .unwrap();

        assert_eq!(registry.dependents_of(NodeId(1)), &[NodeId(2)]);
    }

    #[test]
    fn test_dependents_from_interleaved_references() {
        let mut registry = Registry::new();
        registry
            .register(
                node(3)
                    .with_condition(TriggerCondition::fired(NodeId(1)))
                    .with_condition(TriggerCondition::any([
                        TriggerCondition::fired(NodeId(2)),
                        TriggerCondition::has_fired(NodeId(1)),
                    ])),
            )
            .unwrap();
        registry
            .register(node(4).with_condition(TriggerCondition::fired(NodeId(2))))
            .unwrap();

        assert_eq!(registry.dependents_of(NodeId(1)), &[NodeId(3)]);
        assert_eq!(registry.dependents_of(NodeId(2)), &[NodeId(3), NodeId(4)]);
    }

    #[test]
    fn test_index_invalidated_on_change() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();
        assert!(registry.dependents_of(NodeId(1)).is_empty());

        registry
            .register(node(2).with_condition(TriggerCondition::fired(NodeId(1))))
            .unwrap();
        assert_eq!(registry.dependents_of(NodeId(1)), &[NodeId(2)]);

        registry.unregister(NodeId(2)).unwrap();
        assert!(registry.dependents_of(NodeId(1)).is_empty());
    }

    #[test]
    fn test_stale_reference_kept_in_index() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();
        registry
            .register(node(2).with_condition(TriggerCondition::fired(NodeId(1))))
            .unwrap();

        registry.unregister(NodeId(1)).unwrap();

        // Node 2 still reads node 1; it just never sees it fire.
        assert_eq!(registry.dependents_of(NodeId(1)), &[NodeId(2)]);
    }

    #[test]
    fn test_counter_dependents() {
        let mut registry = Registry::new();
        registry
            .register(node(1).with_condition(TriggerCondition::counter_at_least("gold", 100)))
            .unwrap();
        registry
            .register(node(2).with_condition(TriggerCondition::any([
                TriggerCondition::counter_at_least("gold", 10),
                TriggerCondition::counter_at_least("gems", 1),
            ])))
            .unwrap();

        assert_eq!(registry.counter_dependents("gold"), &[NodeId(1), NodeId(2)]);
        assert_eq!(registry.counter_dependents("gems"), &[NodeId(2)]);
        assert!(registry.counter_dependents("kills").is_empty());
    }

    #[test]
    fn test_restore_states() {
        let mut registry = Registry::new();
        registry.register(node(1)).unwrap();
        registry.register(node(2)).unwrap();

        registry.restore_states([
            (NodeId(1), ActivationState::Locked),
            (NodeId(77), ActivationState::Fired),
        ]);

        assert_eq!(
            registry.states(),
            vec![(NodeId(1), ActivationState::Locked), (NodeId(2), ActivationState::Dormant)]
        );
    }
}
