//! The linker facade.
//!
//! [`EventLinker`] owns the registry, counters, dispatcher and engine,
//! and is the only thing a host or collaborator needs to hold. One
//! instance per game session; the host creates it at initialization and
//! drops it at teardown.
//!
//! ## Example Usage
//!
//! ```
//! use event_links::{ActivationState, EventLinker, EventNode, NodeId, TriggerCondition};
//!
//! const A: NodeId = NodeId::new(1);
//! const B: NodeId = NodeId::new(2);
//! const C: NodeId = NodeId::new(3);
//!
//! let mut linker = EventLinker::default();
//! linker.register(EventNode::new(A, "Lever")).unwrap();
//! linker.register(EventNode::new(B, "Gate").with_condition(TriggerCondition::fired(A))).unwrap();
//! linker.register(EventNode::new(C, "Bridge").with_condition(TriggerCondition::fired(B))).unwrap();
//!
//! let result = linker.report_state_change(A, "manual").unwrap();
//! assert_eq!(
//!     result.pairs(),
//!     vec![
//!         (A, ActivationState::Fired),
//!         (B, ActivationState::Fired),
//!         (C, ActivationState::Fired),
//!     ]
//! );
//! ```

mod saved;

pub use saved::SavedState;

use crate::core::{Counters, LinkConfig, LinkError, LinkResult, NodeId};
use crate::effects::{ActionDispatcher, EffectInvocation, EffectKind, EffectSink};
use crate::propagation::{Cause, Origin, PassContext, PropagationEngine, PropagationResult};
use crate::registry::{EventNode, Registry};

/// Event linking and triggering core.
#[derive(Debug, Default)]
pub struct EventLinker {
    registry: Registry,
    counters: Counters,
    dispatcher: ActionDispatcher,
    engine: PropagationEngine,
}

impl EventLinker {
    /// Create a linker with the given configuration.
    pub fn new(config: LinkConfig) -> Self {
        Self {
            registry: Registry::new(),
            counters: Counters::new(),
            dispatcher: ActionDispatcher::new(),
            engine: PropagationEngine::new(config),
        }
    }

    /// Create a linker and restore host-saved state into it.
    ///
    /// Nodes must be registered before states can be restored, so this
    /// takes the node definitions too.
    pub fn with_saved_state(
        config: LinkConfig,
        nodes: impl IntoIterator<Item = EventNode>,
        saved: SavedState,
    ) -> LinkResult<Self> {
        let mut linker = Self::new(config);
        for node in nodes {
            linker.register(node)?;
        }
        linker.restore(saved);
        Ok(linker)
    }

    // === Registry ===

    /// Register a node.
    pub fn register(&mut self, node: EventNode) -> LinkResult<NodeId> {
        let id = self.registry.register(node)?;
        tracing::debug!(node = %id, "registered");
        Ok(id)
    }

    /// Unregister a node. Nodes that read it will see it as never firing.
    pub fn unregister(&mut self, id: NodeId) -> LinkResult<EventNode> {
        let node = self.registry.unregister(id)?;
        tracing::debug!(node = %id, "unregistered");
        Ok(node)
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> LinkResult<&EventNode> {
        self.registry.get(id)
    }

    /// Read-only access to the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // === Counters ===

    /// Current value of a counter.
    #[must_use]
    pub fn counter(&self, key: &str) -> i64 {
        self.counters.get(key)
    }

    /// Snapshot of all counters. O(1).
    #[must_use]
    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }

    // === Collaborator interface ===

    /// Subscribe to external effects of one kind.
    ///
    /// Handlers run synchronously while propagation applies effects.
    pub fn register_effect_handler<F>(&mut self, kind: EffectKind, handler: F)
    where
        F: FnMut(&EffectInvocation<'_>, &mut EffectSink) + 'static,
    {
        self.dispatcher.register_handler(kind, handler);
    }

    /// Report that a node changed: fire it and propagate.
    ///
    /// Fails with [`LinkError::NotFound`] if the node is not registered.
    /// A registered node that cannot fire (already locked, for example)
    /// yields an empty result.
    pub fn report_state_change(
        &mut self,
        id: NodeId,
        cause: impl Into<Cause>,
    ) -> LinkResult<PropagationResult> {
        if !self.registry.contains(id) {
            return Err(LinkError::NotFound(id));
        }
        let cause = cause.into();
        tracing::debug!(node = %id, cause = %cause, "state change reported");
        Ok(self.run(Origin::Node { id, cause }))
    }

    /// Set a counter and propagate to every node that reads it.
    pub fn report_counter_change(&mut self, key: impl Into<String>, value: i64) -> PropagationResult {
        let key = key.into();
        tracing::debug!(key = %key, value, "counter change reported");
        self.run(Origin::Counter { key, value })
    }

    /// Generation of the most recent pass.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.engine.generation()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        self.engine.config()
    }

    // === Host persistence ===

    /// Capture node states and counters for the host to save.
    #[must_use]
    pub fn save_state(&self) -> SavedState {
        SavedState {
            nodes: self.registry.states(),
            counters: self.counters.clone(),
            generation: self.engine.generation(),
        }
    }

    /// Restore host-saved state. Call after registering nodes.
    pub fn restore(&mut self, saved: SavedState) {
        tracing::debug!(
            nodes = saved.nodes.len(),
            counters = saved.counters.len(),
            generation = saved.generation,
            "restoring saved state"
        );
        self.registry.restore_states(saved.nodes);
        self.counters = saved.counters;
        self.engine.set_generation(saved.generation);
    }

    fn run(&mut self, origin: Origin) -> PropagationResult {
        let ctx = PassContext {
            registry: &mut self.registry,
            counters: &mut self.counters,
            dispatcher: &mut self.dispatcher,
        };
        self.engine.run(ctx, origin)
    }
}
