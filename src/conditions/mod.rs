//! Trigger conditions and their evaluation.
//!
//! Conditions link event nodes together: a node whose condition mentions
//! another node (or a counter) depends on it, and is re-evaluated when it
//! changes.
//!
//! ## Key Components
//!
//! - [`TriggerCondition`]: State-equals, counter-threshold and composite predicates
//! - [`Snapshot`]: Read-only view of node states and counters
//! - [`ConditionEvaluator`]: Pure evaluation, tolerant of missing nodes
//!
//! ## Example Usage
//!
//! ```
//! use event_links::conditions::{ConditionEvaluator, Snapshot, TriggerCondition};
//! use event_links::core::{Counters, NodeId};
//! use event_links::registry::Registry;
//!
//! let registry = Registry::new();
//! let counters: Counters = [("gold", 120)].into_iter().collect();
//! let snapshot = Snapshot::new(&registry, &counters);
//!
//! // Enough gold, but the merchant event was never registered
//! let condition = TriggerCondition::counter_at_least("gold", 100)
//!     .and(TriggerCondition::fired(NodeId::new(7)));
//!
//! assert!(!ConditionEvaluator::evaluate(&condition, &snapshot));
//! ```

mod condition;
mod evaluator;

pub use condition::{Comparison, TriggerCondition};
pub use evaluator::{ConditionEvaluator, Readiness, Snapshot};
