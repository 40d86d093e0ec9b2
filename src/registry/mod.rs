//! Event node registry.
//!
//! Holds the authoritative set of [`EventNode`]s and answers dependency
//! queries. Link edges are never stored: a node depends on whatever its
//! conditions mention, and the registry derives the reverse edges on
//! demand.
//!
//! ## Example Usage
//!
//! ```
//! use event_links::conditions::TriggerCondition;
//! use event_links::core::NodeId;
//! use event_links::registry::{EventNode, Registry};
//!
//! const LEVER: NodeId = NodeId::new(1);
//! const DOOR: NodeId = NodeId::new(2);
//!
//! let mut registry = Registry::new();
//! registry.register(EventNode::new(LEVER, "Lever")).unwrap();
//! registry
//!     .register(EventNode::new(DOOR, "Door").with_condition(TriggerCondition::fired(LEVER)))
//!     .unwrap();
//!
//! assert_eq!(registry.dependents_of(LEVER), &[DOOR]);
//! assert!(registry.register(EventNode::new(LEVER, "Again")).is_err());
//! ```

mod node;
#[allow(clippy::module_inception)]
mod registry;

pub use node::EventNode;
pub use registry::Registry;
