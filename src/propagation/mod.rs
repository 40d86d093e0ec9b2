//! Propagation of state changes through the link graph.
//!
//! When a node fires, every node that reads it is re-evaluated; those
//! that become ready fire in turn. Traversal is breadth-first, ties
//! within a level go to the node registered first, and a node fires at
//! most once per generation, so mutually dependent events settle in a
//! single pass.
//!
//! ## Key Components
//!
//! - [`PropagationEngine`]: Runs passes and counts generations
//! - [`PropagationTask`]: A queued re-evaluation
//! - [`PropagationResult`]: Ordered state changes of one pass

mod engine;
mod result;

pub use engine::{Origin, PassContext, PropagationEngine, PropagationTask, TaskSource};
pub use result::{Cause, PropagationResult, StateChange};
