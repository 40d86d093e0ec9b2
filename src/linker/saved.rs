//! Plain key-value state handed to and from the host.
//!
//! The host owns its save files. This is only the shape of what the
//! linker needs back at initialization; `to_bytes` / `from_bytes` exist
//! for hosts that would rather store one opaque blob.

use serde::{Deserialize, Serialize};

use crate::core::{ActivationState, Counters, LinkResult, NodeId};

/// Node states, counters and the generation counter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    /// Node states in registration order.
    pub nodes: Vec<(NodeId, ActivationState)>,
    /// Global counters.
    pub counters: Counters,
    /// Last generation that ran.
    pub generation: u64,
}

impl SavedState {
    /// Encode as bytes.
    pub fn to_bytes(&self) -> LinkResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bytes produced by [`SavedState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> LinkResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
