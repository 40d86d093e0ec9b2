//! Event node identification.
//!
//! Every linkable map event has a unique `NodeId`. The engine never
//! interprets the value; hosts usually derive it from their own event
//! numbering (for example `map_id * 1000 + event_id`).
//!
//! ```
//! use event_links::core::NodeId;
//!
//! let door = NodeId::new(12);
//! assert_eq!(door.raw(), 12);
//! assert_eq!(format!("{}", door), "Node(12)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for an event node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Build an ID from a map-local event number.
    ///
    /// Packs the map in the high 16 bits and the event in the low 16 bits,
    /// so events on different maps never collide.
    ///
    /// ```
    /// use event_links::core::NodeId;
    ///
    /// let id = NodeId::on_map(3, 7);
    /// assert_eq!(id.map(), 3);
    /// assert_eq!(id.event(), 7);
    /// ```
    #[must_use]
    pub const fn on_map(map: u16, event: u16) -> Self {
        Self(((map as u32) << 16) | event as u32)
    }

    /// Map number packed by [`NodeId::on_map`].
    #[must_use]
    pub const fn map(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Event number packed by [`NodeId::on_map`].
    #[must_use]
    pub const fn event(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.0)
    }
}
