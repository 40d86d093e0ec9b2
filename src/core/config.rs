//! Engine configuration.
//!
//! Hosts configure the linker at startup with a `LinkConfig`. The
//! defaults match the usual map-event behavior: partially satisfied
//! events show as armed, and fired events retire at the start of the
//! next top-level trigger.

use serde::{Deserialize, Serialize};

/// Configuration for an [`EventLinker`](crate::EventLinker).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Move candidates with some (not all) conditions met to `Armed`.
    pub arm_on_partial: bool,

    /// At the start of each generation, retire `Fired` nodes:
    /// one-shot nodes become `Locked`, repeatable nodes `Dormant`.
    pub settle_between_generations: bool,

    /// Maximum number of breadth levels per pass. `None` for unlimited.
    ///
    /// Passes always terminate without it; this only bounds how far a
    /// single report can reach.
    pub max_depth: Option<usize>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            arm_on_partial: true,
            settle_between_generations: true,
            max_depth: None,
        }
    }
}

impl LinkConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable arming on partial satisfaction.
    #[must_use]
    pub fn with_arming(mut self, enabled: bool) -> Self {
        self.arm_on_partial = enabled;
        self
    }

    /// Enable or disable settling between generations.
    #[must_use]
    pub fn with_settling(mut self, enabled: bool) -> Self {
        self.settle_between_generations = enabled;
        self
    }

    /// Limit the number of breadth levels per pass.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert!(config.arm_on_partial);
        assert!(config.settle_between_generations);
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_builder() {
        let config = LinkConfig::new()
            .with_arming(false)
            .with_settling(false)
            .with_max_depth(4);

        assert!(!config.arm_on_partial);
        assert!(!config.settle_between_generations);
        assert_eq!(config.max_depth, Some(4));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LinkConfig = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert!(config.arm_on_partial);
        assert!(config.settle_between_generations);
        assert_eq!(config.max_depth, Some(8));
    }
}
