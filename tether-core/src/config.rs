//! Driver configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keep-alive and blocking policy for the companion link
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Quiet time before an idle `{}` probe is sent (ms)
    pub probe_interval_ms: u32,
    /// While traffic is flowing, the next probe becomes eligible this
    /// many ms after the last processed byte instead of a full interval
    pub probe_grace_ms: u32,
    /// Allow [`block`](crate::Tether::block) to delegate to `wait_for`
    pub auto_block: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: 1000,
            probe_grace_ms: 25,
            auto_block: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.probe_interval_ms, 1000);
        assert_eq!(config.probe_grace_ms, 25);
        assert!(config.auto_block);
    }
}
