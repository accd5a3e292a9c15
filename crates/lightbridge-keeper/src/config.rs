use crate::error::{KeeperError, Result};
use serde::{Deserialize, Serialize};

/// Keeper tuning. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// Verify-then-swap attempts per update before giving up on contention.
    pub max_update_attempts: u32,
    /// Relayer-submitted headers kept per chain.
    pub header_cache_capacity: usize,
    /// Consensus states kept per chain. The lowest heights go first.
    /// Applied by [`InMemoryStore::from_config`](crate::InMemoryStore::from_config).
    pub consensus_history_limit: usize,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 3,
            header_cache_capacity: 1024,
            consensus_history_limit: 256,
        }
    }
}

impl KeeperConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| KeeperError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let zero = |field: &str| KeeperError::InvalidConfig {
            reason: format!("{} must be at least 1", field),
        };
        if self.max_update_attempts == 0 {
            return Err(zero("max_update_attempts"));
        }
        if self.header_cache_capacity == 0 {
            return Err(zero("header_cache_capacity"));
        }
        if self.consensus_history_limit == 0 {
            return Err(zero("consensus_history_limit"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        assert_eq!(KeeperConfig::from_json_str("{}").unwrap(), KeeperConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = KeeperConfig::from_json_str(r#"{"max_update_attempts": 5}"#).unwrap();
        assert_eq!(config.max_update_attempts, 5);
        assert_eq!(config.header_cache_capacity, 1024);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            KeeperConfig::from_json_str(r#"{"max_update_attempts": 0}"#),
            Err(KeeperError::InvalidConfig { .. })
        ));
        assert!(matches!(
            KeeperConfig::from_json_str("not json"),
            Err(KeeperError::InvalidConfig { .. })
        ));
    }
}
