//! Modulo-based auto sharding algorithms.
//!
//! Both decide the physical layout through `sharding-count`.

use crate::domain::{AlgorithmConfig, RuleResult, ShardingRuleError};
use crate::ports::{AutoShardingAlgorithm, ShardingAlgorithm};

/// Property holding the number of shards.
pub const SHARDING_COUNT_KEY: &str = "sharding-count";

fn sharding_count(name: &str, config: &AlgorithmConfig) -> RuleResult<usize> {
    config
        .prop_u64(SHARDING_COUNT_KEY)
        .filter(|count| *count > 0)
        .map(|count| count as usize)
        .ok_or_else(|| ShardingRuleError::AlgorithmInitialization {
            algorithm: name.to_string(),
            logic_table: "-".to_string(),
            reason: format!("`{}` must be a positive integer", SHARDING_COUNT_KEY),
        })
}

/// `value % sharding-count`
#[derive(Debug, Clone)]
pub struct ModShardingAlgorithm {
    sharding_count: usize,
}

impl ModShardingAlgorithm {
    /// Create with a shard count.
    pub fn new(sharding_count: usize) -> Self {
        Self { sharding_count }
    }

    /// Create from configuration properties.
    pub fn from_config(name: &str, config: &AlgorithmConfig) -> RuleResult<Self> {
        Ok(Self::new(sharding_count(name, config)?))
    }
}

impl ShardingAlgorithm for ModShardingAlgorithm {
    fn type_name(&self) -> &str {
        "MOD"
    }

    fn algorithm_structure(&self, _naming_prefix: &str, _sharding_column: &str) -> Option<String> {
        Some(format!("mod:{}", self.sharding_count))
    }

    fn as_auto(&self) -> Option<&dyn AutoShardingAlgorithm> {
        Some(self)
    }
}

impl AutoShardingAlgorithm for ModShardingAlgorithm {
    fn sharding_count(&self) -> usize {
        self.sharding_count
    }
}

/// `hash(value) % sharding-count`
#[derive(Debug, Clone)]
pub struct HashModShardingAlgorithm {
    sharding_count: usize,
}

impl HashModShardingAlgorithm {
    /// Create with a shard count.
    pub fn new(sharding_count: usize) -> Self {
        Self { sharding_count }
    }

    /// Create from configuration properties.
    pub fn from_config(name: &str, config: &AlgorithmConfig) -> RuleResult<Self> {
        Ok(Self::new(sharding_count(name, config)?))
    }
}

impl ShardingAlgorithm for HashModShardingAlgorithm {
    fn type_name(&self) -> &str {
        "HASH_MOD"
    }

    fn algorithm_structure(&self, _naming_prefix: &str, _sharding_column: &str) -> Option<String> {
        Some(format!("hash_mod:{}", self.sharding_count))
    }

    fn as_auto(&self) -> Option<&dyn AutoShardingAlgorithm> {
        Some(self)
    }
}

impl AutoShardingAlgorithm for HashModShardingAlgorithm {
    fn sharding_count(&self) -> usize {
        self.sharding_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_is_auto() {
        let algorithm = ModShardingAlgorithm::new(4);
        assert_eq!(algorithm.as_auto().map(|a| a.sharding_count()), Some(4));
        assert_eq!(algorithm.algorithm_structure("t_", "id").as_deref(), Some("mod:4"));
    }

    #[test]
    fn test_mod_and_hash_mod_structures_differ() {
        let a = ModShardingAlgorithm::new(4);
        let b = HashModShardingAlgorithm::new(4);
        assert_ne!(a.algorithm_structure("", ""), b.algorithm_structure("", ""));
    }

    #[test]
    fn test_sharding_count_required() {
        let missing = AlgorithmConfig::new("MOD");
        assert!(ModShardingAlgorithm::from_config("m", &missing).is_err());

        let zero = AlgorithmConfig::new("MOD").with_prop(SHARDING_COUNT_KEY, 0);
        assert!(HashModShardingAlgorithm::from_config("m", &zero).is_err());

        let ok = AlgorithmConfig::new("MOD").with_prop(SHARDING_COUNT_KEY, "8");
        assert_eq!(ModShardingAlgorithm::from_config("m", &ok).unwrap().sharding_count(), 8);
    }
}
