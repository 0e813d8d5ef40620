//! # Algorithm Registry
//!
//! Named algorithm instances handed to the engine at construction. Built-in
//! types are created from configuration; custom implementations can be
//! registered directly.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::inline::InlineShardingAlgorithm;
use super::key_generators::{SnowflakeKeyGenerator, UuidKeyGenerator};
use super::modulo::{HashModShardingAlgorithm, ModShardingAlgorithm};
use crate::domain::{canonical, AlgorithmConfig, RuleResult, ShardingRuleConfig, ShardingRuleError};
use crate::ports::{KeyGenerateAlgorithm, ShardingAlgorithm};

/// Key generator used when a table names none and no default is configured.
pub const DEFAULT_KEY_GENERATOR_TYPE: &str = "SNOWFLAKE";

/// Registry of sharding algorithms, key generators and auditors.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    sharding: HashMap<String, Arc<dyn ShardingAlgorithm>>,
    key_generators: HashMap<String, Arc<dyn KeyGenerateAlgorithm>>,
    auditors: HashMap<String, AlgorithmConfig>,
    worker_id: u32,
}

impl AlgorithmRegistry {
    /// Empty registry whose generated defaults use `worker_id`.
    pub fn new(worker_id: u32) -> Self {
        Self {
            worker_id,
            ..Self::default()
        }
    }

    /// Instantiate every algorithm declared in `config`.
    pub fn from_config(config: &ShardingRuleConfig) -> RuleResult<Self> {
        let mut registry = Self::new(config.worker_id);
        for (name, algorithm) in &config.sharding_algorithms {
            let instance = create_sharding_algorithm(name, algorithm)?;
            registry.register_sharding(name, instance);
        }
        for (name, algorithm) in &config.key_generators {
            let instance = create_key_generator(name, algorithm, config.worker_id)?;
            registry.register_key_generator(name, instance);
        }
        for (name, algorithm) in &config.auditors {
            registry.register_auditor(name, algorithm.clone());
        }
        debug!(
            "[sharding] registry: {} sharding algorithms, {} key generators, {} auditors",
            registry.sharding.len(),
            registry.key_generators.len(),
            registry.auditors.len()
        );
        Ok(registry)
    }

    /// Register (or replace) a sharding algorithm.
    pub fn register_sharding(&mut self, name: &str, algorithm: Arc<dyn ShardingAlgorithm>) {
        self.sharding.insert(canonical(name), algorithm);
    }

    /// Register (or replace) a key generator.
    pub fn register_key_generator(&mut self, name: &str, generator: Arc<dyn KeyGenerateAlgorithm>) {
        self.key_generators.insert(canonical(name), generator);
    }

    /// Register (or replace) an auditor. Auditors are only referenced by name.
    pub fn register_auditor(&mut self, name: &str, auditor: AlgorithmConfig) {
        self.auditors.insert(canonical(name), auditor);
    }

    /// Sharding algorithm named `name`.
    pub fn sharding_algorithm(&self, name: &str) -> Option<&Arc<dyn ShardingAlgorithm>> {
        self.sharding.get(&canonical(name))
    }

    /// Key generator named `name`.
    pub fn key_generator(&self, name: &str) -> Option<&Arc<dyn KeyGenerateAlgorithm>> {
        self.key_generators.get(&canonical(name))
    }

    /// Whether an auditor named `name` is registered.
    pub fn has_auditor(&self, name: &str) -> bool {
        self.auditors.contains_key(&canonical(name))
    }

    /// Worker id handed to generated defaults.
    pub fn worker_id(&self) -> u32 {
        self.worker_id
    }

    /// Fresh instance of the default key generator.
    pub fn default_key_generator(&self) -> RuleResult<Arc<dyn KeyGenerateAlgorithm>> {
        Ok(Arc::new(SnowflakeKeyGenerator::new(self.worker_id)?))
    }
}

/// Instantiate a built-in sharding algorithm.
pub fn create_sharding_algorithm(
    name: &str,
    config: &AlgorithmConfig,
) -> RuleResult<Arc<dyn ShardingAlgorithm>> {
    let algorithm: Arc<dyn ShardingAlgorithm> =
        match config.type_name.trim().to_ascii_uppercase().as_str() {
            "INLINE" => Arc::new(InlineShardingAlgorithm::from_config(name, config)?),
            "MOD" => Arc::new(ModShardingAlgorithm::from_config(name, config)?),
            "HASH_MOD" => Arc::new(HashModShardingAlgorithm::from_config(name, config)?),
            _ => {
                return Err(ShardingRuleError::UnknownAlgorithmType {
                    name: name.to_string(),
                    type_name: config.type_name.clone(),
                })
            }
        };
    Ok(algorithm)
}

/// Instantiate a built-in key generator.
pub fn create_key_generator(
    name: &str,
    config: &AlgorithmConfig,
    worker_id: u32,
) -> RuleResult<Arc<dyn KeyGenerateAlgorithm>> {
    let generator: Arc<dyn KeyGenerateAlgorithm> =
        match config.type_name.trim().to_ascii_uppercase().as_str() {
            "UUID" => Arc::new(UuidKeyGenerator),
            "SNOWFLAKE" => Arc::new(SnowflakeKeyGenerator::new(worker_id)?),
            _ => {
                return Err(ShardingRuleError::UnknownAlgorithmType {
                    name: name.to_string(),
                    type_name: config.type_name.clone(),
                })
            }
        };
    Ok(generator)
}
