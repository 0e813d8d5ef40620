//! Engine publication.
//!
//! Readers take a cheap `Arc` snapshot of the current engine; a writer
//! builds the next generation off to the side and swaps it in only when the
//! build succeeded.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use super::rule_engine::RuleEngine;
use crate::adapters::AlgorithmRegistry;
use crate::domain::{RuleResult, ShardingRuleConfig};

struct Published {
    generation: u64,
    engine: Arc<RuleEngine>,
}

/// Shared reference to the current engine generation.
pub struct RuleEngineHandle {
    current: RwLock<Published>,
}

impl RuleEngineHandle {
    /// Publish `engine` as generation 1.
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            current: RwLock::new(Published {
                generation: 1,
                engine: Arc::new(engine),
            }),
        }
    }

    /// Build the first generation from `config`.
    pub fn from_config(config: &ShardingRuleConfig) -> RuleResult<Self> {
        Ok(Self::new(RuleEngine::from_config(config)?))
    }

    /// Current engine.
    pub fn load(&self) -> Arc<RuleEngine> {
        self.current.read().engine.clone()
    }

    /// Current engine together with its generation number.
    pub fn snapshot(&self) -> (u64, Arc<RuleEngine>) {
        let current = self.current.read();
        (current.generation, current.engine.clone())
    }

    /// Generation number of the current engine.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Replace the current engine, returning the new generation number.
    pub fn publish(&self, engine: RuleEngine) -> u64 {
        let engine = Arc::new(engine);
        let mut current = self.current.write();
        current.generation += 1;
        current.engine = engine;
        info!("[sharding] Published rule generation {}", current.generation);
        current.generation
    }

    /// Build from `config` and publish; the current engine stays in place
    /// when the build fails.
    pub fn rebuild(
        &self,
        config: &ShardingRuleConfig,
        registry: AlgorithmRegistry,
    ) -> RuleResult<u64> {
        let engine = RuleEngine::new(config, registry)?;
        Ok(self.publish(engine))
    }

    /// [`rebuild`](Self::rebuild) with algorithms instantiated from `config`.
    pub fn rebuild_from_config(&self, config: &ShardingRuleConfig) -> RuleResult<u64> {
        let engine = RuleEngine::from_config(config)?;
        Ok(self.publish(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TableRuleConfig;
    use crate::ports::ShardingRuleApi;

    fn config(tables: &[&str]) -> ShardingRuleConfig {
        let mut config = ShardingRuleConfig::new(["ds_0"]);
        for table in tables {
            config
                .tables
                .push(TableRuleConfig::new(*table, [format!("ds_0.{}_0", table)]));
        }
        config
    }

    #[test]
    fn test_publish_swaps_engine() {
        let handle = RuleEngineHandle::from_config(&config(&["t_order"])).unwrap();
        let before = handle.load();
        assert_eq!(handle.generation(), 1);

        let generation = handle.rebuild_from_config(&config(&["t_order", "t_user"])).unwrap();
        assert_eq!(generation, 2);
        assert!(handle.load().is_sharding_table("t_user"));
        assert!(!before.is_sharding_table("t_user"));
    }

    #[test]
    fn test_failed_rebuild_keeps_current() {
        let handle = RuleEngineHandle::from_config(&config(&["t_order"])).unwrap();
        let mut broken = config(&["t_order"]);
        broken.binding_groups.push("t_order,t_ghost".to_string());

        assert!(handle.rebuild_from_config(&broken).is_err());
        let (generation, engine) = handle.snapshot();
        assert_eq!(generation, 1);
        assert!(engine.is_sharding_table("t_order"));
    }
}
