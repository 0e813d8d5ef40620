//! # Outbound Ports
//!
//! Pluggable algorithm SPI and schema lookup consumed by the engine.
//! Implementations are expected to be side-effect free and non-blocking;
//! any runtime context they need (a worker id, say) is handed over once at
//! construction.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::{ColumnRef, RuleResult, StatementContext};

/// Sharding algorithm - outbound port.
pub trait ShardingAlgorithm: Send + Sync + fmt::Debug {
    /// Algorithm type, e.g. `INLINE`.
    fn type_name(&self) -> &str;

    /// Comparable signature of how this algorithm distributes rows, relative
    /// to a naming prefix and sharding column spec. Bound tables must produce
    /// equal signatures. `None` means the algorithm exposes no structure.
    fn algorithm_structure(&self, _naming_prefix: &str, _sharding_column: &str) -> Option<String> {
        None
    }

    /// Downcast to an auto sharding algorithm.
    fn as_auto(&self) -> Option<&dyn AutoShardingAlgorithm> {
        None
    }
}

/// Sharding algorithm that also decides the physical layout.
pub trait AutoShardingAlgorithm: ShardingAlgorithm {
    /// Number of physical tables to create.
    fn sharding_count(&self) -> usize;
}

/// Generated key value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneratedKey {
    /// Numeric key.
    Number(i64),
    /// Textual key (UUIDs).
    Text(String),
}

/// Key generator - outbound port.
pub trait KeyGenerateAlgorithm: Send + Sync + fmt::Debug {
    /// Generator type, e.g. `SNOWFLAKE`.
    fn type_name(&self) -> &str;

    /// Produce the next key.
    fn generate_key(&self) -> RuleResult<GeneratedKey>;

    /// Whether the generator behaves like a database auto increment.
    fn supports_auto_increment(&self) -> bool {
        false
    }
}

/// Schema lookup - outbound port.
pub trait SchemaResolver: Send + Sync {
    /// Table that owns `column` in the context of `statement`.
    fn owning_table(&self, column: &ColumnRef, statement: &StatementContext) -> Option<String>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Sequential key generator.
#[derive(Debug)]
pub struct MockKeyGenerator {
    next: AtomicI64,
    auto_increment: bool,
}

impl MockKeyGenerator {
    /// Generator starting at `start`.
    pub fn new(start: i64, auto_increment: bool) -> Self {
        Self {
            next: AtomicI64::new(start),
            auto_increment,
        }
    }
}

impl KeyGenerateAlgorithm for MockKeyGenerator {
    fn type_name(&self) -> &str {
        "MOCK"
    }

    fn generate_key(&self) -> RuleResult<GeneratedKey> {
        Ok(GeneratedKey::Number(self.next.fetch_add(1, Ordering::Relaxed)))
    }

    fn supports_auto_increment(&self) -> bool {
        self.auto_increment
    }
}

/// Algorithm that reports a fixed structure signature.
#[derive(Debug, Clone)]
pub struct MockShardingAlgorithm {
    /// Signature returned regardless of prefix/column.
    pub structure: Option<String>,
}

impl ShardingAlgorithm for MockShardingAlgorithm {
    fn type_name(&self) -> &str {
        "MOCK"
    }

    fn algorithm_structure(&self, _naming_prefix: &str, _sharding_column: &str) -> Option<String> {
        self.structure.clone()
    }
}
