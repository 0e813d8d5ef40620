//! # Sharding Rule
//!
//! Sharding-rule resolution and binding-table correlation engine.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turn declarative sharding configuration into routing decisions:
//! - Expand every logic table into its ordered set of physical locations
//! - Prove at load time that binding tables shard identically
//! - Correlate physical tables of bound tables by position at query time
//! - Decide whether a join over bound tables can stay on a single shard
//!
//! ## Load-Time Checks
//!
//! | Check | Error |
//! |-------|-------|
//! | Location outside the data-source pool | `LocationGeneration` |
//! | Table strategy without locations | `MissingRequiredLocations` |
//! | Binding group not congruent | `InvalidBindingTables` |
//! | Binding group names an unknown table | `UnknownTable` |
//! | Location claimed by two tables | `DuplicateLocation` |
//!
//! ## Module Structure
//!
//! ```text
//! sharding-rule/
//! ├── domain/          # Locations, address tables, binding groups, config
//! ├── algorithms/      # Naming derivation, auto layout, join analysis
//! ├── ports/           # Routing API + algorithm SPI
//! ├── adapters/        # Built-in algorithms and registry
//! └── service/         # RuleEngine and its publication handle
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{AlgorithmRegistry, InMemorySchema};
pub use domain::{
    AlgorithmConfig, AuditStrategy, AutoTableRuleConfig, BindingGroup, ColumnRef, ConfigError,
    Expression, KeyGenerateStrategy, NamingPattern, PhysicalLocation, RuleResult,
    ShardingDimension, ShardingRuleConfig, ShardingRuleError, ShardingStrategy,
    StatementContext, StatementKind, TableAddressTable, TableRuleConfig,
};
pub use ports::{
    AutoShardingAlgorithm, GeneratedKey, KeyGenerateAlgorithm, SchemaResolver,
    ShardingAlgorithm, ShardingRuleApi,
};
pub use service::{RuleEngine, RuleEngineHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
