//! # Ports Layer
//!
//! Inbound API offered to the planner and outbound SPI consumed by the
//! engine.

pub mod inbound;
pub mod outbound;

pub use inbound::ShardingRuleApi;
pub use outbound::{
    AutoShardingAlgorithm, GeneratedKey, KeyGenerateAlgorithm, MockKeyGenerator,
    MockShardingAlgorithm, SchemaResolver, ShardingAlgorithm,
};
