//! # Adapters Layer (Hexagonal Architecture)
//!
//! Built-in implementations of the outbound ports and the registry that
//! hands them to the engine.

pub mod inline;
pub mod key_generators;
pub mod modulo;
pub mod registry;
pub mod schema;

pub use inline::InlineShardingAlgorithm;
pub use key_generators::{SnowflakeKeyGenerator, UuidKeyGenerator, SNOWFLAKE_EPOCH_MILLIS};
pub use modulo::{HashModShardingAlgorithm, ModShardingAlgorithm};
pub use registry::{
    create_key_generator, create_sharding_algorithm, AlgorithmRegistry,
    DEFAULT_KEY_GENERATOR_TYPE,
};
pub use schema::InMemorySchema;
