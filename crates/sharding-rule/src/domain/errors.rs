//! # Domain Errors
//!
//! Error types for the sharding rule engine.
//!
//! Construction-time variants are fatal: an engine that fails to build is
//! never published. Query-time variants (`ActualTableNotFound`,
//! `BindingTableNotFound`) signal a caller contract violation.

use thiserror::Error;

use super::config::ConfigError;

/// Sharding rule error types.
#[derive(Debug, Error)]
pub enum ShardingRuleError {
    /// A location expression references a data source outside the pool.
    #[error("Location `{location}` of table `{logic_table}` references undeclared data source `{data_source}`")]
    LocationGeneration {
        /// Logic table being built
        logic_table: String,
        /// Offending location expression
        location: String,
        /// Data source not found in the pool
        data_source: String,
    },

    /// A location expression is not of the form `data_source.table`.
    #[error("Invalid location format `{0}`, expected `data_source.table`")]
    InvalidLocationFormat(String),

    /// Table sharding strategy configured without any physical location.
    #[error("Table `{0}` has a table sharding strategy but no actual data nodes")]
    MissingRequiredLocations(String),

    /// Binding group failed congruence validation.
    #[error("Invalid binding table configuration: {0}")]
    InvalidBindingTables(String),

    /// Logic table has no address table.
    #[error("Unknown sharding table: {0}")]
    UnknownTable(String),

    /// Actual table does not belong to the source logic table.
    #[error("Actual table `{data_source}.{actual_table}` is not configured")]
    ActualTableNotFound {
        /// Data source name
        data_source: String,
        /// Actual table name
        actual_table: String,
    },

    /// Target logic table is not part of the binding group.
    #[error("Binding table `{logic_table}` not found for `{data_source}.{actual_table}`")]
    BindingTableNotFound {
        /// Data source name
        data_source: String,
        /// Requested logic table
        logic_table: String,
        /// Source actual table
        actual_table: String,
    },

    /// Two logic tables claim the same physical location.
    #[error("Physical location `{location}` is shared by tables `{first}` and `{second}`")]
    DuplicateLocation {
        /// Location in conflict
        location: String,
        /// Table that declared it first
        first: String,
        /// Table that declared it again
        second: String,
    },

    /// Algorithm kind does not fit the place it is used in.
    #[error("Algorithm `{algorithm}` cannot be used by `{logic_table}`: {reason}")]
    AlgorithmInitialization {
        /// Algorithm name
        algorithm: String,
        /// Table (or `default`)
        logic_table: String,
        /// Why it was rejected
        reason: String,
    },

    /// Key generation strategy references an unregistered generator.
    #[error("Unknown key generator: {0}")]
    UnknownKeyGenerator(String),

    /// Algorithm type has no factory.
    #[error("Unknown algorithm type `{type_name}` for `{name}`")]
    UnknownAlgorithmType {
        /// Configured algorithm name
        name: String,
        /// Configured type
        type_name: String,
    },

    /// Key generator failed to produce a key.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias used across the crate.
pub type RuleResult<T> = Result<T, ShardingRuleError>;
