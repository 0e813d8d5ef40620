//! Sharding rule configuration with validation.
//!
//! The configuration is the only input of an engine generation. Location
//! expressions arrive already expanded (`ds_0.t_order_0`, ...); range and
//! enumeration syntax is evaluated upstream.
//!
//! # Example
//!
//! ```
//! use sharding_rule::domain::{ShardingRuleConfig, ShardingStrategy, TableRuleConfig};
//!
//! let mut config = ShardingRuleConfig::new(["ds_0", "ds_1"]);
//! config.tables.push(
//!     TableRuleConfig::new("t_order", ["ds_0.t_order_0", "ds_1.t_order_0"])
//!         .with_database_strategy(ShardingStrategy::standard("user_id", "ds_inline")),
//! );
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::strategy::{AuditStrategy, KeyGenerateStrategy, ShardingStrategy};

/// Largest worker id representable in a snowflake key.
pub const MAX_WORKER_ID: u32 = 1023;

/// Complete rule configuration for one engine generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardingRuleConfig {
    /// Declared data-source pool.
    pub data_sources: Vec<String>,
    /// Tables with enumerated (or implicit) locations.
    pub tables: Vec<TableRuleConfig>,
    /// Tables whose layout is computed by an auto sharding algorithm.
    pub auto_tables: Vec<AutoTableRuleConfig>,
    /// Binding groups, each a comma separated list of logic tables.
    pub binding_groups: Vec<String>,
    /// Default database sharding strategy.
    pub default_database_strategy: Option<ShardingStrategy>,
    /// Default table sharding strategy.
    pub default_table_strategy: Option<ShardingStrategy>,
    /// Default audit strategy.
    pub default_audit_strategy: Option<AuditStrategy>,
    /// Default key generation strategy.
    pub default_key_generate_strategy: Option<KeyGenerateStrategy>,
    /// Column used by standard strategies that do not name one.
    pub default_sharding_column: Option<String>,
    /// Named sharding algorithms.
    pub sharding_algorithms: BTreeMap<String, AlgorithmConfig>,
    /// Named key generators.
    pub key_generators: BTreeMap<String, AlgorithmConfig>,
    /// Named auditors.
    pub auditors: BTreeMap<String, AlgorithmConfig>,
    /// Worker id handed to key generators that need one.
    pub worker_id: u32,
}

impl ShardingRuleConfig {
    /// Empty configuration over the given data-source pool.
    pub fn new<I, S>(data_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data_sources: data_sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Register a sharding algorithm.
    pub fn with_sharding_algorithm(mut self, name: impl Into<String>, algorithm: AlgorithmConfig) -> Self {
        self.sharding_algorithms.insert(name.into(), algorithm);
        self
    }

    /// Register a key generator.
    pub fn with_key_generator(mut self, name: impl Into<String>, algorithm: AlgorithmConfig) -> Self {
        self.key_generators.insert(name.into(), algorithm);
        self
    }

    /// Structural validation. Semantic checks (congruence, data-source
    /// membership) happen when the engine is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.data_sources {
            if name.trim().is_empty() {
                return Err(ConfigError::BlankName("data source"));
            }
        }

        for table in &self.tables {
            if table.logic_table.trim().is_empty() {
                return Err(ConfigError::BlankName("logic table"));
            }
            if table.locations.iter().any(|each| each.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "table `{}` has a blank location",
                    table.logic_table
                )));
            }
        }

        for table in &self.auto_tables {
            if table.logic_table.trim().is_empty() {
                return Err(ConfigError::BlankName("auto table"));
            }
        }

        for group in &self.binding_groups {
            if group.split(',').any(|each| each.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "binding group `{}` has a blank member",
                    group
                )));
            }
        }

        let algorithms = self
            .sharding_algorithms
            .iter()
            .chain(&self.key_generators)
            .chain(&self.auditors);
        for (name, algorithm) in algorithms {
            if algorithm.type_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "algorithm `{}` has no type",
                    name
                )));
            }
        }

        if matches!(&self.default_sharding_column, Some(column) if column.trim().is_empty()) {
            return Err(ConfigError::BlankName("default sharding column"));
        }

        if self.worker_id > MAX_WORKER_ID {
            return Err(ConfigError::Invalid(format!(
                "worker_id {} exceeds {}",
                self.worker_id, MAX_WORKER_ID
            )));
        }

        Ok(())
    }
}

/// Per-table declaration with enumerated locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRuleConfig {
    /// Logic table name.
    pub logic_table: String,
    /// Expanded `ds.table` expressions. Empty means one location per data
    /// source, named after the logic table.
    pub locations: Vec<String>,
    /// Own database strategy (inherits the default when absent).
    pub database_strategy: Option<ShardingStrategy>,
    /// Own table strategy (inherits the default when absent).
    pub table_strategy: Option<ShardingStrategy>,
    /// Own audit strategy.
    pub audit_strategy: Option<AuditStrategy>,
    /// Own key generation strategy.
    pub key_generate_strategy: Option<KeyGenerateStrategy>,
}

impl TableRuleConfig {
    /// Table over explicit locations.
    pub fn new<I, S>(logic_table: impl Into<String>, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            logic_table: logic_table.into(),
            locations: locations.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the database strategy.
    pub fn with_database_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.database_strategy = Some(strategy);
        self
    }

    /// Set the table strategy.
    pub fn with_table_strategy(mut self, strategy: ShardingStrategy) -> Self {
        self.table_strategy = Some(strategy);
        self
    }

    /// Set the audit strategy.
    pub fn with_audit_strategy(mut self, strategy: AuditStrategy) -> Self {
        self.audit_strategy = Some(strategy);
        self
    }

    /// Set the key generation strategy.
    pub fn with_key_generate_strategy(mut self, strategy: KeyGenerateStrategy) -> Self {
        self.key_generate_strategy = Some(strategy);
        self
    }
}

/// Auto table declaration: the layout comes from the sharding algorithm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoTableRuleConfig {
    /// Logic table name.
    pub logic_table: String,
    /// Data sources to spread over. Empty means the whole pool.
    pub data_sources: Vec<String>,
    /// Table-level strategy; must reference an auto algorithm.
    pub sharding_strategy: Option<ShardingStrategy>,
    /// Own audit strategy.
    pub audit_strategy: Option<AuditStrategy>,
    /// Own key generation strategy.
    pub key_generate_strategy: Option<KeyGenerateStrategy>,
}

impl AutoTableRuleConfig {
    /// Auto table over the given data sources.
    pub fn new<I, S>(logic_table: impl Into<String>, data_sources: I, strategy: ShardingStrategy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            logic_table: logic_table.into(),
            data_sources: data_sources.into_iter().map(Into::into).collect(),
            sharding_strategy: Some(strategy),
            ..Self::default()
        }
    }
}

/// Algorithm declaration: a type resolved by the registry plus properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Algorithm type, e.g. `INLINE`, `MOD`, `SNOWFLAKE`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Free-form properties.
    #[serde(default)]
    pub props: BTreeMap<String, serde_json::Value>,
}

impl AlgorithmConfig {
    /// Algorithm of `type_name` without properties.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            props: BTreeMap::new(),
        }
    }

    /// Add a property.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// String property (numbers are rendered as text).
    pub fn prop_str(&self, key: &str) -> Option<String> {
        match self.props.get(key)? {
            serde_json::Value::String(value) => Some(value.clone()),
            serde_json::Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Unsigned integer property (numeric strings accepted).
    pub fn prop_u64(&self, key: &str) -> Option<u64> {
        match self.props.get(key)? {
            serde_json::Value::Number(value) => value.as_u64(),
            serde_json::Value::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Document could not be parsed
    #[error("failed to parse sharding rule configuration: {0}")]
    Parse(String),
    /// File could not be read
    #[error("failed to read sharding rule configuration: {0}")]
    Io(String),
    /// A required name is blank
    #[error("blank {0} name")]
    BlankName(&'static str),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
