//! # Strategy References
//!
//! Declarative strategy shapes attached to a logic table or to the rule
//! defaults. They only name algorithms; the algorithms themselves live in the
//! [`AlgorithmRegistry`](crate::adapters::AlgorithmRegistry).

use serde::{Deserialize, Serialize};

/// The two axes a logic table is sharded along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShardingDimension {
    /// Which data source a row lives in.
    Database,
    /// Which physical table inside the data source.
    Table,
}

/// Sharding strategy for one dimension (data source or table).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShardingStrategy {
    /// No sharding in this dimension.
    #[default]
    None,
    /// Single sharding column. A missing column falls back to the rule's
    /// default sharding column.
    Standard {
        /// Sharding column.
        #[serde(default)]
        sharding_column: Option<String>,
        /// Algorithm name.
        algorithm: String,
    },
    /// Several sharding columns, comma separated.
    Complex {
        /// Raw column spec, e.g. `"user_id,order_id"`.
        sharding_columns: String,
        /// Algorithm name.
        algorithm: String,
    },
    /// Routing driven by hints rather than columns.
    Hint {
        /// Algorithm name.
        algorithm: String,
    },
}

impl ShardingStrategy {
    /// Standard strategy shorthand.
    pub fn standard(column: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self::Standard {
            sharding_column: Some(column.into()),
            algorithm: algorithm.into(),
        }
    }

    /// Complex strategy shorthand.
    pub fn complex(columns: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self::Complex {
            sharding_columns: columns.into(),
            algorithm: algorithm.into(),
        }
    }

    /// Name of the referenced algorithm, if any.
    pub fn algorithm_name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Standard { algorithm, .. }
            | Self::Complex { algorithm, .. }
            | Self::Hint { algorithm } => Some(algorithm),
        }
    }

    /// True for the single-column shape.
    pub fn is_standard(&self) -> bool {
        matches!(self, Self::Standard { .. })
    }

    /// True when this dimension is not sharded.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Sharding columns of this strategy.
    pub fn sharding_columns(&self, default_column: Option<&str>) -> Vec<String> {
        match self {
            Self::Standard {
                sharding_column, ..
            } => sharding_column
                .as_deref()
                .or(default_column)
                .map(|column| vec![column.to_string()])
                .unwrap_or_default(),
            Self::Complex {
                sharding_columns, ..
            } => sharding_columns
                .split(',')
                .map(str::trim)
                .filter(|column| !column.is_empty())
                .map(str::to_string)
                .collect(),
            Self::None | Self::Hint { .. } => Vec::new(),
        }
    }

    /// Column spec handed to an algorithm when asking for its structure.
    pub fn column_spec(&self, default_column: Option<&str>) -> String {
        match self {
            Self::Standard {
                sharding_column, ..
            } => sharding_column
                .as_deref()
                .or(default_column)
                .unwrap_or_default()
                .to_string(),
            Self::Complex {
                sharding_columns, ..
            } => sharding_columns.clone(),
            Self::None | Self::Hint { .. } => String::new(),
        }
    }

    /// Configured spelling of `column` if it is one of the sharding columns.
    pub fn find_sharding_column(&self, column: &str, default_column: Option<&str>) -> Option<String> {
        self.sharding_columns(default_column)
            .into_iter()
            .find(|each| each.eq_ignore_ascii_case(column))
    }
}

/// Audit strategy: names of auditors applied to statements on a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditStrategy {
    /// Auditor names, resolved in the registry.
    pub auditor_names: Vec<String>,
    /// Whether a hint may switch auditing off.
    pub allow_hint_disable: bool,
}

impl Default for AuditStrategy {
    fn default() -> Self {
        Self {
            auditor_names: Vec::new(),
            allow_hint_disable: true,
        }
    }
}

/// Key generation strategy: which column is generated and by which generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGenerateStrategy {
    /// Generated column.
    pub column: String,
    /// Registered key generator name.
    pub key_generator: String,
}

impl KeyGenerateStrategy {
    /// Create a key generation strategy.
    pub fn new(column: impl Into<String>, key_generator: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            key_generator: key_generator.into(),
        }
    }
}
