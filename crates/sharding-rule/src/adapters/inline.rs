//! Inline Expression Sharding Algorithm
//!
//! Only the structure signature is computed here; evaluating the expression
//! for routing is the planner's job.

use crate::domain::{AlgorithmConfig, RuleResult, ShardingRuleError};
use crate::ports::ShardingAlgorithm;

/// Property holding the inline expression.
pub const ALGORITHM_EXPRESSION_KEY: &str = "algorithm-expression";

/// Sharding algorithm described by an inline expression such as
/// `t_order_${order_id % 2}`.
#[derive(Debug, Clone)]
pub struct InlineShardingAlgorithm {
    expression: String,
}

impl InlineShardingAlgorithm {
    /// Create from an expression.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Create from configuration properties.
    pub fn from_config(name: &str, config: &AlgorithmConfig) -> RuleResult<Self> {
        let expression = config
            .prop_str(ALGORITHM_EXPRESSION_KEY)
            .filter(|expr| !expr.trim().is_empty())
            .ok_or_else(|| ShardingRuleError::AlgorithmInitialization {
                algorithm: name.to_string(),
                logic_table: "-".to_string(),
                reason: format!("`{}` is required", ALGORITHM_EXPRESSION_KEY),
            })?;
        Ok(Self::new(expression))
    }

    /// Configured expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl ShardingAlgorithm for InlineShardingAlgorithm {
    fn type_name(&self) -> &str {
        "INLINE"
    }

    /// The expression with the naming prefix, then the sharding column and
    /// all whitespace removed; `%{` and `${` placeholders are equivalent.
    fn algorithm_structure(&self, naming_prefix: &str, sharding_column: &str) -> Option<String> {
        let mut structure = self.expression.replace("%{", "${");
        if !naming_prefix.is_empty() {
            structure = structure.replace(naming_prefix, "");
        }
        if !sharding_column.is_empty() {
            structure = structure.replace(sharding_column, "");
        }
        structure.retain(|c| !c.is_whitespace());
        Some(structure)
    }
}
