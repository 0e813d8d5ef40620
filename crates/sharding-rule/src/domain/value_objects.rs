//! # Domain Value Objects
//!
//! Immutable value types for physical addressing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::errors::{RuleResult, ShardingRuleError};

/// Padding character used when reconstructing numbered names.
pub const DEFAULT_PADDING_CHAR: char = '0';

/// Canonical form of a logic/physical name used for map keys.
pub fn canonical(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// One physical shard: a table inside a data source.
///
/// Equality and hashing ignore ASCII case, so a location can be used as a
/// map key regardless of how the caller spells it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhysicalLocation {
    data_source: String,
    table: String,
}

impl PhysicalLocation {
    /// Create a location from its parts.
    pub fn new(data_source: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            table: table.into(),
        }
    }

    /// Parse a `data_source.table` expression.
    pub fn parse(expression: &str) -> RuleResult<Self> {
        let expression = expression.trim();
        match expression.split_once('.') {
            Some((ds, table))
                if !ds.trim().is_empty() && !table.trim().is_empty() && !table.contains('.') =>
            {
                Ok(Self::new(ds.trim(), table.trim()))
            }
            _ => Err(ShardingRuleError::InvalidLocationFormat(
                expression.to_string(),
            )),
        }
    }

    /// Data source name.
    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Physical table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl PartialEq for PhysicalLocation {
    fn eq(&self, other: &Self) -> bool {
        self.data_source.eq_ignore_ascii_case(&other.data_source)
            && self.table.eq_ignore_ascii_case(&other.table)
    }
}

impl Eq for PhysicalLocation {}

impl Hash for PhysicalLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data_source.to_ascii_lowercase().hash(state);
        self.table.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for PhysicalLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}

/// Naming descriptor shared by a family of physical names
/// (`ds_0`, `ds_1`, ... or `t_order_00`, `t_order_01`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPattern {
    /// Common root with the numeric suffix removed.
    pub prefix: String,
    /// Shortest suffix observed across all names.
    pub min_suffix_width: usize,
    /// Character used to left-pad suffixes.
    pub padding_char: char,
}

impl NamingPattern {
    /// Create a pattern.
    pub fn new(prefix: impl Into<String>, min_suffix_width: usize, padding_char: char) -> Self {
        Self {
            prefix: prefix.into(),
            min_suffix_width,
            padding_char,
        }
    }

    /// Suffix of `name` once the prefix is removed (case-insensitive).
    /// Names that do not start with the prefix are returned whole.
    pub fn suffix_of<'a>(&self, name: &'a str) -> &'a str {
        if name.len() >= self.prefix.len()
            && name.is_char_boundary(self.prefix.len())
            && name[..self.prefix.len()].eq_ignore_ascii_case(&self.prefix)
        {
            &name[self.prefix.len()..]
        } else {
            name
        }
    }

    /// Rebuild the sibling name carrying `suffix`.
    pub fn format(&self, suffix: u64) -> String {
        let digits = suffix.to_string();
        let padding = self.min_suffix_width.saturating_sub(digits.len());
        let mut name = String::with_capacity(self.prefix.len() + padding + digits.len());
        name.push_str(&self.prefix);
        name.extend(std::iter::repeat(self.padding_char).take(padding));
        name.push_str(&digits);
        name
    }
}
