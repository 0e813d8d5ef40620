//! # Bound Statement Model
//!
//! The slice of a parsed and bound SQL statement that routing decisions
//! look at: the statement kind, whether it joins, its WHERE/ON predicate
//! trees and the alias map. Parsing and binding happen upstream.

use std::collections::HashMap;

use super::value_objects::canonical;

/// Column reference, optionally qualified by a table name or alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name.
    pub name: String,
    /// Qualifier as written (`o` in `o.order_id`).
    pub owner: Option<String>,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(owner: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.map(str::to_string),
        }
    }
}

/// Predicate expression tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    /// Column reference.
    Column(ColumnRef),
    /// Literal or parameter marker.
    Literal(String),
    /// Binary operation, including `AND` / `OR` and comparisons.
    Binary {
        /// Left operand.
        left: Box<Expression>,
        /// Operator as written (`=`, `AND`, `OR`, `>`...).
        operator: String,
        /// Right operand.
        right: Box<Expression>,
    },
}

impl Expression {
    /// Qualified column.
    pub fn column(owner: &str, name: &str) -> Self {
        Self::Column(ColumnRef::new(Some(owner), name))
    }

    /// Unqualified column.
    pub fn bare_column(name: &str) -> Self {
        Self::Column(ColumnRef::new(None, name))
    }

    /// Literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Binary operation.
    pub fn binary(left: Expression, operator: &str, right: Expression) -> Self {
        Self::Binary {
            left: Box::new(left),
            operator: operator.to_string(),
            right: Box::new(right),
        }
    }

    /// `left = right`
    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary(left, "=", right)
    }

    /// `left AND right`
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary(left, "AND", right)
    }

    /// `left OR right`
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary(left, "OR", right)
    }
}

/// Statement kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatementKind {
    /// SELECT
    #[default]
    Select,
    /// INSERT
    Insert,
    /// UPDATE
    Update,
    /// DELETE
    Delete,
    /// Anything else (DDL, DAL...).
    Other,
}

/// Routing-relevant view of a bound statement.
#[derive(Clone, Debug, Default)]
pub struct StatementContext {
    /// Statement kind.
    pub kind: StatementKind,
    /// Whether the FROM clause contains a join.
    pub contains_join: bool,
    /// WHERE and ON predicate trees.
    pub where_segments: Vec<Expression>,
    /// Tables referenced by the statement.
    pub tables: Vec<String>,
    /// Alias (canonical) to table name.
    aliases: HashMap<String, String>,
}

impl StatementContext {
    /// SELECT over `tables` without joins or predicates.
    pub fn select<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Mark as a join query.
    pub fn with_join(mut self) -> Self {
        self.contains_join = true;
        self
    }

    /// Add a WHERE/ON predicate tree.
    pub fn with_predicate(mut self, predicate: Expression) -> Self {
        self.where_segments.push(predicate);
        self
    }

    /// Register `alias` for `table`.
    pub fn with_alias(mut self, alias: &str, table: &str) -> Self {
        self.aliases.insert(canonical(alias), table.to_string());
        self
    }

    /// Table behind `alias`, if registered.
    pub fn table_of_alias(&self, alias: &str) -> Option<&str> {
        self.aliases.get(&canonical(alias)).map(String::as_str)
    }

    /// Join-aware binding checks only apply to SELECT statements with joins.
    pub fn is_join_query(&self) -> bool {
        self.kind == StatementKind::Select && self.contains_join
    }
}
