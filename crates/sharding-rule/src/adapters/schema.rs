//! In-memory schema adapter.
//!
//! Implements `SchemaResolver` over a fixed table -> columns map.

use std::collections::{HashMap, HashSet};

use crate::domain::{canonical, ColumnRef, StatementContext};
use crate::ports::SchemaResolver;

/// Column ownership known up front, keyed by canonical names.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchema {
    columns: HashMap<String, HashSet<String>>,
}

impl InMemorySchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` with its columns.
    pub fn with_table<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .entry(canonical(table))
            .or_default()
            .extend(columns.into_iter().map(|column| canonical(column.as_ref())));
        self
    }

    /// Whether `table` declares `column`.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns
            .get(&canonical(table))
            .is_some_and(|columns| columns.contains(&canonical(column)))
    }
}

impl SchemaResolver for InMemorySchema {
    /// Qualified columns resolve through the alias map (or name the table
    /// directly). Unqualified columns resolve to the single statement table
    /// declaring them, or to the only table of a single-table statement.
    fn owning_table(&self, column: &ColumnRef, statement: &StatementContext) -> Option<String> {
        if let Some(owner) = &column.owner {
            let table = statement.table_of_alias(owner).unwrap_or(owner);
            return Some(table.to_string());
        }
        let mut owners = statement
            .tables
            .iter()
            .filter(|table| self.has_column(table, &column.name));
        match (owners.next(), owners.next()) {
            (Some(table), None) => Some(table.clone()),
            (None, _) if statement.tables.len() == 1 => statement.tables.first().cloned(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement() -> StatementContext {
        StatementContext::select(["t_order", "t_order_item"]).with_alias("o", "t_order")
    }

    #[test]
    fn test_alias_resolution() {
        let schema = InMemorySchema::new();
        let column = ColumnRef::new(Some("O"), "order_id");
        assert_eq!(schema.owning_table(&column, &statement()).as_deref(), Some("t_order"));

        let direct = ColumnRef::new(Some("t_order_item"), "order_id");
        assert_eq!(
            schema.owning_table(&direct, &statement()).as_deref(),
            Some("t_order_item")
        );
    }

    #[test]
    fn test_unqualified_resolution() {
        let schema = InMemorySchema::new()
            .with_table("t_order", ["order_id", "user_id"])
            .with_table("t_order_item", ["item_id", "order_id"]);
        let user = ColumnRef::new(None, "USER_ID");
        assert_eq!(schema.owning_table(&user, &statement()).as_deref(), Some("t_order"));

        let ambiguous = ColumnRef::new(None, "order_id");
        assert_eq!(schema.owning_table(&ambiguous, &statement()), None);
    }

    #[test]
    fn test_single_table_statement() {
        let schema = InMemorySchema::new();
        let column = ColumnRef::new(None, "anything");
        let ctx = StatementContext::select(["t_order"]);
        assert_eq!(schema.owning_table(&column, &ctx).as_deref(), Some("t_order"));
    }
}
