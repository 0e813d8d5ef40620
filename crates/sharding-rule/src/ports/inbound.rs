//! # Inbound Ports
//!
//! Routing-decision API the query planner calls for every statement that
//! needs shard resolution. All methods are pure lookups over an immutable
//! rule generation.

use std::collections::HashMap;

use crate::domain::{PhysicalLocation, RuleResult, StatementContext};
use crate::ports::outbound::{GeneratedKey, SchemaResolver};

/// Sharding rule API - inbound port.
pub trait ShardingRuleApi: Send + Sync {
    /// Whether `logic_table` has an address table.
    fn is_sharding_table(&self, logic_table: &str) -> bool;

    /// Non-empty and every name is a sharding table.
    fn is_fully_sharded(&self, logic_tables: &[&str]) -> bool;

    /// The sharding tables among `logic_tables` span exactly one data source.
    fn is_colocated(&self, logic_tables: &[&str]) -> bool;

    /// Non-empty and all names belong to one binding group.
    fn is_fully_bound(&self, logic_tables: &[&str]) -> bool;

    /// Binding membership refined by the join predicates of `statement`.
    fn is_fully_bound_for_statement(
        &self,
        schema: &dyn SchemaResolver,
        statement: &StatementContext,
        logic_tables: &[&str],
    ) -> bool;

    /// Configured spelling of `column` if it shards `logic_table`, checking
    /// the database dimension first.
    fn find_sharding_column(&self, column: &str, logic_table: &str) -> Option<String>;

    /// Whether `column` is filled by the key generator of `logic_table`.
    fn is_generated_key_column(&self, column: &str, logic_table: &str) -> bool;

    /// Every location of `logic_table`.
    fn addresses_of(&self, logic_table: &str) -> RuleResult<&[PhysicalLocation]>;

    /// First location of `logic_table`.
    fn first_address(&self, logic_table: &str) -> RuleResult<&PhysicalLocation>;

    /// Next key for `logic_table`.
    fn generate_key(&self, logic_table: &str) -> RuleResult<GeneratedKey>;

    /// Whether the key generator of `logic_table` behaves like auto increment.
    fn supports_auto_increment(&self, logic_table: &str) -> RuleResult<bool>;

    /// Physical table of `target` bound to `source_actual` of `source`.
    fn resolve_bound_location(
        &self,
        data_source: &str,
        target: &str,
        source: &str,
        source_actual: &str,
    ) -> RuleResult<String>;

    /// Bound physical tables of every candidate sharing a group with
    /// `logic_table`.
    fn logic_and_actual_tables_from_binding(
        &self,
        data_source: &str,
        logic_table: &str,
        actual_table: &str,
        candidates: &[&str],
    ) -> RuleResult<HashMap<String, String>>;
}
