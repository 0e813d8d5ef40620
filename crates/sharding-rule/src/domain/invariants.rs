//! # Domain Invariants
//!
//! Rules a rule configuration must satisfy before an engine is published.

use std::collections::{HashMap, HashSet};

use super::address_table::TableAddressTable;
use super::binding::BindingGroup;
use super::errors::{RuleResult, ShardingRuleError};
use super::strategy::ShardingDimension;
use super::value_objects::{canonical, PhysicalLocation};

/// Invariant: bound tables live in exactly the same data sources.
pub fn invariant_same_data_sources(sample: &TableAddressTable, other: &TableAddressTable) -> bool {
    sample.data_source_set() == other.data_source_set()
}

/// Invariant: per data source, bound tables carry the same suffixes once
/// each table's own naming prefix is stripped.
pub fn invariant_same_suffixes(sample: &TableAddressTable, other: &TableAddressTable) -> bool {
    sample
        .actual_data_sources()
        .iter()
        .all(|ds| suffixes(sample, ds) == suffixes(other, ds))
}

/// Invariant: bound tables only use numeric suffixes.
pub fn invariant_numeric_suffixes(table: &TableAddressTable) -> bool {
    table.locations().iter().all(|location| {
        let suffix = match table.table_naming() {
            Some(naming) => naming.suffix_of(location.table()),
            None => location.table(),
        };
        suffix.chars().all(|c| c.is_ascii_digit())
    })
}

/// Invariant: a physical location belongs to at most one logic table.
pub fn invariant_unique_locations<'a, I>(tables: I) -> RuleResult<()>
where
    I: IntoIterator<Item = &'a TableAddressTable>,
{
    let mut owners: HashMap<&PhysicalLocation, &str> = HashMap::new();
    for table in tables {
        for location in table.locations() {
            if let Some(first) = owners.insert(location, table.logic_name()) {
                return Err(ShardingRuleError::DuplicateLocation {
                    location: location.to_string(),
                    first: first.to_string(),
                    second: table.logic_name().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Invariant: every member of `group` is shard-congruent with the sample.
///
/// `structure` yields the algorithm structure signature of a table in one
/// dimension (`None` when no algorithm resolves).
pub fn invariant_binding_congruent<F>(group: &BindingGroup, structure: F) -> RuleResult<()>
where
    F: Fn(&TableAddressTable, ShardingDimension) -> Option<String>,
{
    if group.len() < 2 {
        return Ok(());
    }
    if !group
        .members()
        .iter()
        .all(|table| invariant_numeric_suffixes(table))
    {
        return Err(ShardingRuleError::InvalidBindingTables(format!(
            "Alphabetical table suffixes are not supported in binding tables '{}'",
            group.declaration()
        )));
    }

    let sample = group.sample();
    for other in &group.members()[1..] {
        let mismatch = if !invariant_same_data_sources(sample, other) {
            Some("actual data sources")
        } else if !invariant_same_suffixes(sample, other) {
            Some("actual table suffixes")
        } else if structure(sample, ShardingDimension::Database)
            != structure(other, ShardingDimension::Database)
        {
            Some("database sharding algorithm")
        } else if structure(sample, ShardingDimension::Table)
            != structure(other, ShardingDimension::Table)
        {
            Some("table sharding algorithm")
        } else {
            None
        };
        if let Some(what) = mismatch {
            return Err(ShardingRuleError::InvalidBindingTables(format!(
                "`{}` and `{}` in '{}' differ in {}",
                sample.logic_name(),
                other.logic_name(),
                group.declaration(),
                what
            )));
        }
    }
    Ok(())
}

fn suffixes(table: &TableAddressTable, data_source: &str) -> HashSet<String> {
    table
        .tables_for(data_source)
        .iter()
        .map(|name| match table.table_naming() {
            Some(naming) => canonical(naming.suffix_of(name)),
            None => canonical(name),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pool() -> Vec<String> {
        vec!["ds_0".to_string(), "ds_1".to_string()]
    }

    fn table(logic: &str, locations: &[&str]) -> Arc<TableAddressTable> {
        Arc::new(TableAddressTable::explicit(logic, locations, &pool()).unwrap())
    }

    fn group(tables: &[Arc<TableAddressTable>]) -> BindingGroup {
        BindingGroup::new(tables.iter().map(|t| t.logic_name().to_string()), |name| {
            tables
                .iter()
                .find(|t| t.logic_name().eq_ignore_ascii_case(name))
                .cloned()
        })
        .unwrap()
    }

    fn no_structure(_: &TableAddressTable, _: ShardingDimension) -> Option<String> {
        None
    }

    #[test]
    fn test_congruent_tables() {
        let order = table("t_order", &["ds_0.t_order_0", "ds_1.t_order_1"]);
        let item = table("t_order_item", &["ds_0.t_order_item_0", "ds_1.t_order_item_1"]);
        assert!(invariant_same_data_sources(&order, &item));
        assert!(invariant_same_suffixes(&order, &item));
        assert!(invariant_binding_congruent(&group(&[order, item]), no_structure).is_ok());
    }

    #[test]
    fn test_different_data_sources() {
        let order = table("t_order", &["ds_0.t_order_0", "ds_1.t_order_0"]);
        let item = table("t_order_item", &["ds_0.t_order_item_0"]);
        assert!(!invariant_same_data_sources(&order, &item));
        let err = invariant_binding_congruent(&group(&[order, item]), no_structure).unwrap_err();
        assert!(matches!(err, ShardingRuleError::InvalidBindingTables(_)));
    }

    #[test]
    fn test_different_suffixes() {
        let order = table("t_order", &["ds_0.t_order_0", "ds_1.t_order_1"]);
        let item = table("t_order_item", &["ds_0.t_order_item_0", "ds_1.t_order_item_2"]);
        assert!(!invariant_same_suffixes(&order, &item));
        assert!(invariant_binding_congruent(&group(&[order, item]), no_structure).is_err());
    }

    #[test]
    fn test_different_structure() {
        let order = table("t_order", &["ds_0.t_order_0"]);
        let item = table("t_order_item", &["ds_0.t_order_item_0"]);
        let result = invariant_binding_congruent(&group(&[order, item]), |table, _| {
            Some(table.logic_name().to_string())
        });
        assert!(matches!(result, Err(ShardingRuleError::InvalidBindingTables(_))));
    }

    #[test]
    fn test_alphabetical_suffixes_rejected() {
        let order = table("t_order", &["ds_0.t_order_a", "ds_0.t_order_b"]);
        let item = table("t_order_item", &["ds_0.t_order_item_a", "ds_0.t_order_item_b"]);
        assert!(!invariant_numeric_suffixes(&order));
        let err = invariant_binding_congruent(&group(&[order, item]), no_structure).unwrap_err();
        assert!(err.to_string().contains("Alphabetical table suffixes"));
    }

    #[test]
    fn test_unique_locations() {
        let order = table("t_order", &["ds_0.t_order_0"]);
        let item = table("t_order_item", &["ds_0.t_order_item_0"]);
        assert!(invariant_unique_locations([order.as_ref(), item.as_ref()]).is_ok());

        let clash = table("t_order_copy", &["DS_0.T_ORDER_0"]);
        let err = invariant_unique_locations([order.as_ref(), clash.as_ref()]).unwrap_err();
        assert!(matches!(
            err,
            ShardingRuleError::DuplicateLocation { first, second, .. }
                if first == "t_order" && second == "t_order_copy"
        ));
    }
}
