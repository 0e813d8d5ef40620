//! # Binding Groups
//!
//! Logic tables proven to shard identically. Because congruence guarantees
//! that members enumerate their locations in parallel order, the physical
//! table of one member follows from another's by position.

use std::collections::HashMap;
use std::sync::Arc;

use super::address_table::TableAddressTable;
use super::errors::{RuleResult, ShardingRuleError};
use super::value_objects::canonical;

/// Ordered set of bound logic tables; the first member is the sample.
#[derive(Debug, Clone)]
pub struct BindingGroup {
    members: Vec<Arc<TableAddressTable>>,
    /// Canonical logic name -> position in `members`.
    index: HashMap<String, usize>,
}

impl BindingGroup {
    /// Resolve a comma separated declaration such as `t_order, t_order_item`.
    pub fn parse<F>(declaration: &str, lookup: F) -> RuleResult<Self>
    where
        F: Fn(&str) -> Option<Arc<TableAddressTable>>,
    {
        Self::new(declaration.split(','), lookup)
    }

    /// Resolve each member name through `lookup`. Repeated names keep their
    /// first position.
    pub fn new<I, S, F>(names: I, lookup: F) -> RuleResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<Arc<TableAddressTable>>,
    {
        let mut members = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let key = canonical(name);
            if index.contains_key(&key) {
                continue;
            }
            let table =
                lookup(name).ok_or_else(|| ShardingRuleError::UnknownTable(name.to_string()))?;
            index.insert(key, members.len());
            members.push(table);
        }
        if members.is_empty() {
            return Err(ShardingRuleError::InvalidBindingTables(
                "binding group has no tables".to_string(),
            ));
        }
        Ok(Self { members, index })
    }

    /// First declared member, the reference for congruence checks.
    pub fn sample(&self) -> &TableAddressTable {
        &self.members[0]
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Arc<TableAddressTable>] {
        &self.members
    }

    /// Member logic names in declaration order.
    pub fn logic_table_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|table| table.logic_name())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Never true for a constructed group.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Case-insensitive membership.
    pub fn contains(&self, logic_table: &str) -> bool {
        self.index.contains_key(&canonical(logic_table))
    }

    /// Member named `logic_table`.
    pub fn find(&self, logic_table: &str) -> Option<&TableAddressTable> {
        self.index
            .get(&canonical(logic_table))
            .map(|&position| self.members[position].as_ref())
    }

    /// True when every name is a member.
    pub fn covers<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().all(|name| self.contains(name.as_ref()))
    }

    /// Comma separated member list.
    pub fn declaration(&self) -> String {
        self.logic_table_names().collect::<Vec<_>>().join(",")
    }

    /// Physical table of `target` correlated with `source_actual` of
    /// `source` in `data_source`.
    pub fn resolve_bound_location(
        &self,
        data_source: &str,
        target: &str,
        source: &str,
        source_actual: &str,
    ) -> RuleResult<String> {
        let actual_not_found = || ShardingRuleError::ActualTableNotFound {
            data_source: data_source.to_string(),
            actual_table: source_actual.to_string(),
        };
        let position = self
            .find(source)
            .and_then(|table| table.find_location_index(data_source, source_actual))
            .ok_or_else(actual_not_found)?;

        self.find(target)
            .and_then(|table| table.location(position))
            .map(|location| location.table().to_string())
            .ok_or_else(|| ShardingRuleError::BindingTableNotFound {
                data_source: data_source.to_string(),
                logic_table: target.to_string(),
                actual_table: source_actual.to_string(),
            })
    }

    /// Correlated physical tables of every member among `candidates`, keyed
    /// by the candidate name as given. `logic_table` itself and non-members
    /// are skipped.
    pub fn resolve_all_bound<I, S>(
        &self,
        data_source: &str,
        logic_table: &str,
        actual_table: &str,
        candidates: I,
    ) -> RuleResult<HashMap<String, String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = HashMap::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if candidate.eq_ignore_ascii_case(logic_table) || !self.contains(candidate) {
                continue;
            }
            let bound =
                self.resolve_bound_location(data_source, candidate, logic_table, actual_table)?;
            result.insert(candidate.to_string(), bound);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(logic: &str) -> Arc<TableAddressTable> {
        let pool = vec!["ds_0".to_string(), "ds_1".to_string()];
        let locations: Vec<String> = ["ds_0", "ds_1"]
            .iter()
            .flat_map(|ds| (0..2).map(move |i| format!("{}.{}_{}", ds, logic, i)))
            .collect();
        Arc::new(TableAddressTable::explicit(logic, locations, &pool).unwrap())
    }

    fn lookup(name: &str) -> Option<Arc<TableAddressTable>> {
        match name.to_ascii_lowercase().as_str() {
            "t_order" => Some(table("t_order")),
            "t_order_item" => Some(table("t_order_item")),
            _ => None,
        }
    }

    #[test]
    fn test_parse_declaration() {
        let group = BindingGroup::parse("t_order, T_ORDER_ITEM", lookup).unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.sample().logic_name(), "t_order");
        assert!(group.contains("t_order_item"));
        assert_eq!(group.declaration(), "t_order,t_order_item");
    }

    #[test]
    fn test_unknown_member_fails() {
        let err = BindingGroup::parse("t_order,t_missing", lookup).unwrap_err();
        assert!(matches!(err, ShardingRuleError::UnknownTable(name) if name == "t_missing"));
    }

    #[test]
    fn test_repeated_member_keeps_first_position() {
        let group = BindingGroup::parse("t_order,t_order_item,t_order", lookup).unwrap();
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_resolve_bound_location() {
        let group = BindingGroup::parse("t_order,t_order_item", lookup).unwrap();
        assert_eq!(
            group
                .resolve_bound_location("ds_1", "t_order_item", "t_order", "t_order_1")
                .unwrap(),
            "t_order_item_1"
        );
        assert_eq!(
            group
                .resolve_bound_location("ds_1", "t_order", "t_order_item", "t_order_item_1")
                .unwrap(),
            "t_order_1"
        );
    }

    #[test]
    fn test_resolve_bound_location_errors() {
        let group = BindingGroup::parse("t_order,t_order_item", lookup).unwrap();
        let err = group
            .resolve_bound_location("ds_1", "t_order_item", "t_order", "t_order_9")
            .unwrap_err();
        assert!(matches!(err, ShardingRuleError::ActualTableNotFound { .. }));

        let err = group
            .resolve_bound_location("ds_1", "t_user", "t_order", "t_order_1")
            .unwrap_err();
        assert!(matches!(err, ShardingRuleError::BindingTableNotFound { .. }));
    }

    #[test]
    fn test_resolve_all_bound_skips_non_members() {
        let group = BindingGroup::parse("t_order,t_order_item", lookup).unwrap();
        let bound = group
            .resolve_all_bound("ds_0", "t_order", "t_order_0", ["t_order", "t_order_item", "t_user"])
            .unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound["t_order_item"], "t_order_item_0");
    }
}
