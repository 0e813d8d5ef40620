//! # Auto Table Node Formatting
//!
//! Expands an auto table's shard count into `ds.table` expressions. Shards
//! are dealt round-robin over the data sources, and each physical table is
//! the logic name suffixed with its shard ordinal.

/// Location expressions for `shard_count` shards of `logic_table`.
pub fn auto_locations(shard_count: usize, logic_table: &str, data_sources: &[String]) -> Vec<String> {
    if data_sources.is_empty() {
        return Vec::new();
    }
    (0..shard_count)
        .map(|shard| {
            format!(
                "{}.{}_{}",
                data_sources[shard % data_sources.len()],
                logic_table,
                shard
            )
        })
        .collect()
}
