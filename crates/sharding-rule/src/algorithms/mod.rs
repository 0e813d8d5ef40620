//! # Algorithms Module
//!
//! Pure helpers used while building and querying the rule engine.

pub mod auto_nodes;
pub mod join_condition;
pub mod naming;

pub use auto_nodes::auto_locations;
pub use join_condition::{column_equality, extract_and_groups, joined_tables};
pub use naming::{derive_data_source_pattern, derive_table_pattern};
