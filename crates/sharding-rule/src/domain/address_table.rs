//! # Table Address Table
//!
//! The ordered, indexed set of physical locations of one logic table plus
//! the strategy metadata attached to it. Location order is the correlation
//! axis for binding groups, so it is never re-sorted.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::config::{AutoTableRuleConfig, TableRuleConfig};
use super::errors::{RuleResult, ShardingRuleError};
use super::strategy::{AuditStrategy, ShardingStrategy};
use super::value_objects::{canonical, NamingPattern, PhysicalLocation};
use crate::algorithms::{auto_locations, derive_data_source_pattern, derive_table_pattern};

/// Physical addressing of one logic table.
#[derive(Debug, Clone)]
pub struct TableAddressTable {
    logic_name: String,
    locations: Vec<PhysicalLocation>,
    location_index: HashMap<PhysicalLocation, usize>,
    /// Data sources in first-seen order.
    actual_data_sources: Vec<String>,
    /// Canonical data source -> tables in first-seen order.
    tables_by_data_source: HashMap<String, Vec<String>>,
    /// Canonical physical table names.
    actual_tables: HashSet<String>,
    data_source_naming: Option<NamingPattern>,
    table_naming: Option<NamingPattern>,
    database_strategy: Option<ShardingStrategy>,
    table_strategy: Option<ShardingStrategy>,
    audit_strategy: Option<AuditStrategy>,
    generate_key_column: Option<String>,
    key_generator_name: Option<String>,
}

impl TableAddressTable {
    /// Build from explicit location expressions checked against `pool`.
    ///
    /// An empty pool accepts every data source.
    pub fn explicit<I, S>(logic_name: &str, expressions: I, pool: &[String]) -> RuleResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pool: HashSet<String> = pool.iter().map(|ds| canonical(ds)).collect();
        let mut locations = Vec::new();
        for expression in expressions {
            let location = PhysicalLocation::parse(expression.as_ref())?;
            if !pool.is_empty() && !pool.contains(&canonical(location.data_source())) {
                return Err(ShardingRuleError::LocationGeneration {
                    logic_table: logic_name.to_string(),
                    location: location.to_string(),
                    data_source: location.data_source().to_string(),
                });
            }
            locations.push(location);
        }
        Self::from_locations(logic_name, locations)
    }

    /// One location per data source in `pool`, named after the logic table.
    pub fn implicit(logic_name: &str, pool: &[String]) -> RuleResult<Self> {
        let locations = pool
            .iter()
            .map(|ds| PhysicalLocation::new(ds.trim(), logic_name.trim()))
            .collect();
        Self::from_locations(logic_name, locations)
    }

    /// Locations laid out round-robin for `shard_count` physical tables.
    pub fn auto(logic_name: &str, shard_count: usize, data_sources: &[String]) -> RuleResult<Self> {
        let expressions = auto_locations(shard_count, logic_name.trim(), data_sources);
        Self::explicit(logic_name, expressions, data_sources)
    }

    /// Build a manual table from its declaration.
    ///
    /// Fails with `MissingRequiredLocations` when no locations are declared
    /// but a non-trivial table strategy is.
    pub fn from_config(
        config: &TableRuleConfig,
        pool: &[String],
        default_generate_key_column: Option<&str>,
    ) -> RuleResult<Self> {
        let logic_name = config.logic_table.trim();
        let sharded_by_table = config
            .table_strategy
            .as_ref()
            .is_some_and(|strategy| !strategy.is_none());
        if config.locations.is_empty() && sharded_by_table {
            return Err(ShardingRuleError::MissingRequiredLocations(
                logic_name.to_string(),
            ));
        }

        let table = if config.locations.is_empty() {
            Self::implicit(logic_name, pool)?
        } else {
            Self::explicit(logic_name, &config.locations, pool)?
        };
        let table = table
            .with_strategies(
                config.database_strategy.clone(),
                config.table_strategy.clone(),
                config.audit_strategy.clone(),
            )
            .with_key_generation(
                config.key_generate_strategy.as_ref().map(|s| s.column.as_str()),
                config.key_generate_strategy.as_ref().map(|s| s.key_generator.as_str()),
                default_generate_key_column,
            );
        debug!(
            "[sharding] table {} resolved to {} locations",
            logic_name,
            table.locations.len()
        );
        Ok(table)
    }

    /// Build an auto table; the database dimension is never sharded.
    ///
    /// Its own data sources must belong to a non-empty `pool`, and a
    /// non-trivial strategy must yield at least one location.
    pub fn from_auto_config(
        config: &AutoTableRuleConfig,
        shard_count: usize,
        pool: &[String],
        default_generate_key_column: Option<&str>,
    ) -> RuleResult<Self> {
        let logic_name = config.logic_table.trim();
        let data_sources = if config.data_sources.is_empty() {
            pool
        } else {
            config.data_sources.as_slice()
        };
        if !pool.is_empty() {
            let declared: HashSet<String> = pool.iter().map(|ds| canonical(ds)).collect();
            if let Some(undeclared) = data_sources
                .iter()
                .map(|ds| ds.trim())
                .find(|ds| !declared.contains(&canonical(ds)))
            {
                return Err(ShardingRuleError::LocationGeneration {
                    logic_table: logic_name.to_string(),
                    location: format!("{}.{}", undeclared, logic_name),
                    data_source: undeclared.to_string(),
                });
            }
        }
        let table = Self::auto(logic_name, shard_count, data_sources)?;
        let sharded = config
            .sharding_strategy
            .as_ref()
            .is_some_and(|strategy| !strategy.is_none());
        if table.locations.is_empty() && sharded {
            return Err(ShardingRuleError::MissingRequiredLocations(
                logic_name.to_string(),
            ));
        }
        let table = table
            .with_strategies(
                Some(ShardingStrategy::None),
                config.sharding_strategy.clone(),
                config.audit_strategy.clone(),
            )
            .with_key_generation(
                config.key_generate_strategy.as_ref().map(|s| s.column.as_str()),
                config.key_generate_strategy.as_ref().map(|s| s.key_generator.as_str()),
                default_generate_key_column,
            );
        debug!(
            "[sharding] auto table {} spread over {} locations",
            logic_name,
            table.locations.len()
        );
        Ok(table)
    }

    fn from_locations(logic_name: &str, locations: Vec<PhysicalLocation>) -> RuleResult<Self> {
        let logic_name = logic_name.trim();
        let mut location_index = HashMap::with_capacity(locations.len());
        let mut actual_data_sources: Vec<String> = Vec::new();
        let mut tables_by_data_source: HashMap<String, Vec<String>> = HashMap::new();
        let mut actual_tables = HashSet::new();

        for (index, location) in locations.iter().enumerate() {
            if location_index.insert(location.clone(), index).is_some() {
                return Err(ShardingRuleError::DuplicateLocation {
                    location: location.to_string(),
                    first: logic_name.to_string(),
                    second: logic_name.to_string(),
                });
            }
            let ds_key = canonical(location.data_source());
            let tables = tables_by_data_source.entry(ds_key).or_insert_with(|| {
                actual_data_sources.push(location.data_source().to_string());
                Vec::new()
            });
            if !tables
                .iter()
                .any(|table| table.eq_ignore_ascii_case(location.table()))
            {
                tables.push(location.table().to_string());
            }
            actual_tables.insert(canonical(location.table()));
        }

        let data_source_naming =
            derive_data_source_pattern(actual_data_sources.iter().map(String::as_str));
        let table_names: Vec<&str> = locations.iter().map(PhysicalLocation::table).collect();
        let table_naming = derive_table_pattern(logic_name, table_names);

        Ok(Self {
            logic_name: logic_name.to_string(),
            locations,
            location_index,
            actual_data_sources,
            tables_by_data_source,
            actual_tables,
            data_source_naming,
            table_naming,
            database_strategy: None,
            table_strategy: None,
            audit_strategy: None,
            generate_key_column: None,
            key_generator_name: None,
        })
    }

    fn with_strategies(
        mut self,
        database: Option<ShardingStrategy>,
        table: Option<ShardingStrategy>,
        audit: Option<AuditStrategy>,
    ) -> Self {
        self.database_strategy = database;
        self.table_strategy = table;
        self.audit_strategy = audit;
        self
    }

    fn with_key_generation(
        mut self,
        column: Option<&str>,
        generator: Option<&str>,
        default_column: Option<&str>,
    ) -> Self {
        self.generate_key_column = column
            .filter(|column| !column.trim().is_empty())
            .or(default_column)
            .map(str::to_string);
        self.key_generator_name = generator
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string);
        self
    }

    /// Logic table name as declared.
    pub fn logic_name(&self) -> &str {
        &self.logic_name
    }

    /// Locations in declaration order.
    pub fn locations(&self) -> &[PhysicalLocation] {
        &self.locations
    }

    /// Location at `index`.
    pub fn location(&self, index: usize) -> Option<&PhysicalLocation> {
        self.locations.get(index)
    }

    /// Position of `(data_source, table)`, or `None` when absent.
    pub fn find_location_index(&self, data_source: &str, table: &str) -> Option<usize> {
        self.location_index
            .get(&PhysicalLocation::new(data_source, table))
            .copied()
    }

    /// Case-insensitive membership in the physical table set.
    pub fn is_known_table(&self, table: &str) -> bool {
        self.actual_tables.contains(&canonical(table))
    }

    /// Physical tables living in `data_source`.
    pub fn tables_for(&self, data_source: &str) -> &[String] {
        self.tables_by_data_source
            .get(&canonical(data_source))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Data sources holding at least one location, in first-seen order.
    pub fn actual_data_sources(&self) -> &[String] {
        &self.actual_data_sources
    }

    /// Canonical data-source set.
    pub fn data_source_set(&self) -> HashSet<String> {
        self.actual_data_sources.iter().map(|ds| canonical(ds)).collect()
    }

    /// First physical table in `data_source`.
    pub fn find_actual_table_by_data_source(&self, data_source: &str) -> Option<&str> {
        self.tables_for(data_source).first().map(String::as_str)
    }

    /// Naming pattern of the data sources.
    pub fn data_source_naming(&self) -> Option<&NamingPattern> {
        self.data_source_naming.as_ref()
    }

    /// Naming pattern of the physical tables.
    pub fn table_naming(&self) -> Option<&NamingPattern> {
        self.table_naming.as_ref()
    }

    /// Own database strategy.
    pub fn database_strategy(&self) -> Option<&ShardingStrategy> {
        self.database_strategy.as_ref()
    }

    /// Own table strategy.
    pub fn table_strategy(&self) -> Option<&ShardingStrategy> {
        self.table_strategy.as_ref()
    }

    /// Own audit strategy.
    pub fn audit_strategy(&self) -> Option<&AuditStrategy> {
        self.audit_strategy.as_ref()
    }

    /// Column filled by the key generator.
    pub fn generate_key_column(&self) -> Option<&str> {
        self.generate_key_column.as_deref()
    }

    /// Named key generator.
    pub fn key_generator_name(&self) -> Option<&str> {
        self.key_generator_name.as_deref()
    }
}
