//! # Rule Engine
//!
//! Owns every address table and binding group of one configuration
//! generation and answers the routing questions of the query planner.
//!
//! ## Lifecycle
//!
//! 1. Address tables are built from the manual and auto table declarations.
//! 2. Binding groups are resolved and checked for congruence.
//! 3. The engine is returned only if every check passed; it never changes
//!    afterwards. Reconfiguration builds a new engine (see
//!    [`RuleEngineHandle`](crate::service::RuleEngineHandle)).
//!
//! ## Thread Safety
//!
//! Read-only after construction, so it can be shared across threads via
//! `Arc` without locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::AlgorithmRegistry;
use crate::algorithms::joined_tables;
use crate::domain::{
    canonical, invariant_binding_congruent, invariant_unique_locations, AuditStrategy,
    AutoTableRuleConfig, BindingGroup, PhysicalLocation, RuleResult, ShardingDimension,
    ShardingRuleConfig, ShardingRuleError, ShardingStrategy, StatementContext, TableAddressTable,
};
use crate::ports::{GeneratedKey, KeyGenerateAlgorithm, SchemaResolver, ShardingRuleApi};

/// Immutable sharding rule of one configuration generation.
#[derive(Debug)]
pub struct RuleEngine {
    data_source_names: Vec<String>,
    /// Address tables in declaration order (manual tables first).
    tables: Vec<Arc<TableAddressTable>>,
    /// Canonical logic name -> position in `tables`.
    table_index: HashMap<String, usize>,
    binding_groups: Vec<Arc<BindingGroup>>,
    /// Canonical logic name -> the group it belongs to.
    binding_index: HashMap<String, Arc<BindingGroup>>,
    default_database_strategy: ShardingStrategy,
    default_table_strategy: ShardingStrategy,
    default_audit_strategy: AuditStrategy,
    default_key_generator: Arc<dyn KeyGenerateAlgorithm>,
    default_sharding_column: Option<String>,
    registry: AlgorithmRegistry,
}

impl RuleEngine {
    /// Build an engine, instantiating algorithms from the configuration.
    pub fn from_config(config: &ShardingRuleConfig) -> RuleResult<Self> {
        let registry = AlgorithmRegistry::from_config(config)?;
        Self::new(config, registry)
    }

    /// Build an engine over an explicit algorithm registry.
    pub fn new(config: &ShardingRuleConfig, registry: AlgorithmRegistry) -> RuleResult<Self> {
        config.validate()?;

        let default_database_strategy = config.default_database_strategy.clone().unwrap_or_default();
        let default_table_strategy = config.default_table_strategy.clone().unwrap_or_default();
        check_manual_strategy(&registry, "default", &default_database_strategy)?;
        check_manual_strategy(&registry, "default", &default_table_strategy)?;

        let default_sharding_column = config
            .default_sharding_column
            .as_deref()
            .map(|column| column.trim().to_string());
        let default_generate_key_column = config
            .default_key_generate_strategy
            .as_ref()
            .map(|strategy| strategy.column.trim())
            .filter(|column| !column.is_empty());
        let pool: Vec<String> = config
            .data_sources
            .iter()
            .map(|ds| ds.trim().to_string())
            .collect();

        let mut tables: Vec<Arc<TableAddressTable>> = Vec::new();
        let mut table_index: HashMap<String, usize> = HashMap::new();

        for table_config in &config.tables {
            let key = canonical(&table_config.logic_table);
            if table_index.contains_key(&key) {
                warn!(
                    "[sharding] Duplicate declaration of table {} ignored",
                    table_config.logic_table
                );
                continue;
            }
            for strategy in [&table_config.database_strategy, &table_config.table_strategy]
                .into_iter()
                .flatten()
            {
                check_manual_strategy(&registry, &table_config.logic_table, strategy)?;
            }
            let table =
                TableAddressTable::from_config(table_config, &pool, default_generate_key_column)?;
            table_index.insert(key, tables.len());
            tables.push(Arc::new(table));
        }

        for auto_config in &config.auto_tables {
            let key = canonical(&auto_config.logic_table);
            if table_index.contains_key(&key) {
                warn!(
                    "[sharding] Duplicate declaration of table {} ignored",
                    auto_config.logic_table
                );
                continue;
            }
            let shard_count = auto_shard_count(&registry, auto_config)?;
            let table = TableAddressTable::from_auto_config(
                auto_config,
                shard_count,
                &pool,
                default_generate_key_column,
            )?;
            table_index.insert(key, tables.len());
            tables.push(Arc::new(table));
        }

        invariant_unique_locations(tables.iter().map(Arc::as_ref))?;

        for table in &tables {
            if let Some(name) = table.key_generator_name() {
                if registry.key_generator(name).is_none() {
                    return Err(ShardingRuleError::UnknownKeyGenerator(name.to_string()));
                }
            }
        }
        let default_key_generator = match config
            .default_key_generate_strategy
            .as_ref()
            .map(|strategy| strategy.key_generator.trim())
            .filter(|name| !name.is_empty())
        {
            Some(name) => registry
                .key_generator(name)
                .cloned()
                .ok_or_else(|| ShardingRuleError::UnknownKeyGenerator(name.to_string()))?,
            None => registry.default_key_generator()?,
        };

        let has_implicit_tables = config.tables.iter().any(|table| table.locations.is_empty());
        let data_source_names = if tables.is_empty() || has_implicit_tables {
            pool
        } else {
            let mut seen = HashSet::new();
            tables
                .iter()
                .flat_map(|table| table.actual_data_sources().iter())
                .filter(|ds| seen.insert(canonical(ds)))
                .cloned()
                .collect()
        };

        let mut engine = Self {
            data_source_names,
            tables,
            table_index,
            binding_groups: Vec::new(),
            binding_index: HashMap::new(),
            default_database_strategy,
            default_table_strategy,
            default_audit_strategy: config.default_audit_strategy.clone().unwrap_or_default(),
            default_key_generator,
            default_sharding_column,
            registry,
        };
        engine.build_binding_groups(&config.binding_groups)?;

        info!(
            "[sharding] Rule engine built: {} tables, {} binding groups, {} data sources",
            engine.tables.len(),
            engine.binding_groups.len(),
            engine.data_source_names.len()
        );
        Ok(engine)
    }

    fn build_binding_groups(&mut self, declarations: &[String]) -> RuleResult<()> {
        let mut groups = Vec::with_capacity(declarations.len());
        let mut index = HashMap::new();
        for declaration in declarations {
            let group = BindingGroup::parse(declaration, |name| self.find_table_arc(name))?;
            invariant_binding_congruent(&group, |table, dimension| {
                self.algorithm_structure(table, dimension)
            })?;
            debug!("[sharding] Binding group [{}] is congruent", group.declaration());

            let group = Arc::new(group);
            for name in group.logic_table_names() {
                index.insert(canonical(name), group.clone());
            }
            groups.push(group);
        }
        self.binding_groups = groups;
        self.binding_index = index;
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Data sources the rule spans.
    ///
    /// The declared pool when there are no tables or some table relies on
    /// implicit locations; otherwise the data sources actually referenced.
    pub fn data_source_names(&self) -> &[String] {
        &self.data_source_names
    }

    /// Address tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableAddressTable> {
        self.tables.iter().map(Arc::as_ref)
    }

    /// Address table of `logic_table`.
    pub fn find_table(&self, logic_table: &str) -> Option<&TableAddressTable> {
        self.table_index
            .get(&canonical(logic_table))
            .map(|&position| self.tables[position].as_ref())
    }

    fn find_table_arc(&self, logic_table: &str) -> Option<Arc<TableAddressTable>> {
        self.table_index
            .get(&canonical(logic_table))
            .map(|&position| self.tables[position].clone())
    }

    /// Address table of `logic_table`, failing with `UnknownTable`.
    pub fn table(&self, logic_table: &str) -> RuleResult<&TableAddressTable> {
        self.find_table(logic_table)
            .ok_or_else(|| ShardingRuleError::UnknownTable(logic_table.to_string()))
    }

    /// Address table owning the physical table `actual_table`.
    pub fn find_table_by_actual_table(&self, actual_table: &str) -> Option<&TableAddressTable> {
        self.tables()
            .find(|table| table.is_known_table(actual_table))
    }

    /// Logic name owning the physical table `actual_table`.
    pub fn find_logic_table_by_actual_table(&self, actual_table: &str) -> Option<&str> {
        self.find_table_by_actual_table(actual_table)
            .map(TableAddressTable::logic_name)
    }

    /// Whether any of `logic_tables` is a sharding table.
    pub fn contains_sharding_table(&self, logic_tables: &[&str]) -> bool {
        logic_tables.iter().any(|name| self.is_sharding_table(name))
    }

    /// The sharding tables among `logic_tables`, spelled as given.
    pub fn sharding_logic_table_names(&self, logic_tables: &[&str]) -> Vec<String> {
        logic_tables
            .iter()
            .filter(|name| self.is_sharding_table(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Binding groups in declaration order.
    pub fn binding_groups(&self) -> &[Arc<BindingGroup>] {
        &self.binding_groups
    }

    /// Group `logic_table` belongs to.
    pub fn find_binding_group(&self, logic_table: &str) -> Option<&BindingGroup> {
        self.binding_index
            .get(&canonical(logic_table))
            .map(Arc::as_ref)
    }

    /// Whether `logic_table` belongs to a binding group.
    pub fn is_binding_table(&self, logic_table: &str) -> bool {
        self.binding_index.contains_key(&canonical(logic_table))
    }

    /// Every logic table with its locations, in declaration order.
    pub fn all_addresses(&self) -> Vec<(&str, &[PhysicalLocation])> {
        self.tables()
            .map(|table| (table.logic_name(), table.locations()))
            .collect()
    }

    /// Physical table of the first location of `logic_table`.
    pub fn find_first_actual_table(&self, logic_table: &str) -> Option<&str> {
        self.find_table(logic_table)?
            .locations()
            .first()
            .map(PhysicalLocation::table)
    }

    /// First physical table of `logic_table` inside `data_source`.
    pub fn find_actual_table_by_data_source(
        &self,
        data_source: &str,
        logic_table: &str,
    ) -> Option<&str> {
        self.find_table(logic_table)?
            .find_actual_table_by_data_source(data_source)
    }

    /// Algorithm registry this engine was built with.
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    // =========================================================================
    // Strategy resolution
    // =========================================================================

    /// Column used by standard strategies that do not name one.
    pub fn default_sharding_column(&self) -> Option<&str> {
        self.default_sharding_column.as_deref()
    }

    /// Own database strategy of `table`, else the rule default.
    pub fn effective_database_strategy<'a>(&'a self, table: &'a TableAddressTable) -> &'a ShardingStrategy {
        table
            .database_strategy()
            .unwrap_or(&self.default_database_strategy)
    }

    /// Own table strategy of `table`, else the rule default.
    pub fn effective_table_strategy<'a>(&'a self, table: &'a TableAddressTable) -> &'a ShardingStrategy {
        table
            .table_strategy()
            .unwrap_or(&self.default_table_strategy)
    }

    /// Effective strategy of `table` in `dimension`.
    pub fn effective_strategy<'a>(
        &'a self,
        table: &'a TableAddressTable,
        dimension: ShardingDimension,
    ) -> &'a ShardingStrategy {
        match dimension {
            ShardingDimension::Database => self.effective_database_strategy(table),
            ShardingDimension::Table => self.effective_table_strategy(table),
        }
    }

    /// Own audit strategy of `table`, else the rule default.
    pub fn effective_audit_strategy<'a>(&'a self, table: &'a TableAddressTable) -> &'a AuditStrategy {
        table.audit_strategy().unwrap_or(&self.default_audit_strategy)
    }

    /// Structure signature of the algorithm sharding `table` in `dimension`,
    /// relative to that dimension's naming prefix.
    pub fn algorithm_structure(
        &self,
        table: &TableAddressTable,
        dimension: ShardingDimension,
    ) -> Option<String> {
        let strategy = self.effective_strategy(table, dimension);
        let algorithm = self.registry.sharding_algorithm(strategy.algorithm_name()?)?;
        let naming = match dimension {
            ShardingDimension::Database => table.data_source_naming(),
            ShardingDimension::Table => table.table_naming(),
        };
        let prefix = naming.map(|naming| naming.prefix.as_str()).unwrap_or_default();
        algorithm.algorithm_structure(
            prefix,
            &strategy.column_spec(self.default_sharding_column()),
        )
    }

    fn shards_by(&self, logic_table: &str, column: &str, dimension: ShardingDimension) -> bool {
        self.find_table(logic_table).is_some_and(|table| {
            self.effective_strategy(table, dimension)
                .find_sharding_column(column, self.default_sharding_column())
                .is_some()
        })
    }

    // =========================================================================
    // Key generation
    // =========================================================================

    fn key_generator_for(&self, logic_table: &str) -> RuleResult<&Arc<dyn KeyGenerateAlgorithm>> {
        let table = self.table(logic_table)?;
        match table.key_generator_name() {
            Some(name) => self
                .registry
                .key_generator(name)
                .ok_or_else(|| ShardingRuleError::UnknownKeyGenerator(name.to_string())),
            None => Ok(&self.default_key_generator),
        }
    }

    /// Column filled by the key generator of `logic_table`.
    pub fn find_generate_key_column(&self, logic_table: &str) -> Option<&str> {
        self.find_table(logic_table)?.generate_key_column()
    }

    /// `count` consecutive keys for `logic_table`.
    pub fn generate_keys(&self, logic_table: &str, count: usize) -> RuleResult<Vec<GeneratedKey>> {
        let generator = self.key_generator_for(logic_table)?;
        (0..count).map(|_| generator.generate_key()).collect()
    }
}

impl ShardingRuleApi for RuleEngine {
    fn is_sharding_table(&self, logic_table: &str) -> bool {
        self.table_index.contains_key(&canonical(logic_table))
    }

    fn is_fully_sharded(&self, logic_tables: &[&str]) -> bool {
        !logic_tables.is_empty() && logic_tables.iter().all(|name| self.is_sharding_table(name))
    }

    fn is_colocated(&self, logic_tables: &[&str]) -> bool {
        let data_sources: HashSet<String> = logic_tables
            .iter()
            .filter_map(|name| self.find_table(name))
            .flat_map(|table| table.data_source_set())
            .collect();
        data_sources.len() == 1
    }

    fn is_fully_bound(&self, logic_tables: &[&str]) -> bool {
        if logic_tables.is_empty() {
            return false;
        }
        logic_tables
            .iter()
            .find_map(|name| self.find_binding_group(name))
            .is_some_and(|group| group.covers(logic_tables))
    }

    fn is_fully_bound_for_statement(
        &self,
        schema: &dyn SchemaResolver,
        statement: &StatementContext,
        logic_tables: &[&str],
    ) -> bool {
        if !statement.is_join_query() {
            return self.is_fully_bound(logic_tables);
        }
        if !self.is_fully_bound(logic_tables) {
            return false;
        }
        let Some(database_joined) = joined_tables(statement, schema, |table, column| {
            self.shards_by(table, column, ShardingDimension::Database)
        }) else {
            debug!("[sharding] OR condition defeats binding for {:?}", logic_tables);
            return false;
        };
        let Some(table_joined) = joined_tables(statement, schema, |table, column| {
            self.shards_by(table, column, ShardingDimension::Table)
        }) else {
            return false;
        };
        let Some(first) = self.find_table(logic_tables[0]) else {
            return false;
        };

        let covered = |joined: &HashSet<String>| {
            logic_tables
                .iter()
                .all(|name| joined.contains(&canonical(name)))
        };
        let database_ok =
            !self.effective_database_strategy(first).is_standard() || covered(&database_joined);
        let table_ok =
            !self.effective_table_strategy(first).is_standard() || covered(&table_joined);
        database_ok && table_ok
    }

    fn find_sharding_column(&self, column: &str, logic_table: &str) -> Option<String> {
        let table = self.find_table(logic_table)?;
        let default_column = self.default_sharding_column();
        self.effective_database_strategy(table)
            .find_sharding_column(column, default_column)
            .or_else(|| {
                self.effective_table_strategy(table)
                    .find_sharding_column(column, default_column)
            })
    }

    fn is_generated_key_column(&self, column: &str, logic_table: &str) -> bool {
        self.find_generate_key_column(logic_table)
            .is_some_and(|generated| generated.eq_ignore_ascii_case(column))
    }

    fn addresses_of(&self, logic_table: &str) -> RuleResult<&[PhysicalLocation]> {
        Ok(self.table(logic_table)?.locations())
    }

    fn first_address(&self, logic_table: &str) -> RuleResult<&PhysicalLocation> {
        self.table(logic_table)?
            .locations()
            .first()
            .ok_or_else(|| ShardingRuleError::MissingRequiredLocations(logic_table.to_string()))
    }

    fn generate_key(&self, logic_table: &str) -> RuleResult<GeneratedKey> {
        self.key_generator_for(logic_table)?.generate_key()
    }

    fn supports_auto_increment(&self, logic_table: &str) -> RuleResult<bool> {
        Ok(self.key_generator_for(logic_table)?.supports_auto_increment())
    }

    fn resolve_bound_location(
        &self,
        data_source: &str,
        target: &str,
        source: &str,
        source_actual: &str,
    ) -> RuleResult<String> {
        let group =
            self.find_binding_group(source)
                .ok_or_else(|| ShardingRuleError::BindingTableNotFound {
                    data_source: data_source.to_string(),
                    logic_table: target.to_string(),
                    actual_table: source_actual.to_string(),
                })?;
        group
            .resolve_bound_location(data_source, target, source, source_actual)
            .inspect_err(|e| debug!("[sharding] Correlation failed: {}", e))
    }

    fn logic_and_actual_tables_from_binding(
        &self,
        data_source: &str,
        logic_table: &str,
        actual_table: &str,
        candidates: &[&str],
    ) -> RuleResult<HashMap<String, String>> {
        match self.find_binding_group(logic_table) {
            Some(group) => {
                group.resolve_all_bound(data_source, logic_table, actual_table, candidates)
            }
            None => Ok(HashMap::new()),
        }
    }
}

/// Manual tables and rule defaults may not use auto sharding algorithms.
fn check_manual_strategy(
    registry: &AlgorithmRegistry,
    owner: &str,
    strategy: &ShardingStrategy,
) -> RuleResult<()> {
    let Some(name) = strategy.algorithm_name() else {
        return Ok(());
    };
    match registry.sharding_algorithm(name) {
        Some(algorithm) if algorithm.as_auto().is_some() => {
            Err(ShardingRuleError::AlgorithmInitialization {
                algorithm: name.to_string(),
                logic_table: owner.to_string(),
                reason: "auto sharding algorithms are reserved for auto tables".to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Shard count of an auto table, taken from its auto sharding algorithm.
fn auto_shard_count(registry: &AlgorithmRegistry, config: &AutoTableRuleConfig) -> RuleResult<usize> {
    let failure = |algorithm: &str, reason: &str| ShardingRuleError::AlgorithmInitialization {
        algorithm: algorithm.to_string(),
        logic_table: config.logic_table.clone(),
        reason: reason.to_string(),
    };
    let name = config
        .sharding_strategy
        .as_ref()
        .and_then(ShardingStrategy::algorithm_name)
        .ok_or_else(|| failure("-", "auto tables need a sharding strategy"))?;
    let algorithm = registry
        .sharding_algorithm(name)
        .ok_or_else(|| failure(name, "algorithm is not registered"))?;
    algorithm
        .as_auto()
        .map(|auto| auto.sharding_count())
        .ok_or_else(|| failure(name, "not an auto sharding algorithm"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::inline::ALGORITHM_EXPRESSION_KEY;
    use crate::adapters::modulo::SHARDING_COUNT_KEY;
    use crate::adapters::InMemorySchema;
    use crate::domain::{AlgorithmConfig, Expression, KeyGenerateStrategy, TableRuleConfig};
    use crate::ports::{MockKeyGenerator, MockShardingAlgorithm};

    fn locations(logic: &str) -> Vec<String> {
        ["ds_0", "ds_1"]
            .iter()
            .flat_map(|ds| (0..2).map(move |i| format!("{}.{}_{}", ds, logic, i)))
            .collect()
    }

    fn inline(expression: &str) -> AlgorithmConfig {
        AlgorithmConfig::new("INLINE").with_prop(ALGORITHM_EXPRESSION_KEY, expression)
    }

    fn order_config() -> ShardingRuleConfig {
        let mut config = ShardingRuleConfig::new(["ds_0", "ds_1"])
            .with_sharding_algorithm("ds_inline", inline("ds_${user_id % 2}"))
            .with_sharding_algorithm("order_inline", inline("t_order_${order_id % 2}"))
            .with_sharding_algorithm("item_inline", inline("t_order_item_${order_id % 2}"));
        config.default_database_strategy = Some(ShardingStrategy::standard("user_id", "ds_inline"));
        config.tables.push(
            TableRuleConfig::new("t_order", locations("t_order"))
                .with_table_strategy(ShardingStrategy::standard("order_id", "order_inline")),
        );
        config.tables.push(
            TableRuleConfig::new("t_order_item", locations("t_order_item"))
                .with_table_strategy(ShardingStrategy::standard("order_id", "item_inline")),
        );
        config.tables.push(TableRuleConfig::new(
            "t_user",
            ["ds_0.t_user_0", "ds_1.t_user_0"],
        ));
        config.tables.push(TableRuleConfig::new("t_config", ["ds_0.t_config"]));
        config.binding_groups.push("t_order, t_order_item".to_string());
        config
    }

    fn engine() -> RuleEngine {
        RuleEngine::from_config(&order_config()).unwrap()
    }

    #[test]
    fn test_resolve_bound_location_example() {
        let engine = engine();
        assert_eq!(
            engine
                .resolve_bound_location("ds_1", "t_order_item", "t_order", "t_order_1")
                .unwrap(),
            "t_order_item_1"
        );
    }

    #[test]
    fn test_is_fully_bound_example() {
        let engine = engine();
        assert!(engine.is_fully_bound(&["t_order", "t_order_item"]));
        assert!(engine.is_fully_bound(&["T_ORDER"]));
        assert!(!engine.is_fully_bound(&["t_order", "t_unrelated"]));
        assert!(!engine.is_fully_bound(&["t_user"]));
        assert!(!engine.is_fully_bound(&[]));
    }

    #[test]
    fn test_missing_required_locations_example() {
        let mut config = ShardingRuleConfig::new(["ds_0", "ds_1"]);
        config.tables.push(
            TableRuleConfig::new("t_order", Vec::<String>::new())
                .with_table_strategy(ShardingStrategy::standard("order_id", "mod4")),
        );
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::MissingRequiredLocations(_)));
    }

    #[test]
    fn test_sharding_membership() {
        let engine = engine();
        assert!(engine.is_sharding_table("T_ORDER"));
        assert!(!engine.is_sharding_table("t_missing"));
        assert!(engine.is_fully_sharded(&["t_order", "t_user"]));
        assert!(!engine.is_fully_sharded(&["t_order", "t_missing"]));
        assert!(!engine.is_fully_sharded(&[]));
        assert!(engine.contains_sharding_table(&["t_missing", "t_user"]));
        assert_eq!(
            engine.sharding_logic_table_names(&["t_missing", "T_User"]),
            vec!["T_User".to_string()]
        );
    }

    #[test]
    fn test_is_colocated() {
        let engine = engine();
        assert!(engine.is_colocated(&["t_config"]));
        assert!(engine.is_colocated(&["t_config", "t_missing"]));
        assert!(!engine.is_colocated(&["t_order"]));
        assert!(!engine.is_colocated(&["t_config", "t_user"]));
        assert!(!engine.is_colocated(&["t_missing"]));
    }

    #[test]
    fn test_effective_strategies() {
        let engine = engine();
        let order = engine.table("t_order").unwrap();
        assert_eq!(
            engine.effective_database_strategy(order),
            &ShardingStrategy::standard("user_id", "ds_inline")
        );
        assert_eq!(
            engine.effective_table_strategy(order),
            &ShardingStrategy::standard("order_id", "order_inline")
        );
        let user = engine.table("t_user").unwrap();
        assert!(engine.effective_table_strategy(user).is_none());
        assert_eq!(engine.effective_audit_strategy(user), &AuditStrategy::default());
    }

    #[test]
    fn test_find_sharding_column() {
        let engine = engine();
        assert_eq!(
            engine.find_sharding_column("USER_ID", "t_order"),
            Some("user_id".to_string())
        );
        assert_eq!(
            engine.find_sharding_column("order_id", "t_order"),
            Some("order_id".to_string())
        );
        assert_eq!(engine.find_sharding_column("status", "t_order"), None);
        assert_eq!(engine.find_sharding_column("order_id", "t_missing"), None);
    }

    #[test]
    fn test_addresses() {
        let engine = engine();
        assert_eq!(engine.addresses_of("t_order").unwrap().len(), 4);
        assert_eq!(
            engine.first_address("t_order").unwrap(),
            &PhysicalLocation::new("ds_0", "t_order_0")
        );
        assert!(matches!(
            engine.addresses_of("t_missing"),
            Err(ShardingRuleError::UnknownTable(_))
        ));
        assert_eq!(engine.find_first_actual_table("t_order"), Some("t_order_0"));
        assert_eq!(
            engine.find_actual_table_by_data_source("ds_1", "t_order_item"),
            Some("t_order_item_0")
        );
        assert_eq!(
            engine.find_logic_table_by_actual_table("T_ORDER_ITEM_1"),
            Some("t_order_item")
        );
        assert_eq!(engine.all_addresses().len(), 4);
    }

    #[test]
    fn test_data_source_names() {
        assert_eq!(engine().data_source_names(), ["ds_0", "ds_1"]);

        let mut config = ShardingRuleConfig::new(["ds_0", "ds_1", "ds_2"]);
        config.tables.push(TableRuleConfig::new("t_order", ["ds_1.t_order"]));
        let engine = RuleEngine::from_config(&config).unwrap();
        assert_eq!(engine.data_source_names(), ["ds_1"]);

        config.tables.push(TableRuleConfig::new("t_implicit", Vec::<String>::new()));
        let engine = RuleEngine::from_config(&config).unwrap();
        assert_eq!(engine.data_source_names(), ["ds_0", "ds_1", "ds_2"]);
    }

    #[test]
    fn test_logic_and_actual_tables_from_binding() {
        let engine = engine();
        let bound = engine
            .logic_and_actual_tables_from_binding(
                "ds_0",
                "t_order",
                "t_order_1",
                &["t_order", "t_order_item", "t_user"],
            )
            .unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound["t_order_item"], "t_order_item_1");

        let unbound = engine
            .logic_and_actual_tables_from_binding("ds_0", "t_user", "t_user_0", &["t_order"])
            .unwrap();
        assert!(unbound.is_empty());
    }

    #[test]
    fn test_correlation_errors() {
        let engine = engine();
        assert!(matches!(
            engine.resolve_bound_location("ds_1", "t_order_item", "t_order", "t_order_7"),
            Err(ShardingRuleError::ActualTableNotFound { .. })
        ));
        assert!(matches!(
            engine.resolve_bound_location("ds_1", "t_user", "t_order", "t_order_1"),
            Err(ShardingRuleError::BindingTableNotFound { .. })
        ));
        assert!(matches!(
            engine.resolve_bound_location("ds_1", "t_order", "t_user", "t_user_0"),
            Err(ShardingRuleError::BindingTableNotFound { .. })
        ));
    }

    #[test]
    fn test_congruence_rejects_different_sharding_column() {
        let mut config = order_config();
        config.sharding_algorithms.insert(
            "item_inline".to_string(),
            inline("t_order_item_${item_id % 2}"),
        );
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::InvalidBindingTables(_)));
    }

    #[test]
    fn test_congruence_rejects_different_data_sources() {
        let mut config = order_config();
        config.tables[1] = TableRuleConfig::new("t_order_item", ["ds_0.t_order_item_0", "ds_0.t_order_item_1"])
            .with_table_strategy(ShardingStrategy::standard("order_id", "item_inline"));
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::InvalidBindingTables(_)));
    }

    #[test]
    fn test_unknown_binding_member() {
        let mut config = order_config();
        config.binding_groups.push("t_order,t_ghost".to_string());
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::UnknownTable(name) if name == "t_ghost"));
    }

    #[test]
    fn test_undeclared_data_source() {
        let mut config = order_config();
        config.tables.push(TableRuleConfig::new("t_log", ["ds_9.t_log"]));
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::LocationGeneration { .. }));
    }

    #[test]
    fn test_duplicate_declaration_keeps_first() {
        let mut config = order_config();
        config.tables.push(TableRuleConfig::new("T_USER", ["ds_0.t_user_9"]));
        let engine = RuleEngine::from_config(&config).unwrap();
        assert_eq!(engine.addresses_of("t_user").unwrap().len(), 2);
    }

    #[test]
    fn test_location_shared_by_two_tables() {
        let mut config = order_config();
        config.tables.push(TableRuleConfig::new("t_order_copy", ["ds_0.t_order_0"]));
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::DuplicateLocation { .. }));
    }

    #[test]
    fn test_auto_tables() {
        let mut config = ShardingRuleConfig::new(["ds_0", "ds_1"]).with_sharding_algorithm(
            "mod4",
            AlgorithmConfig::new("MOD").with_prop(SHARDING_COUNT_KEY, 4),
        );
        config.auto_tables.push(AutoTableRuleConfig::new(
            "t_user",
            Vec::<String>::new(),
            ShardingStrategy::standard("user_id", "mod4"),
        ));
        let engine = RuleEngine::from_config(&config).unwrap();
        let user = engine.table("t_user").unwrap();
        assert_eq!(user.locations().len(), 4);
        assert!(engine.effective_database_strategy(user).is_none());
        assert_eq!(
            engine.find_sharding_column("user_id", "t_user"),
            Some("user_id".to_string())
        );
    }

    #[test]
    fn test_auto_table_outside_pool_rejected() {
        let mut config = ShardingRuleConfig::new(["ds_0"]).with_sharding_algorithm(
            "mod4",
            AlgorithmConfig::new("MOD").with_prop(SHARDING_COUNT_KEY, 4),
        );
        config.auto_tables.push(AutoTableRuleConfig::new(
            "t_user",
            ["ds_9"],
            ShardingStrategy::standard("user_id", "mod4"),
        ));
        assert!(matches!(
            RuleEngine::from_config(&config),
            Err(ShardingRuleError::LocationGeneration { .. })
        ));
    }

    #[test]
    fn test_auto_table_requires_auto_algorithm() {
        let mut config = order_config();
        config.auto_tables.push(AutoTableRuleConfig::new(
            "t_auto",
            Vec::<String>::new(),
            ShardingStrategy::standard("id", "order_inline"),
        ));
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::AlgorithmInitialization { .. }));
    }

    #[test]
    fn test_manual_table_rejects_auto_algorithm() {
        let mut config = order_config().with_sharding_algorithm(
            "mod4",
            AlgorithmConfig::new("MOD").with_prop(SHARDING_COUNT_KEY, 4),
        );
        config.tables[2] = TableRuleConfig::new("t_user", ["ds_0.t_user_0"])
            .with_table_strategy(ShardingStrategy::standard("user_id", "mod4"));
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::AlgorithmInitialization { .. }));
    }

    #[test]
    fn test_binding_with_column_inside_table_prefix() {
        let mut config = ShardingRuleConfig::new(["ds_0", "ds_1"])
            .with_sharding_algorithm("user_inline", inline("t_user_${user % 2}"))
            .with_sharding_algorithm("detail_inline", inline("t_user_detail_${user % 2}"));
        config.tables.push(
            TableRuleConfig::new("t_user", locations("t_user"))
                .with_table_strategy(ShardingStrategy::standard("user", "user_inline")),
        );
        config.tables.push(
            TableRuleConfig::new("t_user_detail", locations("t_user_detail"))
                .with_table_strategy(ShardingStrategy::standard("user", "detail_inline")),
        );
        config.binding_groups.push("t_user,t_user_detail".to_string());

        let engine = RuleEngine::from_config(&config).unwrap();
        assert!(engine.is_fully_bound(&["t_user", "t_user_detail"]));
    }

    #[test]
    fn test_custom_algorithm_structure() {
        let mut config = order_config();
        config.tables[0] = config.tables[0]
            .clone()
            .with_table_strategy(ShardingStrategy::standard("order_id", "custom_a"));
        config.tables[1] = config.tables[1]
            .clone()
            .with_table_strategy(ShardingStrategy::standard("order_id", "custom_b"));
        let fixed = |structure: &str| {
            Arc::new(MockShardingAlgorithm {
                structure: Some(structure.to_string()),
            })
        };

        let mut registry = AlgorithmRegistry::from_config(&config).unwrap();
        registry.register_sharding("custom_a", fixed("range:4"));
        registry.register_sharding("custom_b", fixed("range:4"));
        assert!(RuleEngine::new(&config, registry.clone()).is_ok());

        registry.register_sharding("custom_b", fixed("range:8"));
        assert!(matches!(
            RuleEngine::new(&config, registry),
            Err(ShardingRuleError::InvalidBindingTables(_))
        ));
    }

    #[test]
    fn test_key_generation() {
        let mut config = order_config();
        config.tables[0] = config.tables[0]
            .clone()
            .with_key_generate_strategy(KeyGenerateStrategy::new("order_id", "seq"));
        let mut registry = AlgorithmRegistry::from_config(&config).unwrap();
        registry.register_key_generator("seq", Arc::new(MockKeyGenerator::new(100, true)));
        let engine = RuleEngine::new(&config, registry).unwrap();

        assert_eq!(engine.generate_key("t_order").unwrap(), GeneratedKey::Number(100));
        assert_eq!(
            engine.generate_keys("t_order", 2).unwrap(),
            vec![GeneratedKey::Number(101), GeneratedKey::Number(102)]
        );
        assert!(engine.supports_auto_increment("t_order").unwrap());
        assert!(engine.is_generated_key_column("ORDER_ID", "t_order"));
        assert!(!engine.is_generated_key_column("order_id", "t_user"));

        assert!(matches!(
            engine.generate_key("t_user").unwrap(),
            GeneratedKey::Number(_)
        ));
        assert!(!engine.supports_auto_increment("t_user").unwrap());
        assert!(matches!(
            engine.generate_key("t_missing"),
            Err(ShardingRuleError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_unknown_key_generator() {
        let mut config = order_config();
        config.tables[0] = config.tables[0]
            .clone()
            .with_key_generate_strategy(KeyGenerateStrategy::new("order_id", "missing"));
        let err = RuleEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ShardingRuleError::UnknownKeyGenerator(name) if name == "missing"));
    }

    #[test]
    fn test_join_refinement() {
        let engine = engine();
        let schema = InMemorySchema::new();
        let names = ["t_order", "t_order_item"];
        let join = |predicate: Expression| {
            StatementContext::select(names)
                .with_join()
                .with_alias("o", "t_order")
                .with_alias("i", "t_order_item")
                .with_predicate(predicate)
        };
        let on = |column: &str| {
            Expression::eq(Expression::column("o", column), Expression::column("i", column))
        };

        // Database dimension joins on user_id, table dimension on order_id.
        let both = join(Expression::and(on("user_id"), on("order_id")));
        assert!(engine.is_fully_bound_for_statement(&schema, &both, &names));

        let order_only = join(on("order_id"));
        assert!(!engine.is_fully_bound_for_statement(&schema, &order_only, &names));

        let with_or = join(Expression::or(
            Expression::and(on("user_id"), on("order_id")),
            Expression::eq(Expression::column("o", "status"), Expression::literal("'OK'")),
        ));
        assert!(!engine.is_fully_bound_for_statement(&schema, &with_or, &names));

        let no_join = StatementContext::select(names);
        assert!(engine.is_fully_bound_for_statement(&schema, &no_join, &names));
    }
}
