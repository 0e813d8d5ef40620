//! Service Layer
//!
//! The rule engine and the handle that publishes its generations.

pub mod handle;
pub mod rule_engine;

pub use handle::RuleEngineHandle;
pub use rule_engine::RuleEngine;
