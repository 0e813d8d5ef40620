//! # Domain Module
//!
//! Core domain types for the sharding rule engine.

pub mod address_table;
pub mod binding;
pub mod config;
pub mod errors;
pub mod invariants;
pub mod statement;
pub mod strategy;
pub mod value_objects;

pub use address_table::*;
pub use binding::*;
pub use config::*;
pub use errors::*;
pub use invariants::*;
pub use statement::*;
pub use strategy::*;
pub use value_objects::*;
