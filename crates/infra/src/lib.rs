//! Infrastructure layer: entity store backends, application services and
//! configuration.

pub mod config;
pub mod entity_store;
pub mod read_model;
pub mod services;

mod integration_tests;
