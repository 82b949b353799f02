//! Configuration module.
//!
//! Typed configuration with JSON file loading, environment variable
//! overrides, and sensible defaults.
//!
//! # Module Structure
//!
//! - [`types`]: Root `Config` struct
//! - [`server`]: Room lifecycle and session plumbing settings
//! - [`protocol`]: Validation limits (codes, names, rounds)
//! - [`catalog`]: Song catalog collaborator settings
//! - [`logging`]: Logging configuration
//! - [`loader`]: Configuration loading functions
//! - [`validation`]: Configuration validation functions
//! - [`defaults`]: Default value functions

pub mod catalog;
pub mod defaults;
pub mod loader;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod types;
pub mod validation;

pub use catalog::{CatalogConfig, CatalogMode};

pub use loader::load;

pub use logging::{LogFormat, LogLevel, LoggingConfig};

pub use protocol::ProtocolConfig;

pub use server::ServerConfig;

pub use types::Config;

pub use validation::validate_config;
