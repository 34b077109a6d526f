//! Configuration management.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs → schema.rs types → validation.rs → accepted
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ExchangeLimits, ExchangeTimeouts, ListenerConfig, ObservabilityConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
