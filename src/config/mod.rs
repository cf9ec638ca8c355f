//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (--host, --port, --output)
//!     → CaptureConfig (validated, immutable)
//!     → moved into ProxyService
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the service starts
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::CaptureConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::OutputConfig;
pub use validation::{validate_config, ValidationError};
