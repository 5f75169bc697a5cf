//! Core components of the querypilot natural-language-to-SQL pipeline.
//!
//! This crate provides the four pipeline stages (schema inspection, SQL
//! generation, safety validation, execution), the database driver seam
//! they share, and the configuration and error types around them. The
//! binary crate wires these together behind a CLI.
//!
//! # Security Guarantees
//! - The admin credential is zeroized on drop, never logged, never
//!   serialized, and never part of an LLM prompt
//! - Connection strings are sanitized in all error messages
//! - Generated SQL passes a keyword denylist, a SELECT shape check, and a
//!   database-native `EXPLAIN` probe before execution
//!
//! # Architecture
//! The core library follows these patterns:
//! - Factory pattern for database driver instantiation
//! - A generator trait at the LLM boundary so tests never touch the network
//! - Comprehensive error handling with credential sanitization

pub mod config;
pub mod drivers;
pub mod error;
pub mod execute;
pub mod generate;
pub mod inspect;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod validate;

// Re-export commonly used types
pub use config::{AdminCredential, LlmConfig, PipelineConfig};
pub use drivers::{DatabaseDriver, create_driver, detect_database_type};
pub use error::{QueryPilotError, Result, redact_database_url};
pub use execute::SqlExecutor;
pub use generate::{ChatCompletionsGenerator, SqlGenerator};
pub use inspect::SchemaInspector;
pub use models::{DatabaseType, PipelineStage, ResultSet, SchemaSnapshot};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use validate::{FORBIDDEN_KEYWORDS, SqlValidator};
