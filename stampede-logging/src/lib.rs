//! Structured logging initialisation for stampede
//!
//! All crates log through `tracing`; this crate installs the global
//! subscriber once, shaped by the `logging` config domain.

pub mod init;

pub use init::{filter_directives, init_logging_from_config, init_simple_tracing};
pub use stampede_config::{LogFormat, LogLevel, LoggingConfig};
