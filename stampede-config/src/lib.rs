//! Domain-driven configuration management for stampede
//!
//! Configuration is split by functional domain (target, provisioning,
//! workload, gate, verification, ...). Every domain carries its own
//! defaults and validation, and the whole tree can be overridden from
//! `STAMPEDE_*` environment variables.

pub mod error;
pub mod loader;
pub mod presets;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use presets::Preset;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    gate::{GateConfig, GateMode},
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    provision::ProvisionConfig,
    run::RunConfig,
    target::TargetConfig,
    thresholds::ThresholdsConfig,
    verification::{OrderingMode, VerificationConfig},
    vocabulary::{ErrorCode, VocabularyConfig, VocabularyEntry},
    workload::{StageConfig, WorkloadConfig},
    ScenarioKind, StampedeConfig,
};
