//! Run error types
//!
//! Only failures that break the harness itself live here: setup, the
//! verification channel, and invalid run definitions. Outcomes of the
//! system under test are counted, never raised.

use stampede_config::{ConfigError, ScenarioKind};
use stampede_core::ThresholdParseError;
use stampede_http::HttpError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Setup failed at {step}: {source}")]
    Setup {
        step: String,
        #[source]
        source: HttpError,
    },

    #[error("Setup did not finish within {0:?}")]
    SetupTimeout(Duration),

    #[error("Verification channel failed: {0}")]
    VerificationChannel(#[source] HttpError),

    #[error("Completion log not fetched within {0:?}")]
    VerificationTimeout(Duration),

    #[error("Executor '{executor}' cannot drive a {scenario:?} scenario")]
    UnsupportedProfile {
        scenario: ScenarioKind,
        executor: &'static str,
    },

    #[error("Invalid threshold: {0}")]
    Threshold(#[from] ThresholdParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] HttpError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RunError {
    pub(crate) fn setup(step: impl Into<String>, source: HttpError) -> Self {
        RunError::Setup {
            step: step.into(),
            source,
        }
    }
}

pub type RunResult<T> = Result<T, RunError>;
