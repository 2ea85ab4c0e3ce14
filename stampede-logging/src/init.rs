use anyhow::Result;
use stampede_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter string for a config: the level followed by any extra directives
pub fn filter_directives(config: &LoggingConfig, level_override: Option<&str>) -> String {
    let level = level_override
        .map(str::to_string)
        .unwrap_or_else(|| config.level.to_string());

    std::iter::once(level)
        .chain(config.directives.iter().cloned())
        .collect::<Vec<_>>()
        .join(",")
}

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging from configuration.
///
/// `level_override` (the CLI `--log-level`) replaces the configured level.
/// Calling this twice is harmless; the first subscriber stays installed.
pub fn init_logging_from_config(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let filter = env_filter(&filter_directives(config, level_override));
    let location = config.include_location;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(location)
        .with_line_number(location);

    // Use try_init to avoid panic if global subscriber already set
    let installed = match config.format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
        LogFormat::Json => builder
            .json()
            .with_current_span(false)
            .try_init()
            .is_ok(),
    };

    if !installed {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_config::LogLevel;

    #[test]
    fn test_filter_directives() {
        let mut config = LoggingConfig {
            level: LogLevel::Debug,
            ..Default::default()
        };
        assert_eq!(filter_directives(&config, None), "debug");

        config.directives = vec!["reqwest=warn".to_string(), "hyper=off".to_string()];
        assert_eq!(
            filter_directives(&config, Some("trace")),
            "trace,reqwest=warn,hyper=off"
        );
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging_from_config(&config, None).is_ok());
        assert!(init_logging_from_config(&config, Some("debug")).is_ok());
        assert!(init_simple_tracing("info").is_ok());
    }
}
