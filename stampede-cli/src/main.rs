use anyhow::{Context, Result};
use clap::Parser;
use stampede_config::{ConfigLoader, OrderingMode, Preset, StampedeConfig};
use stampede_core::{ResourceId, ThresholdSet};
use stampede_http::{CouponApi, HttpConfig, HttpManager, TargetClient};
use stampede_logging::init_logging_from_config;
use stampede_runner::{RunReport, Scenario, Verifier};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

mod cli;
use cli::{Cli, Commands, ConfigCommands};

/// Load configuration from a file, a preset, or the default preset
fn load_config(config_path: Option<&PathBuf>, preset: Option<Preset>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();

    match (config_path, preset) {
        (Some(_), Some(_)) => Err(anyhow::anyhow!(
            "--config and --preset are mutually exclusive"
        )),
        (Some(path), None) => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path)),
        (None, Some(preset)) => loader
            .from_preset(preset)
            .with_context(|| format!("Failed to load preset {}", preset)),
        (None, None) => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

fn build_client(config: &StampedeConfig) -> Result<Arc<dyn TargetClient>> {
    let manager = HttpManager::with_config(HttpConfig::from(config.http.clone()))
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(manager))
}

/// Handle the run command
async fn handle_run(config: StampedeConfig, output: Option<&PathBuf>) -> Result<ExitCode> {
    let client = build_client(&config)?;
    let scenario = Scenario::new(config, client);

    let stop = scenario.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping workload");
            stop.stop();
        }
    });

    let report = scenario.run().await.context("Run aborted")?;
    let json = report.to_json().context("Failed to serialize run report")?;
    println!("{}", json);

    if let Some(path) = output {
        write_report(path, &json)?;
        info!("Report written to {:?}", path);
    }

    Ok(exit_code(&report))
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create report directory")?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.passed {
        return ExitCode::SUCCESS;
    }
    for result in report.failed_thresholds() {
        error!(
            "Threshold failed: {} {} (observed {:?})",
            result.metric, result.expression, result.observed
        );
    }
    if let Some(violation) = report
        .verification
        .as_ref()
        .and_then(|v| v.violation.as_ref())
    {
        error!("Ordering violated: {}", violation);
    }
    ExitCode::FAILURE
}

/// Handle the verify command
async fn handle_verify(
    config: StampedeConfig,
    coupon_id: &str,
    mode: Option<OrderingMode>,
    quantity: Option<u64>,
) -> Result<ExitCode> {
    let mode = mode
        .or(config.verification.mode)
        .context("No verification mode; pass --mode monotonic|dense")?;
    let quantity = expected_quantity(mode, quantity)?;
    let coupon_id: ResourceId = coupon_id
        .parse()
        .with_context(|| format!("Invalid coupon id: {}", coupon_id))?;

    let api = CouponApi::new(build_client(&config)?, config.target.base_url.clone());
    let verdict = Verifier::new(api, mode, quantity, config.verification.timeout)
        .verify(&coupon_id)
        .await
        .context("Failed to read the completion log")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&verdict).context("Failed to serialize verdict")?
    );
    Ok(if verdict.holds() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Dense mode compares against the coupon's own quantity, which only the
/// caller knows; monotonic mode never reads it.
fn expected_quantity(mode: OrderingMode, quantity: Option<u64>) -> Result<u64> {
    match (mode, quantity) {
        (_, Some(quantity)) => Ok(quantity),
        (OrderingMode::Dense, None) => Err(anyhow::anyhow!(
            "Dense verification needs the coupon quantity; pass --quantity"
        )),
        (OrderingMode::Monotonic, None) => Ok(0),
    }
}

/// Load a file and parse every threshold expression it declares
fn check_config_file(config_file: &PathBuf) -> Result<StampedeConfig> {
    let config = load_config(Some(config_file), None)?;
    let thresholds = ThresholdSet::from_config(&config.thresholds)
        .context("Invalid threshold expression")?;
    info!(thresholds = thresholds.len(), "Thresholds parsed");
    Ok(config)
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match check_config_file(config_file) {
        Ok(config) => {
            println!(
                "Configuration is valid ({} scenario, {} executor)",
                config.scenario,
                config.workload.executor_name()
            );
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(preset: Preset, output: &PathBuf, force: bool) -> Result<()> {
    info!("Generating {} configuration at: {:?}", preset, output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    let content = render_preset(preset)?;
    fs::write(output, content).context("Failed to write configuration file")?;
    println!("Configuration written to {:?}", output);
    Ok(())
}

fn render_preset(preset: Preset) -> Result<String> {
    let yaml = serde_yaml::to_string(&preset.config()).context("Failed to serialize to YAML")?;
    Ok(format!("# stampede {} preset\n{}", preset, yaml))
}

/// Handle configuration display
fn handle_config_show(config: &StampedeConfig, format: &str) -> Result<()> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize to YAML")?;
            println!("{}", yaml);
        }
        "json" => {
            let json =
                serde_json::to_string_pretty(config).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let preset = match &cli.command {
        Some(Commands::Run { preset, .. }) => *preset,
        _ => None,
    };

    // Validating a file must not fail on the ambient configuration
    if let Some(Commands::Config {
        config_cmd: ConfigCommands::Validate { config_file },
    }) = &cli.command
    {
        stampede_logging::init_simple_tracing(cli.log_level.as_deref().unwrap_or("info"))?;
        handle_config_validate(config_file)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(cli.config.as_ref(), preset)?;
    init_logging_from_config(&config.logging, cli.log_level.as_deref())?;

    match cli.command {
        Some(Commands::Run { output, .. }) => handle_run(config, output.as_ref()).await,
        Some(Commands::Verify {
            coupon_id,
            mode,
            quantity,
        }) => handle_verify(config, &coupon_id, mode, quantity).await,
        Some(Commands::Config { config_cmd }) => {
            match config_cmd {
                ConfigCommands::Validate { config_file } => handle_config_validate(&config_file)?,
                ConfigCommands::Generate {
                    preset,
                    output,
                    force,
                } => handle_config_generate(preset, &output, force)?,
                ConfigCommands::Show { format } => handle_config_show(&config, &format)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}
