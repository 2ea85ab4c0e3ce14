//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use stampede_config::{OrderingMode, Preset};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision, drive the workload, verify and print the run report
    Run {
        /// Start from a built-in scenario (coupon-rate, coupon-burst, gate-poll, gate-spike)
        #[arg(long, value_name = "NAME")]
        preset: Option<Preset>,

        /// Also write the JSON report to this file
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Check the completion log of an existing coupon
    Verify {
        /// Coupon whose completion log is fetched
        #[arg(long, value_name = "ID")]
        coupon_id: String,

        /// Ordering predicate: monotonic, dense
        #[arg(long, value_name = "MODE")]
        mode: Option<OrderingMode>,

        /// Coupon quantity; required in dense mode
        #[arg(long, value_name = "N")]
        quantity: Option<u64>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write a preset as a configuration file
    Generate {
        /// Preset to write
        #[arg(long, value_name = "NAME", default_value = "coupon-rate")]
        preset: Preset,

        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration a run would use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
