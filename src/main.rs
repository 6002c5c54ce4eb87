//! bicfg - BI configuration builder
//!
//! Inspects, exports and exercises dashboard configurations: variables,
//! elements, events and conditional states.

mod commands;
mod config;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bicfg")]
#[command(about = "Configuration builder and test mode for BI dashboards")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "BICFG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the sample configuration
    Sample {
        /// Output file (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a configuration and report dangling references
    Check {
        /// Exported configuration file
        file: PathBuf,

        /// Expected CRC32C checksum from a previous export
        #[arg(long)]
        checksum: Option<String>,
    },

    /// Run test mode: apply variable updates and report active states
    Simulate {
        /// Exported configuration file
        file: PathBuf,

        /// Variable update as id=value, applied in order, one pass each
        #[arg(short, long = "set", value_name = "ID=VALUE")]
        sets: Vec<String>,

        /// Write the resulting configuration here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-export a configuration with a fresh timestamp
    Export {
        /// Exported configuration file
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Start interactive test mode
    Repl {
        /// Configuration to load (starts from the sample if omitted)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Some(Commands::Repl { file }) => {
            repl::run(file, &config)?;
        }
        None => {
            repl::run(None, &config)?;
        }
        Some(cmd) => match commands::execute(cmd, &config) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
