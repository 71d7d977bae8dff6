use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{BuildArgs, DecodeArgs};
use config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "quanta-cwl")]
#[command(about = "Translate quantum graphs into CWL workflows", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "quanta-cwl.toml", env = "QUANTA_CWL_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the workflow and data documents for a graph
    Build(BuildArgs),
    /// Print one decoded entry of a data document
    Decode(DecodeArgs),
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quanta_cwl=info,quanta_cwl_core=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = CliConfig::load(&args.config)?;

    match args.command {
        Command::Build(build) => {
            let (workflow_path, data_path) = commands::build(&config, &build)?;
            tracing::info!("Wrote workflow to {}", workflow_path.display());
            tracing::info!("Wrote data to {}", data_path.display());
        }
        Command::Decode(decode) => {
            println!("{}", commands::decode(&config, &decode)?);
        }
    }

    Ok(())
}
