//! schema-dts CLI
//!
//! Generates a TypeScript declaration file from JSON Schema documents.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use schema_dts::{generate_from_sources, load_config, GeneratorConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "schema-dts")]
#[command(about = "Generate TypeScript declarations from JSON Schema")]
#[command(version)]
struct Cli {
    /// Schema sources: file paths or URLs (http:// or https://)
    sources: Vec<String>,

    /// JSON config file with `input` and `outputFile`
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Log resolution and generation steps to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("schema_dts={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), u8> {
    let config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => GeneratorConfig::default(),
    }
    .merge_cli(cli.sources, cli.output);

    config.require_sources().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let declarations = generate_from_sources(&config.input).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match config.output_file {
        Some(path) => {
            std::fs::write(&path, &declarations).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
            info!("wrote {}", path.display());
        }
        None => {
            print!("{}", declarations);
        }
    }

    Ok(())
}
