//! llmctl - inspect GGUF model files
//!
//! Decodes the header, metadata table and tensor index of a GGUF file and
//! prints them. Tensor data is never read.
//!
//! ```bash
//! llmctl -f model.gguf
//! llmctl -f model.gguf --format json
//! llmctl -f model.gguf -V            # trace every decoded entry
//! RUST_LOG=llmctl_gguf=debug llmctl -f model.gguf
//! ```

mod exit;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use llmctl_gguf::{GgufFile, TracingObserver};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use exit::{EXIT_GENERIC_FAIL, EXIT_SUCCESS, exit_code_for};
use output::{OutputFormat, RenderOptions, render};

/// Inspect GGUF model metadata and tensor descriptors
#[derive(Parser, Debug)]
#[command(name = "llmctl")]
#[command(about = "Inspect GGUF model metadata and tensor descriptors")]
struct Cli {
    /// GGUF file path
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    /// Verbose mode: log the header and every decoded entry
    #[arg(short = 'V', long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT", default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Array elements to preview per metadata value in text output
    #[arg(long, value_name = "N", default_value_t = 8)]
    max_array_items: usize,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(EXIT_GENERIC_FAIL);
    }

    let code = match run(&cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

/// Logs go to stderr so stdout stays parseable in JSON mode.
fn setup_logging(cli: &Cli) -> Result<()> {
    let level = cli.log_level.as_deref().unwrap_or(if cli.verbose { "debug" } else { "warn" });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn run(cli: &Cli) -> Result<()> {
    let file = load(cli).with_context(|| format!("Parse GGUF error: {}", cli.file.display()))?;
    info!(
        version = file.version(),
        metadata = file.metadata.len(),
        tensors = file.tensors.len(),
        "decoded {}",
        cli.file.display()
    );

    let opts = RenderOptions { format: cli.format, max_array_items: cli.max_array_items };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&mut out, &file, &opts).context("Failed to write output")?;
    out.flush().context("Failed to flush output")?;
    Ok(())
}

fn load(cli: &Cli) -> llmctl_gguf::Result<GgufFile> {
    if cli.verbose {
        llmctl_gguf::open_with(&cli.file, &mut TracingObserver)
    } else {
        llmctl_gguf::open(&cli.file)
    }
}
