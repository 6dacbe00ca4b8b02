mod dump;
mod info;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use navlog::{DecodeConfig, Family, RebaseMode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Log family of the input files: sbg, usd1, neo or teraranger.
    #[arg(long)]
    family: Family,

    /// Output timestamps relative to the first device timestamp rather than as
    /// microseconds since the Unix epoch.
    ///
    /// Overrides the rebase mode set in --config.
    #[arg(short, long, action)]
    relative: bool,

    /// JSON decode config file.
    ///
    /// Supported keys are rebase (absolute|relative), jump_threshold (device clock
    /// microseconds), chunk_size (bytes) and gate_aux (bool).
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,
}

impl DecodeArgs {
    fn decode_config(&self) -> Result<DecodeConfig> {
        let mut config = match &self.config {
            Some(path) => DecodeConfig::load(path)
                .with_context(|| format!("failed to load config {path:?}"))?,
            None => DecodeConfig::default(),
        };
        if self.relative {
            config.rebase = RebaseMode::Relative;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show session metadata and channel summaries for log files.
    ///
    /// Files are decoded in parallel, each independently of the others.
    Info {
        #[command(flatten)]
        decode: DecodeArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,

        /// Input log files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Decode a log file and write all samples and metadata as JSON to stdout.
    Dump {
        #[command(flatten)]
        decode: DecodeArgs,

        /// Only write these channels. May be given more than once.
        #[arg(short = 'C', long = "channel", value_name = "name")]
        channels: Vec<String>,

        /// Input log file.
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("NAVLOG_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Info {
            decode,
            format,
            inputs,
        } => {
            let config = decode.decode_config()?;
            debug!(?config, family = %decode.family, "info");
            info::info(inputs, decode.family, &config, format)
        }
        Commands::Dump {
            decode,
            channels,
            input,
        } => {
            let config = decode.decode_config()?;
            debug!(?config, family = %decode.family, "dump");
            dump::dump(input, decode.family, &config, channels)
        }
    }
}
