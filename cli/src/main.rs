//! packguard - encrypt and restore content packs from the command line.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam::channel::{bounded, Sender};
use tracing_subscriber::EnvFilter;

use packguard_core::config::EngineConfig;
use packguard_core::context::PackEngine;
use packguard_core::crypto::{generate_key, PackKey};
use packguard_core::codec::DecodeOptions;
use packguard_core::telemetry::{PackCounters, ProgressUpdate};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine config file (JSON). Defaults apply to anything it omits.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Print run counters as JSON on stderr when done.
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a pack archive. Prints the master key on stdout.
    Encode {
        input: PathBuf,
        output: PathBuf,
        /// Master key to seal with; a random one is generated if omitted.
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Restore a pack archive sealed with `encode`.
    Decode {
        input: PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        key: String,
        /// Keep the decrypted `contents.json` files in the output.
        #[arg(long)]
        preserve_manifest: bool,
    },
    /// Print a fresh random key.
    Keygen,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);
    let config = args.config.as_deref();

    let counters = match args.command {
        Command::Keygen => {
            println!("{}", generate_key());
            return Ok(());
        }
        Command::Encode { input, output, key } => {
            let key = key.as_deref().map(PackKey::parse).transpose()?;
            with_engine(config, |engine, progress| {
                let encoded = engine
                    .encode_pack_file(&input, &output, key, progress)
                    .with_context(|| format!("encoding {}", input.display()))?;
                println!("{}", encoded.key);
                Ok(encoded.counters)
            })?
        }
        Command::Decode { input, output, key, preserve_manifest } => {
            let options = DecodeOptions { preserve_manifest };
            with_engine(config, |engine, progress| {
                let decoded = engine
                    .decode_pack_file(&input, &output, &key, options, progress)
                    .with_context(|| format!("decoding {}", input.display()))?;
                Ok(decoded.counters)
            })?
        }
    };

    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(&counters)?);
    }
    Ok(())
}

/// Start an engine, run `job` with progress drained on a side thread, then shut down.
fn with_engine<F>(config: Option<&Path>, job: F) -> Result<PackCounters>
where
    F: FnOnce(&PackEngine, &Sender<ProgressUpdate>) -> Result<PackCounters>,
{
    let config = match config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .with_env_overrides()?;

    let engine = PackEngine::new(config).context("starting engine")?;

    let (progress, updates) = bounded::<ProgressUpdate>(64);
    let reporter = thread::spawn(move || {
        for update in updates {
            tracing::debug!(stage = %update.stage, percent = update.percent, "progress");
        }
    });

    let outcome = job(&engine, &progress);

    drop(progress);
    let _ = reporter.join();
    engine.shutdown();
    outcome
}

fn init_tracing(level: &str) {
    let level: tracing::Level = level.parse().unwrap_or(tracing::Level::INFO);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
