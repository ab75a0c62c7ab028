use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use renderbridge_common::{Config, ProtocolPolicy};
use renderbridge_kernel::replay::{replay, ReplayOptions};

/// Replay a recorded renderer session through the kernel.
///
/// Reads one `{"type": ..., "payload": ...}` envelope per line, routes each
/// against recording collaborators, then prints what the kernel did.
#[derive(Parser, Debug)]
#[command(name = "renderbridge")]
struct Args {
    /// NDJSON file of renderer messages. Reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Enable the channels capability regardless of CHANNELS_ENABLED.
    #[arg(long)]
    channels: bool,

    /// Report pending-call protocol violations as telemetry.
    #[arg(long)]
    strict: bool,

    /// Replay as if the user never interacted with the page.
    #[arg(long)]
    no_user_interaction: bool,

    /// Seconds to wait for detached work before printing the report.
    #[arg(long, default_value_t = 5)]
    settle_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("renderbridge=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if args.channels {
        config.channels_enabled = true;
    }
    if args.strict {
        config.protocol_policy = ProtocolPolicy::Strict;
    }
    config.log_summary();

    let options = ReplayOptions {
        user_interaction: !args.no_user_interaction,
        settle_timeout: Duration::from_secs(args.settle_timeout_secs),
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let report = replay(reader, &config, &options).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
