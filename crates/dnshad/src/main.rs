//! dnshad: health monitoring and failover coordination for a DNS HA node.
//!
//! One binary, invoked by external schedulers:
//! - `check`: the failover engine's tracked script (exit 0 healthy, 1 not)
//! - `heal`: one auto-heal cycle, run from a timer (always exits 0)
//! - `status` / `reset`: inspect or clear the persisted failure counter
//! - `serve`: HTTP health endpoints for load balancers and monitoring
//!
//! # Usage
//!
//! ```text
//! dnshad --config /etc/dnsha/dnsha.toml check
//! dnshad heal
//! dnshad --log-format json serve --listen 0.0.0.0:8888
//! ```

mod check;
mod heal;
mod node;
mod serve;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use dnsha_core::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "dnshad", about = "DNS HA health monitor and failover coordinator")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate health once; exit 0 if healthy, 1 otherwise.
    Check,

    /// Run one auto-heal cycle.
    Heal,

    /// Print the persisted failure counter.
    Status {
        /// Show the counters of every node in the store.
        #[arg(long)]
        all: bool,
    },

    /// Clear this node's failure counter.
    Reset,

    /// Serve the HTTP health endpoints until interrupted.
    Serve {
        /// Listen address, overriding `api.listen`.
        #[arg(long)]
        listen: Option<String>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Check => check::run_check(&cli.config).await,
        Command::Heal => {
            heal::run_heal(&cli.config).await;
            ExitCode::SUCCESS
        }
        Command::Status { all } => exit_status(heal::run_status(&cli.config, all)),
        Command::Reset => exit_status(heal::run_reset(&cli.config).map(|_| ())),
        Command::Serve { listen } => exit_status(serve::run_serve(&cli.config, listen).await),
    }
}

fn exit_status(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}
