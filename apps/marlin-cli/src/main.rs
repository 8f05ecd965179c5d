mod commands;
mod infra;
mod obs;

use clap::{Parser, Subcommand};
use commands::Command;
use obs::LogFormat;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "marlin")]
#[command(about = "Marlin backtesting CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  marlin backtest --config configs/sample.toml --out runs/\n  marlin validate --config configs/sample.toml --strict\n  marlin report --input runs/<run_id>/\n"
)]
struct Cli {
    /// Default log filter; env MARLIN_LOG overrides it.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Expose prometheus metrics on this host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run a backtest and write its artifacts to the run directory.
    Backtest {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check the config and price series without running the engine.
    Validate {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value_t = false)]
        strict: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rebuild metrics.json for a finished run from its records.csv.
    Report {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init(&cli.log_level, cli.log_format, cli.metrics_addr) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Backtest { config, out } => Command::Backtest { config, out },
        CliCommand::Validate {
            config,
            strict,
            out,
        } => Command::Validate {
            config,
            strict,
            out,
        },
        CliCommand::Report { input } => Command::Report { input },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
