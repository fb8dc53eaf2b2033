//! phpa — replica-count forecasters for the predictive autoscaler.
//!
//! Each invocation reads one JSON payload from stdin, runs one forecaster,
//! and writes one result to stdout. Diagnostics and logs go to stderr.
//!
//! Exit status: `0` success, `1` invalid input or configuration, `2` model
//! fit failure, `3` model store failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use phpa_core::PhpaConfig;
use phpa_core::config::ArimaMode;
use phpa_forecast::ForecastError;
use phpa_state::StateError;

mod commands;
mod emit;

#[derive(Parser)]
#[command(
    name = "phpa",
    about = "Predictive HPA forecasters — stdin payload in, replica prediction out",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to phpa.toml (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override [sarima].store_path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk-forward ARIMA on log-differenced replica counts
    Arima {
        /// validation (backtest the held-out tail) or ahead (forecast past the end)
        #[arg(long)]
        mode: Option<ArimaMode>,
    },
    /// Moving average of the last k replica deltas
    Knn {
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Train or predict with the persisted seasonal model.
    ///
    /// Reads {"action": "train" | "predict", "lookAhead": n, "data": ...}.
    Sarima,
    /// Dispatch a versioned envelope to the forecaster it names
    Run,
    /// Print the ids of evaluations beyond the retention limit
    Retain {
        #[arg(long)]
        stored_values: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("phpa: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phpa=warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = PhpaConfig::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.sarima.store_path = store;
    }
    match &cli.command {
        Commands::Arima { mode: Some(mode) } => config.arima.mode = *mode,
        Commands::Knn { k: Some(k) } => config.knn.k = *k,
        Commands::Retain {
            stored_values: Some(n),
        } => config.retention.stored_values = *n,
        _ => {}
    }
    config.validate()?;

    let raw = std::io::read_to_string(std::io::stdin())?;

    let output = match cli.command {
        Commands::Arima { .. } => commands::forecast::arima(&raw, &config.arima)?,
        Commands::Knn { .. } => commands::forecast::knn(&raw, &config.knn)?,
        Commands::Sarima => commands::seasonal::sarima(&raw, &config.sarima)?,
        Commands::Run => commands::run::run(&raw, &config)?,
        Commands::Retain { .. } => commands::retain::retain(&raw, &config.retention)?,
    };

    emit::emit(&mut std::io::stdout().lock(), &output)
}

/// Map a failure onto the process exit status.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<ForecastError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<StateError>().is_some() {
        return 3;
    }
    1
}
