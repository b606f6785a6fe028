//! `psmt` command-line entry point (spec.md §7).
//!
//! ```text
//! psmt <smt2-file-path> <n> [--no-disequality-fan] [--log-format text|json]
//! ```
//!
//! Prints exactly one of `sat`/`unsat`/`unknown` to stdout on success; any
//! fatal error is printed to stderr and the process exits non-zero
//! (`PsmtError::exit_code`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use psmt::error::PsmtError;
use psmt::reasoner::ContextPool;
use psmt::reconcile;
use psmt::Config;

/// Parallel decision procedure for quantifier-free first-order SMT-LIB2 formulas.
#[derive(Parser, Debug)]
#[command(name = "psmt", version, about)]
struct Cli {
    /// Path to the input SMT-LIB2 file.
    input: PathBuf,

    /// Number of reconciliation buckets (worker threads).
    n: usize,

    /// Explicit config file; defaults to `psmt.toml`/`psmt.local.toml` + env.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable the per-round same-sort disequality fan (spec.md §4.6 step 3).
    #[arg(long)]
    no_disequality_fan: bool,

    /// Emit newline-delimited JSON logs instead of compact text.
    #[arg(long)]
    log_format: Option<String>,
}

fn load_config(cli: &Cli) -> Result<Config, PsmtError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .map_err(|e| PsmtError::InputMalformed(format!("config: {e}")))?;

    if cli.no_disequality_fan {
        config.reconcile.disequality_fan = false;
    }
    if let Some(format) = &cli.log_format {
        config.logging.json = format == "json";
    }
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn run() -> Result<(), PsmtError> {
    let cli = Cli::parse();

    if cli.n == 0 {
        return Err(PsmtError::UsageError("bucket count must be positive".to_string()));
    }
    if !cli.input.exists() {
        return Err(PsmtError::InputMissing(cli.input.clone()));
    }

    let config = load_config(&cli)?;
    init_logging(&config);

    let pool = ContextPool::new(cli.n);
    let verdict = reconcile::solve(&pool, &cli.input, &config)?;
    println!("{verdict}");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("psmt: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
