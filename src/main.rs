//! ttlset - Revoked Token Blacklist Console
//!
//! This is the entry point for the `ttlset` binary. It builds a blacklist
//! from the environment and command line, then reads admin commands from
//! stdin until EOF or Ctrl+C.

use anyhow::{bail, Context};
use bytes::Bytes;
use std::io::BufRead;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ttlset::blacklist::{BlacklistConfig, ExpiringSet};
use ttlset::commands::CommandHandler;

/// Console configuration
struct Config {
    /// Blacklist settings (environment first, then flags)
    blacklist: BlacklistConfig,
}

impl Config {
    /// Parse configuration from the environment and command-line arguments
    fn from_args() -> anyhow::Result<Self> {
        let mut config = Config {
            blacklist: BlacklistConfig::from_env().context("invalid environment")?,
        };
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--interval-ms" | "-i" => {
                    let Some(raw) = args.get(i + 1) else {
                        bail!("--interval-ms requires a value");
                    };
                    let ms: u64 = raw
                        .parse()
                        .with_context(|| format!("invalid interval: {}", raw))?;
                    config.blacklist = BlacklistConfig::with_interval(Duration::from_millis(ms))?;
                    i += 2;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ttlset version {}", ttlset::VERSION);
                    std::process::exit(0);
                }
                other => {
                    print_help();
                    bail!("unknown argument: {}", other);
                }
            }
        }

        Ok(config)
    }
}

fn print_help() {
    println!(
        r#"
ttlset - Revoked Token Blacklist Console

USAGE:
    ttlset [OPTIONS]

OPTIONS:
    -i, --interval-ms <MS>   Sweep interval in milliseconds (default: 15000)
    -v, --version            Print version information
    -h, --help               Print this help message

ENVIRONMENT:
    BLACKLIST_SWEEP_INTERVAL_MS   Sweep interval (overridden by --interval-ms)
    LOG_LEVEL                     Log filter, e.g. "info" or "ttlset=trace"
    APP_ENV                       "production" lowers the default log level to warn

    Variables may also be set in a .env file in the working directory.

COMMANDS:
    REVOKE <key> <ttl_ms> [value]    CHECK <key>    LEN    SWEEP
    REVOKEAT <key> <expires_at_ms>   CLEAR          INFO   COMMAND
"#
    );
}

/// Builds the log filter from LOG_LEVEL, then RUST_LOG, then the environment default
fn log_filter() -> EnvFilter {
    let default = match std::env::var("APP_ENV").as_deref() {
        Ok("production") => "warn",
        _ => "debug",
    };

    EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args()?;

    let set: ExpiringSet<Bytes, Bytes> = ExpiringSet::from_config(&config.blacklist)?;
    info!(
        interval_ms = config.blacklist.sweep_interval.as_millis() as u64,
        "Blacklist initialized"
    );

    let handler = CommandHandler::new(set.clone());
    let lines = spawn_stdin_reader()?;

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = console_loop(handler, lines) => result?,
        _ = shutdown => {}
    }

    set.clear();
    info!("Console shutdown complete");
    Ok(())
}

/// Reads stdin on its own thread so a pending read never holds up shutdown
fn spawn_stdin_reader() -> anyhow::Result<mpsc::Receiver<std::io::Result<String>>> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::Builder::new()
        .name("ttlset-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;

    Ok(rx)
}

/// Executes commands received from stdin and writes replies to stdout
async fn console_loop(
    handler: CommandHandler,
    mut lines: mpsc::Receiver<std::io::Result<String>>,
) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.recv().await {
        let line = line.context("failed to read stdin")?;
        let Some(reply) = handler.execute(&line) else {
            continue;
        };

        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;

        if CommandHandler::ends_session(&line) {
            break;
        }
    }

    Ok(())
}
