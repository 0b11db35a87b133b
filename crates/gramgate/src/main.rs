// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary entry point: load and validate config, set up tracing, then
//! dispatch to the requested subcommand.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gramgate_config::{GramgateConfig, load_and_validate, load_and_validate_path, render_errors};
use tracing_subscriber::EnvFilter;

mod serve;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(name = "gramgate", version, about = "Telegram account connection gateway")]
struct Cli {
    /// Explicit config file, bypassing the XDG search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,
    /// Print the resolved configuration and exit.
    Config,
}

fn load(cli: &Cli) -> Result<GramgateConfig, ExitCode> {
    let result = match &cli.config {
        Some(path) => load_and_validate_path(path),
        None => load_and_validate(),
    };
    result.map_err(|errors| {
        render_errors(&errors);
        ExitCode::FAILURE
    })
}

fn init_tracing(config: &GramgateConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    println!("{rendered}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("cannot render config: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Serve => {
            init_tracing(&config);
            match serve::run(config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "server exited with error");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
