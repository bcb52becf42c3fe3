// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memoria - long-term fact memory for chat assistants.
//!
//! This is the binary entry point for the Memoria HTTP service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod telemetry;

use clap::{Parser, Subcommand};

/// Memoria - long-term fact memory for chat assistants.
#[derive(Parser, Debug)]
#[command(name = "memoria", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP service (the default).
    Serve,
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // .env is optional; real environment variables still apply.
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("memoria: could not load .env file: {e}");
    }

    let config = match memoria_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            memoria_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("memoria: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            println!("memoria: configuration is valid");
            println!("{config:#?}");
        }
    }
}
