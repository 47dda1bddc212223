// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! funcbench entry point.

use clap::Parser;
use colored::Colorize;
use funcbench_cli::{run, signal, Cli};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let cancel = CancellationToken::new();
    let listener = signal::spawn_listener(cancel.clone());
    let result = run(cli, cancel.clone()).await;
    cancel.cancel();
    let _ = listener.await;

    if let Err(e) = result {
        if verbose {
            eprintln!("{} {:?}", "Error:".red().bold(), e);
        } else {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}
