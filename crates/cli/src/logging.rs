// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Log subscriber installation.

use funcbench_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 4] = [
    "funcbench_core",
    "funcbench_benchmarks",
    "funcbench_adapters",
    "funcbench_cli",
];

/// Filter used when `RUST_LOG` is not set: `info` for funcbench crates
/// (`debug` when verbose), `warn` for everything else.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    std::iter::once("warn".to_string())
        .chain(CRATES.iter().map(|krate| format!("{}={}", krate, level)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber, writing to stderr.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(config.verbose)))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}
