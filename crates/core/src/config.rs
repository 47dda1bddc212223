// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading.
//!
//! Sources are layered in this order, later ones winning:
//!
//! 1. built-in defaults,
//! 2. a TOML file (`funcbench.toml` in the current directory, or an explicit path),
//! 3. `FUNCBENCH__<SECTION>__<KEY>` environment variables.
//!
//! The CLI applies its own flags on top of the loaded value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path};
use std::time::Duration;

/// Base name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "funcbench";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "FUNCBENCH";

/// Environment variable holding the GitHub API token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FuncbenchConfig {
    /// Benchmark execution settings.
    #[serde(default)]
    pub bench: BenchConfig,
    /// GitHub delivery settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Benchmark execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Benchmark name filter, anchored on both ends.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Minimum run time per benchmark (e.g. "1s", "500ms").
    #[serde(default = "default_bench_time")]
    pub bench_time: String,
    /// Wall-clock bound for one benchmark run; "0" disables it.
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Go toolchain binary.
    #[serde(default = "default_go_binary")]
    pub go_binary: String,
    /// Package pattern handed to `go test`.
    #[serde(default = "default_packages")]
    pub packages: String,
    /// Directory name of the secondary worktree, relative to the repository root.
    #[serde(default = "default_worktree_dir")]
    pub worktree_dir: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            bench_time: default_bench_time(),
            timeout: default_timeout(),
            go_binary: default_go_binary(),
            packages: default_packages(),
            worktree_dir: default_worktree_dir(),
        }
    }
}

impl BenchConfig {
    /// Parsed minimum run time.
    pub fn bench_time(&self) -> Result<Duration> {
        parse_duration(&self.bench_time)
    }

    /// Parsed timeout; `None` when disabled.
    pub fn timeout(&self) -> Result<Option<Duration>> {
        let timeout = parse_duration(&self.timeout)?;
        Ok((!timeout.is_zero()).then_some(timeout))
    }
}

/// Check that `dir` names a directory strictly below the repository root.
///
/// Empty, absolute and `..`-bearing values are rejected, as is `.` itself.
pub fn validate_worktree_dir(dir: &str) -> Result<()> {
    let path = Path::new(dir);
    let below_root = !dir.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)));
    if below_root {
        Ok(())
    } else {
        Err(Error::config(format!(
            "worktree_dir {:?} must be a relative path below the repository root",
            dir
        )))
    }
}

fn default_filter() -> String {
    ".*".to_string()
}
fn default_bench_time() -> String {
    "1s".to_string()
}
fn default_timeout() -> String {
    "2h".to_string()
}
fn default_go_binary() -> String {
    "go".to_string()
}
fn default_packages() -> String {
    "./...".to_string()
}
fn default_worktree_dir() -> String {
    "_funcbench-cmp".to_string()
}

/// GitHub delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner or organisation.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Repository name.
    #[serde(default = "default_repo")]
    pub repo: String,
    /// Pull request to benchmark and comment on. Selects the automated environment.
    #[serde(default)]
    pub pr: Option<u64>,
    /// Log comments instead of posting them.
    #[serde(default)]
    pub dry_run: bool,
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API token; falls back to `GITHUB_TOKEN`.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            pr: None,
            dry_run: false,
            api_url: default_api_url(),
            token: None,
        }
    }
}

impl GitHubConfig {
    /// Token from the config, or from the `GITHUB_TOKEN` environment variable.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(GITHUB_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }
}

fn default_owner() -> String {
    "prometheus".to_string()
}
fn default_repo() -> String {
    "prometheus".to_string()
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::invalid_input(format!("unknown log format: {other}"))),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Stream command output and log at debug level.
    #[serde(default)]
    pub verbose: bool,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl FuncbenchConfig {
    /// Load from `path` (or `funcbench.toml` in the working directory when
    /// absent) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Self::load`], reading environment overrides from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let config = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that are well-formed but unsafe to act on.
    pub fn validate(&self) -> Result<()> {
        validate_worktree_dir(&self.bench.worktree_dir)
    }

    /// Parse a TOML document on its own, without file or environment lookup.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = ::config::Config::builder()
            .add_source(::config::File::from_str(content, ::config::FileFormat::Toml))
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration as a commented TOML document.
    pub fn default_toml() -> String {
        r#"# funcbench configuration

[bench]
# Benchmark name filter (RE2 syntax, anchored on both ends)
filter = ".*"
# Minimum run time per benchmark
bench_time = "1s"
# Wall-clock bound for one benchmark run, "0" disables it
timeout = "2h"
# Go toolchain binary
go_binary = "go"
# Package pattern passed to `go test`
packages = "./..."
# Secondary worktree directory, relative to the repository root
worktree_dir = "_funcbench-cmp"

[github]
owner = "prometheus"
repo = "prometheus"
# Pull request number (uncomment to run in automated mode)
# pr = 1234
# Log comments instead of posting them
dry_run = false
api_url = "https://api.github.com"

[logging]
verbose = false
# "text" or "json"
format = "text"
"#
        .to_string()
    }
}

/// Parse a duration such as `"3s"`, `"500ms"`, `"2h"` or `"1m30s"`.
///
/// A bare number is read as seconds; `"0"` is a zero duration.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::invalid_input("empty duration string"));
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num_part, after) = rest.split_at(num_end);
        if num_part.is_empty() {
            return Err(Error::invalid_input(format!("invalid duration: {s}")));
        }
        let value: f64 = num_part
            .parse()
            .map_err(|_| Error::invalid_input(format!("invalid duration number: {num_part}")))?;

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit_part, next) = after.split_at(unit_end);

        let multiplier: f64 = match unit_part {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" | "" => 1_000_000_000.0,
            "m" | "min" => 60_000_000_000.0,
            "h" => 3_600_000_000_000.0,
            other => {
                return Err(Error::invalid_input(format!("unknown duration unit: {other}")))
            }
        };
        total_nanos += value * multiplier;
        rest = next;
    }

    Ok(Duration::from_nanos(total_nanos as u64))
}

/// Format a duration the way Go's `time.ParseDuration` accepts it.
pub fn format_go_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else if d.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}ns", d.as_nanos())
    }
}
