// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `plandag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "plandag",
    version,
    about = "Schedule plan steps as a dependency DAG and advance it from task events.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `PLANDAG_CONFIG` or `Plandag.toml` in the current
    /// directory is used when present, built-in defaults otherwise.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PLANDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Decompose steps into a plan, save it and print the first wave.
    Plan {
        #[arg(long)]
        session: String,

        /// The request the plan was made for.
        #[arg(long, default_value = "")]
        prompt: String,

        /// Plan step, in order. Repeat for each step.
        #[arg(long = "step", value_name = "TEXT", required = true)]
        steps: Vec<String>,

        /// Available agent. Repeat for each agent.
        #[arg(long = "agent", value_name = "NAME")]
        agents: Vec<String>,

        /// Print the schedule without saving it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Read a hook payload from stdin and advance the session's plan.
    Event {
        #[arg(long)]
        session: String,
    },

    /// Print the current directive for a session.
    Directive {
        #[arg(long)]
        session: String,
    },

    /// Print per-node status and counts for a session.
    Status {
        #[arg(long)]
        session: String,
    },

    /// Remove stale session state files.
    Cleanup {
        /// Override `[state] max_age_days`.
        #[arg(long, value_name = "DAYS")]
        max_age_days: Option<u64>,
    },

    /// Check a delegation chain for repeated agents, or a set of
    /// delegation edges for a cycle.
    CheckChain {
        #[arg(value_name = "A,B,C", required_unless_present = "edges")]
        chain: Option<String>,

        /// Delegation edges such as `ceo>lead,lead>ceo`.
        #[arg(long, value_name = "P>C,...", conflicts_with = "chain")]
        edges: Option<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
