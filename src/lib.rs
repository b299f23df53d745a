// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod plan;
pub mod store;
pub mod types;

use std::io::{self, Read};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_effective;
use crate::dag::chain::{check_edges, parse_chain, parse_edges, validate_chain};
use crate::engine::{HookInput, Orchestrator};

/// High-level entry point used by `main.rs`.
///
/// Loads the effective config, builds the [`Orchestrator`] and runs one
/// subcommand. Results are printed to stdout as JSON.
pub fn run(args: CliArgs) -> Result<()> {
    run_with_input(args, io::stdin())
}

/// [`run`] with the hook payload for `event` read from `input`.
pub fn run_with_input<R: Read>(args: CliArgs, mut input: R) -> Result<()> {
    let cfg = load_effective(args.config.as_deref()).context("loading configuration")?;
    let orchestrator = Orchestrator::from_config(&cfg)?;
    debug!(dir = ?orchestrator.store().dir(), "state store ready");

    match args.command {
        Command::Plan {
            session,
            prompt,
            steps,
            agents,
            dry_run,
        } => {
            let outcome = if dry_run {
                orchestrator.preview(&session, &prompt, &steps, &agents)?
            } else {
                orchestrator.plan(&session, &prompt, &steps, &agents)?
            };
            print_json(&outcome)
        }
        Command::Event { session } => {
            let mut raw = String::new();
            input
                .read_to_string(&mut raw)
                .context("reading hook payload from stdin")?;

            // A payload we cannot parse is not ours to act on.
            let hook: HookInput = match serde_json::from_str(&raw) {
                Ok(hook) => hook,
                Err(e) => {
                    warn!(error = %e, "ignoring malformed hook payload");
                    return Ok(());
                }
            };

            // Scheduler faults degrade to no directive.
            match orchestrator.handle_event(&session, &hook.tool_name, &hook.tool_input) {
                Ok(Some(advance)) => print_json(&advance),
                Ok(None) => Ok(()),
                Err(e) => {
                    warn!(session = %session, error = %e, "scheduler fault; no directive");
                    Ok(())
                }
            }
        }
        Command::Directive { session } => print_json(&orchestrator.directive(&session)?),
        Command::Status { session } => print_json(&orchestrator.status(&session)?),
        Command::Cleanup { max_age_days } => {
            let removed = orchestrator.cleanup(max_age_days)?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        Command::CheckChain { chain, edges } => match (chain, edges) {
            (_, Some(edges)) => print_json(&check_edges(&parse_edges(&edges)?)),
            (Some(chain), None) => print_json(&validate_chain(&parse_chain(&chain))),
            (None, None) => anyhow::bail!("check-chain needs a chain or --edges"),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}
