pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod filter;
pub mod merge;
pub mod permissions;
pub mod projection;
pub mod render;
pub mod snapshot;
pub mod sort;
pub mod status;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting worklens CLI");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let snapshot_path = config::resolve_snapshot_path(&cfg, cli.snapshot.as_deref());
    let store = snapshot::SnapshotStore::open(&snapshot_path);

    let viewer = config::resolve_viewer(&cfg, cli.viewer.as_deref())?;

    let now = Utc::now();
    let today = match cli.today.as_deref() {
        Some(expr) => datetime::parse_today_expr(expr, now)
            .context("failed to parse --today expression")?,
        None => datetime::today_in_project(now),
    };

    let command = cli.command.unwrap_or_else(|| default_command(&cfg));
    debug!(?command, %today, "resolved invocation");

    let mut renderer = render::Renderer::new(&cfg)?;
    commands::dispatch(&store, &mut renderer, command, &viewer, today)?;

    info!("done");
    Ok(())
}

fn default_command(cfg: &config::Config) -> cli::Command {
    match cfg.get("default.command").as_deref() {
        Some("assigned") => cli::Command::Assigned(cli::ListArgs::default()),
        _ => cli::Command::Mine(cli::ListArgs::default()),
    }
}
