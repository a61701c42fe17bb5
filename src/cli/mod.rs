use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{config, run, task};
use crate::config::load::resolve_config;
use crate::logging::init_logging;
use crate::types::{RunMode, TaskKind};
use crate::util::paths::login_name;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let run_mode = RunMode {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };
    let user = login_name();
    let command = cli.command.clone().unwrap_or(Command::Run);

    if let Command::Config { command } = &command {
        config::run_config_command(cli.config.as_deref(), command, &user)?;
        return Ok(());
    }

    let cfg = resolve_config(cli.config.as_deref(), &user)?;
    let _guard = init_logging(&cfg.log_file, run_mode.verbose)?;
    info!("osu-backup {} (user {})", VERSION, user);
    if run_mode.dry_run {
        info!("dry-run: no files will be written or uploaded");
    }

    match command {
        Command::Run => run::run_service(cfg, run_mode)?,
        Command::Backup => task::run_once(cfg, run_mode, TaskKind::Backup)?,
        Command::Archive => task::run_once(cfg, run_mode, TaskKind::Archive)?,
        Command::Sync => task::run_once(cfg, run_mode, TaskKind::Sync)?,
        Command::Cleanup => task::run_once(cfg, run_mode, TaskKind::Cleanup)?,
        Command::Config { .. } => {}
    }
    Ok(())
}
