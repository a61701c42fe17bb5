use std::path::Path;

use crate::cli::args::ConfigCommand;
use crate::config::load::{default_config, resolve_config, DEFAULT_CONFIG_FILE};
use crate::config::model::{RemoteKind, RuntimeConfig};
use crate::config::save::save_config;
use crate::error::Result;
use crate::types::TaskKind;

pub fn run_config_command(path: Option<&Path>, command: &ConfigCommand, user: &str) -> Result<()> {
    match command {
        ConfigCommand::Init(args) => {
            let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
            save_config(path, &default_config(), args.force)?;
            println!("wrote {}", path.display());
        }
        ConfigCommand::Show => {
            let cfg = resolve_config(path, user)?;
            print_config(&cfg);
        }
    }
    Ok(())
}

fn print_config(cfg: &RuntimeConfig) {
    let list = |items: &[String]| {
        if items.is_empty() {
            "<none>".to_string()
        } else {
            items.join(", ")
        }
    };
    let remote = match &cfg.remote.kind {
        RemoteKind::Drive { token_env } => format!("drive (token from ${})", token_env),
        RemoteKind::Directory { root } => format!("directory {}", root.display()),
        RemoteKind::None => "none".to_string(),
    };
    let minutes = |kind: TaskKind| {
        if cfg.is_enabled(kind) {
            format!("every {} min", cfg.intervals.for_task(kind).as_secs() / 60)
        } else {
            "disabled".to_string()
        }
    };
    println!("source: {}", cfg.source_root.display());
    println!("mirror: {}", cfg.backup_path.display());
    println!("archives: {}", cfg.archive_dir.display());
    println!("log file: {}", cfg.log_file.display());
    println!("files: {}", list(&cfg.files));
    println!("directories: {}", list(&cfg.directories));
    println!("mtime threshold: {} ms", cfg.mtime_threshold.as_millis());
    println!("remote: {}", remote);
    println!("  folder: {}", cfg.remote.folder_name);
    println!("  settings file: {}", cfg.remote.settings_file.display());
    for kind in [
        TaskKind::Backup,
        TaskKind::Archive,
        TaskKind::Sync,
        TaskKind::Cleanup,
    ] {
        println!("{}: {}", kind, minutes(kind));
    }
    println!("poll: every {} s", cfg.intervals.poll.as_secs());
}
