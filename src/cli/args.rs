use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "osu-backup", version, about = "Mirror, archive and upload osu! user data on a schedule")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the scheduler loop (default)
    Run,
    /// Reconcile the mirror once
    Backup,
    /// Archive the mirror once
    Archive,
    /// Upload local archives once
    Sync,
    /// Delete local archives once
    Cleanup,
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Write the default config file
    Init(InitArgs),
    /// Print the resolved config
    Show,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    #[arg(long)]
    pub force: bool,
}
