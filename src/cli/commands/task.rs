use tracing::{error, info};

use crate::config::model::RuntimeConfig;
use crate::error::Result;
use crate::remote::open_store;
use crate::schedule::SystemClock;
use crate::service::Service;
use crate::types::{RunMode, TaskKind};

/// Runs a single task now, ignoring the schedule and the disabled list.
pub fn run_once(cfg: RuntimeConfig, run_mode: RunMode, kind: TaskKind) -> Result<()> {
    let remote = if kind == TaskKind::Sync {
        open_store(&cfg.remote)?
    } else {
        None
    };
    let mut service = Service::new(cfg, run_mode, remote, SystemClock);
    match service.run_task(kind) {
        Ok(()) => {
            info!("task {} finished", kind);
            Ok(())
        }
        Err(err) => {
            error!("task {} failed: {}", kind, err);
            Err(err)
        }
    }
}
