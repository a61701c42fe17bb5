use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::model::RuntimeConfig;
use crate::error::Result;
use crate::remote::open_store;
use crate::schedule::SystemClock;
use crate::service::Service;
use crate::signal_handler::signal_handler;
use crate::types::{RunMode, TaskKind};

pub fn run_service(cfg: RuntimeConfig, run_mode: RunMode) -> Result<()> {
    let remote = if cfg.is_enabled(TaskKind::Sync) {
        open_store(&cfg.remote)?
    } else {
        None
    };
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_handler(&shutdown);
    let mut service = Service::new(cfg, run_mode, remote, SystemClock);
    service.run(&shutdown);
    Ok(())
}
