use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::archive::cleanup::cleanup_local_archives;
use crate::archive::{create_archive, ArchiveName};
use crate::backup::reconcile;
use crate::config::model::RuntimeConfig;
use crate::error::Result;
use crate::remote::sync::SyncClient;
use crate::remote::RemoteStore;
use crate::schedule::{Clock, Scheduler};
use crate::types::{RunMode, TaskKind};

const TASK_ORDER: [TaskKind; 4] = [
    TaskKind::Backup,
    TaskKind::Archive,
    TaskKind::Sync,
    TaskKind::Cleanup,
];
const SLEEP_STEP: Duration = Duration::from_secs(1);

/// Owns everything a scheduled run needs. Tasks execute one at a time on the calling
/// thread.
pub struct Service<C: Clock> {
    config: RuntimeConfig,
    run_mode: RunMode,
    remote: Option<Box<dyn RemoteStore>>,
    scheduler: Scheduler,
    clock: C,
}

impl<C: Clock> Service<C> {
    pub fn new(
        config: RuntimeConfig,
        run_mode: RunMode,
        remote: Option<Box<dyn RemoteStore>>,
        clock: C,
    ) -> Self {
        let now = clock.now();
        let mut scheduler = Scheduler::new();
        for kind in TASK_ORDER {
            if config.is_enabled(kind) {
                scheduler.every(kind, config.intervals.for_task(kind), now);
            } else {
                info!("task {} disabled by config", kind);
            }
        }
        Self {
            config,
            run_mode,
            remote,
            scheduler,
            clock,
        }
    }

    pub fn run_task(&mut self, kind: TaskKind) -> Result<()> {
        debug!("running task {}", kind);
        match kind {
            TaskKind::Backup => {
                reconcile(&self.config, self.run_mode)?;
            }
            TaskKind::Archive => {
                self.archive()?;
            }
            TaskKind::Sync => self.sync()?,
            TaskKind::Cleanup => {
                let removed = cleanup_local_archives(&self.config.archive_dir, self.run_mode)?;
                info!("local archive cleanup removed {} file(s)", removed);
            }
        }
        Ok(())
    }

    /// Runs every due task to completion. A failing task is logged and does not prevent
    /// the others from running.
    pub fn run_pending(&mut self) -> Vec<(TaskKind, bool)> {
        let due = self.scheduler.due(self.clock.now());
        let mut results = Vec::with_capacity(due.len());
        for kind in due {
            let ok = self.run_logged(kind);
            results.push((kind, ok));
        }
        results
    }

    /// Backs up once, then polls the scheduler until `shutdown` is raised.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!("started running");
        if self.config.is_enabled(TaskKind::Backup) {
            self.run_logged(TaskKind::Backup);
        }
        while !shutdown.load(Ordering::SeqCst) {
            self.run_pending();
            if let Some(next) = self.scheduler.next_run() {
                debug!("next task due at {}", next.format("%Y-%m-%d %H:%M:%S"));
            }
            sleep_unless_shutdown(self.config.intervals.poll, shutdown);
        }
        info!("stopped");
    }

    fn run_logged(&mut self, kind: TaskKind) -> bool {
        match self.run_task(kind) {
            Ok(()) => true,
            Err(err) => {
                error!("task {} failed: {}", kind, err);
                false
            }
        }
    }

    fn archive(&self) -> Result<Option<PathBuf>> {
        let date = self.clock.now().date_naive();
        if self.run_mode.dry_run {
            info!(
                "dry-run: would archive {} into {}",
                self.config.backup_path.display(),
                self.config
                    .archive_dir
                    .join(ArchiveName::for_date(date).as_str())
                    .display()
            );
            return Ok(None);
        }
        let exclude: Vec<PathBuf> = self
            .config
            .remote
            .settings_file
            .strip_prefix(&self.config.backup_path)
            .map(|rel| vec![rel.to_path_buf()])
            .unwrap_or_default();
        let path = create_archive(
            &self.config.backup_path,
            &self.config.archive_dir,
            date,
            &exclude,
        )?;
        info!("successfully created archive {}", path.display());
        Ok(Some(path))
    }

    fn sync(&mut self) -> Result<()> {
        let Some(store) = self.remote.as_deref_mut() else {
            info!("remote sync disabled; skipping");
            return Ok(());
        };
        if self.run_mode.dry_run {
            info!(
                "dry-run: would upload archives from {} to remote folder {}",
                self.config.archive_dir.display(),
                self.config.remote.folder_name
            );
            return Ok(());
        }
        let report =
            SyncClient::new(store, &self.config.remote, &self.config.archive_dir).sync()?;
        info!("sync finished: {}", report);
        Ok(())
    }
}

fn sleep_unless_shutdown(total: Duration, shutdown: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !shutdown.load(Ordering::SeqCst) {
        let step = remaining.min(SLEEP_STEP);
        thread::sleep(step);
        remaining -= step;
    }
}
