use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::backup::copy::copy_preserving_mtime;
use crate::config::model::RuntimeConfig;
use crate::error::{BackupError, Result};
use crate::types::RunMode;

pub mod copy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Missing,
    Stale,
    Current,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub copied: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copied, {} updated, {} removed, {} unchanged, {} failed",
            self.copied, self.updated, self.removed, self.unchanged, self.failed
        )
    }
}

/// True when `source` is newer than `mirror` by strictly more than `threshold`.
pub fn is_newer_by(source: SystemTime, mirror: SystemTime, threshold: Duration) -> bool {
    match source.duration_since(mirror) {
        Ok(delta) => delta > threshold,
        Err(_) => false,
    }
}

pub fn entry_state(source: &Path, mirror: &Path, threshold: Duration) -> io::Result<EntryState> {
    let mirror_meta = match fs::metadata(mirror) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(EntryState::Missing),
        Err(err) => return Err(err),
    };
    let source_mtime = fs::metadata(source)?.modified()?;
    if is_newer_by(source_mtime, mirror_meta.modified()?, threshold) {
        Ok(EntryState::Stale)
    } else {
        Ok(EntryState::Current)
    }
}

/// Brings the mirror in line with the tracked files and directories. Item failures are
/// logged and counted; only failing to create the mirror itself is an error.
pub fn reconcile(config: &RuntimeConfig, run_mode: RunMode) -> Result<ReconcileReport> {
    ensure_mirror_dir(&config.backup_path, run_mode)?;
    let mut reconciler = Reconciler {
        config,
        run_mode,
        report: ReconcileReport::default(),
    };
    for name in &config.files {
        reconciler.backup_file(name);
    }
    for name in &config.directories {
        reconciler.backup_directory(name);
    }
    for name in &config.directories {
        reconciler.prune_directory(name);
    }
    info!("backup finished: {}", reconciler.report);
    Ok(reconciler.report)
}

fn ensure_mirror_dir(path: &Path, run_mode: RunMode) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if run_mode.dry_run {
        info!("dry-run: would create backup directory at {}", path.display());
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| {
        error!("failed to create backup directory {}: {}", path.display(), e);
        BackupError::message(format!("create {}: {}", path.display(), e))
    })?;
    info!("created backup directory at {}", path.display());
    Ok(())
}

struct Reconciler<'a> {
    config: &'a RuntimeConfig,
    run_mode: RunMode,
    report: ReconcileReport,
}

impl Reconciler<'_> {
    fn backup_file(&mut self, name: &str) {
        let source = self.config.source_root.join(name);
        let mirror = self.config.backup_path.join(name);
        if let Err(err) = self.sync_entry(&source, &mirror, name) {
            error!("could not back up {}: {}", name, err);
            self.report.failed += 1;
        }
    }

    fn backup_directory(&mut self, name: &str) {
        let source = self.config.source_root.join(name);
        let mirror = self.config.backup_path.join(name);
        if !source.is_dir() {
            error!(
                "could not back up {}: source directory {} missing",
                name,
                source.display()
            );
            self.report.failed += 1;
            return;
        }
        let initial = !mirror.exists();

        for entry in WalkDir::new(&source).follow_links(false).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!("could not back up entry in {}: {}", name, err);
                    self.report.failed += 1;
                    continue;
                }
            };
            let rel = match entry.path().strip_prefix(&source) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let label = Path::new(name).join(rel);
            let label = label.to_string_lossy();
            let target = mirror.join(rel);
            let ft = entry.file_type();
            if ft.is_symlink() {
                debug!("skip symlink {}", entry.path().display());
                continue;
            }
            if ft.is_dir() {
                if !target.exists() && !self.run_mode.dry_run {
                    if let Err(err) = fs::create_dir_all(&target) {
                        error!("could not create {}: {}", target.display(), err);
                        self.report.failed += 1;
                    }
                }
                continue;
            }
            if let Err(err) = self.sync_entry(entry.path(), &target, &label) {
                error!("could not back up {}: {}", label, err);
                self.report.failed += 1;
            }
        }

        if initial && !self.run_mode.dry_run {
            if let Err(err) = fs::create_dir_all(&mirror) {
                error!("could not create {}: {}", mirror.display(), err);
                self.report.failed += 1;
                return;
            }
            info!("initial backup successful: {}", name);
        }
    }

    /// Removes mirror entries of a tracked directory whose source counterpart is gone.
    fn prune_directory(&mut self, name: &str) {
        let source = self.config.source_root.join(name);
        let mirror = self.config.backup_path.join(name);
        if !source.is_dir() {
            warn!("skip pruning {}: source directory missing", name);
            return;
        }
        if !mirror.is_dir() {
            return;
        }

        for entry in WalkDir::new(&mirror)
            .follow_links(false)
            .min_depth(1)
            .contents_first(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!("could not scan mirror of {}: {}", name, err);
                    self.report.failed += 1;
                    continue;
                }
            };
            let rel = match entry.path().strip_prefix(&mirror) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            match fs::symlink_metadata(source.join(rel)) {
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    error!("could not check {}/{}: {}", name, rel.display(), err);
                    self.report.failed += 1;
                    continue;
                }
            }

            if entry.file_type().is_dir() {
                if self.run_mode.dry_run {
                    continue;
                }
                match fs::remove_dir(entry.path()) {
                    Ok(()) => debug!("removed directory {}/{}", name, rel.display()),
                    Err(err) => {
                        error!("could not remove directory {}/{}: {}", name, rel.display(), err)
                    }
                }
                continue;
            }

            if self.run_mode.dry_run {
                info!("dry-run: would remove {} from {}", rel.display(), name);
                self.report.removed += 1;
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    info!("successfully removed {} from {}", rel.display(), name);
                    self.report.removed += 1;
                }
                Err(err) => {
                    error!("could not remove {} in {}: {}", rel.display(), name, err);
                    self.report.failed += 1;
                }
            }
        }
    }

    fn sync_entry(&mut self, source: &Path, mirror: &Path, label: &str) -> io::Result<()> {
        let state = entry_state(source, mirror, self.config.mtime_threshold)?;
        if state == EntryState::Current {
            self.report.unchanged += 1;
            return Ok(());
        }
        if self.run_mode.dry_run {
            info!("dry-run: would copy {} to {}", source.display(), mirror.display());
        } else {
            copy_preserving_mtime(source, mirror)?;
        }
        match state {
            EntryState::Missing => {
                info!("initial backup successful: {}", label);
                self.report.copied += 1;
            }
            _ => {
                info!("backup successful: {}", label);
                self.report.updated += 1;
            }
        }
        Ok(())
    }
}
