use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::archive::list_local_archives;
use crate::config::model::RemoteSettings;
use crate::error::{BackupError, Result};
use crate::remote::settings::{read_reference, write_reference};
use crate::remote::{RemoteEntry, RemoteStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub folder_id: String,
    pub uploaded: Vec<String>,
    pub replaced: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} archive(s) uploaded to folder {} ({} replaced)",
            self.uploaded.len(),
            self.folder_id,
            self.replaced
        )
    }
}

pub struct SyncClient<'a> {
    store: &'a mut dyn RemoteStore,
    settings: &'a RemoteSettings,
    archive_dir: &'a Path,
}

impl<'a> SyncClient<'a> {
    pub fn new(
        store: &'a mut dyn RemoteStore,
        settings: &'a RemoteSettings,
        archive_dir: &'a Path,
    ) -> Self {
        Self {
            store,
            settings,
            archive_dir,
        }
    }

    /// Returns the id of the remote folder, finding or creating it and persisting the id
    /// when no usable reference is stored.
    pub fn resolve_folder(&mut self) -> Result<String> {
        let listing = self.store.list_root()?;
        let reference = read_reference(&self.settings.settings_file)?;
        if let Some(id) = reference {
            if listing.is_empty() || listing.iter().any(|entry| entry.id == id) {
                debug!("using remote folder {}", id);
                return Ok(id);
            }
            warn!(
                "remote folder {} not found in listing; resolving {} by name",
                id, self.settings.folder_name
            );
        }
        let id = match find_folder(&listing, &self.settings.folder_name) {
            Some(entry) => {
                info!("found remote folder {} ({})", entry.title, entry.id);
                entry.id.clone()
            }
            None => {
                let id = self.store.create_folder(&self.settings.folder_name)?;
                info!("created remote folder {} ({})", self.settings.folder_name, id);
                id
            }
        };
        write_reference(&self.settings.settings_file, &id)?;
        info!(
            "saved remote folder reference to {}",
            self.settings.settings_file.display()
        );
        Ok(id)
    }

    /// Uploads every local archive, deleting same-named remote archives first.
    pub fn sync(&mut self) -> Result<SyncReport> {
        let folder_id = self.resolve_folder()?;
        let mut report = SyncReport {
            folder_id: folder_id.clone(),
            ..SyncReport::default()
        };
        let archives = list_local_archives(self.archive_dir)?;
        if archives.is_empty() {
            info!("no local archives to upload in {}", self.archive_dir.display());
            return Ok(report);
        }
        for path in archives {
            let name = remote_name(&path)?;
            let existing = self.store.list_folder(&folder_id)?;
            for stale in existing
                .iter()
                .filter(|entry| entry.is_zip() && entry.title == name)
            {
                self.store.delete(&stale.id)?;
                info!("deleted remote copy of {} ({})", name, stale.id);
                report.replaced += 1;
            }
            let entry = self.store.upload(&path, &name, &folder_id)?;
            info!("uploaded {} ({})", name, entry.id);
            report.uploaded.push(name);
        }
        Ok(report)
    }
}

fn find_folder<'e>(listing: &'e [RemoteEntry], name: &str) -> Option<&'e RemoteEntry> {
    listing
        .iter()
        .find(|entry| entry.is_folder() && entry.title == name)
}

fn remote_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .ok_or_else(|| BackupError::message(format!("{} has no file name", path.display())))
}
