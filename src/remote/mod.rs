use std::path::Path;

use serde::Deserialize;

use crate::config::model::{RemoteKind, RemoteSettings};
use crate::error::Result;

pub mod directory;
pub mod drive;
#[cfg(test)]
pub mod memory;
pub mod settings;
pub mod sync;

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const ZIP_MIME: &str = "application/zip";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl RemoteEntry {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    pub fn is_zip(&self) -> bool {
        self.mime_type == ZIP_MIME
    }
}

/// The operations the sync client needs from a cloud store. Listings return every entry,
/// following pagination, and exclude trashed items.
pub trait RemoteStore {
    fn list_root(&self) -> Result<Vec<RemoteEntry>>;
    fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteEntry>>;
    fn create_folder(&mut self, name: &str) -> Result<String>;
    fn upload(&mut self, local: &Path, name: &str, folder_id: &str) -> Result<RemoteEntry>;
    fn delete(&mut self, id: &str) -> Result<()>;
}

/// Builds the configured backend, or `None` when remote sync is turned off.
pub fn open_store(settings: &RemoteSettings) -> Result<Option<Box<dyn RemoteStore>>> {
    match &settings.kind {
        RemoteKind::Drive { token_env } => Ok(Some(Box::new(drive::DriveStore::from_env(
            token_env,
            settings.timeout,
        )?))),
        RemoteKind::Directory { root } => {
            Ok(Some(Box::new(directory::DirectoryStore::new(root.clone()))))
        }
        RemoteKind::None => Ok(None),
    }
}
