use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::backup::copy::copy_preserving_mtime;
use crate::error::{RemoteError, Result};
use crate::remote::{RemoteEntry, RemoteStore, FOLDER_MIME, ZIP_MIME};
use crate::util::paths::is_safe_component;

const OCTET_MIME: &str = "application/octet-stream";

/// A local directory standing in for the remote root, such as a folder kept in sync by a
/// desktop cloud client. Folder ids are folder names; file ids are `folder/name`.
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        let mut parts = 0;
        for part in id.split('/') {
            if !is_safe_component(part) {
                return Err(RemoteError::Invalid(format!("id {:?} is not valid", id)).into());
            }
            path.push(part);
            parts += 1;
        }
        if parts > 2 {
            return Err(RemoteError::Invalid(format!("id {:?} is nested too deep", id)).into());
        }
        Ok(path)
    }

    fn entries(&self, dir: &Path, prefix: Option<&str>) -> Result<Vec<RemoteEntry>> {
        let read = match fs::read_dir(dir) {
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(RemoteError::storage(dir, err).into()),
        };
        let mut out = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| RemoteError::storage(dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let ft = entry
                .file_type()
                .map_err(|e| RemoteError::storage(&entry.path(), e))?;
            let mime_type = if ft.is_dir() {
                FOLDER_MIME
            } else if name.ends_with(".zip") {
                ZIP_MIME
            } else {
                OCTET_MIME
            };
            let id = match prefix {
                Some(prefix) => format!("{}/{}", prefix, name),
                None => name.clone(),
            };
            out.push(RemoteEntry {
                id,
                title: name,
                mime_type: mime_type.to_string(),
            });
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}

impl RemoteStore for DirectoryStore {
    fn list_root(&self) -> Result<Vec<RemoteEntry>> {
        self.entries(&self.root, None)
    }

    fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        let dir = self.resolve(folder_id)?;
        self.entries(&dir, Some(folder_id))
    }

    fn create_folder(&mut self, name: &str) -> Result<String> {
        let dir = self.resolve(name)?;
        fs::create_dir_all(&dir).map_err(|e| RemoteError::storage(&dir, e))?;
        Ok(name.to_string())
    }

    fn upload(&mut self, local: &Path, name: &str, folder_id: &str) -> Result<RemoteEntry> {
        let folder = self.resolve(folder_id)?;
        if !folder.is_dir() {
            return Err(RemoteError::Invalid(format!("folder {} not found", folder_id)).into());
        }
        if !is_safe_component(name) {
            return Err(RemoteError::Invalid(format!("file name {:?} is not valid", name)).into());
        }
        let dest = folder.join(name);
        copy_preserving_mtime(local, &dest).map_err(|e| RemoteError::storage(&dest, e))?;
        Ok(RemoteEntry {
            id: format!("{}/{}", folder_id, name),
            title: name.to_string(),
            mime_type: ZIP_MIME.to_string(),
        })
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let path = self.resolve(id)?;
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| RemoteError::storage(&path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;
    use tempfile::TempDir;

    #[test]
    fn folder_lifecycle() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = DirectoryStore::new(dir.path().join("cloud"));
        assert!(store.list_root().expect("empty root").is_empty());

        let id = store.create_folder("osu!backup").expect("create");
        let root = store.list_root().expect("root");
        assert_eq!(root.len(), 1);
        assert!(root[0].is_folder());
        assert_eq!(root[0].id, id);

        let local = dir.path().join("backup-2024-01-01.zip");
        fs::write(&local, "zip bytes").expect("write");
        let entry = store
            .upload(&local, "backup-2024-01-01.zip", &id)
            .expect("upload");
        assert_eq!(entry.id, "osu!backup/backup-2024-01-01.zip");
        let files = store.list_folder(&id).expect("list");
        assert_eq!(files, vec![entry.clone()]);

        store.delete(&entry.id).expect("delete");
        assert!(store.list_folder(&id).expect("list").is_empty());
    }

    #[test]
    fn rejects_escaping_ids() {
        let dir = TempDir::new().expect("tempdir");
        let store = DirectoryStore::new(dir.path().to_path_buf());
        assert!(store.list_folder("../etc").is_err());
        assert!(store.list_folder("a/b/c").is_err());
    }

    #[test]
    fn filesystem_failures_are_remote_errors() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = DirectoryStore::new(dir.path().join("cloud"));
        let id = store.create_folder("osu!backup").expect("create");

        let err = store
            .delete("osu!backup/backup-2024-01-01.zip")
            .expect_err("missing file");
        assert!(matches!(err, BackupError::Remote(RemoteError::Storage { .. })));
        let err = store
            .upload(&dir.path().join("missing.zip"), "backup-2024-01-01.zip", &id)
            .expect_err("missing local archive");
        assert!(matches!(err, BackupError::Remote(_)));
    }
}
