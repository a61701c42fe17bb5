use std::cell::Cell;
use std::path::Path;

use crate::error::{RemoteError, Result};
use crate::remote::{RemoteEntry, RemoteStore, FOLDER_MIME, ZIP_MIME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    CreateFolder(String),
    Upload(String),
    Delete(String),
}

/// In-memory store that records every mutating call.
#[derive(Default)]
pub struct MemoryStore {
    pub folders: Vec<RemoteEntry>,
    pub files: Vec<(String, RemoteEntry)>,
    pub ops: Vec<Op>,
    pub hide_root: bool,
    pub fail_uploads: bool,
    next_id: Cell<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, id: &str, name: &str) -> Self {
        self.folders.push(RemoteEntry {
            id: id.to_string(),
            title: name.to_string(),
            mime_type: FOLDER_MIME.to_string(),
        });
        self
    }

    pub fn with_file(mut self, folder: &str, id: &str, name: &str) -> Self {
        self.files.push((
            folder.to_string(),
            RemoteEntry {
                id: id.to_string(),
                title: name.to_string(),
                mime_type: ZIP_MIME.to_string(),
            },
        ));
        self
    }

    pub fn titles_in(&self, folder: &str) -> Vec<String> {
        self.files
            .iter()
            .filter(|(parent, _)| parent == folder)
            .map(|(_, entry)| entry.title.clone())
            .collect()
    }

    fn fresh_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("gen-{}", id)
    }
}

impl RemoteStore for MemoryStore {
    fn list_root(&self) -> Result<Vec<RemoteEntry>> {
        if self.hide_root {
            return Ok(Vec::new());
        }
        Ok(self.folders.clone())
    }

    fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        Ok(self
            .files
            .iter()
            .filter(|(parent, _)| parent == folder_id)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn create_folder(&mut self, name: &str) -> Result<String> {
        let id = self.fresh_id();
        self.folders.push(RemoteEntry {
            id: id.clone(),
            title: name.to_string(),
            mime_type: FOLDER_MIME.to_string(),
        });
        self.ops.push(Op::CreateFolder(name.to_string()));
        Ok(id)
    }

    fn upload(&mut self, _local: &Path, name: &str, folder_id: &str) -> Result<RemoteEntry> {
        if self.fail_uploads {
            return Err(RemoteError::Status {
                status: 500,
                body: "backend error".to_string(),
            }
            .into());
        }
        let entry = RemoteEntry {
            id: self.fresh_id(),
            title: name.to_string(),
            mime_type: ZIP_MIME.to_string(),
        };
        self.files.push((folder_id.to_string(), entry.clone()));
        self.ops.push(Op::Upload(name.to_string()));
        Ok(entry)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.files.retain(|(_, entry)| entry.id != id);
        self.folders.retain(|entry| entry.id != id);
        self.ops.push(Op::Delete(id.to_string()));
        Ok(())
    }
}
