use std::fs;
use std::io;
use std::path::Path;

use crate::error::{BackupError, Result};

/// Reads the persisted remote folder id. A missing or blank file means no folder is known.
pub fn read_reference(path: &Path) -> Result<Option<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(BackupError::message(format!(
                "read {}: {}",
                path.display(),
                err
            )))
        }
    };
    let id = contents.lines().next().unwrap_or("").trim();
    if id.is_empty() {
        Ok(None)
    } else {
        Ok(Some(id.to_string()))
    }
}

pub fn write_reference(path: &Path, id: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| BackupError::message(format!("create {}: {}", parent.display(), e)))?;
        }
    }
    fs::write(path, id)
        .map_err(|e| BackupError::message(format!("write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reference_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("osu!backup/drive_settings.txt");
        assert_eq!(read_reference(&path).expect("read"), None);
        write_reference(&path, "1AbCdEf").expect("write");
        assert_eq!(read_reference(&path).expect("read"), Some("1AbCdEf".to_string()));
    }

    #[test]
    fn only_first_line_counts() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("drive_settings.txt");
        fs::write(&path, "  folder-1 \nignored\n").expect("write");
        assert_eq!(read_reference(&path).expect("read"), Some("folder-1".to_string()));
        fs::write(&path, "\n").expect("write");
        assert_eq!(read_reference(&path).expect("read"), None);
    }
}
