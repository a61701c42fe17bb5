use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::archive::list_local_archives;
use crate::error::Result;
use crate::types::RunMode;

/// Deletes every local archive artifact in `dir`. A file that cannot be removed is logged
/// and left in place. Returns how many were removed.
pub fn cleanup_local_archives(dir: &Path, run_mode: RunMode) -> Result<usize> {
    let mut removed = 0usize;
    for path in list_local_archives(dir)? {
        if run_mode.dry_run {
            info!("dry-run: would remove local archive {}", path.display());
            removed += 1;
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("removed local archive {}", path.display());
                removed += 1;
            }
            Err(err) => error!("could not remove local archive {}: {}", path.display(), err),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn removes_only_archives() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("backup-2024-01-01.zip"), "a").expect("write");
        fs::write(dir.path().join("backup-2024-01-02.zip"), "b").expect("write");
        fs::write(dir.path().join("scores.db"), "keep").expect("write");

        let dry = RunMode {
            dry_run: true,
            verbose: false,
        };
        assert_eq!(cleanup_local_archives(dir.path(), dry).expect("dry"), 2);
        assert!(dir.path().join("backup-2024-01-01.zip").exists());

        assert_eq!(
            cleanup_local_archives(dir.path(), RunMode::default()).expect("cleanup"),
            2
        );
        assert!(!dir.path().join("backup-2024-01-01.zip").exists());
        assert!(dir.path().join("scores.db").exists());
        assert_eq!(
            cleanup_local_archives(dir.path(), RunMode::default()).expect("again"),
            0
        );
    }
}
