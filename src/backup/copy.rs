use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use filetime::FileTime;

/// Copies `source` over `dest` and stamps `dest` with the source modification time, so the
/// next staleness check compares like with like.
pub fn copy_preserving_mtime(source: &Path, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mtime = fs::metadata(source)?.modified()?;
    let bytes = fs::copy(source, dest)?;
    set_mtime(dest, mtime)?;
    Ok(bytes)
}

/// Sets the modification time by path, so read-only files can be stamped too.
pub fn set_mtime(path: &Path, mtime: SystemTime) -> io::Result<()> {
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime))
}
