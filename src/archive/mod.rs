use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{BackupError, Result};

pub mod cleanup;

pub const ARCHIVE_PREFIX: &str = "backup-";
pub const ARCHIVE_SUFFIX: &str = ".zip";
const TEMP_PREFIX: &str = ".backup-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName(String);

impl ArchiveName {
    pub fn for_date(date: NaiveDate) -> Self {
        ArchiveName(format!(
            "{}{}{}",
            ARCHIVE_PREFIX,
            date.format("%Y-%m-%d"),
            ARCHIVE_SUFFIX
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_archive_name(name: &str) -> bool {
    name.len() > ARCHIVE_PREFIX.len() + ARCHIVE_SUFFIX.len()
        && name.starts_with(ARCHIVE_PREFIX)
        && name.ends_with(ARCHIVE_SUFFIX)
}

/// Zips everything under `mirror` into `archive_dir/backup-<date>.zip`, replacing an
/// archive already written that day. Paths in `exclude` are relative to `mirror`.
/// When `archive_dir` lies inside the mirror, earlier archives and the in-progress temp
/// file are left out.
pub fn create_archive(
    mirror: &Path,
    archive_dir: &Path,
    date: NaiveDate,
    exclude: &[PathBuf],
) -> Result<PathBuf> {
    if !mirror.is_dir() {
        return Err(BackupError::message(format!(
            "backup directory {} missing",
            mirror.display()
        )));
    }
    fs::create_dir_all(archive_dir)
        .map_err(|e| BackupError::message(format!("create {}: {}", archive_dir.display(), e)))?;

    let archive_rel = nested_archive_dir(mirror, archive_dir)?;

    let name = ArchiveName::for_date(date);
    let dest = archive_dir.join(name.as_str());
    let tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(archive_dir)
        .map_err(|e| BackupError::message(format!("create temp archive: {}", e)))?;

    let mut zip = ZipWriter::new(tmp);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = 0usize;

    for entry in WalkDir::new(mirror)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| BackupError::message(format!("walk mirror: {}", e)))?;
        let rel = match entry.path().strip_prefix(mirror) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if exclude.iter().any(|skip| skip.as_path() == rel) {
            continue;
        }
        if let Some(archive_rel) = &archive_rel {
            let file_name = entry.file_name().to_string_lossy();
            if rel.parent() == Some(archive_rel.as_path())
                && (is_archive_name(&file_name) || file_name.starts_with(TEMP_PREFIX))
            {
                continue;
            }
        }
        let entry_name = zip_entry_name(rel);
        let ft = entry.file_type();
        if ft.is_dir() {
            zip.add_directory(entry_name.as_str(), options)
                .map_err(|e| BackupError::message(format!("archive {}: {}", entry_name, e)))?;
        } else if ft.is_file() {
            zip.start_file(entry_name.as_str(), options)
                .map_err(|e| BackupError::message(format!("archive {}: {}", entry_name, e)))?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
            entries += 1;
        } else {
            debug!("skip non-regular entry {}", entry.path().display());
        }
    }

    let tmp = zip
        .finish()
        .map_err(|e| BackupError::message(format!("finalize archive: {}", e)))?;
    tmp.persist(&dest)
        .map_err(|e| BackupError::message(format!("write {}: {}", dest.display(), e.error)))?;
    debug!("archived {} file(s) into {}", entries, dest.display());
    Ok(dest)
}

/// Location of `archive_dir` relative to `mirror`, or `None` when it is outside the mirror.
/// The mirror itself maps to an empty path.
fn nested_archive_dir(mirror: &Path, archive_dir: &Path) -> Result<Option<PathBuf>> {
    let canonical = |path: &Path| {
        fs::canonicalize(path)
            .map_err(|e| BackupError::message(format!("resolve {}: {}", path.display(), e)))
    };
    let mirror = canonical(mirror)?;
    let archive_dir = canonical(archive_dir)?;
    Ok(archive_dir.strip_prefix(&mirror).ok().map(Path::to_path_buf))
}

/// Archive artifacts directly inside `dir`, sorted by name.
pub fn list_local_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(BackupError::message(format!(
                "read {}: {}",
                dir.display(),
                err
            )))
        }
    };
    let mut out = Vec::new();
    for entry in read {
        let entry =
            entry.map_err(|e| BackupError::message(format!("read {}: {}", dir.display(), e)))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_archive_name(&name) {
            continue;
        }
        if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

fn zip_entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = ZipArchive::new(File::open(path).expect("open")).expect("zip");
        let mut file = archive.by_name(name).expect("entry");
        let mut out = String::new();
        file.read_to_string(&mut out).expect("read");
        out
    }

    #[test]
    fn archive_names() {
        assert_eq!(
            ArchiveName::for_date(date(2024, 1, 1)).as_str(),
            "backup-2024-01-01.zip"
        );
        assert!(is_archive_name("backup-2024-01-01.zip"));
        assert!(is_archive_name("backup-2024-01-01 10:00:00.zip"));
        assert!(!is_archive_name("backup-.zip"));
        assert!(!is_archive_name("scores.db"));
        assert!(!is_archive_name("backup.zip"));
    }

    #[test]
    fn archive_holds_mirror_relative_entries() {
        let dir = TempDir::new().expect("tempdir");
        let mirror = dir.path().join("osu!backup");
        fs::create_dir_all(mirror.join("Replays")).expect("mkdir");
        fs::write(mirror.join("scores.db"), "scores").expect("write");
        fs::write(mirror.join("Replays/a.osr"), "replay").expect("write");
        fs::write(mirror.join("drive_settings.txt"), "folder-id").expect("write");

        let path = create_archive(
            &mirror,
            dir.path(),
            date(2024, 1, 1),
            &[PathBuf::from("drive_settings.txt")],
        )
        .expect("archive");
        assert_eq!(path, dir.path().join("backup-2024-01-01.zip"));
        assert_eq!(read_entry(&path, "scores.db"), "scores");
        assert_eq!(read_entry(&path, "Replays/a.osr"), "replay");
        let archive = ZipArchive::new(File::open(&path).expect("open")).expect("zip");
        assert!(archive.file_names().all(|n| n != "drive_settings.txt"));
    }

    #[test]
    fn same_day_archive_is_overwritten() {
        let dir = TempDir::new().expect("tempdir");
        let mirror = dir.path().join("mirror");
        let out = dir.path().join("archives");
        fs::create_dir_all(&mirror).expect("mkdir");
        fs::write(mirror.join("scores.db"), "v1").expect("write");
        let first = create_archive(&mirror, &out, date(2024, 3, 9), &[]).expect("first");

        fs::write(mirror.join("scores.db"), "v2").expect("write");
        let second = create_archive(&mirror, &out, date(2024, 3, 9), &[]).expect("second");
        assert_eq!(first, second);
        assert_eq!(read_entry(&second, "scores.db"), "v2");
        assert_eq!(list_local_archives(&out).expect("list"), vec![second]);
    }

    #[test]
    fn archive_inside_mirror_does_not_include_itself() {
        let dir = TempDir::new().expect("tempdir");
        let mirror = dir.path().to_path_buf();
        fs::write(mirror.join("scores.db"), "scores").expect("write");
        fs::write(mirror.join("backup-2024-01-01.zip"), "old archive").expect("write");

        let path = create_archive(&mirror, &mirror, date(2024, 1, 2), &[]).expect("archive");
        let archive = ZipArchive::new(File::open(&path).expect("open")).expect("zip");
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["scores.db"]);
    }

    #[test]
    fn archive_dir_nested_in_mirror_is_left_out() {
        let dir = TempDir::new().expect("tempdir");
        let mirror = dir.path().join("osu!backup");
        let out = mirror.join("archives");
        fs::create_dir_all(mirror.join("Replays")).expect("mkdir");
        fs::write(mirror.join("scores.db"), "scores").expect("write");
        fs::write(mirror.join("Replays/backup-2023-12-31.zip"), "user file").expect("write");

        create_archive(&mirror, &out, date(2024, 1, 1), &[]).expect("first");
        let path = create_archive(&mirror, &out, date(2024, 1, 2), &[]).expect("second");
        let archive = ZipArchive::new(File::open(&path).expect("open")).expect("zip");
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"scores.db"));
        assert!(names.contains(&"Replays/backup-2023-12-31.zip"));
        assert!(!names.iter().any(|n| n.starts_with("archives/") && n.len() > "archives/".len()));
        assert_eq!(list_local_archives(&out).expect("list").len(), 2);
    }

    #[test]
    fn missing_mirror_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = create_archive(&dir.path().join("nope"), dir.path(), date(2024, 1, 1), &[])
            .expect_err("missing mirror");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn list_skips_other_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("backup-2024-01-02.zip"), "b").expect("write");
        fs::write(dir.path().join("backup-2024-01-01.zip"), "a").expect("write");
        fs::write(dir.path().join("debug.log"), "log").expect("write");
        fs::create_dir_all(dir.path().join("backup-dir.zip")).expect("mkdir");
        let names: Vec<String> = list_local_archives(dir.path())
            .expect("list")
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["backup-2024-01-01.zip", "backup-2024-01-02.zip"]);
        assert!(list_local_archives(&dir.path().join("missing"))
            .expect("missing dir")
            .is_empty());
    }
}
