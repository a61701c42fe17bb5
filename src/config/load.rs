use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::{
    Config, Intervals, RemoteConfig, RemoteKind, RemoteSettings, RuntimeConfig, ScheduleConfig,
};
use crate::error::{BackupError, ConfigError, Result};
use crate::types::TaskKind;
use crate::util::paths::{is_plain_relative, is_safe_component};

pub const DEFAULT_CONFIG_FILE: &str = "osu-backup.yaml";
pub const SETTINGS_FILE_NAME: &str = "drive_settings.txt";
const DEFAULT_SOURCE_ROOT: &str = ".";
const DEFAULT_BACKUP_PATH: &str = "./osu!backup";
const DEFAULT_ARCHIVE_DIR: &str = ".";
const DEFAULT_LOG_FILE: &str = "debug.log";
const DEFAULT_FOLDER_NAME: &str = "osu!backup";
const DEFAULT_TOKEN_ENV: &str = "GOOGLE_DRIVE_TOKEN";
const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_MTIME_THRESHOLD_MS: u64 = 1000;
const DEFAULT_FILES: [&str; 5] = [
    "osu!.db",
    "collection.db",
    "scores.db",
    "osu!.cfg",
    "osu!.{user}.cfg",
];
const DEFAULT_DIRECTORIES: [&str; 2] = ["Screenshots", "Replays"];

const BACKUP_MINUTES: u64 = 60;
const ARCHIVE_MINUTES: u64 = 24 * 60;
const SYNC_MINUTES: u64 = 24 * 60;
const CLEANUP_MINUTES: u64 = 25 * 60;
const POLL_SECONDS: u64 = 60;

/// Loads `path` if given, otherwise `osu-backup.yaml` in the working directory when it
/// exists, otherwise the built-in defaults.
pub fn resolve_config(path: Option<&Path>, user: &str) -> Result<RuntimeConfig> {
    match path {
        Some(path) => load_config(path, user),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                load_config(default_path, user)
            } else {
                parse_runtime(Config::default(), user)
            }
        }
    }
}

pub fn load_config(path: &Path, user: &str) -> Result<RuntimeConfig> {
    let mut contents = String::new();
    File::open(path)
        .map_err(|e| BackupError::message(format!("open config {}: {}", path.display(), e)))?
        .read_to_string(&mut contents)
        .map_err(|e| BackupError::message(format!("read config {}: {}", path.display(), e)))?;
    let cfg: Config = serde_yaml::from_str(&contents)
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg, user)
}

/// The fully populated config written by `config init`.
pub fn default_config() -> Config {
    Config {
        source_root: Some(DEFAULT_SOURCE_ROOT.to_string()),
        backup_path: Some(DEFAULT_BACKUP_PATH.to_string()),
        archive_dir: Some(DEFAULT_ARCHIVE_DIR.to_string()),
        log_file: Some(DEFAULT_LOG_FILE.to_string()),
        files: Some(DEFAULT_FILES.iter().map(|s| s.to_string()).collect()),
        directories: Some(DEFAULT_DIRECTORIES.iter().map(|s| s.to_string()).collect()),
        mtime_threshold_ms: Some(DEFAULT_MTIME_THRESHOLD_MS),
        remote: RemoteConfig {
            kind: Some("drive".to_string()),
            folder_name: Some(DEFAULT_FOLDER_NAME.to_string()),
            settings_file: None,
            token_env: Some(DEFAULT_TOKEN_ENV.to_string()),
            root: None,
            timeout_seconds: Some(DEFAULT_TIMEOUT_SECONDS),
        },
        schedule: ScheduleConfig {
            backup_minutes: Some(BACKUP_MINUTES),
            archive_minutes: Some(ARCHIVE_MINUTES),
            sync_minutes: Some(SYNC_MINUTES),
            cleanup_minutes: Some(CLEANUP_MINUTES),
            poll_seconds: Some(POLL_SECONDS),
            disabled: Vec::new(),
        },
    }
}

pub fn parse_runtime(cfg: Config, user: &str) -> Result<RuntimeConfig> {
    let files = cfg
        .files
        .unwrap_or_else(|| DEFAULT_FILES.iter().map(|s| s.to_string()).collect());
    let files = validate_tracked("file", files, user)?;
    let directories = cfg
        .directories
        .unwrap_or_else(|| DEFAULT_DIRECTORIES.iter().map(|s| s.to_string()).collect());
    let directories = validate_tracked("directory", directories, user)?;

    let backup_path = PathBuf::from(
        cfg.backup_path
            .unwrap_or_else(|| DEFAULT_BACKUP_PATH.to_string()),
    );
    if backup_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("backupPath is empty".to_string()).into());
    }

    let remote = parse_remote(cfg.remote, &backup_path)?;
    let intervals = parse_intervals(&cfg.schedule)?;
    let mut disabled = Vec::new();
    for name in &cfg.schedule.disabled {
        let kind = TaskKind::parse(name)
            .map_err(|e| ConfigError::Invalid(format!("schedule.disabled: {}", e)))?;
        if !disabled.contains(&kind) {
            disabled.push(kind);
        }
    }

    Ok(RuntimeConfig {
        source_root: PathBuf::from(
            cfg.source_root
                .unwrap_or_else(|| DEFAULT_SOURCE_ROOT.to_string()),
        ),
        backup_path,
        archive_dir: PathBuf::from(
            cfg.archive_dir
                .unwrap_or_else(|| DEFAULT_ARCHIVE_DIR.to_string()),
        ),
        log_file: PathBuf::from(cfg.log_file.unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())),
        files,
        directories,
        mtime_threshold: Duration::from_millis(
            cfg.mtime_threshold_ms.unwrap_or(DEFAULT_MTIME_THRESHOLD_MS),
        ),
        remote,
        intervals,
        disabled,
    })
}

fn validate_tracked(label: &str, names: Vec<String>, user: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in names {
        let name = raw.replace("{user}", user);
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("tracked {} name is empty", label)).into());
        }
        if !is_plain_relative(Path::new(&name)) {
            return Err(ConfigError::Invalid(format!(
                "tracked {} {} must be a relative path without ..",
                label, name
            ))
            .into());
        }
        if !seen.insert(name.clone()) {
            return Err(
                ConfigError::Invalid(format!("duplicate tracked {} {}", label, name)).into(),
            );
        }
        out.push(name);
    }
    Ok(out)
}

fn parse_remote(remote: RemoteConfig, backup_path: &Path) -> Result<RemoteSettings> {
    let folder_name = remote
        .folder_name
        .unwrap_or_else(|| DEFAULT_FOLDER_NAME.to_string());
    if !is_safe_component(&folder_name) {
        return Err(ConfigError::Invalid(format!(
            "remote folderName {:?} must be a single non-empty path component",
            folder_name
        ))
        .into());
    }
    let kind = match remote
        .kind
        .as_deref()
        .unwrap_or("drive")
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "drive" => RemoteKind::Drive {
            token_env: remote
                .token_env
                .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
        },
        "directory" => {
            let root = remote.root.ok_or_else(|| {
                ConfigError::Invalid("remote kind directory requires remote.root".to_string())
            })?;
            RemoteKind::Directory {
                root: PathBuf::from(root),
            }
        }
        "none" => RemoteKind::None,
        other => {
            return Err(ConfigError::Invalid(format!(
                "invalid remote kind {}; expected drive, directory, or none",
                other
            ))
            .into())
        }
    };
    let settings_file = remote
        .settings_file
        .map(PathBuf::from)
        .unwrap_or_else(|| backup_path.join(SETTINGS_FILE_NAME));
    let timeout_seconds = remote.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 {
        return Err(ConfigError::Invalid("remote timeoutSeconds must be > 0".to_string()).into());
    }
    Ok(RemoteSettings {
        kind,
        folder_name,
        settings_file,
        timeout: Duration::from_secs(timeout_seconds),
    })
}

fn parse_intervals(schedule: &ScheduleConfig) -> Result<Intervals> {
    let minutes = |value: Option<u64>, default: u64, key: &str| -> Result<Duration> {
        let value = value.unwrap_or(default);
        if value == 0 {
            return Err(ConfigError::Invalid(format!("schedule.{} must be > 0", key)).into());
        }
        let secs = value.checked_mul(60).ok_or_else(|| {
            ConfigError::Invalid(format!("schedule.{} is too large", key))
        })?;
        Ok(Duration::from_secs(secs))
    };
    let poll = schedule.poll_seconds.unwrap_or(POLL_SECONDS);
    if poll == 0 {
        return Err(ConfigError::Invalid("schedule.pollSeconds must be > 0".to_string()).into());
    }
    Ok(Intervals {
        backup: minutes(schedule.backup_minutes, BACKUP_MINUTES, "backupMinutes")?,
        archive: minutes(schedule.archive_minutes, ARCHIVE_MINUTES, "archiveMinutes")?,
        sync: minutes(schedule.sync_minutes, SYNC_MINUTES, "syncMinutes")?,
        cleanup: minutes(schedule.cleanup_minutes, CLEANUP_MINUTES, "cleanupMinutes")?,
        poll: Duration::from_secs(poll),
    })
}
