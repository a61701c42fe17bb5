use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::TaskKind;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default, rename = "sourceRoot", skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default, rename = "backupPath", skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
    #[serde(default, rename = "archiveDir", skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<String>,
    #[serde(default, rename = "logFile", skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<String>>,
    #[serde(default, rename = "mtimeThresholdMs", skip_serializing_if = "Option::is_none")]
    pub mtime_threshold_ms: Option<u64>,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RemoteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, rename = "folderName", skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(default, rename = "settingsFile", skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
    #[serde(default, rename = "tokenEnv", skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, rename = "timeoutSeconds", skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ScheduleConfig {
    #[serde(default, rename = "backupMinutes", skip_serializing_if = "Option::is_none")]
    pub backup_minutes: Option<u64>,
    #[serde(default, rename = "archiveMinutes", skip_serializing_if = "Option::is_none")]
    pub archive_minutes: Option<u64>,
    #[serde(default, rename = "syncMinutes", skip_serializing_if = "Option::is_none")]
    pub sync_minutes: Option<u64>,
    #[serde(default, rename = "cleanupMinutes", skip_serializing_if = "Option::is_none")]
    pub cleanup_minutes: Option<u64>,
    #[serde(default, rename = "pollSeconds", skip_serializing_if = "Option::is_none")]
    pub poll_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteKind {
    Drive { token_env: String },
    Directory { root: PathBuf },
    None,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub kind: RemoteKind,
    pub folder_name: String,
    pub settings_file: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Intervals {
    pub backup: Duration,
    pub archive: Duration,
    pub sync: Duration,
    pub cleanup: Duration,
    pub poll: Duration,
}

impl Intervals {
    pub fn for_task(&self, kind: TaskKind) -> Duration {
        match kind {
            TaskKind::Backup => self.backup,
            TaskKind::Archive => self.archive,
            TaskKind::Sync => self.sync,
            TaskKind::Cleanup => self.cleanup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source_root: PathBuf,
    pub backup_path: PathBuf,
    pub archive_dir: PathBuf,
    pub log_file: PathBuf,
    pub files: Vec<String>,
    pub directories: Vec<String>,
    pub mtime_threshold: Duration,
    pub remote: RemoteSettings,
    pub intervals: Intervals,
    pub disabled: Vec<TaskKind>,
}

impl RuntimeConfig {
    pub fn is_enabled(&self, kind: TaskKind) -> bool {
        !self.disabled.contains(&kind)
    }
}
