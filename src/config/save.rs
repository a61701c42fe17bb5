use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::config::model::Config;
use crate::error::{BackupError, Result};

pub fn save_config(path: &Path, cfg: &Config, force: bool) -> Result<()> {
    let data = serde_yaml::to_string(cfg)
        .map_err(|e| BackupError::message(format!("encode config: {}", e)))?;
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options.open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            BackupError::message(format!(
                "config {} already exists (use --force to overwrite)",
                path.display()
            ))
        } else {
            BackupError::message(format!("write config {}: {}", path.display(), e))
        }
    })?;
    file.write_all(data.as_bytes())
        .map_err(|e| BackupError::message(format!("write config {}: {}", path.display(), e)))?;
    Ok(())
}
