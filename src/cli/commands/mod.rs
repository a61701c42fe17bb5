pub mod config;
pub mod run;
pub mod task;

use crate::error::BackupError;

pub fn exit_code_for_error(err: &BackupError) -> i32 {
    match err {
        BackupError::Config(_) => 2,
        BackupError::Remote(_) => 4,
        BackupError::Message(_) | BackupError::Io(_) => 1,
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<BackupError>() {
        Some(err) => exit_code_for_error(err),
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RemoteError};

    #[test]
    fn exit_codes_follow_error_kind() {
        let config: anyhow::Error = BackupError::from(ConfigError::Invalid("x".into())).into();
        assert_eq!(exit_code(&config), 2);
        let remote: anyhow::Error = BackupError::from(RemoteError::Auth("x".into())).into();
        assert_eq!(exit_code(&remote), 4);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }
}
