use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Backup,
    Archive,
    Sync,
    Cleanup,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
    pub verbose: bool,
}

impl TaskKind {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "backup" => Ok(TaskKind::Backup),
            "archive" => Ok(TaskKind::Archive),
            "sync" => Ok(TaskKind::Sync),
            "cleanup" => Ok(TaskKind::Cleanup),
            _ => Err(format!(
                "invalid task {}; expected backup, archive, sync, or cleanup",
                value
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Backup => "backup",
            TaskKind::Archive => "archive",
            TaskKind::Sync => "sync",
            TaskKind::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_task_names() {
        assert_eq!(TaskKind::parse(" Sync ").expect("parse"), TaskKind::Sync);
        assert_eq!(TaskKind::parse("cleanup").expect("parse"), TaskKind::Cleanup);
        assert!(TaskKind::parse("restore").is_err());
    }
}
