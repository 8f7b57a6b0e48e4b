/// Environment variable a supervisor sets on each worker it spawns
pub const WORKER_ID_ENV: &str = "PIDKEEP_WORKER_ID";

/// Where this process sits in a primary/worker group.
///
/// Only the primary owns the pidfile; workers must neither create nor delete it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProcessRole {
    #[default]
    Primary,
    Worker { id: String },
}

impl ProcessRole {
    /// Detect the role from `PIDKEEP_WORKER_ID`
    #[must_use]
    pub fn detect() -> Self {
        Self::from_worker_id(std::env::var(WORKER_ID_ENV).ok().as_deref())
    }

    /// A non-empty worker id makes this process a worker
    #[must_use]
    pub fn from_worker_id(worker_id: Option<&str>) -> Self {
        match worker_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::Worker { id: id.to_string() },
            _ => Self::Primary,
        }
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }
}
