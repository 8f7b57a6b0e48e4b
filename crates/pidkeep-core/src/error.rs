use std::path::PathBuf;

/// Errors raised while creating or reading a pidfile.
///
/// Cleanup never produces one of these; see [`crate::CleanupOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum PidfileError {
    #[error("failed to open pidfile {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write pid to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read pidfile {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pidfile {path:?} does not contain a pid: {contents:?}")]
    Parse { path: PathBuf, contents: String },

    #[error("pidfile handle for {path:?} is already closed")]
    Closed { path: PathBuf },

    #[error("invalid pidfile configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PidfileError>;
