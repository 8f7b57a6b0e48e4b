use std::fmt;

/// Result of the unlink half of a pidfile cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlinkStep {
    /// The file was still linked at its path and has been removed
    Removed,
    /// Link count was already zero, nothing to remove
    AlreadyGone,
    /// The handle was closed before this cleanup, so nothing was checked
    Skipped,
    /// Stat or unlink failed; recorded and ignored
    Failed(String),
}

/// Result of the close half of a pidfile cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseStep {
    Closed,
    AlreadyClosed,
    Failed(String),
}

/// Best-effort outcome of tearing down a pidfile at exit.
///
/// This value is informational only. Nothing in the shutdown path is allowed
/// to fail because of it, so callers are free to log it and drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub unlink: UnlinkStep,
    pub close: CloseStep,
}

impl CleanupOutcome {
    /// Outcome reported when cleanup runs against an already closed handle
    pub(crate) fn already_closed() -> Self {
        Self {
            unlink: UnlinkStep::Skipped,
            close: CloseStep::AlreadyClosed,
        }
    }

    /// True when neither step recorded a failure
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !matches!(self.unlink, UnlinkStep::Failed(_)) && !matches!(self.close, CloseStep::Failed(_))
    }
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unlink = match &self.unlink {
            UnlinkStep::Removed => "removed".to_string(),
            UnlinkStep::AlreadyGone => "already deleted".to_string(),
            UnlinkStep::Skipped => "skipped".to_string(),
            UnlinkStep::Failed(reason) => format!("unlink failed ({reason})"),
        };
        let close = match &self.close {
            CloseStep::Closed => "closed".to_string(),
            CloseStep::AlreadyClosed => "already closed".to_string(),
            CloseStep::Failed(reason) => format!("close failed ({reason})"),
        };
        write!(f, "{unlink}, {close}")
    }
}
