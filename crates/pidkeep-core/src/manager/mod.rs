use crate::config::PidfileRequest;
use crate::error::Result;
use crate::hooks::ExitHooks;
use crate::pidfile::PidfileHandle;
use crate::role::ProcessRole;

/// Installs the process pidfile and arranges for its removal at shutdown
#[derive(Debug, Clone, Default)]
pub struct PidfileManager {
    role: ProcessRole,
}

impl PidfileManager {
    #[must_use]
    pub fn new(role: ProcessRole) -> Self {
        Self { role }
    }

    /// Manager for the role detected from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ProcessRole::detect())
    }

    #[must_use]
    pub fn role(&self) -> &ProcessRole {
        &self.role
    }

    /// Create the pidfile described by `request` and register its cleanup on `hooks`.
    ///
    /// Workers and empty requests are skipped without error. Call this once,
    /// before the host enters its main loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the pidfile cannot be created or written. This is
    /// meant to stop the host at startup.
    pub fn install(&self, request: &PidfileRequest, hooks: &ExitHooks) -> Result<()> {
        if let ProcessRole::Worker { id } = &self.role {
            log::debug!(
                target: "pidkeep",
                "Skipping pidfile creation since we are a worker process ({id})."
            );
            return Ok(());
        }

        let Some(path) = request.path() else {
            log::debug!(target: "pidkeep", "No pidfile path provided so we have nothing to do.");
            return Ok(());
        };

        log::debug!(
            target: "pidkeep",
            "Creating pidfile '{}' for process {}",
            path.display(),
            std::process::id()
        );

        let mut handle = PidfileHandle::create(path)?;

        hooks.register(move || {
            let outcome = handle.cleanup();
            log::debug!(
                target: "pidkeep",
                "Pidfile '{}' cleanup: {outcome}",
                handle.path().display()
            );
        });

        Ok(())
    }
}
