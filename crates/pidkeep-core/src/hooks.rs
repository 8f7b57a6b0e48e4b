//! Shutdown hooks owned by the host program.
//!
//! The host creates one [`ExitHooks`] near the top of `main` and keeps it
//! alive until `main` returns. Hooks run when [`ExitHooks::run`] is called or
//! when the value is dropped, whichever comes first. A process that leaves
//! through `std::process::exit`, `abort` or an unhandled fatal signal never
//! runs them.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

type Hook = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
pub struct ExitHooks {
    hooks: Mutex<Vec<Hook>>,
}

impl ExitHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure to run once at shutdown
    pub fn register<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.lock().push(Box::new(hook));
    }

    /// Number of hooks still waiting to run
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every pending hook in registration order and return how many ran.
    ///
    /// Hooks are drained before they run, so a second call is a no-op. A
    /// panicking hook is logged and does not stop the ones after it.
    pub fn run(&self) -> usize {
        let pending = std::mem::take(&mut *self.lock());
        let count = pending.len();

        for hook in pending {
            if panic::catch_unwind(AssertUnwindSafe(hook)).is_err() {
                log::error!(target: "pidkeep", "Exit hook panicked, continuing shutdown");
            }
        }

        count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Hook>> {
        // A poisoned list is still a valid list of hooks
        self.hooks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ExitHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitHooks")
            .field("pending", &self.len())
            .finish()
    }
}

impl Drop for ExitHooks {
    fn drop(&mut self) {
        let ran = self.run();
        if ran > 0 {
            log::debug!(target: "pidkeep", "Ran {ran} exit hook(s)");
        }
    }
}
