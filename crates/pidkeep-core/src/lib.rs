pub mod cleanup;
pub mod config;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod pidfile;
pub mod role;

pub use cleanup::{CleanupOutcome, CloseStep, UnlinkStep};
pub use config::{Config, PidfileRequest};
pub use error::PidfileError;
pub use hooks::ExitHooks;
pub use manager::PidfileManager;
pub use pidfile::{read_pid, PidfileHandle, LINE_ENDING};
pub use role::ProcessRole;
