/// Demonstration daemon: hold a pidfile until a normal shutdown
use anyhow::{Context, Result};
use pidkeep_core::{Config, ExitHooks, PidfileManager, PidfileRequest};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;

/// Why the main loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal(&'static str),
    EndOfInput,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => write!(f, "received {name}"),
            Self::EndOfInput => write!(f, "stdin closed"),
        }
    }
}

pub async fn run_command(
    pidfile: Option<PathBuf>,
    config: Option<&Path>,
    hooks: &ExitHooks,
) -> Result<()> {
    let request = resolve_request(pidfile, config)?;

    // Handlers go in first so a signal right after install still cleans up
    let signals = ShutdownSignals::register()?;

    PidfileManager::from_env()
        .install(&request, hooks)
        .context("Failed to create pidfile")?;

    if let Some(path) = request.path() {
        log::info!("Pidfile {} written for PID {}", path.display(), std::process::id());
    }

    println!("Press Control-D to exit.");

    let reason = signals.wait().await;
    log::info!("Shutting down: {reason}");
    Ok(())
}

/// The `--pidfile` flag wins over the config file; with neither, use `<exe>.pid`
fn resolve_request(pidfile: Option<PathBuf>, config: Option<&Path>) -> Result<PidfileRequest> {
    if let Some(path) = pidfile {
        return Ok(PidfileRequest::new(path));
    }

    if let Some(config_path) = config {
        let config = Config::load(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        return Ok(config.pidfile_request());
    }

    Ok(PidfileRequest::new(default_pidfile_path()?))
}

fn default_pidfile_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate current executable")?;
    Ok(exe.with_extension("pid"))
}

/// Blocking stdin reads cannot be cancelled, so they live on their own thread
fn spawn_stdin_watcher() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        if let Err(e) = io::copy(&mut io::stdin().lock(), &mut io::sink()) {
            log::debug!("stdin read failed: {e}");
        }
        let _ = tx.send(());
    });
    rx
}

/// Signals that end the main loop, registered before the pidfile exists
#[cfg(unix)]
struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sighup: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn register() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?,
            sigterm: signal(SignalKind::terminate())
                .context("Failed to install SIGTERM handler")?,
            sighup: signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?,
            sigquit: signal(SignalKind::quit()).context("Failed to install SIGQUIT handler")?,
        })
    }

    async fn wait(mut self) -> ExitReason {
        let stdin_closed = spawn_stdin_watcher();

        tokio::select! {
            _ = self.sigint.recv() => ExitReason::Signal("SIGINT"),
            _ = self.sigterm.recv() => ExitReason::Signal("SIGTERM"),
            _ = self.sighup.recv() => ExitReason::Signal("SIGHUP"),
            _ = self.sigquit.recv() => {
                // Core dump on purpose; the pidfile is left behind
                log::warn!("Received SIGQUIT, aborting without cleanup");
                std::process::abort();
            }
            _ = stdin_closed => ExitReason::EndOfInput,
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    #[allow(clippy::unnecessary_wraps)]
    fn register() -> Result<Self> {
        Ok(Self)
    }

    async fn wait(self) -> ExitReason {
        let stdin_closed = spawn_stdin_watcher();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::warn!("Ctrl-C handler failed: {e}");
                }
                ExitReason::Signal("Ctrl-C")
            }
            _ = stdin_closed => ExitReason::EndOfInput,
        }
    }
}
