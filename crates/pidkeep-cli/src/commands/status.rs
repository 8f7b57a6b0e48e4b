/// Pidfile inspection from the supervisor side
use anyhow::{Context, Result};
use std::path::Path;
use sysinfo::{Pid, System};

pub fn status_command(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("No pidfile at {}", path.display());
        return Ok(());
    }

    let pid = pidkeep_core::read_pid(path)
        .with_context(|| format!("Failed to read pidfile {}", path.display()))?;

    let state = if is_alive(pid) { "running" } else { "not running (stale pidfile)" };
    println!("PID {pid}: {state}");
    Ok(())
}

fn is_alive(pid: u32) -> bool {
    let mut sys = System::new();
    sys.refresh_process(Pid::from_u32(pid))
}
