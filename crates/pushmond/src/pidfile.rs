//! PID file record and the remote reload trigger.

use std::path::Path;

use anyhow::{bail, Context};

/// Record the current process id as decimal text.
pub fn write(path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, std::process::id().to_string())
        .with_context(|| format!("failed to write PID file {}", path.display()))
}

/// Read a process id previously written by [`write`].
pub fn read(path: &Path) -> anyhow::Result<i32> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read PID file {}", path.display()))?;
    let pid: i32 = content
        .trim()
        .parse()
        .with_context(|| format!("invalid PID in file {}: {:?}", path.display(), content))?;
    if pid <= 0 {
        bail!("invalid PID in file {}: {pid}", path.display());
    }
    Ok(pid)
}

/// Remove the PID file, ignoring a file that is already gone.
pub fn remove(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to remove PID file {}", path.display()))
        }
    }
}

/// Ask the daemon recorded in `path` to reload by sending it SIGHUP.
pub fn send_reload(path: &Path) -> anyhow::Result<i32> {
    let pid = read(path)?;
    send_signal(pid, libc::SIGHUP).context("failed to send SIGHUP signal")?;
    Ok(pid)
}

fn send_signal(pid: i32, signal: libc::c_int) -> std::io::Result<()> {
    // SAFETY: kill(2) has no memory-safety preconditions; `pid` is positive
    // so it targets a single process, never a process group.
    let rc = unsafe { libc::kill(pid, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
