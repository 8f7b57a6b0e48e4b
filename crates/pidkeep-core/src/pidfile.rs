//! The pidfile itself: create-or-truncate, write, and best-effort teardown.
//!
//! The file is opened with create + truncate rather than an exclusive create,
//! so two processes pointed at the same path will both succeed and the later
//! write wins. No locking is attempted.

use crate::cleanup::{CleanupOutcome, CloseStep, UnlinkStep};
use crate::error::{PidfileError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Line terminator written after the pid
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";

/// Line terminator written after the pid
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Permission bits for a newly created pidfile (before umask)
#[cfg(unix)]
const PIDFILE_MODE: u32 = 0o644;

/// An open pidfile owned by the current process.
///
/// Goes from open to closed exactly once, through [`PidfileHandle::cleanup`].
#[derive(Debug)]
pub struct PidfileHandle {
    path: PathBuf,
    pid: u32,
    file: Option<File>,
}

impl PidfileHandle {
    /// Create or truncate `path` and write the current process id into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written, e.g. the
    /// parent directory is missing or not writable.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_for(path, std::process::id())
    }

    /// Create or truncate `path` and write `pid` into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn create_for(path: impl AsRef<Path>, pid: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(PIDFILE_MODE);
        }

        let mut file = options.open(&path).map_err(|source| PidfileError::Open {
            path: path.clone(),
            source,
        })?;

        file.write_all(format!("{pid}{LINE_ENDING}").as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| PidfileError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            pid,
            file: Some(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Borrow the underlying file while the handle is still open.
    ///
    /// # Errors
    ///
    /// Returns [`PidfileError::Closed`] after [`PidfileHandle::cleanup`] ran.
    pub fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| PidfileError::Closed {
            path: self.path.clone(),
        })
    }

    /// Unlink the pidfile if it is still ours, then close the handle.
    ///
    /// The link count is read from the open descriptor, not the path, so a
    /// file that was deleted (or deleted and recreated by someone else) is
    /// left alone. Failures are logged and recorded in the outcome; the close
    /// step always runs.
    pub fn cleanup(&mut self) -> CleanupOutcome {
        let Some(file) = self.file.take() else {
            log::debug!(target: "pidkeep", "Pidfile '{}' was already closed.", self.path.display());
            return CleanupOutcome::already_closed();
        };

        let unlink = match is_linked(&file, &self.path) {
            Ok(false) => {
                log::debug!(target: "pidkeep", "Our pidfile has already been deleted.");
                UnlinkStep::AlreadyGone
            }
            Ok(true) => match fs::remove_file(&self.path) {
                Ok(()) => {
                    log::debug!(
                        target: "pidkeep",
                        "Unlinked pidfile '{}' for process {}",
                        self.path.display(),
                        self.pid
                    );
                    UnlinkStep::Removed
                }
                Err(e) => {
                    log::debug!(target: "pidkeep", "Failed to unlink '{}': {e}", self.path.display());
                    UnlinkStep::Failed(e.to_string())
                }
            },
            Err(e) => {
                log::debug!(target: "pidkeep", "Failed to stat '{}': {e}", self.path.display());
                UnlinkStep::Failed(e.to_string())
            }
        };

        let close = match close_file(file) {
            Ok(()) => CloseStep::Closed,
            Err(e) => {
                log::debug!(target: "pidkeep", "Failed to close '{}': {e}", self.path.display());
                CloseStep::Failed(e.to_string())
            }
        };

        CleanupOutcome { unlink, close }
    }
}

/// Read the pid stored in a pidfile.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a pid.
pub fn read_pid(path: impl AsRef<Path>) -> Result<u32> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| PidfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    contents
        .trim()
        .parse::<u32>()
        .map_err(|_| PidfileError::Parse {
            path: path.to_path_buf(),
            contents,
        })
}

#[cfg(unix)]
fn is_linked(file: &File, _path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    Ok(file.metadata()?.nlink() > 0)
}

// No portable link count here; an open file cannot be deleted on Windows
// without share-delete, so a missing path is the best available signal.
#[cfg(not(unix))]
fn is_linked(file: &File, path: &Path) -> io::Result<bool> {
    file.metadata()?;
    Ok(path.exists())
}

#[cfg(unix)]
fn close_file(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just released from an owned `File`, nothing else will close it.
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn close_file(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pidfile_in(dir: &TempDir) -> PathBuf {
        dir.path().join("test.pid")
    }

    #[test]
    fn test_create_writes_own_pid() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);

        let handle = PidfileHandle::create(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{}{LINE_ENDING}", std::process::id()));
        assert_eq!(handle.pid(), std::process::id());
        assert_eq!(handle.path(), path.as_path());
        assert!(handle.is_open());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        let _handle = PidfileHandle::create(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644 & !current_umask());
    }

    /// The umask can only be read by setting it, so put it straight back
    #[cfg(unix)]
    #[allow(clippy::useless_conversion)] // mode_t is u16 on some targets
    fn current_umask() -> u32 {
        // SAFETY: umask only swaps the process file creation mask.
        let mask = unsafe {
            let mask = libc::umask(0o022);
            libc::umask(mask);
            mask
        };
        u32::from(mask) & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_unlink_failure_still_closes() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        let mut handle = PidfileHandle::create(&path).unwrap();

        // Keep our inode linked elsewhere, then put a directory at the path
        fs::hard_link(&path, dir.path().join("other.pid")).unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let outcome = handle.cleanup();

        assert!(matches!(outcome.unlink, UnlinkStep::Failed(_)));
        assert_eq!(outcome.close, CloseStep::Closed);
        assert!(!outcome.is_clean());
        assert!(!handle.is_open());
        assert!(path.is_dir());
    }

    #[test]
    fn test_create_truncates_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        fs::write(&path, "123456789012345678901234567890\nleftover\n").unwrap();

        let _handle = PidfileHandle::create_for(&path, 42).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("42{LINE_ENDING}"));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("test.pid");

        let err = PidfileHandle::create(&path).unwrap_err();
        assert!(matches!(err, PidfileError::Open { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_removes_file_and_closes() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        let mut handle = PidfileHandle::create(&path).unwrap();

        let outcome = handle.cleanup();

        assert_eq!(outcome.unlink, UnlinkStep::Removed);
        assert_eq!(outcome.close, CloseStep::Closed);
        assert!(!path.exists());
        assert!(!handle.is_open());
        assert!(matches!(handle.file(), Err(PidfileError::Closed { .. })));
    }

    #[test]
    fn test_cleanup_twice_is_harmless() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        let mut handle = PidfileHandle::create(&path).unwrap();

        handle.cleanup();
        // Someone else takes the path after we are gone
        fs::write(&path, "999\n").unwrap();
        let outcome = handle.cleanup();

        assert_eq!(outcome, CleanupOutcome::already_closed());
        assert!(outcome.is_clean());
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_skips_already_deleted_file() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        let mut handle = PidfileHandle::create(&path).unwrap();

        fs::remove_file(&path).unwrap();
        let outcome = handle.cleanup();

        assert_eq!(outcome.unlink, UnlinkStep::AlreadyGone);
        assert_eq!(outcome.close, CloseStep::Closed);
        assert!(!handle.is_open());
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_leaves_replacement_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);
        let mut handle = PidfileHandle::create(&path).unwrap();

        // Another actor deletes our file and writes its own at the same path
        fs::remove_file(&path).unwrap();
        fs::write(&path, "4242\n").unwrap();

        let outcome = handle.cleanup();

        assert_eq!(outcome.unlink, UnlinkStep::AlreadyGone);
        assert_eq!(fs::read_to_string(&path).unwrap(), "4242\n");
    }

    #[test]
    fn test_same_path_last_writer_wins() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);

        let first = PidfileHandle::create_for(&path, 1111).unwrap();
        let second = PidfileHandle::create_for(&path, 22).unwrap();

        // Both succeed; no locking is performed
        assert!(first.is_open());
        assert!(second.is_open());
        assert_eq!(read_pid(&path).unwrap(), 22);
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("22{LINE_ENDING}"));
    }

    #[test]
    fn test_read_pid() {
        let dir = TempDir::new().unwrap();
        let path = pidfile_in(&dir);

        fs::write(&path, "31337\r\n").unwrap();
        assert_eq!(read_pid(&path).unwrap(), 31337);

        fs::write(&path, "not a pid\n").unwrap();
        assert!(matches!(read_pid(&path), Err(PidfileError::Parse { .. })));

        fs::remove_file(&path).unwrap();
        assert!(matches!(read_pid(&path), Err(PidfileError::Read { .. })));
    }
}
