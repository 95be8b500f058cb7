//! Single instance lock using Unix socket.
//!
//! Two bridges reading the same inputs would publish duplicate clicks on the
//! same topics. The lock is a Unix socket, which the OS cleans up when the
//! process dies, so there are no stale lock files.

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SOCKET_NAME: &str = "adc-button-bridge.sock";

/// Error types for instance lock operations.
#[derive(Debug, Error)]
pub enum InstanceLockError {
    /// Another instance is already running.
    #[error("another instance is already running")]
    AlreadyRunning,

    /// I/O error during lock acquisition.
    #[error("failed to acquire instance lock: {0}")]
    Io(#[from] io::Error),
}

/// Single instance lock using a Unix socket.
///
/// The lock is held as long as this struct exists. When dropped, the socket
/// file is removed.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock in the default runtime directory.
    pub fn acquire() -> Result<Self, InstanceLockError> {
        Self::acquire_at(&Self::socket_path())
    }

    /// Acquire the lock on a specific socket path.
    pub fn acquire_at(path: &Path) -> Result<Self, InstanceLockError> {
        if path.exists() {
            // A socket nobody listens on was left behind by a killed process
            match UnixStream::connect(path) {
                Ok(_) => return Err(InstanceLockError::AlreadyRunning),
                Err(_) => {
                    let _ = std::fs::remove_file(path);
                }
            }
        }

        match UnixListener::bind(path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                Err(InstanceLockError::AlreadyRunning)
            }
            Err(e) => Err(InstanceLockError::Io(e)),
        }
    }

    /// Get the path to the socket file.
    pub fn socket_path() -> PathBuf {
        Self::socket_path_in(std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from))
    }

    /// Socket path inside `runtime_dir`, falling back to /tmp.
    pub fn socket_path_in(runtime_dir: Option<PathBuf>) -> PathBuf {
        runtime_dir
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(SOCKET_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
