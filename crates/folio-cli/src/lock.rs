//! Advisory locking of the data directory.
//!
//! A command holds `<data_dir>/.lock` from the moment it loads the snapshots
//! until its last save. Commands that write take the lock exclusively;
//! read-only commands share it. Overlapping invocations therefore run one
//! after another instead of overwriting each other's snapshots.

use fd_lock::RwLock;
use folio_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// Name of the lock file inside the data directory.
pub const LOCK_FILE: &str = ".lock";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a command holds the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Alongside other readers.
    Shared,
    /// Alone.
    Exclusive,
}

/// Run `work` while holding the data directory lock in `mode`.
///
/// Waits up to `wait` for other processes to release the directory. The
/// lock is tried at least once, so a zero `wait` never blocks.
///
/// # Errors
///
/// [`Error::ConcurrencyConflict`] if the lock is still held after `wait`;
/// otherwise whatever `work` returns.
pub async fn with_data_dir_lock<T, F, Fut>(
    data_dir: &Path,
    mode: LockMode,
    wait: Duration,
    work: F,
) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let path = data_dir.join(LOCK_FILE);
    let mut lock = RwLock::new(open_lock_file(data_dir, &path)?);
    let deadline = Instant::now() + wait;
    let mut announced = false;

    loop {
        let busy = match mode {
            LockMode::Shared => match lock.try_read() {
                Ok(_guard) => {
                    log::debug!("Holding {} (shared)", path.display());
                    return work().await;
                }
                Err(e) => e,
            },
            LockMode::Exclusive => match lock.try_write() {
                Ok(_guard) => {
                    log::debug!("Holding {} (exclusive)", path.display());
                    return work().await;
                }
                Err(e) => e,
            },
        };
        if busy.kind() != io::ErrorKind::WouldBlock {
            return Err(Error::io_with_path(busy, &path));
        }
        if Instant::now() >= deadline {
            return Err(Error::conflict(format!(
                "data directory {} is in use by another folio process",
                data_dir.display()
            )));
        }
        if !announced {
            log::info!("Waiting for another folio process to release {}", data_dir.display());
            announced = true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn open_lock_file(data_dir: &Path, path: &Path) -> Result<File> {
    std::fs::create_dir_all(data_dir).map_err(|e| Error::io_with_path(e, data_dir))?;
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// Tests
// ============================================================================
