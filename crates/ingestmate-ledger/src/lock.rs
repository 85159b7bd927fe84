use crate::paths::WorkspacePaths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};

/// Exclusive workspace lock backed by `.ingestmate/LOCK`.
/// Held across a read-modify-write of the ledger so evaluation passes never interleave.
/// Released when dropped.
pub struct WorkspaceLock {
    _file: File,
}

impl WorkspaceLock {
    /// Try to acquire the workspace lock (non-blocking).
    /// Returns an error if already locked by another process.
    pub fn acquire(paths: &WorkspacePaths) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| {
                anyhow::anyhow!("cannot open lock file {}: {}", paths.lock_file.display(), e)
            })?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "workspace is locked by another evaluation pass ({})",
                paths.lock_file.display()
            )
        })?;

        tracing::debug!(lock = %paths.lock_file.display(), "workspace lock acquired");
        Ok(Self { _file: file })
    }
}
