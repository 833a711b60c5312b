use std::io::{self, Write};
use std::path::{Path, PathBuf};

use easyfile_fs::PathFacade;
use tracing::{debug, warn};

use crate::error::{WriteError, WriteResult, WriteStage};

/// Options controlling a single atomic write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// `fsync` the staging file before the rename. Without it the rename is
    /// still atomic, but the new content may be lost on power failure.
    pub durable: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { durable: true }
    }
}

impl WriteOptions {
    /// Options without the pre-rename flush.
    pub fn fast() -> Self {
        Self { durable: false }
    }
}

/// Writes files through a [`PathFacade`] so that readers only ever see the
/// complete old content or the complete new content.
///
/// Each write stages its bytes in `.<file-name>.<suffix>` next to the
/// target and renames it into place. Concurrent writers to the same path
/// each use their own staging file; whichever rename lands last wins.
#[derive(Debug)]
pub struct AtomicWriter<'a, F: PathFacade> {
    fs: &'a F,
    options: WriteOptions,
}

impl<'a, F: PathFacade> AtomicWriter<'a, F> {
    /// Create a writer with default (durable) options.
    pub fn new(fs: &'a F) -> Self {
        Self::with_options(fs, WriteOptions::default())
    }

    /// Create a writer with explicit options.
    pub fn with_options(fs: &'a F, options: WriteOptions) -> Self {
        Self { fs, options }
    }

    /// Options applied to every write from this writer.
    pub fn options(&self) -> WriteOptions {
        self.options
    }

    /// Atomically replace `path` with `bytes`.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> WriteResult<()> {
        let mut pending = self.begin(path)?;
        pending.write_payload(bytes)?;
        pending.commit()
    }

    /// Open a staging file for `path` and hand it back as a guard.
    ///
    /// The guard must be [`commit`](PendingWrite::commit)ted for the new
    /// content to appear; dropping it on any other path deletes the staging
    /// file and leaves the target untouched.
    pub fn begin(&self, path: &Path) -> WriteResult<PendingWrite<'a, F>> {
        let name = path
            .file_name()
            .ok_or_else(|| WriteError::InvalidTarget(path.to_path_buf()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        self.fs
            .create_dir_all(dir)
            .map_err(|e| WriteError::io(path, WriteStage::CreateParent, e))?;

        let prefix = format!(".{}.", name.to_string_lossy());
        let (temp, staging) = self
            .fs
            .create_staging(dir, &prefix)
            .map_err(|e| WriteError::io(path, WriteStage::CreateTemp, e))?;

        Ok(PendingWrite {
            fs: self.fs,
            target: path.to_path_buf(),
            temp,
            staging: Some(staging),
            durable: self.options.durable,
            written: 0,
            committed: false,
        })
    }

    /// Run `f` against a staging file for `path`, committing if it returns
    /// `Ok` and rolling back if it returns `Err` or panics.
    pub fn write_with<R, E, W>(&self, path: &Path, f: W) -> Result<R, E>
    where
        E: From<WriteError>,
        W: FnOnce(&mut PendingWrite<'a, F>) -> Result<R, E>,
    {
        let mut pending = self.begin(path)?;
        let out = f(&mut pending)?;
        pending.commit()?;
        Ok(out)
    }
}

/// A write in progress: the staging file exists, the target is unchanged.
///
/// Implements [`Write`] for incremental output. Never outlives one write.
pub struct PendingWrite<'a, F: PathFacade> {
    fs: &'a F,
    target: PathBuf,
    temp: PathBuf,
    staging: Option<F::Staging>,
    durable: bool,
    written: u64,
    committed: bool,
}

impl<'a, F: PathFacade> PendingWrite<'a, F> {
    /// Path that will be replaced on commit.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path of the staging file.
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Whether commit will fsync before renaming.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Bytes written to the staging file so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Write the whole buffer, reporting failures as [`WriteError`].
    pub fn write_payload(&mut self, bytes: &[u8]) -> WriteResult<()> {
        self.write_all(bytes)
            .map_err(|e| WriteError::io(&self.target, WriteStage::Write, e))
    }

    /// Flush (and, when durable, fsync) the staging file, close it, and
    /// rename it over the target.
    pub fn commit(mut self) -> WriteResult<()> {
        let Some(mut staging) = self.staging.take() else {
            return Err(WriteError::io(
                &self.target,
                WriteStage::Write,
                io::Error::other("staging file already closed"),
            ));
        };

        staging
            .flush()
            .map_err(|e| WriteError::io(&self.target, WriteStage::Write, e))?;
        if self.durable {
            self.fs
                .sync(&mut staging)
                .map_err(|e| WriteError::io(&self.target, WriteStage::Sync, e))?;
        }
        drop(staging);

        self.fs
            .rename(&self.temp, &self.target)
            .map_err(|e| WriteError::io(&self.target, WriteStage::Rename, e))?;
        self.committed = true;

        debug!(
            path = %self.target.display(),
            bytes = self.written,
            durable = self.durable,
            "atomic write committed"
        );
        Ok(())
    }

    /// Discard the staging file without touching the target.
    pub fn rollback(self) {}
}

impl<F: PathFacade> Write for PendingWrite<'_, F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let staging = self
            .staging
            .as_mut()
            .ok_or_else(|| io::Error::other("staging file already closed"))?;
        let n = staging.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.staging.as_mut() {
            Some(staging) => staging.flush(),
            None => Ok(()),
        }
    }
}

impl<F: PathFacade> Drop for PendingWrite<'_, F> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close before unlinking; Windows refuses to delete open files.
        drop(self.staging.take());
        match self.fs.remove_file(&self.temp) {
            Ok(()) => debug!(temp = %self.temp.display(), "staging file discarded"),
            Err(e) => warn!(
                temp = %self.temp.display(),
                error = %e,
                "failed to remove staging file"
            ),
        }
    }
}

impl<F: PathFacade> std::fmt::Debug for PendingWrite<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("target", &self.target)
            .field("temp", &self.temp)
            .field("durable", &self.durable)
            .field("written", &self.written)
            .finish()
    }
}
