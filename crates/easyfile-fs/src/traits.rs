use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Metadata snapshot for a single path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMeta {
    /// Size in bytes (zero for directories on the memory backend).
    pub len: u64,
    /// `true` for regular files.
    pub is_file: bool,
    /// `true` for directories.
    pub is_dir: bool,
    /// Last modification time, when the backend reports one.
    pub modified: Option<SystemTime>,
}

/// Filesystem operations consumed by the atomic writer and the `File` handle.
///
/// Implementations must satisfy these invariants:
/// - `create_staging` allocates a fresh, uniquely named file inside `dir`
///   and never reuses a name that currently exists.
/// - `rename` replaces `to` in a single step: readers observe either the old
///   target or the complete new one.
/// - No operation retries internally; every failure is returned as-is.
pub trait PathFacade: Send + Sync {
    /// Writable handle to a staging file created by [`create_staging`].
    ///
    /// Dropping the handle closes it.
    ///
    /// [`create_staging`]: PathFacade::create_staging
    type Staging: Write + Send;

    /// Returns `true` if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Query metadata for `path`.
    fn metadata(&self, path: &Path) -> io::Result<FileMeta>;

    /// List the entry names directly inside `dir`, sorted.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Create `dir` and all missing ancestors. Existing directories are fine.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Create a new staging file in `dir` whose name starts with `prefix`
    /// followed by a unique suffix. Returns the path and an open handle.
    fn create_staging(&self, dir: &Path, prefix: &str) -> io::Result<(PathBuf, Self::Staging)>;

    /// Force the staging file's contents to stable storage.
    fn sync(&self, staging: &mut Self::Staging) -> io::Result<()>;

    /// Atomically move `from` over `to`, replacing any existing file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove the file at `path`.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Append `data` to the file at `path`, creating it if absent.
    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Create an empty file at `path` if absent, otherwise bump its
    /// modification time.
    fn touch(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` to `to`, returning the number of bytes copied.
    ///
    /// With `preserve_metadata`, the access and modification times of the
    /// source are carried over to the copy.
    fn copy(&self, from: &Path, to: &Path, preserve_metadata: bool) -> io::Result<u64>;
}
