use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use easyfile_atomic::{AtomicWriter, PendingWrite, WriteOptions};
use easyfile_codec::{self as codec, Format, Value};
use easyfile_fs::{LocalFs, PathFacade};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{FileError, FileResult};

/// Default JSON indentation for [`File::dump_json`] callers that have no
/// preference.
pub const DEFAULT_JSON_INDENT: usize = 2;

/// A path plus the facade used to reach it.
///
/// `File` holds no open descriptor and no mutable state. Any number of
/// handles may point at the same path; concurrent writers never tear the
/// target, and the last rename wins.
pub struct File<F: PathFacade = LocalFs> {
    path: PathBuf,
    fs: Arc<F>,
    options: WriteOptions,
}

impl File<LocalFs> {
    /// Handle to `path` on the local filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_facade(path, Arc::new(LocalFs::new()))
    }
}

impl<F: PathFacade> File<F> {
    /// Handle to `path` through an explicit facade.
    pub fn with_facade(path: impl Into<PathBuf>, fs: Arc<F>) -> Self {
        Self {
            path: path.into(),
            fs,
            options: WriteOptions::default(),
        }
    }

    /// Use `options` for every write made through this handle.
    pub fn with_write_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn write_options(&self) -> WriteOptions {
        self.options
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    pub fn facade(&self) -> &Arc<F> {
        &self.fs
    }

    /// Handle to another path sharing this handle's facade and options.
    pub fn sibling(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs: Arc::clone(&self.fs),
            options: self.options,
        }
    }

    pub fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> FileResult<u64> {
        self.fs
            .metadata(&self.path)
            .map(|meta| meta.len)
            .map_err(|e| FileError::io(&self.path, "querying metadata of", e))
    }

    // ---- Bytes and text ----

    pub fn read_bytes(&self) -> FileResult<Vec<u8>> {
        self.fs.read(&self.path).map_err(|e| FileError::read(&self.path, e))
    }

    /// Read the file as UTF-8. Invalid sequences are an error, never
    /// replaced.
    pub fn read_text(&self) -> FileResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|source| FileError::InvalidText {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the file's contents atomically, creating parent directories.
    pub fn write_bytes(&self, bytes: &[u8]) -> FileResult<()> {
        self.writer().write(&self.path, bytes)?;
        Ok(())
    }

    pub fn write_text(&self, text: &str) -> FileResult<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Append `text`, creating the file and its parent directories if
    /// needed. Appends are not atomic.
    pub fn append_text(&self, text: &str) -> FileResult<()> {
        self.create_parent()?;
        self.fs
            .append(&self.path, text.as_bytes())
            .map_err(|e| FileError::io(&self.path, "appending to", e))
    }

    /// Create parent directories, then create the file or bump its
    /// modification time.
    pub fn touch_parents(&self) -> FileResult<()> {
        self.create_parent()?;
        self.fs
            .touch(&self.path)
            .map_err(|e| FileError::io(&self.path, "touching", e))
    }

    // ---- Copy and move ----

    /// Copy to `target`, creating its parent directories. With
    /// `preserve_metadata` the timestamps are carried over.
    pub fn copy_to(&self, target: impl Into<PathBuf>, preserve_metadata: bool) -> FileResult<Self> {
        let target = self.sibling(target);
        target.create_parent()?;
        let bytes = self
            .fs
            .copy(&self.path, &target.path, preserve_metadata)
            .map_err(|e| self.copy_error(&target, "copying", e))?;
        debug!(from = %self.path.display(), to = %target.path.display(), bytes, "copied file");
        Ok(target)
    }

    /// Move to `target`, creating its parent directories.
    ///
    /// Tries a rename first; if that fails while the source still exists
    /// (for example across filesystems), falls back to copy then delete.
    pub fn move_to(&self, target: impl Into<PathBuf>) -> FileResult<Self> {
        let target = self.sibling(target);
        target.create_parent()?;

        match self.fs.rename(&self.path, &target.path) {
            Ok(()) => {}
            Err(e) if !self.fs.exists(&self.path) => {
                return Err(FileError::io(&self.path, "moving", e));
            }
            Err(e) => {
                debug!(from = %self.path.display(), error = %e, "rename failed, copying instead");
                self.fs
                    .copy(&self.path, &target.path, true)
                    .map_err(|e| self.copy_error(&target, "moving", e))?;
                self.fs
                    .remove_file(&self.path)
                    .map_err(|e| FileError::io(&self.path, "removing", e))?;
            }
        }
        Ok(target)
    }

    // ---- Structured data ----

    /// Decode the file as `format` into a [`Value`].
    pub fn load(&self, format: Format) -> FileResult<Value> {
        let bytes = self.read_bytes()?;
        codec::decode(&bytes, format).map_err(|e| FileError::decode(&self.path, format, e))
    }

    /// Decode the file as `format` directly into `T`.
    pub fn load_as<T: DeserializeOwned>(&self, format: Format) -> FileResult<T> {
        let bytes = self.read_bytes()?;
        codec::decode_as(&bytes, format).map_err(|e| FileError::decode(&self.path, format, e))
    }

    /// Encode `value` as `format` and write it atomically.
    ///
    /// Encoding happens first; if it fails, the file is never touched.
    /// `indent` only affects JSON, where `0` means compact output.
    pub fn dump<T: Serialize + ?Sized>(&self, value: &T, format: Format, indent: usize) -> FileResult<()> {
        let bytes = codec::encode(value, format, indent)
            .map_err(|e| FileError::encode(&self.path, format, e))?;
        self.write_bytes(&bytes)?;
        debug!(path = %self.path.display(), %format, bytes = bytes.len(), "dumped value");
        Ok(())
    }

    pub fn load_json(&self) -> FileResult<Value> {
        self.load(Format::Json)
    }

    pub fn load_json_as<T: DeserializeOwned>(&self) -> FileResult<T> {
        self.load_as(Format::Json)
    }

    /// See [`DEFAULT_JSON_INDENT`] for the conventional `indent`.
    pub fn dump_json<T: Serialize + ?Sized>(&self, value: &T, indent: usize) -> FileResult<()> {
        self.dump(value, Format::Json, indent)
    }

    pub fn load_yaml(&self) -> FileResult<Value> {
        self.load(Format::Yaml)
    }

    pub fn load_yaml_as<T: DeserializeOwned>(&self) -> FileResult<T> {
        self.load_as(Format::Yaml)
    }

    pub fn dump_yaml<T: Serialize + ?Sized>(&self, value: &T) -> FileResult<()> {
        self.dump(value, Format::Yaml, 0)
    }

    // ---- Scoped writes ----

    /// Write through a staging file: `f` gets an [`io::Write`] guard, and the
    /// target is replaced only if `f` returns `Ok`. On `Err` or panic the
    /// staging file is deleted and the target is left as it was.
    pub fn atomic_write<R>(
        &self,
        f: impl FnOnce(&mut PendingWrite<'_, F>) -> io::Result<R>,
    ) -> FileResult<R> {
        let mut pending = self.begin_write()?;
        let out = f(&mut pending).map_err(|e| FileError::io(&self.path, "writing", e))?;
        pending.commit()?;
        Ok(out)
    }

    /// Open a staging file for the target. Call
    /// [`PendingWrite::commit`] to publish it; dropping the guard discards it.
    pub fn begin_write(&self) -> FileResult<PendingWrite<'_, F>> {
        Ok(self.writer().begin(&self.path)?)
    }

    fn writer(&self) -> AtomicWriter<'_, F> {
        AtomicWriter::with_options(self.fs.as_ref(), self.options)
    }

    fn create_parent(&self) -> FileResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self
                .fs
                .create_dir_all(parent)
                .map_err(|e| FileError::io(parent, "creating directory", e)),
            _ => Ok(()),
        }
    }

    /// A copy failure belongs to the source only while the source is not a
    /// readable file; otherwise the target side failed.
    fn copy_error(&self, target: &Self, action: &'static str, source: io::Error) -> FileError {
        let source_ok = self.fs.metadata(&self.path).is_ok_and(|meta| meta.is_file);
        let path = if source_ok { &target.path } else { &self.path };
        FileError::io(path, action, source)
    }
}

impl<F: PathFacade> Clone for File<F> {
    fn clone(&self) -> Self {
        self.sibling(self.path.clone())
    }
}

impl<F: PathFacade> AsRef<Path> for File<F> {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl<F: PathFacade> fmt::Display for File<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl<F: PathFacade> fmt::Debug for File<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("durable", &self.options.durable)
            .finish()
    }
}
