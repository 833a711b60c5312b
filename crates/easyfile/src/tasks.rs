//! Async counterparts of the [`File`] operations.
//!
//! Each method clones the handle into a blocking job on an
//! [`OffloadScheduler`] and awaits it. The await is the only suspension
//! point; the I/O itself is never interrupted. A scheduler failure (worker
//! panic, closed scheduler) is reported as [`FileError::Offload`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use easyfile_codec::{Format, Value};
use easyfile_fs::{LocalFs, PathFacade};
use easyfile_offload::OffloadScheduler;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{FileError, FileResult};
use crate::file::File;

impl<F: PathFacade + 'static> File<F> {
    async fn offload<T, W>(&self, sched: &OffloadScheduler, work: W) -> FileResult<T>
    where
        W: FnOnce(File<F>) -> FileResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let file = self.clone();
        sched
            .submit(move || work(file))
            .await
            .map_err(|e| FileError::offload(self.path(), e))?
    }

    pub async fn exists_async(&self, sched: &OffloadScheduler) -> FileResult<bool> {
        self.offload(sched, |file| Ok(file.exists())).await
    }

    pub async fn size_async(&self, sched: &OffloadScheduler) -> FileResult<u64> {
        self.offload(sched, |file| file.size()).await
    }

    pub async fn read_bytes_async(&self, sched: &OffloadScheduler) -> FileResult<Vec<u8>> {
        self.offload(sched, |file| file.read_bytes()).await
    }

    pub async fn read_text_async(&self, sched: &OffloadScheduler) -> FileResult<String> {
        self.offload(sched, |file| file.read_text()).await
    }

    pub async fn write_bytes_async(&self, sched: &OffloadScheduler, bytes: Vec<u8>) -> FileResult<()> {
        self.offload(sched, move |file| file.write_bytes(&bytes)).await
    }

    pub async fn write_text_async(&self, sched: &OffloadScheduler, text: String) -> FileResult<()> {
        self.offload(sched, move |file| file.write_text(&text)).await
    }

    pub async fn append_text_async(&self, sched: &OffloadScheduler, text: String) -> FileResult<()> {
        self.offload(sched, move |file| file.append_text(&text)).await
    }

    pub async fn touch_parents_async(&self, sched: &OffloadScheduler) -> FileResult<()> {
        self.offload(sched, |file| file.touch_parents()).await
    }

    pub async fn copy_to_async(
        &self,
        sched: &OffloadScheduler,
        target: PathBuf,
        preserve_metadata: bool,
    ) -> FileResult<File<F>> {
        self.offload(sched, move |file| file.copy_to(target, preserve_metadata))
            .await
    }

    pub async fn move_to_async(&self, sched: &OffloadScheduler, target: PathBuf) -> FileResult<File<F>> {
        self.offload(sched, move |file| file.move_to(target)).await
    }

    pub async fn load_async(&self, sched: &OffloadScheduler, format: Format) -> FileResult<Value> {
        self.offload(sched, move |file| file.load(format)).await
    }

    pub async fn load_as_async<T>(&self, sched: &OffloadScheduler, format: Format) -> FileResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.offload(sched, move |file| file.load_as(format)).await
    }

    /// Takes `value` by value because it moves to a worker thread.
    pub async fn dump_async<T>(
        &self,
        sched: &OffloadScheduler,
        value: T,
        format: Format,
        indent: usize,
    ) -> FileResult<()>
    where
        T: Serialize + Send + 'static,
    {
        self.offload(sched, move |file| file.dump(&value, format, indent))
            .await
    }

    pub async fn load_json_async(&self, sched: &OffloadScheduler) -> FileResult<Value> {
        self.load_async(sched, Format::Json).await
    }

    pub async fn dump_json_async<T>(&self, sched: &OffloadScheduler, value: T, indent: usize) -> FileResult<()>
    where
        T: Serialize + Send + 'static,
    {
        self.dump_async(sched, value, Format::Json, indent).await
    }

    pub async fn load_yaml_async(&self, sched: &OffloadScheduler) -> FileResult<Value> {
        self.load_async(sched, Format::Yaml).await
    }

    pub async fn dump_yaml_async<T>(&self, sched: &OffloadScheduler, value: T) -> FileResult<()>
    where
        T: Serialize + Send + 'static,
    {
        self.dump_async(sched, value, Format::Yaml, 0).await
    }

    /// Read every path as text through `fs`, concurrently, and return the
    /// contents in input order. Duplicated paths are read once per
    /// occurrence. The first failure in input order fails the whole call.
    pub async fn read_many_with<P, I>(
        fs: &Arc<F>,
        sched: &OffloadScheduler,
        paths: I,
    ) -> FileResult<Vec<String>>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        let files: Vec<File<F>> = paths
            .into_iter()
            .map(|p| File::with_facade(p.as_ref(), Arc::clone(fs)))
            .collect();
        let jobs = files.iter().cloned().map(|file| move || file.read_text());
        let results = sched.batch(jobs).await;
        debug!(files = files.len(), "read_many complete");

        files
            .iter()
            .zip(results)
            .map(|(file, result)| result.map_err(|e| FileError::offload(file.path(), e))?)
            .collect()
    }
}

impl File<LocalFs> {
    /// [`File::read_many_with`] on the local filesystem.
    pub async fn read_many_async<P, I>(sched: &OffloadScheduler, paths: I) -> FileResult<Vec<String>>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        File::read_many_with(&Arc::new(LocalFs::new()), sched, paths).await
    }
}
