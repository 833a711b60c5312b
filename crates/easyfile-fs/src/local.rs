use std::fs::{self, File, FileTimes, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::traits::{FileMeta, PathFacade};

/// Path facade backed by the local disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local-disk facade.
    pub fn new() -> Self {
        Self
    }
}

impl PathFacade for LocalFs {
    type Staging = File;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        let meta = fs::metadata(path)?;
        Ok(FileMeta {
            len: meta.len(),
            is_file: meta.is_file(),
            is_dir: meta.is_dir(),
            modified: meta.modified().ok(),
        })
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        if dir.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(dir)
    }

    fn create_staging(&self, dir: &Path, prefix: &str) -> io::Result<(PathBuf, File)> {
        // `keep` disables tempfile's own cleanup; the atomic writer owns the
        // lifecycle of the staging file from here on.
        let (file, path) = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(dir)?
            .keep()?;
        debug!(path = %path.display(), "staging file created");
        Ok((path, file))
    }

    fn sync(&self, staging: &mut File) -> io::Result<()> {
        staging.flush()?;
        staging.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data)
    }

    fn touch(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        file.set_modified(SystemTime::now())
    }

    fn copy(&self, from: &Path, to: &Path, preserve_metadata: bool) -> io::Result<u64> {
        let copied = fs::copy(from, to)?;
        if preserve_metadata {
            let meta = fs::metadata(from)?;
            let times = FileTimes::new()
                .set_accessed(meta.accessed()?)
                .set_modified(meta.modified()?);
            OpenOptions::new().write(true).open(to)?.set_times(times)?;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn staging_file_lives_in_target_dir_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();

        let (path, mut file) = fs.create_staging(dir.path(), ".data.json.").unwrap();
        file.write_all(b"abc").unwrap();
        fs.sync(&mut file).unwrap();
        drop(file);

        assert_eq!(path.parent().unwrap(), dir.path());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".data.json."));
        assert!(name.len() > ".data.json.".len());
        assert_eq!(fs.read(&path).unwrap(), b"abc");
    }

    #[test]
    fn staging_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();

        let (a, _fa) = fs.create_staging(dir.path(), ".x.").unwrap();
        let (b, _fb) = fs.create_staging(dir.path(), ".x.").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rename_replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();
        let target = dir.path().join("target.txt");
        let source = dir.path().join("source.txt");
        std::fs::write(&target, b"old").unwrap();
        std::fs::write(&source, b"new").unwrap();

        fs.rename(&source, &target).unwrap();

        assert_eq!(fs.read(&target).unwrap(), b"new");
        assert!(!fs.exists(&source));
    }

    #[test]
    fn append_creates_then_extends() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();
        let path = dir.path().join("log.txt");

        fs.append(&path, b"First line\n").unwrap();
        fs.append(&path, b"Second line\n").unwrap();

        assert_eq!(fs.read(&path).unwrap(), b"First line\nSecond line\n");
    }

    #[test]
    fn copy_preserves_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();
        let source = dir.path().join("source.bin");
        let target = dir.path().join("target.bin");
        std::fs::write(&source, b"\x00\x01\x02\x03").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        OpenOptions::new()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let copied = fs.copy(&source, &target, true).unwrap();
        assert_eq!(copied, 4);
        assert_eq!(fs.read(&target).unwrap(), b"\x00\x01\x02\x03");
        assert_eq!(
            fs.metadata(&target).unwrap().modified,
            fs.metadata(&source).unwrap().modified
        );
    }

    #[test]
    fn list_dir_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new();
        for name in ["b.txt", "a.txt", "c.txt"] {
            fs.touch(&dir.path().join(name)).unwrap();
        }
        assert_eq!(fs.list_dir(dir.path()).unwrap(), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn metadata_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFs::new().metadata(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
