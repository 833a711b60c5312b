use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::traits::{FileMeta, PathFacade};

/// A point in the write path where [`MemoryFs`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaultPoint {
    /// `create_staging` fails before any file is allocated.
    CreateStaging,
    /// Writes to a staging handle fail.
    Write,
    /// `sync` fails.
    Sync,
    /// `rename` fails.
    Rename,
}

#[derive(Clone, Debug)]
struct MemoryFile {
    data: Vec<u8>,
    modified: SystemTime,
}

impl MemoryFile {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            modified: SystemTime::now(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeSet<PathBuf>,
    faults: BTreeSet<FaultPoint>,
    next_staging: u64,
}

impl MemoryState {
    fn check(&self, point: FaultPoint) -> io::Result<()> {
        if self.faults.contains(&point) {
            return Err(io::Error::other(format!("injected fault at {point:?}")));
        }
        Ok(())
    }

    fn require_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.dirs.contains(parent) => {
                Err(not_found(parent))
            }
            _ => Ok(()),
        }
    }
}

/// In-memory path facade.
///
/// Intended for tests and embedding. Files and directories live in ordered
/// maps behind a shared `RwLock`; clones of a `MemoryFs` see the same tree.
/// Faults registered with [`inject_fault`](MemoryFs::inject_fault) stay
/// active until [`clear_faults`](MemoryFs::clear_faults).
#[derive(Clone, Default)]
pub struct MemoryFs {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryFs {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation at `point` fail.
    pub fn inject_fault(&self, point: FaultPoint) {
        self.state.write().expect("lock poisoned").faults.insert(point);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.state.write().expect("lock poisoned").faults.clear();
    }

    /// Number of regular files currently stored.
    pub fn file_count(&self) -> usize {
        self.state.read().expect("lock poisoned").files.len()
    }

    /// Sorted list of every regular file path.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.state
            .read()
            .expect("lock poisoned")
            .files
            .keys()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for MemoryFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("MemoryFs")
            .field("file_count", &state.files.len())
            .field("dir_count", &state.dirs.len())
            .field("faults", &state.faults)
            .finish()
    }
}

/// Write handle to a staging file inside a [`MemoryFs`].
///
/// Bytes land in the shared tree immediately, so the staging file is
/// visible to readers while it is being written.
pub struct MemoryStaging {
    state: Arc<RwLock<MemoryState>>,
    path: PathBuf,
}

impl Write for MemoryStaging {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.write().expect("lock poisoned");
        state.check(FaultPoint::Write)?;
        let file = state
            .files
            .get_mut(&self.path)
            .ok_or_else(|| not_found(&self.path))?;
        file.data.extend_from_slice(buf);
        file.modified = SystemTime::now();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PathFacade for MemoryFs {
    type Staging = MemoryStaging;

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.read().expect("lock poisoned");
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let state = self.state.read().expect("lock poisoned");
        if let Some(file) = state.files.get(path) {
            return Ok(file.data.clone());
        }
        if state.dirs.contains(path) {
            return Err(io::Error::other(format!("{} is a directory", path.display())));
        }
        Err(not_found(path))
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        let state = self.state.read().expect("lock poisoned");
        if let Some(file) = state.files.get(path) {
            return Ok(FileMeta {
                len: file.data.len() as u64,
                is_file: true,
                is_dir: false,
                modified: Some(file.modified),
            });
        }
        if state.dirs.contains(path) {
            return Ok(FileMeta {
                len: 0,
                is_file: false,
                is_dir: true,
                modified: None,
            });
        }
        Err(not_found(path))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let state = self.state.read().expect("lock poisoned");
        if !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        let files = state.files.keys();
        let dirs = state.dirs.iter();
        let mut names: Vec<String> = files
            .chain(dirs)
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut state = self.state.write().expect("lock poisoned");
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            if state.files.contains_key(ancestor) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a directory", ancestor.display()),
                ));
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn create_staging(&self, dir: &Path, prefix: &str) -> io::Result<(PathBuf, MemoryStaging)> {
        let mut state = self.state.write().expect("lock poisoned");
        state.check(FaultPoint::CreateStaging)?;
        if !dir.as_os_str().is_empty() && !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        let path = loop {
            let candidate = dir.join(format!("{prefix}{:06x}", state.next_staging));
            state.next_staging += 1;
            if !state.files.contains_key(&candidate) {
                break candidate;
            }
        };
        state.files.insert(path.clone(), MemoryFile::new(Vec::new()));
        let staging = MemoryStaging {
            state: Arc::clone(&self.state),
            path: path.clone(),
        };
        Ok((path, staging))
    }

    fn sync(&self, _staging: &mut MemoryStaging) -> io::Result<()> {
        self.state.read().expect("lock poisoned").check(FaultPoint::Sync)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.write().expect("lock poisoned");
        state.check(FaultPoint::Rename)?;
        state.require_parent(to)?;
        if state.dirs.contains(to) {
            return Err(io::Error::other(format!("{} is a directory", to.display())));
        }
        let file = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), file);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().expect("lock poisoned");
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.write().expect("lock poisoned");
        state.require_parent(path)?;
        let file = state
            .files
            .entry(path.to_path_buf())
            .or_insert_with(|| MemoryFile::new(Vec::new()));
        file.data.extend_from_slice(data);
        file.modified = SystemTime::now();
        Ok(())
    }

    fn touch(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().expect("lock poisoned");
        state.require_parent(path)?;
        state
            .files
            .entry(path.to_path_buf())
            .or_insert_with(|| MemoryFile::new(Vec::new()))
            .modified = SystemTime::now();
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path, preserve_metadata: bool) -> io::Result<u64> {
        let mut state = self.state.write().expect("lock poisoned");
        state.require_parent(to)?;
        if state.dirs.contains(to) {
            return Err(io::Error::other(format!("{} is a directory", to.display())));
        }
        let source = state.files.get(from).cloned().ok_or_else(|| not_found(from))?;
        let len = source.data.len() as u64;
        let copy = if preserve_metadata {
            source
        } else {
            MemoryFile::new(source.data)
        };
        state.files.insert(to.to_path_buf(), copy);
        Ok(len)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_with_dir(dir: &str) -> MemoryFs {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new(dir)).unwrap();
        fs
    }

    #[test]
    fn create_dir_all_registers_ancestors() {
        let fs = fs_with_dir("/a/b/c");
        assert!(fs.exists(Path::new("/a")));
        assert!(fs.exists(Path::new("/a/b")));
        assert!(fs.metadata(Path::new("/a/b/c")).unwrap().is_dir);
    }

    #[test]
    fn staging_writes_are_visible_and_unique() {
        let fs = fs_with_dir("/data");
        let (first, mut staging) = fs.create_staging(Path::new("/data"), ".f.").unwrap();
        let (second, _other) = fs.create_staging(Path::new("/data"), ".f.").unwrap();
        assert_ne!(first, second);

        staging.write_all(b"hello").unwrap();
        assert_eq!(fs.read(&first).unwrap(), b"hello");
    }

    #[test]
    fn staging_requires_existing_dir() {
        let fs = MemoryFs::new();
        let err = fs.create_staging(Path::new("/missing"), ".f.").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn injected_faults_fire_until_cleared() {
        let fs = fs_with_dir("/data");
        fs.inject_fault(FaultPoint::Rename);

        let (staging, _) = fs.create_staging(Path::new("/data"), ".f.").unwrap();
        assert!(fs.rename(&staging, Path::new("/data/f")).is_err());

        fs.clear_faults();
        fs.rename(&staging, Path::new("/data/f")).unwrap();
        assert!(fs.exists(Path::new("/data/f")));
        assert!(!fs.exists(&staging));
    }

    #[test]
    fn write_fault_rejects_staging_bytes() {
        let fs = fs_with_dir("/data");
        fs.inject_fault(FaultPoint::Write);
        let (_, mut staging) = fs.create_staging(Path::new("/data"), ".f.").unwrap();
        assert!(staging.write_all(b"x").is_err());
    }

    #[test]
    fn copy_onto_directory_fails() {
        let fs = fs_with_dir("/data/sub");
        fs.append(Path::new("/data/a"), b"x").unwrap();
        assert!(fs.copy(Path::new("/data/a"), Path::new("/data/sub"), false).is_err());
        assert_eq!(fs.read(Path::new("/data/a")).unwrap(), b"x");
    }

    #[test]
    fn read_missing_is_not_found() {
        let fs = MemoryFs::new();
        let err = fs.read(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn list_dir_shows_files_and_subdirs() {
        let fs = fs_with_dir("/root/sub");
        fs.append(Path::new("/root/b.txt"), b"b").unwrap();
        fs.append(Path::new("/root/a.txt"), b"a").unwrap();
        assert_eq!(
            fs.list_dir(Path::new("/root")).unwrap(),
            vec!["a.txt", "b.txt", "sub"]
        );
    }

    #[test]
    fn copy_without_metadata_refreshes_mtime() {
        let fs = fs_with_dir("/d");
        fs.append(Path::new("/d/src"), b"data").unwrap();
        let before = fs.metadata(Path::new("/d/src")).unwrap().modified;

        fs.copy(Path::new("/d/src"), Path::new("/d/kept"), true).unwrap();
        assert_eq!(fs.metadata(Path::new("/d/kept")).unwrap().modified, before);

        let len = fs.copy(Path::new("/d/src"), Path::new("/d/fresh"), false).unwrap();
        assert_eq!(len, 4);
        assert_eq!(fs.read(Path::new("/d/fresh")).unwrap(), b"data");
    }
}
