use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Step of the atomic write protocol at which a failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStage {
    CreateParent,
    CreateTemp,
    Write,
    Sync,
    Rename,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CreateParent => "creating parent directory",
            Self::CreateTemp => "creating staging file",
            Self::Write => "writing staging file",
            Self::Sync => "syncing staging file",
            Self::Rename => "renaming into place",
        };
        f.write_str(text)
    }
}

/// Errors from atomic writes. The target path is never modified when one of
/// these is returned.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The target path has no file name component (e.g. `/` or `dir/..`).
    #[error("cannot write to {}: path has no file name", .0.display())]
    InvalidTarget(PathBuf),

    /// An I/O failure at one of the protocol stages.
    #[error("atomic write to {} failed while {stage}: {source}", .path.display())]
    Io {
        path: PathBuf,
        stage: WriteStage,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    pub(crate) fn io(path: &Path, stage: WriteStage, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            stage,
            source,
        }
    }

    /// Target path of the failed write.
    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidTarget(path) => path,
            Self::Io { path, .. } => path,
        }
    }

    /// Protocol stage that failed, if the failure was an I/O error.
    pub fn stage(&self) -> Option<WriteStage> {
        match self {
            Self::InvalidTarget(_) => None,
            Self::Io { stage, .. } => Some(*stage),
        }
    }

    /// Kind of the underlying I/O error, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::InvalidTarget(_) => None,
            Self::Io { source, .. } => Some(source.kind()),
        }
    }
}

/// Result alias for atomic write operations.
pub type WriteResult<T> = Result<T, WriteError>;
