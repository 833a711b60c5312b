use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use easyfile_atomic::WriteError;
use easyfile_codec::{CodecError, Format};
use easyfile_offload::OffloadError;

/// Every failure a [`File`](crate::File) operation can report. Each variant
/// names the path involved; codec variants also name the format.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("no such file: {}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("permission denied: {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure outside the read and atomic-write paths: append, touch,
    /// copy, move, metadata.
    #[error("failed while {action} {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {format} from {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        format: Format,
        #[source]
        source: CodecError,
    },

    #[error("failed to encode {format} for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        format: Format,
        #[source]
        source: CodecError,
    },

    #[error("write failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WriteError,
    },

    #[error("{} is not valid UTF-8: {source}", .path.display())]
    InvalidText {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("offloaded operation on {} failed: {source}", .path.display())]
    Offload {
        path: PathBuf,
        #[source]
        source: OffloadError,
    },
}

/// Fieldless discriminant of [`FileError`], for matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Read,
    Io,
    Decode,
    Encode,
    Write,
    InvalidText,
    Offload,
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Read { .. } => ErrorKind::Read,
            Self::Io { .. } => ErrorKind::Io,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::Write { .. } => ErrorKind::Write,
            Self::InvalidText { .. } => ErrorKind::InvalidText,
            Self::Offload { .. } => ErrorKind::Offload,
        }
    }

    /// Path the failed operation targeted.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::Read { path, .. }
            | Self::Io { path, .. }
            | Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Write { path, .. }
            | Self::InvalidText { path, .. }
            | Self::Offload { path, .. } => path,
        }
    }

    /// Format of a codec failure.
    pub fn format(&self) -> Option<Format> {
        match self {
            Self::Decode { format, .. } | Self::Encode { format, .. } => Some(*format),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path, source },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Read { path, source },
        }
    }

    pub(crate) fn io(path: &Path, action: &'static str, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path, source },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io {
                path,
                action,
                source,
            },
        }
    }

    pub(crate) fn decode(path: &Path, format: Format, source: CodecError) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            format,
            source,
        }
    }

    pub(crate) fn encode(path: &Path, format: Format, source: CodecError) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            format,
            source,
        }
    }

    pub(crate) fn offload(path: &Path, source: OffloadError) -> Self {
        Self::Offload {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write failures caused by access control are reported as
/// `PermissionDenied`; the rest keep their protocol stage.
impl From<WriteError> for FileError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Io { path, source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied { path, source }
            }
            other => Self::Write {
                path: other.path().to_path_buf(),
                source: other,
            },
        }
    }
}

/// Result alias for `File` operations.
pub type FileResult<T> = Result<T, FileError>;
