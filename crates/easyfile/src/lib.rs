//! Crash-safe file handling with typed JSON and YAML persistence.
//!
//! [`File`] wraps a path. Writes go through a staging file and an atomic
//! rename, so a reader sees either the old content or the new content and
//! never a partial write. Structured data is loaded and dumped through the
//! JSON/YAML codec, either as a [`Value`] tree or straight into a
//! `serde` type. Every operation returns a [`FileError`] that names the path
//! and, for codec failures, the format.
//!
//! Each operation also has an `_async` form that runs on an
//! [`OffloadScheduler`], and [`File::read_many_async`] reads many files
//! concurrently while keeping input order.
//!
//! ```no_run
//! use easyfile::{File, Format, Mapping};
//!
//! # fn main() -> easyfile::FileResult<()> {
//! let mut settings = Mapping::new();
//! settings.insert("theme", "dark");
//! let file = File::new("settings.json");
//! file.dump_json(&settings, 2)?;
//! assert_eq!(file.load(Format::Json)?["theme"].as_str(), Some("dark"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file;
mod tasks;

pub use config::EasyFileConfig;
pub use error::{ErrorKind, FileError, FileResult};
pub use file::{File, DEFAULT_JSON_INDENT};

pub use easyfile_atomic::{PendingWrite, WriteError, WriteOptions, WriteStage};
pub use easyfile_codec::{CodecError, Format, Mapping, Value};
pub use easyfile_fs::{FaultPoint, LocalFs, MemoryFs, PathFacade};
pub use easyfile_offload::{OffloadConfig, OffloadError, OffloadScheduler};
