//! Path facade for easyfile.
//!
//! Everything above this crate touches the filesystem through the
//! [`PathFacade`] trait: byte reads, parent-directory creation, staging
//! files for atomic writes, rename, and metadata queries. Two backends are
//! provided:
//!
//! - [`LocalFs`] -- the real disk via `std::fs`, with `tempfile` allocating
//!   uniquely named staging files
//! - [`MemoryFs`] -- a map-backed filesystem for tests and embedding, with
//!   [`FaultPoint`] injection for exercising failure paths
//!
//! The facade never interprets file contents and never retries. All errors
//! are plain `std::io::Error` values; classification happens in the layers
//! above.

pub mod local;
pub mod memory;
pub mod traits;

pub use local::LocalFs;
pub use memory::{FaultPoint, MemoryFs};
pub use traits::{FileMeta, PathFacade};
