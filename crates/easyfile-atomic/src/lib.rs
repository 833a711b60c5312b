//! Atomic, optionally durable file writes for easyfile.
//!
//! A write never exposes a partially written target. The protocol is:
//!
//! 1. create the target's parent directory if needed
//! 2. create `.<file-name>.<unique-suffix>` in that directory
//! 3. write the payload into it
//! 4. `fsync` it when [`WriteOptions::durable`] is set, then close it
//! 5. rename it over the target in one step
//!
//! Any failure after step 2 deletes the staging file before the error is
//! returned. Cleanup failures are logged and never replace the original
//! error.
//!
//! Two entry points share the protocol: [`AtomicWriter::write`] for a ready
//! buffer, and [`AtomicWriter::begin`] / [`AtomicWriter::write_with`] for
//! incremental output through a [`PendingWrite`] guard that rolls back on
//! drop unless committed.

pub mod error;
pub mod writer;

pub use error::{WriteError, WriteResult, WriteStage};
pub use writer::{AtomicWriter, PendingWrite, WriteOptions};
