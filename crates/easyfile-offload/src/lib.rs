//! Async offload for easyfile.
//!
//! File I/O is blocking. [`OffloadScheduler`] moves it onto tokio's blocking
//! pool behind a semaphore, so at most `max_workers` jobs touch the disk at
//! once. [`OffloadScheduler::submit`] returns a [`TaskHandle`] future;
//! [`OffloadScheduler::batch`] runs many jobs concurrently and hands results
//! back in input order. There is no cancellation: a job that has started
//! always runs to completion, and no job is ever retried.

pub mod config;
pub mod error;
pub mod scheduler;

pub use config::{default_max_workers, OffloadConfig};
pub use error::{OffloadError, OffloadResult};
pub use scheduler::{OffloadScheduler, TaskHandle};
