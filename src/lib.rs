//! osbench - write-throughput benchmark harness for transactional object stores
//!
//! osbench drives a configurable write workload against a storage engine and
//! reports aggregate throughput and IOPS. The engine itself is an external
//! collaborator behind the [`engine::StorageEngine`] trait; this crate supplies
//! the workload-generation and synchronization core around it.
//!
//! # Architecture
//!
//! - **Batches**: each worker cycle covers a fixed byte range with an ordered,
//!   ring-wrapping sequence of bounded write operations
//! - **Completion gates**: a one-shot, typed handoff between the engine's
//!   asynchronous apply path and the blocking worker thread
//! - **Workers**: one OS thread per configured worker, each submitting and
//!   awaiting one batch at a time
//! - **Coordinator**: provisions collections/objects, times the parallel run,
//!   and aggregates per-worker counters into the final report

pub mod batch;
pub mod completion;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use batch::{TransactionBatch, WriteOp};
pub use completion::{BatchStatus, CompletionGate};
pub use config::BenchConfig;
pub use coordinator::{BenchReport, Coordinator};
pub use engine::StorageEngine;
pub use util::units::ByteUnits;

/// Result type used throughout osbench
pub type Result<T> = anyhow::Result<T>;
