//! Storage engine abstraction
//!
//! This module defines the boundary between the benchmark core and the
//! transactional object store being measured. The harness never looks inside
//! the engine; it only drives the narrow lifecycle below and submits write
//! batches for asynchronous application.
//!
//! # Lifecycle
//!
//! 1. Construct a concrete engine (e.g. [`mem::MemStore::new`])
//! 2. `format()` the backing store, then `mount()` it
//! 3. Provision with `create_collection` / `touch_object` (synchronous,
//!    strictly before any worker runs)
//! 4. Submit batches with `queue_batch` from any number of threads
//! 5. Tear down with `remove_object` and `unmount`
//!
//! # Thread safety
//!
//! One engine handle is shared across every worker as
//! `Arc<dyn StorageEngine>`; implementations must accept concurrent
//! `queue_batch` calls. Batches submitted under the same [`SequencerId`] are
//! applied in submission order.
//!
//! # Completion contract
//!
//! `queue_batch` is asynchronous and infallible at the call site: every
//! queued batch signals its [`CompletionGate`] **exactly once**, whether the
//! application succeeded or failed. An engine that drops a batch without
//! signaling strands the submitting worker forever; carrying the failure
//! through the gate is what makes that impossible.

use crate::batch::TransactionBatch;
use crate::completion::CompletionGate;
use crate::Result;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod mem;

/// Error surfaced by an engine while applying or provisioning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine is not mounted")]
    NotMounted,

    #[error("collection {0} does not exist")]
    NoSuchCollection(CollectionId),

    #[error("collection {0} already exists")]
    CollectionExists(CollectionId),

    #[error("object {0} does not exist")]
    NoSuchObject(ObjectId),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Named grouping of objects within the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionId(String);

/// Handle naming one object within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

/// Per-client ordering domain for submitted batches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequencerId(String);

macro_rules! string_id {
    ($id:ident) => {
        impl $id {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(CollectionId);
string_id!(ObjectId);
string_id!(SequencerId);

/// The storage engine surface the benchmark depends on.
pub trait StorageEngine: Send + Sync {
    /// Prepare the backing store. Runs once, before `mount`.
    fn format(&self) -> Result<()>;

    /// Bring the store online for provisioning and submission.
    fn mount(&self) -> Result<()>;

    /// Create a collection. Synchronous; fails if it already exists.
    fn create_collection(&self, cid: &CollectionId) -> Result<()>;

    /// Ensure an object exists in a collection. Synchronous.
    fn touch_object(&self, cid: &CollectionId, oid: &ObjectId) -> Result<()>;

    /// Submit a batch for asynchronous application to `oid`.
    ///
    /// The engine takes ownership of the batch and signals `gate` exactly
    /// once, possibly from an engine-owned thread:
    /// [`BatchStatus::Applied`](crate::completion::BatchStatus) on success,
    /// `Failed` otherwise.
    /// Safe to call concurrently from multiple workers; batches sharing a
    /// `sequencer` are applied in submission order.
    fn queue_batch(
        &self,
        sequencer: &SequencerId,
        cid: &CollectionId,
        oid: &ObjectId,
        batch: TransactionBatch,
        gate: Arc<CompletionGate>,
    );

    /// Remove an object. Synchronous.
    fn remove_object(&self, cid: &CollectionId, oid: &ObjectId) -> Result<()>;

    /// Take the store offline, draining any batches still queued.
    fn unmount(&self) -> Result<()>;
}
