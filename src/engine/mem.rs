//! In-memory storage engine
//!
//! [`MemStore`] keeps objects in plain memory and applies batches on its own
//! applier thread, so the full submit/complete path (including gates being
//! signaled from an engine-owned thread) runs without touching a disk. It
//! backs the default binary and every end-to-end test.
//!
//! Apart from storing bytes, the engine tracks how many batches were queued
//! and applied, and can be told to fail the next application
//! ([`MemStore::fail_next_batch`]) to exercise the failure path.

use super::{CollectionId, EngineError, ObjectId, SequencerId, StorageEngine};
use crate::batch::TransactionBatch;
use crate::completion::{BatchStatus, CompletionGate};
use crate::Result;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

type ObjectMap = HashMap<ObjectId, Vec<u8>>;

#[derive(Default)]
struct State {
    formatted: bool,
    collections: HashMap<CollectionId, ObjectMap>,
    queued_batches: u64,
    applied_batches: u64,
    fail_next: bool,
}

/// One submission travelling from a worker to the applier thread.
struct Submission {
    cid: CollectionId,
    oid: ObjectId,
    batch: TransactionBatch,
    gate: Arc<CompletionGate>,
}

struct Applier {
    tx: Sender<Submission>,
    handle: JoinHandle<()>,
}

/// In-memory engine with an asynchronous applier thread.
pub struct MemStore {
    state: Arc<Mutex<State>>,
    applier: Mutex<Option<Applier>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            applier: Mutex::new(None),
        }
    }

    /// Fail the next batch application with a backend error.
    pub fn fail_next_batch(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// Number of batches accepted by `queue_batch` so far.
    pub fn queued_batches(&self) -> u64 {
        self.state.lock().unwrap().queued_batches
    }

    /// Number of batches fully applied so far.
    pub fn applied_batches(&self) -> u64 {
        self.state.lock().unwrap().applied_batches
    }

    pub fn collection_exists(&self, cid: &CollectionId) -> bool {
        self.state.lock().unwrap().collections.contains_key(cid)
    }

    /// Current byte length of an object, if it exists.
    pub fn object_len(&self, cid: &CollectionId, oid: &ObjectId) -> Option<usize> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(cid)
            .and_then(|objects| objects.get(oid))
            .map(Vec::len)
    }

    /// Apply one submission and signal its gate. Runs on the applier thread.
    fn apply(state: &Mutex<State>, sub: Submission) {
        let mut state = state.lock().unwrap();

        if state.fail_next {
            state.fail_next = false;
            drop(state);
            sub.gate.signal(BatchStatus::Failed(EngineError::Backend(
                "injected failure".to_string(),
            )));
            return;
        }

        let Some(objects) = state.collections.get_mut(&sub.cid) else {
            drop(state);
            sub.gate
                .signal(BatchStatus::Failed(EngineError::NoSuchCollection(sub.cid)));
            return;
        };

        // Writes create the object if touch_object never ran for it.
        let object = objects.entry(sub.oid).or_default();
        for op in sub.batch.ops() {
            let end = (op.offset + op.len) as usize;
            if object.len() < end {
                object.resize(end, 0);
            }
            object[op.offset as usize..end].copy_from_slice(op.data());
        }

        state.applied_batches += 1;
        drop(state);
        sub.gate.signal(BatchStatus::Applied);
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for MemStore {
    fn format(&self) -> Result<()> {
        if self.applier.lock().unwrap().is_some() {
            bail!("cannot format a mounted engine");
        }
        let mut state = self.state.lock().unwrap();
        state.collections.clear();
        state.formatted = true;
        Ok(())
    }

    fn mount(&self) -> Result<()> {
        let mut applier = self.applier.lock().unwrap();
        if applier.is_some() {
            bail!("engine is already mounted");
        }
        if !self.state.lock().unwrap().formatted {
            bail!("cannot mount an unformatted engine");
        }

        let (tx, rx) = mpsc::channel::<Submission>();
        let state = Arc::clone(&self.state);
        let handle = thread::spawn(move || {
            // FIFO application preserves per-sequencer submission order.
            for sub in rx {
                Self::apply(&state, sub);
            }
        });

        *applier = Some(Applier { tx, handle });
        Ok(())
    }

    fn create_collection(&self, cid: &CollectionId) -> Result<()> {
        if self.applier.lock().unwrap().is_none() {
            return Err(EngineError::NotMounted.into());
        }
        let mut state = self.state.lock().unwrap();
        if state.collections.contains_key(cid) {
            return Err(EngineError::CollectionExists(cid.clone()).into());
        }
        state.collections.insert(cid.clone(), ObjectMap::new());
        Ok(())
    }

    fn touch_object(&self, cid: &CollectionId, oid: &ObjectId) -> Result<()> {
        if self.applier.lock().unwrap().is_none() {
            return Err(EngineError::NotMounted.into());
        }
        let mut state = self.state.lock().unwrap();
        let objects = state
            .collections
            .get_mut(cid)
            .ok_or_else(|| EngineError::NoSuchCollection(cid.clone()))?;
        objects.entry(oid.clone()).or_default();
        Ok(())
    }

    fn queue_batch(
        &self,
        _sequencer: &SequencerId,
        cid: &CollectionId,
        oid: &ObjectId,
        batch: TransactionBatch,
        gate: Arc<CompletionGate>,
    ) {
        let applier = self.applier.lock().unwrap();
        let Some(applier) = applier.as_ref() else {
            gate.signal(BatchStatus::Failed(EngineError::NotMounted));
            return;
        };

        self.state.lock().unwrap().queued_batches += 1;
        let sub = Submission {
            cid: cid.clone(),
            oid: oid.clone(),
            batch,
            gate,
        };
        if let Err(mpsc::SendError(sub)) = applier.tx.send(sub) {
            // Applier is gone; the batch still gets its one signal.
            sub.gate.signal(BatchStatus::Failed(EngineError::Backend(
                "applier thread exited".to_string(),
            )));
        }
    }

    fn remove_object(&self, cid: &CollectionId, oid: &ObjectId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let objects = state
            .collections
            .get_mut(cid)
            .ok_or_else(|| EngineError::NoSuchCollection(cid.clone()))?;
        objects
            .remove(oid)
            .ok_or_else(|| EngineError::NoSuchObject(oid.clone()))?;
        Ok(())
    }

    fn unmount(&self) -> Result<()> {
        let Some(applier) = self.applier.lock().unwrap().take() else {
            bail!("engine is not mounted");
        };
        // Closing the channel lets the applier drain everything still queued.
        drop(applier.tx);
        applier
            .handle
            .join()
            .map_err(|_| anyhow::anyhow!("applier thread panicked"))?;
        Ok(())
    }
}
