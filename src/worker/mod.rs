//! Worker thread implementation
//!
//! Each worker owns one slice of the workload: starting from a fixed offset
//! assigned at launch, it builds a batch covering the configured size, hands
//! it to the engine with a fresh completion gate, blocks until the engine
//! signals, and repeats. Workers share nothing mutable beyond the read-only
//! configuration and the engine handle, whose contract permits concurrent
//! submission.
//!
//! A batch and its gate live for exactly one cycle: constructed before
//! submission, dropped as soon as the completion signal is observed.

use crate::batch::TransactionBatch;
use crate::completion::CompletionGate;
use crate::config::BenchConfig;
use crate::engine::{CollectionId, ObjectId, SequencerId, StorageEngine};
use crate::stats::WorkerStats;
use crate::Result;
use anyhow::Context;
use std::sync::Arc;

/// One benchmark worker, bound to its object and starting offset.
pub struct Worker {
    id: usize,
    config: Arc<BenchConfig>,
    engine: Arc<dyn StorageEngine>,
    cid: CollectionId,
    oid: ObjectId,
    starting_offset: u64,
}

impl Worker {
    pub fn new(
        id: usize,
        config: Arc<BenchConfig>,
        engine: Arc<dyn StorageEngine>,
        cid: CollectionId,
        oid: ObjectId,
    ) -> Self {
        let starting_offset = config.starting_offset(id);
        Self {
            id,
            config,
            engine,
            cid,
            oid,
            starting_offset,
        }
    }

    /// Run `repeats` write cycles and return this worker's counters.
    ///
    /// A `Failed` completion aborts the worker with the engine's error;
    /// there is no retry or partial-cycle recovery.
    pub fn run(&self) -> Result<WorkerStats> {
        let size = self.config.size.get();
        let block_size = self.config.block_size.get();

        assert!(self.starting_offset < size);
        assert!(self.starting_offset % block_size == 0);

        // One zeroed block, shared by every op this worker ever submits.
        let data: Arc<[u8]> = vec![0u8; block_size as usize].into();
        let sequencer = SequencerId::new(format!("osbench-{}", self.id));

        let mut stats = WorkerStats::new();
        for cycle in 0..self.config.repeats {
            let batch =
                TransactionBatch::build(size, block_size, self.starting_offset, &data);
            stats.record_batch(&batch);

            let gate = Arc::new(CompletionGate::new());
            self.engine
                .queue_batch(&sequencer, &self.cid, &self.oid, batch, Arc::clone(&gate));

            gate.wait().into_result().with_context(|| {
                format!("worker {} failed in write cycle {}", self.id, cycle)
            })?;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mem::MemStore;
    use crate::ByteUnits;

    fn provisioned() -> (Arc<MemStore>, CollectionId, ObjectId) {
        let store = Arc::new(MemStore::new());
        store.format().unwrap();
        store.mount().unwrap();
        let cid = CollectionId::new("c");
        let oid = ObjectId::new("o");
        store.create_collection(&cid).unwrap();
        store.touch_object(&cid, &oid).unwrap();
        (store, cid, oid)
    }

    #[test]
    fn test_worker_submits_one_batch_per_repeat() {
        let config = Arc::new(BenchConfig {
            size: ByteUnits::new(64 << 10),
            repeats: 3,
            ..Default::default()
        });
        let (store, cid, oid) = provisioned();

        let worker = Worker::new(0, Arc::clone(&config), store.clone(), cid.clone(), oid.clone());
        let stats = worker.run().unwrap();

        assert_eq!(stats.cycles(), 3);
        assert_eq!(stats.write_ops(), 3 * (64 / 4));
        assert_eq!(stats.bytes_written(), 3 * (64 << 10));
        assert_eq!(store.applied_batches(), 3);
        assert_eq!(store.object_len(&cid, &oid), Some(64 << 10));
    }

    #[test]
    fn test_worker_restarts_from_its_fixed_offset() {
        let config = Arc::new(BenchConfig {
            size: ByteUnits::new(16 << 10),
            threads: 2,
            repeats: 2,
            ..Default::default()
        });
        let (store, cid, oid) = provisioned();

        // Worker 1 of 2 starts mid-object and wraps; the object still ends up
        // fully covered.
        let worker = Worker::new(1, Arc::clone(&config), store.clone(), cid.clone(), oid.clone());
        worker.run().unwrap();
        assert_eq!(store.object_len(&cid, &oid), Some(16 << 10));
    }

    #[test]
    fn test_worker_propagates_engine_failure() {
        let config = Arc::new(BenchConfig::default());
        let (store, cid, oid) = provisioned();

        store.fail_next_batch();
        let worker = Worker::new(0, config, store, cid, oid);
        assert!(worker.run().is_err());
    }
}
