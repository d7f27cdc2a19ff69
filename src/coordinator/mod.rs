//! Coordinator module
//!
//! Orchestrates one benchmark run: brings the engine online, provisions the
//! collection and objects, launches the workers, times the whole parallel
//! phase with a single pair of timestamps, and folds the per-worker counters
//! into a [`BenchReport`].

use crate::config::BenchConfig;
use crate::engine::{CollectionId, ObjectId, StorageEngine};
use crate::stats::WorkerStats;
use crate::util::units::ByteUnits;
use crate::worker::Worker;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Aggregate result of one benchmark run.
///
/// Rates use integer arithmetic scaled by a fixed microsecond denominator,
/// so small exact inputs produce exact outputs with no floating-point drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    /// Bytes written across all threads and repeats
    pub total_bytes: ByteUnits,
    /// Wall-clock time for the whole parallel phase, in microseconds
    pub elapsed_us: u64,
    /// Bytes per second
    pub throughput: ByteUnits,
    /// Blocks per second
    pub iops: u64,
    /// Write operations submitted, summed over all workers
    pub write_ops: u64,
}

impl BenchReport {
    fn compute(config: &BenchConfig, elapsed_us: u64, stats: &WorkerStats) -> Self {
        let total = config.size.get() * config.repeats as u64 * config.threads as u64;
        // A sub-microsecond run still divides by something.
        let elapsed_us = elapsed_us.max(1);

        let scaled = 1_000_000u128 * total as u128;
        let throughput = u64::try_from(scaled / elapsed_us as u128).unwrap_or(u64::MAX);
        let iops = u64::try_from(scaled / config.block_size.get() as u128 / elapsed_us as u128)
            .unwrap_or(u64::MAX);

        Self {
            total_bytes: ByteUnits::new(total),
            elapsed_us,
            throughput: ByteUnits::new(throughput),
            iops,
            write_ops: stats.write_ops(),
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} in {}us, at a rate of {}/s and {} iops",
            self.total_bytes, self.elapsed_us, self.throughput, self.iops
        )
    }
}

/// Drives a full benchmark run against one engine.
pub struct Coordinator {
    config: Arc<BenchConfig>,
    engine: Arc<dyn StorageEngine>,
}

impl Coordinator {
    pub fn new(config: Arc<BenchConfig>, engine: Arc<dyn StorageEngine>) -> Self {
        Self { config, engine }
    }

    /// Execute the run: validate, provision, write, report, tear down.
    pub fn run(&self) -> Result<BenchReport> {
        self.config.validate().context("invalid configuration")?;

        self.engine.format().context("failed to format engine")?;
        self.engine.mount().context("failed to mount engine")?;

        let cid = CollectionId::new("osbench");
        self.engine
            .create_collection(&cid)
            .context("failed to create collection")?;

        // Object creation is strictly sequential and completes before any
        // worker thread exists.
        let oids: Vec<ObjectId> = if self.config.multi_object {
            (0..self.config.threads)
                .map(|i| ObjectId::new(format!("osbench-thread-{i}")))
                .collect()
        } else {
            vec![ObjectId::new("osbench")]
        };
        for oid in &oids {
            self.engine
                .touch_object(&cid, oid)
                .with_context(|| format!("failed to create object {oid}"))?;
        }

        let start = Instant::now();
        let workers: Vec<_> = (0..self.config.threads)
            .map(|index| {
                let oid = if self.config.multi_object {
                    oids[index].clone()
                } else {
                    oids[0].clone()
                };
                let worker = Worker::new(
                    index,
                    Arc::clone(&self.config),
                    Arc::clone(&self.engine),
                    cid.clone(),
                    oid,
                );
                thread::spawn(move || worker.run())
            })
            .collect();

        let mut stats = WorkerStats::new();
        for (index, handle) in workers.into_iter().enumerate() {
            let worker_stats = handle
                .join()
                .map_err(|_| anyhow::anyhow!("worker {index} panicked"))?
                .with_context(|| format!("worker {index} failed"))?;
            stats.merge(&worker_stats);
        }
        let elapsed_us = start.elapsed().as_micros() as u64;

        let report = BenchReport::compute(&self.config, elapsed_us, &stats);

        for oid in &oids {
            self.engine
                .remove_object(&cid, oid)
                .with_context(|| format!("failed to remove object {oid}"))?;
        }
        self.engine.unmount().context("failed to unmount engine")?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mem::MemStore;

    fn run(config: BenchConfig) -> (Arc<MemStore>, Result<BenchReport>) {
        let engine = Arc::new(MemStore::new());
        let coordinator = Coordinator::new(Arc::new(config), engine.clone());
        let report = coordinator.run();
        (engine, report)
    }

    #[test]
    fn test_end_to_end_single_thread() {
        // 1 MiB in 4 KiB blocks: 256 write ops, one batch.
        let (engine, report) = run(BenchConfig::default());
        let report = report.unwrap();

        assert_eq!(report.total_bytes, ByteUnits::new(1 << 20));
        assert_eq!(report.write_ops, 256);
        assert!(report.elapsed_us >= 1);
        assert_eq!(engine.queued_batches(), 1);
        assert_eq!(engine.applied_batches(), 1);
    }

    #[test]
    fn test_end_to_end_shared_object() {
        let config = BenchConfig {
            threads: 4,
            repeats: 2,
            ..Default::default()
        };
        let (engine, report) = run(config);
        let report = report.unwrap();

        assert_eq!(report.total_bytes, ByteUnits::new(8 << 20));
        assert_eq!(report.write_ops, 4 * 2 * 256);
        assert_eq!(engine.applied_batches(), 8);
    }

    #[test]
    fn test_end_to_end_multi_object() {
        let config = BenchConfig {
            threads: 2,
            multi_object: true,
            ..Default::default()
        };
        let (engine, report) = run(config);
        report.unwrap();

        assert_eq!(engine.applied_batches(), 2);
        // Teardown removed every per-thread object.
        let cid = CollectionId::new("osbench");
        for i in 0..2 {
            let oid = ObjectId::new(format!("osbench-thread-{i}"));
            assert_eq!(engine.object_len(&cid, &oid), None);
        }
    }

    #[test]
    fn test_objects_are_removed_on_teardown() {
        let (engine, report) = run(BenchConfig::default());
        report.unwrap();

        let cid = CollectionId::new("osbench");
        assert!(engine.collection_exists(&cid));
        assert_eq!(engine.object_len(&cid, &ObjectId::new("osbench")), None);
    }

    #[test]
    fn test_invalid_configuration_never_touches_the_engine() {
        let config = BenchConfig {
            threads: 3, // misaligned starting offsets for 1 MiB / 4 KiB
            ..Default::default()
        };
        let (engine, report) = run(config);
        assert!(report.is_err());
        assert_eq!(engine.queued_batches(), 0);
        assert!(!engine.collection_exists(&CollectionId::new("osbench")));
    }

    #[test]
    fn test_engine_failure_aborts_the_run() {
        let engine = Arc::new(MemStore::new());
        engine.fail_next_batch();
        let coordinator = Coordinator::new(Arc::new(BenchConfig::default()), engine.clone());
        assert!(coordinator.run().is_err());
    }

    #[test]
    fn test_report_rates_are_exact_for_exact_inputs() {
        let config = BenchConfig::default();
        let mut stats = WorkerStats::new();
        let data: Arc<[u8]> = vec![0u8; 4096].into();
        stats.record_batch(&crate::batch::TransactionBatch::build(1 << 20, 4096, 0, &data));

        // 1 MiB in exactly one second.
        let report = BenchReport::compute(&config, 1_000_000, &stats);
        assert_eq!(report.throughput, ByteUnits::new(1 << 20));
        assert_eq!(report.iops, 256);
        assert_eq!(report.to_string(), "Wrote 1 MB in 1000000us, at a rate of 1 MB/s and 256 iops");
    }

    #[test]
    fn test_report_clamps_zero_elapsed() {
        let report = BenchReport::compute(&BenchConfig::default(), 0, &WorkerStats::new());
        assert_eq!(report.elapsed_us, 1);
    }
}
