//! Run configuration
//!
//! One immutable [`BenchConfig`] is built from the command line, validated
//! once, and passed by `Arc` into the coordinator and every worker. Nothing
//! reads configuration from global state.

pub mod cli;

use crate::util::units::ByteUnits;
use crate::Result;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable configuration for one benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Total bytes written per thread per cycle
    pub size: ByteUnits,
    /// Write granularity
    pub block_size: ByteUnits,
    /// Number of write cycles per thread
    pub repeats: u32,
    /// Number of worker threads
    pub threads: usize,
    /// Each thread writes its own object instead of sharing one
    pub multi_object: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            size: ByteUnits::new(1 << 20),
            block_size: ByteUnits::new(4096),
            repeats: 1,
            threads: 1,
            multi_object: false,
        }
    }
}

impl BenchConfig {
    /// Fixed starting offset for worker `index`: `index * size / threads`,
    /// truncated toward zero.
    pub fn starting_offset(&self, index: usize) -> u64 {
        (index as u128 * self.size.get() as u128 / self.threads as u128) as u64
    }

    /// Check the invariants the rest of the run relies on.
    ///
    /// Beyond positive sizes and counts, every per-worker starting offset
    /// must land on a block boundary. The batch builder requires it, and
    /// rejecting the combination here keeps the failure ahead of any engine
    /// interaction.
    pub fn validate(&self) -> Result<()> {
        if self.size.get() == 0 {
            bail!("size must be greater than 0");
        }
        if self.block_size.get() == 0 {
            bail!("block-size must be greater than 0");
        }
        if self.repeats == 0 {
            bail!("repeats must be greater than 0");
        }
        if self.threads == 0 {
            bail!("threads must be greater than 0");
        }
        for index in 0..self.threads {
            let offset = self.starting_offset(index);
            if offset % self.block_size.get() != 0 {
                bail!(
                    "thread {} would start at offset {}, which is not a multiple of \
                     the {} block size; adjust --threads, --size or --block-size",
                    index,
                    offset,
                    self.block_size
                );
            }
        }
        Ok(())
    }
}

impl fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={}, block-size={}, repeats={}, threads={}, multi-object={}",
            self.size, self.block_size, self.repeats, self.threads, self.multi_object
        )
    }
}
