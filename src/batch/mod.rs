//! Write batches
//!
//! One benchmark cycle writes `total_size` bytes to an object as an ordered
//! sequence of block-sized write operations, submitted to the engine as a
//! single [`TransactionBatch`]. Offsets wrap around the object like a ring, so
//! a worker whose starting offset sits mid-object still covers the full range.
//!
//! The payload is irrelevant to the benchmark: every op in a worker's lifetime
//! shares one block-sized buffer, allocated once and never written to again.

use std::fmt;
use std::sync::Arc;

/// A single bounded write: `len` bytes of the shared block buffer at `offset`.
#[derive(Clone)]
pub struct WriteOp {
    pub offset: u64,
    pub len: u64,
    data: Arc<[u8]>,
}

impl WriteOp {
    /// The bytes this op writes (`len` is never larger than the block buffer).
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

impl fmt::Debug for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOp")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// An ordered sequence of write ops whose lengths sum to exactly the cycle
/// size. Owned by the worker that built it and dropped as soon as its
/// completion signal is observed.
#[derive(Debug)]
pub struct TransactionBatch {
    ops: Vec<WriteOp>,
}

impl TransactionBatch {
    /// Build the op sequence for one cycle.
    ///
    /// Starting at `start_offset`, emits `min(remaining, block_size)`-byte ops
    /// until `total_size` bytes are covered, wrapping the offset back into
    /// `[0, total_size)` whenever it reaches the end of the ring. The final op
    /// carries the remainder when `total_size` is not a multiple of
    /// `block_size`; there is no padding.
    ///
    /// Callers must hand in `start_offset < total_size`, aligned to
    /// `block_size`, and a buffer of at least `block_size` bytes.
    pub fn build(
        total_size: u64,
        block_size: u64,
        start_offset: u64,
        data: &Arc<[u8]>,
    ) -> Self {
        debug_assert!(total_size > 0 && block_size > 0);
        debug_assert!(start_offset < total_size);
        debug_assert!(start_offset % block_size == 0);
        debug_assert!(data.len() as u64 >= block_size.min(total_size));

        let mut ops = Vec::with_capacity(total_size.div_ceil(block_size) as usize);
        let mut offset = start_offset;
        let mut remaining = total_size;

        while remaining > 0 {
            let count = remaining.min(block_size);
            ops.push(WriteOp {
                offset,
                len: count,
                data: Arc::clone(data),
            });

            offset += count;
            // ring wrap; one subtraction suffices since count <= total_size
            if offset >= total_size {
                offset -= total_size;
            }
            remaining -= count;
        }

        Self { ops }
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Total bytes written by this batch.
    pub fn bytes(&self) -> u64 {
        self.ops.iter().map(|op| op.len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_buffer(block_size: u64) -> Arc<[u8]> {
        vec![0u8; block_size as usize].into()
    }

    fn shape(batch: &TransactionBatch) -> Vec<(u64, u64)> {
        batch.ops().iter().map(|op| (op.offset, op.len)).collect()
    }

    #[test]
    fn test_build_with_remainder_tail() {
        let data = block_buffer(4);
        let batch = TransactionBatch::build(10, 4, 0, &data);
        assert_eq!(shape(&batch), vec![(0, 4), (4, 4), (8, 2)]);
        assert_eq!(batch.bytes(), 10);
    }

    #[test]
    fn test_build_wraps_past_ring_end() {
        let data = block_buffer(4);
        let batch = TransactionBatch::build(10, 4, 8, &data);
        assert_eq!(shape(&batch), vec![(8, 4), (2, 4), (6, 2)]);
        assert_eq!(batch.bytes(), 10);
    }

    #[test]
    fn test_build_exact_multiple() {
        let data = block_buffer(4096);
        let batch = TransactionBatch::build(1 << 20, 4096, 0, &data);
        assert_eq!(batch.len(), 256);
        assert_eq!(batch.bytes(), 1 << 20);
        assert!(batch.ops().iter().all(|op| op.len == 4096));
    }

    #[test]
    fn test_build_block_larger_than_total() {
        let data = block_buffer(8);
        let batch = TransactionBatch::build(5, 8, 0, &data);
        assert_eq!(shape(&batch), vec![(0, 5)]);
    }

    #[test]
    fn test_build_wrap_lands_back_on_start() {
        // Offsets that reach exactly total_size wrap to zero rather than
        // emitting an op outside the ring.
        let data = block_buffer(4);
        let batch = TransactionBatch::build(8, 4, 4, &data);
        assert_eq!(shape(&batch), vec![(4, 4), (0, 4)]);
    }

    #[test]
    fn test_build_covers_total_from_any_aligned_start() {
        let data = block_buffer(4);
        for total in [4u64, 8, 10, 12, 20, 64] {
            for start in (0..total).step_by(4) {
                let batch = TransactionBatch::build(total, 4, start, &data);
                assert_eq!(batch.bytes(), total, "total={total} start={start}");
                assert!(
                    batch.ops().iter().all(|op| op.offset < total),
                    "total={total} start={start}"
                );
            }
        }
    }

    #[test]
    fn test_op_data_is_shared_and_bounded() {
        let data = block_buffer(4);
        let batch = TransactionBatch::build(10, 4, 0, &data);
        // 1 caller handle + one per op
        assert_eq!(Arc::strong_count(&data), 1 + batch.len());
        assert_eq!(batch.ops()[2].data().len(), 2);
    }
}
