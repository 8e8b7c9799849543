//! Chunked transfer pacing
//!
//! Given a byte count and a target total duration, computes the fixed-size
//! chunk schedule that spreads delivery across the target: `ceil(len /
//! chunk_size)` chunks with an equal inter-chunk delay. The delay is
//! applied between chunks so time-to-first-byte stays low while the total
//! transfer time tracks the target.

use std::time::Duration;

/// Chunk schedule for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Maximum bytes read and emitted per chunk
    pub chunk_size: u64,
    /// Number of chunks the transfer will take
    pub num_chunks: u64,
    /// Sleep inserted after each emitted chunk
    pub delay_per_chunk: Duration,
}

impl ChunkPlan {
    /// Computes the schedule for `content_length` bytes.
    ///
    /// A zero `target_duration` (file not in the delay table) yields an
    /// unpaced plan. `chunk_size` must be nonzero.
    pub fn new(content_length: u64, chunk_size: u64, target_duration: Duration) -> Self {
        debug_assert!(chunk_size > 0);
        let num_chunks = content_length.div_ceil(chunk_size);
        let delay_per_chunk = if num_chunks > 0 && !target_duration.is_zero() {
            target_duration.div_f64(num_chunks as f64)
        } else {
            Duration::ZERO
        };

        Self {
            chunk_size,
            num_chunks,
            delay_per_chunk,
        }
    }

    /// Whether any inter-chunk delay applies.
    pub fn is_paced(&self) -> bool {
        !self.delay_per_chunk.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count_rounds_up() {
        let plan = ChunkPlan::new(65536 * 3 + 1, 65536, Duration::ZERO);
        assert_eq!(plan.num_chunks, 4);

        let plan = ChunkPlan::new(65536 * 3, 65536, Duration::ZERO);
        assert_eq!(plan.num_chunks, 3);
    }

    #[test]
    fn test_delay_is_split_across_chunks() {
        let plan = ChunkPlan::new(65536 * 4, 65536, Duration::from_secs(1));
        assert_eq!(plan.num_chunks, 4);
        assert_eq!(plan.delay_per_chunk, Duration::from_millis(250));
        assert!(plan.is_paced());
    }

    #[test]
    fn test_zero_target_is_unpaced() {
        let plan = ChunkPlan::new(65536 * 4, 65536, Duration::ZERO);
        assert_eq!(plan.delay_per_chunk, Duration::ZERO);
        assert!(!plan.is_paced());
    }

    #[test]
    fn test_empty_transfer_has_no_chunks() {
        let plan = ChunkPlan::new(0, 65536, Duration::from_secs(1));
        assert_eq!(plan.num_chunks, 0);
        assert_eq!(plan.delay_per_chunk, Duration::ZERO);
    }

    #[test]
    fn test_single_chunk_takes_whole_target() {
        let plan = ChunkPlan::new(100, 65536, Duration::from_millis(400));
        assert_eq!(plan.num_chunks, 1);
        assert_eq!(plan.delay_per_chunk, Duration::from_millis(400));
    }
}
