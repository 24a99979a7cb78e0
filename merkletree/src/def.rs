//! Core definitions and constants for the Merkle tree engine.
//!
//! - Digest sizes
//! - Tree size limits imposed by the packed proof path
//! - Worker pool naming

/// Output length of the default SHA-256 hasher (32 bytes).
pub const DEFAULT_HASH_LEN: usize = 32;

/// Width of the proof path bitfield. One bit is consumed per tree level,
/// so this is also the maximum tree depth.
pub const MAX_DEPTH: u32 = u32::BITS;

/// Largest number of leaves whose depth still fits in the path bitfield.
pub const MAX_LEAF_COUNT: u64 = 1 << MAX_DEPTH;

/// Smallest number of data blocks a tree can be built from.
pub const MIN_LEAF_COUNT: usize = 2;

/// Name prefix of the hashing worker threads.
pub const WORKER_THREAD_PREFIX: &str = "merkle-worker";

/// Computes the depth of a tree with `leaf_count` leaves, i.e. the number of
/// levels above the leaf layer.
///
/// This is `log2(leaf_count)` for exact powers of two and
/// `floor(log2(leaf_count)) + 1` otherwise. It also fixes the capacity
/// reserved for every proof's sibling list.
pub fn tree_depth(leaf_count: usize) -> u32 {
    if leaf_count <= 1 {
        return 0;
    }
    let floor = usize::BITS - 1 - leaf_count.leading_zeros();
    if leaf_count.is_power_of_two() {
        floor
    } else {
        floor + 1
    }
}
