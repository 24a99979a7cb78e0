//! Merkle proof generation.
//!
//! A [`Proof`] holds one sibling per tree level and a packed path: bit `i` is
//! set when, at level `i`, the accumulated hash goes on the left of the
//! sibling. Proofs come from two sources that always agree:
//!
//! - Streaming: [`record_level`] runs once per level while the tree is being
//!   hashed and extends the proofs of all leaves at once.
//! - Indexed: [`generate_from_levels`] walks a materialized tree for a single
//!   leaf position.

use serde::{Deserialize, Serialize};

use crate::error::MerkleError;
use crate::executor::Executor;
use crate::hasher::{placed_left, Digest};

/// Inclusion proof of one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proof {
    /// Sibling of the path node at each level, from the leaves upwards
    pub siblings: Vec<Digest>,
    /// Bit `i` set: the path node at level `i` is hashed on the left
    pub path: u32,
}

impl Proof {
    pub fn with_depth(depth: u32) -> Self {
        Proof {
            siblings: Vec::with_capacity(depth as usize),
            path: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Whether the path node at `level` is hashed on the left.
    pub fn is_left_at(&self, level: usize) -> bool {
        level < u32::BITS as usize && self.path & (1 << level) != 0
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MerkleError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bz: &[u8]) -> Result<Self, MerkleError> {
        Ok(bincode::deserialize(bz)?)
    }
}

/// Allocates one empty proof per leaf.
pub(crate) fn init_proofs(leaf_count: usize, depth: u32) -> Vec<Proof> {
    (0..leaf_count).map(|_| Proof::with_depth(depth)).collect()
}

/// Extends every proof with its sibling at level `step`.
///
/// `level` must already be padded to an even length. The pair starting at
/// element `idx` covers a batch of `2^step` leaves on each side: leaves in
/// the left batch get `level[idx + 1]` as sibling, leaves in the right batch
/// get `level[idx]`. Proof chunks are disjoint, so the executor may process
/// them in any order.
pub(crate) fn record_level(
    proofs: &mut [Proof],
    level: &[Digest],
    step: u32,
    sort_pairs: bool,
    executor: &Executor,
) {
    let batch = 1usize << step;
    executor.for_each_chunk_mut(proofs, batch << 1, |pair, chunk| {
        let left = &level[pair << 1];
        let right = &level[(pair << 1) + 1];
        let split = batch.min(chunk.len());
        let (left_batch, right_batch) = chunk.split_at_mut(split);
        let left_bit = placed_left(left, right, true, sort_pairs);
        for proof in left_batch {
            if left_bit {
                proof.path |= 1 << step;
            }
            proof.siblings.push(right.clone());
        }
        let right_bit = placed_left(right, left, false, sort_pairs);
        for proof in right_batch {
            if right_bit {
                proof.path |= 1 << step;
            }
            proof.siblings.push(left.clone());
        }
    });
}

/// Generates the proof of the leaf at `index` from materialized levels.
///
/// `levels[0..depth]` are the padded levels below the root.
pub(crate) fn generate_from_levels(
    levels: &[Vec<Digest>],
    depth: u32,
    mut index: usize,
    sort_pairs: bool,
) -> Proof {
    let mut proof = Proof::with_depth(depth);
    for (step, level) in levels.iter().take(depth as usize).enumerate() {
        let node_is_left = index & 1 == 0;
        let sibling = if node_is_left {
            &level[index + 1]
        } else {
            &level[index - 1]
        };
        if placed_left(&level[index], sibling, node_is_left, sort_pairs) {
            proof.path |= 1 << step;
        }
        proof.siblings.push(sibling.clone());
        index >>= 1;
    }
    proof
}
