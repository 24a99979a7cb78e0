//! Proof verification.
//!
//! Verification replays a proof from the leaf upwards and needs nothing but
//! the block, the proof, the expected root and the hash function. It keeps
//! no state and can run concurrently against the same root.

use crate::block::DataBlock;
use crate::def::MAX_DEPTH;
use crate::error::MerkleError;
use crate::hasher::{hash2x, Hasher};
use crate::proof::Proof;

/// Verifies that `block` is a leaf of the tree with the given `root`.
///
/// The accumulator starts as the raw serialized block; leaves are never
/// hashed on their own. For each sibling, consuming the path from its least
/// significant bit: if the bit is set and the sibling is identical to the
/// accumulator, the accumulator is left unchanged, mirroring how identical
/// pairs move up during construction. Otherwise it becomes
/// `hash(acc ++ sibling)` if the bit is set and `hash(sibling ++ acc)` if
/// not. The final accumulator must equal `root` byte for byte.
///
/// Structurally invalid input (no siblings, more siblings than path bits, or
/// an empty root) is rejected with [`MerkleError::InvalidInput`]. The proof's
/// length is not known here; [`crate::MerkleTree::verify`] also checks it
/// against the tree's depth.
pub fn verify<B: DataBlock + ?Sized>(
    block: &B,
    proof: &Proof,
    root: &[u8],
    hasher: &dyn Hasher,
) -> Result<bool, MerkleError> {
    if proof.siblings.is_empty() {
        return Err(MerkleError::InvalidInput("proof has no siblings".to_string()));
    }
    if proof.siblings.len() > MAX_DEPTH as usize {
        return Err(MerkleError::InvalidInput(format!(
            "proof has {} siblings, at most {} are supported",
            proof.siblings.len(),
            MAX_DEPTH
        )));
    }
    if root.is_empty() {
        return Err(MerkleError::InvalidInput("root is empty".to_string()));
    }

    let mut acc = block
        .serialize()
        .map_err(MerkleError::BlockSerialization)?;
    let mut path = proof.path;
    for (level, sibling) in proof.siblings.iter().enumerate() {
        let is_left = path & 1 == 1;
        if !is_left || *sibling != acc {
            acc = hash2x(hasher, &acc, sibling, !is_left).map_err(|source| {
                MerkleError::Hash {
                    level: level as u32,
                    source,
                }
            })?;
        }
        path >>= 1;
    }
    Ok(acc == root)
}
