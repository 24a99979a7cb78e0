//! Generation of the leaf layer.
//!
//! IMPORTANT: leaves are never passed through the hash function. The bytes of
//! each serialized block are used verbatim as its leaf digest, which lets
//! callers insert content they hashed themselves (as merkletreejs does).

use std::collections::HashMap;

use log::warn;

use crate::block::DataBlock;
use crate::error::MerkleError;
use crate::executor::Executor;
use crate::hasher::Digest;

/// Serializes `blocks` into the leaf layer, sorting it byte-lexicographically
/// when `sort_leaves` is set.
pub fn build_leaves<B>(
    blocks: &[B],
    sort_leaves: bool,
    executor: &Executor,
) -> Result<Vec<Digest>, MerkleError>
where
    B: DataBlock + Sync,
{
    let mut leaves = executor.map_chunks(blocks, 1, |index, chunk| {
        chunk[0]
            .serialize()
            .map_err(|source| MerkleError::Serialization { index, source })
    })?;
    if sort_leaves {
        leaves.sort_unstable();
    }
    Ok(leaves)
}

/// Maps every leaf digest to its position in the un-padded leaf layer.
///
/// Duplicate digests keep their first position.
pub fn build_leaf_index(leaves: &[Digest]) -> HashMap<Digest, usize> {
    let mut index = HashMap::with_capacity(leaves.len());
    let mut duplicates = 0usize;
    for (i, leaf) in leaves.iter().enumerate() {
        if index.contains_key(leaf) {
            duplicates += 1;
            continue;
        }
        index.insert(leaf.clone(), i);
    }
    if duplicates > 0 {
        warn!(
            "{} duplicate leaves found; proofs for them resolve to the first occurrence",
            duplicates
        );
    }
    index
}
