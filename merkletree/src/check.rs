//! Consistency checks for materialized trees.
//!
//! The checks ensure that:
//! 1. Every level below the root has even length
//! 2. Every parent node is the combination of its two children
//! 3. The top level holds exactly the root
//! 4. Every recorded proof verifies against the root

use crate::error::MerkleError;
use crate::hasher::parent_of;
use crate::tree::MerkleTree;

/// Recomputes every parent of a materialized tree from its children.
///
/// Returns [`MerkleError::Inconsistent`] naming the first parent that does not
/// match. Trees built in `ProofGen` mode keep no levels and are rejected with
/// [`MerkleError::Configuration`].
pub fn check_levels(tree: &MerkleTree) -> Result<(), MerkleError> {
    let levels = tree.levels();
    if levels.is_empty() {
        return Err(MerkleError::Configuration(format!(
            "merkle tree is not materialized in {} mode",
            tree.mode()
        )));
    }
    let depth = tree.depth() as usize;
    let hasher = tree.config().hasher.as_ref();
    let sort_pairs = tree.config().sort_pairs;
    for level in 0..depth {
        let children = &levels[level];
        let parents = &levels[level + 1];
        if children.len() & 1 != 0 || children.len() >> 1 != parents.len() {
            return Err(MerkleError::Inconsistent {
                level: level as u32,
                index: children.len(),
            });
        }
        for (i, parent) in parents.iter().enumerate() {
            let expected = parent_of(hasher, &children[2 * i], &children[2 * i + 1], sort_pairs)
                .map_err(|source| MerkleError::Hash {
                    level: level as u32,
                    source,
                })?;
            if expected != *parent {
                return Err(MerkleError::Inconsistent {
                    level: level as u32 + 1,
                    index: i,
                });
            }
        }
    }
    if levels[depth].len() != 1 || levels[depth][0] != tree.root() {
        return Err(MerkleError::Inconsistent {
            level: depth as u32,
            index: 0,
        });
    }
    Ok(())
}

/// Verifies every proof recorded during construction.
///
/// Returns [`MerkleError::Inconsistent`] at level 0 with the index of the
/// first leaf whose proof does not verify.
pub fn check_proofs(tree: &MerkleTree) -> Result<(), MerkleError> {
    for (i, (leaf, proof)) in tree.leaves().iter().zip(tree.proofs()).enumerate() {
        if !tree.verify(leaf, proof)? {
            return Err(MerkleError::Inconsistent { level: 0, index: i });
        }
    }
    Ok(())
}
