//! Construction of the Merkle tree.
//!
//! Levels are built bottom-up. Before a level is paired it is made even:
//! the last node is duplicated, or, with `no_duplicates`, a random dummy
//! node is appended. Pairs of identical nodes move up unhashed; every other
//! pair is hashed in position order, or in byte order with `sort_pairs`.
//!
//! Depending on the [`Mode`], the tree keeps every level (for on-demand
//! proofs through [`MerkleTree::generate_proof`]), records the proofs of all
//! leaves while hashing, or both.

use std::collections::HashMap;
use std::thread;
use std::time::Instant;

use log::{debug, trace};
use rand_core::{OsRng, RngCore};

use crate::block::DataBlock;
use crate::config::{Config, Mode};
use crate::def::tree_depth;
use crate::error::MerkleError;
use crate::executor::Executor;
use crate::hasher::{digest_len, parent_of, Digest};
use crate::leaf::{build_leaf_index, build_leaves};
use crate::proof::{generate_from_levels, init_proofs, record_level, Proof};
use crate::verify;

/// A binary Merkle tree over serialized data blocks.
#[derive(Debug)]
pub struct MerkleTree {
    config: Config,
    /// Leaf layer, i.e. the serialized data blocks, sorted if configured
    leaves: Vec<Digest>,
    /// All levels from the padded leaf layer up to the root;
    /// only kept in `TreeBuild` and `ProofGenAndTreeBuild` modes
    levels: Vec<Vec<Digest>>,
    /// Leaf digest to position in `leaves`; only built with `levels`
    leaf_index: HashMap<Digest, usize>,
    /// One proof per leaf, aligned with `leaves`;
    /// only recorded in `ProofGen` and `ProofGenAndTreeBuild` modes
    proofs: Vec<Proof>,
    root: Digest,
    depth: u32,
}

/// Output of one pass over the levels.
struct Levels {
    root: Digest,
    levels: Vec<Vec<Digest>>,
    proofs: Vec<Proof>,
}

impl MerkleTree {
    /// Builds a tree over `blocks` with the given configuration.
    ///
    /// Fails if fewer than two blocks are given, if a block cannot be
    /// serialized, if the hash function fails, or if the config's cancel
    /// token fires. No partial tree is ever returned.
    pub fn new<B>(config: Config, blocks: &[B]) -> Result<Self, MerkleError>
    where
        B: DataBlock + Sync,
    {
        config.cancel.check()?;
        config.validate(blocks.len())?;
        let start = Instant::now();
        let executor = Executor::new(&config)?;
        let depth = tree_depth(blocks.len());
        debug!(
            "building merkle tree: {} blocks, depth {}, mode {}, {} worker(s)",
            blocks.len(),
            depth,
            config.mode,
            executor.worker_count()
        );

        // Random padding nodes take the length of the hasher's output.
        let padding = if config.no_duplicates {
            Some(padding_len(&config)?)
        } else {
            None
        };

        let leaves = build_leaves(blocks, config.sort_leaves, &executor)?;
        let (built, leaf_index) = if config.mode.builds_tree() && executor.is_parallel() {
            // The index only reads the finished leaf layer, so it is filled
            // while the levels are being hashed and joined once at the end.
            thread::scope(|s| {
                let handle = s.spawn(|| build_leaf_index(&leaves));
                let built = build_levels(&config, &executor, &leaves, depth, padding);
                let index = handle
                    .join()
                    .unwrap_or_else(|e| std::panic::resume_unwind(e));
                (built, index)
            })
        } else if config.mode.builds_tree() {
            let built = build_levels(&config, &executor, &leaves, depth, padding);
            (built, build_leaf_index(&leaves))
        } else {
            (build_levels(&config, &executor, &leaves, depth, padding), HashMap::new())
        };
        let Levels {
            root,
            levels,
            proofs,
        } = built?;

        debug!(
            "merkle tree built in {:.1?}: root {}",
            start.elapsed(),
            hex::encode(&root)
        );
        Ok(MerkleTree {
            config,
            leaves,
            levels,
            leaf_index,
            proofs,
            root,
            depth,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn root(&self) -> &[u8] {
        &self.root
    }

    pub fn root_hex(&self) -> String {
        hex::encode(&self.root)
    }

    /// Number of levels above the leaf layer.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Materialized levels, `levels()[0]` being the padded leaf layer and
    /// `levels()[depth]` holding only the root. Empty in `ProofGen` mode.
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }

    /// Proofs recorded during construction, aligned with [`Self::leaves`].
    /// Empty in `TreeBuild` mode.
    pub fn proofs(&self) -> &[Proof] {
        &self.proofs
    }

    pub fn proof(&self, index: usize) -> Option<&Proof> {
        self.proofs.get(index)
    }

    /// Position of `leaf` in the leaf layer, if the tree was materialized.
    pub fn leaf_position(&self, leaf: &[u8]) -> Option<usize> {
        self.leaf_index.get(leaf).copied()
    }

    /// Generates the proof of `block` from the materialized levels.
    ///
    /// Only available in `TreeBuild` and `ProofGenAndTreeBuild` modes; in
    /// `ProofGen` mode the proofs of all blocks are in [`Self::proofs`].
    pub fn generate_proof<B: DataBlock + ?Sized>(&self, block: &B) -> Result<Proof, MerkleError> {
        self.config.cancel.check()?;
        if !self.config.mode.builds_tree() {
            return Err(MerkleError::Configuration(format!(
                "merkle tree is not materialized in {} mode, could not generate proof on demand",
                self.config.mode
            )));
        }
        let leaf = block
            .serialize()
            .map_err(MerkleError::BlockSerialization)?;
        let index = self.leaf_position(&leaf).ok_or_else(|| {
            MerkleError::NotFound(format!(
                "data block {} is not a member of the merkle tree",
                hex::encode(&leaf)
            ))
        })?;
        Ok(generate_from_levels(
            &self.levels,
            self.depth,
            index,
            self.config.sort_pairs,
        ))
    }

    /// Verifies `block` against this tree's root with its hash function.
    ///
    /// Proofs must carry exactly one sibling per level of this tree, anything
    /// else is rejected with [`MerkleError::InvalidInput`].
    pub fn verify<B: DataBlock + ?Sized>(&self, block: &B, proof: &Proof) -> Result<bool, MerkleError> {
        if proof.depth() != self.depth as usize {
            return Err(MerkleError::InvalidInput(format!(
                "proof has {} siblings, the tree has depth {}",
                proof.depth(),
                self.depth
            )));
        }
        verify::verify(block, proof, &self.root, self.config.hasher.as_ref())
    }
}

/// Hashes level after level up to the root.
///
/// Levels are kept if the mode materializes the tree, and proofs are
/// extended after each level if the mode generates them. Either way only one
/// level is being hashed at a time.
fn build_levels(
    config: &Config,
    executor: &Executor,
    leaves: &[Digest],
    depth: u32,
    padding: Option<usize>,
) -> Result<Levels, MerkleError> {
    let keep_levels = config.mode.builds_tree();
    let mut proofs = if config.mode.generates_proofs() {
        init_proofs(leaves.len(), depth)
    } else {
        Vec::new()
    };
    let mut levels = Vec::with_capacity(if keep_levels { depth as usize + 1 } else { 0 });
    let mut buf = leaves.to_vec();
    for step in 0..depth {
        config.cancel.check()?;
        fix_odd(&mut buf, padding)?;
        if config.mode.generates_proofs() {
            record_level(&mut proofs, &buf, step, config.sort_pairs, executor);
        }
        let next = hash_level(config, executor, &buf, step)?;
        trace!("level {} hashed: {} -> {} nodes", step, buf.len(), next.len());
        let prev = std::mem::replace(&mut buf, next);
        if keep_levels {
            levels.push(prev);
        }
    }
    let root = buf[0].clone();
    if keep_levels {
        levels.push(buf);
    }
    Ok(Levels {
        root,
        levels,
        proofs,
    })
}

/// Computes the parents of an even-length level.
fn hash_level(
    config: &Config,
    executor: &Executor,
    level: &[Digest],
    step: u32,
) -> Result<Vec<Digest>, MerkleError> {
    let hasher = config.hasher.as_ref();
    let sort_pairs = config.sort_pairs;
    executor.map_chunks(level, 2, |_, pair| {
        parent_of(hasher, &pair[0], &pair[1], sort_pairs)
            .map_err(|source| MerkleError::Hash { level: step, source })
    })
}

/// Makes `buf` even by duplicating its last node, or by appending a random
/// dummy node of `padding` bytes.
fn fix_odd(buf: &mut Vec<Digest>, padding: Option<usize>) -> Result<(), MerkleError> {
    if buf.len() & 1 == 0 {
        return Ok(());
    }
    let node = match padding {
        Some(len) => dummy_node(len)?,
        None => buf[buf.len() - 1].clone(),
    };
    buf.push(node);
    Ok(())
}

/// Measures the output length of the configured hasher.
fn padding_len(config: &Config) -> Result<usize, MerkleError> {
    let len = digest_len(config.hasher.as_ref())
        .map_err(|source| MerkleError::Hash { level: 0, source })?;
    if len == 0 {
        return Err(MerkleError::Configuration(
            "hasher produced an empty digest, could not size padding nodes".to_string(),
        ));
    }
    Ok(len)
}

/// Draws a padding node from the OS secure random source. It never depends
/// on the tree's content.
fn dummy_node(len: usize) -> Result<Digest, MerkleError> {
    let mut node = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut node)
        .map_err(|e| MerkleError::Padding(e.to_string()))?;
    Ok(node)
}
