//! Configuration of a Merkle tree instance.
//!
//! A [`Config`] fixes the behavior of one tree:
//! - `hasher`: the hash function combining nodes (default: SHA-256)
//! - `mode`: which of proof generation and tree materialization to perform
//! - `run_in_parallel` / `num_threads`: sequential or pooled hashing
//! - `no_duplicates`: odd-node fixup by random padding instead of duplication
//! - `sort_leaves` / `sort_pairs`: order-independent trees (merkletreejs style)
//! - `cancel`: a token that rejects further work once triggered
//!
//! The tree takes ownership of its config on construction and never changes it.
//!
//! # Usage Examples
//! ```
//! use merkletree::config::{Config, Mode};
//!
//! let mut config = Config::with_mode(Mode::ProofGenAndTreeBuild);
//! config.run_in_parallel = true;
//! config.num_threads = 4;
//! config.sort_pairs = true;
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use crate::def::{MAX_LEAF_COUNT, MIN_LEAF_COUNT};
use crate::error::MerkleError;
use crate::executor::CancelToken;
use crate::hasher::{Hasher, Sha256Hasher};

/// What a tree does on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Generate a proof for every leaf while hashing; only the root is kept.
    #[default]
    ProofGen,
    /// Keep every level so proofs can be generated on demand.
    TreeBuild,
    /// Both of the above.
    ProofGenAndTreeBuild,
}

impl Mode {
    /// Whether proofs for all leaves are recorded during construction.
    pub fn generates_proofs(self) -> bool {
        matches!(self, Mode::ProofGen | Mode::ProofGenAndTreeBuild)
    }

    /// Whether all levels are materialized and kept.
    pub fn builds_tree(self) -> bool {
        matches!(self, Mode::TreeBuild | Mode::ProofGenAndTreeBuild)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::ProofGen => "proof-gen",
            Mode::TreeBuild => "tree-build",
            Mode::ProofGenAndTreeBuild => "proof-gen-and-tree-build",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "proof-gen" => Ok(Mode::ProofGen),
            "tree-build" => Ok(Mode::TreeBuild),
            "proof-gen-and-tree-build" => Ok(Mode::ProofGenAndTreeBuild),
            _ => Err(MerkleError::Configuration(format!("unknown mode: {}", s))),
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = MerkleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::ProofGen),
            1 => Ok(Mode::TreeBuild),
            2 => Ok(Mode::ProofGenAndTreeBuild),
            _ => Err(MerkleError::Configuration(format!(
                "unknown mode value: {}",
                value
            ))),
        }
    }
}

/// Configuration for one Merkle tree.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hash function combining pairs of nodes
    pub hasher: Arc<dyn Hasher>,
    /// Operations performed on construction
    pub mode: Mode,
    /// Hash on a worker pool instead of the calling thread
    pub run_in_parallel: bool,
    /// Worker count; 0 means one worker per CPU when `run_in_parallel` is set
    pub num_threads: usize,
    /// Pad odd levels with a random node instead of duplicating the last one
    pub no_duplicates: bool,
    /// Sort the leaf layer before building
    pub sort_leaves: bool,
    /// Sort each pair before hashing it
    pub sort_pairs: bool,
    /// Cancels construction and on-demand proof generation
    pub cancel: CancelToken,
}

impl Default for Config {
    /// Sequential SHA-256 tree in `ProofGen` mode, duplicating odd nodes,
    /// without any sorting.
    fn default() -> Self {
        Self {
            hasher: Arc::new(Sha256Hasher),
            mode: Mode::default(),
            run_in_parallel: false,
            num_threads: 0,
            no_duplicates: false,
            sort_leaves: false,
            sort_pairs: false,
            cancel: CancelToken::new(),
        }
    }
}

impl Config {
    /// Creates a default config running in the given mode.
    pub fn with_mode(mode: Mode) -> Self {
        Config {
            mode,
            ..Config::default()
        }
    }

    /// Creates a default config with a custom hash function.
    pub fn with_hasher<H: Hasher + 'static>(hasher: H) -> Self {
        Config {
            hasher: Arc::new(hasher),
            ..Config::default()
        }
    }

    /// Matches the behavior of merkletreejs with `sortLeaves` and `sortPairs`.
    pub fn sorted(mode: Mode) -> Self {
        Config {
            mode,
            sort_leaves: true,
            sort_pairs: true,
            ..Config::default()
        }
    }

    /// Returns the worker count to use, or `None` for sequential execution.
    ///
    /// A non-zero `num_threads` always enables the pool; zero enables it only
    /// with `run_in_parallel`, sized to the number of CPUs.
    pub fn worker_count(&self) -> Option<usize> {
        if self.num_threads > 0 {
            return Some(self.num_threads);
        }
        if self.run_in_parallel {
            return Some(
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
            );
        }
        None
    }

    /// Checks that a tree can be built over `block_count` blocks.
    pub fn validate(&self, block_count: usize) -> Result<(), MerkleError> {
        if block_count < MIN_LEAF_COUNT {
            return Err(MerkleError::Configuration(format!(
                "the number of data blocks must be at least {}, got {}",
                MIN_LEAF_COUNT, block_count
            )));
        }
        if block_count as u64 > MAX_LEAF_COUNT {
            return Err(MerkleError::Configuration(format!(
                "the number of data blocks must be at most {}, got {}",
                MAX_LEAF_COUNT, block_count
            )));
        }
        Ok(())
    }
}
