//! # Merkle tree engine
//!
//! Builds a binary Merkle tree over an ordered list of data blocks and
//! produces and verifies inclusion proofs against its root.
//!
//! - [`config`]: per-tree configuration (hash function, mode, parallelism,
//!   odd-node policy, sorting)
//! - [`block`]: the [`DataBlock`] interface for leaf content
//! - [`leaf`]: leaf layer generation and the leaf index
//! - [`tree`]: level construction, the [`MerkleTree`] itself
//! - [`proof`]: streaming and indexed proof generation
//! - [`verify`](mod@verify): proof verification
//! - [`executor`]: sequential or pooled execution of per-level work
//! - [`check`]: consistency checks of materialized trees
//!
//! Leaves are the serialized blocks themselves and are never hashed before
//! pairing, so content can be hashed by the caller beforehand.
//!
//! ```
//! use merkletree::{config::{Config, Mode}, verify, MerkleTree, Sha256Hasher};
//!
//! let blocks = ["a", "b", "c", "d"];
//! let tree = MerkleTree::new(Config::with_mode(Mode::ProofGenAndTreeBuild), &blocks).unwrap();
//! let proof = tree.generate_proof("c").unwrap();
//! assert_eq!(&proof, tree.proof(2).unwrap());
//! assert!(verify("c", &proof, tree.root(), &Sha256Hasher).unwrap());
//! ```

pub mod block;
pub mod check;
pub mod config;
pub mod def;
pub mod error;
pub mod executor;
pub mod hasher;
pub mod leaf;
pub mod proof;
pub mod tree;
pub mod verify;

pub use block::DataBlock;
pub use config::{Config, Mode};
pub use error::MerkleError;
pub use executor::CancelToken;
pub use hasher::{Digest, Hasher, Sha256Hasher};
pub use proof::Proof;
pub use tree::MerkleTree;
pub use verify::verify;
