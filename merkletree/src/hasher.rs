//! Hashing utilities for the Merkle tree.
//!
//! This module provides:
//! - The pluggable [`Hasher`] interface and its SHA-256 default
//! - Pair hashing for interior nodes, with optional order swapping
//! - The pair rule shared by tree construction, proof generation and
//!   verification

use std::fmt;

use sha2::{Digest as _, Sha256};

use crate::def::DEFAULT_HASH_LEN;

/// Type alias for a digest. Its length is whatever the configured hasher
/// produces; leaves are raw serialized blocks and may have any length.
pub type Digest = Vec<u8>;

/// A hash function mapping an arbitrary byte sequence to a digest.
///
/// Hashing may fail, e.g. when it is backed by an external service. Any
/// closure `Fn(&[u8]) -> anyhow::Result<Vec<u8>>` is a `Hasher`. Every call
/// must produce a digest of the same length.
pub trait Hasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> anyhow::Result<Digest>;
}

impl<F> Hasher for F
where
    F: Fn(&[u8]) -> anyhow::Result<Digest> + Send + Sync,
{
    fn hash(&self, data: &[u8]) -> anyhow::Result<Digest> {
        self(data)
    }
}

/// The default hasher: SHA-256 with a 32-byte output.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> anyhow::Result<Digest> {
        Ok(sha256(data).to_vec())
    }
}

impl fmt::Debug for dyn Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}

/// Measures the output length of `hasher` by hashing the empty input.
///
/// # Arguments
/// * `hasher` - Hash function to measure
///
/// # Returns
/// The digest length in bytes, or the hasher's error
pub fn digest_len(hasher: &dyn Hasher) -> anyhow::Result<usize> {
    Ok(hasher.hash(&[])?.len())
}

/// Computes the SHA-256 hash of a single value.
///
/// # Arguments
/// * `a` - Value to hash
///
/// # Returns
/// The 32-byte hash of the input
pub fn sha256<T: AsRef<[u8]>>(a: T) -> [u8; DEFAULT_HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.finalize().into()
}

/// Hashes the concatenation of two values with the given hasher.
///
/// # Arguments
/// * `hasher` - Hash function combining the values
/// * `a` - First value to hash
/// * `b` - Second value to hash
///
/// # Returns
/// The digest of `a ++ b`, or the hasher's error
pub fn hash2(hasher: &dyn Hasher, a: &[u8], b: &[u8]) -> anyhow::Result<Digest> {
    let mut buf = Vec::with_capacity(a.len() + b.len());
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    hasher.hash(&buf)
}

/// Hashes the concatenation of two values with optional order swapping.
///
/// Similar to [`hash2`], but allows the order of the inputs to be swapped
/// based on the `exchange_ab` parameter.
///
/// # Arguments
/// * `hasher` - Hash function combining the values
/// * `a` - First value to hash
/// * `b` - Second value to hash
/// * `exchange_ab` - Whether to swap the order of a and b
///
/// # Returns
/// The digest of `b ++ a` if `exchange_ab` is true, otherwise of `a ++ b`
pub fn hash2x(hasher: &dyn Hasher, a: &[u8], b: &[u8], exchange_ab: bool) -> anyhow::Result<Digest> {
    if exchange_ab {
        hash2(hasher, b, a)
    } else {
        hash2(hasher, a, b)
    }
}

/// Computes the parent of the pair `(left, right)`.
///
/// Identical children are propagated to the parent unhashed. This keeps the
/// tree compatible with proofs produced by merkletreejs-style builders, where
/// a duplicated odd node moves up a level untouched. With `sort_pairs` the
/// smaller child (byte-lexicographic) is hashed first.
///
/// # Arguments
/// * `hasher` - Hash function combining the children
/// * `left` - Child at the even position of the level
/// * `right` - Child at the odd position of the level
/// * `sort_pairs` - Whether to hash the children in byte order
///
/// # Returns
/// The parent node, or the hasher's error
pub fn parent_of(
    hasher: &dyn Hasher,
    left: &[u8],
    right: &[u8],
    sort_pairs: bool,
) -> anyhow::Result<Digest> {
    if left == right {
        return Ok(left.to_vec());
    }
    hash2x(hasher, left, right, sort_pairs && right < left)
}

/// Computes the proof path bit of `node` when it is paired with `sibling`.
///
/// The bit is set when `node` is hashed on the left by [`parent_of`]. A pair
/// of identical nodes is never hashed; its bit is always set, which is the
/// only bit under which verification lets the node move up unchanged.
///
/// # Arguments
/// * `node` - Node on the path from the leaf to the root
/// * `sibling` - The other node of the pair
/// * `node_is_left` - Whether `node` is at the even position of the level
/// * `sort_pairs` - Whether pairs are hashed in byte order
///
/// # Returns
/// True if the path bit for this level is set
pub fn placed_left(node: &[u8], sibling: &[u8], node_is_left: bool, sort_pairs: bool) -> bool {
    if node == sibling {
        true
    } else if sort_pairs {
        node < sibling
    } else {
        node_is_left
    }
}
