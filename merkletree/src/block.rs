//! Data blocks are the externally supplied content of the tree's leaves.
//!
//! The serialization of a block must be deterministic: the tree's root and
//! every proof depend on stable leaf bytes.

use crate::hasher::Digest;

/// Anything that can be serialized into the bytes of a leaf.
pub trait DataBlock {
    fn serialize(&self) -> anyhow::Result<Digest>;
}

impl DataBlock for [u8] {
    fn serialize(&self) -> anyhow::Result<Digest> {
        Ok(self.to_vec())
    }
}

impl DataBlock for Vec<u8> {
    fn serialize(&self) -> anyhow::Result<Digest> {
        Ok(self.clone())
    }
}

impl<const N: usize> DataBlock for [u8; N] {
    fn serialize(&self) -> anyhow::Result<Digest> {
        Ok(self.to_vec())
    }
}

impl DataBlock for str {
    fn serialize(&self) -> anyhow::Result<Digest> {
        Ok(self.as_bytes().to_vec())
    }
}

impl DataBlock for String {
    fn serialize(&self) -> anyhow::Result<Digest> {
        Ok(self.as_bytes().to_vec())
    }
}

impl<T: DataBlock + ?Sized> DataBlock for &T {
    fn serialize(&self) -> anyhow::Result<Digest> {
        (**self).serialize()
    }
}

impl<T: DataBlock + ?Sized> DataBlock for Box<T> {
    fn serialize(&self) -> anyhow::Result<Digest> {
        (**self).serialize()
    }
}
