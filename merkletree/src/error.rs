use thiserror::Error;

/// Errors that can occur while building, proving or verifying a Merkle tree.
#[derive(Error, Debug)]
pub enum MerkleError {
    /// Invalid configuration or an operation unavailable in the configured mode.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A data block failed to produce its bytes.
    #[error("Failed to serialize data block {index}: {source}")]
    Serialization {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// The block passed to proof generation or verification failed to
    /// produce its bytes.
    #[error("Failed to serialize data block: {0}")]
    BlockSerialization(#[source] anyhow::Error),

    /// The hash function failed while combining nodes of `level`.
    #[error("Hash function failed at level {level}: {source}")]
    Hash {
        level: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The secure random source failed to produce a padding node.
    #[error("Failed to generate padding node: {0}")]
    Padding(String),

    /// The requested leaf is not a member of the tree.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// A materialized parent node does not match the hash of its children.
    #[error("Inconsistent node at level {level}, index {index}")]
    Inconsistent { level: u32, index: usize },

    #[error("Proof codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl From<MerkleError> for String {
    fn from(error: MerkleError) -> Self {
        error.to_string()
    }
}
