//! Error kinds surfaced by the accumulator, identity and witness assembler.

use thiserror::Error;

/// Errors raised synchronously by core operations. None are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("tree of height {height} is full ({capacity} leaves)")]
    CapacityExceeded { height: usize, capacity: u64 },

    #[error("leaf index {index} out of range (tree holds {total} leaves)")]
    IndexOutOfRange { index: u64, total: u64 },

    #[error("identity has no leaf index yet")]
    NotRegistered,

    #[error("identity already registered at leaf index {0}")]
    AlreadyRegistered(u64),

    #[error("merkle path has {elements} elements and {bits} index bits, tree height is {height}")]
    MalformedPath {
        height: usize,
        elements: usize,
        bits: usize,
    },

    #[error("tree height must be between 1 and {max}, got {height}")]
    InvalidHeight { height: usize, max: usize },

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid identity secret: {0}")]
    InvalidSecret(String),
}
