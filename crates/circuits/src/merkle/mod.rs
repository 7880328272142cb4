//! Append-only Merkle accumulator.
//!
//! This module provides:
//! - The native incremental tree (insert, root history, path generation)
//! - Inclusion paths and their bottom-up folding
//! - In-circuit path verification gadgets

mod gadgets;
mod path;
mod tree;


pub use gadgets::{compute_root_from_path, verify_inclusion, MerklePathVar};
pub use path::MerklePath;
pub use tree::{IncrementalMerkleTree, DEFAULT_HEIGHT, MAX_HEIGHT};
