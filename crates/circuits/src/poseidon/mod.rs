//! Poseidon over the BN254 scalar field.
//!
//! The native function and the R1CS gadget share one configuration, so a
//! digest computed outside the circuit is exactly what the circuit recomputes.

mod config;
mod gadgets;
mod native;


pub use config::{poseidon_config, FULL_ROUNDS, PARTIAL_ROUNDS};
pub use gadgets::poseidon_hash_two_var;
pub use native::poseidon_hash_two;
