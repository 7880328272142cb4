//! Reference voting ledger.
//!
//! Keeps the authoritative accumulator (leaf indices come from here), the
//! spent `(nullifier_hash, epoch)` pairs and the proposal tallies. A vote is
//! accepted iff its root is historical, its nullifier is fresh for the epoch,
//! its signal commits to the proposal it is counted for, and the proof verifies.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::digest::{digest_to_hex, Digest};
use crate::error::MembershipError;
use crate::hasher::{Hasher, PoseidonHasher};
use crate::merkle::{IncrementalMerkleTree, MerklePath};
use crate::proof_system::ProofSystem;
use crate::signal::hash_proposal;
use crate::witness::PublicInputs;

/// Vote and registration rejections. A rejected call never changes ledger state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("root {0} was never a tree root")]
    UnknownRoot(String),

    #[error("nullifier hash already used in epoch {epoch}")]
    DuplicateNullifier { epoch: String },

    #[error("unknown proposal {proposal} ({count} proposals)")]
    UnknownProposal { proposal: u64, count: u64 },

    #[error("signal hash does not commit to proposal {0}")]
    SignalMismatch(u64),

    #[error("proof rejected")]
    InvalidProof,

    #[error("proof system error: {0}")]
    Proof(String),
}

/// A proposal and its running tally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub name: String,
    pub vote_count: u64,
}

/// Ledger operations the voter flow depends on.
pub trait Ledger {
    /// Append a commitment; returns its leaf index.
    fn register(&mut self, commitment: Digest) -> Result<u64, LedgerError>;

    fn current_root(&self) -> Digest;

    fn is_known_root(&self, root: &Digest) -> bool;

    fn is_nullified(&self, nullifier_hash: &Digest, epoch: &Digest) -> bool;

    /// Verify and count a vote; returns the proposal's new tally.
    fn submit_vote<P: ProofSystem>(
        &mut self,
        backend: &P,
        proof: &P::Proof,
        public_inputs: &PublicInputs,
        proposal: u64,
    ) -> Result<u64, LedgerError>;
}

/// In-memory ledger over an [`IncrementalMerkleTree`].
#[derive(Clone, Debug)]
pub struct InMemoryLedger<H: Hasher = PoseidonHasher> {
    tree: IncrementalMerkleTree<H>,
    /// Spent (nullifier_hash, epoch) pairs
    nullifiers: HashSet<(Digest, Digest)>,
    proposals: Vec<Proposal>,
}

impl<H: Hasher> InMemoryLedger<H> {
    pub fn new<I, S>(height: usize, hasher: H, proposals: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tree = IncrementalMerkleTree::new(height, hasher)?;
        let proposals = proposals
            .into_iter()
            .map(|name| Proposal {
                name: name.into(),
                vote_count: 0,
            })
            .collect();

        Ok(Self {
            tree,
            nullifiers: HashSet::new(),
            proposals,
        })
    }

    pub fn tree(&self) -> &IncrementalMerkleTree<H> {
        &self.tree
    }

    /// Inclusion path for a registered leaf against the current root.
    pub fn path(&self, index: u64) -> Result<MerklePath, LedgerError> {
        Ok(self.tree.path(index)?)
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn tally(&self, proposal: u64) -> Option<u64> {
        self.proposal_slot(proposal)
            .map(|slot| self.proposals[slot].vote_count)
    }

    fn proposal_slot(&self, proposal: u64) -> Option<usize> {
        usize::try_from(proposal)
            .ok()
            .filter(|&slot| slot < self.proposals.len())
    }

    /// Every check a vote must pass before the proof itself is looked at.
    fn check_vote(&self, public_inputs: &PublicInputs, proposal: u64) -> Result<usize, LedgerError> {
        let slot = self
            .proposal_slot(proposal)
            .ok_or(LedgerError::UnknownProposal {
                proposal,
                count: self.proposals.len() as u64,
            })?;

        if !self.tree.is_known_root(&public_inputs.root) {
            return Err(LedgerError::UnknownRoot(digest_to_hex(&public_inputs.root)));
        }

        if self.is_nullified(&public_inputs.nullifier_hash, &public_inputs.epoch) {
            return Err(LedgerError::DuplicateNullifier {
                epoch: digest_to_hex(&public_inputs.epoch),
            });
        }

        if public_inputs.signal_hash != hash_proposal(proposal) {
            return Err(LedgerError::SignalMismatch(proposal));
        }

        Ok(slot)
    }
}

impl<H: Hasher> Ledger for InMemoryLedger<H> {
    fn register(&mut self, commitment: Digest) -> Result<u64, LedgerError> {
        let index = self.tree.insert(commitment)?;
        info!(leaf_index = index, "voter added");
        Ok(index)
    }

    fn current_root(&self) -> Digest {
        self.tree.root()
    }

    fn is_known_root(&self, root: &Digest) -> bool {
        self.tree.is_known_root(root)
    }

    fn is_nullified(&self, nullifier_hash: &Digest, epoch: &Digest) -> bool {
        self.nullifiers.contains(&(*nullifier_hash, *epoch))
    }

    fn submit_vote<P: ProofSystem>(
        &mut self,
        backend: &P,
        proof: &P::Proof,
        public_inputs: &PublicInputs,
        proposal: u64,
    ) -> Result<u64, LedgerError> {
        let slot = self.check_vote(public_inputs, proposal).map_err(|e| {
            warn!(proposal, error = %e, "vote rejected");
            e
        })?;

        let valid = backend
            .verify(public_inputs, proof)
            .map_err(|e| LedgerError::Proof(e.to_string()))?;
        if !valid {
            warn!(proposal, "vote rejected: invalid proof");
            return Err(LedgerError::InvalidProof);
        }

        self.nullifiers
            .insert((public_inputs.nullifier_hash, public_inputs.epoch));
        let entry = &mut self.proposals[slot];
        entry.vote_count += 1;

        debug!(proposal, tally = entry.vote_count, "vote counted");
        Ok(entry.vote_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, SECRET_BYTES};
    use crate::witness::Witness;
    use ark_bn254::Fr;

    const HEIGHT: usize = 5;

    /// Backend that "proves" by checking the relation natively.
    struct NativeBackend;

    #[derive(Debug, Error)]
    #[error("native backend failure")]
    struct NativeError;

    impl ProofSystem for NativeBackend {
        type Proof = Option<Witness>;
        type Error = NativeError;

        fn prove(&self, witness: &Witness) -> Result<Self::Proof, Self::Error> {
            Ok(witness.is_satisfied(&PoseidonHasher).then(|| witness.clone()))
        }

        fn verify(&self, public_inputs: &PublicInputs, proof: &Self::Proof) -> Result<bool, Self::Error> {
            match proof {
                Some(witness) => Ok(&witness.public == public_inputs),
                None => Err(NativeError),
            }
        }
    }

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new(HEIGHT, PoseidonHasher, ["eat fruit for lunch", "eat vegetable for lunch"])
            .unwrap()
    }

    fn enroll(ledger: &mut InMemoryLedger, seed: u8) -> Identity {
        let mut identity = Identity::from_secret([seed; SECRET_BYTES]);
        let index = ledger.register(identity.commitment(&PoseidonHasher)).unwrap();
        identity.register(index).unwrap();
        identity
    }

    fn ballot(ledger: &InMemoryLedger, identity: &Identity, epoch: u64, proposal: u64) -> (Option<Witness>, PublicInputs) {
        let path = ledger.path(identity.leaf_index().unwrap()).unwrap();
        let witness = Witness::assemble(
            HEIGHT,
            path.root,
            hash_proposal(proposal),
            Fr::from(epoch),
            identity,
            &PoseidonHasher,
            &path,
        )
        .unwrap();
        let proof = NativeBackend.prove(&witness).unwrap();
        (proof, witness.public)
    }

    #[test]
    fn test_register_assigns_sequential_indices() {
        let mut ledger = ledger();
        let empty = ledger.current_root();
        assert_eq!(ledger.register(Fr::from(1u64)).unwrap(), 0);
        assert_eq!(ledger.register(Fr::from(2u64)).unwrap(), 1);
        assert!(ledger.is_known_root(&empty));
        assert_ne!(ledger.current_root(), empty);
    }

    #[test]
    fn test_full_voter_flow() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);

        // First epoch
        let (proof, public) = ballot(&ledger, &identity, 0, 0);
        assert_eq!(ledger.submit_vote(&NativeBackend, &proof, &public, 0).unwrap(), 1);
        assert!(ledger.is_nullified(&public.nullifier_hash, &public.epoch));

        // Same identity, next epoch
        let (proof, public) = ballot(&ledger, &identity, 1, 0);
        assert_eq!(ledger.submit_vote(&NativeBackend, &proof, &public, 0).unwrap(), 2);
        assert_eq!(ledger.tally(0), Some(2));
        assert_eq!(ledger.tally(1), Some(0));
    }

    #[test]
    fn test_double_vote_rejected() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        let (proof, public) = ballot(&ledger, &identity, 0, 1);

        ledger.submit_vote(&NativeBackend, &proof, &public, 1).unwrap();
        let err = ledger
            .submit_vote(&NativeBackend, &proof, &public, 1)
            .unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateNullifier { .. }));
        assert_eq!(ledger.tally(1), Some(1));
    }

    #[test]
    fn test_historical_root_accepted() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        let (proof, public) = ballot(&ledger, &identity, 0, 0);

        // Tree moves on after the path was taken
        enroll(&mut ledger, 2);
        enroll(&mut ledger, 3);
        assert_ne!(ledger.current_root(), public.root);

        assert!(ledger.submit_vote(&NativeBackend, &proof, &public, 0).is_ok());
    }

    #[test]
    fn test_unknown_root_rejected() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        let (proof, mut public) = ballot(&ledger, &identity, 0, 0);
        public.root = Fr::from(12345u64);

        let err = ledger
            .submit_vote(&NativeBackend, &proof, &public, 0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownRoot(_)));
        assert!(!ledger.is_nullified(&public.nullifier_hash, &public.epoch));
    }

    #[test]
    fn test_signal_mismatch_rejected() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        // Proof commits to proposal 0, counted for proposal 1
        let (proof, public) = ballot(&ledger, &identity, 0, 0);

        assert_eq!(
            ledger.submit_vote(&NativeBackend, &proof, &public, 1),
            Err(LedgerError::SignalMismatch(1))
        );
        assert_eq!(ledger.tally(1), Some(0));
    }

    #[test]
    fn test_unknown_proposal_rejected() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        let (proof, public) = ballot(&ledger, &identity, 0, 5);

        assert_eq!(
            ledger.submit_vote(&NativeBackend, &proof, &public, 5),
            Err(LedgerError::UnknownProposal { proposal: 5, count: 2 })
        );
    }

    #[test]
    fn test_invalid_proof_leaves_state_unchanged() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        let (proof, public) = ballot(&ledger, &identity, 0, 0);

        // Proof for different public inputs
        let mut forged = public;
        forged.epoch = Fr::from(9u64);
        forged.nullifier_hash = identity.nullifier_hash(&PoseidonHasher, forged.epoch).unwrap();

        assert_eq!(
            ledger.submit_vote(&NativeBackend, &proof, &forged, 0),
            Err(LedgerError::InvalidProof)
        );
        assert!(!ledger.is_nullified(&forged.nullifier_hash, &forged.epoch));
        assert_eq!(ledger.tally(0), Some(0));
    }

    #[test]
    fn test_backend_error_is_reported() {
        let mut ledger = ledger();
        let identity = enroll(&mut ledger, 1);
        let (_, public) = ballot(&ledger, &identity, 0, 0);

        assert_eq!(
            ledger.submit_vote(&NativeBackend, &None, &public, 0),
            Err(LedgerError::Proof("native backend failure".to_string()))
        );
    }

    #[test]
    fn test_register_when_full() {
        let mut ledger: InMemoryLedger = InMemoryLedger::new(1, PoseidonHasher, ["yes"]).unwrap();
        ledger.register(Fr::from(1u64)).unwrap();
        ledger.register(Fr::from(2u64)).unwrap();

        assert!(matches!(
            ledger.register(Fr::from(3u64)),
            Err(LedgerError::Membership(MembershipError::CapacityExceeded { .. }))
        ));
    }
}
