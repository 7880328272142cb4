//! HTTP request handlers for the voter flow.

use std::sync::Arc;

use ark_bn254::Fr;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use anonvote_circuits::{
    digest_from_hex, digest_to_hex, hash_proposal, Identity, Ledger, LedgerError,
    MembershipError, PoseidonHasher, PublicInputs, Witness,
};
use anonvote_prover::{prove, Groth16Backend, ProofWithInputs};

use crate::SharedState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn membership_status(e: &MembershipError) -> StatusCode {
    match e {
        MembershipError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
        MembershipError::CapacityExceeded { .. } | MembershipError::AlreadyRegistered(_) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

fn ledger_status(e: &LedgerError) -> StatusCode {
    match e {
        LedgerError::Membership(inner) => membership_status(inner),
        LedgerError::UnknownProposal { .. } => StatusCode::NOT_FOUND,
        LedgerError::DuplicateNullifier { .. } => StatusCode::CONFLICT,
        LedgerError::Proof(_) => StatusCode::INTERNAL_SERVER_ERROR,
        LedgerError::UnknownRoot(_) | LedgerError::SignalMismatch(_) | LedgerError::InvalidProof => {
            StatusCode::BAD_REQUEST
        }
    }
}

// ============ Identity ============

#[derive(Serialize, Deserialize)]
pub struct IdentityResponse {
    pub secret: String,
    pub commitment: String,
}

/// Generate a fresh identity. The secret leaves the server once and is not stored.
pub async fn generate_identity() -> Json<IdentityResponse> {
    let identity = Identity::generate();
    Json(IdentityResponse {
        secret: identity.secret_hex(),
        commitment: digest_to_hex(&identity.commitment(&PoseidonHasher)),
    })
}

// ============ Registration ============

#[derive(Deserialize)]
pub struct AddVoterRequest {
    pub commitment: String,
}

#[derive(Serialize, Deserialize)]
pub struct AddVoterResponse {
    pub leaf_index: u64,
    pub root: String,
}

pub async fn add_voter(
    State(state): State<SharedState>,
    Json(req): Json<AddVoterRequest>,
) -> impl IntoResponse {
    let commitment = match digest_from_hex(&req.commitment) {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let mut state = state.write().await;
    match state.ledger.register(commitment) {
        Ok(leaf_index) => {
            let response = AddVoterResponse {
                leaf_index,
                root: digest_to_hex(&state.ledger.current_root()),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(ledger_status(&e), e),
    }
}

// ============ Tree ============

#[derive(Serialize, Deserialize)]
pub struct TreeResponse {
    pub root: String,
    pub total_elements: u64,
    pub height: usize,
}

pub async fn tree_info(State(state): State<SharedState>) -> Json<TreeResponse> {
    let state = state.read().await;
    let tree = state.ledger.tree();
    Json(TreeResponse {
        root: digest_to_hex(&tree.root()),
        total_elements: tree.len(),
        height: tree.height(),
    })
}

pub async fn tree_path(
    State(state): State<SharedState>,
    Path(index): Path<u64>,
) -> impl IntoResponse {
    let state = state.read().await;
    match state.ledger.path(index) {
        Ok(path) => (StatusCode::OK, Json(path)).into_response(),
        Err(e) => error_response(ledger_status(&e), e),
    }
}

// ============ Prove ============

#[derive(Deserialize)]
pub struct ProveVoteRequest {
    pub secret: String,
    pub leaf_index: u64,
    pub epoch: u64,
    pub proposal: u64,
}

/// Common proof response
#[derive(Serialize, Deserialize)]
pub struct ProofResponse {
    pub proof: String,
    pub public_inputs: PublicInputs,
}

pub async fn prove_vote(
    State(state): State<SharedState>,
    Json(req): Json<ProveVoteRequest>,
) -> impl IntoResponse {
    let mut identity = match Identity::from_secret_hex(&req.secret) {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    // Snapshot what the proof needs, then release the lock before proving
    let (keys, witness) = {
        let state = state.read().await;

        if state.ledger.tally(req.proposal).is_none() {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("unknown proposal {}", req.proposal),
            );
        }

        // The leaf index is only trusted once the secret reproduces the stored commitment
        let leaf = match state.ledger.tree().leaf(req.leaf_index) {
            Ok(leaf) => leaf,
            Err(e) => return error_response(membership_status(&e), e),
        };
        if leaf != identity.commitment(&PoseidonHasher) {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("secret does not match the commitment at leaf {}", req.leaf_index),
            );
        }
        if let Err(e) = identity.register(req.leaf_index) {
            return error_response(membership_status(&e), e);
        }

        let path = match state.ledger.path(req.leaf_index) {
            Ok(path) => path,
            Err(e) => return error_response(ledger_status(&e), e),
        };

        let witness = match Witness::assemble(
            state.keys.height,
            path.root,
            hash_proposal(req.proposal),
            Fr::from(req.epoch),
            &identity,
            &PoseidonHasher,
            &path,
        ) {
            Ok(w) => w,
            Err(e) => return error_response(membership_status(&e), e),
        };

        (Arc::clone(&state.keys), witness)
    };

    // Groth16 proving is CPU bound; keep it off the async workers
    let proved = tokio::task::spawn_blocking(move || {
        prove::prove_membership(&keys.membership.proving_key, &witness)
    })
    .await;

    let proof_with_inputs = match proved {
        Ok(Ok(p)) => p,
        Ok(Err(e)) => return error_response(StatusCode::BAD_REQUEST, e),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    match proof_with_inputs.serialize_proof() {
        Ok(bytes) => {
            info!(epoch = req.epoch, proposal = req.proposal, "vote proof generated");
            let response = ProofResponse {
                proof: format!("0x{}", hex::encode(bytes)),
                public_inputs: proof_with_inputs.public_inputs,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

// ============ Vote ============

#[derive(Deserialize)]
pub struct VoteRequest {
    pub proof: String,
    pub public_inputs: PublicInputs,
    pub proposal: u64,
}

#[derive(Serialize, Deserialize)]
pub struct VoteResponse {
    pub proposal: u64,
    pub tally: u64,
}

pub async fn vote(
    State(state): State<SharedState>,
    Json(req): Json<VoteRequest>,
) -> impl IntoResponse {
    let proof_bytes = match hex::decode(req.proof.strip_prefix("0x").unwrap_or(&req.proof)) {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid hex: {}", e)),
    };
    let proof = match ProofWithInputs::deserialize_proof(&proof_bytes) {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let mut guard = state.write().await;
    let state = &mut *guard;
    let backend = Groth16Backend::new(&state.keys.membership);

    match state
        .ledger
        .submit_vote(&backend, &proof, &req.public_inputs, req.proposal)
    {
        Ok(tally) => {
            info!(proposal = req.proposal, tally, "vote accepted");
            let response = VoteResponse {
                proposal: req.proposal,
                tally,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            warn!(proposal = req.proposal, error = %e, "vote rejected");
            error_response(ledger_status(&e), e)
        }
    }
}

// ============ Proposals ============

#[derive(Serialize, Deserialize)]
pub struct ProposalResponse {
    pub id: u64,
    pub name: String,
    pub votes: u64,
}

pub async fn proposals(State(state): State<SharedState>) -> Json<Vec<ProposalResponse>> {
    let state = state.read().await;
    Json(
        state
            .ledger
            .proposals()
            .iter()
            .enumerate()
            .map(|(id, p)| ProposalResponse {
                id: id as u64,
                name: p.name.clone(),
                votes: p.vote_count,
            })
            .collect(),
    )
}
