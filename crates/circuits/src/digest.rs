//! Digest encoding.
//!
//! A digest is a BN254 scalar field element. On the wire it is 32 bytes
//! big-endian, hex encoded with a `0x` prefix. Decoding rejects values that
//! are not canonical field elements instead of silently reducing them.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

use crate::error::MembershipError;

/// Field element used for every tree node, commitment and nullifier.
pub type Digest = Fr;

/// Width of the canonical byte encoding.
pub const DIGEST_BYTES: usize = 32;

/// Encode a digest as 32 big-endian bytes.
pub fn digest_to_bytes(digest: &Digest) -> [u8; DIGEST_BYTES] {
    let bytes = digest.into_bigint().to_bytes_be();
    let mut out = [0u8; DIGEST_BYTES];
    // BN254 limbs always serialize to exactly 32 bytes; right-align anyway.
    out[DIGEST_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Decode 32 big-endian bytes, rejecting values >= the field modulus.
pub fn digest_from_bytes(bytes: &[u8; DIGEST_BYTES]) -> Result<Digest, MembershipError> {
    let value = Fr::from_be_bytes_mod_order(bytes);
    if digest_to_bytes(&value) != *bytes {
        return Err(MembershipError::InvalidDigest(
            "value is not a canonical field element".to_string(),
        ));
    }
    Ok(value)
}

/// `0x`-prefixed hex form of a digest.
pub fn digest_to_hex(digest: &Digest) -> String {
    format!("0x{}", hex::encode(digest_to_bytes(digest)))
}

/// Parse a hex digest, with or without the `0x` prefix.
pub fn digest_from_hex(s: &str) -> Result<Digest, MembershipError> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| MembershipError::InvalidDigest(format!("invalid hex: {}", e)))?;

    let arr: [u8; DIGEST_BYTES] = bytes.as_slice().try_into().map_err(|_| {
        MembershipError::InvalidDigest(format!(
            "expected {} bytes, got {}",
            DIGEST_BYTES,
            bytes.len()
        ))
    })?;

    digest_from_bytes(&arr)
}

/// Serde adapter for a single hex digest (`#[serde(with = "hex_digest")]`).
pub mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{digest_from_hex, digest_to_hex, Digest};

    pub fn serialize<S: Serializer>(digest: &Digest, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&digest_to_hex(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Digest, D::Error> {
        let s = String::deserialize(d)?;
        digest_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for a list of hex digests.
pub mod hex_digest_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{digest_from_hex, digest_to_hex, Digest};

    pub fn serialize<S: Serializer>(digests: &[Digest], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(digests.iter().map(digest_to_hex))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Digest>, D::Error> {
        let raw = Vec::<String>::deserialize(d)?;
        raw.iter()
            .map(|s| digest_from_hex(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
