//! Export the membership verifying key for on-chain deployment.
//!
//! Loads keys from the key directory (or runs setup there), then prints the
//! compressed verifying key as hex and the curve points as decimal strings in
//! the coordinate order Solidity Groth16 verifiers expect.
//!
//! Usage:
//!   cargo run --release --bin export-vks -- [keys_dir] [height]

use std::path::PathBuf;

use anonvote_circuits::DEFAULT_HEIGHT;
use anonvote_prover::setup::CircuitKeys;
use ark_bn254::{Fq, G1Affine, G2Affine};
use ark_ff::PrimeField;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let keys_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or("keys"));
    let height = args
        .get(2)
        .map(|h| h.parse::<usize>().expect("height must be a number"))
        .unwrap_or(DEFAULT_HEIGHT);

    info!(dir = %keys_dir.display(), height, "loading or generating circuit keys");
    let keys = CircuitKeys::load_or_setup(&keys_dir, height).expect("Failed to prepare keys");

    let vk_bytes = keys.membership.serialize_vk().expect("Failed to serialize VK");
    let vk = &keys.membership.verifying_key;

    println!("\n=== Membership Verifying Key (height {}) ===\n", keys.height);
    println!("Compressed VK ({} bytes):", vk_bytes.len());
    println!("0x{}\n", hex::encode(&vk_bytes));

    let ic: Vec<[String; 2]> = vk.gamma_abc_g1.iter().map(g1_strings).collect();

    // Also export as JSON for scripting
    let json = serde_json::json!({
        "height": keys.height,
        "vk": format!("0x{}", hex::encode(&vk_bytes)),
        "alpha": g1_strings(&vk.alpha_g1),
        "beta": g2_strings(&vk.beta_g2),
        "gamma": g2_strings(&vk.gamma_g2),
        "delta": g2_strings(&vk.delta_g2),
        "ic": ic,
    });

    let json_path = keys_dir.join("verifying_key.json");
    std::fs::write(
        &json_path,
        serde_json::to_string_pretty(&json).expect("Failed to encode JSON"),
    )
    .expect("Failed to write JSON");
    info!(path = %json_path.display(), "JSON exported");

    println!("=== Solidity Constants ===\n");
    println!("// Copy these into the verifier contract");
    print_g1("alpha", &vk.alpha_g1);
    print_g2("beta", &vk.beta_g2);
    print_g2("gamma", &vk.gamma_g2);
    print_g2("delta", &vk.delta_g2);
    for (i, point) in vk.gamma_abc_g1.iter().enumerate() {
        print_g1(&format!("IC{}", i), point);
    }
}

fn fq_string(f: &Fq) -> String {
    f.into_bigint().to_string()
}

fn g1_strings(p: &G1Affine) -> [String; 2] {
    [fq_string(&p.x), fq_string(&p.y)]
}

/// Fq2 coordinates are written imaginary part first.
fn g2_strings(p: &G2Affine) -> [[String; 2]; 2] {
    [
        [fq_string(&p.x.c1), fq_string(&p.x.c0)],
        [fq_string(&p.y.c1), fq_string(&p.y.c0)],
    ]
}

fn print_g1(name: &str, p: &G1Affine) {
    let [x, y] = g1_strings(p);
    println!("uint256 constant {}x = {};", name, x);
    println!("uint256 constant {}y = {};", name, y);
}

fn print_g2(name: &str, p: &G2Affine) {
    let [[x1, x0], [y1, y0]] = g2_strings(p);
    println!("uint256 constant {}x1 = {};", name, x1);
    println!("uint256 constant {}x2 = {};", name, x0);
    println!("uint256 constant {}y1 = {};", name, y1);
    println!("uint256 constant {}y2 = {};", name, y0);
}
