//! `generate-proof` CLI
//!
//! `generate-proof --proof-type T --statement S-json --witness W-json`
//! emits `{ success, proof, verified, proof_type, protocol, cuda_accelerated }`
//! on stdout; exit code 0 on success, 1 on failure with the same schema but
//! `success: false` and `error`/`error_type` fields (spec.md §6).

#![forbid(unsafe_code)]

use std::env;
use std::process::ExitCode;

use serde_json::json;
use starkcore::{Prover, StarkConfig, Verifier, PROTOCOL_TAG};

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn run() -> Result<serde_json::Value, (String, &'static str, String)> {
    let args: Vec<String> = env::args().collect();

    let proof_type = parse_flag(&args, "--proof-type").unwrap_or_else(|| "default".to_string());

    let statement_str = parse_flag(&args, "--statement")
        .ok_or_else(|| ("missing --statement".to_string(), "invalid_input", proof_type.clone()))?;
    let witness_str = parse_flag(&args, "--witness")
        .ok_or_else(|| ("missing --witness".to_string(), "invalid_input", proof_type.clone()))?;

    let statement: serde_json::Value = serde_json::from_str(&statement_str)
        .map_err(|e| (format!("malformed --statement JSON: {e}"), "invalid_input", proof_type.clone()))?;
    let witness: serde_json::Value = serde_json::from_str(&witness_str)
        .map_err(|e| (format!("malformed --witness JSON: {e}"), "invalid_input", proof_type.clone()))?;

    let config = StarkConfig::default();
    let prover = Prover::new(config);
    let proof = prover
        .prove(&statement, &witness)
        .map_err(|e| (e.to_string(), e.kind(), proof_type.clone()))?;

    let verifier = Verifier::new(config);
    let verified = verifier.verify(&proof, &statement);

    Ok(json!({
        "success": true,
        "proof": proof,
        "verified": verified,
        "proof_type": proof_type,
        "protocol": PROTOCOL_TAG,
        "cuda_accelerated": false,
    }))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run() {
        Ok(envelope) => {
            println!("{}", serde_json::to_string(&envelope).expect("envelope is valid JSON"));
            ExitCode::SUCCESS
        }
        Err((error, error_type, proof_type)) => {
            let envelope = json!({
                "success": false,
                "error": error,
                "error_type": error_type,
                "proof_type": proof_type,
                "protocol": PROTOCOL_TAG,
                "cuda_accelerated": false,
            });
            println!("{}", serde_json::to_string(&envelope).expect("envelope is valid JSON"));
            ExitCode::FAILURE
        }
    }
}
