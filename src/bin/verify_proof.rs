//! `verify-proof` CLI
//!
//! `verify-proof --proof P-json --statement S-json` emits `{ success,
//! verified, protocol, cuda_accelerated }` on stdout; exit code 0 on success,
//! 1 on failure with the same schema but `success: false` and `error`,
//! `error_type` fields (spec.md §6).

#![forbid(unsafe_code)]

use std::env;
use std::process::ExitCode;

use serde_json::json;
use starkcore::{Proof, StarkConfig, Verifier, PROTOCOL_TAG};

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn run() -> Result<bool, (String, &'static str)> {
    let args: Vec<String> = env::args().collect();

    let proof_str = parse_flag(&args, "--proof")
        .ok_or_else(|| ("missing --proof".to_string(), "invalid_input"))?;
    let statement_str = parse_flag(&args, "--statement")
        .ok_or_else(|| ("missing --statement".to_string(), "invalid_input"))?;

    let proof: Proof = serde_json::from_str(&proof_str)
        .map_err(|e| (format!("malformed --proof JSON: {e}"), "invalid_input"))?;
    let statement: serde_json::Value = serde_json::from_str(&statement_str)
        .map_err(|e| (format!("malformed --statement JSON: {e}"), "invalid_input"))?;

    let verifier = Verifier::new(StarkConfig::default());
    Ok(verifier.verify(&proof, &statement))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run() {
        Ok(verified) => {
            let envelope = json!({
                "success": true,
                "verified": verified,
                "protocol": PROTOCOL_TAG,
                "cuda_accelerated": false,
            });
            println!("{}", serde_json::to_string(&envelope).expect("envelope is valid JSON"));
            ExitCode::SUCCESS
        }
        Err((error, error_type)) => {
            let envelope = json!({
                "success": false,
                "error": error,
                "error_type": error_type,
                "protocol": PROTOCOL_TAG,
                "cuda_accelerated": false,
            });
            println!("{}", serde_json::to_string(&envelope).expect("envelope is valid JSON"));
            ExitCode::FAILURE
        }
    }
}
