//! Non-interactive Zero-Knowledge STARK proof engine
//!
//! A prover that, given a public statement and a private witness, produces a
//! succinct transcript convincing any verifier that a computation linking
//! witness to statement was performed honestly, without revealing the
//! witness. The verifier consumes only the transcript and the public
//! statement (spec.md §1).
//!
//! ## Layout
//! Field arithmetic, a polynomial layer built on it, Merkle vector
//! commitments, an AIR describing the trace constraint system, and FRI
//! binding all the pieces together via a Fiat–Shamir transform
//! (dependency order: [`field`] ← [`poly`] ← [`merkle`] ← [`air`] ←
//! [`fri`] ← [`scheduler`]).
//!
//! The HTTP proof-job surface, CLI wrappers, and an external CUDA batch
//! accelerator are external collaborators that consume this crate's types;
//! none of their concerns belong in the core (spec.md §1).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use serde::{Deserialize, Serialize};

/// Finite-field arithmetic, roots of unity, and the number-theoretic
/// transform.
pub mod field;
/// Dense univariate polynomials built on [`field`].
pub mod poly;
/// SHA-256 binary Merkle tree commitment.
pub mod merkle;
/// Execution-trace constraint system (boundary + transition).
pub mod air;
/// Fast Reed–Solomon Interactive Oracle of Proximity.
pub mod fri;
/// Fiat–Shamir transcript derivations.
pub mod transcript;
/// Public protocol parameters.
pub mod config;
/// Crate-wide error taxonomy.
pub mod error;
/// Prover/Verifier orchestration.
pub mod scheduler;

pub use config::StarkConfig;
pub use error::StarkError;
pub use scheduler::{Prover, Verifier};

/// Protocol tag carried in every transcript, matching the reference
/// implementation's literal string (spec.md §8 scenario 1).
pub const PROTOCOL_TAG: &str = "ZK-STARK (AIR + FRI)";

/// The proof transcript a single prover invocation emits: self-contained,
/// immutable, and containing no references to mutable state outside itself
/// (spec.md §3).
///
/// Integers that exceed 53 bits (field elements, in particular) are
/// serialized as decimal strings rather than JSON numbers; Merkle roots are
/// lowercase hexadecimal without a prefix (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Proof {
    pub protocol: String,
    pub trace_length: usize,
    pub extended_trace_length: usize,
    pub blowup_factor: usize,
    pub trace_merkle_root: String,
    pub fri_roots: Vec<String>,
    #[serde(with = "crate::field::decimal_vec")]
    pub fri_challenges: Vec<field::FieldElement>,
    #[serde(with = "crate::field::decimal_vec")]
    pub fri_final_polynomial: Vec<field::FieldElement>,
    pub query_indices: Vec<usize>,
    pub query_responses: Vec<fri::QueryOpenings>,
    pub field_prime: String,
    pub security_level: u32,
    pub num_queries: usize,
    #[serde(with = "crate::field::decimal")]
    pub statement_hash: field::FieldElement,
    pub statement: serde_json::Value,
    #[serde(with = "crate::field::decimal")]
    pub public_output: field::FieldElement,
    pub timestamp: String,
    pub cuda_accelerated: bool,
    pub air_satisfied: bool,
    /// Grinding proof-of-work nonce, present iff grinding is enabled (the
    /// `grinding` crate feature and a non-zero `grinding_bits`); folded into
    /// every FRI query index derived after the trace root is absorbed
    /// (spec.md §9).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grinding_nonce: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prove_and_verify_literal_scenario() {
        let config = StarkConfig {
            trace_length: 16,
            blowup_factor: 4,
            num_queries: 8,
            num_fri_layers: 6,
            grinding_bits: 0,
            target_security_bits: 128,
        };
        let prover = Prover::new(config);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let proof = prover.prove(&statement, &witness).unwrap();
        assert_eq!(proof.protocol, PROTOCOL_TAG);
        assert_eq!(proof.trace_length, 16);
        assert!(!proof.fri_roots.is_empty());

        let verifier = Verifier::new(config);
        assert!(verifier.verify(&proof, &statement));
    }

    #[test]
    fn replacing_trace_root_breaks_verification() {
        let config = StarkConfig {
            trace_length: 16,
            blowup_factor: 4,
            num_queries: 8,
            num_fri_layers: 6,
            grinding_bits: 0,
            target_security_bits: 128,
        };
        let prover = Prover::new(config);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let mut proof = prover.prove(&statement, &witness).unwrap();
        proof.trace_merkle_root = "00".repeat(32);

        let verifier = Verifier::new(config);
        assert!(!verifier.verify(&proof, &statement));
    }
}
