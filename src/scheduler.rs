//! Prover / Verifier orchestration
//!
//! Wires Field, Polynomial, MerkleTree, AIR and FRI together into the
//! prove/verify algorithm of spec.md §4.6. Conceptually single-threaded per
//! proof: every inner loop (NTT, poly multiply, FRI fold) is a pure data
//! transformation with no suspension points, so there is nothing here to
//! synchronize (spec.md §5).

#![forbid(unsafe_code)]

use sha2::{Digest as _, Sha256};
use tracing::{debug, info};

use crate::air::{Air, SuccessorAir};
use crate::config::StarkConfig;
use crate::error::StarkError;
use crate::field::{Field, FieldElement, MODULUS};
use crate::fri::{self, FriCommitment, QueryOpenings};
use crate::merkle::Digest32;
use crate::poly::Polynomial;
use crate::transcript;
use crate::{Proof, PROTOCOL_TAG};

/// Proof-of-work grinding is compiled in only when the `grinding` feature is
/// enabled (spec.md §9): the nonce search runs over the trace root and is
/// folded into every subsequent query-index derivation.
#[cfg(feature = "grinding")]
fn maybe_grind(trace_root: &Digest32, bits: u32) -> Option<u64> {
    if bits == 0 {
        return None;
    }
    Some(transcript::grind(trace_root, bits).0)
}

#[cfg(not(feature = "grinding"))]
fn maybe_grind(_trace_root: &Digest32, _bits: u32) -> Option<u64> {
    None
}

/// Verifier-side counterpart of [`maybe_grind`]: re-checks the claimed nonce
/// meets the configured difficulty before trusting any query index derived
/// from it.
#[cfg(feature = "grinding")]
fn check_grind(trace_root: &Digest32, nonce: Option<u64>, bits: u32) -> Result<(), StarkError> {
    if bits == 0 {
        return Ok(());
    }
    let nonce = nonce
        .ok_or_else(|| StarkError::BindingFailure("grinding nonce missing from proof".into()))?;
    if !transcript::verify_grind(trace_root, nonce, bits) {
        return Err(StarkError::BindingFailure(
            "grinding proof-of-work does not meet the required difficulty".into(),
        ));
    }
    Ok(())
}

#[cfg(not(feature = "grinding"))]
fn check_grind(_trace_root: &Digest32, _nonce: Option<u64>, _bits: u32) -> Result<(), StarkError> {
    Ok(())
}

/// Orchestrates a single proof from a public statement and a private
/// witness.
pub struct Prover {
    config: StarkConfig,
    field: Field,
}

impl Prover {
    pub fn new(config: StarkConfig) -> Self {
        Prover { config, field: Field::new() }
    }

    /// Derive the trace seed from the witness, per spec.md §4.6 step 1: a
    /// numeric `secret_value`/`age`/`value` field is reduced mod p directly;
    /// a string value is SHA-256'd first. Absent any of those keys, the
    /// reference's literal default of 42 is used.
    fn derive_seed(witness: &serde_json::Value) -> FieldElement {
        let candidate = witness
            .get("secret_value")
            .or_else(|| witness.get("age"))
            .or_else(|| witness.get("value"));

        match candidate {
            Some(serde_json::Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    FieldElement::new(v)
                } else if let Some(v) = n.as_i64() {
                    let m = MODULUS as i128;
                    let r = ((v as i128 % m) + m) % m;
                    FieldElement::new(r as u64)
                } else {
                    FieldElement::ZERO
                }
            }
            Some(serde_json::Value::String(s)) => {
                let digest = Sha256::digest(s.as_bytes());
                FieldElement::from_be_bytes_mod_order(&digest)
            }
            _ => FieldElement::new(42),
        }
    }

    /// Prove `statement` using `witness`, returning the transcript or the
    /// first `ConstraintViolated`/`DomainMismatch` error encountered (the
    /// prover aborts on the first such failure and emits no transcript,
    /// spec.md §7).
    pub fn prove(
        &self,
        statement: &serde_json::Value,
        witness: &serde_json::Value,
    ) -> Result<Proof, StarkError> {
        let cfg = &self.config;
        let seed = Self::derive_seed(witness);

        let trace = SuccessorAir::build_trace(seed, cfg.trace_length);
        let air = SuccessorAir;
        if !air.evaluate_all(&trace) {
            return Err(StarkError::ConstraintViolated(
                "execution trace failed the AIR boundary/transition check".into(),
            ));
        }
        let public_output = trace.last();

        let base_domain = self.field.evaluation_domain(cfg.trace_length)?;
        let points: Vec<(FieldElement, FieldElement)> =
            base_domain.iter().zip(trace.as_slice()).map(|(&x, &y)| (x, y)).collect();
        let trace_poly = Polynomial::from_evaluations_ntt(
            &self.field,
            &points.iter().map(|&(_, y)| y).collect::<Vec<_>>(),
        )
        .map_err(|e| StarkError::DomainMismatch(e.to_string()))?;

        let extended_len = cfg.extended_length();
        let offset = self.field.coset_shift();
        let extended_domain = self.field.coset_domain(extended_len, offset)?;

        let (commitment, trees, evals_per_layer) = fri::commit(
            &self.field,
            &trace_poly,
            &extended_domain,
            cfg.num_queries,
            cfg.num_fri_layers,
        )
        .map_err(|e| StarkError::LowDegreeFailure(e.to_string()))?;

        let trace_root = commitment.layers[0].root;
        let grinding_nonce = maybe_grind(&trace_root, cfg.grinding_bits);
        let query_idx = transcript::query_indices(
            &trace_root,
            cfg.num_queries,
            extended_domain.len(),
            grinding_nonce,
        );
        let query_responses = fri::query(&trees, &evals_per_layer, &query_idx);

        let canonical_statement =
            serde_json::to_vec(statement).map_err(|e| StarkError::InvalidInput(e.to_string()))?;
        let statement_hash = transcript::statement_hash(&canonical_statement);

        info!(trace_length = cfg.trace_length, num_queries = cfg.num_queries, "proof generated");

        Ok(Proof {
            protocol: PROTOCOL_TAG.to_string(),
            trace_length: cfg.trace_length,
            extended_trace_length: extended_len,
            blowup_factor: cfg.blowup_factor,
            trace_merkle_root: hex::encode(trace_root),
            fri_roots: commitment.layers.iter().map(|l| hex::encode(l.root)).collect(),
            fri_challenges: commitment.challenges.clone(),
            fri_final_polynomial: commitment.final_poly.coeffs().to_vec(),
            query_indices: query_idx,
            query_responses,
            field_prime: MODULUS.to_string(),
            security_level: cfg.target_security_bits,
            num_queries: cfg.num_queries,
            statement_hash,
            statement: statement.clone(),
            public_output,
            timestamp: chrono::Utc::now().to_rfc3339(),
            cuda_accelerated: false,
            air_satisfied: true,
            grinding_nonce,
        })
    }
}

/// Verifies a transcript against a public statement, returning only a
/// boolean (spec.md §4.6, §7 — the verifier never exposes the internal
/// cause of a rejection, to avoid giving an adversarial prover an oracle).
pub struct Verifier {
    config: StarkConfig,
    field: Field,
}

impl Verifier {
    pub fn new(config: StarkConfig) -> Self {
        Verifier { config, field: Field::new() }
    }

    pub fn verify(&self, proof: &Proof, statement: &serde_json::Value) -> bool {
        match self.verify_inner(proof, statement) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, kind = e.kind(), "proof rejected");
                false
            }
        }
    }

    fn verify_inner(&self, proof: &Proof, statement: &serde_json::Value) -> Result<(), StarkError> {
        let canonical_statement =
            serde_json::to_vec(statement).map_err(|e| StarkError::InvalidInput(e.to_string()))?;
        let expected_hash = transcript::statement_hash(&canonical_statement);
        if expected_hash != proof.statement_hash {
            return Err(StarkError::BindingFailure("statement hash mismatch".into()));
        }

        if proof.field_prime != MODULUS.to_string() {
            return Err(StarkError::BindingFailure("field prime mismatch".into()));
        }

        if proof.trace_merkle_root.len() != 64 || hex::decode(&proof.trace_merkle_root).is_err() {
            return Err(StarkError::CommitmentInvalid(
                "trace merkle root is not 64 hex characters".into(),
            ));
        }
        let first_fri_root = proof
            .fri_roots
            .first()
            .ok_or_else(|| StarkError::CommitmentInvalid("no FRI roots present".into()))?;
        if &proof.trace_merkle_root != first_fri_root {
            return Err(StarkError::CommitmentInvalid(
                "trace root does not match first FRI layer root".into(),
            ));
        }

        let min_responses = (self.config.num_queries + 1) / 2;
        if proof.query_responses.len() < min_responses {
            return Err(StarkError::CommitmentInvalid(format!(
                "only {} query responses, need at least {}",
                proof.query_responses.len(),
                min_responses
            )));
        }

        let layers = proof
            .fri_roots
            .iter()
            .map(|hex_root| {
                let bytes = hex::decode(hex_root)
                    .map_err(|_| StarkError::CommitmentInvalid("malformed FRI root hex".into()))?;
                let digest: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| StarkError::CommitmentInvalid("FRI root is not 32 bytes".into()))?;
                Ok(fri::FriLayer { root: digest })
            })
            .collect::<Result<Vec<_>, StarkError>>()?;

        let commitment = FriCommitment {
            layers,
            challenges: proof.fri_challenges.clone(),
            final_poly: Polynomial::new(proof.fri_final_polynomial.clone()),
        };

        let extended_len = self.config.extended_length();
        let offset = self.field.coset_shift();
        let domain = self.field.coset_domain(extended_len, offset)?;

        let trace_root_bytes = fri_root_bytes(first_fri_root)?;
        check_grind(&trace_root_bytes, proof.grinding_nonce, self.config.grinding_bits)?;
        let expected_indices = transcript::query_indices(
            &trace_root_bytes,
            self.config.num_queries,
            extended_len,
            proof.grinding_nonce,
        );
        let recomputed: Vec<QueryOpenings> = proof
            .query_responses
            .iter()
            .map(|r| {
                if !expected_indices.contains(&r.index) {
                    return Err(StarkError::BindingFailure(
                        "query index not derivable from the trace root".into(),
                    ));
                }
                Ok(r.clone())
            })
            .collect::<Result<_, StarkError>>()?;

        fri::verify(
            &commitment,
            &domain,
            &recomputed,
            self.config.num_queries,
            min_responses,
        )
        .map_err(|e| StarkError::LowDegreeFailure(e.to_string()))?;

        if !proof.air_satisfied {
            return Err(StarkError::ConstraintViolated("air_satisfied flag not set".into()));
        }

        Ok(())
    }
}

fn fri_root_bytes(hex_root: &str) -> Result<[u8; 32], StarkError> {
    let bytes = hex::decode(hex_root)
        .map_err(|_| StarkError::CommitmentInvalid("malformed FRI root hex".into()))?;
    bytes
        .try_into()
        .map_err(|_| StarkError::CommitmentInvalid("FRI root is not 32 bytes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_config() -> StarkConfig {
        StarkConfig {
            trace_length: 16,
            blowup_factor: 4,
            num_queries: 8,
            num_fri_layers: 6,
            grinding_bits: 0,
            target_security_bits: 128,
        }
    }

    #[test]
    fn honest_proof_verifies_against_same_statement() {
        let cfg = small_config();
        let prover = Prover::new(cfg);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let proof = prover.prove(&statement, &witness).unwrap();

        assert_eq!(proof.protocol, PROTOCOL_TAG);
        assert_eq!(proof.trace_length, 16);
        assert!(!proof.fri_roots.is_empty());

        let verifier = Verifier::new(small_config());
        assert!(verifier.verify(&proof, &statement));
    }

    #[test]
    fn tampered_trace_root_is_rejected() {
        let cfg = small_config();
        let prover = Prover::new(cfg);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let mut proof = prover.prove(&statement, &witness).unwrap();
        proof.trace_merkle_root = "00".repeat(32);

        let verifier = Verifier::new(small_config());
        assert!(!verifier.verify(&proof, &statement));
    }

    #[test]
    fn mismatched_statement_is_rejected() {
        let cfg = small_config();
        let prover = Prover::new(cfg);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let proof = prover.prove(&statement, &witness).unwrap();

        let other_statement = json!({"claim": "age>=21", "threshold": 22});
        let verifier = Verifier::new(small_config());
        assert!(!verifier.verify(&proof, &other_statement));
    }

    #[test]
    fn tampered_fri_challenge_is_rejected() {
        let cfg = small_config();
        let prover = Prover::new(cfg);
        let statement = json!({"claim": "settlement", "amount": 1000, "timestamp": 1_700_000_000});
        let witness = json!({"secret_value": 42, "batch_id": "test_batch_001"});
        let mut proof = prover.prove(&statement, &witness).unwrap();
        assert!(!proof.fri_challenges.is_empty());

        proof.fri_challenges[0] = proof.fri_challenges[0] + FieldElement::ONE;

        let verifier = Verifier::new(cfg);
        assert!(!verifier.verify(&proof, &statement));
    }

    #[test]
    fn different_secrets_yield_different_trace_roots() {
        let statement = json!({"claim": "settlement", "amount": 1000});
        let prover = Prover::new(small_config());
        let proof_a = prover.prove(&statement, &json!({"secret_value": 100})).unwrap();
        let proof_b = prover.prove(&statement, &json!({"secret_value": 200})).unwrap();
        assert_ne!(proof_a.trace_merkle_root, proof_b.trace_merkle_root);
    }

    #[test]
    fn proving_twice_is_deterministic() {
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let prover = Prover::new(small_config());
        let proof_a = prover.prove(&statement, &witness).unwrap();
        let proof_b = prover.prove(&statement, &witness).unwrap();
        assert_eq!(proof_a.trace_merkle_root, proof_b.trace_merkle_root);
        assert_eq!(proof_a.fri_final_polynomial, proof_b.fri_final_polynomial);
    }

    #[test]
    fn serialize_round_trip_verifies_identically() {
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let prover = Prover::new(small_config());
        let proof = prover.prove(&statement, &witness).unwrap();

        let json = serde_json::to_string(&proof).unwrap();
        let restored: Proof = serde_json::from_str(&json).unwrap();

        let verifier = Verifier::new(small_config());
        assert!(verifier.verify(&restored, &statement));
    }

    #[test]
    fn grinding_disabled_by_default_feature_set_leaves_nonce_absent() {
        let mut cfg = small_config();
        cfg.grinding_bits = 8;
        let prover = Prover::new(cfg);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let proof = prover.prove(&statement, &witness).unwrap();
        // Without the `grinding` cargo feature enabled, no nonce search runs
        // regardless of a non-zero `grinding_bits`.
        assert_eq!(proof.grinding_nonce, None);
        let verifier = Verifier::new(cfg);
        assert!(verifier.verify(&proof, &statement));
    }

    #[cfg(feature = "grinding")]
    #[test]
    fn grinding_nonce_is_present_and_checked_when_enabled() {
        let mut cfg = small_config();
        cfg.grinding_bits = 8;
        let prover = Prover::new(cfg);
        let statement = json!({"claim": "age>=21", "threshold": 21});
        let witness = json!({"age": 25, "secret_value": 12345});
        let mut proof = prover.prove(&statement, &witness).unwrap();
        assert!(proof.grinding_nonce.is_some());

        let verifier = Verifier::new(cfg);
        assert!(verifier.verify(&proof, &statement));

        // Tampering with the nonce invalidates the proof-of-work check.
        proof.grinding_nonce = Some(proof.grinding_nonce.unwrap().wrapping_add(1));
        assert!(!verifier.verify(&proof, &statement));
    }
}
