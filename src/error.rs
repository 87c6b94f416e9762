//! Crate-wide error taxonomy
//!
//! Every component reports failures through this single `thiserror`-derived
//! enum rather than module-local variants, because the protocol's error
//! taxonomy is flat and shared across Field, Polynomial, AIR and FRI (see the
//! kinds enumerated in the design notes). Module-local errors
//! ([`crate::field::FieldError`], [`crate::merkle::MerkleError`]) still exist
//! where a narrower type is useful at the call site, and convert into
//! [`StarkError`] via `#[from]`.

#![forbid(unsafe_code)]

use crate::field::FieldError;
use crate::merkle::MerkleError;

/// Flat error taxonomy shared by the prover, verifier, and every subsystem.
#[derive(Debug, thiserror::Error)]
pub enum StarkError {
    /// Malformed statement/witness/transcript JSON, or a numeric field value
    /// outside the field's modulus.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Requested NTT or evaluation domain size does not divide `p - 1`, or is
    /// not a power of two.
    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    /// Execution trace fails an AIR boundary or transition check during
    /// proving.
    #[error("constraint violated: {0}")]
    ConstraintViolated(String),

    /// Merkle inclusion check fails during verification.
    #[error("commitment invalid: {0}")]
    CommitmentInvalid(String),

    /// FRI folding is inconsistent, or the final polynomial exceeds the
    /// allowed degree bound.
    #[error("low-degree proximity failure: {0}")]
    LowDegreeFailure(String),

    /// Statement hash mismatch or field prime mismatch between prover and
    /// verifier.
    #[error("binding failure: {0}")]
    BindingFailure(String),

    /// Field inverse of zero was requested.
    #[error("division by zero")]
    DivisionByZero,
}

impl StarkError {
    /// Stable, lowercase-with-underscores tag for this error kind, used by the
    /// CLI/HTTP `error_type` fields in external response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            StarkError::InvalidInput(_) => "invalid_input",
            StarkError::DomainMismatch(_) => "domain_mismatch",
            StarkError::ConstraintViolated(_) => "constraint_violated",
            StarkError::CommitmentInvalid(_) => "commitment_invalid",
            StarkError::LowDegreeFailure(_) => "low_degree_failure",
            StarkError::BindingFailure(_) => "binding_failure",
            StarkError::DivisionByZero => "division_by_zero",
        }
    }
}

impl From<FieldError> for StarkError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::DivisionByZero => StarkError::DivisionByZero,
            FieldError::DomainMismatch(msg) => StarkError::DomainMismatch(msg),
        }
    }
}

impl From<MerkleError> for StarkError {
    fn from(e: MerkleError) -> Self {
        StarkError::CommitmentInvalid(e.to_string())
    }
}
