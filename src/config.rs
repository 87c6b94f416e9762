//! Public protocol parameters
//!
//! The only tuning surface exposed to callers; everything else (transport,
//! auth, job storage) belongs to the external services layered on top of
//! this crate (spec.md §6).

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Public parameter record shared by prover and verifier: trace length,
/// blowup factor, query count, FRI layer bound, grinding difficulty, and
/// the advertised security level (spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StarkConfig {
    /// Execution trace length `T`, a power of two.
    pub trace_length: usize,
    /// Low-degree-extension blowup factor `b`; code rate is `1/b`.
    pub blowup_factor: usize,
    /// Number of FRI query openings `q`.
    pub num_queries: usize,
    /// Upper bound on the number of FRI commit-phase layers `L`.
    pub num_fri_layers: usize,
    /// Proof-of-work grinding difficulty in leading zero bits; `0` disables
    /// grinding.
    pub grinding_bits: u32,
    /// Advertised security level in bits, surfaced in the transcript for
    /// informational purposes only (not independently checked).
    pub target_security_bits: u32,
}

impl Default for StarkConfig {
    /// Matches the reference implementation's defaults (spec.md §2, §5).
    fn default() -> Self {
        StarkConfig {
            trace_length: 256,
            blowup_factor: 4,
            num_queries: 80,
            num_fri_layers: 10,
            grinding_bits: 20,
            target_security_bits: 512,
        }
    }
}

impl StarkConfig {
    /// Size of the low-degree-extension domain, `T * b`.
    pub fn extended_length(&self) -> usize {
        self.trace_length * self.blowup_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let cfg = StarkConfig::default();
        assert_eq!(cfg.trace_length, 256);
        assert_eq!(cfg.blowup_factor, 4);
        assert_eq!(cfg.num_queries, 80);
        assert_eq!(cfg.num_fri_layers, 10);
        assert_eq!(cfg.grinding_bits, 20);
        assert_eq!(cfg.target_security_bits, 512);
    }

    #[test]
    fn extended_length_is_trace_times_blowup() {
        let cfg = StarkConfig::default();
        assert_eq!(cfg.extended_length(), 1024);
    }
}
