//! Fast Reed–Solomon Interactive Oracle of Proximity
//!
//! Proves that a committed polynomial has degree below a claimed bound,
//! using O(log N) round commitments and q spot-check openings rather than
//! sending the polynomial itself (spec.md §4.5).
//!
//! The verify phase here recomputes the full `f_e + alpha * f_o`
//! recomposition at every layer, not just the Merkle inclusion of the
//! opened values. The reference implementation this design is distilled
//! from only checks inclusion and never actually folds the two sibling
//! values together, which lets a dishonest prover swap in unrelated
//! openings between layers; that gap is closed here (spec.md §4.5, §9).

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::field::{Field, FieldElement};
use crate::merkle::{Digest32, InclusionProof, MerkleTree};
use crate::poly::Polynomial;
use crate::transcript::fold_challenge;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FriError {
    #[error(transparent)]
    Field(#[from] crate::field::FieldError),
    #[error("final polynomial degree {actual} exceeds bound {bound}")]
    FinalDegreeExceeded { actual: usize, bound: usize },
    #[error("folding consistency check failed at layer {layer}, query index {index}")]
    FoldingInconsistent { layer: usize, index: usize },
    #[error("merkle inclusion check failed at layer {layer}, query index {index}")]
    InclusionFailed { layer: usize, index: usize },
    #[error("query response count {actual} is below the minimum {minimum}")]
    TooFewResponses { actual: usize, minimum: usize },
}

/// One commit-phase layer: its Merkle root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriLayer {
    pub root: Digest32,
}

/// One opened value at one layer of one query: the value at the queried
/// index, the value at its sibling (`index XOR 1`), and both Merkle
/// inclusion proofs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerOpening {
    pub value: FieldElement,
    pub value_proof: InclusionProof,
    pub sibling_value: FieldElement,
    pub sibling_proof: InclusionProof,
}

/// The full opening for one query index: one [`LayerOpening`] per
/// commit-phase layer, in layer order. `index` halves between layers but is
/// recorded once; it is the index used at layer 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryOpenings {
    pub index: usize,
    pub layers: Vec<LayerOpening>,
}

/// Everything the commit phase produces: per-layer roots, the Fiat–Shamir
/// challenges used to fold between consecutive committed layers (one fewer
/// than the number of layers, since the last committed layer's polynomial
/// is sent directly as `final_poly` rather than folded and recommitted),
/// and the final low-degree polynomial's coefficients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriCommitment {
    pub layers: Vec<FriLayer>,
    pub challenges: Vec<FieldElement>,
    pub final_poly: Polynomial,
}

fn leaf_bytes(value: FieldElement) -> Vec<u8> {
    value.value().to_string().into_bytes()
}

/// Run the FRI commit phase on `poly` over `domain`. Folds until the
/// current domain has at most `2 * num_queries` elements or `num_fri_layers`
/// layers have been committed, matching the termination rule of spec.md
/// §4.5. Returns the per-layer trees and evaluations (needed by the query
/// phase) alongside the serializable [`FriCommitment`].
pub fn commit(
    field: &Field,
    poly: &Polynomial,
    domain: &[FieldElement],
    num_queries: usize,
    num_fri_layers: usize,
) -> Result<(FriCommitment, Vec<MerkleTree>, Vec<Vec<FieldElement>>), FriError> {
    let mut current_poly = poly.clone();
    let mut current_domain = domain.to_vec();

    let mut layers = Vec::new();
    let mut challenges = Vec::new();
    let mut trees = Vec::new();
    let mut evals_per_layer = Vec::new();

    let mut committed = 0usize;
    loop {
        let evals = current_poly.evaluate_domain(field, &current_domain);
        let leaves: Vec<Vec<u8>> = evals.iter().map(|&v| leaf_bytes(v)).collect();
        let tree = MerkleTree::build(&leaves);
        let root = tree.root();
        layers.push(FriLayer { root });
        trees.push(tree);
        evals_per_layer.push(evals);
        committed += 1;

        if current_domain.len() <= num_queries * 2 || committed >= num_fri_layers {
            break;
        }

        let alpha = fold_challenge(&root);
        challenges.push(alpha);

        let (even, odd) = current_poly.split_even_odd();
        current_poly = even.add(&odd.scale(alpha));
        // The next domain is the square of the first half of the current
        // one: D[i] and D[i + half] are additive inverses (the coset domain
        // is built from a root of even order), so squaring the first half
        // alone already covers every distinct y = x^2 (spec.md §4.5).
        let half = current_domain.len() / 2;
        current_domain = current_domain[..half].iter().map(|&x| x * x).collect();
    }

    Ok((
        FriCommitment { layers, challenges, final_poly: current_poly },
        trees,
        evals_per_layer,
    ))
}

/// Derive the per-query openings for every committed layer. `indices` are
/// the Fiat–Shamir query indices into the first (full) domain.
pub fn query(
    trees: &[MerkleTree],
    evals_per_layer: &[Vec<FieldElement>],
    indices: &[usize],
) -> Vec<QueryOpenings> {
    indices
        .iter()
        .map(|&start_index| {
            let mut idx = start_index;
            let mut layers = Vec::with_capacity(trees.len());
            for (tree, evals) in trees.iter().zip(evals_per_layer.iter()) {
                // The sibling of index `idx` is its additive-inverse point
                // `-x`, which sits at `idx XOR (domain_len / 2)` on this
                // crate's naturally-ordered coset domains, not `idx XOR 1`.
                let half = evals.len() / 2;
                let sibling_idx = idx ^ half;
                let value = evals[idx];
                let sibling_value = evals[sibling_idx];
                let value_proof = tree.prove(idx).expect("index within tree bounds");
                let sibling_proof = tree.prove(sibling_idx).expect("sibling within tree bounds");
                layers.push(LayerOpening { value, value_proof, sibling_value, sibling_proof });
                idx %= half;
            }
            QueryOpenings { index: start_index, layers }
        })
        .collect()
}

/// Verify one query's openings against the commit-phase roots, challenges
/// and final polynomial.
///
/// At every layer but the last: verify Merkle inclusion of the value and
/// its sibling, recompose `f_e(x^2) + alpha * f_o(x^2)` from them, and
/// check it equals the value opened at the same query index one layer
/// down. At the last committed layer: verify inclusion, then check the
/// opened value directly against `final_poly` evaluated at that layer's
/// domain point (the final polynomial is exactly that layer's polynomial,
/// sent in the clear instead of folded and recommitted again).
pub fn verify_query(
    commitment: &FriCommitment,
    domain: &[FieldElement],
    opening: &QueryOpenings,
) -> Result<(), FriError> {
    let num_layers = opening.layers.len();
    let mut idx = opening.index;
    let mut domain_len = domain.len();
    let mut x = domain[idx];

    for (layer_idx, layer_opening) in opening.layers.iter().enumerate() {
        let root = commitment.layers[layer_idx].root;
        let half = domain_len / 2;
        let sibling_idx = idx ^ half;

        if !MerkleTree::verify(
            &leaf_bytes(layer_opening.value),
            idx,
            &layer_opening.value_proof,
            &root,
        ) {
            return Err(FriError::InclusionFailed { layer: layer_idx, index: idx });
        }
        if !MerkleTree::verify(
            &leaf_bytes(layer_opening.sibling_value),
            sibling_idx,
            &layer_opening.sibling_proof,
            &root,
        ) {
            return Err(FriError::InclusionFailed { layer: layer_idx, index: sibling_idx });
        }

        if layer_idx + 1 == num_layers {
            if layer_opening.value != commitment.final_poly.evaluate(x) {
                return Err(FriError::FoldingInconsistent { layer: layer_idx, index: idx });
            }
            break;
        }

        // `value` is f(x) at this layer's actual domain point `x`; `sibling`
        // sits at `idx ^ half`, which is exactly `-x` on this domain, so no
        // parity check is needed to tell them apart.
        let f_x = layer_opening.value;
        let f_neg_x = layer_opening.sibling_value;

        let two_inv = FieldElement::new(2).inv()?;
        let x_inv = x.inv()?;
        let even_part = (f_x + f_neg_x) * two_inv;
        let odd_part = (f_x - f_neg_x) * two_inv * x_inv;
        let alpha = commitment.challenges[layer_idx];
        let recomposed = even_part + alpha * odd_part;

        let next_value = opening.layers[layer_idx + 1].value;
        if recomposed != next_value {
            return Err(FriError::FoldingInconsistent { layer: layer_idx, index: idx });
        }

        idx %= half;
        domain_len = half;
        x = x * x;
    }

    Ok(())
}

/// Verify all query openings plus the final polynomial's degree bound
/// (spec.md §4.5). `min_responses` is the minimum number of query openings
/// that must be present (the verifier's `ceil(q/2)` floor, spec.md §4.6).
pub fn verify(
    commitment: &FriCommitment,
    domain: &[FieldElement],
    openings: &[QueryOpenings],
    num_queries: usize,
    min_responses: usize,
) -> Result<(), FriError> {
    if openings.len() < min_responses {
        return Err(FriError::TooFewResponses { actual: openings.len(), minimum: min_responses });
    }
    for opening in openings {
        verify_query(commitment, domain, opening)?;
    }
    if commitment.final_poly.degree() > num_queries {
        return Err(FriError::FinalDegreeExceeded {
            actual: commitment.final_poly.degree(),
            bound: num_queries,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::query_indices;

    fn honest_setup() -> (Field, Polynomial, Vec<FieldElement>, usize, usize) {
        let field = Field::new();
        let trace_len = 16usize;
        let blowup = 4usize;
        let domain_len = trace_len * blowup;
        let coeffs: Vec<FieldElement> = (1..=trace_len as u64).map(FieldElement::new).collect();
        let poly = Polynomial::new(coeffs);
        let offset = field.coset_shift();
        let domain = field.coset_domain(domain_len, offset).unwrap();
        (field, poly, domain, 8, 6)
    }

    #[test]
    fn honest_proof_verifies() {
        let (field, poly, domain, num_queries, num_layers) = honest_setup();
        let (commitment, trees, evals) =
            commit(&field, &poly, &domain, num_queries, num_layers).unwrap();
        let trace_root = commitment.layers[0].root;
        let indices = query_indices(&trace_root, num_queries, domain.len(), None);
        let openings = query(&trees, &evals, &indices);
        let result = verify(&commitment, &domain, &openings, num_queries, (num_queries + 1) / 2);
        assert!(result.is_ok());
    }

    #[test]
    fn tampered_opened_value_is_rejected() {
        let (field, poly, domain, num_queries, num_layers) = honest_setup();
        let (commitment, trees, evals) =
            commit(&field, &poly, &domain, num_queries, num_layers).unwrap();
        let trace_root = commitment.layers[0].root;
        let indices = query_indices(&trace_root, num_queries, domain.len(), None);
        let mut openings = query(&trees, &evals, &indices);
        openings[0].layers[0].value = openings[0].layers[0].value + FieldElement::ONE;
        let result = verify(&commitment, &domain, &openings, num_queries, (num_queries + 1) / 2);
        assert!(result.is_err());
    }

    #[test]
    fn too_few_responses_is_rejected() {
        let (field, poly, domain, num_queries, num_layers) = honest_setup();
        let (commitment, trees, evals) =
            commit(&field, &poly, &domain, num_queries, num_layers).unwrap();
        let trace_root = commitment.layers[0].root;
        let indices = query_indices(&trace_root, num_queries, domain.len(), None);
        let openings = query(&trees, &evals, &indices);
        let truncated = &openings[..openings.len() / 4];
        let result = verify(&commitment, &domain, truncated, num_queries, (num_queries + 1) / 2);
        assert!(matches!(result, Err(FriError::TooFewResponses { .. })));
    }

    #[test]
    fn final_polynomial_degree_is_bounded_by_query_count() {
        let (field, poly, domain, num_queries, num_layers) = honest_setup();
        let (commitment, _, _) = commit(&field, &poly, &domain, num_queries, num_layers).unwrap();
        assert!(commitment.final_poly.degree() <= num_queries);
    }
}
