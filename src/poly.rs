//! Dense univariate polynomials over [`FieldElement`]
//!
//! Coefficient vector, index 0 = constant term, trailing zeros stripped
//! (spec.md §3). Construction from an explicit coefficient list, from
//! Lagrange interpolation over arbitrary points, or from inverse-NTT over a
//! power-of-two subgroup. Immutable after construction; every operation
//! returns a new `Polynomial`.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::field::{Field, FieldElement};

/// Schoolbook multiplication is used below this product-of-lengths
/// threshold; NTT-based multiplication above it (spec.md §4.2).
const NTT_MUL_THRESHOLD: usize = 4096;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PolyError {
    #[error("interpolation requires distinct x-coordinates, duplicate found: {0}")]
    DuplicateXCoordinate(String),
    #[error(transparent)]
    Field(#[from] crate::field::FieldError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Polynomial {
    coeffs: Vec<FieldElement>,
}

impl Polynomial {
    /// Construct from coefficients, stripping trailing zeros. The zero
    /// polynomial is canonically `[0]`.
    pub fn new(mut coeffs: Vec<FieldElement>) -> Self {
        while coeffs.len() > 1 && coeffs.last() == Some(&FieldElement::ZERO) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            coeffs.push(FieldElement::ZERO);
        }
        Polynomial { coeffs }
    }

    pub fn zero() -> Self {
        Polynomial { coeffs: vec![FieldElement::ZERO] }
    }

    pub fn coeffs(&self) -> &[FieldElement] {
        &self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_zero()
    }

    /// Lagrange interpolation over `(x_i, y_i)` points. Fails if any two
    /// x-coordinates coincide.
    pub fn interpolate(points: &[(FieldElement, FieldElement)]) -> Result<Self, PolyError> {
        let n = points.len();
        if n == 0 {
            return Ok(Polynomial::zero());
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if points[i].0 == points[j].0 {
                    return Err(PolyError::DuplicateXCoordinate(points[i].0.to_string()));
                }
            }
        }
        let mut result = vec![FieldElement::ZERO; n];
        for i in 0..n {
            let (xi, yi) = points[i];
            let mut denom = FieldElement::ONE;
            for j in 0..n {
                if i != j {
                    denom = denom * (xi - points[j].0);
                }
            }
            let coeff0 = yi * denom.inv()?;
            // Build the basis polynomial prod_{j != i} (x - x_j) incrementally.
            let mut basis = vec![coeff0];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let neg_xj = -points[j].0;
                let mut next = vec![FieldElement::ZERO; basis.len() + 1];
                for (k, &c) in basis.iter().enumerate() {
                    next[k] = next[k] + c * neg_xj;
                    next[k + 1] = next[k + 1] + c;
                }
                basis = next;
            }
            for (k, c) in basis.into_iter().enumerate() {
                result[k] = result[k] + c;
            }
        }
        Ok(Polynomial::new(result))
    }

    /// Inverse-NTT over a power-of-two subgroup of evaluations: the fast path
    /// spec.md §4.2 mandates whenever the domain is FFT-compatible.
    pub fn from_evaluations_ntt(field: &Field, evals: &[FieldElement]) -> Result<Self, PolyError> {
        let mut values = evals.to_vec();
        field.intt(&mut values)?;
        Ok(Polynomial::new(values))
    }

    /// Evaluate via Horner's rule, `Theta(deg)`.
    pub fn evaluate(&self, x: FieldElement) -> FieldElement {
        let mut result = FieldElement::ZERO;
        for &c in self.coeffs.iter().rev() {
            result = result * x + c;
        }
        result
    }

    /// Evaluate over an entire domain. Uses NTT when the domain is a
    /// power-of-two multiplicative subgroup of size `n >= degree + 1`;
    /// otherwise falls back to pointwise Horner evaluation (spec.md §4.2).
    pub fn evaluate_domain(&self, field: &Field, domain: &[FieldElement]) -> Vec<FieldElement> {
        let n = domain.len();
        if n.is_power_of_two() && n >= self.coeffs.len() && Self::is_ntt_domain(field, domain) {
            let mut padded = self.coeffs.clone();
            padded.resize(n, FieldElement::ZERO);
            if field.ntt(&mut padded).is_ok() {
                return padded;
            }
        }
        domain.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Check whether `domain` is exactly the natural-order evaluation domain
    /// of the size-`n` subgroup (cheap spot check: generator of correct
    /// order, second element matches omega).
    fn is_ntt_domain(field: &Field, domain: &[FieldElement]) -> bool {
        let n = domain.len();
        if domain.first() != Some(&FieldElement::ONE) {
            return false;
        }
        match field.primitive_root_of_unity(n) {
            Ok(omega) => domain.get(1) == Some(&omega),
            Err(_) => false,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut result = vec![FieldElement::ZERO; n];
        for (i, &c) in self.coeffs.iter().enumerate() {
            result[i] = result[i] + c;
        }
        for (i, &c) in other.coeffs.iter().enumerate() {
            result[i] = result[i] + c;
        }
        Polynomial::new(result)
    }

    pub fn sub(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut result = vec![FieldElement::ZERO; n];
        for (i, &c) in self.coeffs.iter().enumerate() {
            result[i] = result[i] + c;
        }
        for (i, &c) in other.coeffs.iter().enumerate() {
            result[i] = result[i] - c;
        }
        Polynomial::new(result)
    }

    pub fn scale(&self, scalar: FieldElement) -> Self {
        Polynomial::new(self.coeffs.iter().map(|&c| c * scalar).collect())
    }

    /// Multiply two polynomials. Schoolbook below [`NTT_MUL_THRESHOLD`];
    /// zero-padded NTT multiplication above it (spec.md §4.2).
    pub fn mul(&self, field: &Field, other: &Self) -> Self {
        let n1 = self.coeffs.len();
        let n2 = other.coeffs.len();
        let result_len = n1 + n2 - 1;
        if n1 * n2 < NTT_MUL_THRESHOLD {
            let mut result = vec![FieldElement::ZERO; result_len];
            for (i, &a) in self.coeffs.iter().enumerate() {
                for (j, &b) in other.coeffs.iter().enumerate() {
                    result[i + j] = result[i + j] + a * b;
                }
            }
            return Polynomial::new(result);
        }
        let n = result_len.next_power_of_two();
        if field.primitive_root_of_unity(n).is_ok() {
            let mut a = self.coeffs.clone();
            a.resize(n, FieldElement::ZERO);
            let mut b = other.coeffs.clone();
            b.resize(n, FieldElement::ZERO);
            if field.ntt(&mut a).is_ok() && field.ntt(&mut b).is_ok() {
                let mut c: Vec<FieldElement> = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).collect();
                if field.intt(&mut c).is_ok() {
                    c.truncate(result_len);
                    return Polynomial::new(c);
                }
            }
        }
        // Domain has no NTT-compatible power of two large enough: fall back
        // to schoolbook regardless of size.
        let mut result = vec![FieldElement::ZERO; result_len];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                result[i + j] = result[i + j] + a * b;
            }
        }
        Polynomial::new(result)
    }

    /// Even/odd coefficient split used by FRI folding: `self = f_e(x^2) + x
    /// * f_o(x^2)`.
    pub fn split_even_odd(&self) -> (Self, Self) {
        let evens: Vec<FieldElement> = self.coeffs.iter().step_by(2).copied().collect();
        let odds: Vec<FieldElement> = self.coeffs.iter().skip(1).step_by(2).copied().collect();
        (Polynomial::new(evens), Polynomial::new(odds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horner_matches_direct_sum() {
        let p = Polynomial::new(vec![
            FieldElement::new(3),
            FieldElement::new(5),
            FieldElement::new(7),
        ]);
        let x = FieldElement::new(11);
        let expected = FieldElement::new(3) + FieldElement::new(5) * x + FieldElement::new(7) * x * x;
        assert_eq!(p.evaluate(x), expected);
    }

    #[test]
    fn interpolation_rejects_duplicate_x() {
        let pts = [
            (FieldElement::new(1), FieldElement::new(2)),
            (FieldElement::new(1), FieldElement::new(3)),
        ];
        assert!(Polynomial::interpolate(&pts).is_err());
    }

    #[test]
    fn interpolation_recovers_known_polynomial() {
        let p = Polynomial::new(vec![
            FieldElement::new(1),
            FieldElement::new(2),
            FieldElement::new(3),
        ]);
        let xs = [1u64, 2, 3, 4];
        let pts: Vec<_> = xs
            .iter()
            .map(|&x| {
                let x = FieldElement::new(x);
                (x, p.evaluate(x))
            })
            .collect();
        let recovered = Polynomial::interpolate(&pts).unwrap();
        assert_eq!(recovered, p);
    }

    #[test]
    fn ntt_intt_interpolation_round_trip() {
        let field = Field::new();
        let n = 8;
        let domain = field.evaluation_domain(n).unwrap();
        let p = Polynomial::new((1..=5).map(FieldElement::new).collect());
        let evals: Vec<_> = domain.iter().map(|&x| p.evaluate(x)).collect();
        let recovered = Polynomial::from_evaluations_ntt(&field, &evals).unwrap();
        assert_eq!(recovered, p);
    }

    #[test]
    fn multiplication_matches_pointwise_evaluation() {
        let field = Field::new();
        let p = Polynomial::new(vec![FieldElement::new(1), FieldElement::new(2)]);
        let q = Polynomial::new(vec![FieldElement::new(3), FieldElement::new(4), FieldElement::new(5)]);
        let product = p.mul(&field, &q);
        for v in [0u64, 1, 7, 99] {
            let x = FieldElement::new(v);
            assert_eq!(product.evaluate(x), p.evaluate(x) * q.evaluate(x));
        }
    }

    #[test]
    fn addition_is_coefficientwise() {
        let p = Polynomial::new(vec![FieldElement::new(1), FieldElement::new(2)]);
        let q = Polynomial::new(vec![FieldElement::new(10), FieldElement::new(20), FieldElement::new(30)]);
        let sum = p.add(&q);
        assert_eq!(
            sum.coeffs(),
            &[FieldElement::new(11), FieldElement::new(22), FieldElement::new(30)]
        );
    }

    #[test]
    fn zero_polynomial_is_canonical_single_zero() {
        let p = Polynomial::new(vec![FieldElement::ZERO, FieldElement::ZERO]);
        assert!(p.is_zero());
        assert_eq!(p.degree(), 0);
    }
}
