//! Field & Transform Primitives
//!
//! Modular arithmetic over the Goldilocks prime `p = 2^64 - 2^32 + 1`,
//! evaluation domains built from primitive roots of unity, and a radix-2
//! number-theoretic transform (NTT/INTT).
//!
//! ## Design notes
//! - `p - 1 = 2^32 * (2^32 - 1)` has 2-adic order 32, so this crate supports
//!   power-of-two NTT domains up to `2^32`.
//! - Multiplication reduces a 128-bit product using the prime's special form
//!   (`2^64 ≡ 2^32 - 1 (mod p)`), four wrapping operations instead of a
//!   general Barrett/Montgomery reduction.
//! - Roots of unity are cached per order for the lifetime of a [`Field`]
//!   instance (mirrors the teacher's per-instance SRS/domain digest caches).
//! - A requested order that does not divide `p - 1` is a hard
//!   [`FieldError::DomainMismatch`] — the reference implementation this
//!   design is distilled from silently substitutes a non-root (`2`) in that
//!   case, which breaks FRI's soundness argument. That fallback is rejected
//!   here by construction: there is no code path that returns anything but
//!   a verified primitive root or an error.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Goldilocks prime: `p = 2^64 - 2^32 + 1`.
pub const MODULUS: u64 = 0xFFFF_FFFF_0000_0001;

/// Generator of the full multiplicative group mod [`MODULUS`].
pub const GENERATOR: u64 = 7;

/// 2-adic order of `p - 1`: the largest power-of-two domain this field
/// supports directly (`2^32`).
pub const TWO_ADICITY: u32 = 32;

/// `2^64 mod p`, used by the fast 128-bit reduction.
const NEG_MODULUS_LOW: u64 = (1u64 << 32) - 1;

/// Errors produced by field operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Attempted to invert or divide by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// A requested domain/NTT order does not divide `p - 1`, or is not the
    /// power of two the operation requires.
    #[error("{0}")]
    DomainMismatch(String),
}

/// An element of `GF(p)`, always held in canonical form (`< MODULUS`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct FieldElement(u64);

impl FieldElement {
    pub const ZERO: Self = FieldElement(0);
    pub const ONE: Self = FieldElement(1);

    /// Reduce `val` into canonical form.
    #[inline]
    pub fn new(val: u64) -> Self {
        FieldElement(reduce_u64(val))
    }

    /// Construct from a value already known to be canonical (no reduction).
    #[inline]
    pub const fn from_canonical_u64(val: u64) -> Self {
        FieldElement(val)
    }

    /// The canonical `u64` representative, `0 <= value < MODULUS`.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Reduce an arbitrary non-negative integer (e.g. a SHA-256 digest
    /// interpreted as a big integer) into the field, matching the
    /// "witness as string -> SHA-256 -> mod p" derivation in spec.md §4.6.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        let mut acc = FieldElement::ZERO;
        let radix = FieldElement::new(256);
        for &b in bytes {
            acc = acc * radix + FieldElement::new(b as u64);
        }
        acc
    }

    /// Modular exponentiation by repeated squaring.
    pub fn pow(self, mut exp: u64) -> Self {
        let mut result = FieldElement::ONE;
        let mut base = self;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            exp >>= 1;
        }
        result
    }

    /// Multiplicative inverse via Fermat's little theorem (`a^(p-2)`).
    /// Fails with [`FieldError::DivisionByZero`] for `a == 0`, per spec.md §3.
    pub fn inv(self) -> Result<Self, FieldError> {
        if self.is_zero() {
            return Err(FieldError::DivisionByZero);
        }
        Ok(self.pow(MODULUS - 2))
    }

    /// Field division `self / rhs`.
    pub fn div(self, rhs: Self) -> Result<Self, FieldError> {
        Ok(self * rhs.inv()?)
    }
}

#[inline]
fn reduce_u64(val: u64) -> u64 {
    if val >= MODULUS {
        val - MODULUS
    } else {
        val
    }
}

/// Reduce a 128-bit product mod `p`. `x_hi * (2^32 - 1)` (the Goldilocks
/// special-form term, since `2^64 mod p == 2^32 - 1`) can itself be up to 96
/// bits, so this folds through `u128` rather than risking a silent `u64`
/// wraparound; the final `%` is a single hardware division, not a loop.
#[inline]
fn reduce_u128(val: u128) -> u64 {
    let lo = val as u64;
    let hi = (val >> 64) as u64;
    let folded = lo as u128 + (hi as u128) * (NEG_MODULUS_LOW as u128);
    (folded % MODULUS as u128) as u64
}

impl Add for FieldElement {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (sum, carry) = self.0.overflowing_add(rhs.0);
        if carry {
            FieldElement(reduce_u64(sum.wrapping_add(NEG_MODULUS_LOW)))
        } else {
            FieldElement(reduce_u64(sum))
        }
    }
}

impl Sub for FieldElement {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        if self.0 >= rhs.0 {
            FieldElement(self.0 - rhs.0)
        } else {
            FieldElement(self.0.wrapping_add(MODULUS) - rhs.0)
        }
    }
}

impl Neg for FieldElement {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        FieldElement::ZERO - self
    }
}

impl Mul for FieldElement {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        FieldElement(reduce_u128(self.0 as u128 * rhs.0 as u128))
    }
}

impl From<u64> for FieldElement {
    #[inline]
    fn from(val: u64) -> Self {
        FieldElement::new(val)
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serde helper: a single [`FieldElement`] as a decimal string. Wire values
/// that can exceed 53 bits are encoded as strings rather than JSON numbers
/// (spec.md §6).
pub mod decimal {
    use super::FieldElement;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &FieldElement, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.value().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<FieldElement, D::Error> {
        let s = String::deserialize(d)?;
        let v: u64 = s.parse().map_err(serde::de::Error::custom)?;
        Ok(FieldElement::from_canonical_u64(v))
    }
}

/// Serde helper: a `Vec<FieldElement>` as a list of decimal strings.
pub mod decimal_vec {
    use super::FieldElement;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[FieldElement], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(&v.value().to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<FieldElement>, D::Error> {
        let strs = Vec::<String>::deserialize(d)?;
        strs.into_iter()
            .map(|s| {
                s.parse::<u64>()
                    .map(FieldElement::from_canonical_u64)
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// Pluggable batch-arithmetic backend, the seam an accelerator (e.g. a CUDA
/// plugin, out of scope for this crate) would implement. Contract: pointwise
/// semantics only, no reordering observable to callers (spec.md §4.1, §5).
pub trait BatchBackend {
    fn batch_add(&self, a: &[FieldElement], b: &[FieldElement]) -> Vec<FieldElement>;
    fn batch_mul(&self, a: &[FieldElement], b: &[FieldElement]) -> Vec<FieldElement>;
}

/// Default scalar-loop backend; always correct, used unless a caller wires
/// in an accelerator.
#[derive(Default, Clone, Copy)]
pub struct ScalarBackend;

impl BatchBackend for ScalarBackend {
    fn batch_add(&self, a: &[FieldElement], b: &[FieldElement]) -> Vec<FieldElement> {
        a.iter().zip(b.iter()).map(|(&x, &y)| x + y).collect()
    }
    fn batch_mul(&self, a: &[FieldElement], b: &[FieldElement]) -> Vec<FieldElement> {
        a.iter().zip(b.iter()).map(|(&x, &y)| x * y).collect()
    }
}

/// Field-level services: primitive-root cache, evaluation domains, and NTT.
///
/// `Field` is the "instance" spec.md §4.1 refers to when it says roots are
/// "cached by order for the lifetime of the field instance" — `FieldElement`
/// itself stays a plain value type (cheap to copy, no shared state).
pub struct Field<B: BatchBackend = ScalarBackend> {
    roots_cache: Mutex<HashMap<usize, FieldElement>>,
    backend: B,
}

impl Default for Field<ScalarBackend> {
    fn default() -> Self {
        Field::new()
    }
}

impl Field<ScalarBackend> {
    pub fn new() -> Self {
        Field { roots_cache: Mutex::new(HashMap::new()), backend: ScalarBackend }
    }
}

impl<B: BatchBackend> Field<B> {
    /// Construct a field with an explicit batch-arithmetic backend.
    pub fn with_backend(backend: B) -> Self {
        Field { roots_cache: Mutex::new(HashMap::new()), backend }
    }

    pub fn batch_add(&self, a: &[FieldElement], b: &[FieldElement]) -> Vec<FieldElement> {
        self.backend.batch_add(a, b)
    }
    pub fn batch_mul(&self, a: &[FieldElement], b: &[FieldElement]) -> Vec<FieldElement> {
        self.backend.batch_mul(a, b)
    }

    /// Primitive `n`-th root of unity, `omega = g^((p-1)/n)`. Requires
    /// `n | (p - 1)`; any other order is a hard [`FieldError::DomainMismatch`]
    /// — never a non-root fallback.
    pub fn primitive_root_of_unity(&self, n: usize) -> Result<FieldElement, FieldError> {
        if n == 0 {
            return Err(FieldError::DomainMismatch("order must be positive".into()));
        }
        if let Some(&root) = self.roots_cache.lock().unwrap().get(&n) {
            return Ok(root);
        }
        let n_u64 = n as u64;
        if (MODULUS - 1) % n_u64 != 0 {
            return Err(FieldError::DomainMismatch(format!(
                "order {n} does not divide p-1"
            )));
        }
        let exponent = (MODULUS - 1) / n_u64;
        let root = FieldElement::new(GENERATOR).pow(exponent);
        // Verify primitivity: root^n == 1 and, for every prime q | n,
        // root^(n/q) != 1.
        if root.pow(n_u64) != FieldElement::ONE {
            return Err(FieldError::DomainMismatch(format!(
                "computed root does not satisfy omega^{n} == 1"
            )));
        }
        for q in prime_factors(n) {
            if root.pow(n_u64 / q as u64) == FieldElement::ONE {
                return Err(FieldError::DomainMismatch(format!(
                    "order {n} root is not primitive (omega^(n/{q}) == 1)"
                )));
            }
        }
        self.roots_cache.lock().unwrap().insert(n, root);
        Ok(root)
    }

    /// Evaluation domain `{omega^0, ..., omega^(n-1)}` for the size-`n`
    /// multiplicative subgroup. Fails if `n` does not divide `p - 1`.
    pub fn evaluation_domain(&self, n: usize) -> Result<Vec<FieldElement>, FieldError> {
        let omega = self.primitive_root_of_unity(n)?;
        let mut domain = Vec::with_capacity(n);
        let mut x = FieldElement::ONE;
        for _ in 0..n {
            domain.push(x);
            x = x * omega;
        }
        Ok(domain)
    }

    /// A coset of the size-`n` subgroup, shifted by `offset != 0`. Used for
    /// the low-degree extension domain, disjoint from the base trace domain.
    pub fn coset_domain(
        &self,
        n: usize,
        offset: FieldElement,
    ) -> Result<Vec<FieldElement>, FieldError> {
        if offset.is_zero() {
            return Err(FieldError::DomainMismatch("coset offset must be non-zero".into()));
        }
        let mut domain = self.evaluation_domain(n)?;
        for x in domain.iter_mut() {
            *x = *x * offset;
        }
        Ok(domain)
    }

    /// A coset offset disjoint from the size-`n` subgroup: any generator
    /// power that is not itself an `n`-th root of unity. The smallest
    /// non-quadratic-residue-adjacent choice used throughout this crate is
    /// `GENERATOR` itself, which is a generator of the full group and thus
    /// outside every proper subgroup of order `n < p - 1`.
    pub fn coset_shift(&self) -> FieldElement {
        FieldElement::new(GENERATOR)
    }

    /// In-place iterative Cooley-Tukey radix-2 NTT over the size-`n` subgroup
    /// (`n` a power of two dividing `p - 1`). `values` holds evaluations on
    /// the natural-order domain and is bit-reversal permuted in place.
    pub fn ntt(&self, values: &mut [FieldElement]) -> Result<(), FieldError> {
        let n = values.len();
        check_ntt_len(n)?;
        let omega = self.primitive_root_of_unity(n)?;
        bit_reverse_permute(values);
        butterflies(values, omega);
        Ok(())
    }

    /// Inverse NTT: coefficients from evaluations on the size-`n` subgroup.
    pub fn intt(&self, values: &mut [FieldElement]) -> Result<(), FieldError> {
        let n = values.len();
        check_ntt_len(n)?;
        let omega = self.primitive_root_of_unity(n)?;
        let omega_inv = omega.inv()?;
        bit_reverse_permute(values);
        butterflies(values, omega_inv);
        let n_inv = FieldElement::new(n as u64).inv()?;
        for v in values.iter_mut() {
            *v = *v * n_inv;
        }
        Ok(())
    }
}

fn check_ntt_len(n: usize) -> Result<(), FieldError> {
    if n == 0 || !n.is_power_of_two() {
        return Err(FieldError::DomainMismatch(format!(
            "NTT length {n} must be a power of two"
        )));
    }
    if (MODULUS - 1) % (n as u64) != 0 {
        return Err(FieldError::DomainMismatch(format!(
            "NTT length {n} does not divide p-1"
        )));
    }
    Ok(())
}

fn bit_reverse_permute(values: &mut [FieldElement]) {
    let n = values.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            values.swap(i, j);
        }
    }
}

/// Butterfly passes of the iterative Cooley-Tukey NTT. `root` is the
/// primitive `n`-th root (or its inverse, for INTT) for `n = values.len()`.
fn butterflies(values: &mut [FieldElement], root: FieldElement) {
    let n = values.len();
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let w_len = root.pow((n / len) as u64);
        let mut start = 0;
        while start < n {
            let mut w = FieldElement::ONE;
            for i in 0..half {
                let u = values[start + i];
                let v = values[start + i + half] * w;
                values[start + i] = u + v;
                values[start + i + half] = u - v;
                w = w * w_len;
            }
            start += len;
        }
        len <<= 1;
    }
}

fn prime_factors(mut n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut p = 2usize;
    while p * p <= n {
        if n % p == 0 {
            out.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        out.push(n);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_mul_match_modular_reference() {
        let a = FieldElement::new(MODULUS - 5);
        let b = FieldElement::new(10);
        assert_eq!((a + b).value(), 5);
        assert_eq!((b - a).value(), 15 % MODULUS);
        assert_eq!((a * b).value(), ((MODULUS as u128 - 5) * 10 % MODULUS as u128) as u64);
    }

    #[test]
    fn inverse_is_multiplicative_identity() {
        for v in [1u64, 2, 7, 12345, MODULUS - 1] {
            let a = FieldElement::new(v);
            let inv = a.inv().unwrap();
            assert_eq!(a * inv, FieldElement::ONE);
        }
    }

    #[test]
    fn zero_has_no_inverse() {
        assert_eq!(FieldElement::ZERO.inv(), Err(FieldError::DivisionByZero));
    }

    #[test]
    fn fermat_little_theorem_holds() {
        let a = FieldElement::new(123456789);
        assert_eq!(a.pow(MODULUS - 1), FieldElement::ONE);
    }

    #[test]
    fn non_dividing_order_is_a_hard_error() {
        let field = Field::new();
        // 3 does not divide p - 1 = 2^32 * (2^32 - 1).
        assert!(field.primitive_root_of_unity(3).is_err());
    }

    #[test]
    fn primitive_root_satisfies_order_and_minimality() {
        let field = Field::new();
        for log_n in 1..=8 {
            let n = 1usize << log_n;
            let omega = field.primitive_root_of_unity(n).unwrap();
            assert_eq!(omega.pow(n as u64), FieldElement::ONE);
            assert_ne!(omega.pow((n / 2) as u64), FieldElement::ONE);
        }
    }

    #[test]
    fn ntt_intt_roundtrip() {
        let field = Field::new();
        let n = 64;
        let mut values: Vec<FieldElement> = (0..n as u64).map(FieldElement::new).collect();
        let original = values.clone();
        field.ntt(&mut values).unwrap();
        field.intt(&mut values).unwrap();
        assert_eq!(values, original);
    }

    #[test]
    fn coset_is_disjoint_from_base_subgroup() {
        let field = Field::new();
        let n = 16;
        let base: std::collections::HashSet<u64> = field
            .evaluation_domain(n)
            .unwrap()
            .into_iter()
            .map(|x| x.value())
            .collect();
        let coset = field.coset_domain(n, field.coset_shift()).unwrap();
        for x in coset {
            assert!(!base.contains(&x.value()));
        }
    }
}
