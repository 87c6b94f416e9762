//! Algebraic Intermediate Representation for the execution trace
//!
//! A stateless predicate object over an [`ExecutionTrace`]: boundary
//! constraints (index, expected value) and a pairwise transition relation
//! between adjacent trace cells. Exposed as a capability set rather than a
//! single hard-coded function so a richer AIR can be substituted without
//! touching the Merkle/FRI/Prover layers downstream (spec.md §4.4, §9).

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

/// Ordered sequence of trace cells: `trace[i+1] = successor(trace[i])`
/// under the AIR's transition relation. Length is always a power of two.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionTrace {
    cells: Vec<FieldElement>,
}

impl ExecutionTrace {
    pub fn new(cells: Vec<FieldElement>) -> Self {
        ExecutionTrace { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[FieldElement] {
        &self.cells
    }

    pub fn first(&self) -> FieldElement {
        self.cells[0]
    }

    pub fn last(&self) -> FieldElement {
        self.cells[self.cells.len() - 1]
    }
}

/// A single boundary requirement: the cell at `index` must equal `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryConstraint {
    pub index: usize,
    pub value: FieldElement,
}

/// Capability set an AIR exposes to the prover/verifier. A substitute AIR
/// need only implement this trait; nothing downstream inspects its internal
/// structure (spec.md §9's "dynamic dispatch of AIR" note).
pub trait Air {
    /// Boundary requirements this trace must satisfy.
    fn boundary_constraints(&self, trace: &ExecutionTrace) -> Vec<BoundaryConstraint>;

    /// Transition relation between adjacent cells: returns zero iff the
    /// relation holds at `step` (the index of `cur` in the trace).
    fn transition_constraint(&self, cur: FieldElement, next: FieldElement, step: usize)
        -> FieldElement;

    /// Check every boundary and transition constraint against `trace`.
    fn evaluate_all(&self, trace: &ExecutionTrace) -> bool {
        for bc in self.boundary_constraints(trace) {
            if trace.as_slice().get(bc.index) != Some(&bc.value) {
                return false;
            }
        }
        for step in 0..trace.len().saturating_sub(1) {
            let cur = trace.as_slice()[step];
            let next = trace.as_slice()[step + 1];
            if !self.transition_constraint(cur, next, step).is_zero() {
                return false;
            }
        }
        true
    }
}

/// The demonstration AIR: `successor(x) = x + 1 (mod p)`, boundary-pinned at
/// the first and last cell (spec.md §3, §4.4). The default and only AIR this
/// crate ships; implementers may substitute another type implementing
/// [`Air`] without touching the rest of the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessorAir;

impl SuccessorAir {
    /// Deterministically build the trace from a seed: `trace[0] = seed`,
    /// `trace[i+1] = trace[i] + 1`, per spec.md §4.6 step 2.
    pub fn build_trace(seed: FieldElement, length: usize) -> ExecutionTrace {
        let mut cells = Vec::with_capacity(length);
        let mut cur = seed;
        cells.push(cur);
        for _ in 1..length {
            cur = cur + FieldElement::ONE;
            cells.push(cur);
        }
        ExecutionTrace::new(cells)
    }
}

impl Air for SuccessorAir {
    fn boundary_constraints(&self, trace: &ExecutionTrace) -> Vec<BoundaryConstraint> {
        vec![
            BoundaryConstraint { index: 0, value: trace.first() },
            BoundaryConstraint { index: trace.len() - 1, value: trace.last() },
        ]
    }

    fn transition_constraint(
        &self,
        cur: FieldElement,
        next: FieldElement,
        _step: usize,
    ) -> FieldElement {
        next - (cur + FieldElement::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_trace_satisfies_successor_air() {
        let trace = SuccessorAir::build_trace(FieldElement::new(42), 16);
        assert!(SuccessorAir.evaluate_all(&trace));
    }

    #[test]
    fn boundary_values_are_first_and_last_cell() {
        let trace = SuccessorAir::build_trace(FieldElement::new(7), 8);
        let bcs = SuccessorAir.boundary_constraints(&trace);
        assert_eq!(bcs[0], BoundaryConstraint { index: 0, value: FieldElement::new(7) });
        assert_eq!(bcs[1], BoundaryConstraint { index: 7, value: trace.last() });
    }

    #[test]
    fn tampered_cell_fails_evaluation() {
        let mut trace = SuccessorAir::build_trace(FieldElement::new(1), 8);
        let mut cells = trace.as_slice().to_vec();
        cells[4] = cells[4] + FieldElement::ONE;
        trace = ExecutionTrace::new(cells);
        assert!(!SuccessorAir.evaluate_all(&trace));
    }

    #[test]
    fn public_output_is_seed_plus_length_minus_one() {
        let seed = FieldElement::new(12345);
        let trace = SuccessorAir::build_trace(seed, 256);
        assert_eq!(trace.last(), seed + FieldElement::new(255));
    }
}
