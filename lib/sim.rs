//! Dense state-vector simulation of circuits from the all-`∣0⟩` input.
//!
//! This is meant for checking small circuits against each other, e.g. that an
//! optimized circuit prepares the same state as the original up to a global
//! phase. Qubit `k` corresponds to bit `k` of a basis index.

use ndarray as nd;
use num_complex::Complex64 as C64;
use thiserror::Error;
use crate::{
    dag::{ CircuitDag, QubitId },
    gate::Gate,
    lattice::State,
};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("cannot simulate gate {0}: no unitary matrix")]
    NoMatrix(String),

    #[error("cannot simulate {0} qubit(s): at most {1} are supported")]
    TooManyQubits(usize, usize),

    #[error("error applying gate: qubit {0} is out of range for {1} qubit(s)")]
    QubitOutOfRange(QubitId, usize),

    #[error("error applying gate: {0} acts on {1} qubit(s), but {2} were given")]
    OperandCount(String, usize, usize),
}
pub type SimResult<T> = Result<T, SimError>;
use SimError::*;

/// Largest number of qubits a [`StateVector`] will hold.
pub const MAX_QUBITS: usize = 20;

/// Pure state of a register of qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amps: nd::Array1<C64>,
}

impl StateVector {
    /// Create `∣0...0⟩` on `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> SimResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(TooManyQubits(num_qubits, MAX_QUBITS));
        }
        let mut amps: nd::Array1<C64> = nd::Array1::zeros(1 << num_qubits);
        amps[0] = C64::new(1.0, 0.0);
        Ok(Self { num_qubits, amps })
    }

    /// Simulate `dag` from the all-`∣0⟩` input.
    pub fn run(dag: &CircuitDag) -> SimResult<Self> {
        let mut psi = Self::new(dag.num_qubits())?;
        for id in dag.topological_op_nodes() {
            if let Some(node) = dag.get_node(id) {
                psi.apply(node.gate(), node.wires())?;
            }
        }
        Ok(psi)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize { self.num_qubits }

    /// Amplitudes over the computational basis.
    pub fn amplitudes(&self) -> &nd::Array1<C64> { &self.amps }

    /// Apply `gate` to `wires`.
    pub fn apply(&mut self, gate: &Gate, wires: &[QubitId]) -> SimResult<()> {
        if gate.num_qubits() != wires.len() {
            return Err(OperandCount(gate.name(), gate.num_qubits(), wires.len()));
        }
        if let Some(&w) = wires.iter().find(|w| **w >= self.num_qubits) {
            return Err(QubitOutOfRange(w, self.num_qubits));
        }
        let mat = gate.matrix().ok_or_else(|| NoMatrix(gate.name()))?;
        let k = wires.len();
        let mask: usize = wires.iter().map(|w| 1_usize << w).sum();
        // spread the bits of a local index onto the operand positions
        let scatter = |l: usize| -> usize {
            wires.iter().enumerate()
                .map(|(j, w)| ((l >> j) & 1) << w)
                .sum()
        };
        let gather = |i: usize| -> usize {
            wires.iter().enumerate()
                .map(|(j, w)| ((i >> w) & 1) << j)
                .sum()
        };
        let mut out: nd::Array1<C64> = nd::Array1::zeros(self.amps.len());
        for (i, a) in out.iter_mut().enumerate() {
            let rest = i & !mask;
            let row = gather(i);
            *a = (0..1_usize << k)
                .map(|col| mat[[row, col]] * self.amps[rest | scatter(col)])
                .sum();
        }
        self.amps = out;
        Ok(())
    }

    /// Inner product `⟨self∣other⟩`.
    pub fn dot(&self, other: &Self) -> C64 {
        self.amps.iter().zip(other.amps.iter())
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// Return `true` if `self` and `other` are the same state up to a global
    /// phase, to within `tol` in fidelity.
    pub fn eq_up_to_phase(&self, other: &Self, tol: f64) -> bool {
        self.num_qubits == other.num_qubits
            && (1.0 - self.dot(other).norm_sqr()).abs() < tol
    }

    /// Probability of finding qubit `w` in `state` when measured in that
    /// state's basis. Returns `None` for [`State::Unknown`] or out-of-range
    /// qubits.
    pub fn prob_state(&self, w: QubitId, state: State) -> Option<f64> {
        if w >= self.num_qubits || state == State::Unknown { return None; }
        let bit = 1_usize << w;
        let rt2 = std::f64::consts::FRAC_1_SQRT_2;
        let p: f64 =
            (0..self.amps.len())
            .filter(|i| i & bit == 0)
            .map(|i| {
                let (a0, a1) = (self.amps[i], self.amps[i | bit]);
                match state {
                    State::Zero => a0.norm_sqr(),
                    State::One => a1.norm_sqr(),
                    State::Plus => ((a0 + a1) * rt2).norm_sqr(),
                    State::Minus => ((a0 - a1) * rt2).norm_sqr(),
                    State::Unknown => 0.0,
                }
            })
            .sum();
        Some(p)
    }
}

/// Return `true` if `a` and `b` prepare the same state from the all-`∣0⟩`
/// input, up to a global phase.
pub fn equivalent(a: &CircuitDag, b: &CircuitDag) -> SimResult<bool> {
    let psi_a = StateVector::run(a)?;
    let psi_b = StateVector::run(b)?;
    Ok(psi_a.eq_up_to_phase(&psi_b, 1e-9))
}
