//! Single-pass constant-state optimization.
//!
//! [`ConstantStateOptimization`] walks a [`CircuitDag`] once in topological
//! order, starting from the guarantee that every wire begins in `∣0⟩`. Along
//! the way it tracks which wires hold a known basis state and uses that
//! knowledge to delete gates that cannot have an effect, strip controls that
//! are always satisfied, and replace swaps with cheaper gates.
//!
//! ```
//! # use qconst::dag::CircuitDag;
//! # use qconst::gate::Gate;
//! # use qconst::lattice::State;
//! # use qconst::pass::ConstantStateOptimization;
//! let mut dag = CircuitDag::new(2);
//! dag.apply(Gate::X, &[1]).unwrap();
//! dag.apply(Gate::Swap, &[0, 1]).unwrap();
//! dag.apply(Gate::cx(), &[1, 0]).unwrap();
//!
//! let mut pass = ConstantStateOptimization::new();
//! let report = pass.run(&mut dag).unwrap();
//! assert_eq!(report.substituted, 1);
//! assert_eq!(report.removed, 1);
//! assert_eq!(dag.count_ops()["x"], 3);
//! assert_eq!(
//!     pass.wire_state().unwrap().snapshot(),
//!     vec![State::One, State::Zero],
//! );
//! ```

use std::{ fmt, time::{ Duration, Instant } };
use thiserror::Error;
use tracing::{ debug, trace };
use crate::{
    dag::{ CircuitDag, DagError, NodeId, QubitId },
    gate::{ GateError, GateKind },
    lattice::State,
    rules::{ ControlReduce, Outcome, Rule, RuleFinder, SwapReduce },
    wire_state::WireStateMap,
};

#[derive(Debug, Error)]
pub enum PassError {
    #[error("error in swap: node {0} has {1} operand(s), but a swap needs exactly 2")]
    SwapOperands(NodeId, usize),

    #[error("error in controlled gate: controlled {0} needs {1} operand(s), but node {2} has {3}")]
    ControlOperands(String, usize, NodeId, usize),

    #[error("unhandled rewrite: bit flip on a |-> target with only open controls surviving on wires {0:?}")]
    OpenControlsOnMinus(Vec<QubitId>),

    #[error("gate error: {0}")]
    GateError(#[from] GateError),

    #[error("dag error: {0}")]
    DagError(#[from] DagError),
}
pub type PassResult<T> = Result<T, PassError>;

/// Switches for the rewrite rules applied by [`ConstantStateOptimization`].
///
/// A disabled rule leaves its gates in place, but their effect on wire states
/// is still recorded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PassOptions {
    /// Simplify controlled gates.
    pub rewrite_controls: bool,
    /// Simplify swaps.
    pub rewrite_swaps: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self { rewrite_controls: true, rewrite_swaps: true }
    }
}

/// Counts and timing from one run of [`ConstantStateOptimization`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Nodes visited.
    pub visited: usize,
    /// Nodes deleted.
    pub removed: usize,
    /// Nodes replaced with other gates.
    pub substituted: usize,
    /// Nodes left in place.
    pub kept: usize,
    /// Wall time spent in the walk.
    pub elapsed: Duration,
}

impl PassReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Kept => { self.kept += 1; },
            Outcome::Removed => { self.removed += 1; },
            Outcome::Substituted => { self.substituted += 1; },
        }
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "visited {} node(s): {} removed, {} substituted, {} kept in {:.3?}",
            self.visited, self.removed, self.substituted, self.kept, self.elapsed,
        )
    }
}

/// The constant-state optimization pass.
///
/// Each call to [`run`][Self::run] starts from a fresh all-`∣0⟩`
/// [`WireStateMap`]; the map left at the end of the last successful run is
/// available afterward through [`wire_state`][Self::wire_state].
#[derive(Clone, Debug, Default)]
pub struct ConstantStateOptimization {
    options: PassOptions,
    states: Option<WireStateMap>,
}

impl ConstantStateOptimization {
    /// Create a new pass with all rules enabled.
    pub fn new() -> Self { Self::default() }

    /// Create a new pass with the given options.
    pub fn with_options(options: PassOptions) -> Self {
        Self { options, states: None }
    }

    /// Enable or disable controlled-gate simplification.
    pub fn rewrite_controls(mut self, enabled: bool) -> Self {
        self.options.rewrite_controls = enabled;
        self
    }

    /// Enable or disable swap simplification.
    pub fn rewrite_swaps(mut self, enabled: bool) -> Self {
        self.options.rewrite_swaps = enabled;
        self
    }

    /// Current options.
    pub fn options(&self) -> PassOptions { self.options }

    /// Wire states at the end of the last successful run.
    pub fn wire_state(&self) -> Option<&WireStateMap> { self.states.as_ref() }

    /// Optimize `dag` in place.
    ///
    /// On error, every node visited before the failing one has already been
    /// rewritten and the failing node is left untouched, so `dag` is still
    /// equivalent to the input circuit.
    pub fn run(&mut self, dag: &mut CircuitDag) -> PassResult<PassReport> {
        self.states = None;
        let start = Instant::now();
        let mut states = WireStateMap::new(dag.num_qubits());
        let mut report = PassReport::default();
        for id in dag.topological_op_nodes() {
            let op = dag.get_node(id).ok_or(DagError::MissingNode(id))?;
            let kind = op.gate().kind();
            trace!(
                node = id,
                gate = %op.gate(),
                states = ?op.wires().iter().map(|w| states[*w]).collect::<Vec<State>>(),
                "visit"
            );
            report.visited += 1;
            let outcome =
                match kind {
                    GateKind::Controlled if self.options.rewrite_controls => {
                        apply_rule(ControlReduce, dag, id, &mut states)?
                    },
                    GateKind::Swap if self.options.rewrite_swaps => {
                        apply_rule(SwapReduce, dag, id, &mut states)?
                    },
                    GateKind::Controlled
                    | GateKind::Swap
                    | GateKind::Reset
                    | GateKind::PhaseOnly
                    | GateKind::Other
                    => {
                        states.propagate(op.gate(), op.wires());
                        Outcome::Kept
                    },
                };
            if outcome != Outcome::Kept {
                debug!(node = id, ?outcome, "rewrite");
            }
            report.record(outcome);
        }
        report.elapsed = start.elapsed();
        debug!(
            visited = report.visited,
            removed = report.removed,
            substituted = report.substituted,
            kept = report.kept,
            elapsed = ?report.elapsed,
            "constant-state optimization finished"
        );
        self.states = Some(states);
        Ok(report)
    }
}

fn apply_rule<R>(
    rule: R,
    dag: &mut CircuitDag,
    node: NodeId,
    states: &mut WireStateMap,
) -> PassResult<Outcome>
where R: RuleFinder
{
    match rule.find(dag, node, states)? {
        Some(found) => found.simplify(states),
        None => Ok(Outcome::Kept),
    }
}

#[cfg(test)]
mod tests {
    use rand::{ Rng, SeedableRng, rngs::StdRng, seq::SliceRandom };
    use crate::{
        gate::{ Gate, Polarity },
        phase::Phase,
        sim::{ self, StateVector },
    };
    use super::*;
    use State::*;

    fn build(n: usize, ops: &[(Gate, &[QubitId])]) -> CircuitDag {
        let mut dag = CircuitDag::new(n);
        for (g, ws) in ops.iter() { dag.apply(g.clone(), ws).unwrap(); }
        dag
    }

    fn optimize(dag: &mut CircuitDag) -> (PassReport, Vec<State>) {
        let mut pass = ConstantStateOptimization::new();
        let report = pass.run(dag).unwrap();
        (report, pass.wire_state().unwrap().snapshot())
    }

    #[test]
    fn swap_then_controlled() {
        let mut dag = build(2, &[
            (Gate::X, &[1]),
            (Gate::Swap, &[0, 1]),
            (Gate::cx(), &[1, 0]),
        ]);
        let (report, states) = optimize(&mut dag);
        let expected = build(2, &[
            (Gate::X, &[1]),
            (Gate::X, &[0]),
            (Gate::X, &[1]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(states, vec![One, Zero]);
        assert_eq!(report.visited, 3);
        assert_eq!(report.removed, 1);
        assert_eq!(report.substituted, 1);
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn lone_cx_vanishes() {
        let mut dag = build(2, &[(Gate::cx(), &[0, 1])]);
        let (_, states) = optimize(&mut dag);
        assert!(dag.is_empty());
        assert_eq!(states, vec![Zero, Zero]);
    }

    #[test]
    fn phase_gates_keep_classical_states() {
        let mut dag = build(2, &[
            (Gate::X, &[0]),
            (Gate::Z, &[0]),
            (Gate::S, &[0]),
            (Gate::T, &[0]),
            (Gate::cx(), &[0, 1]),
        ]);
        let (_, states) = optimize(&mut dag);
        let expected = build(2, &[
            (Gate::X, &[0]),
            (Gate::Z, &[0]),
            (Gate::S, &[0]),
            (Gate::T, &[0]),
            (Gate::X, &[1]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(states, vec![One, One]);
    }

    #[test]
    fn reset_restores_zero() {
        let mut dag = build(2, &[
            (Gate::H, &[0]),
            (Gate::xrot_frac(1, 8), &[0]),
            (Gate::Reset, &[0]),
            (Gate::cx(), &[0, 1]),
        ]);
        let (_, states) = optimize(&mut dag);
        let expected = build(2, &[
            (Gate::H, &[0]),
            (Gate::xrot_frac(1, 8), &[0]),
            (Gate::Reset, &[0]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(states, vec![Zero, Zero]);
    }

    #[test]
    fn minus_target_kickback() {
        let mut dag = build(2, &[
            (Gate::xrot_frac(1, 8), &[0]),
            (Gate::X, &[1]),
            (Gate::H, &[1]),
            (Gate::cx(), &[0, 1]),
        ]);
        let (_, states) = optimize(&mut dag);
        let expected = build(2, &[
            (Gate::xrot_frac(1, 8), &[0]),
            (Gate::X, &[1]),
            (Gate::H, &[1]),
            (Gate::Z, &[0]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(states, vec![Unknown, Minus]);
    }

    #[test]
    fn minus_target_open_kickback() {
        let open_cx = Gate::controlled(Gate::X, 1, Polarity::new([false])).unwrap();
        let mut dag = build(2, &[
            (Gate::xrot_frac(1, 8), &[0]),
            (Gate::X, &[1]),
            (Gate::H, &[1]),
            (open_cx, &[0, 1]),
        ]);
        let original = dag.clone();
        let (report, states) = optimize(&mut dag);
        let expected = build(2, &[
            (Gate::xrot_frac(1, 8), &[0]),
            (Gate::X, &[1]),
            (Gate::H, &[1]),
            (Gate::Z, &[0]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(report.substituted, 1);
        assert_eq!(states, vec![Unknown, Minus]);
        assert!(sim::equivalent(&original, &dag).unwrap());
    }

    #[test]
    fn unknown_swap_untouched() {
        let ops: &[(Gate, &[QubitId])] = &[
            (Gate::H, &[0]),
            (Gate::T, &[0]),
            (Gate::H, &[1]),
            (Gate::S, &[1]),
            (Gate::Swap, &[0, 1]),
        ];
        let mut dag = build(2, ops);
        let (report, states) = optimize(&mut dag);
        assert_eq!(dag, build(2, ops));
        assert_eq!(report.kept, 5);
        assert_eq!(states, vec![Unknown, Unknown]);
    }

    #[test]
    fn swap_with_unknown_becomes_half_swap() {
        let mut dag = build(2, &[
            (Gate::yrot_frac(1, 5), &[1]),
            (Gate::Swap, &[0, 1]),
        ]);
        let (_, states) = optimize(&mut dag);
        let expected = build(2, &[
            (Gate::yrot_frac(1, 5), &[1]),
            (Gate::HalfSwap, &[0, 1]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(states, vec![Unknown, Zero]);
    }

    #[test]
    fn substituted_nodes_not_revisited() {
        // the replacement for the first swap is not itself a swap candidate,
        // and the second swap sees the exchanged states
        let mut dag = build(3, &[
            (Gate::X, &[0]),
            (Gate::Swap, &[0, 1]),
            (Gate::Swap, &[1, 2]),
            (Gate::ccx(), &[0, 2, 1]),
        ]);
        let (report, states) = optimize(&mut dag);
        let expected = build(3, &[
            (Gate::X, &[0]),
            (Gate::X, &[0]),
            (Gate::X, &[1]),
            (Gate::X, &[1]),
            (Gate::X, &[2]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(states, vec![Zero, Zero, One]);
        assert_eq!(report.visited, 4);
        assert_eq!(report.removed, 1);
    }

    #[test]
    fn options_disable_rules() {
        let ops: &[(Gate, &[QubitId])] = &[
            (Gate::X, &[1]),
            (Gate::Swap, &[0, 1]),
            (Gate::cx(), &[0, 1]),
        ];
        let mut dag = build(2, ops);
        let mut pass =
            ConstantStateOptimization::new()
            .rewrite_controls(false)
            .rewrite_swaps(false);
        let report = pass.run(&mut dag).unwrap();
        assert_eq!(dag, build(2, ops));
        assert_eq!(report.kept, 3);
        assert_eq!(pass.wire_state().unwrap().snapshot(), vec![Unknown, Unknown]);

        let mut dag = build(2, ops);
        let mut pass = ConstantStateOptimization::with_options(PassOptions {
            rewrite_controls: true,
            rewrite_swaps: false,
        });
        pass.run(&mut dag).unwrap();
        let expected = build(2, &[
            (Gate::X, &[1]),
            (Gate::Swap, &[0, 1]),
            (Gate::X, &[1]),
        ]);
        assert_eq!(dag, expected);
        assert_eq!(pass.wire_state().unwrap().snapshot(), vec![One, One]);
    }

    #[test]
    fn failure_leaves_node() {
        let g = Gate::controlled(Gate::X, 2, Polarity::from_int(0, 2).unwrap())
            .unwrap();
        let mut dag = build(3, &[
            (Gate::H, &[0]),
            (Gate::H, &[1]),
            (Gate::T, &[0]),
            (Gate::T, &[1]),
            (Gate::X, &[2]),
            (Gate::H, &[2]),
            (g.clone(), &[0, 1, 2]),
        ]);
        let before = dag.clone();
        let mut pass = ConstantStateOptimization::new();
        let res = pass.run(&mut dag);
        assert!(matches!(res, Err(PassError::OpenControlsOnMinus(ref ws)) if ws == &vec![0, 1]));
        assert_eq!(dag, before);
        assert!(pass.wire_state().is_none());
    }

    fn random_gate<R: Rng>(rng: &mut R, n: usize) -> (Gate, Vec<QubitId>) {
        let mut wires: Vec<QubitId> = (0..n).collect();
        wires.shuffle(rng);
        let pick = |k: usize| wires[..k].to_vec();
        match rng.gen_range(0..18) {
            0 => (Gate::H, pick(1)),
            1 => (Gate::X, pick(1)),
            2 => (Gate::Y, pick(1)),
            3 => (Gate::Z, pick(1)),
            4 => (Gate::S, pick(1)),
            5 => (Gate::Tdg, pick(1)),
            6 => (Gate::XRot(Phase::new(rng.gen_range(0..8), 8)), pick(1)),
            7 => (Gate::ZRot(Phase::new(rng.gen_range(0..8), 8)), pick(1)),
            8 | 9 => (Gate::cx(), pick(2)),
            10 => {
                let p = Polarity::from_int(rng.gen_range(0..4), 2).unwrap();
                (Gate::controlled(Gate::X, 2, p).unwrap(), pick(3))
            },
            11 => (Gate::cz(), pick(2)),
            12 => {
                let p = Polarity::from_int(rng.gen_range(0..2), 1).unwrap();
                (Gate::controlled(Gate::H, 1, p).unwrap(), pick(2))
            },
            13 | 14 => (Gate::Swap, pick(2)),
            15 => (Gate::Swap.control(Polarity::all_closed(1)).unwrap(), pick(3)),
            _ => {
                let p = Polarity::new([false]);
                (Gate::controlled(Gate::X, 1, p).unwrap(), pick(2))
            },
        }
    }

    #[test]
    fn random_circuits_equivalent() {
        let mut rng = StdRng::seed_from_u64(10546);
        let n = 4;
        for _ in 0..300 {
            let mut dag = CircuitDag::new(n);
            for _ in 0..rng.gen_range(1..25) {
                let (g, ws) = random_gate(&mut rng, n);
                dag.apply(g, &ws).unwrap();
            }
            let original = dag.clone();
            let mut pass = ConstantStateOptimization::new();
            match pass.run(&mut dag) {
                Ok(report) => {
                    assert_eq!(
                        report.visited,
                        report.kept + report.removed + report.substituted,
                    );
                    let psi = StateVector::run(&dag).unwrap();
                    for (w, s) in pass.wire_state().unwrap().iter() {
                        if let Some(p) = psi.prob_state(w, s) {
                            assert!((p - 1.0).abs() < 1e-9, "{}\nq{} != {}", original, w, s);
                        }
                    }
                },
                Err(PassError::OpenControlsOnMinus(ws)) if ws.len() >= 2 => { },
                Err(err) => panic!("{}", err),
            }
            let lhs = StateVector::run(&original).unwrap();
            let rhs = StateVector::run(&dag).unwrap();
            assert!(lhs.eq_up_to_phase(&rhs, 1e-9), "{}\n=>\n{}", original, dag);
        }
    }
}
