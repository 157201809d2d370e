//! Constant-state propagation and peephole optimization for quantum circuits.
//!
//! Every qubit of a circuit starts in `∣0⟩`. As long as only simple gates act
//! on it, a qubit stays in one of the four basis eigenstates `∣0⟩`, `∣1⟩`,
//! `∣+⟩`, or `∣−⟩`, and controlled operations and swaps touching it can often
//! be deleted or replaced with something cheaper. This package tracks those
//! states through a circuit and performs the rewrites.
//!
//! - [`gate`] and [`phase`] describe the gates a circuit is built from.
//! - [`dag`] holds circuits as directed acyclic graphs of operations.
//! - [`lattice`] and [`wire_state`] track the known state of each qubit.
//! - [`rules`] implements the individual rewrites, and [`pass`] drives them
//! over a whole circuit.
//! - [`sim`] is a small state-vector simulator for checking results.
//!
//! ```
//! use qconst::{ dag::CircuitDag, gate::Gate, pass::ConstantStateOptimization };
//!
//! // the control is always ∣0⟩, so the CX does nothing
//! let mut dag = CircuitDag::new(2);
//! dag.apply(Gate::cx(), &[0, 1]).unwrap();
//! let report = ConstantStateOptimization::new().run(&mut dag).unwrap();
//! assert!(dag.is_empty());
//! assert_eq!(report.removed, 1);
//! ```
//!
//! # Further reading
//! - J. Liu, L. Bello, and H. Zhou, "Relaxed peephole optimization: a
//! novel compiler optimization for quantum circuits."
//! [arXiv:2012.07711](https://arxiv.org/abs/2012.07711)

pub mod phase;
pub mod gate;
pub mod dag;
pub mod lattice;
pub mod wire_state;
pub mod rules;
pub mod pass;
pub mod sim;
pub(crate) mod vizdefs;
