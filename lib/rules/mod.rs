//! Rewrite rules driven by known wire states.
//!
//! Each rule is a unit struct implementing [`RuleFinder`]. Finding a rule
//! inspects a single node against the current [`WireStateMap`] and fully
//! decides what to do with it, without touching the circuit; the returned
//! [`Rule`] then commits that decision to the circuit and records its effect
//! on the wire states. A failure while finding a rule therefore never leaves
//! the node half-rewritten.
//!
//! Rules are normally run by
//! [`ConstantStateOptimization`][crate::pass::ConstantStateOptimization], but
//! can also be applied by hand:
//! ```
//! # use qconst::dag::CircuitDag;
//! # use qconst::gate::Gate;
//! # use qconst::rules::*;
//! # use qconst::wire_state::WireStateMap;
//! let mut dag = CircuitDag::new(2);
//! let cx = dag.apply(Gate::cx(), &[0, 1]).unwrap();
//! let mut states = WireStateMap::new(2);
//! let rule = ControlReduce.find(&mut dag, cx, &states).unwrap().unwrap();
//! assert_eq!(rule.rewrite(), &Rewrite::Remove);
//! assert_eq!(rule.simplify(&mut states).unwrap(), Outcome::Removed);
//! assert!(dag.is_empty());
//! ```

use crate::{
    dag::{ CircuitDag, NodeId, QubitId, SubCircuit },
    gate::Gate,
    pass::PassResult,
    wire_state::WireStateMap,
};

/// A trait for types that can inspect a node of a [`CircuitDag`] and decide
/// how to rewrite it.
pub trait RuleFinder {
    /// The type representing the decided (but not executed) rewrite.
    type Output<'a>: Rule;

    /// Decide how to rewrite node `node` given the current wire states.
    /// Returns `None` if the rule does not apply to the node's gate.
    fn find<'a>(
        self,
        dag: &'a mut CircuitDag,
        node: NodeId,
        states: &WireStateMap,
    ) -> PassResult<Option<Self::Output<'a>>>;
}

/// A trait representing a decided, unexecuted rewrite on a [`CircuitDag`].
pub trait Rule {
    /// Commit the rewrite to the circuit and record its effect on `states`.
    fn simplify(self, states: &mut WireStateMap) -> PassResult<Outcome>;
}

/// What to do with a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rewrite {
    /// Leave the node in place.
    Keep,
    /// Delete the node.
    Remove,
    /// Replace the node with `sub`, whose local wire `k` is `wires[k]`.
    Substitute { sub: SubCircuit, wires: Vec<QubitId> },
}

/// How a node was changed by a [`Rule`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Kept,
    Removed,
    Substituted,
}

impl Rewrite {
    // a single gate over `wires`, in order
    pub(crate) fn single(gate: Gate, wires: Vec<QubitId>) -> PassResult<Self> {
        let local: Vec<usize> = (0..wires.len()).collect();
        let mut sub = SubCircuit::new(wires.len());
        sub.apply(gate, &local)?;
        Ok(Self::Substitute { sub, wires })
    }

    pub(crate) fn commit(&self, dag: &mut CircuitDag, node: NodeId)
        -> PassResult<Outcome>
    {
        match self {
            Self::Keep => Ok(Outcome::Kept),
            Self::Remove => {
                dag.remove_node(node)?;
                Ok(Outcome::Removed)
            },
            Self::Substitute { sub, wires } => {
                dag.substitute_node(node, sub, wires)?;
                Ok(Outcome::Substituted)
            },
        }
    }
}

mod control;
pub use control::*;
pub mod swap;
pub use swap::{ SwapReduce, SwapReduceData };
