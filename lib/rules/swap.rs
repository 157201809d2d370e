//! Swap elimination.
//!
//! A swap between two wires whose states are (partly) known can be replaced by
//! cheaper gates that produce the exchanged states directly. The replacements
//! are kept in a single table indexed by canonical `(top, bottom)` state
//! pairs; every other ordered pair is first mapped onto one of these, either
//! directly or with the roles of the two wires exchanged.

use tracing::trace;
use crate::{
    dag::DagError,
    gate::Gate,
    lattice::State::{ self, * },
    pass::PassError,
};
use super::*;

/// Operand role within a swap: the first (`Top`) or second (`Bot`) wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Top,
    Bot,
}
use Role::{ Top, Bot };

/// How a canonical table entry maps onto the swap being rewritten.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Roles are taken as-is.
    Same,
    /// `Top` and `Bot` are exchanged.
    Mirror,
}

impl Role {
    /// Local wire index (`0` for the first swap operand) of `self` under
    /// `orientation`.
    pub fn local(self, orientation: Orientation) -> usize {
        match (self, orientation) {
            (Top, Orientation::Same) | (Bot, Orientation::Mirror) => 0,
            (Bot, Orientation::Same) | (Top, Orientation::Mirror) => 1,
        }
    }
}

/// A single gate in a swap replacement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    X(Role),
    Z(Role),
    H(Role),
    /// Half-swap with operands in the given order.
    HalfSwap(Role, Role),
}

impl Step {
    /// The gate applied by `self`.
    pub fn gate(self) -> Gate {
        match self {
            Self::X(_) => Gate::X,
            Self::Z(_) => Gate::Z,
            Self::H(_) => Gate::H,
            Self::HalfSwap(..) => Gate::HalfSwap,
        }
    }

    /// Local operand indices of `self` under `orientation`.
    pub fn operands(self, orientation: Orientation) -> Vec<usize> {
        match self {
            Self::X(r) | Self::Z(r) | Self::H(r) => vec![r.local(orientation)],
            Self::HalfSwap(a, b) => {
                vec![a.local(orientation), b.local(orientation)]
            },
        }
    }
}

/// Canonical swap replacements, keyed by `(top, bottom)` state pairs.
pub static SWAP_TABLE: [(State, State, &[Step]); 13] = [
    (Zero,    Zero,  &[]),
    (One,     One,   &[]),
    (Plus,    Plus,  &[]),
    (Minus,   Minus, &[]),
    (One,     Zero,  &[Step::X(Top), Step::X(Bot)]),
    (Zero,    Plus,  &[Step::H(Top), Step::H(Bot)]),
    (Plus,    One,   &[Step::H(Top), Step::X(Top), Step::X(Bot), Step::H(Bot)]),
    (Zero,    Minus, &[Step::X(Top), Step::H(Top), Step::H(Bot), Step::X(Bot)]),
    (Plus,    Minus, &[Step::Z(Top), Step::Z(Bot)]),
    (Unknown, Zero,  &[Step::HalfSwap(Bot, Top)]),
    (Unknown, One,   &[Step::X(Top), Step::HalfSwap(Bot, Top)]),
    (Unknown, Plus,  &[Step::HalfSwap(Top, Bot)]),
    (Unknown, Minus, &[Step::Z(Top), Step::HalfSwap(Top, Bot)]),
];

/// Map an ordered state pair onto a key of [`SWAP_TABLE`].
///
/// Returns `None` only for `(Unknown, Unknown)`.
pub fn canonicalize(top: State, bot: State) -> Option<(State, State, Orientation)> {
    use Orientation::*;
    match (top, bot) {
        (Unknown, Unknown) => None,
        (Zero,    One    ) => Some((One,     Zero,  Mirror)),
        (Plus,    Zero   ) => Some((Zero,    Plus,  Mirror)),
        (One,     Minus  ) => Some((Zero,    Plus,  Same  )),
        (Minus,   One    ) => Some((Zero,    Plus,  Same  )),
        (Minus,   Zero   ) => Some((Plus,    One,   Same  )),
        (One,     Plus   ) => Some((Zero,    Minus, Same  )),
        (Minus,   Plus   ) => Some((Plus,    Minus, Mirror)),
        (Zero,    Unknown) => Some((Unknown, Zero,  Mirror)),
        (One,     Unknown) => Some((Unknown, One,   Mirror)),
        (Plus,    Unknown) => Some((Unknown, Plus,  Mirror)),
        (Minus,   Unknown) => Some((Unknown, Minus, Mirror)),
        (t, b) => Some((t, b, Same)),
    }
}

/// Look up the replacement for a swap between wires in states `top` and
/// `bot`.
pub fn lookup(top: State, bot: State) -> Option<(&'static [Step], Orientation)> {
    let (t, b, orientation) = canonicalize(top, bot)?;
    SWAP_TABLE.iter()
        .find(|(kt, kb, _)| *kt == t && *kb == b)
        .map(|(_, _, steps)| (*steps, orientation))
}

/// Replace a swap using the states of its two wires.
///
/// A swap between two unknown wires is kept and one between equal known
/// states is removed. Otherwise the swap is replaced according to
/// [`SWAP_TABLE`] and the two wires' states are exchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapReduce;

/// Output of [`SwapReduce::find`].
#[derive(Debug)]
pub struct SwapReduceData<'a> {
    pub(crate) dag: &'a mut CircuitDag,
    pub(crate) node: NodeId,
    pub(crate) top: QubitId,
    pub(crate) bot: QubitId,
    pub(crate) rewrite: Rewrite,
}

impl SwapReduceData<'_> {
    /// The decided rewrite.
    pub fn rewrite(&self) -> &Rewrite { &self.rewrite }
}

impl RuleFinder for SwapReduce {
    type Output<'a> = SwapReduceData<'a>;

    fn find<'a>(
        self,
        dag: &'a mut CircuitDag,
        node: NodeId,
        states: &WireStateMap,
    ) -> PassResult<Option<Self::Output<'a>>>
    {
        let op = dag.get_node(node).ok_or(DagError::MissingNode(node))?;
        if !op.gate().is_swap() { return Ok(None); }
        let (top, bot) =
            match op.wires() {
                [t, b] => (*t, *b),
                ws => { return Err(PassError::SwapOperands(node, ws.len())); },
            };
        let (s_top, s_bot) = (states[top], states[bot]);
        let rewrite =
            if !s_top.is_known() && !s_bot.is_known() {
                Rewrite::Keep
            } else if s_top == s_bot {
                Rewrite::Remove
            } else {
                let (steps, orientation) =
                    lookup(s_top, s_bot)
                    .expect("bad book-keeping: incomplete swap table");
                trace!(node, %s_top, %s_bot, ?orientation, "swap table");
                let mut sub = SubCircuit::new(2);
                for step in steps.iter() {
                    sub.apply(step.gate(), &step.operands(orientation))?;
                }
                Rewrite::Substitute { sub, wires: vec![top, bot] }
            };
        Ok(Some(SwapReduceData { dag, node, top, bot, rewrite }))
    }
}

impl Rule for SwapReduceData<'_> {
    fn simplify(self, states: &mut WireStateMap) -> PassResult<Outcome> {
        let Self { dag, node, top, bot, rewrite } = self;
        let outcome = rewrite.commit(dag, node)?;
        if outcome == Outcome::Substituted {
            states.swap(top, bot);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ phase::Phase, sim::StateVector };
    use super::*;

    const ALL: [State; 5] = [Zero, One, Plus, Minus, Unknown];

    // gates preparing `state` from |0>; `Unknown` gets an arbitrary rotation
    fn prep(state: State, variant: i64) -> Vec<Gate> {
        match state {
            Zero => vec![],
            One => vec![Gate::X],
            Plus => vec![Gate::H],
            Minus => vec![Gate::X, Gate::H],
            Unknown => vec![Gate::U(
                Phase::new(variant, 7), Phase::new(1, 5), Phase::new(2, 9))],
        }
    }

    fn reduce_swap(init: [State; 2]) -> (CircuitDag, Rewrite, WireStateMap) {
        let mut dag = CircuitDag::new(2);
        let node = dag.apply(Gate::Swap, &[0, 1]).unwrap();
        let mut states = WireStateMap::new(2);
        states.set(0, init[0]);
        states.set(1, init[1]);
        let rule = SwapReduce.find(&mut dag, node, &states).unwrap().unwrap();
        let rewrite = rule.rewrite().clone();
        rule.simplify(&mut states).unwrap();
        (dag, rewrite, states)
    }

    fn circuit(ops: &[(Gate, &[QubitId])]) -> CircuitDag {
        let mut dag = CircuitDag::new(2);
        for (g, ws) in ops.iter() { dag.apply(g.clone(), ws).unwrap(); }
        dag
    }

    #[test]
    fn table_complete() {
        for top in ALL {
            for bot in ALL {
                if top == Unknown && bot == Unknown {
                    assert!(lookup(top, bot).is_none());
                } else {
                    assert!(lookup(top, bot).is_some(), "({}, {})", top, bot);
                }
            }
        }
    }

    #[test]
    fn table_keys_canonical() {
        for (t, b, _) in SWAP_TABLE.iter() {
            assert_eq!(canonicalize(*t, *b), Some((*t, *b, Orientation::Same)));
        }
    }

    #[test]
    fn replacements_swap_states() {
        for top in ALL {
            for bot in ALL {
                if top == Unknown && bot == Unknown { continue; }
                let (steps, orientation) = lookup(top, bot).unwrap();
                for variant in 1..3 {
                    let mut lhs = StateVector::new(2).unwrap();
                    let mut rhs = StateVector::new(2).unwrap();
                    for g in prep(top, variant) {
                        lhs.apply(&g, &[0]).unwrap();
                        rhs.apply(&g, &[0]).unwrap();
                    }
                    for g in prep(bot, variant + 2) {
                        lhs.apply(&g, &[1]).unwrap();
                        rhs.apply(&g, &[1]).unwrap();
                    }
                    lhs.apply(&Gate::Swap, &[0, 1]).unwrap();
                    for step in steps.iter() {
                        rhs.apply(&step.gate(), &step.operands(orientation))
                            .unwrap();
                    }
                    assert!(
                        lhs.eq_up_to_phase(&rhs, 1e-9),
                        "({}, {}) -> {:?}", top, bot, steps,
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_pair_kept() {
        let (dag, rewrite, states) = reduce_swap([Unknown, Unknown]);
        assert_eq!(rewrite, Rewrite::Keep);
        assert_eq!(dag, circuit(&[(Gate::Swap, &[0, 1])]));
        assert_eq!(states.snapshot(), vec![Unknown, Unknown]);
    }

    #[test]
    fn equal_pairs_removed() {
        for s in [Zero, One, Plus, Minus] {
            let (dag, rewrite, states) = reduce_swap([s, s]);
            assert_eq!(rewrite, Rewrite::Remove);
            assert!(dag.is_empty());
            assert_eq!(states.snapshot(), vec![s, s]);
        }
    }

    #[test]
    fn zero_one() {
        let (dag, _, states) = reduce_swap([Zero, One]);
        assert_eq!(dag, circuit(&[(Gate::X, &[0]), (Gate::X, &[1])]));
        assert_eq!(states.snapshot(), vec![One, Zero]);
    }

    #[test]
    fn zero_unknown() {
        let (dag, _, states) = reduce_swap([Zero, Unknown]);
        assert_eq!(dag, circuit(&[(Gate::HalfSwap, &[0, 1])]));
        assert_eq!(states.snapshot(), vec![Unknown, Zero]);
    }

    #[test]
    fn unknown_one_sided() {
        let cases: [([State; 2], CircuitDag); 7] = [
            ([Plus, Unknown], circuit(&[(Gate::HalfSwap, &[1, 0])])),
            ([Minus, Unknown], circuit(&[(Gate::Z, &[1]), (Gate::HalfSwap, &[1, 0])])),
            ([One, Unknown], circuit(&[(Gate::X, &[1]), (Gate::HalfSwap, &[0, 1])])),
            ([Unknown, Zero], circuit(&[(Gate::HalfSwap, &[1, 0])])),
            ([Unknown, One], circuit(&[(Gate::X, &[0]), (Gate::HalfSwap, &[1, 0])])),
            ([Unknown, Plus], circuit(&[(Gate::HalfSwap, &[0, 1])])),
            ([Unknown, Minus], circuit(&[(Gate::Z, &[0]), (Gate::HalfSwap, &[0, 1])])),
        ];
        for (init, expected) in cases {
            let (dag, _, states) = reduce_swap(init);
            assert_eq!(dag, expected, "{:?}", init);
            assert_eq!(states.snapshot(), vec![init[1], init[0]]);
        }
    }

    #[test]
    fn only_swaps() {
        let mut dag = CircuitDag::new(3);
        let node = dag.apply(Gate::opaque("swap3", 3), &[0, 1, 2]).unwrap();
        let states = WireStateMap::new(3);
        assert!(SwapReduce.find(&mut dag, node, &states).unwrap().is_none());
        let node = dag.apply(Gate::Swap, &[0, 2]).unwrap();
        assert!(SwapReduce.find(&mut dag, node, &states).unwrap().is_some());
    }
}
