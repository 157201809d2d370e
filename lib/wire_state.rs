use std::{ fmt, ops::Index };
use crate::{
    dag::QubitId,
    gate::{ Gate, GateKind },
    lattice::{ State, Transfer },
};

/// Abstract state of every wire in a circuit.
///
/// Wires start in [`State::Zero`]. Updates through a [`Transfer`] only affect
/// known states, while [`set`][Self::set] and [`clobber`][Self::clobber]
/// overwrite unconditionally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireStateMap {
    states: Vec<State>,
}

impl WireStateMap {
    /// Create a new map over `n` wires, all in `∣0⟩`.
    pub fn new(n: usize) -> Self { Self { states: vec![State::Zero; n] } }

    /// Number of wires.
    pub fn len(&self) -> usize { self.states.len() }

    /// Return `true` if there are no wires.
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    /// Get the state of wire `w`, if it exists.
    pub fn get(&self, w: QubitId) -> Option<State> { self.states.get(w).copied() }

    /// Map the state of wire `w` through `transfer`.
    pub fn transfer(&mut self, w: QubitId, transfer: Transfer) {
        if let Some(s) = self.states.get_mut(w) {
            *s = transfer.apply(*s);
        }
    }

    /// Overwrite the state of wire `w`.
    pub fn set(&mut self, w: QubitId, state: State) {
        if let Some(s) = self.states.get_mut(w) {
            *s = state;
        }
    }

    /// Forget everything about wire `w`.
    pub fn clobber(&mut self, w: QubitId) { self.set(w, State::Unknown); }

    /// Exchange the states of wires `a` and `b`.
    pub fn swap(&mut self, a: QubitId, b: QubitId) {
        if a < self.states.len() && b < self.states.len() {
            self.states.swap(a, b);
        }
    }

    /// Record the effect of applying `gate` to `wires`.
    ///
    /// Controlled gates with at least one control clobber every wire they
    /// touch; phase-only gates keep `∣0⟩` and `∣1⟩` but clobber the *x*-basis
    /// states.
    pub fn propagate(&mut self, gate: &Gate, wires: &[QubitId]) {
        match gate.kind() {
            GateKind::Controlled => {
                match gate.as_controlled() {
                    Some(ctrl) if ctrl.num_controls() == 0 => {
                        self.propagate(ctrl.base(), wires);
                    },
                    _ => { wires.iter().for_each(|w| self.clobber(*w)); },
                }
            },
            GateKind::Swap => {
                if let [a, b] = wires {
                    self.swap(*a, *b);
                } else {
                    wires.iter().for_each(|w| self.clobber(*w));
                }
            },
            GateKind::Reset => {
                wires.iter().for_each(|w| self.set(*w, State::Zero));
            },
            GateKind::PhaseOnly => {
                for &w in wires.iter() {
                    if self.get(w).is_some_and(|s| !s.is_classical()) {
                        self.clobber(w);
                    }
                }
            },
            GateKind::Other => {
                match (Transfer::of(gate), wires) {
                    (Some(t), [w]) => { self.transfer(*w, t); },
                    _ => { wires.iter().for_each(|w| self.clobber(*w)); },
                }
            },
        }
    }

    /// Copy out the current state of every wire.
    pub fn snapshot(&self) -> Vec<State> { self.states.clone() }

    /// Iterate over `(wire, state)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, State)> + '_ {
        self.states.iter().copied().enumerate()
    }
}

impl Index<QubitId> for WireStateMap {
    type Output = State;

    fn index(&self, w: QubitId) -> &State { &self.states[w] }
}

impl fmt::Display for WireStateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let n = self.states.len();
        for (k, s) in self.states.iter().enumerate() {
            write!(f, "q{}: {}", k, s)?;
            if k < n - 1 { write!(f, ", ")?; }
        }
        write!(f, "}}")
    }
}
