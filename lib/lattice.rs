//! Abstract single-wire states and the transfer functions between them.
//!
//! A wire is summarized by one of five values: one of the four *z*- and
//! *x*-basis eigenstates, or [`State::Unknown`] when nothing useful can be said
//! about it. A known state always means the wire is in that exact pure state,
//! unentangled with the rest of the circuit (up to a global phase).

use std::fmt;
use crate::{ gate::Gate, phase::Phase };

/// Abstract state of a single wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    /// `∣0⟩`
    Zero,
    /// `∣1⟩`
    One,
    /// `∣+⟩`
    Plus,
    /// `∣–⟩`
    Minus,
    /// Anything else.
    Unknown,
}
use State::*;

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Zero    => write!(f, "0"),
            One     => write!(f, "1"),
            Plus    => write!(f, "+"),
            Minus   => write!(f, "-"),
            Unknown => write!(f, "?"),
        }
    }
}

impl State {
    /// Return `true` if `self` is not `Unknown`.
    pub fn is_known(self) -> bool { self != Unknown }

    /// Return `true` if `self` is `Zero` or `One`.
    pub fn is_classical(self) -> bool { matches!(self, Zero | One) }

    /// Return the classical bit value of `self`, if it has one.
    pub fn bit(self) -> Option<bool> {
        match self {
            Zero => Some(false),
            One  => Some(true),
            _    => None,
        }
    }
}

/// A recognized single-wire map between known states.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transfer {
    /// `0 ↔ 1`, `+ ↦ +`, `– ↦ –`
    BitFlip,
    /// `0 ↦ 0`, `1 ↦ 1`, `+ ↔ –`
    PhaseFlip,
    /// `0 ↔ 1`, `+ ↔ –`
    BitPhaseFlip,
    /// `0 ↔ +`, `1 ↔ –`
    BasisChange,
}

impl Transfer {
    /// Return the transfer function of a single-qubit gate, if it has one.
    ///
    /// π-rotations are recognized as their Pauli counterparts, since the two
    /// only differ by a global phase.
    pub fn of(gate: &Gate) -> Option<Self> {
        let pi = Phase::pi();
        match gate {
            Gate::X => Some(Self::BitFlip),
            Gate::XRot(ph) if *ph == pi => Some(Self::BitFlip),
            Gate::Z => Some(Self::PhaseFlip),
            Gate::ZRot(ph) if *ph == pi => Some(Self::PhaseFlip),
            Gate::Y => Some(Self::BitPhaseFlip),
            Gate::YRot(ph) if *ph == pi => Some(Self::BitPhaseFlip),
            Gate::H => Some(Self::BasisChange),
            _ => None,
        }
    }

    /// Map a state through `self`. `Unknown` is always mapped to `Unknown`.
    pub fn apply(self, state: State) -> State {
        match (self, state) {
            (_, Unknown) => Unknown,
            (Self::BitFlip, Zero) => One,
            (Self::BitFlip, One) => Zero,
            (Self::BitFlip, s) => s,
            (Self::PhaseFlip, Plus) => Minus,
            (Self::PhaseFlip, Minus) => Plus,
            (Self::PhaseFlip, s) => s,
            (Self::BitPhaseFlip, s) => {
                Self::PhaseFlip.apply(Self::BitFlip.apply(s))
            },
            (Self::BasisChange, Zero) => Plus,
            (Self::BasisChange, One) => Minus,
            (Self::BasisChange, Plus) => Zero,
            (Self::BasisChange, Minus) => One,
        }
    }
}
