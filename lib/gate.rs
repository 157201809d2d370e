//! The closed set of gates that can appear in a [`CircuitDag`][crate::dag::CircuitDag].
//!
//! Gates carry no operands; the wires a gate acts on are stored by the node
//! that holds it. For controlled gates, the first [`Controlled::num_controls`]
//! operands are the controls and the remaining ones are handed to the base
//! gate, with the last operand acting as the target.

use std::{ fmt, str::FromStr };
use ndarray as nd;
use num_complex::Complex64 as C64;
use thiserror::Error;
use crate::phase::Phase;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("unsupported operation: cannot take the {0} of gate {1}")]
    Unsupported(&'static str, String),

    #[error("error in controlled gate: polarity has {0} bit(s), but {1} control(s) were requested")]
    PolarityLength(usize, usize),

    #[error("error in controlled gate: control state {0} does not fit in {1} bit(s)")]
    PolarityOverflow(u64, usize),

    #[error("error parsing polarity: invalid character {0:?}")]
    PolarityParse(char),
}
pub type GateResult<T> = Result<T, GateError>;
use GateError::*;

/// Required values of the control wires of a [`Controlled`] gate.
///
/// Bit `k` is the value required of the `k`-th control operand. Integer
/// control states map their least-significant bit to the first control;
/// string control states are read big-endian, so that `"01"` requires the
/// first control to be `1` and the second to be `0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Polarity(Vec<bool>);

impl Polarity {
    /// Create a new polarity from a list of required bits, in operand order.
    pub fn new<I>(bits: I) -> Self
    where I: IntoIterator<Item = bool>
    {
        Self(bits.into_iter().collect())
    }

    /// All `n` controls required to be `1`.
    pub fn all_closed(n: usize) -> Self { Self(vec![true; n]) }

    /// Unpack an integer control state over `n` controls.
    ///
    /// Fails if `state` has set bits at or above position `n`.
    pub fn from_int(state: u64, n: usize) -> GateResult<Self> {
        if n < 64 && state >> n != 0 {
            return Err(PolarityOverflow(state, n));
        }
        let bits = (0..n).map(|k| k < 64 && (state >> k) & 1 == 1);
        Ok(Self(bits.collect()))
    }

    /// Number of controls.
    pub fn len(&self) -> usize { self.0.len() }

    /// Return `true` if there are no controls.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Required bit of the `k`-th control, if it exists.
    pub fn get(&self, k: usize) -> Option<bool> { self.0.get(k).copied() }

    /// Iterate over required bits in operand order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Return `true` if every control is required to be `1`.
    pub fn is_all_closed(&self) -> bool { self.0.iter().all(|b| *b) }
}

impl FromStr for Polarity {
    type Err = GateError;

    fn from_str(s: &str) -> GateResult<Self> {
        let mut bits: Vec<bool> =
            s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                x => Err(PolarityParse(x)),
            })
            .collect::<GateResult<_>>()?;
        bits.reverse();
        Ok(Self(bits))
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().rev()
            .try_for_each(|b| write!(f, "{}", if *b { '1' } else { '0' }))
    }
}

/// A base gate applied only when its control wires match a [`Polarity`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Controlled {
    base: Box<Gate>,
    polarity: Polarity,
}

impl Controlled {
    /// The gate applied to the target wires.
    pub fn base(&self) -> &Gate { &self.base }

    /// Required control values.
    pub fn polarity(&self) -> &Polarity { &self.polarity }

    /// Number of control wires.
    pub fn num_controls(&self) -> usize { self.polarity.len() }

    /// Number of wires handed to the base gate.
    pub fn num_targets(&self) -> usize { self.base.num_qubits() }
}

/// Coarse classification of a gate for the purposes of state propagation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// A base gate with control wires.
    Controlled,
    /// Full two-wire exchange.
    Swap,
    /// Non-unitary reset to `∣0⟩`.
    Reset,
    /// Diagonal gates that only ever attach a relative phase to `∣1⟩`.
    PhaseOnly,
    /// Everything else.
    Other,
}

/// A quantum operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Hadamard.
    H,
    /// π-rotation about *x*.
    X,
    /// π-rotation about *y*.
    Y,
    /// π-rotation about *z*.
    Z,
    /// π/2-rotation about *z*.
    S,
    /// Inverse of `S`.
    Sdg,
    /// π/4-rotation about *z*.
    T,
    /// Inverse of `T`.
    Tdg,
    /// Rotation about *x*.
    XRot(Phase),
    /// Rotation about *y*.
    YRot(Phase),
    /// Rotation about *z*.
    ZRot(Phase),
    /// Generic single-qubit rotation *U*(*θ*, *φ*, *λ*).
    U(Phase, Phase, Phase),
    /// Swap gate.
    Swap,
    /// Half of a swap, valid when the first wire is `∣0⟩` or the second is
    /// `∣+⟩`. Decomposes into a CX controlled by the second wire followed by a
    /// CX controlled by the first.
    HalfSwap,
    /// Reset to `∣0⟩`.
    Reset,
    /// Controlled gate.
    Controlled(Controlled),
    /// A named gate with no known semantics.
    Opaque { name: String, num_qubits: usize },
}

impl Gate {
    /// Return `true` if `self` is `X`.
    pub fn is_x(&self) -> bool { matches!(self, Self::X) }

    /// Return `true` if `self` is `Swap`.
    pub fn is_swap(&self) -> bool { matches!(self, Self::Swap) }

    /// Return `true` if `self` is `HalfSwap`.
    pub fn is_half_swap(&self) -> bool { matches!(self, Self::HalfSwap) }

    /// Return `true` if `self` is `Reset`.
    pub fn is_reset(&self) -> bool { matches!(self, Self::Reset) }

    /// Return `true` if `self` is `Controlled`.
    pub fn is_controlled(&self) -> bool { matches!(self, Self::Controlled(..)) }

    /// Create a new X-rotation gate with phase `(a / b) × 2π`.
    pub fn xrot_frac(a: i64, b: i64) -> Self { Self::XRot(Phase::new(a, b)) }

    /// Create a new Y-rotation gate with phase `(a / b) × 2π`.
    pub fn yrot_frac(a: i64, b: i64) -> Self { Self::YRot(Phase::new(a, b)) }

    /// Create a new Z-rotation gate with phase `(a / b) × 2π`.
    pub fn zrot_frac(a: i64, b: i64) -> Self { Self::ZRot(Phase::new(a, b)) }

    /// Create a new opaque gate.
    pub fn opaque<S>(name: S, num_qubits: usize) -> Self
    where S: Into<String>
    {
        Self::Opaque { name: name.into(), num_qubits }
    }

    /// CX with a single closed control.
    pub fn cx() -> Self { Self::mcx(1) }

    /// CZ with a single closed control.
    pub fn cz() -> Self {
        Self::Controlled(Controlled {
            base: Box::new(Self::Z),
            polarity: Polarity::all_closed(1),
        })
    }

    /// Toffoli gate.
    pub fn ccx() -> Self { Self::mcx(2) }

    /// X with `n` closed controls.
    pub fn mcx(n: usize) -> Self {
        Self::Controlled(Controlled {
            base: Box::new(Self::X),
            polarity: Polarity::all_closed(n),
        })
    }

    /// Build `base` controlled on `num_controls` wires with the given
    /// polarity.
    ///
    /// Fails if the polarity length disagrees with `num_controls` or `base`
    /// has no controlled form.
    pub fn controlled(base: Gate, num_controls: usize, polarity: Polarity)
        -> GateResult<Self>
    {
        if polarity.len() != num_controls {
            return Err(PolarityLength(polarity.len(), num_controls));
        }
        base.control(polarity)
    }

    /// Add controls to `self`, one per bit of `polarity`. New controls come
    /// before any controls `self` already has.
    pub fn control(&self, polarity: Polarity) -> GateResult<Self> {
        match self {
            Self::HalfSwap | Self::Reset => {
                Err(Unsupported("controlled form", self.name()))
            },
            Self::Controlled(inner) => {
                let bits =
                    polarity.iter().chain(inner.polarity.iter());
                Ok(Self::Controlled(Controlled {
                    base: inner.base.clone(),
                    polarity: Polarity::new(bits),
                }))
            },
            _ => Ok(Self::Controlled(Controlled {
                base: Box::new(self.clone()),
                polarity,
            })),
        }
    }

    /// Return the inverse of `self`.
    pub fn inverse(&self) -> GateResult<Self> {
        match self {
            Self::H => Ok(Self::H),
            Self::X => Ok(Self::X),
            Self::Y => Ok(Self::Y),
            Self::Z => Ok(Self::Z),
            Self::S => Ok(Self::Sdg),
            Self::Sdg => Ok(Self::S),
            Self::T => Ok(Self::Tdg),
            Self::Tdg => Ok(Self::T),
            Self::XRot(ph) => Ok(Self::XRot(-*ph)),
            Self::YRot(ph) => Ok(Self::YRot(-*ph)),
            Self::ZRot(ph) => Ok(Self::ZRot(-*ph)),
            Self::U(th, phi, lam) => Ok(Self::U(-*th, -*lam, -*phi)),
            Self::Swap => Ok(Self::Swap),
            Self::Controlled(ctrl) => {
                Ok(Self::Controlled(Controlled {
                    base: Box::new(ctrl.base.inverse()?),
                    polarity: ctrl.polarity.clone(),
                }))
            },
            Self::HalfSwap | Self::Reset | Self::Opaque { .. } => {
                Err(Unsupported("inverse", self.name()))
            },
        }
    }

    /// Number of wires the gate acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Self::Swap | Self::HalfSwap => 2,
            Self::Controlled(ctrl) => ctrl.num_controls() + ctrl.num_targets(),
            Self::Opaque { num_qubits, .. } => *num_qubits,
            _ => 1,
        }
    }

    /// Short lowercase name, with one `c` prefixed per control.
    pub fn name(&self) -> String {
        match self {
            Self::H => "h".to_string(),
            Self::X => "x".to_string(),
            Self::Y => "y".to_string(),
            Self::Z => "z".to_string(),
            Self::S => "s".to_string(),
            Self::Sdg => "sdg".to_string(),
            Self::T => "t".to_string(),
            Self::Tdg => "tdg".to_string(),
            Self::XRot(_) => "rx".to_string(),
            Self::YRot(_) => "ry".to_string(),
            Self::ZRot(_) => "rz".to_string(),
            Self::U(..) => "u".to_string(),
            Self::Swap => "swap".to_string(),
            Self::HalfSwap => "half_swap".to_string(),
            Self::Reset => "reset".to_string(),
            Self::Controlled(ctrl) => {
                format!("{}{}", "c".repeat(ctrl.num_controls()), ctrl.base.name())
            },
            Self::Opaque { name, .. } => name.clone(),
        }
    }

    /// Classify `self` for state propagation.
    pub fn kind(&self) -> GateKind {
        match self {
            Self::Controlled(_) => GateKind::Controlled,
            Self::Swap => GateKind::Swap,
            Self::Reset => GateKind::Reset,
            Self::S | Self::Sdg | Self::T | Self::Tdg => GateKind::PhaseOnly,
            // Rz(π) is a Z up to global phase
            Self::ZRot(ph) if *ph != Phase::pi() => GateKind::PhaseOnly,
            _ => GateKind::Other,
        }
    }

    /// Return the controlled structure of `self`, if it has one.
    pub fn as_controlled(&self) -> Option<&Controlled> {
        match self {
            Self::Controlled(ctrl) => Some(ctrl),
            _ => None,
        }
    }

    /// Decomposition of `self` into simpler gates, as a list of gates with
    /// operands numbered locally from zero.
    ///
    /// Only the swap-type gates have a definition.
    pub fn definition(&self) -> Option<Vec<(Gate, Vec<usize>)>> {
        match self {
            Self::HalfSwap => Some(vec![
                (Self::cx(), vec![1, 0]),
                (Self::cx(), vec![0, 1]),
            ]),
            Self::Swap => Some(vec![
                (Self::cx(), vec![0, 1]),
                (Self::cx(), vec![1, 0]),
                (Self::cx(), vec![0, 1]),
            ]),
            _ => None,
        }
    }

    /// Unitary matrix of `self` over its operands, where the `k`-th operand
    /// corresponds to bit `k` of the matrix index.
    ///
    /// Returns `None` for `Reset` and opaque gates.
    pub fn matrix(&self) -> Option<nd::Array2<C64>> {
        let z = C64::new(0.0, 0.0);
        let o = C64::new(1.0, 0.0);
        let i = C64::i();
        let rt2 = C64::from(std::f64::consts::FRAC_1_SQRT_2);
        let mat =
            match self {
                Self::H => nd::array![[rt2, rt2], [rt2, -rt2]],
                Self::X => nd::array![[z, o], [o, z]],
                Self::Y => nd::array![[z, -i], [i, z]],
                Self::Z => nd::array![[o, z], [z, -o]],
                Self::S => nd::array![[o, z], [z, i]],
                Self::Sdg => nd::array![[o, z], [z, -i]],
                Self::T => nd::array![[o, z], [z, Phase::new(1, 8).cis()]],
                Self::Tdg => nd::array![[o, z], [z, Phase::new(-1, 8).cis()]],
                Self::XRot(ph) => {
                    let (s, c) = ph.half_float().sin_cos();
                    nd::array![
                        [C64::from(c), -i * s],
                        [-i * s, C64::from(c)],
                    ]
                },
                Self::YRot(ph) => {
                    let (s, c) = ph.half_float().sin_cos();
                    nd::array![
                        [C64::from(c), C64::from(-s)],
                        [C64::from(s), C64::from(c)],
                    ]
                },
                Self::ZRot(ph) => {
                    let e = C64::cis(ph.half_float());
                    nd::array![[e.conj(), z], [z, e]]
                },
                Self::U(th, phi, lam) => {
                    let (s, c) = th.half_float().sin_cos();
                    nd::array![
                        [C64::from(c), -lam.cis() * s],
                        [phi.cis() * s, (*phi + *lam).cis() * c],
                    ]
                },
                Self::Swap => nd::array![
                    [o, z, z, z],
                    [z, z, o, z],
                    [z, o, z, z],
                    [z, z, z, o],
                ],
                Self::HalfSwap => nd::array![
                    [o, z, z, z],
                    [z, z, o, z],
                    [z, z, z, o],
                    [z, o, z, z],
                ],
                Self::Controlled(ctrl) => controlled_matrix(ctrl)?,
                Self::Reset | Self::Opaque { .. } => { return None; },
            };
        Some(mat)
    }
}

// controls occupy the low bits of the index and the base gate the high bits
fn controlled_matrix(ctrl: &Controlled) -> Option<nd::Array2<C64>> {
    let base = ctrl.base.matrix()?;
    let n = ctrl.num_controls();
    let dim_base = base.nrows();
    let dim = dim_base << n;
    let mask: usize =
        ctrl.polarity.iter().enumerate()
        .map(|(k, b)| (b as usize) << k)
        .sum();
    let mut mat: nd::Array2<C64> = nd::Array2::eye(dim);
    for t in 0..dim_base {
        let col = (t << n) | mask;
        mat[[col, col]] = C64::new(0.0, 0.0);
        for r in 0..dim_base {
            mat[[(r << n) | mask, col]] = base[[r, t]];
        }
    }
    Some(mat)
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XRot(ph) | Self::YRot(ph) | Self::ZRot(ph) => {
                write!(f, "{}({})", self.name(), ph)
            },
            Self::U(th, phi, lam) => write!(f, "u({}, {}, {})", th, phi, lam),
            Self::Controlled(ctrl) if !ctrl.polarity.is_all_closed() => {
                write!(f, "{}[{}]", self.name(), ctrl.polarity)
            },
            _ => write!(f, "{}", self.name()),
        }
    }
}
