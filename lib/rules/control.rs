use tracing::trace;
use crate::{
    dag::DagError,
    gate::{ Controlled, Gate, Polarity },
    lattice::State,
    pass::PassError,
};
use super::*;

/// Simplify a controlled gate using what is known about its wires.
///
/// - An X whose target is `∣+⟩` does nothing and is removed.
/// - A control fixed to `∣0⟩` or `∣1⟩` either always fires, in which case it is
///   dropped from the control set, or never fires, in which case the whole gate
///   is removed.
/// - An X whose target is `∣–⟩` only kicks a phase back onto its controls, and
///   is rewritten as a Z on the surviving controls (or removed if none
///   survive).
///
/// A gate with no controls is left alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControlReduce;

/// Output of [`ControlReduce::find`].
#[derive(Debug)]
pub struct ControlReduceData<'a> {
    pub(crate) dag: &'a mut CircuitDag,
    pub(crate) node: NodeId,
    pub(crate) gate: Gate,
    pub(crate) wires: Vec<QubitId>,
    pub(crate) rewrite: Rewrite,
}

impl ControlReduceData<'_> {
    /// The decided rewrite.
    pub fn rewrite(&self) -> &Rewrite { &self.rewrite }
}

impl RuleFinder for ControlReduce {
    type Output<'a> = ControlReduceData<'a>;

    fn find<'a>(
        self,
        dag: &'a mut CircuitDag,
        node: NodeId,
        states: &WireStateMap,
    ) -> PassResult<Option<Self::Output<'a>>>
    {
        let op = dag.get_node(node).ok_or(DagError::MissingNode(node))?;
        let Some(ctrl) = op.gate().as_controlled() else { return Ok(None); };
        let rewrite = reduce(node, ctrl, op.wires(), states)?;
        let gate = op.gate().clone();
        let wires = op.wires().to_vec();
        Ok(Some(ControlReduceData { dag, node, gate, wires, rewrite }))
    }
}

fn reduce(
    node: NodeId,
    ctrl: &Controlled,
    wires: &[QubitId],
    states: &WireStateMap,
) -> PassResult<Rewrite>
{
    let n = ctrl.num_controls();
    if wires.len() != n + ctrl.num_targets() {
        return Err(PassError::ControlOperands(
            ctrl.base().name(), n + ctrl.num_targets(), node, wires.len()));
    }
    if n == 0 { return Ok(Rewrite::Keep); }
    let (controls, targets) = wires.split_at(n);
    let target =
        *targets.last()
        .ok_or_else(|| PassError::ControlOperands(ctrl.base().name(), n, node, 0))?;
    let bit_flip = ctrl.base().is_x();
    if bit_flip && states[target] == State::Plus {
        trace!(node, "bit flip on |+> target");
        return Ok(Rewrite::Remove);
    }

    let mut survivors: Vec<(QubitId, bool)> = Vec::with_capacity(n);
    for (&w, req) in controls.iter().zip(ctrl.polarity().iter()) {
        match states[w].bit() {
            None => { survivors.push((w, req)); },
            Some(b) if b == req => { },
            Some(_) => {
                trace!(node, wire = w, "control can never fire");
                return Ok(Rewrite::Remove);
            },
        }
    }

    if bit_flip && states[target] == State::Minus {
        return phase_kickback(node, &survivors);
    }
    if survivors.len() == n { return Ok(Rewrite::Keep); }
    let gate =
        if survivors.is_empty() {
            ctrl.base().clone()
        } else {
            let polarity = Polarity::new(survivors.iter().map(|(_, b)| *b));
            ctrl.base().control(polarity)?
        };
    let new_wires: Vec<QubitId> =
        survivors.iter().map(|(w, _)| *w)
        .chain(targets.iter().copied())
        .collect();
    Rewrite::single(gate, new_wires)
}

// rewrite a bit flip acting on a |-> target as a phase flip on the surviving
// controls; with more than one survivor, a closed one becomes the Z target
fn phase_kickback(node: NodeId, survivors: &[(QubitId, bool)])
    -> PassResult<Rewrite>
{
    match survivors {
        [] => {
            trace!(node, "phase kickback with every control satisfied");
            return Ok(Rewrite::Remove);
        },
        // an open control kicks back -Z, equal to Z up to a global phase
        [(w, _)] => { return Rewrite::single(Gate::Z, vec![*w]); },
        _ => { },
    }
    let k =
        survivors.iter().position(|(_, b)| *b)
        .ok_or_else(|| {
            PassError::OpenControlsOnMinus(
                survivors.iter().map(|(w, _)| *w).collect())
        })?;
    let (chosen, _) = survivors[k];
    let rest: Vec<(QubitId, bool)> =
        survivors.iter().enumerate()
        .filter(|(j, _)| *j != k)
        .map(|(_, s)| *s)
        .collect();
    let gate = Gate::Z.control(Polarity::new(rest.iter().map(|(_, b)| *b)))?;
    let wires: Vec<QubitId> =
        rest.iter().map(|(w, _)| *w)
        .chain(std::iter::once(chosen))
        .collect();
    Rewrite::single(gate, wires)
}

impl Rule for ControlReduceData<'_> {
    fn simplify(self, states: &mut WireStateMap) -> PassResult<Outcome> {
        let Self { dag, node, gate, wires, rewrite } = self;
        let outcome = rewrite.commit(dag, node)?;
        match rewrite {
            Rewrite::Keep => { states.propagate(&gate, &wires); },
            Rewrite::Remove => { },
            Rewrite::Substitute { sub, wires: sub_wires } => {
                for (g, local) in sub.ops().iter() {
                    let op_wires: Vec<QubitId> =
                        local.iter().map(|k| sub_wires[*k]).collect();
                    states.propagate(g, &op_wires);
                }
            },
        }
        Ok(outcome)
    }
}
