//! Circuits as directed acyclic graphs of operations over a fixed set of
//! wires.
//!
//! Nodes are stored in an arena and addressed by stable [`NodeId`]s. Each node
//! keeps, for every one of its operands, a link to the previous and next node
//! on that wire. Removing or substituting a node only touches the links of its
//! immediate neighbors, so a traversal order computed beforehand stays valid
//! for every node it has not visited yet.

use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    fmt,
    fs,
    io::Write,
    path::Path,
};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use thiserror::Error;
use crate::gate::{ Gate, GateKind };

#[derive(Debug, Error)]
pub enum DagError {
    #[error("missing node {0}")]
    MissingNode(NodeId),

    #[error("error applying gate: qubit {0} is out of range for a circuit of {1} qubit(s)")]
    QubitOutOfRange(QubitId, usize),

    #[error("error applying gate: qubit {0} appears more than once")]
    DuplicateOperand(QubitId),

    #[error("error applying gate: {0} acts on {1} qubit(s), but {2} were given")]
    OperandCount(String, usize, usize),

    #[error("error in substitution: replacement has {0} qubit(s), but {1} wire(s) were given")]
    SubstitutionWidth(usize, usize),

    #[error("error in substitution: wire {0} is not an operand of node {1}")]
    SubstitutionWire(QubitId, NodeId),

    #[error("error constructing GraphViz representation: {0}")]
    GraphVizError(String),

    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
}
pub type DagResult<T> = Result<T, DagError>;
use DagError::*;

/// Identifies a node in a circuit.
pub type NodeId = usize;

/// Identifies a wire in a circuit.
pub type QubitId = usize;

// shared operand checks for `CircuitDag::apply` and `SubCircuit::apply`
fn check_operands(gate: &Gate, wires: &[QubitId], n: usize) -> DagResult<()> {
    if gate.num_qubits() != wires.len() {
        return Err(OperandCount(gate.name(), gate.num_qubits(), wires.len()));
    }
    if let Some(&w) = wires.iter().find(|w| **w >= n) {
        return Err(QubitOutOfRange(w, n));
    }
    if let Some(&w) = wires.iter().duplicates().next() {
        return Err(DuplicateOperand(w));
    }
    Ok(())
}

/// A single gate instance in a [`CircuitDag`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpNode {
    gate: Gate,
    wires: Vec<QubitId>,
    preds: Vec<Option<NodeId>>,
    succs: Vec<Option<NodeId>>,
}

impl OpNode {
    /// The gate held by the node.
    pub fn gate(&self) -> &Gate { &self.gate }

    /// Operand wires, in order.
    pub fn wires(&self) -> &[QubitId] { &self.wires }

    /// Previous node on each operand wire, or `None` at the circuit input.
    pub fn predecessors(&self) -> &[Option<NodeId>] { &self.preds }

    /// Next node on each operand wire, or `None` at the circuit output.
    pub fn successors(&self) -> &[Option<NodeId>] { &self.succs }

    fn slot(&self, w: QubitId) -> Option<usize> {
        self.wires.iter().position(|x| *x == w)
    }
}

/// A small standalone circuit with its own local wire numbering, used as the
/// replacement in [`CircuitDag::substitute_node`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubCircuit {
    num_qubits: usize,
    ops: Vec<(Gate, Vec<usize>)>,
}

impl SubCircuit {
    /// Create a new, empty replacement over `num_qubits` local wires.
    pub fn new(num_qubits: usize) -> Self {
        Self { num_qubits, ops: Vec::new() }
    }

    /// Number of local wires.
    pub fn num_qubits(&self) -> usize { self.num_qubits }

    /// Number of gates.
    pub fn len(&self) -> usize { self.ops.len() }

    /// Return `true` if there are no gates.
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    /// Append a gate on local wires.
    pub fn apply(&mut self, gate: Gate, wires: &[usize]) -> DagResult<&mut Self> {
        check_operands(&gate, wires, self.num_qubits)?;
        self.ops.push((gate, wires.to_vec()));
        Ok(self)
    }

    /// Gates in order, with local operand lists.
    pub fn ops(&self) -> &[(Gate, Vec<usize>)] { &self.ops }
}

/// A quantum circuit as a DAG of [`OpNode`]s.
///
/// Two circuits compare equal when every wire carries the same sequence of
/// gates, regardless of how operations on unrelated wires are interleaved.
#[derive(Clone, Debug)]
pub struct CircuitDag {
    num_qubits: usize,
    nodes: Vec<Option<OpNode>>,
    node_count: usize,
    first: Vec<Option<NodeId>>,
    last: Vec<Option<NodeId>>,
}

impl CircuitDag {
    /// Create a new, empty circuit over `num_qubits` wires.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            nodes: Vec::new(),
            node_count: 0,
            first: vec![None; num_qubits],
            last: vec![None; num_qubits],
        }
    }

    /// Number of wires.
    pub fn num_qubits(&self) -> usize { self.num_qubits }

    /// Number of live operation nodes.
    pub fn count_nodes(&self) -> usize { self.node_count }

    /// Return `true` if the circuit holds no operations.
    pub fn is_empty(&self) -> bool { self.node_count == 0 }

    /// Get a reference to node `id`, if it exists.
    pub fn get_node(&self, id: NodeId) -> Option<&OpNode> {
        self.nodes.get(id).and_then(|mb_n| mb_n.as_ref())
    }

    fn get_node_mut(&mut self, id: NodeId) -> Option<&mut OpNode> {
        self.nodes.get_mut(id).and_then(|mb_n| mb_n.as_mut())
    }

    /// Iterate over all live nodes in order of creation.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &OpNode)> + '_ {
        self.nodes.iter().enumerate()
            .filter_map(|(id, mb_n)| mb_n.as_ref().map(|n| (id, n)))
    }

    // point the link of node `id` on wire `w` (or the wire's boundary, if `id`
    // is `None`) at `to`
    fn link_succ(&mut self, id: Option<NodeId>, w: QubitId, to: Option<NodeId>) {
        match id {
            Some(id) => {
                let node = self.get_node_mut(id)
                    .expect("bad book-keeping: missing predecessor");
                let k = node.slot(w)
                    .expect("bad book-keeping: predecessor not on wire");
                node.succs[k] = to;
            },
            None => { self.first[w] = to; },
        }
    }

    fn link_pred(&mut self, id: Option<NodeId>, w: QubitId, to: Option<NodeId>) {
        match id {
            Some(id) => {
                let node = self.get_node_mut(id)
                    .expect("bad book-keeping: missing successor");
                let k = node.slot(w)
                    .expect("bad book-keeping: successor not on wire");
                node.preds[k] = to;
            },
            None => { self.last[w] = to; },
        }
    }

    // create a node between `preds` and `succs` on every one of its wires
    fn insert(
        &mut self,
        gate: Gate,
        wires: Vec<QubitId>,
        preds: Vec<Option<NodeId>>,
        succs: Vec<Option<NodeId>>,
    ) -> NodeId
    {
        let id = self.nodes.len();
        for ((&w, &p), &s) in wires.iter().zip(&preds).zip(&succs) {
            self.link_succ(p, w, Some(id));
            self.link_pred(s, w, Some(id));
        }
        self.nodes.push(Some(OpNode { gate, wires, preds, succs }));
        self.node_count += 1;
        id
    }

    /// Append `gate` to the end of the circuit on `wires`, returning the ID of
    /// the new node.
    ///
    /// Fails if the number of wires does not match the gate, if any wire is out
    /// of range, or if a wire is repeated.
    pub fn apply(&mut self, gate: Gate, wires: &[QubitId]) -> DagResult<NodeId> {
        check_operands(&gate, wires, self.num_qubits)?;
        let preds: Vec<Option<NodeId>> =
            wires.iter().map(|w| self.last[*w]).collect();
        let succs = vec![None; wires.len()];
        Ok(self.insert(gate, wires.to_vec(), preds, succs))
    }

    /// Remove node `id`, reconnecting its neighbors on each of its wires.
    pub fn remove_node(&mut self, id: NodeId) -> DagResult<OpNode> {
        let node =
            self.nodes.get_mut(id)
            .and_then(|mb_n| mb_n.take())
            .ok_or(MissingNode(id))?;
        self.node_count -= 1;
        for ((&w, &p), &s) in node.wires.iter().zip(&node.preds).zip(&node.succs) {
            self.link_succ(p, w, s);
            self.link_pred(s, w, p);
        }
        Ok(node)
    }

    /// Replace node `id` with the gates of `sub`, where local wire `k` of `sub`
    /// is mapped to `wires[k]`. Every wire in `wires` must be an operand of the
    /// node. Returns the IDs of the new nodes, in order.
    ///
    /// An empty replacement removes the node.
    pub fn substitute_node(
        &mut self,
        id: NodeId,
        sub: &SubCircuit,
        wires: &[QubitId],
    ) -> DagResult<Vec<NodeId>>
    {
        let node = self.get_node(id).ok_or(MissingNode(id))?;
        if sub.num_qubits() != wires.len() {
            return Err(SubstitutionWidth(sub.num_qubits(), wires.len()));
        }
        if let Some(&w) = wires.iter().find(|w| node.slot(**w).is_none()) {
            return Err(SubstitutionWire(w, id));
        }
        if let Some(&w) = wires.iter().duplicates().next() {
            return Err(DuplicateOperand(w));
        }
        let node = self.remove_node(id)?;
        // nodes are spliced in after whatever currently precedes the removed
        // node on each wire
        let mut tails: FxHashMap<QubitId, Option<NodeId>> =
            node.wires.iter().copied().zip(node.preds.iter().copied()).collect();
        let nexts: FxHashMap<QubitId, Option<NodeId>> =
            node.wires.iter().copied().zip(node.succs.iter().copied()).collect();
        let mut new_ids: Vec<NodeId> = Vec::with_capacity(sub.len());
        for (gate, local) in sub.ops().iter() {
            let op_wires: Vec<QubitId> = local.iter().map(|k| wires[*k]).collect();
            let preds: Vec<Option<NodeId>> =
                op_wires.iter().map(|w| tails[w]).collect();
            let succs: Vec<Option<NodeId>> =
                op_wires.iter().map(|w| nexts[w]).collect();
            let new = self.insert(gate.clone(), op_wires.clone(), preds, succs);
            op_wires.into_iter().for_each(|w| { tails.insert(w, Some(new)); });
            new_ids.push(new);
        }
        Ok(new_ids)
    }

    /// Return the IDs of all live nodes in a topological order.
    ///
    /// Ties are broken by smallest ID, so the order is deterministic.
    pub fn topological_op_nodes(&self) -> Vec<NodeId> {
        let mut indegree: FxHashMap<NodeId, usize> =
            self.nodes()
            .map(|(id, n)| (id, n.preds.iter().filter(|p| p.is_some()).count()))
            .collect();
        let mut ready: BinaryHeap<Reverse<NodeId>> =
            indegree.iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();
        let mut order: Vec<NodeId> = Vec::with_capacity(self.node_count);
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            let node = self.get_node(id)
                .expect("bad book-keeping: missing node in traversal");
            for s in node.succs.iter().flatten() {
                let deg = indegree.get_mut(s)
                    .expect("bad book-keeping: missing successor in traversal");
                *deg -= 1;
                if *deg == 0 { ready.push(Reverse(*s)); }
            }
        }
        order
    }

    /// Return the nodes on wire `w`, in order.
    pub fn wire_ops(&self, w: QubitId) -> Vec<NodeId> {
        let mut acc: Vec<NodeId> = Vec::new();
        let mut cur = self.first.get(w).copied().flatten();
        while let Some(id) = cur {
            acc.push(id);
            cur = self.get_node(id)
                .and_then(|n| n.slot(w).and_then(|k| n.succs[k]));
        }
        acc
    }

    /// Count live nodes by gate name.
    pub fn count_ops(&self) -> FxHashMap<String, usize> {
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for (_, node) in self.nodes() {
            *counts.entry(node.gate.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Length of the longest path through the circuit, in nodes.
    pub fn depth(&self) -> usize {
        let mut layer: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut depth: usize = 0;
        for id in self.topological_op_nodes() {
            let node = self.get_node(id)
                .expect("bad book-keeping: missing node in traversal");
            let d =
                node.preds.iter().flatten()
                .map(|p| layer.get(p).copied().unwrap_or(0))
                .max()
                .unwrap_or(0)
                + 1;
            layer.insert(id, d);
            depth = depth.max(d);
        }
        depth
    }

    /// Return an object containing an encoding of `self` in the [dot
    /// language][dot-lang].
    ///
    /// Wires run left to right, starting at an input label for each qubit and
    /// ending at an output label.
    ///
    /// [dot-lang]: https://en.wikipedia.org/wiki/DOT_(graph_description_language)
    pub fn to_graphviz(&self) -> DagResult<tabbycat::Graph> {
        use tabbycat::*;
        use tabbycat::attributes::*;
        use crate::vizdefs::*;
        let n = self.num_qubits;
        // inputs and outputs take the first 2n IDs
        let op_id = |id: NodeId| 2 * n + id;
        let mut statements =
            StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rankdir(RankDir::LR)),
            )
            .add_attr(
                AttrType::Node,
                AttrList::new()
                    .add_pair(fontname(FONT))
                    .add_pair(fontsize(FONTSIZE))
                    .add_pair(margin(NODE_MARGIN)),
            );
        let mut inputs_subgraph_stmt =
            StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rank(RankType::Source)),
            );
        let mut outputs_subgraph_stmt =
            StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rank(RankType::Sink)),
            );
        for q in 0..n {
            let attrs_in =
                AttrList::new()
                .add_pair(label(format!("q{}", q)))
                .add_pair(shape(Shape::Plaintext));
            inputs_subgraph_stmt =
                inputs_subgraph_stmt.add_node(q.into(), None, Some(attrs_in));
            let attrs_out =
                AttrList::new()
                .add_pair(label(format!("q{}", q)))
                .add_pair(shape(Shape::Plaintext));
            outputs_subgraph_stmt =
                outputs_subgraph_stmt.add_node((n + q).into(), None, Some(attrs_out));
        }
        statements =
            statements
            .add_subgraph(SubGraph::cluster(inputs_subgraph_stmt))
            .add_subgraph(SubGraph::cluster(outputs_subgraph_stmt));
        for (id, node) in self.nodes() {
            let color =
                match node.gate.kind() {
                    GateKind::Controlled => CONTROLLED_COLOR,
                    GateKind::Swap => SWAP_COLOR,
                    GateKind::Reset => RESET_COLOR,
                    _ if node.gate.is_half_swap() => SWAP_COLOR,
                    _ => GATE_COLOR,
                };
            let attrs =
                AttrList::new()
                .add_pair(label(format!("{}", node.gate)))
                .add_pair(shape(Shape::Rectangle))
                .add_pair(height(BOX_HEIGHT))
                .add_pair(style(Style::Filled))
                .add_pair(fillcolor(color));
            statements = statements.add_node(op_id(id).into(), None, Some(attrs));
        }
        for q in 0..n {
            let mut prev: usize = q;
            for id in self.wire_ops(q) {
                statements =
                    statements.add_edge(
                        Edge::head_node(prev.into(), None)
                        .line_to_node(op_id(id).into(), None)
                    );
                prev = op_id(id);
            }
            statements =
                statements.add_edge(
                    Edge::head_node(prev.into(), None)
                    .line_to_node((n + q).into(), None)
                );
        }
        GraphBuilder::default()
            .graph_type(GraphType::Graph)
            .strict(false)
            .id(Identity::quoted(""))
            .stmts(statements)
            .build()
            .map_err(|err| GraphVizError(err.to_string()))
    }

    /// Like [`to_graphviz`][Self::to_graphviz], but render directly to a string
    /// and write it to `path`.
    pub fn save_graphviz<P>(&self, path: P) -> DagResult<()>
    where P: AsRef<Path>
    {
        let graphviz = self.to_graphviz()?;
        fs::OpenOptions::new()
            .write(true)
            .append(false)
            .create(true)
            .truncate(true)
            .open(path)?
            .write_all(format!("{}", graphviz).as_bytes())?;
        Ok(())
    }
}

impl PartialEq for CircuitDag {
    fn eq(&self, other: &Self) -> bool {
        self.num_qubits == other.num_qubits
            && (0..self.num_qubits).all(|w| {
                let lhs = self.wire_ops(w);
                let rhs = other.wire_ops(w);
                lhs.len() == rhs.len()
                    && lhs.iter().zip(&rhs).all(|(l, r)| {
                        match (self.get_node(*l), other.get_node(*r)) {
                            (Some(nl), Some(nr)) => {
                                nl.gate == nr.gate && nl.wires == nr.wires
                            },
                            _ => false,
                        }
                    })
            })
    }
}

impl Eq for CircuitDag { }

impl fmt::Display for CircuitDag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.topological_op_nodes() {
            if let Some(node) = self.get_node(id) {
                let wires = node.wires.iter().map(|w| format!("q{}", w)).join(", ");
                writeln!(f, "{} {};", node.gate, wires)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_bell() -> CircuitDag {
        let mut dag = CircuitDag::new(2);
        dag.apply(Gate::H, &[0]).unwrap();
        dag.apply(Gate::cx(), &[0, 1]).unwrap();
        dag
    }

    fn build_ladder() -> (CircuitDag, Vec<NodeId>) {
        let mut dag = CircuitDag::new(3);
        let ids = vec![
            dag.apply(Gate::X, &[1]).unwrap(),
            dag.apply(Gate::cx(), &[0, 1]).unwrap(),
            dag.apply(Gate::H, &[2]).unwrap(),
            dag.apply(Gate::cx(), &[1, 2]).unwrap(),
            dag.apply(Gate::Z, &[0]).unwrap(),
        ];
        (dag, ids)
    }

    #[test]
    fn apply_checks() {
        let mut dag = CircuitDag::new(2);
        assert!(matches!(dag.apply(Gate::X, &[2]), Err(QubitOutOfRange(2, 2))));
        assert!(matches!(dag.apply(Gate::cx(), &[1, 1]), Err(DuplicateOperand(1))));
        assert!(matches!(dag.apply(Gate::cx(), &[1]), Err(OperandCount(_, 2, 1))));
        assert!(dag.is_empty());
    }

    #[test]
    fn links() {
        let dag = build_bell();
        let h = dag.get_node(0).unwrap();
        assert_eq!(h.predecessors(), &[None]);
        assert_eq!(h.successors(), &[Some(1)]);
        let cx = dag.get_node(1).unwrap();
        assert_eq!(cx.predecessors(), &[Some(0), None]);
        assert_eq!(cx.successors(), &[None, None]);
        assert_eq!(dag.wire_ops(0), vec![0, 1]);
        assert_eq!(dag.wire_ops(1), vec![1]);
    }

    #[test]
    fn topological_order() {
        let (dag, ids) = build_ladder();
        assert_eq!(dag.topological_op_nodes(), ids);
        assert_eq!(dag.depth(), 3);
        assert_eq!(dag.count_nodes(), 5);
        let counts = dag.count_ops();
        assert_eq!(counts["cx"], 2);
        assert_eq!(counts["x"], 1);
    }

    #[test]
    fn remove_relinks() {
        let (mut dag, ids) = build_ladder();
        let removed = dag.remove_node(ids[1]).unwrap();
        assert!(removed.gate().is_controlled());
        assert_eq!(dag.wire_ops(0), vec![ids[4]]);
        assert_eq!(dag.wire_ops(1), vec![ids[0], ids[3]]);
        assert_eq!(dag.get_node(ids[3]).unwrap().predecessors(), &[Some(ids[0]), Some(ids[2])]);
        assert!(matches!(dag.remove_node(ids[1]), Err(MissingNode(_))));
        assert_eq!(dag.count_nodes(), 4);
        assert_eq!(dag.depth(), 2);
    }

    #[test]
    fn remove_ends() {
        let mut dag = build_bell();
        dag.remove_node(1).unwrap();
        dag.remove_node(0).unwrap();
        assert!(dag.is_empty());
        assert_eq!(dag, CircuitDag::new(2));
        dag.apply(Gate::X, &[1]).unwrap();
        assert_eq!(dag.wire_ops(1).len(), 1);
    }

    #[test]
    fn substitute_splices() {
        let (mut dag, ids) = build_ladder();
        let mut sub = SubCircuit::new(2);
        sub.apply(Gate::Z, &[0]).unwrap()
            .apply(Gate::HalfSwap, &[1, 0]).unwrap();
        let new = dag.substitute_node(ids[3], &sub, &[1, 2]).unwrap();
        assert_eq!(new.len(), 2);
        assert_eq!(dag.wire_ops(1), vec![ids[0], ids[1], new[0], new[1]]);
        assert_eq!(dag.wire_ops(2), vec![ids[2], new[1]]);
        assert_eq!(dag.get_node(new[1]).unwrap().wires(), &[2, 1]);
        // new nodes have larger IDs but still come before their successors
        let order = dag.topological_op_nodes();
        let pos = |id: NodeId| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(ids[1]) < pos(new[0]));
        assert!(pos(new[0]) < pos(new[1]));
        assert_eq!(order.len(), 6);
    }

    #[test]
    fn substitute_subset() {
        let mut dag = build_bell();
        dag.apply(Gate::H, &[1]).unwrap();
        let mut sub = SubCircuit::new(1);
        sub.apply(Gate::X, &[0]).unwrap();
        dag.substitute_node(1, &sub, &[1]).unwrap();
        let mut expected = CircuitDag::new(2);
        expected.apply(Gate::H, &[0]).unwrap();
        expected.apply(Gate::X, &[1]).unwrap();
        expected.apply(Gate::H, &[1]).unwrap();
        assert_eq!(dag, expected);
    }

    #[test]
    fn substitute_checks() {
        let mut dag = build_bell();
        let sub = SubCircuit::new(1);
        assert!(matches!(dag.substitute_node(1, &sub, &[0, 1]), Err(SubstitutionWidth(1, 2))));
        assert!(matches!(dag.substitute_node(0, &sub, &[1]), Err(SubstitutionWire(1, 0))));
        assert!(matches!(dag.substitute_node(7, &sub, &[1]), Err(MissingNode(7))));
        assert_eq!(dag, build_bell());
        let mut bad = SubCircuit::new(1);
        assert!(bad.apply(Gate::cx(), &[0, 1]).is_err());
        // an empty replacement is a removal
        dag.substitute_node(0, &sub, &[0]).unwrap();
        assert_eq!(dag.count_nodes(), 1);
    }

    #[test]
    fn per_wire_equality() {
        let mut a = CircuitDag::new(2);
        a.apply(Gate::X, &[0]).unwrap();
        a.apply(Gate::Z, &[1]).unwrap();
        let mut b = CircuitDag::new(2);
        b.apply(Gate::Z, &[1]).unwrap();
        b.apply(Gate::X, &[0]).unwrap();
        assert_eq!(a, b);
        b.apply(Gate::X, &[0]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn display() {
        let dag = build_bell();
        assert_eq!(dag.to_string(), "h q0;\ncx q0, q1;\n");
    }

    #[test]
    fn graphviz() {
        let dag = build_bell();
        let dot = dag.to_graphviz().unwrap().to_string();
        assert!(dot.contains("cx"));
    }
}
