// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The layered decision diagram structure. All nodes live in one arena owned
//! by the diagram and are designated by their index (`NodeId`); the ancestor
//! lists are plain index vectors, which makes the two-way arc invariant a
//! pair of paired edits inside a single operation, and lets the structure be
//! traversed safely in both directions.

use std::fmt;
use std::rc::Rc;

use crate::abstraction::{NodeDataMap, Problem};
use crate::common::{ArcValue, Variable};

/// A type safe pseudo-pointer to a node: the position of the node in the
/// arena of its diagram.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(pub usize);

/// Where a node sits in the layer structure. A node is *open* while it is a
/// child being populated by the construction engine; it is consolidated when
/// its layer and intra-layer id are assigned, at which point
/// `layers[layer][id]` designates it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodePosition {
    Open,
    At { layer: usize, id: usize },
}

/// A node of the decision diagram.
#[derive(Debug)]
pub struct Node<S> {
    /// Open, or consolidated at (layer, id).
    pub position: NodePosition,
    /// Layer-independent identifier, unique over the lifetime of the diagram.
    pub global_id: usize,
    /// The problem state of the node. Shared with the solver pool while the
    /// node is open; possibly released once the layer is branched on.
    pub state: Option<Rc<S>>,
    /// The best objective accumulated on any root-to-this path.
    pub longest_path: f64,
    /// Outgoing child reached when assigning 0 to the layer variable.
    pub zero_arc: Option<NodeId>,
    /// Outgoing child reached when assigning 1 to the layer variable.
    pub one_arc: Option<NodeId>,
    /// Parents whose zero arc points here (inverse adjacency, weak indices).
    pub zero_ancestors: Vec<NodeId>,
    /// Parents whose one arc points here (inverse adjacency, weak indices).
    pub one_ancestors: Vec<NodeId>,
    /// True when this node survived at least one relaxation merge.
    pub relaxed: bool,
    /// User data carried through construction (may flag infeasibility).
    pub data: Option<NodeDataMap<S>>,
}

impl<S> Node<S> {
    fn new(state: Option<Rc<S>>, longest_path: f64, data: Option<NodeDataMap<S>>) -> Self {
        Node {
            position: NodePosition::Open,
            global_id: 0,
            state,
            longest_path,
            zero_arc: None,
            one_arc: None,
            zero_ancestors: vec![],
            one_ancestors: vec![],
            relaxed: false,
            data,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.position, NodePosition::Open)
    }

    /// The layer of a consolidated node. Panics on an open node.
    pub fn layer(&self) -> usize {
        match self.position {
            NodePosition::At { layer, .. } => layer,
            NodePosition::Open => panic!("layer of an open node"),
        }
    }

    /// The intra-layer id of a consolidated node. Panics on an open node.
    pub fn id(&self) -> usize {
        match self.position {
            NodePosition::At { id, .. } => id,
            NodePosition::Open => panic!("id of an open node"),
        }
    }

    /// The outgoing arc with the given label.
    pub fn arc(&self, val: ArcValue) -> Option<NodeId> {
        match val {
            ArcValue::Zero => self.zero_arc,
            ArcValue::One => self.one_arc,
        }
    }

    /// The parents reaching this node through an arc with the given label.
    pub fn ancestors(&self, val: ArcValue) -> &[NodeId] {
        match val {
            ArcValue::Zero => &self.zero_ancestors,
            ArcValue::One => &self.one_ancestors,
        }
    }

    /// The state of the node. Panics when the state has been released.
    pub fn state(&self) -> &S {
        self.state.as_ref().expect("node state was released")
    }
}

/// The decision diagram: an ordered sequence of layers over an arena of
/// nodes, together with the layer-to-variable translation maps and the bound
/// obtained at construction.
pub struct Bdd<S> {
    slots: Vec<Option<Node<S>>>,
    free: Vec<usize>,
    next_global_id: usize,

    /// The nodes of the diagram, per layer.
    pub layers: Vec<Vec<NodeId>>,
    /// `layer_to_var[k]` is the problem variable decided at layer `k`.
    pub layer_to_var: Vec<Option<Variable>>,
    /// `var_to_layer[v]` is the layer at which variable `v` is decided.
    pub var_to_layer: Vec<Option<usize>>,
    /// The dual bound obtained at construction.
    pub bound: f64,
    /// False while the diagram is in the middle of being constructed.
    pub constructed: bool,
}

impl<S> Bdd<S> {
    /// A fresh, empty diagram for a problem over `nvars` variables.
    pub fn new(nvars: usize) -> Self {
        Bdd {
            slots: vec![],
            free: vec![],
            next_global_id: 0,
            layers: vec![vec![]; nvars + 1],
            layer_to_var: vec![None; nvars],
            var_to_layer: vec![None; nvars],
            bound: f64::NEG_INFINITY,
            constructed: false,
        }
    }

    /// Number of variables (= number of layers minus one).
    pub fn nb_vars(&self) -> usize {
        self.layers.len() - 1
    }

    /// Number of arena slots ever used; the valid index range for side
    /// tables keyed by `NodeId`.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn node(&self, id: NodeId) -> &Node<S> {
        self.slots[id.0].as_ref().expect("accessing a removed node")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<S> {
        self.slots[id.0].as_mut().expect("accessing a removed node")
    }

    /// A clone of the shared handle on the node state.
    pub fn state_rc(&self, id: NodeId) -> Rc<S> {
        Rc::clone(self.node(id).state.as_ref().expect("node state was released"))
    }

    /// Exclusive access to the state of a node. Panics when the state is
    /// still shared (e.g. the node still sits in the solver pool).
    pub fn state_mut(&mut self, id: NodeId) -> &mut S {
        let rc = self.node_mut(id).state.as_mut().expect("node state was released");
        Rc::get_mut(rc).expect("node state is still shared")
    }

    fn alloc(&mut self, mut node: Node<S>) -> NodeId {
        node.global_id = self.next_global_id;
        self.next_global_id += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        debug_assert!(self.slots[id.0].is_some());
        self.slots[id.0] = None;
        self.free.push(id.0);
    }

    // ------------------------------------------------------------------
    // Node manipulation
    // ------------------------------------------------------------------

    /// Create a featureless node (no state, no longest path) consolidated at
    /// the end of the given layer.
    pub fn create_node(&mut self, layer: usize) -> NodeId {
        let id = self.alloc(Node::new(None, -1.0, None));
        let pos = self.layers[layer].len();
        self.node_mut(id).position = NodePosition::At { layer, id: pos };
        self.layers[layer].push(id);
        id
    }

    /// Create an open node (not yet part of any layer) carrying a state, an
    /// accumulated objective and optional node data.
    pub fn create_open_node(
        &mut self,
        state: Rc<S>,
        longest_path: f64,
        data: Option<NodeDataMap<S>>,
    ) -> NodeId {
        self.alloc(Node::new(Some(state), longest_path, data))
    }

    /// Create a peer of `node` in the same layer with the same children.
    /// Parents are not copied; no other feature is transferred.
    pub fn duplicate_node(&mut self, node: NodeId) -> NodeId {
        let layer = self.node(node).layer();
        let zero = self.node(node).zero_arc;
        let one = self.node(node).one_arc;
        let copy = self.create_node(layer);
        if zero.is_some() {
            self.assign_arc(copy, zero, ArcValue::Zero);
        }
        if one.is_some() {
            self.assign_arc(copy, one, ArcValue::One);
        }
        copy
    }

    /// Assign `child` as the target of the arc of `src` labeled `val`,
    /// updating both endpoints. An existing arc is detached first.
    pub fn assign_arc(&mut self, src: NodeId, child: Option<NodeId>, val: ArcValue) {
        if self.node(src).arc(val).is_some() {
            self.detach_arc(src, val);
        }
        match val {
            ArcValue::Zero => self.node_mut(src).zero_arc = child,
            ArcValue::One => self.node_mut(src).one_arc = child,
        }
        if let Some(child) = child {
            match val {
                ArcValue::Zero => self.node_mut(child).zero_ancestors.push(src),
                ArcValue::One => self.node_mut(child).one_ancestors.push(src),
            }
        }
    }

    /// Detach the arc of `src` labeled `val`, updating both endpoints. The
    /// arc must exist.
    pub fn detach_arc(&mut self, src: NodeId, val: ArcValue) {
        let child = self.node(src).arc(val).expect("detaching an absent arc");
        let ancestors = match val {
            ArcValue::Zero => &mut self.node_mut(child).zero_ancestors,
            ArcValue::One => &mut self.node_mut(child).one_ancestors,
        };
        let pos = ancestors
            .iter()
            .position(|p| *p == src)
            .expect("two-way arc invariant broken");
        ancestors.remove(pos);
        match val {
            ArcValue::Zero => self.node_mut(src).zero_arc = None,
            ArcValue::One => self.node_mut(src).one_arc = None,
        }
    }

    /// Take a node out of its layer, shifting the remaining nodes left and
    /// renumbering their ids so that `layers[layer][id]` stays valid.
    fn remove_from_layer(&mut self, layer: usize, id: usize) {
        let size = self.layers[layer].len();
        for i in id..size - 1 {
            let moved = self.layers[layer][i + 1];
            debug_assert_eq!(self.node(moved).id(), i + 1);
            self.node_mut(moved).position = NodePosition::At { layer, id: i };
            self.layers[layer][i] = moved;
        }
        self.layers[layer].pop();
    }

    /// Remove a single node from the diagram: detach its outgoing arcs,
    /// sever every incoming reference (the parents' arc becomes dangling
    /// null), take it out of its layer and free it.
    pub fn remove_node(&mut self, node: NodeId) {
        if self.node(node).zero_arc.is_some() {
            self.detach_arc(node, ArcValue::Zero);
        }
        if self.node(node).one_arc.is_some() {
            self.detach_arc(node, ArcValue::One);
        }
        let removed = self.slots[node.0].take().expect("removing a removed node");
        for p in removed.zero_ancestors {
            self.node_mut(p).zero_arc = None;
        }
        for p in removed.one_ancestors {
            self.node_mut(p).one_arc = None;
        }
        if let NodePosition::At { layer, id } = removed.position {
            self.remove_from_layer(layer, id);
        }
        self.free.push(node.0);
    }

    /// Merge two consolidated nodes that have the same pair of outgoing
    /// arcs: every parent of `rm` is moved onto `node`, then `rm` is
    /// detached and freed. Unlike [Bdd::merge_relax] this ignores states and
    /// data entirely, so it is meant for fully constructed diagrams.
    pub fn merge_nodes(&mut self, node: NodeId, rm: NodeId) {
        assert_eq!(self.node(node).zero_arc, self.node(rm).zero_arc);
        assert_eq!(self.node(node).one_arc, self.node(rm).one_arc);
        assert_eq!(self.node(node).layer(), self.node(rm).layer());

        // A parent cannot hold both node and rm behind the same label, so no
        // duplicate can appear in the ancestor lists.
        let zero_parents = std::mem::take(&mut self.node_mut(rm).zero_ancestors);
        for p in zero_parents {
            self.node_mut(p).zero_arc = Some(node);
            self.node_mut(node).zero_ancestors.push(p);
        }
        let one_parents = std::mem::take(&mut self.node_mut(rm).one_ancestors);
        for p in one_parents {
            self.node_mut(p).one_arc = Some(node);
            self.node_mut(node).one_ancestors.push(p);
        }

        if self.node(rm).zero_arc.is_some() {
            self.detach_arc(rm, ArcValue::Zero);
        }
        if self.node(rm).one_arc.is_some() {
            self.detach_arc(rm, ArcValue::One);
        }

        let removed = self.slots[rm.0].take().expect("merging a removed node");
        if let NodePosition::At { layer, id } = removed.position {
            self.remove_from_layer(layer, id);
        }
        self.free.push(rm.0);
    }

    /// Relaxation merge: merge `victim` into `keep`, state included (unless
    /// `skip_state_merge`, in which case the states must already be
    /// equivalent), pulling the victim's parents, propagating the longest
    /// path and merging node data. The victim is freed. Both nodes must
    /// still be arc-less on the out side: merging after children are set
    /// would silently lose solutions.
    pub fn merge_relax<P>(&mut self, prob: &P, keep: NodeId, victim: NodeId, skip_state_merge: bool)
    where
        P: Problem<State = S>,
        S: Eq,
    {
        assert!(keep != victim, "merging a node with itself");
        let mut removed = self.slots[victim.0].take().expect("merging a removed node");
        assert!(removed.is_open(), "relaxation merge of a consolidated node");
        {
            let kept = self.node(keep);
            assert!(kept.zero_arc.is_none() && kept.one_arc.is_none());
            assert!(removed.zero_arc.is_none() && removed.one_arc.is_none());
        }

        let victim_state = removed.state.take().expect("merged node has no state");
        if skip_state_merge {
            assert!(
                **self.node(keep).state.as_ref().unwrap() == *victim_state,
                "skip_state_merge with non equivalent states"
            );
        } else {
            prob.merge_states(self.state_mut(keep), &victim_state);
        }

        for p in removed.zero_ancestors.drain(..) {
            self.node_mut(p).zero_arc = Some(keep);
            self.node_mut(keep).zero_ancestors.push(p);
        }
        for p in removed.one_ancestors.drain(..) {
            self.node_mut(p).one_arc = Some(keep);
            self.node_mut(keep).one_ancestors.push(p);
        }

        // Maximization diagram: keep the better path.
        let victim_lp = removed.longest_path;
        let kept = self.node_mut(keep);
        kept.longest_path = kept.longest_path.max(victim_lp);
        if let (Some(data), Some(victim_data)) = (kept.data.as_mut(), removed.data.as_ref()) {
            data.merge(victim_data, &victim_state);
        }
        kept.relaxed = true;

        self.free.push(victim.0);
    }

    /// Remove, bottom to top, every node that has no child left.
    pub fn remove_childless_nodes(&mut self) {
        let terminal_layer = self.terminal_layer();
        for layer in (0..terminal_layer).rev() {
            let doomed: Vec<NodeId> = self.layers[layer]
                .iter()
                .copied()
                .filter(|&n| {
                    let n = self.node(n);
                    n.zero_arc.is_none() && n.one_arc.is_none()
                })
                .collect();
            for node in doomed {
                self.remove_node(node);
            }
        }
    }

    /// Remove, top to bottom, every node that has no parent left.
    pub fn remove_parentless_nodes(&mut self) {
        let root_layer = self.root_layer();
        for layer in root_layer + 1..self.layers.len() {
            let doomed: Vec<NodeId> = self.layers[layer]
                .iter()
                .copied()
                .filter(|&n| {
                    let n = self.node(n);
                    n.zero_ancestors.is_empty() && n.one_ancestors.is_empty()
                })
                .collect();
            for node in doomed {
                self.remove_node(node);
            }
        }
    }

    /// Remove every node that is not on a root-terminal path.
    pub fn remove_pathless_nodes(&mut self) {
        self.remove_childless_nodes();
        self.remove_parentless_nodes();
    }

    // ------------------------------------------------------------------
    // Informational functions
    // ------------------------------------------------------------------

    pub fn count_number_of_nodes(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    pub fn count_number_of_arcs(&self) -> usize {
        let mut narcs = 0;
        for layer in self.layers.iter() {
            for &id in layer.iter() {
                let node = self.node(id);
                narcs += node.zero_arc.is_some() as usize;
                narcs += node.one_arc.is_some() as usize;
            }
        }
        narcs
    }

    pub fn width(&self) -> usize {
        self.layers.iter().map(|l| l.len()).max().unwrap_or(0)
    }

    /// The first nonempty layer; typically 0. The diagram must be nonempty
    /// and that layer must hold a single node.
    pub fn root_layer(&self) -> usize {
        let layer = self
            .layers
            .iter()
            .position(|l| !l.is_empty())
            .expect("empty diagram");
        assert_eq!(1, self.layers[layer].len());
        layer
    }

    pub fn root(&self) -> NodeId {
        self.layers[self.root_layer()][0]
    }

    /// The last nonempty layer; typically `nb_vars()`. The diagram must be
    /// nonempty and that layer must hold a single node.
    pub fn terminal_layer(&self) -> usize {
        let layer = self
            .layers
            .iter()
            .rposition(|l| !l.is_empty())
            .expect("empty diagram");
        assert_eq!(1, self.layers[layer].len());
        layer
    }

    pub fn terminal(&self) -> NodeId {
        self.layers[self.terminal_layer()][0]
    }

    /// The problem variable decided at the given layer.
    pub fn var_at(&self, layer: usize) -> Variable {
        self.layer_to_var[layer].expect("layer has no variable assigned")
    }

    /// The layer at which the given variable is decided.
    pub fn layer_of(&self, var: Variable) -> usize {
        self.var_to_layer[var.id()].expect("variable has no layer assigned")
    }

    // ------------------------------------------------------------------
    // Conversion functions
    // ------------------------------------------------------------------

    /// Convert a vector indexed by problem variable into one indexed by
    /// layer.
    pub fn to_layer_space(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.nb_vars());
        (0..self.nb_vars()).map(|layer| v[self.var_at(layer).id()]).collect()
    }

    /// Convert a vector indexed by layer into one indexed by problem
    /// variable.
    pub fn to_var_space(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.nb_vars());
        let mut out = vec![0.0; self.nb_vars()];
        for (layer, val) in v.iter().enumerate() {
            out[self.var_at(layer).id()] = *val;
        }
        out
    }

    // ------------------------------------------------------------------
    // Integrity check
    // ------------------------------------------------------------------

    /// Verify the structural invariants of the diagram: layer/id indexing,
    /// the two-way arc invariant, that every non-root node has a parent and
    /// every non-terminal node a child. Returns false after reporting the
    /// first violation.
    pub fn integrity_check(&self) -> bool {
        match self.integrity_violation() {
            None => true,
            Some(msg) => {
                eprintln!("** BDD integrity check error: {msg}");
                false
            }
        }
    }

    fn integrity_violation(&self) -> Option<String> {
        let nlayers = self.layers.len();
        for (layer, ids) in self.layers.iter().enumerate() {
            for (pos, &id) in ids.iter().enumerate() {
                let node = self.node(id);
                if node.position != (NodePosition::At { layer, id: pos }) {
                    return Some(format!(
                        "node {:?} with incorrect position {:?}, expected layer {layer} id {pos}",
                        id, node.position
                    ));
                }
                if layer > 0 && node.zero_ancestors.is_empty() && node.one_ancestors.is_empty() {
                    return Some(format!("node ({layer},{pos}) with no ancestors"));
                }
                if layer < nlayers - 1 && node.zero_arc.is_none() && node.one_arc.is_none() {
                    return Some(format!("node ({layer},{pos}) with no children"));
                }
                for val in ArcValue::BOTH {
                    for &p in node.ancestors(val) {
                        if self.node(p).arc(val) != Some(id) {
                            return Some(format!(
                                "inconsistent ({val}-)arc parent at ({layer},{pos})"
                            ));
                        }
                    }
                    if let Some(child) = node.arc(val) {
                        if !self.node(child).ancestors(val).contains(&id) {
                            return Some(format!(
                                "inconsistent ({val}-)arc child at ({layer},{pos})"
                            ));
                        }
                    }
                }
            }
        }
        None
    }
}

impl<S> fmt::Display for Bdd<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (layer, ids) in self.layers.iter().enumerate() {
            write!(f, "{layer} :")?;
            for &id in ids.iter() {
                let node = self.node(id);
                if let Some(zero) = node.zero_arc {
                    let zero = self.node(zero);
                    write!(f, "  ({},0)->({},{})", node.id(), zero.layer(), zero.id())?;
                }
                if let Some(one) = node.one_arc {
                    let one = self.node(one);
                    write!(f, "  ({},1)->({},{})", node.id(), one.layer(), one.id())?;
                }
                if node.zero_arc.is_none() && node.one_arc.is_none() {
                    write!(f, "  ({},T)", node.id())?;
                }
                if node.relaxed {
                    write!(f, "  ({},R)", node.id())?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Bdd<usize> {
        // 1 variable, root with both arcs onto the same terminal
        let mut bdd = Bdd::new(1);
        let root = bdd.create_node(0);
        let term = bdd.create_node(1);
        bdd.assign_arc(root, Some(term), ArcValue::Zero);
        bdd.assign_arc(root, Some(term), ArcValue::One);
        bdd
    }

    #[test]
    fn arcs_are_two_way() {
        let bdd = diamond();
        let root = bdd.root();
        let term = bdd.terminal();
        assert_eq!(Some(term), bdd.node(root).zero_arc);
        assert_eq!(Some(term), bdd.node(root).one_arc);
        assert!(bdd.node(term).zero_ancestors.contains(&root));
        assert!(bdd.node(term).one_ancestors.contains(&root));
        assert!(bdd.integrity_check());
    }

    #[test]
    fn detach_updates_both_endpoints() {
        let mut bdd = diamond();
        let root = bdd.root();
        let term = bdd.terminal();
        bdd.detach_arc(root, ArcValue::Zero);
        assert_eq!(None, bdd.node(root).zero_arc);
        assert!(!bdd.node(term).zero_ancestors.contains(&root));
        assert!(bdd.node(term).one_ancestors.contains(&root));
    }

    #[test]
    fn assign_over_an_existing_arc_detaches_it_first() {
        let mut bdd = diamond();
        let root = bdd.root();
        let term = bdd.terminal();
        let other = bdd.create_node(1);
        // terminal layer now has 2 nodes; re-point the zero arc
        bdd.assign_arc(root, Some(other), ArcValue::Zero);
        assert!(!bdd.node(term).zero_ancestors.contains(&root));
        assert!(bdd.node(other).zero_ancestors.contains(&root));
    }

    #[test]
    fn remove_node_shifts_ids_left() {
        let mut bdd: Bdd<usize> = Bdd::new(2);
        let root = bdd.create_node(0);
        let a = bdd.create_node(1);
        let b = bdd.create_node(1);
        let c = bdd.create_node(1);
        bdd.assign_arc(root, Some(a), ArcValue::Zero);
        bdd.assign_arc(root, Some(b), ArcValue::One);
        assert_eq!(2, bdd.node(c).id());
        bdd.remove_node(a);
        assert_eq!(0, bdd.node(b).id());
        assert_eq!(1, bdd.node(c).id());
        assert_eq!(None, bdd.node(root).zero_arc);
        assert_eq!(Some(b), bdd.node(root).one_arc);
    }

    #[test]
    fn duplicate_copies_children_not_parents() {
        let mut bdd = diamond();
        let root = bdd.root();
        let term = bdd.terminal();
        let copy = bdd.duplicate_node(root);
        assert_eq!(Some(term), bdd.node(copy).zero_arc);
        assert_eq!(Some(term), bdd.node(copy).one_arc);
        assert!(bdd.node(copy).zero_ancestors.is_empty());
        assert_eq!(2, bdd.node(term).zero_ancestors.len());
        assert!(bdd.node(root).zero_ancestors.is_empty());
    }

    #[test]
    fn merge_nodes_moves_parents_and_frees_the_victim() {
        let mut bdd: Bdd<usize> = Bdd::new(2);
        let root = bdd.create_node(0);
        let a = bdd.create_node(1);
        let b = bdd.create_node(1);
        let term = bdd.create_node(2);
        bdd.assign_arc(root, Some(a), ArcValue::Zero);
        bdd.assign_arc(root, Some(b), ArcValue::One);
        bdd.assign_arc(a, Some(term), ArcValue::Zero);
        bdd.assign_arc(b, Some(term), ArcValue::Zero);
        // a and b have the same out-arcs; merge b into a
        bdd.merge_nodes(a, b);
        assert_eq!(Some(a), bdd.node(root).one_arc);
        assert_eq!(1, bdd.layers[1].len());
        assert!(bdd.integrity_check());
    }

    #[test]
    fn pathless_sweeps_cascade() {
        let mut bdd: Bdd<usize> = Bdd::new(2);
        let root = bdd.create_node(0);
        let a = bdd.create_node(1);
        let dead = bdd.create_node(1);
        let term = bdd.create_node(2);
        bdd.assign_arc(root, Some(a), ArcValue::Zero);
        bdd.assign_arc(a, Some(term), ArcValue::One);
        // `dead` has neither parents nor children
        let _ = dead;
        bdd.remove_pathless_nodes();
        assert_eq!(1, bdd.layers[1].len());
        assert!(bdd.integrity_check());
    }

    #[test]
    fn integrity_catches_missing_children() {
        let mut bdd: Bdd<usize> = Bdd::new(2);
        let root = bdd.create_node(0);
        let mid = bdd.create_node(1);
        let term = bdd.create_node(2);
        bdd.assign_arc(root, Some(mid), ArcValue::Zero);
        bdd.assign_arc(mid, Some(term), ArcValue::Zero);
        assert!(bdd.integrity_check());
        bdd.detach_arc(mid, ArcValue::Zero);
        assert!(!bdd.integrity_check());
    }

    #[test]
    fn global_ids_are_monotone() {
        let mut bdd: Bdd<usize> = Bdd::new(1);
        let a = bdd.create_node(0);
        let b = bdd.create_node(1);
        assert!(bdd.node(a).global_id < bdd.node(b).global_id);
    }
}
