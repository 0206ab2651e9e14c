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

//! The merging disciplines used to keep a layer within its width limit, and
//! the general purpose mergers built on them. A discipline decides *how* the
//! reduction proceeds (all at once, pair by pair, ...); the comparator it is
//! wrapped around decides *which* nodes get merged away (those sorted to the
//! tail of the layer).

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::abstraction::{Merger, Problem};
use crate::implementation::bdd::graph::{Bdd, NodeId};

/// A node ordering criterion used to sort a layer before merging. Nodes
/// sorted to the tail are the ones merged away.
pub type NodeCmp<S> = dyn Fn(&Bdd<S>, NodeId, NodeId) -> CmpOrdering;

/// Sorts by longest path, decreasing (the nodes with the worst accumulated
/// objective get merged).
pub fn cmp_longest_path_desc<S>(bdd: &Bdd<S>, a: NodeId, b: NodeId) -> CmpOrdering {
    OrderedFloat(bdd.node(b).longest_path).cmp(&OrderedFloat(bdd.node(a).longest_path))
}

/// Find a node of `nodes` (other than `node` itself) whose state is
/// equivalent to the state of `node`.
pub fn find_equivalent_state<S: Eq>(bdd: &Bdd<S>, nodes: &[NodeId], node: NodeId) -> Option<NodeId> {
    nodes
        .iter()
        .copied()
        .find(|&other| other != node && bdd.node(other).state() == bdd.node(node).state())
}

/// Merge all nodes past the width at once: the `(width-1)`-th node absorbs
/// every node beyond it, and a single equivalence sweep then checks whether
/// the survivor collapsed onto an already-kept state.
pub fn merge_past_width_at_once<P: Problem>(
    prob: &P,
    bdd: &mut Bdd<P::State>,
    nodes: &mut Vec<NodeId>,
    width: usize,
    comparator: Option<&NodeCmp<P::State>>,
) {
    if let Some(cmp) = comparator {
        nodes.sort_by(|a, b| cmp(bdd, *a, *b));
    }

    let survivor = nodes[width - 1];
    for &victim in nodes[width..].iter() {
        bdd.merge_relax(prob, survivor, victim, false);
    }
    nodes.truncate(width);

    if let Some(equivalent) = find_equivalent_state(bdd, nodes, survivor) {
        bdd.merge_relax(prob, equivalent, survivor, true);
        nodes.pop();
    }
}

/// Merge the two tail nodes repeatedly until the layer fits, checking after
/// every merge whether the merged state already exists among the kept nodes
/// (through a state-keyed map) and absorbing it if so.
pub fn merge_past_width_iteratively<P: Problem>(
    prob: &P,
    bdd: &mut Bdd<P::State>,
    nodes: &mut Vec<NodeId>,
    width: usize,
    comparator: Option<&NodeCmp<P::State>>,
) {
    if let Some(cmp) = comparator {
        nodes.sort_by(|a, b| cmp(bdd, *a, *b));
    }

    let mut current: BTreeMap<Rc<P::State>, NodeId> =
        nodes.iter().map(|&n| (bdd.state_rc(n), n)).collect();

    while nodes.len() > width {
        let last = nodes[nodes.len() - 1];
        let prev = nodes[nodes.len() - 2];

        // Both shared handles must leave the map before the states are
        // touched.
        current.remove(bdd.node(prev).state());
        current.remove(bdd.node(last).state());

        bdd.merge_relax(prob, prev, last, false);
        nodes.pop();

        if let Some(&equivalent) = current.get(bdd.node(prev).state()) {
            bdd.merge_relax(prob, equivalent, prev, true);
            nodes.pop();
        } else {
            current.insert(bdd.state_rc(prev), prev);
        }

        // a merged node may fall elsewhere in the order
        if let Some(cmp) = comparator {
            nodes.sort_by(|a, b| cmp(bdd, *a, *b));
        }
    }
}

/// Merge consecutive pairs (popped from the tail of the sorted layer) until
/// the layer fits, with equivalence checks against both the nodes still to
/// process and the nodes already requeued.
pub fn merge_past_width_consecutive_pairs<P: Problem>(
    prob: &P,
    bdd: &mut Bdd<P::State>,
    nodes: &mut Vec<NodeId>,
    width: usize,
    comparator: Option<&NodeCmp<P::State>>,
) {
    let mut old_nodes: Vec<NodeId> = vec![];

    while old_nodes.len() + nodes.len() > width {
        old_nodes.append(nodes);
        if let Some(cmp) = comparator {
            old_nodes.sort_by(|a, b| cmp(bdd, *a, *b));
        }

        while old_nodes.len() >= 2 {
            let node_b = old_nodes.pop().unwrap();
            let node_a = old_nodes.pop().unwrap();
            bdd.merge_relax(prob, node_a, node_b, false);

            if let Some(equivalent) = find_equivalent_state(bdd, &old_nodes, node_a) {
                bdd.merge_relax(prob, equivalent, node_a, true);
            } else if let Some(equivalent) = find_equivalent_state(bdd, nodes, node_a) {
                bdd.merge_relax(prob, equivalent, node_a, true);
            } else {
                nodes.push(node_a);
            }
        }
        nodes.append(&mut old_nodes);
    }

    assert!(nodes.len() <= width);
}

/// Merge, at each step, the pair of nodes maximizing (or minimizing) a user
/// function of the pair, with an equivalence sweep after every merge. This
/// is exhaustive over pairs, hence quadratic per step.
pub fn merge_pairs_by_value<P: Problem>(
    prob: &P,
    bdd: &mut Bdd<P::State>,
    nodes: &mut Vec<NodeId>,
    width: usize,
    value_function: &dyn Fn(&Bdd<P::State>, NodeId, NodeId) -> f64,
    maximize: bool,
) {
    while nodes.len() > width {
        let mut best: Option<(NodeId, NodeId)> = None;
        let mut best_value = if maximize { f64::NEG_INFINITY } else { f64::INFINITY };

        for (i, &node1) in nodes.iter().enumerate() {
            for &node2 in nodes[i + 1..].iter() {
                let value = value_function(bdd, node1, node2);
                let improves = if maximize { value > best_value } else { value < best_value };
                if improves {
                    best = Some((node1, node2));
                    best_value = value;
                }
            }
        }

        let (keep, victim) = best.expect("no pair to merge");
        bdd.merge_relax(prob, keep, victim, false);
        nodes.retain(|&n| n != victim);

        if let Some(equivalent) = find_equivalent_state(bdd, nodes, keep) {
            bdd.merge_relax(prob, equivalent, keep, true);
            nodes.retain(|&n| n != keep);
        }
    }
}

// ----------------------------------------------------------------------------
// --- GENERAL PURPOSE MERGERS ------------------------------------------------
// ----------------------------------------------------------------------------

/// Merge the nodes with the smallest longest path, all at once.
pub struct MinLongestPathMerger {
    pub width: usize,
}

impl<P: Problem> Merger<P> for MinLongestPathMerger where P::State: 'static {
    fn name(&self) -> &'static str {
        "min_lp"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(&mut self, prob: &P, bdd: &mut Bdd<P::State>, _layer: usize, nodes: &mut Vec<NodeId>) {
        merge_past_width_at_once(prob, bdd, nodes, self.width, Some(&cmp_longest_path_desc));
    }
}

/// Merge the nodes with the smallest longest path, pair by pair. No re-sort
/// is needed between iterations since merging the two tail nodes preserves a
/// longest-path order.
pub struct PairMinLongestPathMerger {
    pub width: usize,
}

impl<P: Problem> Merger<P> for PairMinLongestPathMerger {
    fn name(&self) -> &'static str {
        "pair_lp"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(&mut self, prob: &P, bdd: &mut Bdd<P::State>, _layer: usize, nodes: &mut Vec<NodeId>) {
        nodes.sort_by(|a, b| cmp_longest_path_desc(bdd, *a, *b));
        merge_past_width_iteratively(prob, bdd, nodes, self.width, None);
    }
}

/// Merge consecutive pairs of nodes in longest-path order.
pub struct ConsecutivePairLongestPathMerger {
    pub width: usize,
}

impl<P: Problem> Merger<P> for ConsecutivePairLongestPathMerger where P::State: 'static {
    fn name(&self) -> &'static str {
        "consec"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(&mut self, prob: &P, bdd: &mut Bdd<P::State>, _layer: usize, nodes: &mut Vec<NodeId>) {
        merge_past_width_consecutive_pairs(prob, bdd, nodes, self.width, Some(&cmp_longest_path_desc));
    }
}

/// Merge the nodes whose states are lexicographically largest.
pub struct LexicographicMerger {
    pub width: usize,
}

impl<P: Problem> Merger<P> for LexicographicMerger {
    fn name(&self) -> &'static str {
        "lex"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(&mut self, prob: &P, bdd: &mut Bdd<P::State>, _layer: usize, nodes: &mut Vec<NodeId>) {
        let by_state: &NodeCmp<P::State> =
            &|bdd, a, b| bdd.node(a).state().cmp(bdd.node(b).state());
        merge_past_width_iteratively(prob, bdd, nodes, self.width, Some(by_state));
    }
}

/// Merge a random subset of the layer.
pub struct RandomMerger {
    pub width: usize,
    rng: StdRng,
}

impl RandomMerger {
    pub fn new(width: usize, seed: u64) -> Self {
        RandomMerger { width, rng: StdRng::seed_from_u64(seed) }
    }
}

impl<P: Problem> Merger<P> for RandomMerger {
    fn name(&self) -> &'static str {
        "random"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(&mut self, prob: &P, bdd: &mut Bdd<P::State>, _layer: usize, nodes: &mut Vec<NodeId>) {
        nodes.shuffle(&mut self.rng);
        merge_past_width_at_once(prob, bdd, nodes, self.width, None);
    }
}
