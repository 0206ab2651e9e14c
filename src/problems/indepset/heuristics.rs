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

//! Orderings, mergers and the completion bound specific to the independent
//! set problem, plus the id-based factories used by the command line.

use std::cmp::Ordering as CmpOrdering;

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::abstraction::{CompletionBound, Merger, VarOrdering};
use crate::common::{Error, Options, Variable};
use crate::implementation::bdd::graph::{Bdd, NodeId};
use crate::implementation::mergers::{
    merge_pairs_by_value, merge_past_width_iteratively, ConsecutivePairLongestPathMerger,
    LexicographicMerger, MinLongestPathMerger, NodeCmp, PairMinLongestPathMerger, RandomMerger,
};
use crate::implementation::orderings::{FixedOrdering, NoOrdering, RandomOrdering};
use crate::problems::indepset::graph::Graph;
use crate::problems::indepset::instance::IndepSetInstance;
use crate::problems::indepset::problem::IndepSetProblem;
use crate::problems::indepset::state::IndepSetState;

// ----------------------------------------------------------------------------
// --- ORDERINGS --------------------------------------------------------------
// ----------------------------------------------------------------------------

/// Branch on the vertex contained in the least number of pool states. With a
/// probability below 1, the heuristic choice is only applied that often and
/// a uniformly random selectable vertex is picked otherwise.
pub struct MinInState {
    in_state_counter: Vec<i64>,
    prob: f64,
    rng: StdRng,
}

impl MinInState {
    pub fn new(nvars: usize, prob: f64, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&prob));
        MinInState {
            in_state_counter: vec![0; nvars],
            prob,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn min_in_state(&self) -> Variable {
        let mut best = i64::MAX;
        let mut selected = None;
        for (v, &count) in self.in_state_counter.iter().enumerate() {
            if count > 0 && count < best {
                best = count;
                selected = Some(v);
            }
        }
        Variable(selected.expect("no selectable vertex left"))
    }

    fn random_selectable(&mut self) -> Variable {
        let selectable: Vec<usize> = self
            .in_state_counter
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(v, _)| v)
            .collect();
        assert!(!selectable.is_empty());
        Variable(selectable[self.rng.gen_range(0..selectable.len())])
    }
}

impl VarOrdering<IndepSetState> for MinInState {
    fn name(&self) -> &'static str {
        "min_in_state"
    }

    fn select_next_var(&mut self, _layer: usize) -> Variable {
        if self.prob >= 1.0 || self.rng.gen_range(0.0..1.0) < self.prob {
            self.min_in_state()
        } else {
            self.random_selectable()
        }
    }

    fn on_initialize(&mut self) {
        self.in_state_counter.iter_mut().for_each(|c| *c = 0);
    }

    fn on_state_created(&mut self, state: &IndepSetState) {
        for v in state.sel.iter() {
            self.in_state_counter[v] += 1;
        }
    }

    fn on_state_removed(&mut self, state: &IndepSetState) {
        for v in state.sel.iter() {
            self.in_state_counter[v] -= 1;
        }
    }
}

/// Branch on the vertices in order of (remaining) minimum degree.
pub struct MinDegreeOrdering {
    v_in_layer: Vec<Variable>,
}

impl MinDegreeOrdering {
    pub fn new(graph: &Graph) -> Self {
        let n = graph.n_vertices;
        let mut degree: Vec<i64> = (0..n).map(|v| graph.degree(v) as i64).collect();
        let mut selected = vec![false; n];
        let mut v_in_layer = Vec::with_capacity(n);

        while v_in_layer.len() < n {
            let mut min = i64::MAX;
            let mut pick = None;
            for v in 0..n {
                if degree[v] > 0 && degree[v] < min && !selected[v] {
                    min = degree[v];
                    pick = Some(v);
                }
            }
            match pick {
                Some(v) => {
                    selected[v] = true;
                    v_in_layer.push(Variable(v));
                    for &w in graph.adj_list[v].iter() {
                        degree[w] -= 1;
                    }
                }
                None => {
                    // only isolated (or exhausted) vertices remain
                    for v in 0..n {
                        if !selected[v] {
                            selected[v] = true;
                            v_in_layer.push(Variable(v));
                        }
                    }
                }
            }
        }
        MinDegreeOrdering { v_in_layer }
    }
}

impl VarOrdering<IndepSetState> for MinDegreeOrdering {
    fn name(&self) -> &'static str {
        "mindegree"
    }
    fn select_next_var(&mut self, layer: usize) -> Variable {
        self.v_in_layer[layer]
    }
}

/// Branch along a maximal path decomposition of the graph: each chunk of
/// consecutive layers follows a maximal path, which keeps consecutive layer
/// variables adjacent in the graph.
pub struct MaximalPathDecomp {
    v_in_layer: Vec<Variable>,
}

impl MaximalPathDecomp {
    pub fn new(graph: &Graph) -> Self {
        let n = graph.n_vertices;
        let mut v_in_layer = vec![Variable(0); n];
        let mut visited = vec![false; n];
        let mut placed = 0;

        while placed < n {
            let middle = (0..n).find(|&v| !visited[v]).unwrap();
            visited[middle] = true;

            let extend = |start: usize, visited: &mut Vec<bool>| -> Vec<usize> {
                let mut chain = vec![];
                let mut current = start;
                loop {
                    let next = (0..n).find(|&v| !visited[v] && graph.is_adj(current, v));
                    match next {
                        Some(v) => {
                            chain.push(v);
                            visited[v] = true;
                            current = v;
                        }
                        None => break,
                    }
                }
                chain
            };

            let right = extend(middle, &mut visited);
            let left = extend(middle, &mut visited);

            for &v in left.iter().rev() {
                v_in_layer[placed] = Variable(v);
                placed += 1;
            }
            v_in_layer[placed] = Variable(middle);
            placed += 1;
            for &v in right.iter() {
                v_in_layer[placed] = Variable(v);
                placed += 1;
            }
        }
        MaximalPathDecomp { v_in_layer }
    }
}

impl VarOrdering<IndepSetState> for MaximalPathDecomp {
    fn name(&self) -> &'static str {
        "maxpath"
    }
    fn select_next_var(&mut self, layer: usize) -> Variable {
        self.v_in_layer[layer]
    }
}

// ----------------------------------------------------------------------------
// --- COMPLETION BOUND -------------------------------------------------------
// ----------------------------------------------------------------------------

/// Use the state size (vertices still selectable) as a dual bound on the
/// completion. Only valid for unit weights.
pub struct StateSizeCompletionBound;

impl CompletionBound<IndepSetProblem> for StateSizeCompletionBound {
    fn dual_bound(
        &self,
        _prob: &IndepSetProblem,
        state: &IndepSetState,
        _parent_layer: usize,
    ) -> f64 {
        state.size() as f64
    }
}

// ----------------------------------------------------------------------------
// --- MERGERS ----------------------------------------------------------------
// ----------------------------------------------------------------------------

fn state_size(bdd: &Bdd<IndepSetState>, id: NodeId) -> usize {
    bdd.node(id).state().size()
}

/// State size ascending, then longest path decreasing.
fn cmp_size_asc(bdd: &Bdd<IndepSetState>, a: NodeId, b: NodeId) -> CmpOrdering {
    state_size(bdd, a)
        .cmp(&state_size(bdd, b))
        .then_with(|| {
            OrderedFloat(bdd.node(b).longest_path).cmp(&OrderedFloat(bdd.node(a).longest_path))
        })
}

/// State size descending, then longest path decreasing.
fn cmp_size_desc(bdd: &Bdd<IndepSetState>, a: NodeId, b: NodeId) -> CmpOrdering {
    state_size(bdd, b)
        .cmp(&state_size(bdd, a))
        .then_with(|| {
            OrderedFloat(bdd.node(b).longest_path).cmp(&OrderedFloat(bdd.node(a).longest_path))
        })
}

/// Merge the nodes of smallest state size (pair by pair).
pub struct MinSizeMerger {
    pub width: usize,
}

impl Merger<IndepSetProblem> for MinSizeMerger {
    fn name(&self) -> &'static str {
        "min_size"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(
        &mut self,
        prob: &IndepSetProblem,
        bdd: &mut Bdd<IndepSetState>,
        _layer: usize,
        nodes: &mut Vec<NodeId>,
    ) {
        let cmp: &NodeCmp<IndepSetState> = &cmp_size_desc;
        merge_past_width_iteratively(prob, bdd, nodes, self.width, Some(cmp));
    }
}

/// Merge the nodes of largest state size (pair by pair).
pub struct MaxSizeMerger {
    pub width: usize,
}

impl Merger<IndepSetProblem> for MaxSizeMerger {
    fn name(&self) -> &'static str {
        "max_size"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(
        &mut self,
        prob: &IndepSetProblem,
        bdd: &mut Bdd<IndepSetState>,
        _layer: usize,
        nodes: &mut Vec<NodeId>,
    ) {
        let cmp: &NodeCmp<IndepSetState> = &cmp_size_asc;
        merge_past_width_iteratively(prob, bdd, nodes, self.width, Some(cmp));
    }
}

/// Merge the pair whose merged node carries the smallest bound on the new
/// solutions it introduces: `max(a.lp + |b.state|, b.lp + |a.state|)`.
pub struct MinNewSolsBoundMerger {
    pub width: usize,
}

impl Merger<IndepSetProblem> for MinNewSolsBoundMerger {
    fn name(&self) -> &'static str {
        "min_new_sols_bound"
    }
    fn width(&self) -> usize {
        self.width
    }
    fn merge_layer(
        &mut self,
        prob: &IndepSetProblem,
        bdd: &mut Bdd<IndepSetState>,
        _layer: usize,
        nodes: &mut Vec<NodeId>,
    ) {
        let value = |bdd: &Bdd<IndepSetState>, a: NodeId, b: NodeId| -> f64 {
            let bound_a = bdd.node(a).longest_path + state_size(bdd, b) as f64;
            let bound_b = bdd.node(b).longest_path + state_size(bdd, a) as f64;
            bound_a.max(bound_b)
        };
        merge_pairs_by_value(prob, bdd, nodes, self.width, &value, false);
    }
}

// ----------------------------------------------------------------------------
// --- FACTORIES --------------------------------------------------------------
// ----------------------------------------------------------------------------

/// The independent set ordering designated by the given id.
pub fn ordering_by_id(
    id: usize,
    inst: &IndepSetInstance,
    options: &Options,
) -> Result<Box<dyn VarOrdering<IndepSetState>>, Error> {
    match id {
        1 => Ok(Box::new(RandomOrdering::new(inst.nvars(), options.seed))),
        2 => Ok(Box::new(MaximalPathDecomp::new(&inst.graph))),
        3 => Ok(Box::new(MinInState::new(inst.nvars(), 1.0, options.seed))),
        6 => Ok(Box::new(MinInState::new(
            inst.nvars(),
            options.order_rand_min_state_prob,
            options.seed,
        ))),
        7 => match options.fixed_order_file.as_ref() {
            Some(path) => Ok(Box::new(FixedOrdering::from_file(path, inst.nvars())?)),
            None => Err(Error::Parse("fixed ordering requires an order file".to_string())),
        },
        8 => Ok(Box::new(MinDegreeOrdering::new(&inst.graph))),
        9 => Ok(Box::new(NoOrdering)),
        _ => Err(Error::Parse(format!("invalid independent set ordering id {id}"))),
    }
}

/// The independent set merger designated by the given id.
pub fn merger_by_id(
    id: usize,
    width: usize,
    options: &Options,
) -> Result<Box<dyn Merger<IndepSetProblem>>, Error> {
    match id {
        1 => Ok(Box::new(MinLongestPathMerger { width })),
        2 => Ok(Box::new(PairMinLongestPathMerger { width })),
        3 => Ok(Box::new(ConsecutivePairLongestPathMerger { width })),
        4 => Ok(Box::new(LexicographicMerger { width })),
        5 => Ok(Box::new(RandomMerger::new(width, options.seed))),
        6 => Ok(Box::new(MinSizeMerger { width })),
        7 => Ok(Box::new(MaxSizeMerger { width })),
        8 => Ok(Box::new(MinNewSolsBoundMerger { width })),
        _ => Err(Error::Parse(format!("invalid independent set merger id {id}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: usize) -> Graph {
        let mut g = Graph::new(n);
        for v in 0..n - 1 {
            g.add_edge(v, v + 1);
        }
        g
    }

    #[test]
    fn min_degree_prefers_endpoints() {
        let g = path_graph(4);
        let mut ordering = MinDegreeOrdering::new(&g);
        let first = ordering.select_next_var(0);
        assert!(first == Variable(0) || first == Variable(3));
    }

    #[test]
    fn maximal_path_keeps_adjacent_variables_consecutive() {
        let g = path_graph(5);
        let mut ordering = MaximalPathDecomp::new(&g);
        let order: Vec<usize> = (0..5).map(|l| ordering.select_next_var(l).id()).collect();
        for w in order.windows(2) {
            assert!(g.is_adj(w[0], w[1]));
        }
    }

    #[test]
    fn min_in_state_tracks_the_pool() {
        let mut ordering = MinInState::new(3, 1.0, 0);
        ordering.on_initialize();
        let a = IndepSetState::new([0, 1, 2].into_iter().collect());
        let b = IndepSetState::new([1].into_iter().collect());
        ordering.on_state_created(&a);
        ordering.on_state_created(&b);
        // vertex 1 is in two states, 0 and 2 in one
        let pick = ordering.select_next_var(0);
        assert!(pick == Variable(0) || pick == Variable(2));
        ordering.on_state_removed(&a);
        assert_eq!(Variable(1), ordering.select_next_var(1));
    }
}
