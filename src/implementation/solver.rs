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

//! The construction engine: compiles a relaxed decision diagram layer by
//! layer, invoking the problem's transition and relaxation operations, the
//! variable ordering, and the merger whenever a layer outgrows its width.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::abstraction::{CompletionBound, Merger, NodeData, NodeDataMap, Problem, SolverCallback, VarOrdering};
use crate::arith::dbl_le;
use crate::common::{ArcValue, Options};
use crate::implementation::bdd::graph::{Bdd, NodeId, NodePosition};

/// The state-keyed pool of open nodes awaiting their branching layer. The
/// total order on states makes its iteration order deterministic.
type NodePool<S> = BTreeMap<Rc<S>, NodeId>;

/// Compiles relaxed decision diagrams for a problem.
pub struct DdSolver<'a, P: Problem> {
    problem: &'a mut P,
    ordering: &'a mut dyn VarOrdering<P::State>,
    merger: Option<&'a mut dyn Merger<P>>,
    completion: Option<&'a dyn CompletionBound<P>>,
    callback: Option<&'a mut dyn SolverCallback<P>>,
    options: &'a Options,

    /// The width actually reached by the construction (after merging).
    pub final_width: usize,
    primal_bound: Option<f64>,
    initial_data: Option<NodeDataMap<P::State>>,
}

impl<'a, P: Problem> DdSolver<'a, P> {
    pub fn new(
        problem: &'a mut P,
        ordering: &'a mut dyn VarOrdering<P::State>,
        options: &'a Options,
    ) -> Self {
        DdSolver {
            problem,
            ordering,
            merger: None,
            completion: None,
            callback: None,
            options,
            final_width: 0,
            primal_bound: None,
            initial_data: None,
        }
    }

    /// Install the merger enforcing the width limit. Without one, the
    /// diagram is exact (and possibly exponentially wide).
    pub fn with_merger(mut self, merger: &'a mut dyn Merger<P>) -> Self {
        self.merger = Some(merger);
        self
    }

    /// Install the completion bound used by primal pruning.
    pub fn with_completion(mut self, completion: &'a dyn CompletionBound<P>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_callback(mut self, callback: &'a mut dyn SolverCallback<P>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Enable primal pruning: a child whose accumulated objective plus the
    /// completion dual bound cannot beat this value is dropped.
    pub fn set_primal_bound(&mut self, bound: f64) {
        self.primal_bound = Some(bound);
    }

    /// Attach a piece of user data to the root node; it will be carried
    /// through the whole construction (key is used to recover it).
    pub fn add_initial_node_data(&mut self, key: impl Into<String>, data: Box<dyn NodeData<P::State>>) {
        self.initial_data
            .get_or_insert_with(NodeDataMap::new)
            .add(key, data);
    }

    /// Construct the relaxed diagram from the problem's initial state.
    /// Returns `None` when no root-terminal path survives (the problem is
    /// infeasible, or everything was pruned).
    pub fn compile(&mut self) -> Option<Bdd<P::State>> {
        let initial_state = self.problem.initial_state();
        let bdd = self.compile_at_state(initial_state, 0.0);
        if let Some(bdd) = bdd.as_ref() {
            assert_eq!(1, bdd.layers[0].len());
            assert_eq!(1, bdd.layers[bdd.layers.len() - 1].len());
        }
        bdd
    }

    /// Construct the relaxed diagram starting from an arbitrary state with
    /// an accumulated objective offset.
    pub fn compile_at_state(
        &mut self,
        initial_state: P::State,
        initial_longest_path: f64,
    ) -> Option<Bdd<P::State>> {
        let nvars = self.problem.nb_variables();
        let mut bdd: Bdd<P::State> = Bdd::new(nvars);
        let mut pool: NodePool<P::State> = BTreeMap::new();
        let mut nodes_layer: Vec<NodeId> = vec![];

        self.final_width = 0;
        self.ordering.on_initialize();
        self.problem.on_initialize();

        let root_state = Rc::new(initial_state);
        let root = bdd.create_open_node(Rc::clone(&root_state), initial_longest_path, self.initial_data.take());
        self.ordering.on_state_created(&root_state);
        self.problem.on_state_created(&root_state);
        pool.insert(root_state, root);

        for layer in 0..nvars {
            let var = self.ordering.select_next_var(layer);
            assert!(var.id() < nvars, "ordering selected an out of range variable");
            assert!(
                bdd.var_to_layer[var.id()].is_none(),
                "variable selected more than once"
            );
            bdd.layer_to_var[layer] = Some(var);
            bdd.var_to_layer[var.id()] = Some(layer);

            // 1. Gather the nodes that branch on this layer. A node whose
            // state cannot use the variable stays in the pool: the arcs
            // reaching it will span this layer (long arcs). The pool is
            // rebuilt because the skip test may touch the state, and a map
            // key must never be mutated in place.
            nodes_layer.clear();
            let gathered = std::mem::take(&mut pool);
            for (key, id) in gathered {
                drop(key); // the node now holds the only handle on its state
                let skip = self.options.use_long_arcs
                    && self.problem.skip_var_for_long_arc(var, bdd.state_mut(id));
                if skip {
                    pool.insert(bdd.state_rc(id), id);
                } else {
                    let state = bdd.node(id).state();
                    self.ordering.on_state_removed(state);
                    self.problem.on_state_removed(state);
                    nodes_layer.push(id);
                }
            }

            if !self.options.quiet {
                println!(
                    "Layer {layer} - current variable: {} - pool size: {} - before merge: {} - total: {}",
                    var.id(),
                    pool.len(),
                    nodes_layer.len(),
                    pool.len() + nodes_layer.len()
                );
            }

            // 2. Merging: bring the layer back within its width.
            if let Some(merger) = self.merger.as_deref_mut() {
                let width = merger.width();
                if nodes_layer.len() > width {
                    if let Some(cb) = self.callback.as_deref_mut() {
                        cb.pre_merge(&bdd, &nodes_layer, width, layer);
                    }
                    merger.merge_layer(self.problem, &mut bdd, layer, &mut nodes_layer);
                    assert!(nodes_layer.len() <= width, "merger exceeded the width limit");
                    if let Some(cb) = self.callback.as_deref_mut() {
                        cb.post_merge(&bdd, &nodes_layer, width, layer);
                    }
                }
            }
            self.final_width = self.final_width.max(nodes_layer.len());

            // 3. Branching.
            for &branch_id in nodes_layer.iter() {
                // consolidate the node into the diagram
                let pos = bdd.layers[layer].len();
                {
                    let node = bdd.node_mut(branch_id);
                    debug_assert!(node.is_open());
                    node.position = NodePosition::At { layer, id: pos };
                }
                bdd.layers[layer].push(branch_id);

                for val in ArcValue::BOTH {
                    let new_state = {
                        let parent = bdd.node(branch_id);
                        self.problem.transition(parent.state(), var, val)
                    };
                    let Some(new_state) = new_state else { continue };

                    // carry the node data along the transition; it may rule
                    // the child out
                    let mut data_infeasible = false;
                    let new_data = {
                        let parent = bdd.node(branch_id);
                        parent.data.as_ref().map(|data| {
                            debug_assert!(!data.is_infeasible());
                            let next = data.transition(parent, &new_state, var, val);
                            data_infeasible = next.is_infeasible();
                            next
                        })
                    };
                    if data_infeasible {
                        continue;
                    }

                    let longest_path = bdd.node(branch_id).longest_path
                        + val.as_f64() * self.problem.weights()[var.id()];

                    // primal pruning
                    if let (Some(primal), Some(completion)) = (self.primal_bound, self.completion)
                    {
                        let dual = completion.dual_bound(self.problem, &new_state, layer);
                        if dbl_le(longest_path + dual, primal) {
                            continue;
                        }
                    }

                    match pool.get(&new_state).copied() {
                        Some(existing) => {
                            // the state already exists: fold into it
                            {
                                let node = bdd.node_mut(existing);
                                node.longest_path = node.longest_path.max(longest_path);
                            }
                            if let Some(new_data) = new_data.as_ref() {
                                bdd.node_mut(existing)
                                    .data
                                    .as_mut()
                                    .expect("node data maps out of sync")
                                    .merge(new_data, &new_state);
                            }
                            debug_assert!(bdd.node(branch_id).arc(val).is_none());
                            bdd.assign_arc(branch_id, Some(existing), val);
                        }
                        None => {
                            let state = Rc::new(new_state);
                            let child = bdd.create_open_node(Rc::clone(&state), longest_path, new_data);
                            self.ordering.on_state_created(&state);
                            self.problem.on_state_created(&state);
                            pool.insert(state, child);
                            debug_assert!(bdd.node(branch_id).arc(val).is_none());
                            bdd.assign_arc(branch_id, Some(child), val);
                        }
                    }
                }

                if self.options.delete_old_states {
                    bdd.node_mut(branch_id).state = None;
                }
            }

            self.problem.on_layer_end(var);
            if let Some(cb) = self.callback.as_deref_mut() {
                cb.on_layer_end(&bdd, &nodes_layer, pool.len(), layer);
            }
        }

        // No node left: the diagram is infeasible or was fully pruned.
        if pool.is_empty() {
            return None;
        }

        // Coalesce the surviving nodes into a single terminal.
        let survivors: Vec<(Rc<P::State>, NodeId)> = std::mem::take(&mut pool).into_iter().collect();
        if self.problem.expect_single_terminal() && survivors.len() > 1 {
            panic!("more than one terminal at the end of BDD construction");
        }
        let terminal = survivors[0].1;
        for (key, other) in survivors.into_iter().skip(1) {
            drop(key);
            let zero_parents = bdd.node(other).zero_ancestors.clone();
            for parent in zero_parents {
                bdd.assign_arc(parent, Some(terminal), ArcValue::Zero);
            }
            let one_parents = bdd.node(other).one_ancestors.clone();
            for parent in one_parents {
                bdd.assign_arc(parent, Some(terminal), ArcValue::One);
            }

            let other_lp = bdd.node(other).longest_path;
            {
                let node = bdd.node_mut(terminal);
                node.longest_path = node.longest_path.max(other_lp);
            }
            let other_state = bdd.node_mut(other).state.take().expect("terminal state released");
            let other_data = bdd.node_mut(other).data.take();
            if let (true, Some(other_data)) = (bdd.node(terminal).data.is_some(), other_data.as_ref())
            {
                bdd.node_mut(terminal)
                    .data
                    .as_mut()
                    .unwrap()
                    .merge(other_data, &other_state);
            }
            bdd.remove_node(other);
        }

        bdd.node_mut(terminal).position = NodePosition::At { layer: nvars, id: 0 };
        bdd.layers[nvars].push(terminal);
        bdd.bound = bdd.node(terminal).longest_path;

        #[cfg(debug_assertions)]
        for (layer, ids) in bdd.layers.iter().enumerate() {
            for (pos, &id) in ids.iter().enumerate() {
                let node = bdd.node(id);
                assert_eq!(NodePosition::At { layer, id: pos }, node.position);
                for val in ArcValue::BOTH {
                    if let Some(child) = node.arc(val) {
                        if self.options.use_long_arcs {
                            assert!(bdd.node(child).layer() > layer);
                        } else {
                            assert!(bdd.node(child).layer() == layer + 1);
                        }
                    }
                }
            }
        }

        bdd.constructed = true;
        if let Some(cb) = self.callback.as_deref_mut() {
            cb.on_solver_end(&bdd);
        }
        Some(bdd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{OptionsBuilder, Variable};
    use crate::implementation::mergers::MinLongestPathMerger;
    use crate::implementation::orderings::{NoOrdering, NumberOfRemainingLayersBound};

    /// A toy problem: pick any subset of n items; the state is the number of
    /// items picked so far. All subsets are feasible, so the diagram of
    /// layer k holds k+1 states and the bound is the sum of the weights.
    struct CountOnes {
        weights: Vec<f64>,
    }

    impl Problem for CountOnes {
        type State = u32;

        fn nb_variables(&self) -> usize {
            self.weights.len()
        }
        fn weights(&self) -> &[f64] {
            &self.weights
        }
        fn initial_state(&self) -> u32 {
            0
        }
        fn transition(&self, state: &u32, _var: Variable, value: ArcValue) -> Option<u32> {
            Some(state + value.index() as u32)
        }
        fn merge_states(&self, state: &mut u32, other: &u32) {
            *state = (*state).max(*other);
        }
    }

    fn quiet() -> Options {
        OptionsBuilder::default().quiet(true).build().unwrap()
    }

    #[test]
    fn exact_compilation_enumerates_all_states() {
        let mut problem = CountOnes { weights: vec![1.0, 1.0, 1.0] };
        let mut ordering = NoOrdering;
        let options = quiet();
        let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
        let bdd = solver.compile().expect("feasible");

        assert_eq!(3.0, bdd.bound);
        assert_eq!(3, solver.final_width);
        assert_eq!(vec![1, 2, 3, 1], bdd.layers.iter().map(|l| l.len()).collect::<Vec<_>>());
        assert!(bdd.integrity_check());
    }

    #[test]
    fn terminal_coalescing_keeps_the_best_path() {
        let mut problem = CountOnes { weights: vec![2.0, 3.0] };
        let mut ordering = NoOrdering;
        let options = quiet();
        let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
        let bdd = solver.compile().expect("feasible");
        // 4 paths, terminal folded from states {0,1,2}; best is 2+3
        assert_eq!(5.0, bdd.bound);
        let (value, path) = bdd.optimal_path(&[2.0, 3.0], true, false);
        assert_eq!(5.0, value);
        assert_eq!(vec![1, 1], path);
    }

    #[test]
    fn width_limit_marks_relaxed_nodes() {
        let mut problem = CountOnes { weights: vec![1.0, 1.0, 1.0] };
        let mut ordering = NoOrdering;
        let mut merger = MinLongestPathMerger { width: 2 };
        let options = quiet();
        let mut solver =
            DdSolver::new(&mut problem, &mut ordering, &options).with_merger(&mut merger);
        let bdd = solver.compile().expect("feasible");

        assert!(solver.final_width <= 2);
        assert!(bdd.layers.iter().all(|l| l.len() <= 2));
        // the relaxation can only overestimate
        assert!(bdd.bound >= 3.0);
        let relaxed = bdd
            .layers
            .iter()
            .flatten()
            .filter(|&&id| bdd.node(id).relaxed)
            .count();
        assert!(relaxed > 0);
        assert!(bdd.integrity_check());
    }

    #[test]
    fn primal_pruning_drops_dominated_children() {
        let mut problem = CountOnes { weights: vec![1.0, 1.0, 1.0] };
        let mut ordering = NoOrdering;
        let completion = NumberOfRemainingLayersBound;
        let options = quiet();
        let mut solver =
            DdSolver::new(&mut problem, &mut ordering, &options).with_completion(&completion);
        solver.set_primal_bound(2.0);
        let bdd = solver.compile().expect("feasible");
        // only the all-ones path can beat the bound of 2
        assert_eq!(3.0, bdd.bound);
        assert_eq!(1, bdd.layers[1].len());
        assert_eq!(1, bdd.layers[2].len());
    }

    #[test]
    fn full_pruning_returns_none() {
        let mut problem = CountOnes { weights: vec![1.0, 1.0, 1.0] };
        let mut ordering = NoOrdering;
        let completion = NumberOfRemainingLayersBound;
        let options = quiet();
        let mut solver =
            DdSolver::new(&mut problem, &mut ordering, &options).with_completion(&completion);
        solver.set_primal_bound(3.0);
        assert!(solver.compile().is_none());
    }

    #[test]
    #[should_panic(expected = "selected more than once")]
    fn reselecting_a_variable_is_fatal() {
        struct Stuck;
        impl<S> VarOrdering<S> for Stuck {
            fn name(&self) -> &'static str {
                "stuck"
            }
            fn select_next_var(&mut self, _layer: usize) -> Variable {
                Variable(0)
            }
        }
        let mut problem = CountOnes { weights: vec![1.0, 1.0] };
        let mut ordering = Stuck;
        let options = quiet();
        let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
        let _ = solver.compile();
    }

    #[test]
    fn keeps_states_when_asked_to() {
        let mut problem = CountOnes { weights: vec![1.0, 1.0] };
        let mut ordering = NoOrdering;
        let options = OptionsBuilder::default()
            .quiet(true)
            .delete_old_states(false)
            .build()
            .unwrap();
        let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
        let bdd = solver.compile().expect("feasible");
        for ids in bdd.layers.iter() {
            for &id in ids.iter() {
                assert!(bdd.node(id).state.is_some());
            }
        }
    }
}
