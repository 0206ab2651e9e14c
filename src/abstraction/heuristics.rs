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

//! This module defines the heuristic contracts the construction engine is
//! parameterized by: the variable ordering, the layer merger, the completion
//! bound used for primal pruning, and the (optional) solver callback.

use crate::abstraction::problem::Problem;
use crate::common::Variable;
use crate::implementation::bdd::graph::{Bdd, NodeId};

/// The variable ordering: decides which problem variable is branched on at
/// each layer. Orderings that track the content of the solver pool (such as
/// the independent set min-in-state ordering) do so through the state
/// callbacks.
pub trait VarOrdering<S> {
    /// A short identifier for reporting.
    fn name(&self) -> &'static str;

    /// The variable decided at the given layer. Selecting the same variable
    /// for two layers is a caller bug and aborts the construction.
    fn select_next_var(&mut self, layer: usize) -> Variable;

    fn on_initialize(&mut self) {}
    fn on_state_created(&mut self, _state: &S) {}
    fn on_state_removed(&mut self, _state: &S) {}
}

/// The merger enforces the width limit: `merge_layer` must leave at most
/// `width` nodes in `nodes`. All the nodes it receives are still open (no
/// outgoing arc yet), so relaxation merges are safe.
pub trait Merger<P: Problem> {
    /// A short identifier for reporting.
    fn name(&self) -> &'static str;

    /// The maximum layer width this merger enforces.
    fn width(&self) -> usize;

    /// Reduce `nodes` to at most `self.width()` nodes, merging the victims
    /// into survivors through `Bdd::merge_relax`.
    fn merge_layer(
        &mut self,
        prob: &P,
        bdd: &mut Bdd<P::State>,
        layer: usize,
        nodes: &mut Vec<NodeId>,
    );
}

/// Dual bound on the completion of a partial solution: an upper bound on
/// what the remaining (un-branched) variables can still contribute. Used by
/// primal pruning: a child whose `longest_path + dual_bound` cannot beat the
/// known primal bound is dropped.
pub trait CompletionBound<P: Problem> {
    fn dual_bound(&self, prob: &P, state: &P::State, parent_layer: usize) -> f64;
}

/// Hooks fired by the construction engine at specific points, for
/// instrumentation or for mergers that need preparation work.
pub trait SolverCallback<P: Problem> {
    fn on_layer_end(
        &mut self,
        _bdd: &Bdd<P::State>,
        _nodes_layer: &[NodeId],
        _pool_size: usize,
        _layer: usize,
    ) {
    }

    fn pre_merge(
        &mut self,
        _bdd: &Bdd<P::State>,
        _nodes_layer: &[NodeId],
        _width: usize,
        _layer: usize,
    ) {
    }

    fn post_merge(
        &mut self,
        _bdd: &Bdd<P::State>,
        _nodes_layer: &[NodeId],
        _width: usize,
        _layer: usize,
    ) {
    }

    fn on_solver_end(&mut self, _bdd: &Bdd<P::State>) {}
}
