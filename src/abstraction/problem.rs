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

//! This module defines the `Problem` trait: the contract a problem must
//! fulfill so that relaxed decision diagrams can be compiled for it.

use std::fmt::{Debug, Display};

use crate::common::{ArcValue, Variable};

/// The abstraction of the problem to relax. A problem supplies its state
/// space (the associated `State` type together with the `transition` and
/// `merge_states` operations), its linear objective, and a handful of hooks
/// the construction engine fires while unrolling the diagram.
///
/// States are plain data: they must be cheap to compare (`Eq`), carry a total
/// order (`Ord`, used to key the solver's state pool), and be printable. The
/// transition and relaxation operations live here, on the problem, so that
/// the hot path of the construction engine is monomorphized.
pub trait Problem {
    /// The DP state of this problem.
    type State: Clone + Eq + Ord + Debug + Display;

    /// The number of 0/1 variables of the problem.
    fn nb_variables(&self) -> usize;

    /// The linear objective, indexed by variable. The engine always
    /// maximizes.
    fn weights(&self) -> &[f64];

    /// The state of the root node of the diagram.
    fn initial_state(&self) -> Self::State;

    /// The state reached from `state` when assigning `value` to `var`, or
    /// `None` when that assignment is infeasible (no arc is created).
    fn transition(&self, state: &Self::State, var: Variable, value: ArcValue)
        -> Option<Self::State>;

    /// Relax `state` so that it stands for everything feasible from either
    /// `state` or `other` (set union / bound loosening).
    fn merge_states(&self, state: &mut Self::State, other: &Self::State);

    /// When this returns true, the node keeps waiting in the pool and the
    /// arcs reaching it will span this layer (long arc). The state is given
    /// mutably because a problem may record the implied assignment (the
    /// binary program marks the variable processed).
    fn skip_var_for_long_arc(&self, _var: Variable, _state: &mut Self::State) -> bool {
        false
    }

    /// Whether the construction must end with exactly one node in the pool.
    /// More than one surviving terminal then indicates a mis-modelled state
    /// and is a fatal error.
    fn expect_single_terminal(&self) -> bool {
        false
    }

    /// Fired once before the first layer is expanded.
    fn on_initialize(&mut self) {}

    /// Fired whenever a new state enters the solver pool.
    fn on_state_created(&mut self, _state: &Self::State) {}

    /// Fired whenever a state leaves the pool to be branched on.
    fn on_state_removed(&mut self, _state: &Self::State) {}

    /// Fired after a layer has been fully branched on; `var` is the variable
    /// of that layer. Problems use it to maintain global activity bounds.
    fn on_layer_end(&mut self, _var: Variable) {}
}
