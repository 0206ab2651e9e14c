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

//! This module defines the fold function driving a top-down or bottom-up
//! sweep over a decision diagram (see `bdd_pass`).

use crate::common::{ArcValue, Variable};
use crate::implementation::bdd::graph::Node;

/// The three pure operations specifying a pass over the diagram. A top-down
/// pass folds over (parent, arc, child) triples in increasing layer order; a
/// bottom-up pass folds over (child, arc, parent) triples in decreasing layer
/// order. The *source* endpoint is the one the value flows from: the parent
/// when going top-down, the child when going bottom-up.
pub trait PassFunc<S> {
    /// Value stored at the source end of the sweep (root if top-down,
    /// terminal if bottom-up).
    fn start_val(&self) -> f64;

    /// Value stored at every other node before folding starts.
    fn init_val(&self) -> f64;

    /// The new value of the target endpoint. `layer` is always the layer of
    /// the **parent** endpoint, whatever the direction; `var` is the variable
    /// decided at that layer. `target` is `None` when the fold is driven by a
    /// node-data transition, where the target node does not exist yet.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        layer: usize,
        var: Variable,
        arc_val: ArcValue,
        source_val: f64,
        target_val: f64,
        source: &Node<S>,
        target: Option<&Node<S>>,
    ) -> f64;
}
