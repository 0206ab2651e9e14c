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

//! Top-down and bottom-up sweeps over a decision diagram, folding a user
//! supplied [PassFunc] over the arcs. The values computed by a pass live in a
//! side table ([PassValues]) owned by the caller: releasing the scratch is
//! dropping that table, so no per-node cleanup is ever needed and the diagram
//! itself carries no scratch at rest.

use std::any::Any;
use std::rc::Rc;

use crate::abstraction::{NodeData, PassFunc, Problem};
use crate::common::{ArcValue, Variable};
use crate::implementation::bdd::graph::{Bdd, Node, NodeId};
use crate::implementation::mergers::merge_past_width_at_once;

/// The values computed by a pass, indexed by node. Dropping this table
/// releases the scratch of the pass.
#[derive(Debug, Clone)]
pub struct PassValues {
    top_down: Vec<f64>,
    bottom_up: Vec<f64>,
}

impl PassValues {
    pub fn top_down(&self, id: NodeId) -> f64 {
        self.top_down[id.0]
    }
    pub fn bottom_up(&self, id: NodeId) -> f64 {
        self.bottom_up[id.0]
    }
}

/// Run a top-down and/or a bottom-up pass over a fully constructed diagram.
/// Both directions share one [PassValues] table.
pub fn bdd_pass<S>(
    bdd: &Bdd<S>,
    top_down: Option<&dyn PassFunc<S>>,
    bottom_up: Option<&dyn PassFunc<S>>,
) -> PassValues {
    assert!(
        bdd.constructed,
        "top-down/bottom-up pass attempted during DD construction"
    );
    run_pass(bdd, top_down, bottom_up)
}

/// Run a top-down pass over a diagram that is not necessarily fully
/// constructed. Values are also seeded on not-yet-consolidated children
/// reached through some parent's arc, so mergers may use them while a layer
/// is still being built.
pub fn bdd_partial_pass<S>(bdd: &Bdd<S>, top_down: &dyn PassFunc<S>) -> PassValues {
    run_pass(bdd, Some(top_down), None)
}

fn run_pass<S>(
    bdd: &Bdd<S>,
    top_down: Option<&dyn PassFunc<S>>,
    bottom_up: Option<&dyn PassFunc<S>>,
) -> PassValues {
    assert!(
        top_down.is_some() || bottom_up.is_some(),
        "pass attempted without any fold function"
    );

    // The side table covers every arena slot, so open children are seeded
    // along with the consolidated nodes.
    let nslots = bdd.slot_count();
    let mut values = PassValues {
        top_down: vec![top_down.map_or(0.0, |f| f.init_val()); nslots],
        bottom_up: vec![bottom_up.map_or(0.0, |f| f.init_val()); nslots],
    };

    if let Some(func) = top_down {
        values.top_down[bdd.root().0] = func.start_val();
        for (layer, ids) in bdd.layers.iter().enumerate() {
            for &id in ids.iter() {
                let source = bdd.node(id);
                for val in ArcValue::BOTH {
                    if let Some(child) = source.arc(val) {
                        values.top_down[child.0] = func.apply(
                            layer,
                            bdd.var_at(layer),
                            val,
                            values.top_down[id.0],
                            values.top_down[child.0],
                            source,
                            Some(bdd.node(child)),
                        );
                    }
                }
            }
        }
    }

    if let Some(func) = bottom_up {
        values.bottom_up[bdd.terminal().0] = func.start_val();
        for (layer, ids) in bdd.layers.iter().enumerate().rev() {
            for &id in ids.iter() {
                let target = bdd.node(id);
                for val in ArcValue::BOTH {
                    if let Some(child) = target.arc(val) {
                        values.bottom_up[id.0] = func.apply(
                            layer,
                            bdd.var_at(layer),
                            val,
                            values.bottom_up[child.0],
                            values.bottom_up[id.0],
                            bdd.node(child),
                            Some(target),
                        );
                    }
                }
            }
        }
    }

    values
}

// ----------------------------------------------------------------------------
// --- PASS VALUES AS NODE DATA -----------------------------------------------
// ----------------------------------------------------------------------------

/// How two pass values are combined when nodes merge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassFold {
    Min,
    Max,
}

/// Node data that folds a [PassFunc] along the transitions taken during
/// construction, so that mergers can rank nodes on pass values accumulated
/// *while* the diagram is being built. On a merge the kept value is the
/// minimum or maximum of both, depending on the fold.
pub struct PassValueData<S> {
    pass: Rc<dyn PassFunc<S>>,
    fold: PassFold,
    pub value: f64,
}

impl<S> std::fmt::Debug for PassValueData<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassValueData")
            .field("fold", &self.fold)
            .field("value", &self.value)
            .finish()
    }
}

impl<S> PassValueData<S> {
    pub fn new(pass: Rc<dyn PassFunc<S>>, fold: PassFold) -> Self {
        let value = pass.start_val();
        PassValueData { pass, fold, value }
    }
}

impl<S: 'static> NodeData<S> for PassValueData<S> {
    fn transition(
        &self,
        node: &Node<S>,
        _new_state: &S,
        var: Variable,
        value: ArcValue,
    ) -> Box<dyn NodeData<S>> {
        // This cannot be used with pass functions that look at the target
        // node: it does not exist yet.
        let folded = self.pass.apply(
            node.layer(),
            var,
            value,
            self.value,
            self.pass.init_val(),
            node,
            None,
        );
        Box::new(PassValueData {
            pass: Rc::clone(&self.pass),
            fold: self.fold,
            value: folded,
        })
    }

    fn merge(&mut self, rhs: &dyn NodeData<S>, _state: &S) {
        let rhs = rhs
            .as_any()
            .downcast_ref::<PassValueData<S>>()
            .expect("merging incompatible node data");
        self.value = match self.fold {
            PassFold::Min => self.value.min(rhs.value),
            PassFold::Max => self.value.max(rhs.value),
        };
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The pass value stored under `key` in the data map of the given node.
pub fn node_data_pass_value<S: 'static>(node: &Node<S>, key: &str) -> f64 {
    let data = node
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .expect("node carries no pass value data under this key");
    data.as_any()
        .downcast_ref::<PassValueData<S>>()
        .expect("node data under this key is not a pass value")
        .value
}

// ----------------------------------------------------------------------------
// --- PASS VALUE MERGERS -----------------------------------------------------
// ----------------------------------------------------------------------------

/// Merge the nodes with the largest (resp. smallest) top-down pass values, as
/// computed by a partial pass over the in-construction diagram at merge time.
pub struct PassValMerger<S> {
    width: usize,
    pass: Rc<dyn PassFunc<S>>,
    fold: PassFold,
}

impl<S> PassValMerger<S> {
    /// Merges the nodes with the *largest* pass values.
    pub fn max(width: usize, pass: Rc<dyn PassFunc<S>>) -> Self {
        PassValMerger { width, pass, fold: PassFold::Max }
    }
    /// Merges the nodes with the *smallest* pass values.
    pub fn min(width: usize, pass: Rc<dyn PassFunc<S>>) -> Self {
        PassValMerger { width, pass, fold: PassFold::Min }
    }
}

impl<P: Problem> crate::abstraction::Merger<P> for PassValMerger<P::State> {
    fn name(&self) -> &'static str {
        match self.fold {
            PassFold::Max => "max_pass_val",
            PassFold::Min => "min_pass_val",
        }
    }

    fn width(&self) -> usize {
        self.width
    }

    fn merge_layer(
        &mut self,
        prob: &P,
        bdd: &mut Bdd<P::State>,
        _layer: usize,
        nodes: &mut Vec<NodeId>,
    ) {
        let values = bdd_partial_pass(bdd, self.pass.as_ref());
        // Sort so that the nodes to merge away end up at the tail.
        match self.fold {
            PassFold::Max => nodes.sort_by(|a, b| {
                values.top_down(*a).partial_cmp(&values.top_down(*b)).unwrap()
            }),
            PassFold::Min => nodes.sort_by(|a, b| {
                values.top_down(*b).partial_cmp(&values.top_down(*a)).unwrap()
            }),
        }
        merge_past_width_at_once(prob, bdd, nodes, self.width, None);
    }
}

/// Merge the nodes with the largest (resp. smallest) pass values carried by
/// node data under the given key (values accumulated during construction).
pub struct PassValNodeDataMerger {
    width: usize,
    key: String,
    fold: PassFold,
}

impl PassValNodeDataMerger {
    pub fn max(width: usize, key: impl Into<String>) -> Self {
        PassValNodeDataMerger { width, key: key.into(), fold: PassFold::Max }
    }
    pub fn min(width: usize, key: impl Into<String>) -> Self {
        PassValNodeDataMerger { width, key: key.into(), fold: PassFold::Min }
    }
}

impl<P: Problem> crate::abstraction::Merger<P> for PassValNodeDataMerger
where
    P::State: 'static,
{
    fn name(&self) -> &'static str {
        match self.fold {
            PassFold::Max => "max_pass_val_nd",
            PassFold::Min => "min_pass_val_nd",
        }
    }

    fn width(&self) -> usize {
        self.width
    }

    fn merge_layer(
        &mut self,
        prob: &P,
        bdd: &mut Bdd<P::State>,
        _layer: usize,
        nodes: &mut Vec<NodeId>,
    ) {
        let key = self.key.clone();
        match self.fold {
            PassFold::Max => nodes.sort_by(|a, b| {
                let va = node_data_pass_value(bdd.node(*a), &key);
                let vb = node_data_pass_value(bdd.node(*b), &key);
                va.partial_cmp(&vb).unwrap()
            }),
            PassFold::Min => nodes.sort_by(|a, b| {
                let va = node_data_pass_value(bdd.node(*a), &key);
                let vb = node_data_pass_value(bdd.node(*b), &key);
                vb.partial_cmp(&va).unwrap()
            }),
        }
        merge_past_width_at_once(prob, bdd, nodes, self.width, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ArcValue;

    /// Counts the number of paths reaching each node.
    struct CountPaths;
    impl<S> PassFunc<S> for CountPaths {
        fn start_val(&self) -> f64 {
            1.0
        }
        fn init_val(&self) -> f64 {
            0.0
        }
        fn apply(
            &self,
            _layer: usize,
            _var: Variable,
            _arc: ArcValue,
            source_val: f64,
            target_val: f64,
            _source: &Node<S>,
            _target: Option<&Node<S>>,
        ) -> f64 {
            target_val + source_val
        }
    }

    fn two_var_diamond() -> Bdd<usize> {
        // root branches to two middle nodes, both reach the terminal twice
        let mut bdd: Bdd<usize> = Bdd::new(2);
        let root = bdd.create_node(0);
        let a = bdd.create_node(1);
        let b = bdd.create_node(1);
        let term = bdd.create_node(2);
        bdd.assign_arc(root, Some(a), ArcValue::Zero);
        bdd.assign_arc(root, Some(b), ArcValue::One);
        bdd.assign_arc(a, Some(term), ArcValue::Zero);
        bdd.assign_arc(a, Some(term), ArcValue::One);
        bdd.assign_arc(b, Some(term), ArcValue::Zero);
        bdd.layer_to_var[0] = Some(Variable(0));
        bdd.layer_to_var[1] = Some(Variable(1));
        bdd.var_to_layer[0] = Some(0);
        bdd.var_to_layer[1] = Some(1);
        bdd.constructed = true;
        bdd
    }

    #[test]
    fn top_down_counts_paths_from_root() {
        let bdd = two_var_diamond();
        let values = bdd_pass(&bdd, Some(&CountPaths), None);
        assert_eq!(1.0, values.top_down(bdd.root()));
        assert_eq!(3.0, values.top_down(bdd.terminal()));
    }

    #[test]
    fn bottom_up_counts_paths_to_terminal() {
        let bdd = two_var_diamond();
        let values = bdd_pass(&bdd, None, Some(&CountPaths));
        assert_eq!(1.0, values.bottom_up(bdd.terminal()));
        assert_eq!(3.0, values.bottom_up(bdd.root()));
    }

    #[test]
    fn both_directions_in_one_pass() {
        let bdd = two_var_diamond();
        let values = bdd_pass(&bdd, Some(&CountPaths), Some(&CountPaths));
        // every node: paths through it = td * bu
        let mid = bdd.layers[1][0];
        assert_eq!(1.0, values.top_down(mid));
        assert_eq!(2.0, values.bottom_up(mid));
    }

    #[test]
    #[should_panic(expected = "during DD construction")]
    fn full_pass_requires_a_constructed_diagram() {
        let mut bdd = two_var_diamond();
        bdd.constructed = false;
        let _ = bdd_pass(&bdd, Some(&CountPaths), None);
    }

    #[test]
    fn partial_pass_tolerates_unconstructed_diagrams() {
        let mut bdd = two_var_diamond();
        bdd.constructed = false;
        let values = bdd_partial_pass(&bdd, &CountPaths);
        assert_eq!(3.0, values.top_down(bdd.layers[2][0]));
    }
}
