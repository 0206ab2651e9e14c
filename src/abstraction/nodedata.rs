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

//! Auxiliary per-node user data carried through the construction of a
//! diagram. Unlike pass scratch, node data is computed *during* construction
//! and may affect the final diagram: a data entry may flag a node infeasible,
//! in which case the solver drops the in-arc. Data therefore knows how to
//! follow a transition and how to merge when nodes are merged (whether for
//! equivalence or for relaxation).

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::common::{ArcValue, Variable};
use crate::implementation::bdd::graph::Node;

/// One piece of user data attached to a node.
pub trait NodeData<S>: Debug {
    /// When true after a transition, the solver drops the arc that would have
    /// reached the node carrying this data.
    fn is_infeasible(&self) -> bool {
        false
    }

    /// The data of the child reached from `node` when assigning `value` to
    /// `var` and landing on `new_state`.
    fn transition(
        &self,
        node: &Node<S>,
        new_state: &S,
        var: Variable,
        value: ArcValue,
    ) -> Box<dyn NodeData<S>>;

    /// Merge `rhs` into this data; `state` is the state of the node `rhs`
    /// came from. This runs both on equivalence (same state reached twice)
    /// and on relaxation merges.
    fn merge(&mut self, rhs: &dyn NodeData<S>, state: &S);

    /// Downcasting support for comparators that need the concrete data type.
    fn as_any(&self) -> &dyn Any;
}

/// The set of data entries attached to one node, stored by string keys.
/// Within the same diagram every node carries the same set of keys: maps are
/// only ever seeded at the root and evolve through `transition`/`merge`.
#[derive(Debug)]
pub struct NodeDataMap<S> {
    map: BTreeMap<String, Box<dyn NodeData<S>>>,
}

impl<S> Default for NodeDataMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> NodeDataMap<S> {
    pub fn new() -> Self {
        NodeDataMap { map: BTreeMap::new() }
    }

    pub fn add(&mut self, key: impl Into<String>, data: Box<dyn NodeData<S>>) {
        self.map.insert(key.into(), data);
    }

    pub fn get(&self, key: &str) -> Option<&dyn NodeData<S>> {
        self.map.get(key).map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The data map of the child reached from `node` with the given decision.
    pub fn transition(
        &self,
        node: &Node<S>,
        new_state: &S,
        var: Variable,
        value: ArcValue,
    ) -> NodeDataMap<S> {
        let mut next = NodeDataMap::new();
        for (key, data) in self.map.iter() {
            next.map.insert(key.clone(), data.transition(node, new_state, var, value));
        }
        next
    }

    /// Merge `rhs` into this map, entry by entry. Both maps must carry the
    /// same keys (guaranteed when data is only seeded at the root).
    pub fn merge(&mut self, rhs: &NodeDataMap<S>, state: &S) {
        assert_eq!(self.map.len(), rhs.map.len());
        for (key, data) in self.map.iter_mut() {
            let other = rhs.map.get(key).expect("node data maps out of sync");
            data.merge(other.as_ref(), state);
        }
    }

    /// True when at least one entry flags the node infeasible.
    pub fn is_infeasible(&self) -> bool {
        self.map.values().any(|d| d.is_infeasible())
    }
}
