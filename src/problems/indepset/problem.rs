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

//! The independent set problem: taking a vertex removes it and its whole
//! neighborhood from the selectable set; leaving it out removes the vertex
//! alone. The relaxation of two states is their union.

use crate::abstraction::Problem;
use crate::common::{ArcValue, Variable};
use crate::problems::indepset::instance::IndepSetInstance;
use crate::problems::indepset::state::IndepSetState;

pub struct IndepSetProblem {
    pub instance: IndepSetInstance,
}

impl IndepSetProblem {
    pub fn new(instance: IndepSetInstance) -> Self {
        IndepSetProblem { instance }
    }
}

impl Problem for IndepSetProblem {
    type State = IndepSetState;

    fn nb_variables(&self) -> usize {
        self.instance.nvars()
    }

    fn weights(&self) -> &[f64] {
        &self.instance.weights
    }

    fn initial_state(&self) -> IndepSetState {
        IndepSetState::new((0..self.instance.nvars()).collect())
    }

    fn transition(
        &self,
        state: &IndepSetState,
        var: Variable,
        value: ArcValue,
    ) -> Option<IndepSetState> {
        let v = var.id();
        if value == ArcValue::One && !state.contains(v) {
            return None;
        }
        let mut next = state.clone();
        next.sel.remove(v);
        if value == ArcValue::One {
            next.sel.intersect_with(&self.instance.adj_mask_compl[v]);
        }
        Some(next)
    }

    fn merge_states(&self, state: &mut IndepSetState, other: &IndepSetState) {
        state.sel.union_with(&other.sel);
    }

    fn skip_var_for_long_arc(&self, var: Variable, state: &mut IndepSetState) -> bool {
        // the vertex cannot be used anyway: only a 0-arc could leave here
        !state.contains(var.id())
    }

    fn expect_single_terminal(&self) -> bool {
        // the final state is always the empty set
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::indepset::graph::Graph;

    fn path_graph() -> IndepSetProblem {
        // 0 - 1 - 2
        let mut g = Graph::new(3);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        IndepSetProblem::new(IndepSetInstance::from_graph(g))
    }

    #[test]
    fn taking_a_vertex_removes_its_neighborhood() {
        let pb = path_graph();
        let s0 = pb.initial_state();
        let s1 = pb.transition(&s0, Variable(1), ArcValue::One).unwrap();
        assert_eq!(0, s1.size());
    }

    #[test]
    fn leaving_a_vertex_out_removes_it_alone() {
        let pb = path_graph();
        let s0 = pb.initial_state();
        let s1 = pb.transition(&s0, Variable(1), ArcValue::Zero).unwrap();
        assert_eq!(2, s1.size());
        assert!(s1.contains(0) && s1.contains(2));
    }

    #[test]
    fn taking_an_unavailable_vertex_is_infeasible() {
        let pb = path_graph();
        let s0 = pb.initial_state();
        let s1 = pb.transition(&s0, Variable(0), ArcValue::One).unwrap();
        assert!(pb.transition(&s1, Variable(1), ArcValue::One).is_none());
    }

    #[test]
    fn merge_takes_the_union() {
        let pb = path_graph();
        let s0 = pb.initial_state();
        let mut a = pb.transition(&s0, Variable(0), ArcValue::One).unwrap(); // {2}
        let b = pb.transition(&s0, Variable(0), ArcValue::Zero).unwrap(); // {1,2}
        pb.merge_states(&mut a, &b);
        assert_eq!(2, a.size());
    }

    #[test]
    fn skips_unavailable_vertices_for_long_arcs() {
        let pb = path_graph();
        let s0 = pb.initial_state();
        let mut s1 = pb.transition(&s0, Variable(0), ArcValue::One).unwrap(); // {2}
        assert!(pb.skip_var_for_long_arc(Variable(1), &mut s1));
        assert!(!pb.skip_var_for_long_arc(Variable(2), &mut s1));
    }
}
