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

//! Variable orderings specific to binary programs.

use crate::abstraction::VarOrdering;
use crate::common::Variable;
use crate::problems::bp::instance::BpInstance;
use crate::problems::bp::state::BpState;

/// Cuthill-McKee bandwidth reduction over the conflict graph of the
/// two-variable rows (all other rows are ignored). Variables appearing in no
/// pair row are placed first, then the Cuthill-McKee order of the rest: a
/// breadth-first sweep started at a minimum degree vertex, visiting
/// neighbors in increasing degree order.
pub struct CuthillMcKeePairOrdering {
    v_in_layer: Vec<Variable>,
}

impl CuthillMcKeePairOrdering {
    pub fn new(inst: &BpInstance) -> Self {
        // build the pair graph over the variables that occur in 2-var rows
        let mut graph_to_var: Vec<usize> = vec![];
        let mut var_to_graph: Vec<Option<usize>> = vec![None; inst.nvars()];
        for row in inst.rows.iter() {
            if row.nnonz() == 2 {
                for &v in row.ind.iter() {
                    if var_to_graph[v].is_none() {
                        var_to_graph[v] = Some(graph_to_var.len());
                        graph_to_var.push(v);
                    }
                }
            }
        }
        let n = graph_to_var.len();
        let mut adj: Vec<Vec<usize>> = vec![vec![]; n];
        for row in inst.rows.iter() {
            if row.nnonz() == 2 {
                let a = var_to_graph[row.ind[0]].unwrap();
                let b = var_to_graph[row.ind[1]].unwrap();
                if a != b && !adj[a].contains(&b) {
                    adj[a].push(b);
                    adj[b].push(a);
                }
            }
        }

        // breadth-first sweeps from minimum degree starting vertices
        let degree: Vec<usize> = adj.iter().map(|l| l.len()).collect();
        let mut visited = vec![false; n];
        let mut perm: Vec<usize> = Vec::with_capacity(n);
        loop {
            let start = (0..n)
                .filter(|&v| !visited[v])
                .min_by_key(|&v| degree[v]);
            let Some(start) = start else { break };
            visited[start] = true;
            perm.push(start);
            let mut head = perm.len() - 1;
            while head < perm.len() {
                let v = perm[head];
                let mut neighbors: Vec<usize> =
                    adj[v].iter().copied().filter(|&w| !visited[w]).collect();
                neighbors.sort_by_key(|&w| degree[w]);
                for w in neighbors {
                    visited[w] = true;
                    perm.push(w);
                }
                head += 1;
            }
        }

        // variables outside any pair row come first, then the permutation
        let mut v_in_layer: Vec<Variable> = (0..inst.nvars())
            .filter(|&v| var_to_graph[v].is_none())
            .map(Variable)
            .collect();
        v_in_layer.extend(perm.into_iter().map(|g| Variable(graph_to_var[g])));
        CuthillMcKeePairOrdering { v_in_layer }
    }
}

impl VarOrdering<BpState> for CuthillMcKeePairOrdering {
    fn name(&self) -> &'static str {
        "cuthill-mckee"
    }
    fn select_next_var(&mut self, layer: usize) -> Variable {
        self.v_in_layer[layer]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::bp::instance::{BpRow, BpVar, RowSense};

    #[test]
    fn covers_every_variable_once() {
        // pair rows chaining 0-1-2, variable 3 in a wide row only
        let rows = vec![
            BpRow::new(RowSense::Le, 1.0, vec![0, 1], vec![1.0, 1.0]),
            BpRow::new(RowSense::Le, 1.0, vec![1, 2], vec![1.0, 1.0]),
            BpRow::new(RowSense::Le, 2.0, vec![0, 1, 3], vec![1.0, 1.0, 1.0]),
        ];
        let vars = (0..4).map(|i| BpVar::new(1.0, i)).collect();
        let inst = BpInstance::new(vars, rows);
        let mut ordering = CuthillMcKeePairOrdering::new(&inst);
        let mut seen = vec![false; 4];
        for layer in 0..4 {
            let v = ordering.select_next_var(layer);
            assert!(!seen[v.id()]);
            seen[v.id()] = true;
        }
        assert!(seen.iter().all(|s| *s));
        // variable 3 sits in no pair row, so it comes first
        assert_eq!(Variable(3), ordering.v_in_layer[0]);
    }

    #[test]
    fn chain_stays_consecutive() {
        let rows = vec![
            BpRow::new(RowSense::Le, 1.0, vec![0, 1], vec![1.0, 1.0]),
            BpRow::new(RowSense::Le, 1.0, vec![1, 2], vec![1.0, 1.0]),
            BpRow::new(RowSense::Le, 1.0, vec![2, 3], vec![1.0, 1.0]),
        ];
        let vars = (0..4).map(|i| BpVar::new(1.0, i)).collect();
        let inst = BpInstance::new(vars, rows);
        let mut ordering = CuthillMcKeePairOrdering::new(&inst);
        let order: Vec<usize> = (0..4).map(|l| ordering.select_next_var(l).id()).collect();
        // a path graph in Cuthill-McKee order is traversed end to end
        assert!(order == vec![0, 1, 2, 3] || order == vec![3, 2, 1, 0]);
    }
}
