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

//! The independent set instance: a graph, vertex weights, and the
//! precomputed complement adjacency masks used by the state transition.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bit_set::BitSet;

use crate::common::Error;
use crate::problems::indepset::graph::Graph;

pub struct IndepSetInstance {
    pub graph: Graph,
    /// Vertex weights (the objective).
    pub weights: Vec<f64>,
    /// For each vertex, the complement of its (closed) neighborhood: the
    /// mask of the vertices that remain selectable once the vertex is taken.
    pub adj_mask_compl: Vec<BitSet>,
}

impl IndepSetInstance {
    pub fn nvars(&self) -> usize {
        self.graph.n_vertices
    }

    /// Build an instance from a graph with unit weights.
    pub fn from_graph(graph: Graph) -> Self {
        let weights = vec![1.0; graph.n_vertices];
        Self::from_graph_weighted(graph, weights)
    }

    pub fn from_graph_weighted(graph: Graph, weights: Vec<f64>) -> Self {
        assert_eq!(graph.n_vertices, weights.len());
        let n = graph.n_vertices;
        let mut adj_mask_compl = Vec::with_capacity(n);
        for v in 0..n {
            let mut mask: BitSet = (0..n).collect();
            for w in 0..n {
                if graph.is_adj(v, w) {
                    mask.remove(w);
                }
            }
            // a vertex is adjacent to itself
            mask.remove(v);
            adj_mask_compl.push(mask);
        }
        IndepSetInstance { graph, weights, adj_mask_compl }
    }

    /// Read a DIMACS instance, with an optional file of per-vertex weights
    /// (whitespace separated, defaults to unit weights).
    pub fn read_dimacs(path: &Path, weights_file: Option<&Path>) -> Result<Self, Error> {
        let graph = Graph::read_dimacs(path)?;
        let mut instance = Self::from_graph(graph);
        if let Some(weights_file) = weights_file {
            let file = BufReader::new(File::open(weights_file)?);
            let mut weights = vec![];
            for line in file.lines() {
                for token in line?.split_whitespace() {
                    let w = token
                        .parse::<f64>()
                        .map_err(|_| Error::Parse(format!("invalid weight `{token}`")))?;
                    weights.push(w);
                }
            }
            if weights.len() != instance.nvars() {
                return Err(Error::Parse(format!(
                    "weights file lists {} weights, expected {}",
                    weights.len(),
                    instance.nvars()
                )));
            }
            instance.weights = weights;
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_masks_exclude_the_neighborhood() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        let inst = IndepSetInstance::from_graph(g);
        // taking vertex 1 leaves only vertex 3 selectable
        assert!(!inst.adj_mask_compl[1].contains(0));
        assert!(!inst.adj_mask_compl[1].contains(1));
        assert!(!inst.adj_mask_compl[1].contains(2));
        assert!(inst.adj_mask_compl[1].contains(3));
    }
}
