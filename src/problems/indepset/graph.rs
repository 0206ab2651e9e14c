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

//! A simple undirected graph that assumes vertices and edges are never
//! removed once inserted. It keeps a redundant representation as adjacency
//! bitmasks and adjacency lists, for fast adjacency checks and fast
//! iteration respectively. Includes the DIMACS edge-list reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bit_set::BitSet;

use crate::common::Error;

#[derive(Debug, Clone)]
pub struct Graph {
    /// Adjacency bitmask per vertex.
    adj: Vec<BitSet>,
    /// Adjacency list per vertex.
    pub adj_list: Vec<Vec<usize>>,
    pub n_vertices: usize,
    pub n_edges: usize,
}

impl Graph {
    pub fn new(n_vertices: usize) -> Self {
        Graph {
            adj: vec![BitSet::with_capacity(n_vertices); n_vertices],
            adj_list: vec![vec![]; n_vertices],
            n_vertices,
            n_edges: 0,
        }
    }

    pub fn is_adj(&self, i: usize, j: usize) -> bool {
        self.adj[i].contains(j)
    }

    pub fn add_edge(&mut self, i: usize, j: usize) {
        if i == j || self.adj[i].contains(j) {
            return;
        }
        self.adj[i].insert(j);
        self.adj[j].insert(i);
        self.adj_list[i].push(j);
        self.adj_list[j].push(i);
        self.n_edges += 1;
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adj_list[v].len()
    }

    pub fn density(&self) -> f64 {
        self.n_edges as f64 / (self.n_vertices * (self.n_vertices - 1) / 2) as f64
    }

    /// Read a graph in DIMACS edge-list format: a `p edge V E` header,
    /// `e u v` edge lines with 1-based vertices, `c` comment lines.
    pub fn read_dimacs(path: &Path) -> Result<Graph, Error> {
        let file = BufReader::new(File::open(path)?);
        let mut graph: Option<Graph> = None;

        for line in file.lines() {
            let line = line?;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("c") | None => continue,
                Some("p") => {
                    let kind = tokens.next().unwrap_or("");
                    if kind != "edge" && kind != "col" {
                        return Err(Error::Parse(format!("unsupported DIMACS problem `{kind}`")));
                    }
                    let n = parse_usize(tokens.next(), "vertex count")?;
                    let _m = parse_usize(tokens.next(), "edge count")?;
                    graph = Some(Graph::new(n));
                }
                Some("e") => {
                    let graph = graph
                        .as_mut()
                        .ok_or_else(|| Error::Parse("edge before `p` header".to_string()))?;
                    let u = parse_usize(tokens.next(), "edge endpoint")?;
                    let v = parse_usize(tokens.next(), "edge endpoint")?;
                    if u == 0 || v == 0 || u > graph.n_vertices || v > graph.n_vertices {
                        return Err(Error::Parse(format!("edge ({u},{v}) out of range")));
                    }
                    graph.add_edge(u - 1, v - 1);
                }
                Some(_) => continue,
            }
        }

        graph.ok_or_else(|| Error::Parse("missing `p edge` header".to_string()))
    }
}

fn parse_usize(token: Option<&str>, what: &str) -> Result<usize, Error> {
    token
        .ok_or_else(|| Error::Parse(format!("missing {what}")))?
        .parse::<usize>()
        .map_err(|_| Error::Parse(format!("invalid {what}")))
}
