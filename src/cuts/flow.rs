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

//! Decomposition of an arc flow into root-terminal paths: iteratively
//! extract a positive-flow path (the lexicographically smallest one, or the
//! best one under given weights), deduct its bottleneck flow, and repeat
//! until no positive flow remains. Flow positivity is always tested at the
//! LP solver tolerance, not at the general epsilon: the flows come from the
//! solver and are only that accurate.

use crate::arith::{dbl_eq_tol, dbl_gt_tol, dbl_lt_tol, OPT_TOL};
use crate::common::ArcValue;
use crate::implementation::bdd::graph::{Bdd, NodeId};

/// Decompose the given flow into paths. Extraction uses the
/// lexicographically smallest positive-flow path when `weights` is `None`,
/// the longest path under the given (layer space) weights otherwise. The
/// flow vectors are consumed by the decomposition (all entries end up below
/// the solver tolerance). Returns the paths and their weights.
pub fn decompose_paths_from_flow<S>(
    bdd: &Bdd<S>,
    zero_arc_flow: &mut [Vec<f64>],
    one_arc_flow: &mut [Vec<f64>],
    weights: Option<&[f64]>,
) -> (Vec<Vec<u8>>, Vec<f64>) {
    let mut paths = vec![];
    let mut path_weights = vec![];

    loop {
        let (path_weight, path) = match weights {
            None => extract_lexmin_path_from_flow(bdd, zero_arc_flow, one_arc_flow),
            Some(weights) => {
                extract_optimal_path_from_flow(bdd, weights, zero_arc_flow, one_arc_flow)
            }
        };
        if path_weight <= 0.0 {
            break;
        }
        remove_path_from_flow(bdd, zero_arc_flow, one_arc_flow, &path, path_weight);
        paths.push(path);
        path_weights.push(path_weight);
    }

    (paths, path_weights)
}

/// Extract the lexicographically smallest path with positive flow, without
/// removing it; returns its bottleneck flow, or zero (and an all-zero path)
/// when no positive flow leaves the root. Long arcs are decoded as
/// (value, 0, ..., 0).
pub fn extract_lexmin_path_from_flow<S>(
    bdd: &Bdd<S>,
    zero_arc_flow: &[Vec<f64>],
    one_arc_flow: &[Vec<f64>],
) -> (f64, Vec<u8>) {
    // Initializing everything to zero implicitly decodes long arcs.
    let mut path = vec![0u8; bdd.nb_vars()];
    let mut path_weight = f64::INFINITY;

    let mut node = bdd.root();
    let terminal = bdd.terminal();

    // no positive flow at all?
    {
        let root = bdd.node(node);
        let zero_out = root
            .zero_arc
            .map_or(true, |_| dbl_eq_tol(zero_arc_flow[root.layer()][root.id()], 0.0, OPT_TOL));
        let one_out = root
            .one_arc
            .map_or(true, |_| dbl_eq_tol(one_arc_flow[root.layer()][root.id()], 0.0, OPT_TOL));
        if zero_out && one_out {
            return (0.0, path);
        }
    }

    while node != terminal {
        let current = bdd.node(node);
        let layer = current.layer();
        let id = current.id();

        if current.zero_arc.is_some() && dbl_gt_tol(zero_arc_flow[layer][id], 0.0, OPT_TOL) {
            let flow = zero_arc_flow[layer][id];
            path[layer] = 0;
            node = current.zero_arc.unwrap();
            if dbl_lt_tol(flow, path_weight, OPT_TOL) {
                path_weight = flow;
            }
        } else if current.one_arc.is_some() && dbl_gt_tol(one_arc_flow[layer][id], 0.0, OPT_TOL) {
            let flow = one_arc_flow[layer][id];
            path[layer] = 1;
            node = current.one_arc.unwrap();
            if dbl_lt_tol(flow, path_weight, OPT_TOL) {
                path_weight = flow;
            }
        } else {
            let inflow: f64 = current
                .zero_ancestors
                .iter()
                .map(|&p| zero_arc_flow[bdd.node(p).layer()][bdd.node(p).id()])
                .chain(
                    current
                        .one_ancestors
                        .iter()
                        .map(|&p| one_arc_flow[bdd.node(p).layer()][bdd.node(p).id()]),
                )
                .sum();
            eprintln!("Error: Flow decomposition reached a node with flow imbalance");
            eprintln!("       Layer: {layer} / Id: {id} / Inflow: {inflow}");
            return (0.0, path);
        }
    }

    (path_weight, path)
}

/// Extract the positive-flow path maximizing the given (layer space)
/// weights, without removing it; returns its bottleneck flow, or zero when
/// the terminal carries no positive flow.
pub fn extract_optimal_path_from_flow<S>(
    bdd: &Bdd<S>,
    weights: &[f64],
    zero_arc_flow: &[Vec<f64>],
    one_arc_flow: &[Vec<f64>],
) -> (f64, Vec<u8>) {
    assert_eq!(weights.len(), bdd.nb_vars());

    let mut value = vec![f64::NEG_INFINITY; bdd.slot_count()];
    let mut parent: Vec<Option<(NodeId, ArcValue)>> = vec![None; bdd.slot_count()];
    value[bdd.root().0] = 0.0;

    for (layer, ids) in bdd.layers.iter().enumerate() {
        for &id in ids.iter() {
            let node = bdd.node(id);
            let pos = node.id();
            if let Some(child) = node.zero_arc {
                if dbl_gt_tol(zero_arc_flow[layer][pos], 0.0, OPT_TOL)
                    && value[id.0] > value[child.0]
                {
                    value[child.0] = value[id.0];
                    parent[child.0] = Some((id, ArcValue::Zero));
                }
            }
            if let Some(child) = node.one_arc {
                if dbl_gt_tol(one_arc_flow[layer][pos], 0.0, OPT_TOL)
                    && value[id.0] + weights[layer] > value[child.0]
                {
                    value[child.0] = value[id.0] + weights[layer];
                    parent[child.0] = Some((id, ArcValue::One));
                }
            }
        }
    }

    let terminal = bdd.terminal();
    if parent[terminal.0].is_none() {
        return (0.0, vec![]);
    }

    let mut path = vec![0u8; bdd.nb_vars()];
    let mut path_weight = f64::INFINITY;
    let mut node = terminal;
    while let Some((up, val)) = parent[node.0] {
        let up_node = bdd.node(up);
        let flow = match val {
            ArcValue::Zero => zero_arc_flow[up_node.layer()][up_node.id()],
            ArcValue::One => one_arc_flow[up_node.layer()][up_node.id()],
        };
        if dbl_lt_tol(flow, path_weight, OPT_TOL) {
            path_weight = flow;
        }
        path[up_node.layer()] = val.index() as u8;
        node = up;
    }

    (path_weight, path)
}

/// Deduct `path_weight` units of flow along the given path, which must be
/// valid and carry at least that much flow on every arc.
pub fn remove_path_from_flow<S>(
    bdd: &Bdd<S>,
    zero_arc_flow: &mut [Vec<f64>],
    one_arc_flow: &mut [Vec<f64>],
    path: &[u8],
    path_weight: f64,
) {
    let mut node = bdd.root();
    let terminal = bdd.terminal();
    while node != terminal {
        let current = bdd.node(node);
        let layer = current.layer();
        let id = current.id();
        if path[layer] == 0 {
            let child = current.zero_arc.expect("infeasible path in path decomposition");
            debug_assert!(dbl_gt_tol(zero_arc_flow[layer][id], 0.0, OPT_TOL));
            zero_arc_flow[layer][id] -= path_weight;
            node = child;
        } else {
            let child = current.one_arc.expect("infeasible path in path decomposition");
            debug_assert!(dbl_gt_tol(one_arc_flow[layer][id], 0.0, OPT_TOL));
            one_arc_flow[layer][id] -= path_weight;
            node = child;
        }
    }
}

/// Enumerate every root-terminal path all of whose arcs carry positive flow
/// (depth-first with backtracking). Meant for inspection of small flows.
pub fn all_positive_flow_paths<S>(
    bdd: &Bdd<S>,
    zero_arc_flow: &[Vec<f64>],
    one_arc_flow: &[Vec<f64>],
) -> Vec<Vec<u8>> {
    let mut found = vec![];
    let terminal = bdd.terminal();
    let mut stack: Vec<(NodeId, Vec<u8>)> = vec![(bdd.root(), vec![0u8; bdd.nb_vars()])];

    while let Some((node, path)) = stack.pop() {
        if node == terminal {
            found.push(path);
            continue;
        }
        let current = bdd.node(node);
        let layer = current.layer();
        let id = current.id();
        // push the one branch first so the zero branch pops first
        if let Some(child) = current.one_arc {
            if dbl_gt_tol(one_arc_flow[layer][id], 0.0, OPT_TOL) {
                let mut next = path.clone();
                next[layer] = 1;
                stack.push((child, next));
            }
        }
        if let Some(child) = current.zero_arc {
            if dbl_gt_tol(zero_arc_flow[layer][id], 0.0, OPT_TOL) {
                let mut next = path.clone();
                next[layer] = 0;
                stack.push((child, next));
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Variable;

    /// A diagram whose three paths are 00, 01, 10 (two variables).
    fn three_paths() -> Bdd<usize> {
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

    /// A unit of flow on each of the three paths.
    fn unit_flows(bdd: &Bdd<usize>) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let zero = vec![vec![2.0], vec![1.0, 1.0], vec![0.0]];
        let one = vec![vec![1.0], vec![1.0, 0.0], vec![0.0]];
        let _ = bdd;
        (zero, one)
    }

    #[test]
    fn lexmin_follows_zero_arcs_first() {
        let bdd = three_paths();
        let (zero, one) = unit_flows(&bdd);
        let (weight, path) = extract_lexmin_path_from_flow(&bdd, &zero, &one);
        assert_eq!(1.0, weight);
        assert_eq!(vec![0, 0], path);
    }

    #[test]
    fn decomposition_extracts_all_paths_and_conserves_flow() {
        let bdd = three_paths();
        let (mut zero, mut one) = unit_flows(&bdd);
        let (paths, weights) = decompose_paths_from_flow(&bdd, &mut zero, &mut one, None);

        assert_eq!(3, paths.len());
        assert_eq!(vec![vec![0, 0], vec![0, 1], vec![1, 0]], paths);
        // conservation: total path weight equals the root outflow
        assert_eq!(3.0, weights.iter().sum::<f64>());
        // all residual flows are below the solver tolerance
        for flows in zero.iter().chain(one.iter()) {
            for &f in flows.iter() {
                assert!(dbl_eq_tol(f, 0.0, OPT_TOL));
            }
        }
    }

    #[test]
    fn weighted_extraction_prefers_the_heavy_path() {
        let bdd = three_paths();
        let (zero, one) = unit_flows(&bdd);
        let (weight, path) = extract_optimal_path_from_flow(&bdd, &[5.0, 1.0], &zero, &one);
        assert_eq!(1.0, weight);
        assert_eq!(vec![1, 0], path);
    }

    #[test]
    fn bottleneck_is_the_minimum_arc_flow() {
        let bdd = three_paths();
        let mut zero = vec![vec![0.5], vec![0.25, 0.0], vec![0.0]];
        let mut one = vec![vec![0.0], vec![0.25, 0.0], vec![0.0]];
        let (paths, weights) = decompose_paths_from_flow(&bdd, &mut zero, &mut one, None);
        assert_eq!(vec![vec![0, 0], vec![0, 1]], paths);
        assert_eq!(vec![0.25, 0.25], weights);
    }

    #[test]
    fn dfs_enumerates_positive_flow_paths() {
        let bdd = three_paths();
        let (zero, one) = unit_flows(&bdd);
        let paths = all_positive_flow_paths(&bdd, &zero, &one);
        assert_eq!(3, paths.len());
        assert!(paths.contains(&vec![0, 0]));
        assert!(paths.contains(&vec![0, 1]));
        assert!(paths.contains(&vec![1, 0]));
    }
}
