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

//! Longest (and shortest) path computation over a diagram, and detection of
//! the layers whose arcs all carry the same label. The auxiliary per-node
//! values (accumulated value, back pointer) live in side tables local to the
//! computation.

use crate::arith::dbl_eq;
use crate::common::ArcValue;
use crate::implementation::bdd::graph::{Bdd, NodeId};

impl<S> Bdd<S> {
    /// The optimal path using `coeffs_layer` as 1-arc weights and zero for
    /// every 0-arc. Input and output are in layer space. Returns the value
    /// and the path (one 0/1 entry per layer); an empty path and ±∞ when the
    /// terminal is unreachable.
    pub fn optimal_path(
        &self,
        coeffs_layer: &[f64],
        maximize: bool,
        ignore_relaxed_nodes: bool,
    ) -> (f64, Vec<u8>) {
        let zero = vec![0.0; coeffs_layer.len()];
        self.optimal_path_zero_one(&zero, coeffs_layer, maximize, ignore_relaxed_nodes)
    }

    /// The optimal solution using `coeffs_var` as 1-arc weights. Input and
    /// output are in variable space (weights and the returned assignment are
    /// indexed by problem variable).
    pub fn optimal_sol(
        &self,
        coeffs_var: &[f64],
        maximize: bool,
        ignore_relaxed_nodes: bool,
    ) -> (f64, Vec<u8>) {
        let one = self.to_layer_space(coeffs_var);
        let (value, path) = self.optimal_path(&one, maximize, ignore_relaxed_nodes);
        if path.is_empty() {
            return (value, path);
        }
        let mut sol = vec![0; path.len()];
        for (layer, v) in path.iter().enumerate() {
            sol[self.var_at(layer).id()] = *v;
        }
        (value, sol)
    }

    /// The optimal path using separate weights for 0-arcs and 1-arcs, both
    /// in layer space. When `ignore_relaxed_nodes` is set, relaxed nodes are
    /// never used as a source of relaxation, which restricts the sweep to
    /// exact paths; the terminal may then be unreachable.
    pub fn optimal_path_zero_one(
        &self,
        zero_coeffs: &[f64],
        one_coeffs: &[f64],
        maximize: bool,
        ignore_relaxed_nodes: bool,
    ) -> (f64, Vec<u8>) {
        let nvars = self.nb_vars();
        assert_eq!(zero_coeffs.len(), nvars);
        assert_eq!(one_coeffs.len(), nvars);

        let worst = if maximize { f64::NEG_INFINITY } else { f64::INFINITY };
        let mut value = vec![worst; self.slot_count()];
        let mut parent: Vec<Option<(NodeId, ArcValue)>> = vec![None; self.slot_count()];

        let initial_layer = self.root_layer();
        value[self.root().0] = 0.0;

        for (layer, ids) in self.layers.iter().enumerate() {
            for &id in ids.iter() {
                if ignore_relaxed_nodes && self.node(id).relaxed {
                    continue;
                }
                for val in ArcValue::BOTH {
                    if let Some(child) = self.node(id).arc(val) {
                        let coeff = match val {
                            ArcValue::Zero => zero_coeffs[layer],
                            ArcValue::One => one_coeffs[layer],
                        };
                        let relaxed = value[id.0] + coeff;
                        let improves = if maximize {
                            relaxed > value[child.0]
                        } else {
                            relaxed < value[child.0]
                        };
                        if improves {
                            value[child.0] = relaxed;
                            parent[child.0] = Some((id, val));
                        }
                    }
                }
            }
        }

        let terminal = self.layers[self.layers.len() - 1][0];
        if parent[terminal.0].is_none() {
            // unreachable, e.g. due to pruning plus skipping relaxed nodes
            return (worst, vec![]);
        }

        // Long arcs: skipped positions stay zero.
        let mut path = vec![0u8; nvars];
        let mut node = terminal;
        while let Some((up, val)) = parent[node.0] {
            path[self.node(up).layer()] = val.index() as u8;
            node = up;
        }
        assert_eq!(self.node(node).layer(), initial_layer);

        let optimal_value = value[terminal.0];
        debug_assert!(dbl_eq(
            path_value(zero_coeffs, one_coeffs, &path),
            optimal_value
        ));
        (optimal_value, path)
    }

    /// The layers whose outgoing arcs all carry label 0 (resp. all carry
    /// label 1). A long arc counts as a 0-arc for every layer it skips, even
    /// when it is a 1-arc (the 1 sits on its first position only).
    pub fn identify_fixed_layers(&self) -> (Vec<usize>, Vec<usize>) {
        let nvars = self.nb_vars();
        let mut found_zero = vec![false; nvars];
        let mut found_one = vec![false; nvars];

        for (layer, ids) in self.layers.iter().enumerate().take(nvars) {
            for &id in ids.iter() {
                let node = self.node(id);
                if let Some(child) = node.zero_arc {
                    found_zero[layer] = true;
                    for skipped in found_zero
                        .iter_mut()
                        .take(self.node(child).layer())
                        .skip(layer + 1)
                    {
                        *skipped = true;
                    }
                }
                if let Some(child) = node.one_arc {
                    found_one[layer] = true;
                    for skipped in found_zero
                        .iter_mut()
                        .take(self.node(child).layer())
                        .skip(layer + 1)
                    {
                        *skipped = true;
                    }
                }
            }
        }

        let mut fixed_to_zero = vec![];
        let mut fixed_to_one = vec![];
        for layer in 0..nvars {
            assert!(found_zero[layer] || found_one[layer]);
            if !found_zero[layer] {
                fixed_to_one.push(layer);
            }
            if !found_one[layer] {
                fixed_to_zero.push(layer);
            }
        }
        (fixed_to_zero, fixed_to_one)
    }
}

/// The value of a path under the given per-layer arc weights.
pub fn path_value(zero_coeffs: &[f64], one_coeffs: &[f64], path: &[u8]) -> f64 {
    path.iter()
        .enumerate()
        .map(|(layer, v)| if *v == 1 { one_coeffs[layer] } else { zero_coeffs[layer] })
        .sum()
}
