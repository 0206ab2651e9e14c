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

//! Information extracted about a generated cut: the per-arc dual flows of
//! the cut LP, the distance and angle helpers, and the passes computing
//! per-node distances or dot products with respect to a point.

use crate::arith::{dbl_eq, dbl_lt};
use crate::abstraction::PassFunc;
use crate::common::{ArcValue, Variable};
use crate::cuts::inequality::Inequality;
use crate::implementation::bdd::graph::{Bdd, Node};

/// Per-arc dual flows of the cut LP: `zero_arc_flow[layer][id]` is the flow
/// of the zero arc leaving node (layer, id), and similarly for one arcs.
/// Together they define a root-to-terminal flow whose value matches the cut
/// violation.
#[derive(Debug, Clone, Default)]
pub struct CutInfo {
    pub zero_arc_flow: Vec<Vec<f64>>,
    pub one_arc_flow: Vec<Vec<f64>>,
}

impl CutInfo {
    /// An all-zero flow shaped after the given diagram.
    pub fn shaped_after<S>(bdd: &Bdd<S>) -> Self {
        CutInfo {
            zero_arc_flow: bdd.layers.iter().map(|l| vec![0.0; l.len()]).collect(),
            one_arc_flow: bdd.layers.iter().map(|l| vec![0.0; l.len()]).collect(),
        }
    }
}

/// Blend the point to separate toward the objective direction before
/// handing it to a cut generator: `x <- (1 - alpha) x + alpha w`, both in
/// layer space. With `alpha = 0` the point is untouched; with `alpha = 1`
/// the cut aims straight along the objective.
pub fn blend_toward_objective(x: &mut [f64], weights_layer: &[f64], alpha: f64) {
    assert!((0.0..=1.0).contains(&alpha));
    assert_eq!(x.len(), weights_layer.len());
    for (x, w) in x.iter_mut().zip(weights_layer.iter()) {
        *x = (1.0 - alpha) * *x + alpha * w;
    }
}

/// The Euclidean distance between the hyperplane of an inequality and a
/// point (the "distance cut off", or efficacy, of a cut).
pub fn distance_hyperplane_point(inequality: &Inequality, x: &[f64]) -> f64 {
    assert_eq!(x.len(), inequality.coeffs.len());
    let norm: f64 = inequality.coeffs.iter().map(|c| c * c).sum();
    (inequality.activity(x) - inequality.rhs).abs() / norm.sqrt()
}

/// The cosine of the angle between (the normal vectors of) two
/// inequalities. With `include_rhs`, the right-hand sides participate as an
/// extra coordinate.
pub fn cos_angle_inequalities(ineq1: &Inequality, ineq2: &Inequality, include_rhs: bool) -> f64 {
    assert_eq!(ineq1.coeffs.len(), ineq2.coeffs.len());
    let mut dp: f64 = ineq1.coeffs.iter().zip(ineq2.coeffs.iter()).map(|(a, b)| a * b).sum();
    let mut norm1: f64 = ineq1.coeffs.iter().map(|c| c * c).sum();
    let mut norm2: f64 = ineq2.coeffs.iter().map(|c| c * c).sum();
    if include_rhs {
        dp += ineq1.rhs * ineq2.rhs;
        norm1 += ineq1.rhs * ineq1.rhs;
        norm2 += ineq2.rhs * ineq2.rhs;
    }
    dp / (norm1.sqrt() * norm2.sqrt())
}

/// The angle between (the normal vectors of) two inequalities.
pub fn angle_inequalities(ineq1: &Inequality, ineq2: &Inequality, include_rhs: bool) -> f64 {
    let cos = cos_angle_inequalities(ineq1, ineq2, include_rhs);
    if dbl_eq(cos, 1.0) {
        0.0
    } else {
        cos.acos()
    }
}

/// Pass storing, at each node, the minimum partial distance from the paths
/// reaching it to a given point (Manhattan or squared Euclidean terms).
pub struct MinDistanceToPointPass {
    point: Vec<f64>,
    /// The point is indexed by layer when true, by variable otherwise.
    layer_space: bool,
    manhattan: bool,
}

impl MinDistanceToPointPass {
    pub fn new(point: Vec<f64>, layer_space: bool, manhattan: bool) -> Self {
        MinDistanceToPointPass { point, layer_space, manhattan }
    }
}

impl<S> PassFunc<S> for MinDistanceToPointPass {
    fn start_val(&self) -> f64 {
        0.0
    }

    fn init_val(&self) -> f64 {
        f64::INFINITY // minimum
    }

    fn apply(
        &self,
        layer: usize,
        var: Variable,
        arc_val: ArcValue,
        source_val: f64,
        target_val: f64,
        _source: &Node<S>,
        _target: Option<&Node<S>>,
    ) -> f64 {
        let idx = if self.layer_space { layer } else { var.id() };
        let gap = self.point[idx] - arc_val.as_f64();
        let distance = source_val + if self.manhattan { gap.abs() } else { gap * gap };
        if dbl_lt(distance, target_val) {
            distance
        } else {
            target_val
        }
    }
}

/// Pass storing, at each node, the minimum partial dot product between the
/// paths reaching it and a given point.
pub struct MinDotProductToPointPass {
    point: Vec<f64>,
    /// The point is indexed by layer when true, by variable otherwise.
    layer_space: bool,
}

impl MinDotProductToPointPass {
    pub fn new(point: Vec<f64>, layer_space: bool) -> Self {
        MinDotProductToPointPass { point, layer_space }
    }
}

impl<S> PassFunc<S> for MinDotProductToPointPass {
    fn start_val(&self) -> f64 {
        0.0
    }

    fn init_val(&self) -> f64 {
        f64::INFINITY // minimum
    }

    fn apply(
        &self,
        layer: usize,
        var: Variable,
        arc_val: ArcValue,
        source_val: f64,
        target_val: f64,
        _source: &Node<S>,
        _target: Option<&Node<S>>,
    ) -> f64 {
        let idx = if self.layer_space { layer } else { var.id() };
        let prod = source_val + self.point[idx] * arc_val.as_f64();
        if dbl_lt(prod, target_val) {
            prod
        } else {
            target_val
        }
    }
}
