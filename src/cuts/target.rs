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

//! The target cut: given a point x to separate and an interior point p of
//! the hull over-approximation represented by the diagram, the polar LP
//!
//! ```text
//!   max  u · (x − p)
//!   s.t. v_child − v_node        <= 0   for every 0-arc
//!        v_child − v_node + u_l  <= 0   for every 1-arc at layer l
//!        v_root = 1 + u · p,  v_terminal = 0
//! ```
//!
//! yields the valid inequality `u · y <= 1 + u · p`, violated by x whenever
//! the optimum exceeds 1. The optimum is an extreme ray of a face, not
//! necessarily a facet; the optional perturbation passes tighten it into an
//! extreme point (exactly, coordinate by coordinate, or in probability with
//! one random re-solve). Everything is in layer space.

use highs::{HighsModelStatus, RowProblem, Sense};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::arith::EPSILON;
use crate::common::{ArcValue, Error};
use crate::cuts::info::CutInfo;
use crate::cuts::inequality::Inequality;
use crate::implementation::bdd::graph::Bdd;

/// Half width of the objective band the iterative perturbation restricts
/// the face to, and of the freeze interval around a solved coordinate.
const PERTURBATION_BAND: f64 = 1e-5;

/// Magnitude of the uniform noise added by the random perturbation.
const RANDOM_PERTURBATION_MAGNITUDE: f64 = 1e-4;

/// How the LP optimum is perturbed toward a facet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Perturbation {
    #[default]
    None,
    /// Fix the objective exactly, add signed random noise to it, re-solve
    /// once.
    Random,
    /// Fix the objective to a narrow band, then maximize and freeze each
    /// coordinate in turn.
    Iterative,
}

/// Parameters of the target cut generation.
#[derive(Debug, Clone)]
pub struct TargetCutParams {
    pub perturbation: Perturbation,
    /// A coordinate frozen by the iterative perturbation snaps to exactly
    /// zero when its solved value is this close to it.
    pub snap_tol: f64,
    /// Seed of the random perturbation.
    pub seed: u64,
    /// Also read back the arc duals (the flow of the cut).
    pub want_cut_info: bool,
}

impl Default for TargetCutParams {
    fn default() -> Self {
        TargetCutParams {
            perturbation: Perturbation::None,
            snap_tol: EPSILON,
            seed: 0,
            want_cut_info: false,
        }
    }
}

/// Generate a cut separating `x` from the set of paths of the diagram,
/// normalized at the interior point. All input is in layer space. Returns
/// the inequality and, if requested, the per-arc dual flows of the last LP
/// solve.
pub fn generate_bdd_inequality<S>(
    bdd: &Bdd<S>,
    x: &[f64],
    interior_point: &[f64],
    params: &TargetCutParams,
) -> Result<(Inequality, Option<CutInfo>), Error> {
    let nvars = bdd.nb_vars();
    assert_eq!(nvars, x.len());
    assert_eq!(nvars, interior_point.len());

    let direction: Vec<f64> = x.iter().zip(interior_point.iter()).map(|(x, p)| x - p).collect();
    let lp = CutLp { bdd, interior_point };

    let no_bounds: Vec<Option<(f64, f64)>> = vec![None; nvars];
    let first = lp.solve(&direction, None, &no_bounds)?;
    let bound: f64 = direction.iter().zip(first.u.iter()).map(|(d, u)| d * u).sum();

    let last = match params.perturbation {
        Perturbation::None => first,
        Perturbation::Iterative => {
            let band = (bound - PERTURBATION_BAND, bound + PERTURBATION_BAND);
            let mut fixed: Vec<Option<(f64, f64)>> = vec![None; nvars];
            let mut last = first;
            for k in 0..nvars {
                let mut objective = vec![0.0; nvars];
                objective[k] = 1.0;
                let step = lp.solve(&objective, Some((&direction, band)), &fixed)?;
                if k != nvars - 1 {
                    let val = step.u[k];
                    if val.abs() <= params.snap_tol {
                        fixed[k] = Some((0.0, 0.0));
                    } else {
                        fixed[k] = Some((val - PERTURBATION_BAND, val + PERTURBATION_BAND));
                    }
                }
                last = step;
            }
            last
        }
        Perturbation::Random => {
            let mut rng = StdRng::seed_from_u64(params.seed);
            let mut objective = Vec::with_capacity(nvars);
            for &d in direction.iter() {
                let pert = (rng.gen::<f64>() - 0.5) * 2.0 * RANDOM_PERTURBATION_MAGNITUDE;
                let coeff = if d + pert < 0.0 { d - pert } else { d + pert };
                objective.push(coeff);
            }
            lp.solve(&objective, Some((&direction, (bound, bound))), &no_bounds)?
        }
    };

    let rhs = 1.0
        + last
            .u
            .iter()
            .zip(interior_point.iter())
            .map(|(u, p)| u * p)
            .sum::<f64>();
    let cut = Inequality::new(last.u, rhs);

    let info = params.want_cut_info.then(|| CutInfo {
        zero_arc_flow: last.zero_flow,
        one_arc_flow: last.one_flow,
    });
    Ok((cut, info))
}

struct LpOutcome {
    u: Vec<f64>,
    zero_flow: Vec<Vec<f64>>,
    one_flow: Vec<Vec<f64>>,
}

struct CutLp<'a, S> {
    bdd: &'a Bdd<S>,
    interior_point: &'a [f64],
}

impl<'a, S> CutLp<'a, S> {
    /// Build and solve the polar LP with the given objective over u, an
    /// optional band constraint `lo <= d·u <= hi`, and per-coordinate
    /// bounds on u. The HiGHS binding does not support editing a solved
    /// model, so every perturbation step rebuilds it; the model is small
    /// compared to the solve anyway.
    fn solve(
        &self,
        objective: &[f64],
        band: Option<(&[f64], (f64, f64))>,
        u_bounds: &[Option<(f64, f64)>],
    ) -> Result<LpOutcome, Error> {
        let bdd = self.bdd;
        let nvars = bdd.nb_vars();
        let free = f64::NEG_INFINITY..=f64::INFINITY;

        let mut model = RowProblem::default().optimise(Sense::Maximise);
        model.set_option("output_flag", false);
        model.set_option("parallel", "off");
        model.set_option("threads", 1);

        let mut u_cols = Vec::with_capacity(nvars);
        for (i, obj) in objective.iter().enumerate() {
            let bounds = match u_bounds[i] {
                Some((lo, hi)) => lo..=hi,
                None => free.clone(),
            };
            u_cols.push(model.add_col(*obj, bounds, []));
        }

        let mut v_cols = Vec::with_capacity(bdd.layers.len());
        for ids in bdd.layers.iter() {
            let mut layer_cols = Vec::with_capacity(ids.len());
            for _ in ids.iter() {
                layer_cols.push(model.add_col(0.0, free.clone(), []));
            }
            v_cols.push(layer_cols);
        }

        // one row per arc; remember which arc each row stands for
        let mut arc_rows: Vec<(usize, usize, ArcValue)> = vec![];
        for (layer, ids) in bdd.layers.iter().enumerate().take(nvars) {
            for (pos, &id) in ids.iter().enumerate() {
                let node = bdd.node(id);
                for val in ArcValue::BOTH {
                    if let Some(child) = node.arc(val) {
                        let child = bdd.node(child);
                        let mut entries = vec![
                            (v_cols[child.layer()][child.id()], 1.0),
                            (v_cols[layer][pos], -1.0),
                        ];
                        if val == ArcValue::One {
                            entries.push((u_cols[layer], 1.0));
                        }
                        model.add_row(..=0.0, entries);
                        arc_rows.push((layer, pos, val));
                    }
                }
            }
        }

        // v_root - u·p = 1   and   v_terminal = 0
        let mut root_entries = vec![(v_cols[bdd.root_layer()][0], 1.0)];
        for (i, &p) in self.interior_point.iter().enumerate() {
            if p != 0.0 {
                root_entries.push((u_cols[i], -p));
            }
        }
        model.add_row(1.0..=1.0, root_entries);
        model.add_row(0.0..=0.0, [(v_cols[bdd.terminal_layer()][0], 1.0)]);

        if let Some((direction, (lo, hi))) = band {
            let entries: Vec<_> = direction
                .iter()
                .enumerate()
                .filter(|(_, d)| **d != 0.0)
                .map(|(i, &d)| (u_cols[i], d))
                .collect();
            model.add_row(lo..=hi, entries);
        }

        let solved = model.solve();
        if solved.status() != HighsModelStatus::Optimal {
            return Err(Error::CutLp(format!("{:?}", solved.status())));
        }
        let solution = solved.get_solution();

        // u columns were added first
        let u: Vec<f64> = solution.columns()[..nvars].to_vec();

        // the arc rows were added first as well; their duals are the flow
        let duals = solution.dual_rows();
        let mut zero_flow: Vec<Vec<f64>> = bdd.layers.iter().map(|l| vec![0.0; l.len()]).collect();
        let mut one_flow: Vec<Vec<f64>> = bdd.layers.iter().map(|l| vec![0.0; l.len()]).collect();
        for (row, &(layer, pos, val)) in arc_rows.iter().enumerate() {
            match val {
                ArcValue::Zero => zero_flow[layer][pos] = duals[row],
                ArcValue::One => one_flow[layer][pos] = duals[row],
            }
        }

        // HiGHS reports the duals of the maximization as-is; normalize the
        // sign so the arc flows are nonnegative (the root outflow decides).
        let root = bdd.node(bdd.root());
        let outflow = zero_flow[root.layer()][root.id()] + one_flow[root.layer()][root.id()];
        if outflow < 0.0 {
            for flows in zero_flow.iter_mut().chain(one_flow.iter_mut()) {
                for f in flows.iter_mut() {
                    *f = -*f;
                }
            }
        }

        Ok(LpOutcome { u, zero_flow, one_flow })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::OPT_TOL;
    use crate::common::Variable;
    use crate::cuts::flow::decompose_paths_from_flow;

    /// The diagram of `x0 + x1 <= 1`: paths 00, 01, 10.
    fn packing_dd() -> Bdd<usize> {
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

    const PATHS: [[f64; 2]; 3] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0]];

    #[test]
    fn cut_separates_the_fractional_point() {
        let bdd = packing_dd();
        let x = [0.75, 0.75];
        let p = [0.25, 0.25];
        let (cut, _) =
            generate_bdd_inequality(&bdd, &x, &p, &TargetCutParams::default()).unwrap();

        // violated by x
        assert!(cut.violation(&x) > OPT_TOL);
        // valid for every path
        for path in PATHS {
            assert!(cut.activity(&path) <= cut.rhs + OPT_TOL);
        }
    }

    #[test]
    fn interior_points_cannot_be_separated() {
        let bdd = packing_dd();
        let x = [0.2, 0.2];
        let p = [0.25, 0.25];
        let (cut, _) =
            generate_bdd_inequality(&bdd, &x, &p, &TargetCutParams::default()).unwrap();
        // the LP is feasible but the best "cut" does not cut x off
        assert!(cut.violation(&x) <= OPT_TOL);
    }

    #[test]
    fn duals_define_a_decomposable_flow() {
        let bdd = packing_dd();
        let x = [0.75, 0.75];
        let p = [0.25, 0.25];
        let params = TargetCutParams { want_cut_info: true, ..Default::default() };
        let (_, info) = generate_bdd_inequality(&bdd, &x, &p, &params).unwrap();
        let mut info = info.unwrap();

        // all flows nonnegative (up to the solver tolerance)
        for flows in info.zero_arc_flow.iter().chain(info.one_arc_flow.iter()) {
            for &f in flows.iter() {
                assert!(f >= -OPT_TOL);
            }
        }

        // the flow decomposes completely into paths of the diagram
        let root = bdd.node(bdd.root());
        let total = info.zero_arc_flow[0][root.id()] + info.one_arc_flow[0][root.id()];
        let (paths, weights) = decompose_paths_from_flow(
            &bdd,
            &mut info.zero_arc_flow,
            &mut info.one_arc_flow,
            None,
        );
        assert!(!paths.is_empty());
        assert!((weights.iter().sum::<f64>() - total).abs() <= 1e-4);
    }

    #[test]
    fn iterative_perturbation_keeps_validity_and_violation() {
        let bdd = packing_dd();
        let x = [0.75, 0.75];
        let p = [0.25, 0.25];
        let params = TargetCutParams {
            perturbation: Perturbation::Iterative,
            ..Default::default()
        };
        let (cut, _) = generate_bdd_inequality(&bdd, &x, &p, &params).unwrap();
        assert!(cut.violation(&x) > OPT_TOL);
        for path in PATHS {
            assert!(cut.activity(&path) <= cut.rhs + 1e-4);
        }
    }

    #[test]
    fn random_perturbation_keeps_validity_and_violation() {
        let bdd = packing_dd();
        let x = [0.75, 0.75];
        let p = [0.25, 0.25];
        let params = TargetCutParams {
            perturbation: Perturbation::Random,
            ..Default::default()
        };
        let (cut, _) = generate_bdd_inequality(&bdd, &x, &p, &params).unwrap();
        assert!(cut.violation(&x) > OPT_TOL);
        for path in PATHS {
            assert!(cut.activity(&path) <= cut.rhs + 1e-4);
        }
    }
}
