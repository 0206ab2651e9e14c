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

//! Lagrangian cuts: any multiplier vector λ yields the valid inequality
//! `λ·x <= longest_path(λ)`. The subgradient variant walks the multipliers
//! toward the separating point until the inequality cuts it off; the bundle
//! variant delegates the same walk to an external nonsmooth optimizer.

use std::time::{Duration, Instant};

use crate::abstraction::{BundleEval, BundleOracle, BundleSolver};
use crate::cuts::inequality::Inequality;
use crate::implementation::bdd::graph::Bdd;

/// A cut is only worth emitting when it cuts the point off by more than
/// this. Coarser than the general epsilon, finer than nothing: this is the
/// threshold the original cut loop used, kept as-is.
pub const CUT_VIOLATION_TOL: f64 = 1e-5;

/// Simple subgradient iteration.
///
/// Let x be the fractional point to cut off. At iteration k, the tightest
/// cut with coefficients λ(k) has right-hand side `longest_path(λ(k))`; once
/// it is violated by x (and `iterations_beyond_validity` further iterations
/// have sharpened it), it is returned. The multipliers start at the
/// objective and move by `(x − x(k)) / (k+1)`, where x(k) is the optimal
/// path just found. Returns `None` when no valid cut is found within the
/// iteration limit. Everything is in layer space.
pub fn generate_lagrangian_cut_subgradient<S>(
    bdd: &Bdd<S>,
    x: &[f64],
    obj_layer: &[f64],
    iteration_limit: usize,
    iterations_beyond_validity: usize,
) -> Option<Inequality> {
    let nvars = bdd.nb_vars();
    assert_eq!(nvars, x.len());
    assert_eq!(nvars, obj_layer.len());

    let mut coeffs = obj_layer.to_vec();
    let mut cut_iterations = 0;

    for k in 0..iteration_limit {
        let (rhs, path) = bdd.optimal_path(&coeffs, true, false);
        let activity: f64 = coeffs.iter().zip(x.iter()).map(|(c, x)| c * x).sum();

        if activity > rhs + CUT_VIOLATION_TOL {
            if cut_iterations >= iterations_beyond_validity {
                return Some(Inequality::new(coeffs, rhs));
            }
            cut_iterations += 1;
        }

        for (i, coeff) in coeffs.iter_mut().enumerate() {
            *coeff += (x[i] - path[i] as f64) / (k + 1) as f64;
        }
    }

    None
}

/// The Lagrangian subproblem as an oracle for the bundle optimizer, in
/// minimization form: the value at λ is `longest_path(λ) − λ·x` and the
/// subgradient is `−(x − x(λ))`.
pub struct LagrangianCutOracle<'a, S> {
    bdd: &'a Bdd<S>,
    x_to_separate: Vec<f64>,
    nevals: usize,
}

impl<'a, S> LagrangianCutOracle<'a, S> {
    pub fn new(bdd: &'a Bdd<S>, x_to_separate: Vec<f64>) -> Self {
        LagrangianCutOracle { bdd, x_to_separate, nevals: 0 }
    }

    pub fn nevals(&self) -> usize {
        self.nevals
    }
}

impl<'a, S> BundleOracle for LagrangianCutOracle<'a, S> {
    fn evaluate(&mut self, multipliers: &[f64]) -> BundleEval {
        self.nevals += 1;
        let (rhs, path) = self.bdd.optimal_path(multipliers, true, false);
        let objective = rhs
            - multipliers
                .iter()
                .zip(self.x_to_separate.iter())
                .map(|(l, x)| l * x)
                .sum::<f64>();
        let subgradient = self
            .x_to_separate
            .iter()
            .zip(path.iter())
            .map(|(x, p)| -(x - *p as f64))
            .collect();
        BundleEval { objective, subgradient }
    }
}

/// Bundle variant: drive an external nonsmooth optimizer over the same
/// subproblem, with the multipliers boxed to [−1, 1] and the objective as
/// starting center. The loop stops on the optimizer's termination code, the
/// iteration limit, or the wall-clock budget; the cut is then read at the
/// final center (it is valid by construction, violated or not).
pub fn generate_lagrangian_cut_bundle<S, B: BundleSolver>(
    bdd: &Bdd<S>,
    x: &[f64],
    obj_layer: &[f64],
    solver: &mut B,
    iteration_limit: usize,
    time_limit: Duration,
) -> Inequality {
    let nvars = bdd.nb_vars();
    assert_eq!(nvars, x.len());
    assert_eq!(nvars, obj_layer.len());

    let lower = vec![-1.0; nvars];
    let upper = vec![1.0; nvars];
    solver.init_problem(nvars, &lower, &upper);
    solver.set_center(obj_layer);

    let mut oracle = LagrangianCutOracle::new(bdd, x.to_vec());
    let start = Instant::now();
    for _ in 0..iteration_limit {
        solver.do_descent_step(&mut oracle);
        if solver.termination_code() != 0 {
            break;
        }
        if start.elapsed() >= time_limit {
            break;
        }
    }

    let center = solver.get_center();
    let (rhs, _) = bdd.optimal_path(&center, true, false);
    Inequality::new(center, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ArcValue, Variable};

    /// The diagram of `x0 + x1 <= 1` over two variables: paths 00, 01, 10.
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

    #[test]
    fn subgradient_cut_separates_the_fractional_point() {
        let bdd = packing_dd();
        // (0.75, 0.75) violates x0 + x1 <= 1
        let x = [0.75, 0.75];
        let cut = generate_lagrangian_cut_subgradient(&bdd, &x, &[1.0, 1.0], 200, 0)
            .expect("a violated cut exists");
        // violated by x ...
        assert!(cut.violation(&x) > CUT_VIOLATION_TOL);
        // ... and valid for every path of the diagram
        for path in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0]] {
            assert!(cut.activity(&path) <= cut.rhs + 1e-9);
        }
    }

    #[test]
    fn subgradient_gives_up_on_interior_points() {
        let bdd = packing_dd();
        // (0.25, 0.25) is inside the hull: no valid cut can separate it
        let cut = generate_lagrangian_cut_subgradient(&bdd, &[0.25, 0.25], &[1.0, 1.0], 50, 0);
        assert!(cut.is_none());
    }

    /// A minimal projected-subgradient "bundle" solver for the tests.
    struct MockBundle {
        center: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        best: f64,
        iterations: usize,
    }

    impl MockBundle {
        fn new() -> Self {
            MockBundle { center: vec![], lower: vec![], upper: vec![], best: f64::INFINITY, iterations: 0 }
        }
    }

    impl BundleSolver for MockBundle {
        fn init_problem(&mut self, dim: usize, lower: &[f64], upper: &[f64]) {
            self.center = vec![0.0; dim];
            self.lower = lower.to_vec();
            self.upper = upper.to_vec();
        }
        fn set_center(&mut self, center: &[f64]) {
            self.center = center.to_vec();
        }
        fn do_descent_step(&mut self, oracle: &mut dyn BundleOracle) {
            self.iterations += 1;
            let eval = oracle.evaluate(&self.center);
            self.best = self.best.min(eval.objective);
            let step = 1.0 / self.iterations as f64;
            for ((c, g), (lo, hi)) in self
                .center
                .iter_mut()
                .zip(eval.subgradient.iter())
                .zip(self.lower.iter().zip(self.upper.iter()))
            {
                *c = (*c - step * g).clamp(*lo, *hi);
            }
        }
        fn termination_code(&self) -> i32 {
            if self.iterations >= 40 {
                1
            } else {
                0
            }
        }
        fn get_center(&self) -> Vec<f64> {
            self.center.clone()
        }
        fn objective_value(&self) -> f64 {
            self.best
        }
    }

    #[test]
    fn bundle_cut_is_always_valid() {
        let bdd = packing_dd();
        let x = [0.75, 0.75];
        let mut solver = MockBundle::new();
        let cut = generate_lagrangian_cut_bundle(
            &bdd,
            &x,
            &[1.0, 1.0],
            &mut solver,
            200,
            Duration::from_secs(60),
        );
        // the rhs is the longest path at the center: valid by construction
        for path in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0]] {
            assert!(cut.activity(&path) <= cut.rhs + 1e-9);
        }
        assert!(solver.iterations > 0);
    }
}
