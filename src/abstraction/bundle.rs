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

//! The contract of the external nonsmooth convex optimizer used by the bundle
//! variant of the Lagrangian cut. This crate only drives such an optimizer;
//! it does not implement one. The oracle (the piece *we* provide) evaluates
//! the Lagrangian subproblem at a multiplier vector and returns the value
//! together with one subgradient, in minimization form.

/// One oracle evaluation: the subproblem value at the queried multipliers and
/// a subgradient of the (convex) dual function at that point.
#[derive(Debug, Clone)]
pub struct BundleEval {
    pub objective: f64,
    pub subgradient: Vec<f64>,
}

/// The subproblem oracle handed to the optimizer at each descent step.
pub trait BundleOracle {
    fn evaluate(&mut self, multipliers: &[f64]) -> BundleEval;
}

/// The nonsmooth optimizer itself (an external collaborator). The driver
/// calls `init_problem` once, seeds the center, then alternates descent steps
/// until the optimizer reports a nonzero termination code or the time budget
/// runs out. The oracle is passed to every descent step rather than
/// registered up front.
pub trait BundleSolver {
    /// Set up a problem of the given dimension with box constraints on the
    /// multipliers.
    fn init_problem(&mut self, dim: usize, lower: &[f64], upper: &[f64]);

    /// Move the stability center to the given point.
    fn set_center(&mut self, center: &[f64]);

    /// Perform one descent step, calling the oracle as needed.
    fn do_descent_step(&mut self, oracle: &mut dyn BundleOracle);

    /// 0 while the optimizer wants to continue; anything else stops the
    /// driver loop.
    fn termination_code(&self) -> i32;

    /// The current stability center.
    fn get_center(&self) -> Vec<f64>;

    /// The dual objective value at the center.
    fn objective_value(&self) -> f64;
}
