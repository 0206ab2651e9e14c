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

//! Tolerant floating point comparisons. Two tolerance regimes coexist in this
//! crate: the general epsilon used for any value we computed ourselves, and
//! the coarser optimality tolerance used for values coming back from the LP
//! solver (duals, flows), which match the solver's own default tolerance.

/// General purpose comparison tolerance.
pub const EPSILON: f64 = 1e-9;

/// Optimality tolerance of the LP solver. Residuals and dual values read back
/// from a solved LP are only accurate up to this tolerance, so any test on
/// such a value must use it instead of [EPSILON].
pub const OPT_TOL: f64 = 1e-6;

#[inline]
pub fn dbl_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
#[inline]
pub fn dbl_ge(a: f64, b: f64) -> bool {
    a >= b - EPSILON
}
#[inline]
pub fn dbl_le(a: f64, b: f64) -> bool {
    a <= b + EPSILON
}
#[inline]
pub fn dbl_gt(a: f64, b: f64) -> bool {
    a > b + EPSILON
}
#[inline]
pub fn dbl_lt(a: f64, b: f64) -> bool {
    a < b - EPSILON
}

#[inline]
pub fn dbl_eq_tol(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
#[inline]
pub fn dbl_gt_tol(a: f64, b: f64, tol: f64) -> bool {
    a > b + tol
}
#[inline]
pub fn dbl_lt_tol(a: f64, b: f64, tol: f64) -> bool {
    a < b - tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_tolerant() {
        assert!(dbl_eq(1.0, 1.0 + 1e-10));
        assert!(dbl_eq(1.0, 1.0 - 1e-10));
        assert!(!dbl_eq(1.0, 1.0 + 1e-8));
    }

    #[test]
    fn strict_comparisons_need_a_real_gap() {
        assert!(!dbl_gt(1.0 + 1e-10, 1.0));
        assert!(dbl_gt(1.0 + 1e-8, 1.0));
        assert!(!dbl_lt(1.0 - 1e-10, 1.0));
        assert!(dbl_lt(1.0 - 1e-8, 1.0));
    }

    #[test]
    fn loose_comparisons_absorb_the_tolerance() {
        assert!(dbl_ge(1.0 - 1e-10, 1.0));
        assert!(dbl_le(1.0 + 1e-10, 1.0));
    }

    #[test]
    fn solver_tolerance_is_coarser() {
        // 1e-7 is zero for the LP solver but not for us
        assert!(dbl_eq_tol(1e-7, 0.0, OPT_TOL));
        assert!(!dbl_eq(1e-7, 0.0));
        assert!(dbl_gt_tol(1e-5, 0.0, OPT_TOL));
    }
}
