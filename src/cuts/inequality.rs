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

//! A linear inequality `coeffs · x <= rhs`.

#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    pub coeffs: Vec<f64>,
    pub rhs: f64,
}

impl Inequality {
    pub fn new(coeffs: Vec<f64>, rhs: f64) -> Self {
        Inequality { coeffs, rhs }
    }

    /// The left-hand side value at the given point.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coeffs.iter().zip(x.iter()).map(|(c, x)| c * x).sum()
    }

    /// By how much the given point violates the inequality (positive means
    /// violated).
    pub fn violation(&self, x: &[f64]) -> f64 {
        self.activity(x) - self.rhs
    }
}
