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

//! The binary program instance: sparse rows (constraints) over 0/1 variables
//! and the variable-to-row cross index used by propagation.

use std::fmt;

/// The sense of a linear constraint.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RowSense {
    Le,
    Ge,
}

/// A sparse linear constraint over the binary variables.
#[derive(Debug, Clone)]
pub struct BpRow {
    pub rhs: f64,
    pub sense: RowSense,
    /// Coefficients, parallel to `ind`.
    pub coeffs: Vec<f64>,
    /// Variable indices of the nonzero coefficients.
    pub ind: Vec<usize>,
    pub kind: &'static str,
}

impl BpRow {
    pub fn new(sense: RowSense, rhs: f64, ind: Vec<usize>, coeffs: Vec<f64>) -> Self {
        assert_eq!(ind.len(), coeffs.len());
        BpRow { rhs, sense, coeffs, ind, kind: "linear" }
    }

    pub fn nnonz(&self) -> usize {
        self.ind.len()
    }

    /// The minimum value the left-hand side can take over binary
    /// assignments.
    pub fn min_activity(&self) -> f64 {
        self.coeffs.iter().filter(|c| **c < 0.0).sum()
    }

    /// The maximum value the left-hand side can take over binary
    /// assignments.
    pub fn max_activity(&self) -> f64 {
        self.coeffs.iter().filter(|c| **c > 0.0).sum()
    }

    /// The coefficient of the given variable (zero when absent). Linear
    /// search.
    pub fn coeff_of(&self, var: usize) -> f64 {
        match self.ind.iter().position(|&i| i == var) {
            Some(i) => self.coeffs[i],
            None => 0.0,
        }
    }
}

impl fmt::Display for BpRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (coeff, ind) in self.coeffs.iter().zip(self.ind.iter()) {
            write!(f, " + {coeff}<x{ind}>")?;
        }
        match self.sense {
            RowSense::Le => write!(f, " <= ")?,
            RowSense::Ge => write!(f, " >= ")?,
        }
        write!(f, "{} ", self.rhs)
    }
}

/// A binary variable: its objective coefficient and the rows it appears in.
#[derive(Debug, Clone)]
pub struct BpVar {
    /// Objective coefficient (we maximize).
    pub obj: f64,
    /// Indices of the rows this variable has a nonzero coefficient in.
    pub rows: Vec<usize>,
    /// The coefficient in each of those rows, parallel to `rows`.
    pub row_coeffs: Vec<f64>,
    pub index: usize,
}

impl BpVar {
    pub fn new(obj: f64, index: usize) -> Self {
        BpVar { obj, rows: vec![], row_coeffs: vec![], index }
    }

    /// Populate `rows` and `row_coeffs` from the full row set.
    pub fn init_rows(&mut self, all_rows: &[BpRow]) {
        self.rows.clear();
        self.row_coeffs.clear();
        for (i, row) in all_rows.iter().enumerate() {
            if let Some(j) = row.ind.iter().position(|&v| v == self.index) {
                self.rows.push(i);
                self.row_coeffs.push(row.coeffs[j]);
            }
        }
    }
}

/// A binary program: maximize `obj · x` subject to the rows, `x` binary.
pub struct BpInstance {
    pub vars: Vec<BpVar>,
    pub rows: Vec<BpRow>,
    pub weights: Vec<f64>,
}

impl BpInstance {
    pub fn new(mut vars: Vec<BpVar>, rows: Vec<BpRow>) -> Self {
        for var in vars.iter_mut() {
            var.init_rows(&rows);
        }
        let weights = vars.iter().map(|v| v.obj).collect();
        BpInstance { vars, rows, weights }
    }

    pub fn nvars(&self) -> usize {
        self.vars.len()
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }
}
