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

//! This module defines the most basic data types that are used throughout all
//! the code of our library: problem variables, arc labels, the global options
//! record and the library error type.

use std::fmt;
use std::path::PathBuf;

use derive_builder::Builder;

// ----------------------------------------------------------------------------
// --- VARIABLE ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes a variable from the optimization problem at hand.
/// Each variable is identified with an integer ranging from 0 until
/// `problem.nb_variables()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Variable(pub usize);
impl Variable {
    /// This function returns the id (numeric value) of the variable.
    #[inline]
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- ARC VALUE --------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The label of an arc of the decision diagram: each node has (at most) one
/// outgoing zero arc and one outgoing one arc, standing for the assignment of
/// the layer variable to 0 or 1.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ArcValue {
    Zero,
    One,
}

impl ArcValue {
    /// Both arc labels, in branching order.
    pub const BOTH: [ArcValue; 2] = [ArcValue::Zero, ArcValue::One];

    /// The numeric value of the assignment (0 or 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ArcValue::Zero => 0,
            ArcValue::One => 1,
        }
    }
    /// The numeric value of the assignment, as a float factor.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.index() as f64
    }
}

impl fmt::Display for ArcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// ----------------------------------------------------------------------------
// --- OPTIONS ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The global options driving a decision diagram construction. The width limit
/// itself is not part of this record: it belongs to the merger, since merging
/// is what enforces it.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct Options {
    /// Whether an arc may skip layers whose variable cannot change the state
    /// anyway (the skipped positions decode as implicit assignments).
    pub use_long_arcs: bool,
    /// Free the state of a node once its layer has been fully branched on, to
    /// reduce memory usage.
    pub delete_old_states: bool,
    /// Do not report per-layer construction progress on stdout.
    pub quiet: bool,
    /// Probability with which the randomized min-in-state ordering applies its
    /// heuristic choice (it picks uniformly at random otherwise).
    pub order_rand_min_state_prob: f64,
    /// Input file for the fixed variable ordering.
    pub fixed_order_file: Option<PathBuf>,
    /// Seed for every randomized component (orderings, mergers, perturbation).
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            use_long_arcs: true,
            delete_old_states: true,
            quiet: false,
            order_rand_min_state_prob: 0.8,
            fixed_order_file: Some(PathBuf::from("fixed_order.txt")),
            seed: 0,
        }
    }
}

// ----------------------------------------------------------------------------
// --- ERRORS -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The error type of the library. Contract violations (caller bugs) are not
/// represented here: those fail fast with a panic. Modeled infeasibility is
/// not an error either: it is conveyed by dropping arcs and by `None` results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid instance file: {0}")]
    Parse(String),
    #[error("cut LP ended with status {0}")]
    CutLp(String),
    #[error("{0}")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_id() {
        assert_eq!(0, Variable(0).id());
        assert_eq!(7, Variable(7).id());
    }

    #[test]
    fn arc_value_roundtrip() {
        assert_eq!(0, ArcValue::Zero.index());
        assert_eq!(1, ArcValue::One.index());
        assert_eq!(1.0, ArcValue::One.as_f64());
        assert_eq!("0", ArcValue::Zero.to_string());
    }

    #[test]
    fn default_options() {
        let opts = Options::default();
        assert!(opts.use_long_arcs);
        assert!(opts.delete_old_states);
        assert!(!opts.quiet);
    }

    #[test]
    fn options_builder() {
        let opts = OptionsBuilder::default()
            .use_long_arcs(false)
            .quiet(true)
            .build()
            .unwrap();
        assert!(!opts.use_long_arcs);
        assert!(opts.quiet);
        assert!(opts.delete_old_states);
    }
}
