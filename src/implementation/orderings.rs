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

//! General purpose variable orderings (problem-specific orderings live with
//! their problem), and the generic completion bound.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::abstraction::{CompletionBound, Problem, VarOrdering};
use crate::common::{Error, Variable};

/// Branch on the variables in their natural order: layer k decides
/// variable k.
pub struct NoOrdering;

impl<S> VarOrdering<S> for NoOrdering {
    fn name(&self) -> &'static str {
        "no-ordering"
    }
    fn select_next_var(&mut self, layer: usize) -> Variable {
        Variable(layer)
    }
}

/// An ordering read from a file (one variable index per layer, whitespace
/// separated) or supplied directly.
pub struct FixedOrdering {
    v_in_layer: Vec<Variable>,
}

impl FixedOrdering {
    pub fn new(v_in_layer: Vec<Variable>) -> Self {
        FixedOrdering { v_in_layer }
    }

    pub fn from_file(path: &Path, nvars: usize) -> Result<Self, Error> {
        let file = BufReader::new(File::open(path)?);
        let mut v_in_layer = vec![];
        for line in file.lines() {
            for token in line?.split_whitespace() {
                let var = token
                    .parse::<usize>()
                    .map_err(|_| Error::Parse(format!("invalid ordering entry `{token}`")))?;
                v_in_layer.push(Variable(var));
            }
        }
        if v_in_layer.len() != nvars {
            return Err(Error::Parse(format!(
                "ordering file lists {} variables, expected {nvars}",
                v_in_layer.len()
            )));
        }
        Ok(FixedOrdering { v_in_layer })
    }
}

impl<S> VarOrdering<S> for FixedOrdering {
    fn name(&self) -> &'static str {
        "fixed"
    }
    fn select_next_var(&mut self, layer: usize) -> Variable {
        self.v_in_layer[layer]
    }
}

/// A uniformly random (but seed-reproducible) ordering.
pub struct RandomOrdering {
    v_in_layer: Vec<Variable>,
}

impl RandomOrdering {
    pub fn new(nvars: usize, seed: u64) -> Self {
        let mut v_in_layer: Vec<Variable> = (0..nvars).map(Variable).collect();
        v_in_layer.shuffle(&mut StdRng::seed_from_u64(seed));
        RandomOrdering { v_in_layer }
    }
}

impl<S> VarOrdering<S> for RandomOrdering {
    fn name(&self) -> &'static str {
        "random"
    }
    fn select_next_var(&mut self, layer: usize) -> Variable {
        self.v_in_layer[layer]
    }
}

/// Use the number of remaining layers as completion bound. Only sensible for
/// binary problems with objective (1,...,1). The bound cannot account for
/// the exact layer the child will land in (long arcs and dynamic orderings
/// make that unknowable here), so it counts from the parent.
pub struct NumberOfRemainingLayersBound;

impl<P: Problem> CompletionBound<P> for NumberOfRemainingLayersBound {
    fn dual_bound(&self, prob: &P, _state: &P::State, parent_layer: usize) -> f64 {
        (prob.nb_variables() - (parent_layer + 1)) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_is_the_identity() {
        let mut ordering = NoOrdering;
        assert_eq!(Variable(0), VarOrdering::<usize>::select_next_var(&mut ordering, 0));
        assert_eq!(Variable(4), VarOrdering::<usize>::select_next_var(&mut ordering, 4));
    }

    #[test]
    fn random_order_is_a_permutation() {
        let mut ordering = RandomOrdering::new(10, 0);
        let mut seen = vec![false; 10];
        for layer in 0..10 {
            let v = VarOrdering::<usize>::select_next_var(&mut ordering, layer);
            assert!(!seen[v.id()]);
            seen[v.id()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn random_order_is_reproducible() {
        let mut a = RandomOrdering::new(16, 42);
        let mut b = RandomOrdering::new(16, 42);
        for layer in 0..16 {
            assert_eq!(
                VarOrdering::<usize>::select_next_var(&mut a, layer),
                VarOrdering::<usize>::select_next_var(&mut b, layer)
            );
        }
    }
}
