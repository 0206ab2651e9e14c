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

//! Exact center of a decision diagram: the average, over all root-terminal
//! paths, of the characteristic vector of the path. Path counts overflow
//! native integers on realistic diagrams, so the counting is done in
//! arbitrary precision and the final division is a rational; the conversion
//! of each coordinate to `f64` is the only imprecision of the operation.

use crate::common::Error;
use crate::implementation::bdd::graph::Bdd;

#[cfg(feature = "center")]
impl<S> Bdd<S> {
    /// The center of the diagram, one coordinate in [0, 1] per layer:
    /// `center[l]` is the fraction of paths that take a 1-arc at layer `l`.
    pub fn center(&self) -> Result<Vec<f64>, Error> {
        use num_bigint::{BigInt, BigUint};
        use num_rational::Ratio;
        use num_traits::{ToPrimitive, Zero};

        use crate::common::ArcValue;

        let nvars = self.nb_vars();
        let root = self.root();
        let terminal = self.terminal();

        // Number of root-to-node paths.
        let mut top_down = vec![BigUint::zero(); self.slot_count()];
        top_down[root.0] = BigUint::from(1u32);
        for ids in self.layers.iter() {
            for &id in ids.iter() {
                for val in ArcValue::BOTH {
                    if let Some(child) = self.node(id).arc(val) {
                        let inc = top_down[id.0].clone();
                        top_down[child.0] += inc;
                    }
                }
            }
        }

        // Number of node-to-terminal paths.
        let mut bottom_up = vec![BigUint::zero(); self.slot_count()];
        bottom_up[terminal.0] = BigUint::from(1u32);
        for ids in self.layers.iter().rev() {
            for &id in ids.iter() {
                for val in ArcValue::BOTH {
                    if let Some(child) = self.node(id).arc(val) {
                        let inc = bottom_up[child.0].clone();
                        bottom_up[id.0] += inc;
                    }
                }
            }
        }

        assert_eq!(top_down[terminal.0], bottom_up[root.0]);
        let total_npaths = top_down[terminal.0].clone();

        let mut center = Vec::with_capacity(nvars);
        for ids in self.layers.iter().take(nvars) {
            let mut sum = BigUint::zero();
            for &id in ids.iter() {
                if let Some(child) = self.node(id).one_arc {
                    sum += &top_down[id.0] * &bottom_up[child.0];
                }
            }
            let frac = Ratio::new(BigInt::from(sum), BigInt::from(total_npaths.clone()));
            let coord = frac.to_f64().expect("center coordinate out of f64 range");
            assert!((0.0..=1.0).contains(&coord));
            center.push(coord);
        }
        Ok(center)
    }
}

#[cfg(not(feature = "center"))]
impl<S> Bdd<S> {
    /// The center of the diagram. Unavailable in this build: the operation
    /// requires the arbitrary precision support of the `center` feature.
    pub fn center(&self) -> Result<Vec<f64>, Error> {
        Err(Error::Unsupported(
            "computing the center of a decision diagram requires the `center` feature",
        ))
    }
}

#[cfg(all(test, feature = "center"))]
mod tests {
    use crate::common::{ArcValue, Variable};
    use crate::implementation::bdd::graph::Bdd;

    /// All four assignments of two variables.
    fn full_square() -> Bdd<usize> {
        let mut bdd: Bdd<usize> = Bdd::new(2);
        let root = bdd.create_node(0);
        let mid = bdd.create_node(1);
        let term = bdd.create_node(2);
        bdd.assign_arc(root, Some(mid), ArcValue::Zero);
        bdd.assign_arc(root, Some(mid), ArcValue::One);
        bdd.assign_arc(mid, Some(term), ArcValue::Zero);
        bdd.assign_arc(mid, Some(term), ArcValue::One);
        bdd.layer_to_var[0] = Some(Variable(0));
        bdd.layer_to_var[1] = Some(Variable(1));
        bdd.var_to_layer[0] = Some(0);
        bdd.var_to_layer[1] = Some(1);
        bdd.constructed = true;
        bdd
    }

    #[test]
    fn center_of_the_full_square_is_one_half() {
        let bdd = full_square();
        let center = bdd.center().unwrap();
        assert_eq!(vec![0.5, 0.5], center);
    }

    #[test]
    fn center_weights_paths_not_arcs() {
        // root --0--> a --{0,1}--> term   (two paths through a)
        // root --1--> b --0------> term   (one path through b)
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

        let center = bdd.center().unwrap();
        // 3 paths: 00, 01, 10. One third takes a 1 at layer 0; one third at
        // layer 1 (the product of the counts, not their sum).
        assert!((center[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((center[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!(center.iter().all(|c| (0.0..=1.0).contains(c)));
    }
}
