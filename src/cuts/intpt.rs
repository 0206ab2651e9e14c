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

//! Interior point selection for target cuts. The target cut LP needs a
//! point in the relative interior of the convex hull over-approximation to
//! normalize against; these selectors supply one.

use crate::common::Error;
use crate::implementation::bdd::graph::Bdd;

/// The available interior point selectors, by the ids the command line
/// exposes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InteriorPoint {
    /// The origin (id 0). An interior point of down-monotone sets only.
    Zero,
    /// The all-ones point (id 1).
    One,
    /// The uniform point `1/(2n)` (id 2), interior for independent set
    /// polytopes.
    IndepSet,
    /// The exact center of the decision diagram (id 3, the default).
    DdCenter,
}

impl InteriorPoint {
    pub fn from_id(id: usize) -> Option<Self> {
        match id {
            0 => Some(InteriorPoint::Zero),
            1 => Some(InteriorPoint::One),
            2 => Some(InteriorPoint::IndepSet),
            3 => Some(InteriorPoint::DdCenter),
            _ => None,
        }
    }
}

/// Compute the selected interior point, in layer space (the uniform
/// selectors are invariant under the layer permutation; the center is
/// computed per layer already).
pub fn select_interior_point<S>(which: InteriorPoint, bdd: &Bdd<S>) -> Result<Vec<f64>, Error> {
    let nvars = bdd.nb_vars();
    match which {
        InteriorPoint::Zero => Ok(vec![0.0; nvars]),
        InteriorPoint::One => Ok(vec![1.0; nvars]),
        InteriorPoint::IndepSet => Ok(vec![1.0 / (2.0 * nvars as f64); nvars]),
        InteriorPoint::DdCenter => bdd.center(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ArcValue;

    #[test]
    fn ids_map_like_the_command_line() {
        assert_eq!(Some(InteriorPoint::Zero), InteriorPoint::from_id(0));
        assert_eq!(Some(InteriorPoint::DdCenter), InteriorPoint::from_id(3));
        assert_eq!(None, InteriorPoint::from_id(4));
    }

    #[test]
    fn uniform_points_have_the_right_magnitude() {
        let mut bdd: Bdd<usize> = Bdd::new(4);
        let root = bdd.create_node(0);
        let term = bdd.create_node(4);
        bdd.assign_arc(root, Some(term), ArcValue::Zero);
        let point = select_interior_point(InteriorPoint::IndepSet, &bdd).unwrap();
        assert_eq!(vec![0.125; 4], point);
        let zero = select_interior_point(InteriorPoint::Zero, &bdd).unwrap();
        assert_eq!(vec![0.0; 4], zero);
    }
}
