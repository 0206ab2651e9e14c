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

//! # DDCUT
//! DDCUT compiles *relaxed* binary decision diagrams for 0/1 integer
//! programs and turns them into strong dual bounds and cutting planes. You
//! describe your problem as a state transition system (see [Problem]): a
//! state, a `transition` taking a 0/1 decision, and a `merge_states`
//! relaxation that replaces two states by one standing for everything
//! feasible from either. The construction engine then unrolls the diagram
//! layer by layer, merging nodes whenever a layer outgrows the width limit,
//! so that every feasible point of your problem remains a root-terminal
//! path of the diagram.
//!
//! From the compiled diagram you can extract:
//! - the longest path, a dual bound on the objective;
//! - *target cuts*: valid inequalities separating a fractional point,
//!   obtained from the polar LP of the hull over-approximation (requires
//!   the `highs` feature);
//! - *Lagrangian cuts*, by subgradient iteration over path costs or through
//!   an external bundle optimizer;
//! - the exact *center* of the diagram, an interior point of the hull
//!   over-approximation (requires the `center` feature);
//! - *flow decompositions* of arc flows into paths.
//!
//! Two problems ship with the library: the maximum independent set over
//! DIMACS graphs and binary programs read from MPS files (see
//! [mod@problems]).
//!
//! ## Quick example
//! Compiling the (exact) diagram of the independent set problem on a
//! triangle, whose bound is 1:
//!
//! ```
//! use ddcut::*;
//! use ddcut::problems::indepset::*;
//!
//! let mut graph = Graph::new(3);
//! graph.add_edge(0, 1);
//! graph.add_edge(1, 2);
//! graph.add_edge(0, 2);
//!
//! let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(graph));
//! let mut ordering = NoOrdering;
//! let options = OptionsBuilder::default().quiet(true).build().unwrap();
//!
//! let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
//! let bdd = solver.compile().expect("the problem is feasible");
//!
//! assert_eq!(1.0, bdd.bound);
//! assert!(bdd.integrity_check());
//! ```

mod arith;
mod common;
mod abstraction;
mod implementation;
pub mod cuts;
pub mod problems;

pub use arith::*;
pub use common::*;
pub use abstraction::*;
pub use implementation::*;
pub use cuts::*;
