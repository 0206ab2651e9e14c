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

//! End to end scenarios over the two shipped problems: exact and relaxed
//! compilations, the relaxed envelope property, cuts and flow
//! decompositions on small instances whose answers are known by hand.

use ddcut::problems::bp::{BinaryProblem, BpInstance, BpRow, BpVar, LinearConsProp, RowSense};
use ddcut::problems::indepset::{Graph, IndepSetInstance, IndepSetProblem};
use ddcut::*;

fn quiet(long_arcs: bool) -> Options {
    OptionsBuilder::default()
        .quiet(true)
        .use_long_arcs(long_arcs)
        .build()
        .unwrap()
}

/// Check that the 0/1 assignment (in layer space) is a root-terminal path
/// of the diagram, decoding long arcs as (value, 0, ..., 0).
fn path_exists<S>(bdd: &Bdd<S>, assignment: &[u8]) -> bool {
    let mut node = bdd.root();
    let terminal = bdd.terminal();
    while node != terminal {
        let layer = bdd.node(node).layer();
        let val = if assignment[layer] == 1 { ArcValue::One } else { ArcValue::Zero };
        let Some(child) = bdd.node(node).arc(val) else { return false };
        for skipped in layer + 1..bdd.node(child).layer() {
            if assignment[skipped] != 0 {
                return false;
            }
        }
        node = child;
    }
    true
}

fn triangle() -> Graph {
    let mut g = Graph::new(3);
    g.add_edge(0, 1);
    g.add_edge(1, 2);
    g.add_edge(0, 2);
    g
}

fn four_path() -> Graph {
    let mut g = Graph::new(4);
    g.add_edge(0, 1);
    g.add_edge(1, 2);
    g.add_edge(2, 3);
    g
}

/// x0 + x1 <= 1, x0 + x2 <= 1, maximize x0 + x1 + x2.
fn packing_instance() -> BpInstance {
    let rows = vec![
        BpRow::new(RowSense::Le, 1.0, vec![0, 1], vec![1.0, 1.0]),
        BpRow::new(RowSense::Le, 1.0, vec![0, 2], vec![1.0, 1.0]),
    ];
    let vars = vec![BpVar::new(1.0, 0), BpVar::new(1.0, 1), BpVar::new(1.0, 2)];
    BpInstance::new(vars, rows)
}

const PACKING_FEASIBLE: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
];

fn compile_packing() -> Bdd<ddcut::problems::bp::BpState> {
    let mut problem = BinaryProblem::new(packing_instance(), vec![Box::new(LinearConsProp)]);
    let mut ordering = NoOrdering;
    let options = quiet(true);
    let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
    solver.compile().expect("feasible")
}

// ---------------------------------------------------------------------------
// scenario 1: independent set on the triangle, unlimited width
// ---------------------------------------------------------------------------

#[test]
fn triangle_exact_bound_is_one() {
    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(triangle()));
    let mut ordering = NoOrdering;
    let options = quiet(false);
    let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
    let bdd = solver.compile().expect("feasible");

    assert_eq!(1.0, bdd.bound);
    assert!(solver.final_width <= 2);
    assert!(bdd.integrity_check());

    let (value, sol) = bdd.optimal_sol(&[1.0, 1.0, 1.0], true, false);
    assert_eq!(1.0, value);
    assert_eq!(1u8, sol.iter().sum::<u8>());

    // round trip of the translation maps
    for var in 0..3 {
        assert_eq!(var, bdd.var_at(bdd.layer_of(Variable(var))).id());
    }
}

#[test]
fn triangle_long_arcs_agree_on_the_bound() {
    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(triangle()));
    let mut ordering = NoOrdering;
    let options = quiet(true);
    let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
    let bdd = solver.compile().expect("feasible");
    assert_eq!(1.0, bdd.bound);
    assert!(bdd.integrity_check());
    // every feasible independent set remains a path
    for sol in [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]] {
        assert!(path_exists(&bdd, &sol));
    }
}

// ---------------------------------------------------------------------------
// scenario 2: independent set on the 4-vertex path, unlimited width
// ---------------------------------------------------------------------------

#[test]
fn four_path_exact_bound_is_two() {
    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(four_path()));
    let mut ordering = NoOrdering;
    let options = quiet(false);
    let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
    let bdd = solver.compile().expect("feasible");

    assert_eq!(2.0, bdd.bound);
    let (value, sol) = bdd.optimal_sol(&[1.0; 4], true, false);
    assert_eq!(2.0, value);
    assert_eq!(2u8, sol.iter().sum::<u8>());
    // the solution is an independent set of the path 0-1-2-3
    for v in 0..3 {
        assert!(!(sol[v] == 1 && sol[v + 1] == 1));
    }
}

// ---------------------------------------------------------------------------
// scenario 3: triangle with width 1, relaxation
// ---------------------------------------------------------------------------

#[test]
fn relaxed_triangle_is_a_valid_envelope() {
    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(triangle()));
    let mut ordering = NoOrdering;
    let mut merger = MinLongestPathMerger { width: 1 };
    let options = quiet(false);
    let mut solver =
        DdSolver::new(&mut problem, &mut ordering, &options).with_merger(&mut merger);
    let bdd = solver.compile().expect("feasible");

    assert!(solver.final_width <= 1);
    assert!(bdd.layers.iter().all(|l| l.len() <= 1));
    // a survivor of the merge is marked relaxed
    assert!(bdd
        .layers
        .iter()
        .flatten()
        .any(|&id| bdd.node(id).relaxed));
    // the bound is a valid upper bound, possibly weakened by relaxation
    assert!(bdd.bound >= 1.0 && bdd.bound <= 3.0);
    // relaxed envelope: every feasible point remains a path
    for sol in [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]] {
        assert!(path_exists(&bdd, &sol));
    }
    assert!(bdd.integrity_check());
}

// ---------------------------------------------------------------------------
// scenario 4: the small binary program
// ---------------------------------------------------------------------------

#[test]
fn packing_program_bound_is_two() {
    let bdd = compile_packing();
    assert_eq!(2.0, bdd.bound);
    assert!(bdd.integrity_check());
    // equivalence merging keeps the diagram small
    assert!(bdd.width() <= 3);
    // the diagram is exact: its paths are exactly the feasible points
    for point in PACKING_FEASIBLE {
        let sol: Vec<u8> = point.iter().map(|&x| x as u8).collect();
        assert!(path_exists(&bdd, &sol));
    }
    for infeasible in [[1u8, 1, 0], [1, 0, 1], [1, 1, 1]] {
        assert!(!path_exists(&bdd, &infeasible));
    }
}

#[cfg(feature = "center")]
#[test]
fn packing_center_lies_strictly_inside() {
    let bdd = compile_packing();
    let center = bdd.center().unwrap();
    // 5 paths; one takes x0, two take x1, two take x2
    assert!((center[0] - 0.2).abs() < 1e-12);
    assert!((center[1] - 0.4).abs() < 1e-12);
    assert!((center[2] - 0.4).abs() < 1e-12);
    assert!(center.iter().all(|c| (0.0..=1.0).contains(c)));
}

// ---------------------------------------------------------------------------
// scenario 5: target cut separating the fractional point
// ---------------------------------------------------------------------------

#[cfg(all(feature = "highs", feature = "center"))]
#[test]
fn target_cut_separates_the_packing_point() {
    let bdd = compile_packing();
    let x = [2.0 / 3.0; 3];
    let interior = select_interior_point(InteriorPoint::DdCenter, &bdd).unwrap();

    let params = TargetCutParams { want_cut_info: true, ..Default::default() };
    let (cut, info) = generate_bdd_inequality(&bdd, &x, &interior, &params).unwrap();

    // the cut is violated by x by a strictly positive margin ...
    assert!(cut.violation(&x) > OPT_TOL);
    // ... and valid for every feasible point
    for point in PACKING_FEASIBLE {
        assert!(cut.activity(&point) <= cut.rhs + OPT_TOL);
    }

    // scenario 6 follow-up: the dual flow decomposes into paths of the
    // diagram whose weights sum to the total root outflow
    let mut info = info.unwrap();
    let root = bdd.node(bdd.root());
    let total = info.zero_arc_flow[0][root.id()] + info.one_arc_flow[0][root.id()];
    let (paths, weights) =
        decompose_paths_from_flow(&bdd, &mut info.zero_arc_flow, &mut info.one_arc_flow, None);
    assert!(!paths.is_empty());
    assert!((weights.iter().sum::<f64>() - total).abs() <= 1e-4);
    for path in paths {
        assert!(path_exists(&bdd, &path));
    }
}

#[test]
fn lagrangian_cut_separates_the_packing_point() {
    let bdd = compile_packing();
    let x = [2.0 / 3.0; 3];
    let cut = generate_lagrangian_cut_subgradient(&bdd, &x, &[1.0; 3], 200, 0)
        .expect("a violated cut exists");
    assert!(cut.violation(&x) > CUT_VIOLATION_TOL);
    for point in PACKING_FEASIBLE {
        assert!(cut.activity(&point) <= cut.rhs + 1e-9);
    }
}

// ---------------------------------------------------------------------------
// scenario 6: flow decomposition on the triangle diagram
// ---------------------------------------------------------------------------

#[test]
fn triangle_unit_flows_decompose_into_three_paths() {
    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(triangle()));
    let mut ordering = NoOrdering;
    let options = quiet(true);
    let mut solver = DdSolver::new(&mut problem, &mut ordering, &options);
    let bdd = solver.compile().expect("feasible");

    // one unit of flow on each of the three one-solutions
    let mut info = CutInfo::shaped_after(&bdd);
    let solutions = [[1u8, 0, 0], [0, 1, 0], [0, 0, 1]];
    for sol in solutions.iter() {
        let mut node = bdd.root();
        let terminal = bdd.terminal();
        while node != terminal {
            let n = bdd.node(node);
            let layer = n.layer();
            let val = if sol[layer] == 1 { ArcValue::One } else { ArcValue::Zero };
            let flows = match val {
                ArcValue::Zero => &mut info.zero_arc_flow,
                ArcValue::One => &mut info.one_arc_flow,
            };
            flows[layer][n.id()] += 1.0;
            node = n.arc(val).expect("solution must be a path");
        }
    }

    let (paths, weights) =
        decompose_paths_from_flow(&bdd, &mut info.zero_arc_flow, &mut info.one_arc_flow, None);
    assert_eq!(3, paths.len());
    assert!(weights.iter().all(|&w| (w - 1.0).abs() < 1e-9));
    assert_eq!(3.0, weights.iter().sum::<f64>());
    for sol in solutions {
        assert!(paths.contains(&sol.to_vec()));
    }
}

// ---------------------------------------------------------------------------
// relaxed binary program: width limit + propagation together
// ---------------------------------------------------------------------------

#[test]
fn relaxed_packing_program_overestimates_only() {
    let mut problem = BinaryProblem::new(packing_instance(), vec![Box::new(LinearConsProp)]);
    let mut ordering = NoOrdering;
    let mut merger = MinLongestPathMerger { width: 1 };
    let options = quiet(true);
    let mut solver =
        DdSolver::new(&mut problem, &mut ordering, &options).with_merger(&mut merger);
    let bdd = solver.compile().expect("feasible");

    assert!(bdd.bound >= 2.0);
    for point in PACKING_FEASIBLE {
        let sol: Vec<u8> = point.iter().map(|&x| x as u8).collect();
        assert!(path_exists(&bdd, &sol));
    }
    assert!(bdd.integrity_check());
}

// ---------------------------------------------------------------------------
// pass values driving the mergers
// ---------------------------------------------------------------------------

#[test]
fn node_data_pass_values_drive_the_merger() {
    use std::rc::Rc;
    use ddcut::problems::indepset::IndepSetState;

    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(triangle()));
    let mut ordering = NoOrdering;
    let mut merger = PassValNodeDataMerger::max(1, "dist");
    let options = quiet(false);

    // accumulate, at each node, the minimum Manhattan distance between the
    // partial paths reaching it and the all-half point
    let pass: Rc<dyn PassFunc<IndepSetState>> =
        Rc::new(MinDistanceToPointPass::new(vec![0.5; 3], true, true));

    let mut solver =
        DdSolver::new(&mut problem, &mut ordering, &options).with_merger(&mut merger);
    solver.add_initial_node_data("dist", Box::new(PassValueData::new(pass, PassFold::Min)));
    let bdd = solver.compile().expect("feasible");

    assert!(bdd.layers.iter().all(|l| l.len() <= 1));
    assert!(bdd.bound >= 1.0 && bdd.bound <= 3.0);
    // the data followed the transitions down to the terminal
    let terminal = bdd.node(bdd.terminal());
    assert!((node_data_pass_value(terminal, "dist") - 1.5).abs() < 1e-9);
    for sol in [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]] {
        assert!(path_exists(&bdd, &sol));
    }
}

#[test]
fn partial_pass_values_drive_the_merger() {
    use std::rc::Rc;
    use ddcut::problems::indepset::IndepSetState;

    let mut problem = IndepSetProblem::new(IndepSetInstance::from_graph(triangle()));
    let mut ordering = NoOrdering;
    let pass: Rc<dyn PassFunc<IndepSetState>> =
        Rc::new(MinDotProductToPointPass::new(vec![1.0; 3], true));
    let mut merger = PassValMerger::<IndepSetState>::max(1, pass);
    let options = quiet(false);

    let mut solver =
        DdSolver::new(&mut problem, &mut ordering, &options).with_merger(&mut merger);
    let bdd = solver.compile().expect("feasible");

    assert!(bdd.layers.iter().all(|l| l.len() <= 1));
    assert!(bdd.bound >= 1.0);
    for sol in [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]] {
        assert!(path_exists(&bdd, &sol));
    }
}
