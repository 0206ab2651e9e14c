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

//! Command line front end: reads an instance (the extension selects the
//! problem driver), compiles the relaxed decision diagram and reports the
//! bound. Cut generation against an external MIP solver is a deployment
//! concern; this build carries no MIP solver, so anything beyond `--dd-only`
//! exits with a diagnostic, the same way the original tool does when built
//! without one.

use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use clap::Parser;

use ddcut::problems::{bp, indepset};
use ddcut::{DdSolver, Error, InteriorPoint, Options, OptionsBuilder};

const DEFAULT_INDEPSET_ORDERING: usize = 8;
const DEFAULT_INDEPSET_MERGING: usize = 1;
const DEFAULT_BP_ORDERING: usize = 4;
const DEFAULT_BP_MERGING: usize = 1;

#[derive(Parser)]
#[command(
    name = "ddcut",
    about = "Relaxed decision diagram bounds and cuts for 0/1 programs",
    disable_help_subcommand = true
)]
struct Cli {
    /// Instance file: .clq (DIMACS independent set) or .mps (binary program)
    instance: PathBuf,

    /// Merging scheme id (see documentation for ids)
    #[arg(short = 'm', long = "merger")]
    merger: Option<usize>,

    /// Variable ordering id (see documentation for ids)
    #[arg(short = 'o', long = "ordering")]
    ordering: Option<usize>,

    /// Maximum decision diagram width (default: no limit)
    #[arg(short = 'w', long = "width")]
    width: Option<usize>,

    /// Limit on the number of DD cuts generated (-1 means no limit)
    #[arg(short = 'c', long = "ncuts", default_value_t = 0, allow_hyphen_values = true)]
    ncuts: i64,

    /// Generate no DD cuts (same as -c 0)
    #[arg(long = "no-cuts")]
    no_cuts: bool,

    /// Do not run the IP solver
    #[arg(long = "dd-only")]
    dd_only: bool,

    /// Disable the long arc reduction
    #[arg(long = "no-long-arcs")]
    no_long_arcs: bool,

    /// Add an objective constraint from the DD bound
    #[arg(long = "obj-cut")]
    obj_cut: bool,

    /// Add the objective constraint after the DD cuts
    #[arg(long = "obj-cut-after")]
    obj_cut_after: bool,

    /// Add an objective constraint with the given right-hand side
    #[arg(long = "obj-cut-val")]
    obj_cut_val: Option<i64>,

    /// MIP solver cuts: -1 none, 0 automatic, 2 aggressive
    #[arg(long = "solver-cuts", allow_hyphen_values = true)]
    solver_cuts: Option<i32>,

    /// Stop the solver at the end of the root node
    #[arg(long = "root-only")]
    root_only: bool,

    /// Perturb the target cut randomly to increase its dimension
    #[arg(long = "cut-perturbation", conflicts_with = "cut_perturbation_iter")]
    cut_perturbation: bool,

    /// Perturb the target cut iteratively to increase its dimension
    #[arg(long = "cut-perturbation-iter")]
    cut_perturbation_iter: bool,

    /// Weight of the objective in the cut direction (in [0, 1])
    #[arg(long = "cut-obj-weight", default_value_t = 0.0)]
    cut_obj_weight: f64,

    /// Maximum branch-and-bound depth at which DD cuts are emitted
    #[arg(long = "cut-max-depth", default_value_t = 0)]
    cut_max_depth: usize,

    /// Generate Lagrangian cuts instead of target cuts
    #[arg(long = "cut-lagrangian")]
    cut_lagrangian: bool,

    /// Generate Lagrangian cuts through the bundle optimizer
    #[arg(long = "cut-lagrangian-cb")]
    cut_lagrangian_cb: bool,

    /// Run a flow decomposition on every generated cut
    #[arg(long = "cut-flow-decomposition")]
    cut_flow_decomposition: bool,

    /// Interior point for target cuts: 0 zero, 1 one, 2 indepset, 3 center
    #[arg(long = "cut-intpt")]
    cut_intpt: Option<usize>,

    /// Do not build a decision diagram (solver-baseline runs)
    #[arg(long = "skip-dd")]
    skip_dd: bool,

    /// Root LP algorithm of the external solver
    #[arg(long = "root-lp")]
    root_lp: Option<i32>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        exit(1);
    }
}

fn run(mut cli: Cli) -> Result<(), Error> {
    if !(0.0..=1.0).contains(&cli.cut_obj_weight) {
        return Err(Error::Parse("objective weight for cut must lie in [0, 1]".to_string()));
    }
    if let Some(id) = cli.cut_intpt {
        if InteriorPoint::from_id(id).is_none() {
            return Err(Error::Parse(format!("invalid interior point id {id}")));
        }
    }
    if cli.no_cuts {
        cli.ncuts = 0;
    }
    if let Some(lp) = cli.root_lp {
        if lp < 0 {
            return Err(Error::Parse("invalid root LP algorithm".to_string()));
        }
    }

    if !cli.instance.is_file() {
        return Err(Error::Parse(format!(
            "input file {} cannot be opened",
            cli.instance.display()
        )));
    }

    let extension = cli
        .instance
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    match extension.as_str() {
        "clq" => main_indepset(&cli),
        "mps" => main_bp(&cli),
        other => Err(Error::Parse(format!("problem type ({other}) not identified"))),
    }
}

fn options_from(cli: &Cli) -> Options {
    OptionsBuilder::default()
        .use_long_arcs(!cli.no_long_arcs)
        .build()
        .expect("default options are complete")
}

fn main_indepset(cli: &Cli) -> Result<(), Error> {
    println!("Reading instance {}", cli.instance.display());
    let inst = indepset::IndepSetInstance::read_dimacs(&cli.instance, None)?;
    println!("\tnumber of vertices: {}", inst.graph.n_vertices);
    println!("\tnumber of edges: {}", inst.graph.n_edges);

    println!("\n*** Independent set - {} ***", cli.instance.display());
    match cli.width {
        Some(width) => println!("\twidth: {width}"),
        None => println!("\twidth: unrestricted"),
    }

    let options = options_from(cli);
    let order_id = cli.ordering.unwrap_or(DEFAULT_INDEPSET_ORDERING);
    let merge_id = cli.merger.unwrap_or(DEFAULT_INDEPSET_MERGING);
    let mut ordering = indepset::ordering_by_id(order_id, &inst, &options)?;
    let mut merger = cli
        .width
        .map(|w| indepset::merger_by_id(merge_id, w, &options))
        .transpose()?;

    let mut problem = indepset::IndepSetProblem::new(inst);
    if !cli.skip_dd {
        let start = Instant::now();
        let mut solver = DdSolver::new(&mut problem, &mut *ordering, &options);
        if let Some(merger) = merger.as_mut() {
            solver = solver.with_merger(&mut **merger);
        }
        let bdd = solver.compile();
        let elapsed = start.elapsed();

        match bdd.as_ref() {
            Some(bdd) => {
                debug_assert!(bdd.integrity_check());
                println!();
                println!("Upper bound: {} - width: {}", bdd.bound, solver.final_width);
            }
            None => println!("\nUpper bound: Infeasible"),
        }
        println!("Time to build BDD: {:.3}s", elapsed.as_secs_f64());
    }

    require_dd_only(cli)
}

fn main_bp(cli: &Cli) -> Result<(), Error> {
    let inst = bp::read_bp_instance(&cli.instance)?;
    for row in inst.rows.iter() {
        println!("{row}");
    }

    let options = options_from(cli);
    let order_id = cli.ordering.unwrap_or(DEFAULT_BP_ORDERING);
    let merge_id = cli.merger.unwrap_or(DEFAULT_BP_MERGING);
    let mut ordering = bp::ordering_by_id(order_id, &inst, &options)?;
    let mut merger = cli
        .width
        .map(|w| bp::merger_by_id(merge_id, w, &options))
        .transpose()?;

    let mut problem = bp::BinaryProblem::new(inst, vec![Box::new(bp::LinearConsProp)]);
    if !cli.skip_dd {
        let start = Instant::now();
        let mut solver = DdSolver::new(&mut problem, &mut *ordering, &options);
        if let Some(merger) = merger.as_mut() {
            solver = solver.with_merger(&mut **merger);
        }
        let bdd = solver.compile();
        let elapsed = start.elapsed();

        println!();
        match bdd.as_ref() {
            Some(bdd) => {
                debug_assert!(bdd.integrity_check());
                println!("Bound: {}", bdd.bound);
            }
            None => println!("Bound: Infeasible"),
        }
        println!("Width: {}", solver.final_width);
        println!("Time to construct BDD: {:.3}s", elapsed.as_secs_f64());
    }

    // the default interior point for binary program cuts is the DD center,
    // which needs the arbitrary precision support
    if cli.cut_intpt.is_none() && cli.ncuts != 0 && !cfg!(feature = "center") {
        return Err(Error::Unsupported(
            "the default interior point for binary program cuts is the center of a \
             decision diagram, which requires the `center` feature; select another \
             interior point with --cut-intpt",
        ));
    }

    require_dd_only(cli)
}

/// The flags that only take effect inside a MIP solve.
fn mip_only_flags(cli: &Cli) -> Vec<&'static str> {
    let mut set = vec![];
    if cli.ncuts != 0 {
        set.push("-c/--ncuts");
    }
    if cli.obj_cut {
        set.push("--obj-cut");
    }
    if cli.obj_cut_after {
        set.push("--obj-cut-after");
    }
    if cli.obj_cut_val.is_some() {
        set.push("--obj-cut-val");
    }
    if cli.solver_cuts.is_some() {
        set.push("--solver-cuts");
    }
    if cli.root_only {
        set.push("--root-only");
    }
    if cli.cut_perturbation {
        set.push("--cut-perturbation");
    }
    if cli.cut_perturbation_iter {
        set.push("--cut-perturbation-iter");
    }
    if cli.cut_obj_weight > 0.0 {
        set.push("--cut-obj-weight");
    }
    if cli.cut_max_depth > 0 {
        set.push("--cut-max-depth");
    }
    if cli.cut_lagrangian {
        set.push("--cut-lagrangian");
    }
    if cli.cut_lagrangian_cb {
        set.push("--cut-lagrangian-cb");
    }
    if cli.cut_flow_decomposition {
        set.push("--cut-flow-decomposition");
    }
    if cli.root_lp.is_some() {
        set.push("--root-lp");
    }
    set
}

fn require_dd_only(cli: &Cli) -> Result<(), Error> {
    if cli.dd_only {
        let ignored = mip_only_flags(cli);
        if !ignored.is_empty() {
            println!(
                "Note: {} only take effect inside a MIP solve; ignored with --dd-only",
                ignored.join(", ")
            );
        }
        return Ok(());
    }
    Err(Error::Unsupported(
        "this build carries no MIP solver; cut generation inside a solve is a library \
         integration (see the cuts module). Rerun with --dd-only",
    ))
}
