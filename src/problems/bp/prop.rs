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

//! Domain propagation for binary programs: a multipass wrapper driving a
//! list of propagators over the variables fixed in the previous pass, and
//! the linear-constraint propagator itself. Infeasibility is conveyed
//! through the state's flag; propagation stops as soon as it is raised.

use fxhash::FxHashSet;

use crate::arith::{dbl_gt, dbl_lt};
use crate::problems::bp::domains::Domain;
use crate::problems::bp::instance::{BpRow, BpVar, RowSense};
use crate::problems::bp::state::BpState;

/// A domain propagator for binary programs. `v` is a newly fixed variable;
/// any variable the propagator fixes in turn must be added to
/// `fixed_vars_next` so the multipass wrapper can revisit it.
pub trait BpProp {
    #[allow(clippy::too_many_arguments)]
    fn propagate(
        &self,
        state: &mut BpState,
        v: usize,
        vars: &[BpVar],
        rows: &[BpRow],
        minactivity: &mut [f64],
        maxactivity: &mut [f64],
        fixed_vars_next: &mut FxHashSet<usize>,
    );
}

/// Runs a number of passes over a list of propagators, re-propagating on the
/// variables fixed during the previous pass.
pub struct MultipassProp {
    propagators: Vec<Box<dyn BpProp>>,
    npasses: usize,
}

impl MultipassProp {
    pub fn new(propagators: Vec<Box<dyn BpProp>>) -> Self {
        Self::with_passes(propagators, 1)
    }

    pub fn with_passes(propagators: Vec<Box<dyn BpProp>>, npasses: usize) -> Self {
        MultipassProp { propagators, npasses }
    }

    pub fn propagate(
        &self,
        state: &mut BpState,
        v: usize,
        vars: &[BpVar],
        rows: &[BpRow],
        minactivity: &mut [f64],
        maxactivity: &mut [f64],
    ) {
        debug_assert!(matches!(state.domains.get(v), Domain::Zero | Domain::One));

        let mut fixed_vars: FxHashSet<usize> = FxHashSet::default();
        let mut fixed_vars_next: FxHashSet<usize> = FxHashSet::default();
        fixed_vars.insert(v);

        let mut pass = 0;
        while pass < self.npasses && !fixed_vars.is_empty() {
            for &cur_var in fixed_vars.iter() {
                debug_assert!(matches!(state.domains.get(cur_var), Domain::Zero | Domain::One));
                for propagator in self.propagators.iter() {
                    propagator.propagate(
                        state,
                        cur_var,
                        vars,
                        rows,
                        minactivity,
                        maxactivity,
                        &mut fixed_vars_next,
                    );
                    if state.infeasible {
                        return;
                    }
                }
            }
            std::mem::swap(&mut fixed_vars, &mut fixed_vars_next);
            fixed_vars_next.clear();
            pass += 1;
        }
    }
}

/// Bounds tightening over the linear rows: for every free variable sharing a
/// (not always feasible) row with the fixed one, check whether one of its
/// two values became impossible, and fix it to the other if so.
pub struct LinearConsProp;

impl LinearConsProp {
    /// Gather the free variables participating in a constraint `init_var` is
    /// in, skipping rows that can no longer bind.
    fn add_neighbors(
        &self,
        init_var: usize,
        vars_set: &mut FxHashSet<usize>,
        state: &BpState,
        vars: &[BpVar],
        rows: &[BpRow],
        minactivity: &[f64],
        maxactivity: &[f64],
    ) {
        let var = &vars[init_var];
        for &row_idx in var.rows.iter() {
            if !state.is_alwaysfeasible(row_idx, rows[row_idx].sense, minactivity, maxactivity) {
                for &v in rows[row_idx].ind.iter() {
                    if v != init_var && state.domains.get(v) == Domain::ZeroOne {
                        vars_set.insert(v);
                    }
                }
            }
        }
    }

    /// The smallest domain `var` can keep with respect to a single row,
    /// assuming its domain is still {0,1}.
    #[allow(clippy::too_many_arguments)]
    fn smallest_domain(
        &self,
        state: &BpState,
        cons: usize,
        coeff: f64,
        var: usize,
        sense: RowSense,
        minactivity: f64,
        maxactivity: f64,
    ) -> Domain {
        debug_assert_eq!(Domain::ZeroOne, state.domains.get(var));
        match sense {
            RowSense::Ge => {
                if coeff < 0.0 {
                    if dbl_lt(maxactivity + coeff, state.rhs[cons]) {
                        return Domain::Zero;
                    }
                } else if dbl_lt(maxactivity - coeff, state.rhs[cons]) {
                    return Domain::One;
                }
            }
            RowSense::Le => {
                if coeff < 0.0 {
                    if dbl_gt(minactivity - coeff, state.rhs[cons]) {
                        return Domain::One;
                    }
                } else if dbl_gt(minactivity + coeff, state.rhs[cons]) {
                    return Domain::Zero;
                }
            }
        }
        Domain::ZeroOne
    }
}

impl BpProp for LinearConsProp {
    fn propagate(
        &self,
        state: &mut BpState,
        v: usize,
        vars: &[BpVar],
        rows: &[BpRow],
        minactivity: &mut [f64],
        maxactivity: &mut [f64],
        fixed_vars_next: &mut FxHashSet<usize>,
    ) {
        let mut vars_to_check: FxHashSet<usize> = FxHashSet::default();
        self.add_neighbors(v, &mut vars_to_check, state, vars, rows, minactivity, maxactivity);

        for &u in vars_to_check.iter() {
            if state.domains.get(u) != Domain::ZeroOne {
                // its domain was reduced earlier during this very step
                continue;
            }

            let var = &vars[u];
            for (&row_idx, &coeff) in var.rows.iter().zip(var.row_coeffs.iter()) {
                if state.infeasible {
                    break;
                }
                // the always-feasible test is skipped here: trying to reduce
                // the domain is cheap enough
                let domain = self.smallest_domain(
                    state,
                    row_idx,
                    coeff,
                    u,
                    rows[row_idx].sense,
                    minactivity[row_idx],
                    maxactivity[row_idx],
                );
                if domain != Domain::ZeroOne {
                    state.set_domain(u, domain, vars, rows, minactivity, maxactivity);
                    fixed_vars_next.insert(u);
                    break;
                }
            }
        }
    }
}
