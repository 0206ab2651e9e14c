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

//! The binary program state: per-row right-hand sides plus the variable
//! domains. Fixing a variable is the carrier of constraint propagation: it
//! updates the activity accounting of every row the variable appears in,
//! detects infeasibility or rows that can never bind again, and hands over
//! to the propagator.

use std::cmp::Ordering;
use std::fmt;

use crate::arith::{dbl_eq, dbl_ge, dbl_gt, dbl_le, dbl_lt};
use crate::common::ArcValue;
use crate::problems::bp::domains::{Domain, Domains};
use crate::problems::bp::instance::{BpRow, BpVar, RowSense};
use crate::problems::bp::prop::MultipassProp;

#[derive(Debug, Clone)]
pub struct BpState {
    pub rhs: Vec<f64>,
    pub domains: Domains,
    pub infeasible: bool,
}

impl BpState {
    pub fn new(nvars: usize, ncons: usize) -> Self {
        BpState {
            rhs: vec![0.0; ncons],
            domains: Domains::new(nvars),
            infeasible: false,
        }
    }

    pub fn init_from_rows(&mut self, rows: &[BpRow]) {
        for (cons, row) in rows.iter().enumerate() {
            self.rhs[cons] = row.rhs;
        }
    }

    pub fn set_rhs(&mut self, cons: usize, val: f64) {
        self.rhs[cons] = val;
    }

    /// Mark a variable whose domain is already a singleton as processed.
    pub fn mark_as_processed(&mut self, var: usize) {
        debug_assert!(matches!(self.domains.get(var), Domain::Zero | Domain::One));
        self.domains.set_domain(var, Domain::Processed);
    }

    /// Undo the right-hand side updates a 1-fixing of `var` applied (used
    /// when a merge relaxes the domain back to {0,1}). The activity bounds
    /// cannot be reverted: they saturate.
    pub fn revert_rhs(&mut self, var: usize, vars: &[BpVar]) {
        if self.domains.get(var) == Domain::One {
            let v = &vars[var];
            for (cons, coeff) in v.rows.iter().zip(v.row_coeffs.iter()) {
                self.rhs[*cons] += coeff;
            }
        }
    }

    /// Tighten local activity bounds with the variables that are fixed (but
    /// not yet processed) in this state. The input bounds are the
    /// problem-global ones, which already account for processed variables.
    pub fn update_activity_from_domain(
        &self,
        vars: &[BpVar],
        minactivity: &mut [f64],
        maxactivity: &mut [f64],
    ) {
        if self.rhs.is_empty() {
            // states of pure-propagation problems carry no row accounting
            debug_assert!(minactivity.is_empty() && maxactivity.is_empty());
            return;
        }
        for i in self.domains.iter_set() {
            let var = &vars[i];
            for (cons, coeff) in var.rows.iter().zip(var.row_coeffs.iter()) {
                if *coeff < 0.0 {
                    minactivity[*cons] -= coeff;
                } else {
                    maxactivity[*cons] -= coeff;
                }
            }
        }
    }

    /// Fix the domain of `var`, cascading the per-row accounting: activity
    /// bounds, right-hand sides for 1-fixings, infeasibility and
    /// always-feasibility detection. Stops at the first infeasible row.
    pub fn set_domain(
        &mut self,
        var: usize,
        domain: Domain,
        vars: &[BpVar],
        rows: &[BpRow],
        minactivity: &mut [f64],
        maxactivity: &mut [f64],
    ) {
        // cannot switch from {0} to {1} or vice versa
        debug_assert!(self.domains.get(var) == Domain::ZeroOne || self.domains.get(var) == domain);
        if self.domains.get(var) == domain {
            return;
        }

        let v = &vars[var];
        for (cons, coeff) in v.rows.iter().zip(v.row_coeffs.iter()) {
            let cons = *cons;
            if *coeff < 0.0 {
                minactivity[cons] -= coeff;
            } else {
                maxactivity[cons] -= coeff;
            }
            if domain == Domain::One {
                self.rhs[cons] -= coeff;
            }

            self.update_infeasibility(cons, minactivity[cons], maxactivity[cons], rows[cons].sense);
            if self.infeasible {
                return;
            }
            self.update_alwaysfeasibility(cons, minactivity[cons], maxactivity[cons], rows[cons].sense);
        }

        self.domains.set_domain(var, domain);
    }

    /// Flag the state infeasible when the row can no longer be satisfied.
    /// Must be called whenever an activity bound or a right-hand side
    /// changed.
    pub fn update_infeasibility(
        &mut self,
        cons: usize,
        minactivity: f64,
        maxactivity: f64,
        sense: RowSense,
    ) {
        match sense {
            RowSense::Ge => {
                if dbl_lt(maxactivity, self.rhs[cons]) {
                    self.infeasible = true;
                }
            }
            RowSense::Le => {
                if dbl_gt(minactivity, self.rhs[cons]) {
                    self.infeasible = true;
                }
            }
        }
    }

    /// Collapse the right-hand side onto the activity bound when the row can
    /// never bind again. Must be called whenever an activity bound or a
    /// right-hand side changed.
    pub fn update_alwaysfeasibility(
        &mut self,
        cons: usize,
        minactivity: f64,
        maxactivity: f64,
        sense: RowSense,
    ) {
        match sense {
            RowSense::Ge => {
                if dbl_ge(minactivity, self.rhs[cons]) {
                    self.set_rhs(cons, minactivity);
                }
            }
            RowSense::Le => {
                if dbl_le(maxactivity, self.rhs[cons]) {
                    self.set_rhs(cons, maxactivity);
                }
            }
        }
    }

    /// True when the row is satisfied whatever the completion does.
    pub fn is_alwaysfeasible(
        &self,
        cons: usize,
        sense: RowSense,
        minactivity: &[f64],
        maxactivity: &[f64],
    ) -> bool {
        match sense {
            RowSense::Ge => {
                debug_assert!(self.rhs[cons] >= minactivity[cons]);
                dbl_eq(self.rhs[cons], minactivity[cons])
            }
            RowSense::Le => {
                debug_assert!(self.rhs[cons] <= maxactivity[cons]);
                dbl_eq(self.rhs[cons], maxactivity[cons])
            }
        }
    }

    /// Assign `val` to `var`: reconstruct local activity bounds, fix the
    /// domain, propagate, and mark the variable processed. On exit the state
    /// is either consistent or flagged infeasible.
    #[allow(clippy::too_many_arguments)]
    pub fn set_var(
        &mut self,
        var: usize,
        val: ArcValue,
        vars: &[BpVar],
        rows: &[BpRow],
        init_minactivity: &[f64],
        init_maxactivity: &[f64],
        propagator: Option<&MultipassProp>,
    ) {
        debug_assert!(!(self.domains.get(var) == Domain::Zero && val == ArcValue::One));
        debug_assert!(!(self.domains.get(var) == Domain::One && val == ArcValue::Zero));
        debug_assert!(self.domains.get(var) != Domain::Processed);
        debug_assert!(!self.infeasible);

        // if the domain is already the singleton, just mark it processed
        if matches!(self.domains.get(var), Domain::Zero | Domain::One) {
            self.mark_as_processed(var);
            return;
        }

        let mut minactivity = init_minactivity.to_vec();
        let mut maxactivity = init_maxactivity.to_vec();
        self.update_activity_from_domain(vars, &mut minactivity, &mut maxactivity);

        let domain = match val {
            ArcValue::Zero => Domain::Zero,
            ArcValue::One => Domain::One,
        };
        self.set_domain(var, domain, vars, rows, &mut minactivity, &mut maxactivity);
        if self.infeasible {
            return;
        }

        if let Some(propagator) = propagator {
            propagator.propagate(self, var, vars, rows, &mut minactivity, &mut maxactivity);
        }

        self.domains.set_domain(var, Domain::Processed);
    }

    /// Relax this state into one standing for everything feasible from
    /// either state. For every unprocessed variable on which the two
    /// disagree, the right-hand side updates of a 1-fixing are first
    /// reverted on both sides, then the domain opens back to {0,1}; every
    /// right-hand side is finally relaxed to its looser side. Processed
    /// positions must match between both states.
    pub fn merge_with(&mut self, vars: &[BpVar], rows: &[BpRow], other: &BpState) {
        debug_assert_eq!(self.rhs.len(), other.rhs.len());
        debug_assert_eq!(self.domains.len(), other.domains.len());
        #[cfg(debug_assertions)]
        for i in 0..self.domains.len() {
            // processed variables must be the same on both sides (the nodes
            // sit in the same layer)
            debug_assert_eq!(
                self.domains.get(i) == Domain::Processed,
                other.domains.get(i) == Domain::Processed
            );
        }

        // work on a scratch copy of the other side's right-hand sides so its
        // 1-fixings can be reverted as well
        let mut other_rhs = other.rhs.clone();

        let unproc: Vec<usize> = self.domains.iter_unproc().collect();
        for i in unproc {
            if other.domains.get(i) != self.domains.get(i) {
                self.revert_rhs(i, vars);
                if other.domains.get(i) == Domain::One {
                    let v = &vars[i];
                    for (cons, coeff) in v.rows.iter().zip(v.row_coeffs.iter()) {
                        other_rhs[*cons] += coeff;
                    }
                }
                self.domains.set_domain(i, Domain::ZeroOne);
            }
        }

        for (cons, row) in rows.iter().enumerate() {
            let looser = match row.sense {
                RowSense::Le => other_rhs[cons] > self.rhs[cons],
                RowSense::Ge => other_rhs[cons] < self.rhs[cons],
            };
            if looser {
                self.set_rhs(cons, other_rhs[cons]);
            }
        }
    }
}

impl PartialEq for BpState {
    fn eq(&self, other: &Self) -> bool {
        debug_assert_eq!(self.domains.len(), other.domains.len());
        debug_assert_eq!(self.rhs.len(), other.rhs.len());
        for i in 0..self.domains.len() {
            if self.domains.get(i) != other.domains.get(i) {
                return false;
            }
        }
        self.rhs
            .iter()
            .zip(other.rhs.iter())
            .all(|(a, b)| dbl_eq(*a, *b))
    }
}

impl Eq for BpState {}

impl PartialOrd for BpState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BpState {
    /// Lexicographic on the right-hand sides (with tolerance), then on the
    /// fixed-variable counters and the unprocessed domains. The tie breakers
    /// exist for dedup speed, not for semantic meaning.
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert!(!self.infeasible && !other.infeasible);
        for (a, b) in self.rhs.iter().zip(other.rhs.iter()) {
            if dbl_lt(*a, *b) {
                return Ordering::Less;
            }
            if dbl_gt(*a, *b) {
                return Ordering::Greater;
            }
        }

        self.domains
            .nvars_set_zero
            .cmp(&other.domains.nvars_set_zero)
            .then_with(|| self.domains.nvars_set_one.cmp(&other.domains.nvars_set_one))
            .then_with(|| {
                for (i, j) in self.domains.iter_unproc().zip(other.domains.iter_unproc()) {
                    let ord = self.domains.get(i).cmp(&other.domains.get(j));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
    }
}

impl fmt::Display for BpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ State [ ")?;
        for rhs in self.rhs.iter() {
            write!(f, "{rhs} ")?;
        }
        write!(f, "] Domains [ ")?;
        for i in 0..self.domains.len() {
            match self.domains.get(i) {
                Domain::ZeroOne => write!(f, "* ")?,
                Domain::Processed => write!(f, "x ")?,
                Domain::Zero => write!(f, "0 ")?,
                Domain::One => write!(f, "1 ")?,
                Domain::Undefined => write!(f, "? ")?,
            }
        }
        write!(f, "] ]")?;
        if self.infeasible {
            write!(f, " [Inf]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::bp::instance::BpInstance;

    /// x0 + x1 <= 1 ; x0 + x2 <= 1
    fn packing() -> BpInstance {
        let rows = vec![
            BpRow::new(RowSense::Le, 1.0, vec![0, 1], vec![1.0, 1.0]),
            BpRow::new(RowSense::Le, 1.0, vec![0, 2], vec![1.0, 1.0]),
        ];
        let vars = vec![BpVar::new(1.0, 0), BpVar::new(1.0, 1), BpVar::new(1.0, 2)];
        BpInstance::new(vars, rows)
    }

    fn fresh(inst: &BpInstance) -> BpState {
        let mut state = BpState::new(inst.nvars(), inst.nrows());
        state.init_from_rows(&inst.rows);
        state
    }

    fn global_activities(inst: &BpInstance) -> (Vec<f64>, Vec<f64>) {
        let min = inst.rows.iter().map(|r| r.min_activity()).collect();
        let max = inst.rows.iter().map(|r| r.max_activity()).collect();
        (min, max)
    }

    #[test]
    fn one_fixing_updates_the_rhs() {
        let inst = packing();
        let (minact, maxact) = global_activities(&inst);
        let mut state = fresh(&inst);
        state.set_var(0, ArcValue::One, &inst.vars, &inst.rows, &minact, &maxact, None);
        assert!(!state.infeasible);
        assert_eq!(Domain::Processed, state.domains.get(0));
        assert_eq!(vec![0.0, 0.0], state.rhs);
    }

    #[test]
    fn zero_fixing_leaves_the_rhs_alone() {
        let inst = packing();
        let (minact, maxact) = global_activities(&inst);
        let mut state = fresh(&inst);
        state.set_var(0, ArcValue::Zero, &inst.vars, &inst.rows, &minact, &maxact, None);
        assert!(!state.infeasible);
        // maxactivity dropped to 1, equal to the rhs: the rows collapse
        assert_eq!(vec![1.0, 1.0], state.rhs);
    }

    #[test]
    fn covering_rows_detect_infeasibility() {
        // x0 + x1 >= 2
        let rows = vec![BpRow::new(RowSense::Ge, 2.0, vec![0, 1], vec![1.0, 1.0])];
        let vars = vec![BpVar::new(1.0, 0), BpVar::new(1.0, 1)];
        let inst = BpInstance::new(vars, rows);
        let (minact, maxact) = global_activities(&inst);
        let mut state = fresh(&inst);
        state.set_var(0, ArcValue::Zero, &inst.vars, &inst.rows, &minact, &maxact, None);
        assert!(state.infeasible);
    }

    #[test]
    fn merge_reverts_one_fixings_and_loosens_rhs() {
        let inst = packing();
        let (minact, maxact) = global_activities(&inst);

        // both states branched on variable 1 (so it is processed on both)
        let mut one = fresh(&inst);
        one.set_var(1, ArcValue::One, &inst.vars, &inst.rows, &minact, &maxact, None);
        let mut zero = fresh(&inst);
        zero.set_var(1, ArcValue::Zero, &inst.vars, &inst.rows, &minact, &maxact, None);

        // fix variable 0 in `zero` only, without processing it
        let mut local_min = minact.clone();
        let mut local_max = maxact.clone();
        zero.update_activity_from_domain(&inst.vars, &mut local_min, &mut local_max);
        zero.set_domain(0, Domain::One, &inst.vars, &inst.rows, &mut local_min, &mut local_max);

        let snapshot_one = one.clone();
        zero.merge_with(&inst.vars, &inst.rows, &snapshot_one);

        // variable 0 opened back up, its rhs updates reverted, and each rhs
        // took the looser side
        assert_eq!(Domain::ZeroOne, zero.domains.get(0));
        assert!(zero.rhs[0] >= snapshot_one.rhs[0] - 1e-9);
        assert!(zero.rhs[1] >= snapshot_one.rhs[1] - 1e-9);
        assert!(zero.domains.consistent());
    }

    #[test]
    fn equality_is_per_domain_and_rhs() {
        let inst = packing();
        let (minact, maxact) = global_activities(&inst);
        let mut a = fresh(&inst);
        let mut b = fresh(&inst);
        assert!(a == b);
        a.set_var(1, ArcValue::Zero, &inst.vars, &inst.rows, &minact, &maxact, None);
        assert!(a != b);
        b.set_var(1, ArcValue::Zero, &inst.vars, &inst.rows, &minact, &maxact, None);
        assert!(a == b);
    }

    #[test]
    fn order_is_total_on_distinct_states() {
        let inst = packing();
        let (minact, maxact) = global_activities(&inst);
        let mut a = fresh(&inst);
        let mut b = fresh(&inst);
        a.set_var(0, ArcValue::One, &inst.vars, &inst.rows, &minact, &maxact, None);
        b.set_var(0, ArcValue::Zero, &inst.vars, &inst.rows, &minact, &maxact, None);
        assert_ne!(Ordering::Equal, a.cmp(&b));
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }
}
