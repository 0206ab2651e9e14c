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

//! The binary program problem: the state transition copies the state, fixes
//! the layer variable and runs propagation; the problem itself maintains the
//! global activity bounds of the rows as layers complete.

use crate::abstraction::{Merger, Problem, VarOrdering};
use crate::common::{ArcValue, Error, Options, Variable};
use crate::implementation::mergers::{
    ConsecutivePairLongestPathMerger, LexicographicMerger, MinLongestPathMerger,
    PairMinLongestPathMerger, RandomMerger,
};
use crate::implementation::orderings::{FixedOrdering, NoOrdering, RandomOrdering};
use crate::problems::bp::domains::Domain;
use crate::problems::bp::instance::BpInstance;
use crate::problems::bp::orderings::CuthillMcKeePairOrdering;
use crate::problems::bp::prop::{BpProp, MultipassProp};
use crate::problems::bp::state::BpState;

pub struct BinaryProblem {
    pub instance: BpInstance,
    propagator: Option<MultipassProp>,
    /// Global lower bound on each row's activity, over the variables of the
    /// layers not yet completed.
    minactivity: Vec<f64>,
    /// Global upper bound on each row's activity, same scope.
    maxactivity: Vec<f64>,
}

impl BinaryProblem {
    pub fn new(instance: BpInstance, propagators: Vec<Box<dyn BpProp>>) -> Self {
        let propagator = if propagators.is_empty() {
            None
        } else {
            Some(MultipassProp::new(propagators))
        };
        BinaryProblem {
            instance,
            propagator,
            minactivity: vec![],
            maxactivity: vec![],
        }
    }
}

impl Problem for BinaryProblem {
    type State = BpState;

    fn nb_variables(&self) -> usize {
        self.instance.nvars()
    }

    fn weights(&self) -> &[f64] {
        &self.instance.weights
    }

    fn initial_state(&self) -> BpState {
        let mut state = BpState::new(self.instance.nvars(), self.instance.nrows());
        state.init_from_rows(&self.instance.rows);
        state
    }

    fn transition(&self, state: &BpState, var: Variable, value: ArcValue) -> Option<BpState> {
        // the value must be in the domain
        let domain = state.domains.get(var.id());
        if (value == ArcValue::Zero && domain == Domain::One)
            || (value == ArcValue::One && domain == Domain::Zero)
        {
            return None;
        }
        debug_assert!(!state.infeasible);

        let mut next = state.clone();
        next.set_var(
            var.id(),
            value,
            &self.instance.vars,
            &self.instance.rows,
            &self.minactivity,
            &self.maxactivity,
            self.propagator.as_ref(),
        );
        if next.infeasible {
            return None;
        }
        debug_assert_eq!(Domain::Processed, next.domains.get(var.id()));
        Some(next)
    }

    fn merge_states(&self, state: &mut BpState, other: &BpState) {
        state.merge_with(&self.instance.vars, &self.instance.rows, other);
    }

    fn skip_var_for_long_arc(&self, var: Variable, state: &mut BpState) -> bool {
        // a variable fixed to {0} contributes nothing: skip the layer and
        // let the in-arcs span it (ZDD-style reduction rule)
        let skip = state.domains.get(var.id()) == Domain::Zero;
        if skip {
            state.mark_as_processed(var.id());
        }
        skip
    }

    fn on_initialize(&mut self) {
        self.minactivity = self.instance.rows.iter().map(|r| r.min_activity()).collect();
        self.maxactivity = self.instance.rows.iter().map(|r| r.max_activity()).collect();
    }

    fn on_layer_end(&mut self, var: Variable) {
        // the layer variable no longer contributes to the global bounds
        let v = &self.instance.vars[var.id()];
        for (cons, coeff) in v.rows.iter().zip(v.row_coeffs.iter()) {
            if *coeff < 0.0 {
                self.minactivity[*cons] -= coeff;
            } else {
                self.maxactivity[*cons] -= coeff;
            }
        }
    }
}

/// The binary program ordering designated by the given id.
pub fn ordering_by_id(
    id: usize,
    inst: &BpInstance,
    options: &Options,
) -> Result<Box<dyn VarOrdering<BpState>>, Error> {
    match id {
        1 => Ok(Box::new(RandomOrdering::new(inst.nvars(), options.seed))),
        2 => Ok(Box::new(CuthillMcKeePairOrdering::new(inst))),
        3 => match options.fixed_order_file.as_ref() {
            Some(path) => Ok(Box::new(FixedOrdering::from_file(path, inst.nvars())?)),
            None => Err(Error::Parse("fixed ordering requires an order file".to_string())),
        },
        4 => Ok(Box::new(NoOrdering)),
        _ => Err(Error::Parse(format!("invalid binary program ordering id {id}"))),
    }
}

/// The binary program merger designated by the given id.
pub fn merger_by_id(
    id: usize,
    width: usize,
    options: &Options,
) -> Result<Box<dyn Merger<BinaryProblem>>, Error> {
    match id {
        1 => Ok(Box::new(MinLongestPathMerger { width })),
        2 => Ok(Box::new(PairMinLongestPathMerger { width })),
        3 => Ok(Box::new(ConsecutivePairLongestPathMerger { width })),
        4 => Ok(Box::new(LexicographicMerger { width })),
        5 => Ok(Box::new(RandomMerger::new(width, options.seed))),
        _ => Err(Error::Parse(format!("invalid binary program merger id {id}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::bp::instance::{BpRow, BpVar, RowSense};
    use crate::problems::bp::prop::LinearConsProp;

    /// x0 + x1 <= 1, x0 + x2 <= 1
    fn packing_problem() -> BinaryProblem {
        let rows = vec![
            BpRow::new(RowSense::Le, 1.0, vec![0, 1], vec![1.0, 1.0]),
            BpRow::new(RowSense::Le, 1.0, vec![0, 2], vec![1.0, 1.0]),
        ];
        let vars = vec![BpVar::new(1.0, 0), BpVar::new(1.0, 1), BpVar::new(1.0, 2)];
        let mut problem = BinaryProblem::new(
            BpInstance::new(vars, rows),
            vec![Box::new(LinearConsProp)],
        );
        problem.on_initialize();
        problem
    }

    #[test]
    fn transition_fixes_and_propagates() {
        let problem = packing_problem();
        let s0 = problem.initial_state();
        let s1 = problem.transition(&s0, Variable(0), ArcValue::One).unwrap();
        // both neighbors forced to zero by propagation
        assert_eq!(Domain::Zero, s1.domains.get(1));
        assert_eq!(Domain::Zero, s1.domains.get(2));
    }

    #[test]
    fn transition_against_a_fixed_domain_is_infeasible() {
        let problem = packing_problem();
        let s0 = problem.initial_state();
        let s1 = problem.transition(&s0, Variable(0), ArcValue::One).unwrap();
        assert!(problem.transition(&s1, Variable(1), ArcValue::One).is_none());
    }

    #[test]
    fn zero_fixed_variables_ride_long_arcs() {
        let problem = packing_problem();
        let s0 = problem.initial_state();
        let mut s1 = problem.transition(&s0, Variable(0), ArcValue::One).unwrap();
        assert!(problem.skip_var_for_long_arc(Variable(1), &mut s1));
        // skipping marks the variable processed
        assert_eq!(Domain::Processed, s1.domains.get(1));
    }
}
