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

//! Variable domains for binary programs. The container is a plain vector of
//! cells threaded by three intrusive doubly-linked lists: *set* variables
//! (singleton domain), *unset* variables (domain {0,1}) and *unprocessed*
//! variables (not yet a layer variable). Every move between lists goes
//! through the single operation `set_domain`, in O(1). The links are plain
//! indices (not pointers) because states are copied very frequently: a
//! memcpy of the cell vector is a valid copy of all three lists.
//!
//! Set and unset iteration is unordered (variables come and go through
//! branching and merging); unprocessed iteration is *ordered* by variable,
//! since a processed variable never becomes unprocessed again. The
//! equivalence checks rely on that order.

/// The domain of one 0/1 variable. The declaration order defines the total
/// order used when states are compared lexicographically.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Domain {
    /// Still free: {0, 1}.
    ZeroOne,
    /// Fixed to 0.
    Zero,
    /// Fixed to 1.
    One,
    /// Already branched on in a previous layer.
    Processed,
    /// Sentinel cells only.
    Undefined,
}

const NIL: usize = usize::MAX;

#[derive(Debug, Copy, Clone)]
struct Cell {
    domain: Domain,
    prev_set: usize,
    next_set: usize,
    prev_unset: usize,
    next_unset: usize,
    prev_unproc: usize,
    next_unproc: usize,
}

impl Cell {
    fn new(domain: Domain) -> Self {
        Cell {
            domain,
            prev_set: NIL,
            next_set: NIL,
            prev_unset: NIL,
            next_unset: NIL,
            prev_unproc: NIL,
            next_unproc: NIL,
        }
    }
}

/// The domain container: `nvars` cells plus two sentinels (head at index
/// `nvars`, tail at `nvars + 1`) bounding each of the three lists.
#[derive(Debug, Clone)]
pub struct Domains {
    cells: Vec<Cell>,
    nvars: usize,
    /// Number of unprocessed variables currently fixed to 0.
    pub nvars_set_zero: usize,
    /// Number of unprocessed variables currently fixed to 1.
    pub nvars_set_one: usize,
}

impl Domains {
    pub fn new(nvars: usize) -> Self {
        let head = nvars;
        let tail = nvars + 1;
        let mut cells = vec![Cell::new(Domain::ZeroOne); nvars];
        cells.push(Cell::new(Domain::Undefined));
        cells.push(Cell::new(Domain::Undefined));

        // empty set list
        cells[head].next_set = tail;
        cells[tail].prev_set = head;

        // all variables start unset and unprocessed, threaded in order
        if nvars > 0 {
            for i in 0..nvars - 1 {
                cells[i].next_unset = i + 1;
                cells[i].next_unproc = i + 1;
                cells[i + 1].prev_unset = i;
                cells[i + 1].prev_unproc = i;
            }
            cells[head].next_unset = 0;
            cells[head].next_unproc = 0;
            cells[0].prev_unset = head;
            cells[0].prev_unproc = head;
            cells[tail].prev_unset = nvars - 1;
            cells[tail].prev_unproc = nvars - 1;
            cells[nvars - 1].next_unset = tail;
            cells[nvars - 1].next_unproc = tail;
        } else {
            cells[head].next_unset = tail;
            cells[head].next_unproc = tail;
            cells[tail].prev_unset = head;
            cells[tail].prev_unproc = head;
        }

        Domains { cells, nvars, nvars_set_zero: 0, nvars_set_one: 0 }
    }

    pub fn len(&self) -> usize {
        self.nvars
    }

    pub fn is_empty(&self) -> bool {
        self.nvars == 0
    }

    fn head(&self) -> usize {
        self.nvars
    }

    fn tail(&self) -> usize {
        self.nvars + 1
    }

    /// The domain of variable `i`.
    pub fn get(&self, i: usize) -> Domain {
        self.cells[i].domain
    }

    /// Move variable `i` to the given domain, maintaining all three lists.
    /// Restrictions ({0,1} to a singleton), relaxations (a singleton back to
    /// {0,1}) and processing are the only legal moves; flipping between the
    /// two singletons is a caller bug.
    pub fn set_domain(&mut self, i: usize, dom: Domain) {
        let old = self.cells[i].domain;
        if old == dom {
            return;
        }
        assert!(old != Domain::Processed, "processed domain cannot be reverted");
        assert!(!(old == Domain::One && dom == Domain::Zero));
        assert!(!(old == Domain::Zero && dom == Domain::One));

        match dom {
            Domain::Zero | Domain::One => {
                self.remove_unset(i);
                self.add_set(i);
                if dom == Domain::One {
                    self.nvars_set_one += 1;
                } else {
                    self.nvars_set_zero += 1;
                }
            }
            Domain::ZeroOne => {
                self.remove_set(i);
                self.add_unset(i);
                if old == Domain::One {
                    self.nvars_set_one -= 1;
                } else {
                    self.nvars_set_zero -= 1;
                }
            }
            Domain::Processed => {
                self.remove_unprocessed(i);
                if old == Domain::ZeroOne {
                    self.remove_unset(i);
                } else {
                    self.remove_set(i);
                    if old == Domain::One {
                        self.nvars_set_one -= 1;
                    } else {
                        self.nvars_set_zero -= 1;
                    }
                }
            }
            Domain::Undefined => panic!("a variable cannot become a sentinel"),
        }

        self.cells[i].domain = dom;
    }

    fn add_set(&mut self, i: usize) {
        let tail = self.tail();
        debug_assert!(self.cells[i].prev_set == NIL && self.cells[i].next_set == NIL);
        let last = self.cells[tail].prev_set;
        self.cells[i].prev_set = last;
        self.cells[i].next_set = tail;
        self.cells[last].next_set = i;
        self.cells[tail].prev_set = i;
    }

    fn add_unset(&mut self, i: usize) {
        let tail = self.tail();
        debug_assert!(self.cells[i].prev_unset == NIL && self.cells[i].next_unset == NIL);
        let last = self.cells[tail].prev_unset;
        self.cells[i].prev_unset = last;
        self.cells[i].next_unset = tail;
        self.cells[last].next_unset = i;
        self.cells[tail].prev_unset = i;
    }

    fn remove_set(&mut self, i: usize) {
        debug_assert!(self.cells[i].prev_set != NIL && self.cells[i].next_set != NIL);
        let (prev, next) = (self.cells[i].prev_set, self.cells[i].next_set);
        self.cells[prev].next_set = next;
        self.cells[next].prev_set = prev;
        self.cells[i].prev_set = NIL;
        self.cells[i].next_set = NIL;
    }

    fn remove_unset(&mut self, i: usize) {
        debug_assert!(self.cells[i].prev_unset != NIL && self.cells[i].next_unset != NIL);
        let (prev, next) = (self.cells[i].prev_unset, self.cells[i].next_unset);
        self.cells[prev].next_unset = next;
        self.cells[next].prev_unset = prev;
        self.cells[i].prev_unset = NIL;
        self.cells[i].next_unset = NIL;
    }

    // Adding back to the unprocessed list is not implemented: it would break
    // the variable order the equivalence checks rely on.
    fn remove_unprocessed(&mut self, i: usize) {
        debug_assert!(self.cells[i].prev_unproc != NIL && self.cells[i].next_unproc != NIL);
        let (prev, next) = (self.cells[i].prev_unproc, self.cells[i].next_unproc);
        self.cells[prev].next_unproc = next;
        self.cells[next].prev_unproc = prev;
        self.cells[i].prev_unproc = NIL;
        self.cells[i].next_unproc = NIL;
    }

    /// The variables with a singleton domain, in insertion order.
    pub fn iter_set(&self) -> DomainIter<'_> {
        DomainIter { domains: self, idx: self.cells[self.head()].next_set, list: List::Set }
    }

    /// The variables with domain {0,1}, in insertion order.
    pub fn iter_unset(&self) -> DomainIter<'_> {
        DomainIter { domains: self, idx: self.cells[self.head()].next_unset, list: List::Unset }
    }

    /// The variables not yet branched on, in variable order.
    pub fn iter_unproc(&self) -> DomainIter<'_> {
        DomainIter { domains: self, idx: self.cells[self.head()].next_unproc, list: List::Unproc }
    }

    /// Full consistency check of the three lists: every link is doubly
    /// consistent and each list contains exactly the variables in the
    /// corresponding domain states. Meant for tests and debugging.
    pub fn consistent(&self) -> bool {
        let in_set: Vec<usize> = self.iter_set().collect();
        let in_unset: Vec<usize> = self.iter_unset().collect();
        let in_unproc: Vec<usize> = self.iter_unproc().collect();

        for i in 0..self.nvars {
            let dom = self.cells[i].domain;
            let expect_set = matches!(dom, Domain::Zero | Domain::One);
            let expect_unset = dom == Domain::ZeroOne;
            let expect_unproc = dom != Domain::Processed;
            if expect_set != in_set.contains(&i)
                || expect_unset != in_unset.contains(&i)
                || expect_unproc != in_unproc.contains(&i)
            {
                return false;
            }
        }

        // doubly-linked consistency of each chain
        let links: [(fn(&Cell) -> usize, fn(&Cell) -> usize); 3] = [
            (|c| c.next_set, |c| c.prev_set),
            (|c| c.next_unset, |c| c.prev_unset),
            (|c| c.next_unproc, |c| c.prev_unproc),
        ];
        for (next_of, prev_of) in links {
            let mut idx = self.head();
            loop {
                let next = next_of(&self.cells[idx]);
                if next == NIL {
                    break;
                }
                if prev_of(&self.cells[next]) != idx {
                    return false;
                }
                if next == self.tail() {
                    break;
                }
                idx = next;
            }
        }
        true
    }
}

enum List {
    Set,
    Unset,
    Unproc,
}

/// Iterator over one of the three intrusive lists, yielding variable
/// indices.
pub struct DomainIter<'a> {
    domains: &'a Domains,
    idx: usize,
    list: List,
}

impl<'a> Iterator for DomainIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.idx == self.domains.tail() || self.idx == NIL {
            return None;
        }
        let current = self.idx;
        self.idx = match self.list {
            List::Set => self.domains.cells[current].next_set,
            List::Unset => self.domains.cells[current].next_unset,
            List::Unproc => self.domains.cells[current].next_unproc,
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_domains_are_all_unset_and_unprocessed() {
        let d = Domains::new(4);
        assert!(d.iter_set().next().is_none());
        assert_eq!(vec![0, 1, 2, 3], d.iter_unset().collect::<Vec<_>>());
        assert_eq!(vec![0, 1, 2, 3], d.iter_unproc().collect::<Vec<_>>());
        assert!(d.consistent());
    }

    #[test]
    fn fixing_moves_between_lists_in_constant_time() {
        let mut d = Domains::new(4);
        d.set_domain(2, Domain::One);
        assert_eq!(Domain::One, d.get(2));
        assert_eq!(vec![2], d.iter_set().collect::<Vec<_>>());
        assert_eq!(vec![0, 1, 3], d.iter_unset().collect::<Vec<_>>());
        assert_eq!(1, d.nvars_set_one);
        assert!(d.consistent());
    }

    #[test]
    fn relaxing_returns_to_the_unset_list() {
        let mut d = Domains::new(3);
        d.set_domain(0, Domain::Zero);
        d.set_domain(0, Domain::ZeroOne);
        assert_eq!(Domain::ZeroOne, d.get(0));
        assert_eq!(0, d.nvars_set_zero);
        assert_eq!(vec![0, 1, 2], d.iter_unproc().collect::<Vec<_>>());
        assert!(d.consistent());
    }

    #[test]
    fn processing_leaves_every_list() {
        let mut d = Domains::new(3);
        d.set_domain(1, Domain::One);
        d.set_domain(1, Domain::Processed);
        assert_eq!(Domain::Processed, d.get(1));
        assert_eq!(0, d.nvars_set_one);
        assert!(d.iter_set().next().is_none());
        assert_eq!(vec![0, 2], d.iter_unproc().collect::<Vec<_>>());
        assert!(d.consistent());
    }

    #[test]
    fn unprocessed_iteration_stays_in_variable_order() {
        let mut d = Domains::new(5);
        d.set_domain(2, Domain::Zero);
        d.set_domain(2, Domain::Processed);
        d.set_domain(0, Domain::One);
        d.set_domain(0, Domain::Processed);
        assert_eq!(vec![1, 3, 4], d.iter_unproc().collect::<Vec<_>>());
    }

    #[test]
    fn copies_carry_the_lists_along() {
        let mut d = Domains::new(3);
        d.set_domain(1, Domain::One);
        let copy = d.clone();
        assert_eq!(vec![1], copy.iter_set().collect::<Vec<_>>());
        assert!(copy.consistent());
    }

    #[test]
    #[should_panic(expected = "processed domain")]
    fn processed_cannot_be_reverted() {
        let mut d = Domains::new(2);
        d.set_domain(0, Domain::Zero);
        d.set_domain(0, Domain::Processed);
        d.set_domain(0, Domain::ZeroOne);
    }

    #[test]
    fn empty_container_is_consistent() {
        let d = Domains::new(0);
        assert!(d.consistent());
        assert!(d.is_empty());
    }
}
