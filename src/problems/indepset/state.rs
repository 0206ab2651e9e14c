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

//! The independent set state: the set of vertices that may still be taken.

use std::cmp::Ordering;
use std::fmt;

use bit_set::BitSet;

/// The set of vertices still selectable from a node on. Merging two states
/// (relaxation) takes their union; the total order is the lexicographic
/// order on the underlying bit vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndepSetState {
    pub sel: BitSet,
}

impl IndepSetState {
    pub fn new(sel: BitSet) -> Self {
        IndepSetState { sel }
    }

    /// Number of vertices still selectable.
    pub fn size(&self) -> usize {
        self.sel.len()
    }

    pub fn contains(&self, v: usize) -> bool {
        self.sel.contains(v)
    }
}

impl PartialOrd for IndepSetState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndepSetState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sel.get_ref().cmp(other.sel.get_ref())
    }
}

impl fmt::Display for IndepSetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.sel.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(vs: &[usize]) -> IndepSetState {
        IndepSetState::new(vs.iter().copied().collect())
    }

    #[test]
    fn order_is_lexicographic_on_bits() {
        let a = state(&[0, 1]);
        let b = state(&[0, 2]);
        assert!(a != b);
        assert_eq!(a.cmp(&b), a.sel.get_ref().cmp(b.sel.get_ref()));
    }

    #[test]
    fn size_counts_selectable_vertices() {
        assert_eq!(3, state(&[0, 2, 5]).size());
    }

    #[test]
    fn display_lists_vertices() {
        assert_eq!("{0 2}", state(&[0, 2]).to_string());
    }
}
