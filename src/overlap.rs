/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module implements [`OverlapIterator`], a dual-cursor sweep over two sorted lists of
//! [`Offset`] that surfaces one aligned pair at a time, visiting all overlapping or
//! order-adjacent pairs without a full cross-product comparison.
//!
//! The sweep is not a plain two-pointer merge: overlap relations are not monotone. Once the
//! second cursor advances, elements of the first list that were already passed may newly
//! overlap with the new element, so the first cursor is rewound to re-surface them. Elements
//! that the caller explicitly marked as consumed (via [`OverlapIterator::ignore_a()`]) are
//! exempt from re-surfacing.

use crate::offset::{is_sorted, Offset};

/// Synchronizes traversal of two independently sorted lists of offsets, `A` and `B`, exposing
/// one aligned `(a, b)` pair at a time.
///
/// Both input lists MUST be sorted in canonical order (by begin, then end; see
/// [`crate::offset::is_sorted()`]); behavior on unsorted input is unspecified. This
/// precondition is checked by a debug assertion only.
///
/// ```
/// use annodiff::{Offset, OverlapIterator};
///
/// let a = vec![Offset::new(0, 4), Offset::new(5, 7)];
/// let b = vec![Offset::new(0, 7)];
/// let mut iter = OverlapIterator::new(&a, &b);
/// let mut pairs = Vec::new();
/// while iter.has_next() {
///     if iter.a().overlaps(iter.b()) {
///         pairs.push((*iter.a(), *iter.b()));
///     }
///     iter.step();
/// }
/// assert_eq!(pairs.len(), 2);
/// ```
pub struct OverlapIterator<'a> {
    a: &'a [Offset],
    b: &'a [Offset],
    /// Index of the last element of A (only meaningful when A is non-empty)
    max_a: usize,
    max_b: usize,
    /// Current position in A
    na: usize,
    /// Current position in B
    nb: usize,
    /// Position of the A cursor recorded when B last advanced; rewinds never go below this
    last_b_step_na: usize,
    /// Elements of A marked as consumed; these are never surfaced again
    ignore_a: Vec<bool>,
    done: bool,
    step_count: usize,
}

impl<'a> OverlapIterator<'a> {
    /// Creates a new iterator over two sorted offset lists. If either list is empty, the
    /// iterator starts in the exhausted state.
    pub fn new(a: &'a [Offset], b: &'a [Offset]) -> Self {
        debug_assert!(
            is_sorted(a),
            "OverlapIterator requires list A to be sorted by begin, then end"
        );
        debug_assert!(
            is_sorted(b),
            "OverlapIterator requires list B to be sorted by begin, then end"
        );
        Self {
            a,
            b,
            max_a: a.len().saturating_sub(1),
            max_b: b.len().saturating_sub(1),
            na: 0,
            nb: 0,
            last_b_step_na: 0,
            ignore_a: vec![false; a.len()],
            done: a.is_empty() || b.is_empty(),
            step_count: 0,
        }
    }

    /// Is there a current pair? Once this returns false the iterator is exhausted for good.
    pub fn has_next(&self) -> bool {
        !self.done
    }

    /// The current element of A. Only valid while [`Self::has_next()`] holds; panics if the
    /// iterator was constructed from an empty list.
    pub fn a(&self) -> &'a Offset {
        &self.a[self.na]
    }

    /// The current element of B. Only valid while [`Self::has_next()`] holds; panics if the
    /// iterator was constructed from an empty list.
    pub fn b(&self) -> &'a Offset {
        &self.b[self.nb]
    }

    /// Marks the current element of A as consumed: it will never be surfaced as the current
    /// element again, neither by a rewind nor by forward stepping.
    pub fn ignore_a(&mut self) {
        self.ignore_a[self.na] = true;
    }

    /// The number of `step()` calls so far that advanced a cursor. Diagnostics only.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Advances exactly one of the two cursors and recomputes the current pair, or marks the
    /// iterator as exhausted when neither cursor can advance.
    ///
    /// # Panics
    ///
    /// Calling `step()` when the iterator is already exhausted is a programming error and
    /// panics.
    pub fn step(&mut self) {
        if self.done {
            panic!("OverlapIterator::step() called after exhaustion");
        }

        // Which cursor to advance? Peek the next A element (without consuming it) and prefer
        // advancing A while it still has a chance of overlapping the current B.
        let next_a_starts_before_cur_b_ends = if self.na < self.max_a {
            self.a[self.na + 1].begin() <= self.b[self.nb].end()
        } else {
            false
        };
        let cur_a_ends_before_or_with_cur_b = self.a[self.na].end() <= self.b[self.nb].end();

        if next_a_starts_before_cur_b_ends || cur_a_ends_before_or_with_cur_b {
            if self.na < self.max_a {
                self.step_a();
            } else if self.nb < self.max_b {
                self.step_b();
            } else {
                self.done = true;
            }
        } else if self.nb < self.max_b {
            self.step_b();
        } else if self.na < self.max_a {
            self.step_a();
        } else {
            self.done = true;
        }
    }

    fn step_a(&mut self) {
        self.na += 1;
        // consumed elements are skipped, they may not become current again
        while self.na < self.max_a && self.ignore_a[self.na] {
            self.na += 1;
        }
        self.step_count += 1;
    }

    fn step_b(&mut self) {
        self.nb += 1;
        self.step_count += 1;

        let cur_b = self.b[self.nb];
        if cur_b.begin() < self.a[self.na].end() {
            // B has caught up with a region the A cursor already passed: rewind A so the
            // elements that newly overlap with this B are surfaced again. The rewind never
            // goes below the A position recorded at the previous B advancement.
            while self.na > self.last_b_step_na && self.a[self.na].end() > cur_b.begin() {
                self.na -= 1;
            }
            // consumed elements are skipped, they may not become current again
            while self.na < self.max_a && self.ignore_a[self.na] {
                self.na += 1;
            }
        }
        self.last_b_step_na = self.na;
    }
}
