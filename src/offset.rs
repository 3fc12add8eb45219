/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module defines [`Offset`], the basic value type of this crate: a slice of a text
//! expressed as a begin and end position in unicode codepoints. Offsets carry the canonical
//! ordering (by begin, then end) that all higher-level comparison machinery relies on.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Corresponds to a slice of the text, expressed as a begin offset and a (non-inclusive) end
/// offset in unicode codepoints. This only contains minimal information and is cheap to copy;
/// the actual reference to the text or document is not stored in this structure but should
/// accompany it explicitly when needed.
///
/// Offsets are immutable; they are created once per annotation span and never mutated.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, Deserialize, Serialize)]
pub struct Offset {
    pub(crate) begin: usize,
    pub(crate) end: usize,
}

impl Ord for Offset {
    // this determines the canonical ordering for offsets
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.begin.cmp(&other.begin);
        if ord != Ordering::Equal {
            ord
        } else {
            self.end.cmp(&other.end)
        }
    }
}

impl PartialOrd for Offset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Offset {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Returns a zero-width offset at the given position
    pub fn zero_width(at: usize) -> Self {
        Self {
            begin: at,
            end: at,
        }
    }

    /// Return the begin position (unicode points)
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Return the end position (non-inclusive) in unicode points
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the length of this offset in unicode points
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Is this a zero-width offset? (begin and end at the same position)
    pub fn is_zero_width(&self) -> bool {
        self.begin == self.end
    }

    /// Does this offset overlap with the other?
    pub fn overlaps(&self, other: &Offset) -> bool {
        (other.begin >= self.begin && other.begin < self.end)
            || (other.end > self.begin && other.end <= self.end)
            || (other.begin <= self.begin && other.end >= self.end)
            || (self.begin <= other.begin && self.end >= other.end)
    }

    /// Does this offset fully embed the other?
    pub fn embeds(&self, other: &Offset) -> bool {
        other.begin >= self.begin && other.end <= self.end
    }

    /// Does this offset come entirely before the other? (no overlap)
    pub fn precedes(&self, other: &Offset) -> bool {
        self.end <= other.begin
    }

    /// Does this offset come entirely after the other? (no overlap)
    pub fn succeeds(&self, other: &Offset) -> bool {
        self.begin >= other.end
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}

impl From<(usize, usize)> for Offset {
    fn from((begin, end): (usize, usize)) -> Self {
        Self { begin, end }
    }
}

/// Tests whether a sequence of offsets is in canonical order (by begin, then end).
/// Callers of [`crate::OverlapIterator`] must guarantee this for their inputs.
pub fn is_sorted(offsets: &[Offset]) -> bool {
    offsets.windows(2).all(|pair| pair[0] <= pair[1])
}
