//! Sets of Unicode code points, kept as sorted disjoint intervals.
//!
//! Character classes over the full Unicode range are almost always a
//! handful of intervals, so the representation is a canonical ordered
//! list of half-open ranges `[lo, hi)` rather than a bitmap. All of the
//! set algebra is a linear merge over two interval lists; membership is
//! a binary search.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScanError};

/// One past the largest Unicode scalar value.
pub const CODESPACE_END: u32 = 0x11_0000;

/// An immutable set of code points.
///
/// Invariants: intervals are non-empty, sorted by start, and no two
/// consecutive intervals touch or overlap. Canonical form is unique per
/// set, so derived equality and ordering are semantic: two sets are equal
/// iff they contain the same code points, and `Ord` is lexicographic on
/// the interval list.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodePointSet {
    ranges: Vec<(u32, u32)>,
}

impl CodePointSet {
    /// The empty set.
    pub fn empty() -> Self {
        CodePointSet { ranges: Vec::new() }
    }

    /// The whole codespace.
    pub fn full() -> Self {
        CodePointSet {
            ranges: vec![(0, CODESPACE_END)],
        }
    }

    /// A set holding the single interval `[lo, hi)`.
    pub fn of_range(lo: u32, hi: u32) -> Result<Self> {
        if lo >= hi || hi > CODESPACE_END {
            return Err(ScanError::InvalidRange { lo, hi });
        }
        Ok(CodePointSet {
            ranges: vec![(lo, hi)],
        })
    }

    /// A set holding one code point.
    pub fn single(cp: u32) -> Result<Self> {
        Self::of_range(cp, cp + 1)
    }

    /// Build a canonical set from arbitrary `[lo, hi)` intervals.
    /// Empty intervals are dropped; overlapping and adjacent ones merge.
    pub fn from_ranges<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut ranges: Vec<(u32, u32)> = iter
            .into_iter()
            .filter(|&(lo, hi)| lo < hi)
            .collect();
        ranges.sort_unstable();

        let mut canonical: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match canonical.last_mut() {
                Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
                _ => canonical.push((lo, hi)),
            }
        }
        CodePointSet { ranges: canonical }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True if the set covers the whole codespace.
    pub fn is_full(&self) -> bool {
        self.ranges == [(0, CODESPACE_END)]
    }

    /// Number of code points in the set.
    pub fn len(&self) -> u32 {
        self.ranges.iter().map(|&(lo, hi)| hi - lo).sum()
    }

    /// Smallest code point in the set, if any. Used by the DFA builder to
    /// pick a representative of a derivative class.
    pub fn first(&self) -> Option<u32> {
        self.ranges.first().map(|&(lo, _)| lo)
    }

    /// Membership test, logarithmic in the interval count.
    pub fn contains(&self, cp: u32) -> bool {
        let i = self.ranges.partition_point(|&(lo, _)| lo <= cp);
        i > 0 && cp < self.ranges[i - 1].1
    }

    /// The intervals in order.
    pub fn iter_ranges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.ranges.iter().copied()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_ranges(
            self.iter_ranges().chain(other.iter_ranges()),
        )
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo < hi {
                out.push((lo, hi));
            }
            if a_hi <= b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        CodePointSet { ranges: out }
    }

    /// Code points in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let mut j = 0;
        for &(lo, hi) in &self.ranges {
            let mut lo = lo;
            while j < other.ranges.len() && other.ranges[j].1 <= lo {
                j += 1;
            }
            let mut k = j;
            while lo < hi {
                match other.ranges.get(k) {
                    Some(&(b_lo, b_hi)) if b_lo < hi => {
                        if lo < b_lo {
                            out.push((lo, b_lo));
                        }
                        lo = lo.max(b_hi);
                        k += 1;
                    }
                    _ => {
                        out.push((lo, hi));
                        break;
                    }
                }
            }
        }
        CodePointSet { ranges: out }
    }

    /// Complement relative to the full codespace.
    pub fn complement(&self) -> Self {
        Self::full().difference(self)
    }

    /// True if every code point of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        let mut j = 0;
        for &(lo, hi) in &self.ranges {
            while j < other.ranges.len() && other.ranges[j].1 < hi {
                j += 1;
            }
            match other.ranges.get(j) {
                Some(&(b_lo, b_hi)) if b_lo <= lo && hi <= b_hi => {}
                _ => return false,
            }
        }
        true
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersect(other).is_empty()
    }
}

impl fmt::Display for CodePointSet {
    /// Compact `[a-b c-d ...]` rendering, with printable singletons shown
    /// as characters. Used by the dot emitter for edge labels.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_point(f: &mut fmt::Formatter<'_>, cp: u32) -> fmt::Result {
            match char::from_u32(cp) {
                Some(c) if !c.is_control() && !c.is_whitespace() => write!(f, "{}", c),
                _ => write!(f, "U+{:04X}", cp),
            }
        }

        write!(f, "[")?;
        for (i, (lo, hi)) in self.iter_ranges().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write_point(f, lo)?;
            if hi - lo > 1 {
                write!(f, "-")?;
                write_point(f, hi - 1)?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ranges: &[(u32, u32)]) -> CodePointSet {
        CodePointSet::from_ranges(ranges.iter().copied())
    }

    #[test]
    fn test_canonical_construction() {
        // overlapping and adjacent intervals merge, empty ones vanish
        let s = set(&[(10, 20), (15, 25), (25, 30), (40, 40), (5, 7)]);
        assert_eq!(s.iter_ranges().collect::<Vec<_>>(), vec![(5, 7), (10, 30)]);
        assert_eq!(s.len(), 2 + 20);
    }

    #[test]
    fn test_of_range_validation() {
        assert!(CodePointSet::of_range(0x61, 0x7b).is_ok());
        assert!(matches!(
            CodePointSet::of_range(5, 5),
            Err(ScanError::InvalidRange { .. })
        ));
        assert!(matches!(
            CodePointSet::of_range(9, 3),
            Err(ScanError::InvalidRange { .. })
        ));
        assert!(matches!(
            CodePointSet::of_range(0, CODESPACE_END + 1),
            Err(ScanError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_contains() {
        let s = set(&[(0x30, 0x3a), (0x61, 0x7b)]);
        assert!(s.contains(0x30));
        assert!(s.contains(0x39));
        assert!(!s.contains(0x3a));
        assert!(s.contains(0x61));
        assert!(!s.contains(0x60));
        assert!(!s.contains(0x10ffff));
    }

    #[test]
    fn test_union_intersect() {
        let a = set(&[(0, 10), (20, 30)]);
        let b = set(&[(5, 25), (40, 50)]);
        assert_eq!(
            a.union(&b).iter_ranges().collect::<Vec<_>>(),
            vec![(0, 30), (40, 50)]
        );
        assert_eq!(
            a.intersect(&b).iter_ranges().collect::<Vec<_>>(),
            vec![(5, 10), (20, 25)]
        );
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.intersect(&b), b.intersect(&a));
    }

    #[test]
    fn test_difference() {
        let a = set(&[(0, 100)]);
        let b = set(&[(10, 20), (30, 40)]);
        assert_eq!(
            a.difference(&b).iter_ranges().collect::<Vec<_>>(),
            vec![(0, 10), (20, 30), (40, 100)]
        );
        assert!(b.difference(&a).is_empty());
        assert_eq!(a.difference(&CodePointSet::empty()), a);
    }

    #[test]
    fn test_complement_involution() {
        let a = set(&[(0x41, 0x5b), (0x61, 0x7b)]);
        assert_eq!(a.complement().complement(), a);
        assert!(a.intersect(&a.complement()).is_empty());
        assert!(a.union(&a.complement()).is_full());
        assert!(CodePointSet::empty().complement().is_full());
    }

    #[test]
    fn test_subset() {
        let a = set(&[(10, 20)]);
        let b = set(&[(0, 30), (40, 50)]);
        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(a.is_subset(&a));
        assert!(CodePointSet::empty().is_subset(&a));
        assert!(a.is_subset(&CodePointSet::full()));
    }

    #[test]
    fn test_exhaustive_small_universe() {
        // compare against a naive bitmask model over 0..16
        for bits_a in 0u16..256 {
            let a = CodePointSet::from_ranges(
                (0..8).filter(|i| bits_a & (1 << i) != 0).map(|i| (i, i + 1)),
            );
            for bits_b in 0u16..256 {
                let b = CodePointSet::from_ranges(
                    (0..8).filter(|i| bits_b & (1 << i) != 0).map(|i| (i, i + 1)),
                );
                for cp in 0..8u32 {
                    let in_a = bits_a & (1 << cp) != 0;
                    let in_b = bits_b & (1 << cp) != 0;
                    assert_eq!(a.union(&b).contains(cp), in_a || in_b);
                    assert_eq!(a.intersect(&b).contains(cp), in_a && in_b);
                    assert_eq!(a.difference(&b).contains(cp), in_a && !in_b);
                }
            }
        }
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = set(&[(0, 5)]);
        let b = set(&[(0, 6)]);
        let c = set(&[(1, 2)]);
        assert!(a < b);
        assert!(b < c);
        assert!(CodePointSet::empty() < a);
    }
}
