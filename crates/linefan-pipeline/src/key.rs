//! Coordinate equality and canonical segment identity.
//!
//! Every stage that asks "is this the same coordinate?" goes through a
//! single [`CoordMatcher`], so the detector, the direction classifier, and
//! the splicer can never disagree about what counts as shared.
//!
//! Shared segments are keyed by a [`SegmentKey`] built from the coordinate
//! sequence itself. With a zero tolerance the key holds the exact IEEE-754
//! bit patterns; with a positive tolerance coordinates are snapped to a
//! grid whose cell size equals the tolerance.

use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use crate::types::Point;

/// Decides whether two coordinates are the same vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordMatcher {
    epsilon: f64,
}

impl CoordMatcher {
    /// Exact numeric equality.
    pub const EXACT: Self = Self { epsilon: 0.0 };

    /// Match coordinates whose components differ by at most `epsilon`.
    ///
    /// Negative or non-finite values fall back to exact matching.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        if epsilon.is_finite() && epsilon > 0.0 {
            Self { epsilon }
        } else {
            Self::EXACT
        }
    }

    /// The tolerance in coordinate units.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns `true` if `a` and `b` are the same vertex.
    ///
    /// A NaN component never matches anything, including itself.
    #[must_use]
    pub fn matches(&self, a: Point, b: Point) -> bool {
        if self.epsilon == 0.0 {
            a == b
        } else {
            (a.x - b.x).abs() <= self.epsilon && (a.y - b.y).abs() <= self.epsilon
        }
    }

    /// Returns `true` if both runs have the same length and match
    /// element by element.
    #[must_use]
    pub fn runs_match(&self, a: &[Point], b: &[Point]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(&p, &q)| self.matches(p, q))
    }

    /// Position of the first coordinate in `haystack` matching `needle`.
    #[must_use]
    pub fn position(&self, haystack: &[Point], needle: Point) -> Option<usize> {
        haystack.iter().position(|&p| self.matches(p, needle))
    }

    /// Canonical key for a coordinate sequence.
    #[must_use]
    pub fn key(&self, points: &[Point]) -> SegmentKey {
        let cells = points.iter().map(|&p| self.cell(p)).collect();
        SegmentKey(cells)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, p: Point) -> CoordCell {
        if self.epsilon == 0.0 {
            CoordCell::Bits(normalized_bits(p.x), normalized_bits(p.y))
        } else {
            CoordCell::Grid(
                (p.x / self.epsilon).round() as i64,
                (p.y / self.epsilon).round() as i64,
            )
        }
    }
}

impl Default for CoordMatcher {
    fn default() -> Self {
        Self::EXACT
    }
}

/// Bit pattern of `v` with `-0.0` folded onto `0.0`, since the two compare
/// equal.
fn normalized_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() }
}

/// One coordinate of a [`SegmentKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CoordCell {
    /// Exact bit patterns of `(x, y)`.
    Bits(u64, u64),
    /// Grid cell indices of `(x, y)` for a positive tolerance.
    Grid(i64, i64),
}

/// Hashable identity of a shared coordinate sequence.
///
/// Two runs produce equal keys when they hold the same coordinates in the
/// same order (after snapping, if a tolerance is in effect).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentKey(Box<[CoordCell]>);

impl SegmentKey {
    /// Stable 64-bit fingerprint of the key.
    ///
    /// Uses SipHash-1-3 with fixed zero keys so the value is identical
    /// across runs and processes, which makes it usable in log output.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = SipHasher13::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Number of coordinates in the keyed sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the keyed sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
