//! Euclidean geometry over axis-aligned rectangles.
//!
//! Keys stored in the R-tree are rectangles described by an origin and an
//! extension per axis. [`SpatialKey`] is the read side every key type
//! implements; [`KeyCodec`] is the capability that turns keys into page
//! bytes and back, and builds derived rectangles (unions, intersections).
//! [`Geometry`] bundles a codec with the operations the tree and the join
//! engine need and counts rectangle comparisons as it goes.

mod rect;

pub use rect::{Rect, Rect2, RectCodec};

use crate::page::{PullCursor, PushCursor};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// Added to every union extension so a union strictly covers its inputs
/// despite rounding.
pub const PRECISION_ERROR: f64 = 1e-8;

/// An axis-aligned rectangle usable as an R-tree key
pub trait SpatialKey: Clone + fmt::Debug {
    /// Entity the key belongs to. Derived bounds carry the nil id.
    fn uuid(&self) -> Uuid;

    fn dimensions(&self) -> usize;

    fn origin(&self, axis: usize) -> f64;

    fn extension(&self, axis: usize) -> f64;

    /// Distance between two keys. A distance of exactly 0 means "same key"
    /// for point lookups.
    fn distance_to(&self, other: &Self) -> f64;

    /// Upper bound along an axis
    fn end(&self, axis: usize) -> f64 {
        self.origin(axis) + self.extension(axis)
    }

    /// Center along an axis
    fn center(&self, axis: usize) -> f64 {
        self.origin(axis) + self.extension(axis) / 2.0
    }
}

/// Serialization and construction capability for one key type.
///
/// All keys a codec produces have the same encoded size, which is what lets
/// nodes pack keys backward from the end of a page by slot.
pub trait KeyCodec<K> {
    /// Encoded size of every key
    fn key_size(&self) -> usize;

    /// Encoded size of `key`
    fn size_of(&self, _key: &K) -> usize {
        self.key_size()
    }

    fn encode(&self, key: &K, out: &mut PushCursor<'_>);

    /// Decode a key and tag it with `uuid`
    fn decode(&self, input: &mut PullCursor<'_>, uuid: Uuid) -> K;

    /// Build an untagged key from per-axis bounds
    fn bounds(&self, origin: &[f64], extension: &[f64]) -> K;
}

/// Geometry operations bound to a codec, with a comparison counter
pub struct Geometry<K, C> {
    codec: C,
    comparisons: Cell<u64>,
    _key: PhantomData<fn() -> K>,
}

impl<K: SpatialKey, C: KeyCodec<K>> Geometry<K, C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            comparisons: Cell::new(0),
            _key: PhantomData,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Number of unions and overlap tests evaluated so far
    pub fn comparisons(&self) -> u64 {
        self.comparisons.get()
    }

    pub fn reset_comparisons(&self) {
        self.comparisons.set(0);
    }

    /// Count a comparison made outside `union` and `is_overlap`
    pub(crate) fn count(&self) {
        self.comparisons.set(self.comparisons.get() + 1);
    }

    /// Minimum bounding rectangle of two keys, widened by [`PRECISION_ERROR`]
    pub fn union(&self, a: &K, b: &K) -> K {
        self.count();
        let dims = a.dimensions();
        let mut origin = Vec::with_capacity(dims);
        let mut extension = Vec::with_capacity(dims);
        for axis in 0..dims {
            let min = a.origin(axis).min(b.origin(axis));
            let max = a.end(axis).max(b.end(axis));
            origin.push(min);
            extension.push(max - min + PRECISION_ERROR);
        }
        self.codec.bounds(&origin, &extension)
    }

    /// Whether `outer` covers `inner` on every axis
    pub fn contains(&self, outer: &K, inner: &K) -> bool {
        (0..outer.dimensions())
            .all(|axis| outer.origin(axis) <= inner.origin(axis) && outer.end(axis) >= inner.end(axis))
    }

    /// `bound` grown to cover `key`. A bound that already covers `key` is
    /// returned as is, so padding only accumulates when a bound really grows.
    pub fn enlarge(&self, bound: &K, key: &K) -> K {
        if self.contains(bound, key) {
            bound.clone()
        } else {
            self.union(bound, key)
        }
    }

    /// Common region of two overlapping keys. Touching keys produce a
    /// zero extension on the touching axis.
    pub fn intersection(&self, a: &K, b: &K) -> K {
        let dims = a.dimensions();
        let mut origin = Vec::with_capacity(dims);
        let mut extension = Vec::with_capacity(dims);
        for axis in 0..dims {
            let low = a.origin(axis).max(b.origin(axis));
            let high = a.end(axis).min(b.end(axis));
            origin.push(low);
            extension.push((high - low).max(0.0));
        }
        self.codec.bounds(&origin, &extension)
    }

    /// Area, volume or hyper-volume of a key
    pub fn occupancy(&self, key: &K) -> f64 {
        (0..key.dimensions()).map(|axis| key.extension(axis)).product()
    }

    /// Whether two keys share at least one point (boundaries included)
    pub fn is_overlap(&self, a: &K, b: &K) -> bool {
        self.count();
        (0..a.dimensions()).all(|axis| a.origin(axis) <= b.end(axis) && a.end(axis) >= b.origin(axis))
    }
}

impl<K, C: fmt::Debug> fmt::Debug for Geometry<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry")
            .field("codec", &self.codec)
            .field("comparisons", &self.comparisons.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry<Rect2, RectCodec<2>> {
        Geometry::new(RectCodec::new())
    }

    #[test]
    fn test_union_covers_both() {
        let g = geometry();
        let a = Rect2::from_xywh(0.0, 0.0, 1.0, 1.0);
        let b = Rect2::from_xywh(2.0, -1.0, 1.0, 1.0);
        let u = g.union(&a, &b);
        assert_eq!(u.origin(0), 0.0);
        assert_eq!(u.origin(1), -1.0);
        assert!((u.extension(0) - 3.0).abs() < 1e-6);
        assert!((u.extension(1) - 2.0).abs() < 1e-6);
        assert!(u.extension(0) > 3.0);
        assert!(u.uuid().is_nil());
        assert_eq!(g.comparisons(), 1);
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let g = geometry();
        let a = Rect2::from_xywh(0.0, 0.0, 1.0, 1.0);
        let touching = Rect2::from_xywh(1.0, 1.0, 1.0, 1.0);
        let apart = Rect2::from_xywh(1.5, 0.0, 1.0, 1.0);
        assert!(g.is_overlap(&a, &touching));
        assert!(g.is_overlap(&touching, &a));
        assert!(!g.is_overlap(&a, &apart));
        assert_eq!(g.comparisons(), 3);
        g.reset_comparisons();
        assert_eq!(g.comparisons(), 0);
    }

    #[test]
    fn test_intersection_and_occupancy() {
        let g = geometry();
        let a = Rect2::from_xywh(0.0, 0.0, 2.0, 2.0);
        let b = Rect2::from_xywh(1.0, 0.5, 2.0, 1.0);
        let i = g.intersection(&a, &b);
        assert_eq!((i.origin(0), i.origin(1)), (1.0, 0.5));
        assert_eq!((i.extension(0), i.extension(1)), (1.0, 1.0));
        assert_eq!(g.occupancy(&a), 4.0);
        assert_eq!(g.occupancy(&i), 1.0);
    }

    #[test]
    fn test_enlarge_keeps_covering_bound() {
        let g = geometry();
        let bound = Rect2::from_xywh(0.0, 0.0, 4.0, 4.0);
        let inside = Rect2::from_xywh(1.0, 1.0, 3.0, 1.0);
        let outside = Rect2::from_xywh(3.0, 3.0, 2.0, 2.0);
        assert!(g.contains(&bound, &inside));
        assert!(!g.contains(&bound, &outside));

        let kept = g.enlarge(&bound, &inside);
        assert_eq!(kept.extension(0), 4.0);
        assert_eq!(kept.extension(1), 4.0);

        let grown = g.enlarge(&bound, &outside);
        assert!(g.contains(&grown, &bound));
        assert!(g.contains(&grown, &outside));
        // repeated covering inserts leave the bound untouched
        let again = g.enlarge(&g.enlarge(&grown, &inside), &outside);
        assert_eq!(again.end(0), grown.end(0));
        assert_eq!(again.end(1), grown.end(1));
    }
}
