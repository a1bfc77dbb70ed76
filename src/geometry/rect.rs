//! Concrete D-dimensional rectangle key and its codec.

use super::{KeyCodec, SpatialKey};
use crate::page::{PullCursor, PushCursor};
use crate::types::SIZE_OF_DOUBLE;
use uuid::Uuid;

/// A rectangle bound to an entity id.
///
/// Encoded as `D` origins followed by `D` extensions, all doubles. For the
/// two-dimensional case that is `x, y, width, height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<const D: usize> {
    uuid: Uuid,
    origin: [f64; D],
    extension: [f64; D],
}

/// Planar rectangle
pub type Rect2 = Rect<2>;

impl<const D: usize> Rect<D> {
    /// A rectangle for a freshly identified entity
    pub fn new(origin: [f64; D], extension: [f64; D]) -> Self {
        Self::with_uuid(Uuid::new_v4(), origin, extension)
    }

    pub fn with_uuid(uuid: Uuid, origin: [f64; D], extension: [f64; D]) -> Self {
        Self {
            uuid,
            origin,
            extension,
        }
    }

    pub fn origins(&self) -> &[f64; D] {
        &self.origin
    }

    pub fn extensions(&self) -> &[f64; D] {
        &self.extension
    }

    /// Same coordinates, ignoring the entity id
    pub fn has_same_key(&self, other: &Self) -> bool {
        self.origin == other.origin && self.extension == other.extension
    }
}

impl Rect<2> {
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new([x, y], [width, height])
    }
}

impl<const D: usize> SpatialKey for Rect<D> {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn dimensions(&self) -> usize {
        D
    }

    fn origin(&self, axis: usize) -> f64 {
        self.origin[axis]
    }

    fn extension(&self, axis: usize) -> f64 {
        self.extension[axis]
    }

    /// Euclidean distance between origins
    fn distance_to(&self, other: &Self) -> f64 {
        self.origin
            .iter()
            .zip(other.origin.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

/// Codec for [`Rect`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RectCodec<const D: usize>;

impl<const D: usize> RectCodec<D> {
    pub fn new() -> Self {
        Self
    }
}

impl<const D: usize> KeyCodec<Rect<D>> for RectCodec<D> {
    fn key_size(&self) -> usize {
        2 * D * SIZE_OF_DOUBLE
    }

    fn encode(&self, key: &Rect<D>, out: &mut PushCursor<'_>) {
        for &v in key.origin.iter().chain(key.extension.iter()) {
            out.push_double(v);
        }
    }

    fn decode(&self, input: &mut PullCursor<'_>, uuid: Uuid) -> Rect<D> {
        let mut origin = [0.0; D];
        let mut extension = [0.0; D];
        for v in origin.iter_mut() {
            *v = input.pull_double();
        }
        for v in extension.iter_mut() {
            *v = input.pull_double();
        }
        Rect::with_uuid(uuid, origin, extension)
    }

    fn bounds(&self, origin: &[f64], extension: &[f64]) -> Rect<D> {
        let mut o = [0.0; D];
        let mut e = [0.0; D];
        o.copy_from_slice(&origin[..D]);
        e.copy_from_slice(&extension[..D]);
        Rect::with_uuid(Uuid::nil(), o, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::types::PageId;

    #[test]
    fn test_codec_layout_is_xywh() {
        let codec = RectCodec::<2>::new();
        let r = Rect2::from_xywh(1.0, 2.0, 3.0, 4.0);
        let mut page = Page::new(PageId::new(1), 64);
        codec.encode(&r, &mut PushCursor::new(&mut page, 8));

        assert_eq!(codec.key_size(), 32);
        assert_eq!(page.read_double(8), 1.0);
        assert_eq!(page.read_double(16), 2.0);
        assert_eq!(page.read_double(24), 3.0);
        assert_eq!(page.read_double(32), 4.0);

        let back = codec.decode(&mut PullCursor::new(&page, 8), r.uuid());
        assert_eq!(back, r);
    }

    #[test]
    fn test_distance_and_same_key() {
        let a = Rect2::from_xywh(0.0, 0.0, 1.0, 1.0);
        let b = Rect2::from_xywh(3.0, 4.0, 1.0, 1.0);
        let c = Rect2::from_xywh(0.0, 0.0, 2.0, 2.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(a.distance_to(&c), 0.0);
        assert!(!a.has_same_key(&c));
        assert!(a.has_same_key(&Rect2::from_xywh(0.0, 0.0, 1.0, 1.0)));
    }
}
