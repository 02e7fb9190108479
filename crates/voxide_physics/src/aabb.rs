//! # Axis-Aligned Bounding Boxes
//!
//! Boxes are always normalized: `min <= max` on every axis no matter which
//! corners they were built from.

use serde::{Deserialize, Serialize};

use crate::units::{Axis, Length, Quantity, Vec3};

/// Axis-aligned bounding box in world or local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Corners")]
pub struct Aabb {
    min: Vec3<Length>,
    max: Vec3<Length>,
}

/// Serialized form; normalized on the way in.
#[derive(Deserialize)]
struct Corners {
    min: Vec3<Length>,
    max: Vec3<Length>,
}

impl From<Corners> for Aabb {
    fn from(corners: Corners) -> Self {
        Self::new(corners.min, corners.max)
    }
}

impl Aabb {
    /// Creates a box spanning two opposite corners, in any order.
    #[must_use]
    pub fn new(a: Vec3<Length>, b: Vec3<Length>) -> Self {
        let lower = |a: Length, b: Length| if b < a { b } else { a };
        let upper = |a: Length, b: Length| if b > a { b } else { a };
        Self {
            min: Vec3::new(lower(a.x, b.x), lower(a.y, b.y), lower(a.z, b.z)),
            max: Vec3::new(upper(a.x, b.x), upper(a.y, b.y), upper(a.z, b.z)),
        }
    }

    /// Creates a box from corners given in meters.
    #[must_use]
    pub fn from_meters(a: [f64; 3], b: [f64; 3]) -> Self {
        Self::new(Vec3::from_si(a), Vec3::from_si(b))
    }

    /// Creates the unit box of the voxel at integer coordinates.
    #[must_use]
    pub fn from_voxel(x: i32, y: i32, z: i32) -> Self {
        let (x, y, z) = (f64::from(x), f64::from(y), f64::from(z));
        Self::from_meters([x, y, z], [x + 1.0, y + 1.0, z + 1.0])
    }

    /// Creates a box of the given size with its bottom face centered on the
    /// origin, the usual collider for a standing body.
    #[must_use]
    pub fn footprint(width: Length, height: Length) -> Self {
        let half = width.as_meters() / 2.0;
        Self::from_meters([-half, 0.0, -half], [half, height.as_meters(), half])
    }

    /// Minimum corner.
    #[inline]
    #[must_use]
    pub fn min(&self) -> Vec3<Length> {
        self.min
    }

    /// Maximum corner.
    #[inline]
    #[must_use]
    pub fn max(&self) -> Vec3<Length> {
        self.max
    }

    /// Lower bound on `axis`, in meters.
    #[inline]
    #[must_use]
    pub fn min_on(&self, axis: Axis) -> f64 {
        self.min.get(axis).si()
    }

    /// Upper bound on `axis`, in meters.
    #[inline]
    #[must_use]
    pub fn max_on(&self, axis: Axis) -> f64 {
        self.max.get(axis).si()
    }

    /// Returns `true` if every bound is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Checks if this box overlaps another. Touching faces do not overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        Axis::RESOLUTION_ORDER.iter().all(|&axis| {
            self.min_on(axis) < other.max_on(axis) && self.max_on(axis) > other.min_on(axis)
        })
    }

    /// Moves the box by `offset`.
    #[must_use]
    pub fn translate(&self, offset: Vec3<Length>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns the region covered while moving `distance` along `axis`:
    /// the box stretched toward the direction of travel.
    #[must_use]
    pub fn sweep(&self, axis: Axis, distance: Length) -> Self {
        let mut swept = *self;
        if distance > Length::ZERO {
            *swept.max.get_mut(axis) += distance;
        } else {
            *swept.min.get_mut(axis) += distance;
        }
        swept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let aabb = Aabb::from_meters([1.0, -2.0, 3.0], [-1.0, 2.0, 0.0]);
        assert_eq!(aabb.min(), Vec3::from_si([-1.0, -2.0, 0.0]));
        assert_eq!(aabb.max(), Vec3::from_si([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_touching_is_not_intersecting() {
        let a = Aabb::from_voxel(0, 0, 0);
        let b = Aabb::from_voxel(1, 0, 0);
        let c = Aabb::from_meters([0.5, 0.5, 0.5], [1.5, 1.5, 1.5]);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&b));
    }

    #[test]
    fn test_sweep_extends_toward_motion() {
        let unit = Aabb::from_voxel(0, 0, 0);

        let down = unit.sweep(Axis::Y, Length::meters(-2.0));
        assert!((down.min_on(Axis::Y) + 2.0).abs() < 1e-12);
        assert!((down.max_on(Axis::Y) - 1.0).abs() < 1e-12);

        let east = unit.sweep(Axis::X, Length::meters(0.5));
        assert!((east.max_on(Axis::X) - 1.5).abs() < 1e-12);
        assert!((east.min_on(Axis::X)).abs() < 1e-12);
    }

    #[test]
    fn test_serialized_corners_are_normalized() {
        let aabb = Aabb::from(Corners {
            min: Vec3::from_si([1.0, 1.0, 1.0]),
            max: Vec3::from_si([0.0, 0.0, 0.0]),
        });
        assert_eq!(aabb, Aabb::from_voxel(0, 0, 0));
    }
}
