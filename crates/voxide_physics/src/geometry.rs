//! # World Geometry
//!
//! Static colliders the simulation moves bodies against. Providers are
//! shared between independently driven simulations, so they must answer
//! concurrent read queries.
//!
//! A provider may over-report (broad phase) but must never under-report:
//! every collider intersecting the region has to be in the result.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::aabb::Aabb;
use crate::units::Axis;

/// Source of static collision boxes.
pub trait WorldGeometry: Send + Sync {
    /// Returns every collider that may intersect `region`.
    fn collisions(&self, region: &Aabb) -> Vec<Aabb>;
}

impl<G: WorldGeometry + ?Sized> WorldGeometry for Arc<G> {
    fn collisions(&self, region: &Aabb) -> Vec<Aabb> {
        (**self).collisions(region)
    }
}

impl WorldGeometry for Vec<Aabb> {
    fn collisions(&self, region: &Aabb) -> Vec<Aabb> {
        self.iter().copied().filter(|aabb| aabb.intersects(region)).collect()
    }
}

/// A mutable list of boxes with an exact intersection filter.
#[derive(Debug, Default)]
pub struct StaticGeometry {
    boxes: RwLock<Vec<Aabb>>,
}

impl StaticGeometry {
    /// Creates geometry from an initial set of boxes.
    #[must_use]
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self {
            boxes: RwLock::new(boxes),
        }
    }

    /// Adds a box.
    pub fn insert(&self, aabb: Aabb) {
        self.boxes.write().push(aabb);
    }

    /// Removes every box.
    pub fn clear(&self) {
        self.boxes.write().clear();
    }

    /// Returns the number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.read().len()
    }

    /// Returns `true` if there are no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.read().is_empty()
    }
}

impl WorldGeometry for StaticGeometry {
    fn collisions(&self, region: &Aabb) -> Vec<Aabb> {
        self.boxes.read().collisions(region)
    }
}

/// Integer voxel coordinates.
pub type VoxelCoord = (i32, i32, i32);

/// A sparse set of solid unit voxels.
///
/// Queries return the unit box of every solid voxel in the cells the region
/// reaches into. A region ending exactly on a cell face does not reach the
/// neighbouring cell.
#[derive(Debug, Default)]
pub struct VoxelGeometry {
    solid: RwLock<HashSet<VoxelCoord>>,
}

impl VoxelGeometry {
    /// Creates an empty voxel world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a voxel solid or empty.
    pub fn set_solid(&self, x: i32, y: i32, z: i32, solid: bool) {
        let mut voxels = self.solid.write();
        if solid {
            voxels.insert((x, y, z));
        } else {
            voxels.remove(&(x, y, z));
        }
    }

    /// Fills the inclusive block of voxels between two corners.
    pub fn fill(&self, from: VoxelCoord, to: VoxelCoord) {
        let mut voxels = self.solid.write();
        for x in from.0.min(to.0)..=from.0.max(to.0) {
            for y in from.1.min(to.1)..=from.1.max(to.1) {
                for z in from.2.min(to.2)..=from.2.max(to.2) {
                    voxels.insert((x, y, z));
                }
            }
        }
    }

    /// Checks if a voxel is solid.
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.solid.read().contains(&(x, y, z))
    }

    /// Returns the number of solid voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.solid.read().len()
    }

    /// Returns `true` if no voxel is solid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solid.read().is_empty()
    }
}

/// Inclusive range of voxel cells covered by `region` on `axis`.
#[allow(clippy::cast_possible_truncation)]
fn cell_range(region: &Aabb, axis: Axis) -> (i32, i32) {
    (
        region.min_on(axis).floor() as i32,
        (region.max_on(axis).ceil() as i32).saturating_sub(1),
    )
}

impl WorldGeometry for VoxelGeometry {
    fn collisions(&self, region: &Aabb) -> Vec<Aabb> {
        if !region.is_finite() {
            return Vec::new();
        }
        let (min_x, max_x) = cell_range(region, Axis::X);
        let (min_y, max_y) = cell_range(region, Axis::Y);
        let (min_z, max_z) = cell_range(region, Axis::Z);
        let covers = |&(x, y, z): &VoxelCoord| {
            (min_x..=max_x).contains(&x) && (min_y..=max_y).contains(&y) && (min_z..=max_z).contains(&z)
        };

        let voxels = self.solid.read();
        let span = |min: i32, max: i32| u64::try_from(i64::from(max) - i64::from(min) + 1).unwrap_or(0);
        let cells = span(min_x, max_x)
            .saturating_mul(span(min_y, max_y))
            .saturating_mul(span(min_z, max_z));

        // Scan whichever side is smaller: the covered cells or the solid set.
        let solid = u64::try_from(voxels.len()).unwrap_or(u64::MAX);
        let mut hits: Vec<VoxelCoord> = if cells <= solid {
            let mut hits = Vec::new();
            for y in min_y..=max_y {
                for z in min_z..=max_z {
                    for x in min_x..=max_x {
                        if voxels.contains(&(x, y, z)) {
                            hits.push((x, y, z));
                        }
                    }
                }
            }
            hits
        } else {
            voxels.iter().copied().filter(covers).collect()
        };
        hits.sort_unstable_by_key(|&(x, y, z)| (y, z, x));
        hits.into_iter().map(|(x, y, z)| Aabb::from_voxel(x, y, z)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_geometry_filters_exactly() {
        let geometry = StaticGeometry::new(vec![
            Aabb::from_voxel(0, 0, 0),
            Aabb::from_voxel(5, 0, 0),
        ]);
        let region = Aabb::from_meters([0.5, 0.5, 0.5], [2.0, 2.0, 2.0]);
        assert_eq!(geometry.collisions(&region), vec![Aabb::from_voxel(0, 0, 0)]);

        geometry.insert(Aabb::from_voxel(1, 1, 1));
        assert_eq!(geometry.collisions(&region).len(), 2);
        geometry.clear();
        assert!(geometry.is_empty());
    }

    #[test]
    fn test_voxel_broad_phase_covers_touching_cells() {
        let geometry = VoxelGeometry::new();
        geometry.fill((-2, -1, -2), (2, -1, 2));
        assert_eq!(geometry.len(), 25);

        // Sits exactly on top of the floor: the floor cells are not covered.
        let standing = Aabb::from_meters([-0.3, 0.0, -0.3], [0.3, 1.8, 0.3]);
        assert!(geometry.collisions(&standing).is_empty());

        // Reaches into the floor layer.
        let falling = standing.sweep(Axis::Y, crate::units::Length::meters(-0.5));
        let hits = geometry.collisions(&falling);
        assert_eq!(hits.len(), 4);
        assert!(hits.contains(&Aabb::from_voxel(-1, -1, -1)));
        assert!(hits.contains(&Aabb::from_voxel(0, -1, 0)));
    }

    #[test]
    fn test_voxel_huge_region_scans_solid_set() {
        let geometry = VoxelGeometry::new();
        geometry.set_solid(1_000, 2_000, -3_000, true);
        geometry.set_solid(0, 0, 0, true);
        geometry.set_solid(0, 0, 0, false);

        let everything = Aabb::from_meters([-1e6, -1e6, -1e6], [1e6, 1e6, 1e6]);
        assert_eq!(
            geometry.collisions(&everything),
            vec![Aabb::from_voxel(1_000, 2_000, -3_000)]
        );
        assert!(!geometry.is_solid(0, 0, 0));
    }

    #[test]
    fn test_non_finite_region_reports_nothing() {
        let geometry = VoxelGeometry::new();
        geometry.set_solid(0, 0, 0, true);
        let broken = Aabb::from_meters([f64::NAN, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert!(geometry.collisions(&broken).is_empty());
    }

    #[test]
    fn test_shared_between_threads() {
        let geometry = Arc::new(VoxelGeometry::new());
        geometry.fill((0, 0, 0), (3, 0, 3));
        let region = Aabb::from_meters([0.0, 0.5, 0.0], [4.0, 1.5, 4.0]);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let geometry = Arc::clone(&geometry);
                std::thread::spawn(move || geometry.collisions(&region).len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 16);
        }
    }
}
