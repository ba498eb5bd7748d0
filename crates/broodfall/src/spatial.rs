//! # Spatial Queries
//!
//! The swarm never sees level geometry. It asks a [`SpatialQuery`] for the
//! nearest tagged surface along a ray and decides from the tag.
//!
//! Two implementations ship with the crate:
//! - [`OpenField`]: nothing is ever hit.
//! - [`BoxWorld`]: tagged axis-aligned boxes, enough for tests and the
//!   headless arena.

use broodfall_shared::Vec3;

/// What kind of surface a ray hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceTag {
    /// Level shell: walls, pillars, stairs.
    Room,
    /// Props that block movement.
    Obstacle,
    /// Anything else (decals, triggers, doors left open).
    Other,
}

impl SurfaceTag {
    /// True for surfaces spiders must not walk into.
    #[inline]
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, Self::Room | Self::Obstacle)
    }
}

/// Nearest surface along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin. Zero if the origin is inside the surface.
    pub distance: f32,
    /// Tag of the surface that was hit.
    pub tag: SurfaceTag,
}

impl RayHit {
    /// True if this hit blocks movement.
    #[inline]
    #[must_use]
    pub const fn blocks_movement(&self) -> bool {
        self.tag.blocks_movement()
    }
}

/// Ray-based obstacle test provided by the level.
pub trait SpatialQuery {
    /// Returns the nearest surface hit by the ray within `max_distance`.
    ///
    /// `direction` is expected to be normalized. `None` means the path is
    /// clear.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// True if a ray of `max_distance` hits something that blocks movement.
    fn is_blocked(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        self.raycast(origin, direction, max_distance)
            .is_some_and(|hit| hit.blocks_movement())
    }
}

/// A level with no geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenField;

impl SpatialQuery for OpenField {
    #[inline]
    fn raycast(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<RayHit> {
        None
    }
}

// ============================================================================
// BOX WORLD
// ============================================================================

/// An axis-aligned box with a surface tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaggedBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
    /// Surface tag reported on hit.
    pub tag: SurfaceTag,
}

impl TaggedBox {
    /// Creates a box from two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3, tag: SurfaceTag) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
            tag,
        }
    }

    /// Checks if a point is inside (inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Slab test. Returns the entry distance, or zero if `origin` is inside.
    #[must_use]
    pub fn ray_entry(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for (o, d, lo, hi) in [
            (origin.x, direction.x, self.min.x, self.max.x),
            (origin.y, direction.y, self.min.y, self.max.y),
            (origin.z, direction.z, self.min.z, self.max.z),
        ] {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let t1 = (lo - o) / d;
            let t2 = (hi - o) / d;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max < t_min.max(0.0) {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Level geometry made of tagged boxes.
#[derive(Clone, Debug, Default)]
pub struct BoxWorld {
    boxes: Vec<TaggedBox>,
}

impl BoxWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a box.
    pub fn add(&mut self, shape: TaggedBox) -> &mut Self {
        self.boxes.push(shape);
        self
    }

    /// Builder form of [`BoxWorld::add`].
    #[must_use]
    pub fn with(mut self, shape: TaggedBox) -> Self {
        self.boxes.push(shape);
        self
    }

    /// Square arena of `half_extent` with walls of `height` and `thickness`.
    #[must_use]
    pub fn walled_arena(half_extent: f32, height: f32, thickness: f32) -> Self {
        let h = half_extent;
        let t = thickness;
        Self::new()
            .with(TaggedBox::new(
                Vec3::new(-h - t, 0.0, -h - t),
                Vec3::new(h + t, height, -h),
                SurfaceTag::Room,
            ))
            .with(TaggedBox::new(
                Vec3::new(-h - t, 0.0, h),
                Vec3::new(h + t, height, h + t),
                SurfaceTag::Room,
            ))
            .with(TaggedBox::new(
                Vec3::new(-h - t, 0.0, -h),
                Vec3::new(-h, height, h),
                SurfaceTag::Room,
            ))
            .with(TaggedBox::new(
                Vec3::new(h, 0.0, -h),
                Vec3::new(h + t, height, h),
                SurfaceTag::Room,
            ))
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// True if the world has no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl SpatialQuery for BoxWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.boxes
            .iter()
            .filter_map(|b| {
                b.ray_entry(origin, direction)
                    .filter(|&t| t <= max_distance)
                    .map(|distance| RayHit { distance, tag: b.tag })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> BoxWorld {
        BoxWorld::new().with(TaggedBox::new(
            Vec3::new(-5.0, 0.0, -3.0),
            Vec3::new(5.0, 3.0, -2.0),
            SurfaceTag::Room,
        ))
    }

    #[test]
    fn test_open_field_never_hits() {
        assert!(OpenField.raycast(Vec3::ZERO, Vec3::FORWARD, 100.0).is_none());
        assert!(!OpenField.is_blocked(Vec3::ZERO, Vec3::FORWARD, 100.0));
    }

    #[test]
    fn test_ray_hits_wall_in_front() {
        let world = wall();
        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::FORWARD, 10.0)
            .unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert_eq!(hit.tag, SurfaceTag::Room);
    }

    #[test]
    fn test_ray_respects_max_distance() {
        let world = wall();
        assert!(world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::FORWARD, 1.5)
            .is_none());
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let world = wall();
        assert!(world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 10.0)
            .is_none());
    }

    #[test]
    fn test_origin_inside_reports_zero() {
        let world = wall();
        let hit = world
            .raycast(Vec3::new(0.0, 1.0, -2.5), -Vec3::Y, 2.0)
            .unwrap();
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_nearest_box_wins() {
        let world = wall().with(TaggedBox::new(
            Vec3::new(-1.0, 0.0, -1.2),
            Vec3::new(1.0, 2.0, -1.0),
            SurfaceTag::Obstacle,
        ));
        let hit = world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::FORWARD, 10.0)
            .unwrap();
        assert_eq!(hit.tag, SurfaceTag::Obstacle);
        assert!((hit.distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_other_tag_does_not_block() {
        let world = BoxWorld::new().with(TaggedBox::new(
            Vec3::new(-1.0, 0.0, -2.0),
            Vec3::new(1.0, 2.0, -1.0),
            SurfaceTag::Other,
        ));
        assert!(world
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::FORWARD, 5.0)
            .is_some());
        assert!(!world.is_blocked(Vec3::new(0.0, 1.0, 0.0), Vec3::FORWARD, 5.0));
    }

    #[test]
    fn test_walled_arena_encloses_origin() {
        let arena = BoxWorld::walled_arena(10.0, 3.0, 1.0);
        assert_eq!(arena.len(), 4);
        for dir in [
            Vec3::FORWARD,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ] {
            let hit = arena.raycast(Vec3::new(0.0, 1.0, 0.0), dir, 20.0).unwrap();
            assert!((hit.distance - 10.0).abs() < 1e-4);
        }
    }
}
