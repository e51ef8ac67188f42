//! Hit tests between players, rivals, pickups, hazards and the laser
//!
//! Everything here is pure geometry on canvas pixels. Entities are boxes with
//! a top-left origin; circle tests use box centres.

use glam::Vec2;

use crate::Rect;

/// Strict axis-aligned box overlap (touching edges do not overlap)
#[inline]
pub fn aabb_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// True when two centres are closer than `reach`
///
/// Used for pickups (reach = pickup radius + player half-width), hazards
/// (hazard radius + player half-width) and the target zone.
#[inline]
pub fn within_reach(a: Vec2, b: Vec2, reach: f32) -> bool {
    a.distance(b) < reach
}

/// Laser beam as a finite segment with thickness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub half_width: f32,
}

impl LaserSegment {
    /// Beam from `origin` along `dir` for `range` pixels
    pub fn new(origin: Vec2, dir: Vec2, range: f32, width: f32) -> Self {
        Self {
            start: origin,
            end: origin + dir * range,
            half_width: width / 2.0,
        }
    }

    /// Closest point on the segment to `p` (projection clamped to [0, 1])
    pub fn closest_point(&self, p: Vec2) -> Option<Vec2> {
        let seg = self.end - self.start;
        let len_sq = seg.length_squared();
        if len_sq <= 0.0 {
            // Zero-length beam hits nothing
            return None;
        }
        let t = ((p - self.start).dot(seg) / len_sq).clamp(0.0, 1.0);
        Some(self.start + seg * t)
    }

    /// Does the beam touch a target of the given half-width centred at `center`?
    pub fn hits(&self, center: Vec2, target_half_width: f32) -> bool {
        let Some(closest) = self.closest_point(center) else {
            return false;
        };
        let threshold = target_half_width + self.half_width;
        center.distance_squared(closest) < threshold * threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(aabb_overlap(&a, &Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Edge contact is not an overlap
        assert!(!aabb_overlap(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!aabb_overlap(&a, &Rect::new(0.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_within_reach_is_strict() {
        let a = Vec2::new(0.0, 0.0);
        assert!(within_reach(a, Vec2::new(3.0, 4.0), 5.01));
        assert!(!within_reach(a, Vec2::new(3.0, 4.0), 5.0));
    }

    #[test]
    fn test_laser_hits_on_axis() {
        let laser = LaserSegment::new(Vec2::new(100.0, 100.0), Vec2::X, 300.0, 5.0);
        assert!(laser.hits(Vec2::new(250.0, 100.0), 19.0));
        // Behind the origin: clamped to start, too far away
        assert!(!laser.hits(Vec2::new(40.0, 100.0), 19.0));
        // Past the end but within reach of the endpoint
        assert!(laser.hits(Vec2::new(415.0, 100.0), 19.0));
        assert!(!laser.hits(Vec2::new(430.0, 100.0), 19.0));
    }

    #[test]
    fn test_laser_perpendicular_threshold() {
        let laser = LaserSegment::new(Vec2::ZERO, Vec2::X, 300.0, 5.0);
        // threshold = 19 + 2.5
        assert!(laser.hits(Vec2::new(150.0, 21.4), 19.0));
        assert!(!laser.hits(Vec2::new(150.0, 21.6), 19.0));
    }

    #[test]
    fn test_zero_length_laser_misses() {
        let laser = LaserSegment::new(Vec2::new(5.0, 5.0), Vec2::ZERO, 300.0, 5.0);
        assert!(!laser.hits(Vec2::new(5.0, 5.0), 19.0));
    }

    proptest! {
        #[test]
        fn prop_laser_on_ray_within_range_hits(along in 0.0f32..300.0, angle in 0.0f32..std::f32::consts::TAU) {
            let dir = Vec2::from_angle(angle);
            let laser = LaserSegment::new(Vec2::new(400.0, 300.0), dir, 300.0, 5.0);
            let target = laser.start + dir * along;
            prop_assert!(laser.hits(target, 19.0));
        }

        #[test]
        fn prop_laser_offset_beyond_threshold_misses(along in 0.0f32..300.0, extra in 0.1f32..200.0, angle in 0.0f32..std::f32::consts::TAU) {
            let dir = Vec2::from_angle(angle);
            let laser = LaserSegment::new(Vec2::new(400.0, 300.0), dir, 300.0, 5.0);
            let perp = dir.perp();
            let target = laser.start + dir * along + perp * (19.0 + 2.5 + extra);
            prop_assert!(!laser.hits(target, 19.0));
        }
    }
}
