//! Signed distance to a tapered capsule
//!
//! The capsule is the convex hull of two discs. Working in the segment's
//! own frame (`y` along the axis, `x` the unsigned distance from it), the
//! hull's side is the external tangent line; its foot on the axis is found
//! by sliding `y` by `k * x / sqrt(1 - k^2)` with `k = (rb - ra) / len`.
//! Points whose foot falls outside the segment belong to an end disc.
//!
//! The WGSL fragment stage in `shaders/stroke.wgsl` mirrors this function.

use glam::Vec2;

use crate::constants::ZERO_LENGTH_EPSILON;
use crate::types::Segment;

/// Result of a distance query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaperedDistance {
    /// Signed distance to the capsule boundary (negative inside)
    pub dist: f32,
    /// Closest-feature parameter along the axis in 0..=1
    pub u: f32,
    /// Interpolated radius at `u`
    pub radius: f32,
}

/// Signed distance from `point` to the tapered capsule of `segment`
pub fn distance_to_tapered_segment(point: Vec2, segment: &Segment) -> TaperedDistance {
    let a = segment.a;
    let b = segment.b;
    let ra = segment.radius_a;
    let rb = segment.radius_b;

    let ab = b - a;
    let len = ab.length();

    if len <= ZERO_LENGTH_EPSILON {
        let radius = ra.max(rb);
        return TaperedDistance {
            dist: point.distance(a) - radius,
            u: 0.0,
            radius,
        };
    }

    let dr = rb - ra;

    // One disc swallows the other: the hull is the bigger disc.
    if dr.abs() >= len {
        return if dr >= 0.0 {
            TaperedDistance {
                dist: point.distance(b) - rb,
                u: 1.0,
                radius: rb,
            }
        } else {
            TaperedDistance {
                dist: point.distance(a) - ra,
                u: 0.0,
                radius: ra,
            }
        };
    }

    let e = ab / len;
    let n = Vec2::new(-e.y, e.x);
    let ap = point - a;
    let y = ap.dot(e);
    let x = ap.dot(n).abs();

    let k = dr / len;
    let c = (1.0 - k * k).sqrt();
    let t = y + k * x / c;

    if t <= 0.0 {
        TaperedDistance {
            dist: point.distance(a) - ra,
            u: 0.0,
            radius: ra,
        }
    } else if t >= len {
        TaperedDistance {
            dist: point.distance(b) - rb,
            u: 1.0,
            radius: rb,
        }
    } else {
        let u = t / len;
        TaperedDistance {
            dist: x * c - ra - k * y,
            u,
            radius: ra + dr * u,
        }
    }
}

/// Hermite smoothstep, 0 below `edge0` and 1 above `edge1`
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Coverage in 0..=1 for a signed distance and fringe width
///
/// Full inside the capsule, hard edge when `softness` is 0.
#[inline]
pub fn coverage(dist: f32, softness: f32) -> f32 {
    if dist <= 0.0 {
        1.0
    } else if softness > 0.0 {
        1.0 - smoothstep(0.0, softness, dist)
    } else {
        0.0
    }
}
