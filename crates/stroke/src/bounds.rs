//! Analytic bounds for tapered-capsule chains
//!
//! Tapered capsules can extend beyond their larger radius because the two
//! external tangent lines joining unequal circles bulge outward. The extent
//! used here is the same one both rasterizers use for their per-segment
//! loops, so the final rectangle always contains every painted pixel.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PIXEL_COORD, PIXEL_CENTER_MARGIN, ZERO_LENGTH_EPSILON};
use crate::types::Segment;

/// Integer-pixel-aligned rectangle; `x_max`/`y_max` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Zero-area rectangle at the origin
    pub const EMPTY: Bounds = Bounds {
        x_min: 0,
        y_min: 0,
        x_max: 0,
        y_max: 0,
        width: 0,
        height: 0,
    };

    /// Build from edges; width/height never go negative
    pub fn from_edges(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            width: span(x_min, x_max),
            height: span(y_min, y_max),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when `other` lies entirely inside `self`
    pub fn contains(&self, other: &Bounds) -> bool {
        self.x_min <= other.x_min
            && self.y_min <= other.y_min
            && self.x_max >= other.x_max
            && self.y_max >= other.y_max
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Bounds::from_edges(
            self.x_min.min(other.x_min),
            self.y_min.min(other.y_min),
            self.x_max.max(other.x_max),
            self.y_max.max(other.y_max),
        )
    }

    /// Overlap of two rectangles (possibly empty)
    pub fn intersect(&self, other: &Bounds) -> Bounds {
        Bounds::from_edges(
            self.x_min.max(other.x_min),
            self.y_min.max(other.y_min),
            self.x_max.min(other.x_max),
            self.y_max.min(other.y_max),
        )
    }

    /// Pixel count of the rectangle
    #[inline]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn span(min: i32, max: i32) -> u32 {
    (i64::from(max) - i64::from(min)).clamp(0, i64::from(u32::MAX)) as u32
}

/// Distance a segment's footprint reaches beyond its endpoint bounding box
///
/// `max_radius + softness` when the radii match or one disc contains the
/// other; otherwise `max_radius / sqrt(1 - k^2) + softness` with
/// `k = |radius_b - radius_a| / length`.
pub fn segment_extent(segment: &Segment) -> f32 {
    let max_radius = segment.max_radius();
    let length = segment.length();
    let dr = (segment.radius_b - segment.radius_a).abs();

    if length > ZERO_LENGTH_EPSILON && dr > 0.0 && dr < length {
        let k = dr / length;
        let c = (1.0 - k * k).sqrt();
        max_radius / c + segment.softness
    } else {
        max_radius + segment.softness
    }
}

/// Integer rectangle touched by one segment, extent rounded up
///
/// Shared by the CPU loop bounds and the GPU instance quads.
pub fn segment_pixel_rect(segment: &Segment) -> Bounds {
    let extent = segment_extent(segment).ceil();
    let lo = segment.a.min(segment.b);
    let hi = segment.a.max(segment.b);

    Bounds::from_edges(
        (lo.x - extent).floor() as i32,
        (lo.y - extent).floor() as i32,
        (hi.x + extent).ceil() as i32,
        (hi.y + extent).ceil() as i32,
    )
}

/// Running union of segment footprints, snapped outward on finalize
#[derive(Debug, Clone, Copy)]
pub struct BoundsAccumulator {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
    has_data: bool,
}

impl Default for BoundsAccumulator {
    fn default() -> Self {
        Self {
            x_min: f32::INFINITY,
            y_min: f32::INFINITY,
            x_max: f32::NEG_INFINITY,
            y_max: f32::NEG_INFINITY,
            has_data: false,
        }
    }
}

impl BoundsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_data
    }

    /// Expand by a float rectangle
    pub fn add_rect(&mut self, x_min: f32, y_min: f32, x_max: f32, y_max: f32) {
        self.x_min = self.x_min.min(x_min);
        self.y_min = self.y_min.min(y_min);
        self.x_max = self.x_max.max(x_max);
        self.y_max = self.y_max.max(y_max);
        self.has_data = true;
    }

    /// Expand by one segment's analytic footprint
    pub fn add_segment(&mut self, segment: &Segment) {
        let extent = segment_extent(segment);
        let lo = segment.a.min(segment.b);
        let hi = segment.a.max(segment.b);
        self.add_rect(lo.x - extent, lo.y - extent, hi.x + extent, hi.y + extent);
    }

    /// Snap outward with the half-pixel margin; empty yields [`Bounds::EMPTY`]
    pub fn finalize(&self) -> Bounds {
        if !self.has_data {
            return Bounds::EMPTY;
        }

        let snap = |v: f32| v.clamp(-MAX_PIXEL_COORD, MAX_PIXEL_COORD) as i32;
        Bounds::from_edges(
            snap((self.x_min - PIXEL_CENTER_MARGIN).floor()),
            snap((self.y_min - PIXEL_CENTER_MARGIN).floor()),
            snap((self.x_max + PIXEL_CENTER_MARGIN).ceil()),
            snap((self.y_max + PIXEL_CENTER_MARGIN).ceil()),
        )
    }
}
