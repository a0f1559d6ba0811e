use glam::Vec2;
use inkstroke_config::{CoordinateSpace, Rgba};
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

/// A pointer observation as captured by the host
///
/// `pressure` is `None` when the device reports none; a
/// [`PressureSource`](crate::pressure::PressureSource) resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub x: f32,
    pub y: f32,
    pub pressure: Option<f32>,
    /// Time or index, monotonically non-decreasing
    pub sequence: f64,
}

impl RawSample {
    pub fn new(x: f32, y: f32, pressure: Option<f32>, sequence: f64) -> Self {
        Self {
            x,
            y,
            pressure,
            sequence,
        }
    }
}

/// A pointer observation with resolved pressure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub sequence: f64,
}

impl Sample {
    pub fn new(x: f32, y: f32, pressure: f32, sequence: f64) -> Self {
        Self {
            x,
            y,
            pressure,
            sequence,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// True when every field is finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.pressure.is_finite()
            && self.sequence.is_finite()
    }
}

/// A tapered capsule: two discs and the linear blend between them
///
/// Consecutive segments of a stroke share endpoints conceptually but are
/// stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
    pub radius_a: f32,
    pub radius_b: f32,
    /// Fringe beyond the radius over which coverage fades out, device pixels
    pub softness: f32,
    pub color: Rgba,
}

impl Segment {
    /// A zero-length segment (round dot)
    pub fn dot(center: Vec2, radius: f32, softness: f32, color: Rgba) -> Self {
        Self {
            a: center,
            b: center,
            radius_a: radius,
            radius_b: radius,
            softness,
            color,
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    #[inline]
    pub fn max_radius(&self) -> f32 {
        self.radius_a.max(self.radius_b)
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.a == self.b
    }
}

/// Coordinate-space metadata carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Scale that was applied to input coordinates
    pub device_scale: f32,
    /// Space of the segment coordinates (always device pixels)
    pub coordinate_space: CoordinateSpace,
}

/// Ordered tapered-capsule chain for one stroke plus its bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecord {
    pub segments: Vec<Segment>,
    pub bounds: Bounds,
    pub metadata: RecordMetadata,
}

impl StrokeRecord {
    /// Host-space position of the raster origin (device bounds divided by scale)
    pub fn host_origin(&self) -> Vec2 {
        Vec2::new(self.bounds.x_min as f32, self.bounds.y_min as f32) / self.metadata.device_scale
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
