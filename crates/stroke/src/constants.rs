/// Smallest radius a segment endpoint may have, in device pixels.
pub const MIN_RADIUS_PX: f32 = 0.5;

/// Largest radius change a single emitted segment may carry, in device pixels.
pub const MAX_RADIUS_DELTA_PER_SEGMENT_PX: f32 = 1.0;

/// Consecutive samples closer than this (device pixels) form a degenerate pair.
///
/// Only coincident samples qualify; dense input spaced 0.01 apart must keep
/// every pair.
pub const DEGENERATE_SEGMENT_LEN: f32 = 1e-4;

/// Below this axis length a capsule is evaluated as a single disc.
pub const ZERO_LENGTH_EPSILON: f32 = 1e-5;

/// Pressure floor applied at the normalizer boundary.
pub const MIN_PRESSURE_FLOOR: f32 = 1e-4;

/// Neutral pressure used when a device reports none.
pub const NEUTRAL_PRESSURE: f32 = 1.0;

/// Half-pixel margin matching pixel-center sampling at (x + 0.5, y + 0.5).
pub const PIXEL_CENTER_MARGIN: f32 = 0.5;

/// Accumulated bounds are clamped to +/- this many device pixels, keeping
/// every edge difference inside `i32`.
pub const MAX_PIXEL_COORD: f32 = 536_870_912.0;

/// Outline points closer than this (input units) are merged.
pub const OUTLINE_POINT_EPSILON: f32 = 1e-4;
