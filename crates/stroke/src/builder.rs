//! Stroke record builder
//!
//! Turns a sample stream into an ordered chain of tapered capsules. The
//! builder can run incrementally while a stroke is captured
//! (`begin_stroke` / `push` / `finish`) or in one call with
//! [`build_stroke_record`]; both produce the same record.

use glam::Vec2;
use inkstroke_config::{CoordinateSpace, Rgba, StrokeConfig};
use tracing::debug;

use crate::bounds::BoundsAccumulator;
use crate::constants::{DEGENERATE_SEGMENT_LEN, MAX_RADIUS_DELTA_PER_SEGMENT_PX, MIN_RADIUS_PX};
use crate::normalize::SampleNormalizer;
use crate::types::{RecordMetadata, Sample, Segment, StrokeRecord};

/// Endpoint radius in device pixels for a pressure value
///
/// `max(0.5, max(min_pressure, pressure) * diameter / 2 * scale)`
pub fn pressure_to_radius(pressure: f32, config: &StrokeConfig) -> f32 {
    let p = pressure.max(config.min_pressure);
    let radius = config.diameter * config.effective_scale() * p / 2.0;
    radius.max(MIN_RADIUS_PX)
}

/// Incremental stroke record builder
///
/// Samples go through a [`SampleNormalizer`] first, so raw host samples
/// can be pushed directly.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    /// Sanitized configuration
    config: StrokeConfig,
    /// Effective segment color (opacity folded in)
    color: Rgba,
    normalizer: SampleNormalizer,
    /// Last normalized sample (None if stroke not started)
    prev: Option<Sample>,
    /// Normalized samples accepted so far
    sample_count: usize,
    segments: Vec<Segment>,
    bounds: BoundsAccumulator,
    /// Terminal dot for a trailing degenerate pair; dropped if the stroke moves on
    pending_dot: Option<Segment>,
}

impl StrokeBuilder {
    /// Create a builder for the given config
    pub fn new(config: &StrokeConfig) -> Self {
        let config = config.sanitized();
        Self {
            color: config.effective_color(),
            normalizer: SampleNormalizer::new(&config),
            config,
            prev: None,
            sample_count: 0,
            segments: Vec::new(),
            bounds: BoundsAccumulator::new(),
            pending_dot: None,
        }
    }

    /// Get the (sanitized) config
    pub fn config(&self) -> &StrokeConfig {
        &self.config
    }

    /// Start a new stroke, discarding any previous state
    pub fn begin_stroke(&mut self) {
        self.normalizer.reset();
        self.prev = None;
        self.sample_count = 0;
        self.segments.clear();
        self.bounds = BoundsAccumulator::new();
        self.pending_dot = None;
    }

    /// Number of segments emitted so far (excluding a pending terminal dot)
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Feed one raw sample; returns how many segments it emitted
    pub fn push(&mut self, sample: Sample) -> usize {
        let Some(cur) = self.normalizer.push(sample) else {
            return 0;
        };
        self.sample_count += 1;

        // First point in stroke
        let Some(prev) = self.prev.replace(cur) else {
            return 0;
        };

        let a = prev.position();
        let b = cur.position();
        let radius_a = pressure_to_radius(prev.pressure, &self.config);
        let radius_b = pressure_to_radius(cur.pressure, &self.config);

        // Skip near-zero pairs, but remember the terminal point: devices often
        // report repeated stationary samples at stroke end.
        if a.distance(b) < DEGENERATE_SEGMENT_LEN {
            self.pending_dot = Some(Segment::dot(b, radius_b, self.config.softness, self.color));
            return 0;
        }
        self.pending_dot = None;

        let dr = (radius_b - radius_a).abs();
        let steps = ((dr / MAX_RADIUS_DELTA_PER_SEGMENT_PX).ceil() as usize).max(1);

        for k in 0..steps {
            let t0 = k as f32 / steps as f32;
            let t1 = (k + 1) as f32 / steps as f32;

            let segment = Segment {
                a: a.lerp(b, t0),
                b: a.lerp(b, t1),
                radius_a: radius_a + (radius_b - radius_a) * t0,
                radius_b: radius_a + (radius_b - radius_a) * t1,
                softness: self.config.softness,
                color: self.color,
            };
            self.emit(segment);
        }

        steps
    }

    fn emit(&mut self, segment: Segment) {
        self.bounds.add_segment(&segment);
        self.segments.push(segment);
    }

    /// Record for the samples pushed so far, without ending the stroke
    pub fn snapshot(&self) -> StrokeRecord {
        let mut segments = self.segments.clone();
        let mut bounds = self.bounds;

        if let Some(dot) = self.trailing_dot() {
            bounds.add_segment(&dot);
            segments.push(dot);
        }

        StrokeRecord {
            segments,
            bounds: bounds.finalize(),
            metadata: self.metadata(),
        }
    }

    /// End the stroke and take its record; the builder is reset
    pub fn finish(&mut self) -> StrokeRecord {
        if let Some(dot) = self.trailing_dot() {
            self.emit(dot);
        }

        let record = StrokeRecord {
            segments: std::mem::take(&mut self.segments),
            bounds: self.bounds.finalize(),
            metadata: self.metadata(),
        };

        debug!(
            "StrokeBuilder::finish: {} samples -> {} segments, bounds {}x{} at ({}, {})",
            self.sample_count,
            record.segments.len(),
            record.bounds.width,
            record.bounds.height,
            record.bounds.x_min,
            record.bounds.y_min
        );

        self.begin_stroke();
        record
    }

    /// Dot that completes the record: a pending terminal dot, a single-sample
    /// dot, or the minimal origin dot when no valid sample arrived.
    fn trailing_dot(&self) -> Option<Segment> {
        if let Some(dot) = self.pending_dot {
            return Some(dot);
        }
        if !self.segments.is_empty() {
            return None;
        }

        let dot = match self.prev {
            Some(only) if self.sample_count == 1 => Segment::dot(
                only.position(),
                pressure_to_radius(only.pressure, &self.config),
                self.config.softness,
                self.color,
            ),
            _ => Segment::dot(Vec2::ZERO, MIN_RADIUS_PX, self.config.softness, self.color),
        };
        Some(dot)
    }

    fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            device_scale: self.config.effective_scale(),
            coordinate_space: CoordinateSpace::DevicePx,
        }
    }
}

/// Build a whole stroke record in one call
pub fn build_stroke_record(samples: &[Sample], config: &StrokeConfig) -> StrokeRecord {
    let mut builder = StrokeBuilder::new(config);
    for sample in samples {
        builder.push(*sample);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;

    fn sample(x: f32, y: f32, p: f32) -> Sample {
        Sample::new(x, y, p, 0.0)
    }

    fn config() -> StrokeConfig {
        StrokeConfig {
            diameter: 4.0,
            device_scale: 2.0,
            softness: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_pressure_to_radius() {
        let config = config();
        // 4 * 2 * 1 / 2
        assert!((pressure_to_radius(1.0, &config) - 4.0).abs() < 1e-6);
        // min_pressure 0.05 -> 0.2, floored to 0.5
        assert_eq!(pressure_to_radius(0.0, &config), MIN_RADIUS_PX);
    }

    #[test]
    fn test_single_sample_is_dot() {
        let record = build_stroke_record(&[sample(10.0, 10.0, 1.0)], &config());
        assert_eq!(record.segments.len(), 1);
        let dot = record.segments[0];
        assert!(dot.is_dot());
        assert_eq!(dot.a, Vec2::new(20.0, 20.0));
        assert!(dot.radius_a > 0.0);
        assert!(!record.bounds.is_empty());
    }

    #[test]
    fn test_no_valid_samples_is_minimal_dot() {
        let record = build_stroke_record(&[sample(f32::NAN, 0.0, 1.0)], &config());
        assert_eq!(record.segments.len(), 1);
        assert!(record.segments[0].is_dot());
        assert_eq!(record.segments[0].radius_a, MIN_RADIUS_PX);

        let record = build_stroke_record(&[], &config());
        assert_eq!(record.segments.len(), 1);
    }

    #[test]
    fn test_dense_samples_are_preserved() {
        let samples: Vec<Sample> = (0..100).map(|i| sample(i as f32 * 0.01, 0.0, 1.0)).collect();
        let record = build_stroke_record(&samples, &config());
        assert_eq!(record.segments.len(), samples.len() - 1);
    }

    #[test]
    fn test_dense_samples_are_preserved_at_unit_scale() {
        // 0.01 apart in device pixels, spacing rounds slightly below 0.01 in f32
        let samples: Vec<Sample> = (0..100).map(|i| sample(i as f32 * 0.01, 0.0, 1.0)).collect();
        let record = build_stroke_record(&samples, &StrokeConfig::default());
        assert_eq!(record.segments.len(), samples.len() - 1);
        assert!(record.segments.iter().all(|s| !s.is_dot()));
    }

    #[test]
    fn test_radius_change_is_subdivided() {
        let samples = [sample(0.0, 0.0, 0.25), sample(20.0, 0.0, 1.0)];
        let record = build_stroke_record(&samples, &config());
        // radii 1.0 -> 4.0, three sub-segments of 1px radius change
        assert_eq!(record.segments.len(), 3);
        for seg in &record.segments {
            assert!((seg.radius_b - seg.radius_a).abs() <= MAX_RADIUS_DELTA_PER_SEGMENT_PX + 1e-5);
        }
        // Chain is contiguous and spans the full pair
        assert_eq!(record.segments[0].a, Vec2::new(0.0, 0.0));
        assert_eq!(record.segments[2].b, Vec2::new(40.0, 0.0));
        for pair in record.segments.windows(2) {
            assert!(pair[0].b.distance(pair[1].a) < 1e-4);
        }
    }

    #[test]
    fn test_trailing_degenerate_pair_emits_dot() {
        let samples = [
            sample(0.0, 0.0, 1.0),
            sample(10.0, 0.0, 1.0),
            sample(10.0, 0.0, 1.0),
        ];
        let record = build_stroke_record(&samples, &config());
        assert_eq!(record.segments.len(), 2);
        assert!(record.segments[1].is_dot());
        assert_eq!(record.segments[1].a, Vec2::new(20.0, 0.0));
    }

    #[test]
    fn test_interior_degenerate_pair_is_skipped() {
        let samples = [
            sample(0.0, 0.0, 1.0),
            sample(0.0, 0.0, 1.0),
            sample(10.0, 0.0, 1.0),
        ];
        let record = build_stroke_record(&samples, &config());
        assert_eq!(record.segments.len(), 1);
        assert!(!record.segments[0].is_dot());
    }

    #[test]
    fn test_incremental_snapshot_matches_batch() {
        let samples: Vec<Sample> = (0..30)
            .map(|i| sample(i as f32 * 2.0, (i as f32 * 0.3).cos() * 8.0, 0.3 + (i % 5) as f32 * 0.15))
            .collect();
        let batch = build_stroke_record(&samples, &config());

        let mut builder = StrokeBuilder::new(&config());
        builder.begin_stroke();
        for s in &samples {
            builder.push(*s);
        }
        assert_eq!(builder.snapshot(), batch);
        assert_eq!(builder.finish(), batch);
        // Builder is reset after finish
        assert_eq!(builder.segment_count(), 0);
    }

    #[test]
    fn test_bounds_contain_every_segment() {
        let samples = [sample(0.0, 0.0, 0.2), sample(15.0, 7.0, 0.9), sample(-4.0, 12.0, 0.5)];
        let record = build_stroke_record(&samples, &config());
        for seg in &record.segments {
            let mut acc = BoundsAccumulator::new();
            acc.add_segment(seg);
            assert!(record.bounds.contains(&acc.finalize()));
        }
        assert_ne!(record.bounds, Bounds::EMPTY);
    }

    #[test]
    fn test_far_apart_samples_build_finite_bounds() {
        let samples = [sample(-3e9, 0.0, 1.0), sample(3e9, 0.0, 1.0)];
        let record = build_stroke_record(&samples, &StrokeConfig::default());
        assert_eq!(record.segments.len(), 1);
        assert!(record.bounds.x_min < 0 && record.bounds.x_max > 0);
        assert!(record.bounds.width > 0 && record.bounds.height > 0);
    }

    #[test]
    fn test_metadata_and_color() {
        let config = StrokeConfig {
            opacity: 0.5,
            ..config()
        };
        let record = build_stroke_record(&[sample(1.0, 1.0, 1.0)], &config);
        assert_eq!(record.metadata.device_scale, 2.0);
        assert_eq!(record.metadata.coordinate_space, CoordinateSpace::DevicePx);
        assert!((record.segments[0].color.a - 0.5).abs() < 1e-6);
    }
}
