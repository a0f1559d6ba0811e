//! Sample normalization: finite filter, pressure floor, device scaling and
//! one-pole smoothing.
//!
//! The smoothing pass is forward-only (no look-ahead) so it can run
//! incrementally while a stroke is being captured; the batch and incremental
//! forms produce identical output.

use inkstroke_config::StrokeConfig;
use tracing::debug;

use crate::constants::MIN_PRESSURE_FLOOR;
use crate::types::Sample;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Incremental normalizer, fed one sample at a time
#[derive(Debug, Clone)]
pub struct SampleNormalizer {
    scale: f32,
    /// Low-pass factor `1 - smoothing`
    alpha: f32,
    /// Last emitted sample, seeds the low-pass filter
    last: Option<Sample>,
    dropped: usize,
}

impl SampleNormalizer {
    /// Normalizer for the given config; the config is sanitized first
    pub fn new(config: &StrokeConfig) -> Self {
        let config = config.sanitized();
        Self::with_scale(config.effective_scale(), config.smoothing)
    }

    /// Normalizer with an explicit coordinate scale
    pub fn with_scale(scale: f32, smoothing: f32) -> Self {
        Self {
            scale,
            alpha: 1.0 - smoothing.clamp(0.0, 1.0),
            last: None,
            dropped: 0,
        }
    }

    /// Forget the filter state for a new stroke
    pub fn reset(&mut self) {
        self.last = None;
        self.dropped = 0;
    }

    /// Number of non-finite samples rejected since the last reset
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Normalize one sample; `None` if it had a non-finite field
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        if !sample.is_finite() {
            self.dropped += 1;
            return None;
        }

        // Never drop a sample for low pressure, clamp it instead so the
        // terminal sample always survives.
        let scaled = Sample::new(
            sample.x * self.scale,
            sample.y * self.scale,
            sample.pressure.max(MIN_PRESSURE_FLOOR),
            sample.sequence,
        );

        let out = match self.last {
            Some(prev) if self.alpha < 1.0 => Sample::new(
                lerp(prev.x, scaled.x, self.alpha),
                lerp(prev.y, scaled.y, self.alpha),
                lerp(prev.pressure, scaled.pressure, self.alpha),
                scaled.sequence,
            ),
            _ => scaled,
        };

        self.last = Some(out);
        Some(out)
    }
}

/// Normalize a whole stroke into device space
///
/// Output length equals the number of finite input samples.
pub fn normalize_samples(samples: &[Sample], config: &StrokeConfig) -> Vec<Sample> {
    let mut normalizer = SampleNormalizer::new(config);
    collect(&mut normalizer, samples)
}

/// Normalize without device scaling (outline extraction works in input space)
pub fn normalize_samples_unscaled(samples: &[Sample], smoothing: f32) -> Vec<Sample> {
    let mut normalizer = SampleNormalizer::with_scale(1.0, smoothing);
    collect(&mut normalizer, samples)
}

fn collect(normalizer: &mut SampleNormalizer, samples: &[Sample]) -> Vec<Sample> {
    let out: Vec<Sample> = samples.iter().filter_map(|s| normalizer.push(*s)).collect();

    if normalizer.dropped() > 0 {
        debug!(
            "normalize_samples: dropped {} non-finite samples of {}",
            normalizer.dropped(),
            samples.len()
        );
    }

    out
}
