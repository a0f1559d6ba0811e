//! Pluggable pressure sources
//!
//! Devices that report no pressure still need one per sample. Rather than
//! baking in a simulated pressure curve, the resolution is delegated to a
//! [`PressureSource`]. The default is a constant neutral pressure.

use crate::constants::NEUTRAL_PRESSURE;
use crate::types::{RawSample, Sample};

/// Resolves the pressure of a raw sample
pub trait PressureSource: Send + Sync {
    /// Pressure for the sample at `index`; `previous` is the pressure
    /// resolved for the sample before it, if any
    fn pressure(&self, index: usize, raw: &RawSample, previous: Option<f32>) -> f32;
}

/// Ignores the device and returns the same pressure for every sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPressure(pub f32);

impl Default for ConstantPressure {
    fn default() -> Self {
        Self(NEUTRAL_PRESSURE)
    }
}

impl PressureSource for ConstantPressure {
    fn pressure(&self, _index: usize, _raw: &RawSample, _previous: Option<f32>) -> f32 {
        self.0
    }
}

/// Uses the reported pressure
///
/// A sample without a report reuses the previous resolved pressure, so a
/// device that drops a single report mid-stroke does not spike. Leading
/// samples without any report get `fallback`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePressure {
    pub fallback: f32,
}

impl Default for DevicePressure {
    fn default() -> Self {
        Self {
            fallback: NEUTRAL_PRESSURE,
        }
    }
}

impl PressureSource for DevicePressure {
    fn pressure(&self, _index: usize, raw: &RawSample, previous: Option<f32>) -> f32 {
        raw.pressure.or(previous).unwrap_or(self.fallback)
    }
}

impl<F> PressureSource for F
where
    F: Fn(usize, &RawSample, Option<f32>) -> f32 + Send + Sync,
{
    fn pressure(&self, index: usize, raw: &RawSample, previous: Option<f32>) -> f32 {
        self(index, raw, previous)
    }
}

/// Resolve pressure for a whole raw stroke, one output per input
pub fn resolve_pressure(raw: &[RawSample], source: &dyn PressureSource) -> Vec<Sample> {
    let mut previous = None;
    let mut out = Vec::with_capacity(raw.len());

    for (index, sample) in raw.iter().enumerate() {
        let pressure = source.pressure(index, sample, previous);
        if pressure.is_finite() {
            previous = Some(pressure);
        }
        out.push(Sample::new(sample.x, sample.y, pressure, sample.sequence));
    }

    out
}
