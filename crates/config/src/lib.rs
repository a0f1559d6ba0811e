//! Shared configuration for inkstroke
//!
//! This crate provides the single source of truth for how a freehand stroke is
//! turned into ink: input coordinate space, device scale, brush diameter,
//! pressure floor, softness fringe, smoothing and color. The same values drive
//! both the filled (raster) and the vector (outline) views of a stroke.

use serde::{Deserialize, Serialize};

/// Default brush diameter at pressure 1.0, in input units
pub const DEFAULT_DIAMETER: f32 = 4.0;

/// Default device scale factor (1.0 = no scaling)
pub const DEFAULT_DEVICE_SCALE: f32 = 1.0;

/// Default minimum pressure applied before radius computation
pub const DEFAULT_MIN_PRESSURE: f32 = 0.05;

/// Default softness fringe in device pixels
pub const DEFAULT_SOFTNESS: f32 = 1.0;

/// Default alpha threshold for exact-bounds scanning (one 8-bit step)
pub const DEFAULT_ALPHA_THRESHOLD: f32 = 1.0 / 255.0;

/// Default simplification tolerance for outline extraction, in input units
pub const DEFAULT_SIMPLIFY_TOLERANCE: f32 = 0.5;

/// Default number of arc steps used for a rounded outline cap
pub const DEFAULT_CAP_STEPS: u32 = 16;

/// Errors reported by [`StrokeConfig::validate`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid device scale: {0} (must be finite and > 0)")]
    InvalidDeviceScale(f32),
    #[error("Invalid diameter: {0} (must be finite and > 0)")]
    InvalidDiameter(f32),
    #[error("Invalid minimum pressure: {0} (must be finite and >= 0)")]
    InvalidMinPressure(f32),
    #[error("Invalid softness: {0} (must be finite and >= 0)")]
    InvalidSoftness(f32),
    #[error("Invalid smoothing: {0} (must be in 0..=1)")]
    InvalidSmoothing(f32),
    #[error("Invalid opacity: {0} (must be in 0..=1)")]
    InvalidOpacity(f32),
}

/// Coordinate space the input samples are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateSpace {
    /// Logical (CSS) pixels, multiplied by the device scale before rendering
    #[default]
    CssPx,
    /// Already device-scaled pixels
    DevicePx,
}

/// Straight-alpha RGBA color, each channel in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Color channels multiplied by alpha: [r*a, g*a, b*a, a]
    pub fn premultiplied(self) -> [f32; 4] {
        let a = self.a.clamp(0.0, 1.0);
        [self.r * a, self.g * a, self.b * a, a]
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Stroke configuration, supplied once per stroke build
///
/// Never mutated mid-build. Hosts usually deserialize this from their own
/// settings; every field has a default so partial documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrokeConfig {
    /// Coordinate space of incoming samples
    pub input_space: CoordinateSpace,
    /// Device pixel ratio; ignored when `input_space` is `DevicePx`
    pub device_scale: f32,
    /// Diameter at pressure 1.0, in input units
    pub diameter: f32,
    /// Pressure floor applied before radius computation
    pub min_pressure: f32,
    /// Feather fringe beyond the radius, in device pixels
    pub softness: f32,
    /// Low-pass smoothing coefficient in 0..=1 (0 = no smoothing)
    pub smoothing: f32,
    /// Fill color
    pub color: Rgba,
    /// Opacity multiplied into the color alpha
    pub opacity: f32,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            input_space: CoordinateSpace::default(),
            device_scale: DEFAULT_DEVICE_SCALE,
            diameter: DEFAULT_DIAMETER,
            min_pressure: DEFAULT_MIN_PRESSURE,
            softness: DEFAULT_SOFTNESS,
            smoothing: 0.0,
            color: Rgba::BLACK,
            opacity: 1.0,
        }
    }
}

impl StrokeConfig {
    /// Create a config for the given diameter and device scale with defaults elsewhere
    pub fn new(diameter: f32, device_scale: f32) -> Self {
        Self {
            diameter,
            device_scale,
            ..Default::default()
        }
    }

    /// Scale applied to input coordinates to reach device pixels
    pub fn effective_scale(&self) -> f32 {
        match self.input_space {
            CoordinateSpace::CssPx => self.device_scale,
            CoordinateSpace::DevicePx => 1.0,
        }
    }

    /// Fill color with opacity folded into alpha
    pub fn effective_color(&self) -> Rgba {
        self.color
            .with_alpha((self.color.a * self.opacity).clamp(0.0, 1.0))
    }

    /// Check every field, reporting the first invalid one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.device_scale.is_finite() || self.device_scale <= 0.0 {
            return Err(ConfigError::InvalidDeviceScale(self.device_scale));
        }
        if !self.diameter.is_finite() || self.diameter <= 0.0 {
            return Err(ConfigError::InvalidDiameter(self.diameter));
        }
        if !self.min_pressure.is_finite() || self.min_pressure < 0.0 {
            return Err(ConfigError::InvalidMinPressure(self.min_pressure));
        }
        if !self.softness.is_finite() || self.softness < 0.0 {
            return Err(ConfigError::InvalidSoftness(self.softness));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::InvalidSmoothing(self.smoothing));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::InvalidOpacity(self.opacity));
        }
        Ok(())
    }

    /// Copy with every field forced into its valid range
    ///
    /// Builders work on the sanitized copy so a bad host value degrades the
    /// stroke instead of failing it.
    pub fn sanitized(&self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };

        let device_scale = if self.device_scale.is_finite() && self.device_scale > 0.0 {
            self.device_scale
        } else {
            DEFAULT_DEVICE_SCALE
        };
        let diameter = if self.diameter.is_finite() && self.diameter > 0.0 {
            self.diameter
        } else {
            DEFAULT_DIAMETER
        };

        Self {
            input_space: self.input_space,
            device_scale,
            diameter,
            min_pressure: finite_or(self.min_pressure, DEFAULT_MIN_PRESSURE).max(0.0),
            softness: finite_or(self.softness, DEFAULT_SOFTNESS).max(0.0),
            smoothing: finite_or(self.smoothing, 0.0).clamp(0.0, 1.0),
            color: self.color,
            opacity: finite_or(self.opacity, 1.0).clamp(0.0, 1.0),
        }
    }
}

/// Options for the vector outline view of a stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutlineConfig {
    /// Forward simplification tolerance in input units (0 disables)
    pub simplify_tolerance: f32,
    /// Arc steps per rounded cap
    pub cap_steps: u32,
    /// Smoothing used for the outline instead of `StrokeConfig::smoothing`
    pub smoothing_override: Option<f32>,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            cap_steps: DEFAULT_CAP_STEPS,
            smoothing_override: None,
        }
    }
}

/// Options for rasterization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterOptions {
    /// Rescan the finished buffer for alpha-exact bounds
    pub refine_bounds_by_scan: bool,
    /// Alpha (0..=1) a pixel must reach to count for exact bounds
    pub alpha_threshold: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            refine_bounds_by_scan: false,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

impl RasterOptions {
    /// Options that request the exact-bounds scan with the default threshold
    pub fn with_scan() -> Self {
        Self {
            refine_bounds_by_scan: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StrokeConfig::default();
        assert_eq!(config.input_space, CoordinateSpace::CssPx);
        assert_eq!(config.device_scale, DEFAULT_DEVICE_SCALE);
        assert_eq!(config.diameter, DEFAULT_DIAMETER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_scale() {
        let mut config = StrokeConfig::new(4.0, 2.0);
        assert_eq!(config.effective_scale(), 2.0);

        config.input_space = CoordinateSpace::DevicePx;
        assert_eq!(config.effective_scale(), 1.0);
    }

    #[test]
    fn test_effective_color_folds_opacity() {
        let config = StrokeConfig {
            color: Rgba::new(1.0, 0.0, 0.0, 0.5),
            opacity: 0.5,
            ..Default::default()
        };
        let color = config.effective_color();
        assert_eq!(color.r, 1.0);
        assert!((color.a - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let config = StrokeConfig {
            device_scale: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidDeviceScale(0.0)));

        let config = StrokeConfig {
            smoothing: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSmoothing(1.5)));

        let config = StrokeConfig {
            diameter: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDiameter(_))
        ));
    }

    #[test]
    fn test_sanitized_is_always_valid() {
        let config = StrokeConfig {
            device_scale: f32::INFINITY,
            diameter: -3.0,
            min_pressure: f32::NAN,
            softness: -1.0,
            smoothing: 7.0,
            opacity: -0.5,
            ..Default::default()
        };
        let sanitized = config.sanitized();
        assert!(sanitized.validate().is_ok());
        assert_eq!(sanitized.device_scale, DEFAULT_DEVICE_SCALE);
        assert_eq!(sanitized.diameter, DEFAULT_DIAMETER);
        assert_eq!(sanitized.softness, 0.0);
        assert_eq!(sanitized.smoothing, 1.0);
        assert_eq!(sanitized.opacity, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: StrokeConfig =
            serde_json::from_str(r#"{ "inputSpace": "devicePx", "diameter": 8.0 }"#).unwrap();
        assert_eq!(config.input_space, CoordinateSpace::DevicePx);
        assert_eq!(config.diameter, 8.0);
        assert_eq!(config.softness, DEFAULT_SOFTNESS);
        assert_eq!(config.color, Rgba::BLACK);
    }

    #[test]
    fn test_premultiplied_color() {
        let color = Rgba::new(1.0, 0.5, 0.0, 0.5);
        assert_eq!(color.premultiplied(), [0.5, 0.25, 0.0, 0.5]);
    }

    #[test]
    fn test_raster_options_defaults() {
        let options = RasterOptions::default();
        assert!(!options.refine_bounds_by_scan);
        assert!((options.alpha_threshold - 1.0 / 255.0).abs() < 1e-9);
        assert!(RasterOptions::with_scan().refine_bounds_by_scan);
    }
}
