//! Complete stroke pipeline
//!
//! Connects the pieces a host needs for one stroke:
//! - Pressure resolution for raw pointer samples
//! - Record building (normalize, segment, bounds)
//! - Rasterization on the GPU when available, on the CPU otherwise
//! - Outline extraction for vector consumers
//!
//! Each call is a pure function of its inputs except for the shared GPU
//! rasterizer, which serializes access internally.

#[cfg(feature = "gpu")]
use std::sync::Arc;

use inkstroke_config::{OutlineConfig, RasterOptions, StrokeConfig};
#[cfg(feature = "gpu")]
use tracing::warn;

use crate::builder::build_stroke_record;
use crate::outline::{extract_outlines, OutlinePolygon};
use crate::pressure::{resolve_pressure, ConstantPressure, PressureSource};
#[cfg(feature = "gpu")]
use crate::raster::gpu::GpuRasterizer;
#[cfg(feature = "gpu")]
use crate::raster::{scan_bounds_by_alpha, RenderBackend};
use crate::raster::{rasterize_cpu, RasterOutput};
use crate::types::{RawSample, StrokeRecord};

/// Stroke pipeline for one configuration
pub struct StrokePipeline {
    pub stroke: StrokeConfig,
    pub outline: OutlineConfig,
    pub raster: RasterOptions,
    pressure: Box<dyn PressureSource>,
    #[cfg(feature = "gpu")]
    gpu: Option<Arc<GpuRasterizer>>,
}

impl std::fmt::Debug for StrokePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokePipeline")
            .field("stroke", &self.stroke)
            .field("outline", &self.outline)
            .field("raster", &self.raster)
            .finish_non_exhaustive()
    }
}

impl Default for StrokePipeline {
    fn default() -> Self {
        Self::new(StrokeConfig::default())
    }
}

impl StrokePipeline {
    /// Create a CPU-only pipeline with constant neutral pressure
    pub fn new(stroke: StrokeConfig) -> Self {
        Self {
            stroke,
            outline: OutlineConfig::default(),
            raster: RasterOptions::default(),
            pressure: Box::new(ConstantPressure::default()),
            #[cfg(feature = "gpu")]
            gpu: None,
        }
    }

    pub fn with_outline(mut self, outline: OutlineConfig) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_raster_options(mut self, raster: RasterOptions) -> Self {
        self.raster = raster;
        self
    }

    /// Replace the pressure source used for raw samples
    pub fn with_pressure_source(mut self, source: impl PressureSource + 'static) -> Self {
        self.pressure = Box::new(source);
        self
    }

    /// Render through a shared GPU rasterizer when it is available
    #[cfg(feature = "gpu")]
    pub fn with_gpu(mut self, gpu: Arc<GpuRasterizer>) -> Self {
        self.gpu = Some(gpu);
        self
    }

    /// Build the segment record for a raw stroke
    pub fn build_record(&self, raw: &[RawSample]) -> StrokeRecord {
        let samples = resolve_pressure(raw, self.pressure.as_ref());
        build_stroke_record(&samples, &self.stroke)
    }

    /// Rasterize with the CPU backend
    pub fn rasterize_cpu(&self, record: &StrokeRecord) -> RasterOutput {
        rasterize_cpu(record, &self.raster)
    }

    /// Rasterize on the GPU if one is attached and working, else on the CPU
    ///
    /// GPU failures are logged and answered with the CPU result; no partial
    /// GPU output is ever returned.
    pub fn rasterize(&self, record: &StrokeRecord) -> RasterOutput {
        #[cfg(feature = "gpu")]
        {
            if let Some(gpu) = &self.gpu {
                match gpu.render_to_image(record) {
                    Ok(image) => {
                        let bounds_exact = if self.raster.refine_bounds_by_scan {
                            scan_bounds_by_alpha(&image, self.raster.alpha_threshold)
                        } else {
                            None
                        };
                        return RasterOutput {
                            image,
                            bounds: record.bounds,
                            bounds_exact,
                            backend: RenderBackend::Gpu,
                        };
                    }
                    Err(e) => warn!("GPU stroke render failed, using CPU: {}", e),
                }
            }
        }

        self.rasterize_cpu(record)
    }

    /// Outline polygons for a raw stroke, in input coordinates
    pub fn outline(&self, raw: &[RawSample]) -> Vec<OutlinePolygon> {
        let samples = resolve_pressure(raw, self.pressure.as_ref());
        extract_outlines(&samples, &self.stroke, &self.outline)
    }
}
