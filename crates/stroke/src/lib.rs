//! Freehand stroke engine - tapered-capsule records, rasterization and outlines
//!
//! This crate turns pressure-varying pointer samples into ink:
//! - [`pressure`] - Pluggable pressure sources for raw samples
//! - [`normalize`] - Finite filter, device scaling and smoothing
//! - [`builder`] - Tapered-capsule segment chains ([`types::StrokeRecord`])
//! - [`bounds`] - Analytic, conservative pixel bounds
//! - [`raster`] - CPU (and, with the `gpu` feature, wgpu) rasterizers
//! - [`surface`] - Premultiplied f32 CPU surface
//! - [`outline`] - Closed, simple outline polygons
//! - [`pipeline`] - One-stop stroke pipeline

pub mod bounds;
pub mod builder;
pub mod constants;
pub mod normalize;
pub mod outline;
pub mod pipeline;
pub mod pressure;
pub mod raster;
pub mod surface;
pub mod types;

pub use bounds::*;
pub use builder::*;
pub use constants::*;
pub use normalize::*;
pub use outline::{extract_outlines, outline_points, OutlinePolygon};
pub use pipeline::*;
pub use pressure::*;
pub use raster::*;
pub use surface::*;
pub use types::*;

pub use inkstroke_config::{
    CoordinateSpace, OutlineConfig, RasterOptions, Rgba, StrokeConfig,
};
