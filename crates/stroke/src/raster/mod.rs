//! Stroke rasterization
//!
//! Both backends fill a buffer sized exactly to the record's [`Bounds`],
//! with pixel `(0, 0)` at `(bounds.x_min, bounds.y_min)` in device space.
//! Pixels are sampled at their centers and composited premultiplied
//! source-over in segment order.

pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod sdf;

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

pub use cpu::rasterize_cpu;
#[cfg(feature = "gpu")]
pub use gpu::{GpuError, GpuRasterizer, GpuTarget};
pub use sdf::{coverage, distance_to_tapered_segment, TaperedDistance};

/// Which backend produced a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderBackend {
    Cpu,
    Gpu,
}

/// Premultiplied RGBA8 pixels positioned at `bounds`
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub bounds: Bounds,
    pub width: u32,
    pub height: u32,
    /// Row-major, 4 bytes per pixel, no row padding
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Transparent image covering `bounds`
    pub fn transparent(bounds: Bounds) -> Self {
        Self {
            bounds,
            width: bounds.width,
            height: bounds.height,
            data: vec![0; bounds.area() * 4],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at buffer coordinates
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Alpha at buffer coordinates, 0 outside the image
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y).map_or(0, |p| p[3])
    }

    /// Copy with color channels divided by alpha
    pub fn unpremultiplied(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 {
                px[..3].fill(0);
                continue;
            }
            for c in &mut px[..3] {
                *c = ((*c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
            }
        }
        out
    }
}

/// Result of a rasterization call
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOutput {
    pub image: RasterImage,
    /// Analytic bounds the image is positioned at
    pub bounds: Bounds,
    /// Tight bounds from the alpha scan, when requested and anything was painted
    pub bounds_exact: Option<Bounds>,
    pub backend: RenderBackend,
}

/// Smallest rectangle whose pixels reach `threshold` alpha (0..=1)
///
/// Returned in device space (offset by the image origin). `None` when no
/// pixel qualifies. The image itself is never cropped.
pub fn scan_bounds_by_alpha(image: &RasterImage, threshold: f32) -> Option<Bounds> {
    if image.is_empty() {
        return None;
    }

    let threshold = if threshold.is_finite() { threshold.clamp(0.0, 1.0) } else { 0.0 };
    // Anything painted counts, even with a zero threshold
    let min_alpha = (threshold * 255.0 - 1e-3).ceil().clamp(1.0, 255.0) as u8;

    let mut x_min = u32::MAX;
    let mut y_min = u32::MAX;
    let mut x_max = 0u32;
    let mut y_max = 0u32;
    let mut found = false;

    for (y, row) in image.data.chunks_exact(image.width as usize * 4).enumerate() {
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] >= min_alpha {
                let (x, y) = (x as u32, y as u32);
                x_min = x_min.min(x);
                y_min = y_min.min(y);
                x_max = x_max.max(x + 1);
                y_max = y_max.max(y + 1);
                found = true;
            }
        }
    }

    if !found {
        return None;
    }

    let ox = image.bounds.x_min;
    let oy = image.bounds.y_min;
    Some(Bounds::from_edges(
        ox + x_min as i32,
        oy + y_min as i32,
        ox + x_max as i32,
        oy + y_max as i32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with(bounds: Bounds, painted: &[(u32, u32, u8)]) -> RasterImage {
        let mut image = RasterImage::transparent(bounds);
        for &(x, y, a) in painted {
            let i = ((y * bounds.width + x) * 4) as usize;
            image.data[i + 3] = a;
        }
        image
    }

    #[test]
    fn test_scan_offsets_by_origin() {
        let bounds = Bounds::from_edges(-10, 5, 0, 15);
        let image = image_with(bounds, &[(2, 3, 255), (6, 7, 40)]);
        let exact = scan_bounds_by_alpha(&image, 1.0 / 255.0);
        assert_eq!(exact, Some(Bounds::from_edges(-8, 8, -3, 13)));
    }

    #[test]
    fn test_scan_threshold() {
        let bounds = Bounds::from_edges(0, 0, 8, 8);
        let image = image_with(bounds, &[(1, 1, 255), (6, 6, 10)]);
        assert_eq!(
            scan_bounds_by_alpha(&image, 0.5),
            Some(Bounds::from_edges(1, 1, 2, 2))
        );
        assert_eq!(
            scan_bounds_by_alpha(&image, 1.0 / 255.0),
            Some(Bounds::from_edges(1, 1, 7, 7))
        );
    }

    #[test]
    fn test_scan_nothing_painted() {
        let image = RasterImage::transparent(Bounds::from_edges(0, 0, 4, 4));
        assert_eq!(scan_bounds_by_alpha(&image, 0.0), None);
        assert_eq!(scan_bounds_by_alpha(&RasterImage::transparent(Bounds::EMPTY), 0.1), None);
    }

    #[test]
    fn test_pixel_access() {
        let bounds = Bounds::from_edges(0, 0, 3, 2);
        let image = image_with(bounds, &[(2, 1, 77)]);
        assert_eq!(image.pixel(2, 1), Some([0, 0, 0, 77]));
        assert_eq!(image.alpha(2, 1), 77);
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.alpha(9, 9), 0);
    }

    #[test]
    fn test_unpremultiplied() {
        let mut image = RasterImage::transparent(Bounds::from_edges(0, 0, 2, 1));
        image.data[..4].copy_from_slice(&[64, 32, 0, 128]);
        image.data[4..].copy_from_slice(&[10, 10, 10, 0]);
        let straight = image.unpremultiplied();
        assert_eq!(&straight[..4], &[128, 64, 0, 128]);
        assert_eq!(&straight[4..], &[0, 0, 0, 0]);
    }
}
