//! CPU surface for stroke rasterization - premultiplied f32 storage

/// A premultiplied RGBA CPU surface
/// Stores pixels as [f32; 4] so overlapping segments blend without 8-bit drift
#[derive(Debug, Clone)]
pub struct CpuSurface {
    /// Surface dimensions
    pub width: u32,
    pub height: u32,
    /// Pixel data in row-major order, each pixel is premultiplied [r, g, b, a]
    pixels: Vec<[f32; 4]>,
}

impl CpuSurface {
    /// Create a new surface with the given dimensions, initialized to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![[0.0, 0.0, 0.0, 0.0]; pixel_count],
        }
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        Some(self.pixels[index])
    }

    /// Composite a premultiplied source over a pixel
    /// Formula: out = src + dst * (1 - src.a)
    #[inline]
    pub fn composite_over(&mut self, x: u32, y: u32, src: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        let dst = self.pixels[index];
        let inv_src_alpha = 1.0 - src[3];

        self.pixels[index] = [
            src[0] + dst[0] * inv_src_alpha,
            src[1] + dst[1] * inv_src_alpha,
            src[2] + dst[2] * inv_src_alpha,
            src[3] + dst[3] * inv_src_alpha,
        ];
    }

    /// Quantize to premultiplied RGBA8, row-major
    pub fn to_rgba8_premultiplied(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            for channel in pixel {
                out.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        out
    }
}
