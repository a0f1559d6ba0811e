//! CPU rasterizer
//!
//! Evaluates the tapered-capsule distance per pixel center inside each
//! segment's own rectangle and composites into a premultiplied f32 surface.

use glam::Vec2;
use inkstroke_config::RasterOptions;
use tracing::debug;

use super::sdf::{coverage, distance_to_tapered_segment};
use super::{scan_bounds_by_alpha, RasterImage, RasterOutput, RenderBackend};
use crate::bounds::segment_pixel_rect;
use crate::surface::CpuSurface;
use crate::types::StrokeRecord;

/// Rasterize a record into premultiplied RGBA8 sized to its bounds
pub fn rasterize_cpu(record: &StrokeRecord, options: &RasterOptions) -> RasterOutput {
    let bounds = record.bounds;

    if bounds.is_empty() || record.segments.is_empty() {
        return RasterOutput {
            image: RasterImage::transparent(bounds),
            bounds,
            bounds_exact: None,
            backend: RenderBackend::Cpu,
        };
    }

    let mut surface = CpuSurface::new(bounds.width, bounds.height);
    let mut skipped = 0usize;

    for segment in &record.segments {
        let rect = segment_pixel_rect(segment).intersect(&bounds);
        if rect.is_empty() || segment.color.a <= 0.0 {
            skipped += 1;
            continue;
        }

        let src = segment.color.premultiplied();

        for py in rect.y_min..rect.y_max {
            let cy = py as f32 + 0.5;
            for px in rect.x_min..rect.x_max {
                let center = Vec2::new(px as f32 + 0.5, cy);
                let d = distance_to_tapered_segment(center, segment);
                let cov = coverage(d.dist, segment.softness);
                if cov <= 0.0 {
                    continue;
                }

                surface.composite_over(
                    (px - bounds.x_min) as u32,
                    (py - bounds.y_min) as u32,
                    [src[0] * cov, src[1] * cov, src[2] * cov, src[3] * cov],
                );
            }
        }
    }

    debug!(
        "rasterize_cpu: {} segments ({} skipped) into {}x{}",
        record.segments.len(),
        skipped,
        bounds.width,
        bounds.height
    );

    let image = RasterImage {
        bounds,
        width: bounds.width,
        height: bounds.height,
        data: surface.to_rgba8_premultiplied(),
    };

    let bounds_exact = if options.refine_bounds_by_scan {
        scan_bounds_by_alpha(&image, options.alpha_threshold)
    } else {
        None
    };

    RasterOutput {
        image,
        bounds,
        bounds_exact,
        backend: RenderBackend::Cpu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::builder::build_stroke_record;
    use crate::types::{RecordMetadata, Sample, Segment};
    use inkstroke_config::{CoordinateSpace, Rgba, StrokeConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_walk(seed: u64, n: usize) -> Vec<Sample> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = 0.0f32;
        let mut y = 0.0f32;
        (0..n)
            .map(|i| {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let step = rng.gen_range(4.0..14.0);
                x += angle.cos() * step;
                y += angle.sin() * step;
                Sample::new(x, y, rng.gen_range(0.1..1.0), i as f64)
            })
            .collect()
    }

    fn record_of(segments: Vec<Segment>, bounds: Bounds) -> StrokeRecord {
        StrokeRecord {
            segments,
            bounds,
            metadata: RecordMetadata {
                device_scale: 1.0,
                coordinate_space: CoordinateSpace::DevicePx,
            },
        }
    }

    #[test]
    fn test_analytic_bounds_contain_painted_pixels() {
        for seed in 1..=15u64 {
            let samples = random_walk(1000 + seed, 80);
            let config = StrokeConfig {
                diameter: 2.0 + (seed % 3) as f32,
                device_scale: 2.0,
                softness: 1.0,
                ..Default::default()
            };
            let record = build_stroke_record(&samples, &config);
            let out = rasterize_cpu(&record, &RasterOptions::with_scan());

            assert_eq!(out.image.width, record.bounds.width);
            assert_eq!(out.image.height, record.bounds.height);

            let Some(exact) = out.bounds_exact else {
                continue;
            };
            let b = record.bounds;
            assert!(b.contains(&exact), "seed {seed}: {exact:?} outside {b:?}");
            assert!(exact.x_min - b.x_min <= 2, "seed {seed}: left slack");
            assert!(exact.y_min - b.y_min <= 2, "seed {seed}: top slack");
            assert!(b.x_max - exact.x_max <= 2, "seed {seed}: right slack");
            assert!(b.y_max - exact.y_max <= 2, "seed {seed}: bottom slack");
        }
    }

    #[test]
    fn test_opaque_hard_edge_is_binary() {
        let config = StrokeConfig {
            diameter: 6.0,
            softness: 0.0,
            ..Default::default()
        };
        let samples = random_walk(7, 20);
        let record = build_stroke_record(&samples, &config);
        let out = rasterize_cpu(&record, &RasterOptions::default());

        for px in out.image.data.chunks_exact(4) {
            assert!(px[3] == 0 || px[3] == 255, "alpha {}", px[3]);
        }
        assert!(out.image.data.chunks_exact(4).any(|p| p[3] == 255));
    }

    #[test]
    fn test_opaque_core_is_solid_with_soft_fringe() {
        let config = StrokeConfig {
            diameter: 5.0,
            softness: 1.5,
            ..Default::default()
        };
        let samples = random_walk(42, 40);
        let record = build_stroke_record(&samples, &config);
        let out = rasterize_cpu(&record, &RasterOptions::default());
        let b = record.bounds;

        let mut inside = 0usize;
        for y in 0..out.image.height {
            for x in 0..out.image.width {
                let center = Vec2::new(
                    (b.x_min + x as i32) as f32 + 0.5,
                    (b.y_min + y as i32) as f32 + 0.5,
                );
                let nearest = record
                    .segments
                    .iter()
                    .map(|s| distance_to_tapered_segment(center, s).dist)
                    .fold(f32::INFINITY, f32::min);
                let alpha = out.image.alpha(x, y);

                if nearest <= 0.0 {
                    inside += 1;
                    assert_eq!(alpha, 255, "pixel ({x}, {y}) inside the stroke");
                } else if nearest >= config.softness {
                    assert_eq!(alpha, 0, "pixel ({x}, {y}) beyond the fringe");
                }
            }
        }
        assert!(inside > 0);
    }

    #[test]
    fn test_self_overlap_is_not_additive() {
        // Two identical half-transparent segments: source-over gives 0.75, not 1.0
        let color = Rgba::new(1.0, 0.0, 0.0, 0.5);
        let seg = Segment {
            a: Vec2::new(5.0, 5.0),
            b: Vec2::new(15.0, 5.0),
            radius_a: 3.0,
            radius_b: 3.0,
            softness: 0.0,
            color,
        };
        let bounds = Bounds::from_edges(0, 0, 20, 10);
        let out = rasterize_cpu(&record_of(vec![seg, seg], bounds), &RasterOptions::default());
        // Pixel center (10.5, 5.5) is well inside
        assert_eq!(out.image.pixel(10, 5), Some([191, 0, 0, 191]));
    }

    #[test]
    fn test_image_origin_is_bounds_corner() {
        let seg = Segment::dot(Vec2::new(-20.0, 30.0), 2.0, 0.0, Rgba::BLACK);
        let bounds = Bounds::from_edges(-25, 25, -15, 35);
        let out = rasterize_cpu(&record_of(vec![seg], bounds), &RasterOptions::with_scan());
        // Center pixel (-20.5, 29.5) -> buffer (4, 4)
        assert_eq!(out.image.alpha(4, 4), 255);
        assert_eq!(out.image.alpha(0, 0), 0);
        let exact = out.bounds_exact.unwrap();
        assert!(exact.contains(&Bounds::from_edges(-21, 29, -19, 31)));
    }

    #[test]
    fn test_segment_outside_canvas_is_skipped() {
        let inside = Segment::dot(Vec2::new(5.0, 5.0), 2.0, 0.0, Rgba::BLACK);
        let outside = Segment::dot(Vec2::new(500.0, 500.0), 2.0, 0.0, Rgba::BLACK);
        let bounds = Bounds::from_edges(0, 0, 10, 10);
        let out = rasterize_cpu(&record_of(vec![inside, outside], bounds), &RasterOptions::default());
        assert_eq!(out.image.data.len(), 10 * 10 * 4);
        assert_eq!(out.image.alpha(5, 5), 255);
    }

    #[test]
    fn test_empty_bounds_gives_empty_image() {
        let seg = Segment::dot(Vec2::ZERO, 1.0, 0.0, Rgba::BLACK);
        let out = rasterize_cpu(&record_of(vec![seg], Bounds::EMPTY), &RasterOptions::with_scan());
        assert!(out.image.is_empty());
        assert!(out.image.data.is_empty());
        assert_eq!(out.bounds_exact, None);
    }

    #[test]
    fn test_single_sample_paints_dot() {
        let config = StrokeConfig::new(8.0, 1.0);
        let record = build_stroke_record(&[Sample::new(10.0, 10.0, 1.0, 0.0)], &config);
        let out = rasterize_cpu(&record, &RasterOptions::with_scan());
        let exact = out.bounds_exact.unwrap();
        // Radius 4 plus a 1px fringe around (10, 10)
        assert!(exact.x_min >= 4 && exact.x_max <= 16);
        assert!(exact.width >= 8);
    }
}
