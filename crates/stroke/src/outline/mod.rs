//! Vector outline extraction
//!
//! Produces closed, simple polygons for vector consumers (hit-testing,
//! export) from the same samples the raster path consumes. Coordinates stay
//! in input space.
//!
//! The centerline is offset into a left and a right rail. Wherever a rail
//! crosses itself or the other rail, the centerline is cut so crossing
//! stretches end up in different pieces. Every piece is closed with two
//! round caps. A piece that still is not simple is halved until it is; a
//! single-step piece is closed as a tapered capsule, which is always simple.

pub mod caps;
pub mod intersect;
pub mod rails;
pub mod simplify;

use std::collections::BTreeSet;

use glam::Vec2;
use inkstroke_config::{OutlineConfig, StrokeConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::pressure_to_radius;
use crate::constants::OUTLINE_POINT_EPSILON;
use crate::normalize::normalize_samples_unscaled;
use crate::types::Sample;

use caps::round_cap;
use intersect::{collect_cross_rail_crossings, collect_self_crossings, polygon_is_simple};
use rails::Rails;
use simplify::simplify_forward;

/// A closed ring of points; the first point is repeated at the end
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutlinePolygon {
    pub points: Vec<Vec2>,
}

impl OutlinePolygon {
    /// Close an open ring, dropping consecutive near-duplicate points
    fn from_ring(ring: Vec<Vec2>) -> Self {
        let mut points: Vec<Vec2> = Vec::with_capacity(ring.len() + 1);
        for p in ring {
            if points
                .last()
                .is_none_or(|last| last.distance(p) >= OUTLINE_POINT_EPSILON)
            {
                points.push(p);
            }
        }
        while points.len() > 1
            && points
                .last()
                .zip(points.first())
                .is_some_and(|(last, first)| last.distance(*first) < OUTLINE_POINT_EPSILON)
        {
            points.pop();
        }
        if let Some(&first) = points.first() {
            points.push(first);
        }
        Self { points }
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() >= 4 && self.points.first() == self.points.last()
    }

    /// Edges of the ring, closing edge included
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// No two non-adjacent edges touch
    pub fn is_simple(&self) -> bool {
        polygon_is_simple(&self.points)
    }
}

/// Extract the outline polygons of a stroke
///
/// Fewer than two distinct samples yield no polygons.
pub fn extract_outlines(
    samples: &[Sample],
    stroke: &StrokeConfig,
    outline: &OutlineConfig,
) -> Vec<OutlinePolygon> {
    let stroke = stroke.sanitized();
    let smoothing = outline
        .smoothing_override
        .filter(|s| s.is_finite())
        .map_or(stroke.smoothing, |s| s.clamp(0.0, 1.0));

    let normalized = normalize_samples_unscaled(samples, smoothing);
    let simplified = simplify_forward(&normalized, outline.simplify_tolerance);
    let points = collapse_coincident(&simplified);

    if points.len() < 2 {
        return Vec::new();
    }

    // Same radius the raster path uses, back in input units
    let scale = stroke.effective_scale();
    let centers: Vec<Vec2> = points.iter().map(Sample::position).collect();
    let radii: Vec<f32> = points
        .iter()
        .map(|s| pressure_to_radius(s.pressure, &stroke) / scale)
        .collect();

    let Some(rails) = Rails::build(&centers, &radii) else {
        return Vec::new();
    };

    let mut cuts = BTreeSet::new();
    collect_self_crossings(&rails.left, &mut cuts);
    collect_self_crossings(&rails.right, &mut cuts);
    collect_cross_rail_crossings(&rails.left, &rails.right, &mut cuts);

    let ranges = ranges_from_cuts(&cuts, rails.len());
    let polygons = close_ranges(&rails, ranges, outline.cap_steps);

    debug!(
        "extract_outlines: {} samples -> {} points, {} cuts, {} polygons",
        samples.len(),
        rails.len(),
        cuts.len(),
        polygons.len()
    );

    polygons
}

/// All outline points, polygons concatenated
pub fn outline_points(samples: &[Sample], stroke: &StrokeConfig, outline: &OutlineConfig) -> Vec<Vec2> {
    extract_outlines(samples, stroke, outline)
        .into_iter()
        .flat_map(|p| p.points)
        .collect()
}

fn collapse_coincident(samples: &[Sample]) -> Vec<Sample> {
    let mut out: Vec<Sample> = Vec::with_capacity(samples.len());
    for s in samples {
        match out.last_mut() {
            // Keep the later pressure, it is the one the stroke ends on
            Some(last) if last.position().distance(s.position()) < OUTLINE_POINT_EPSILON => {
                last.pressure = s.pressure;
            }
            _ => out.push(*s),
        }
    }
    out
}

/// Point ranges between cuts; neighbouring ranges share one point
///
/// Crossing edge `i` ends the range at point `i + 1`, so two crossing edges
/// never end up in the same range.
fn ranges_from_cuts(cuts: &BTreeSet<usize>, len: usize) -> Vec<(usize, usize)> {
    let last = len - 1;
    let mut ranges = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;

    for &edge in cuts {
        let cut = edge + 1;
        if cut > start && cut < last {
            ranges.push((start, cut));
            start = cut;
        }
    }
    ranges.push((start, last));
    ranges
}

/// Close every range, halving any range whose polygon is not simple
fn close_ranges(rails: &Rails, ranges: Vec<(usize, usize)>, cap_steps: u32) -> Vec<OutlinePolygon> {
    let mut polygons = Vec::with_capacity(ranges.len());
    let mut pending: Vec<(usize, usize)> = ranges.into_iter().rev().collect();
    let mut splits = 0usize;

    while let Some((start, end)) = pending.pop() {
        if end <= start {
            continue;
        }
        if end - start == 1 {
            polygons.push(capsule(rails, start, cap_steps));
            continue;
        }

        let polygon = chunk(rails, start, end, cap_steps);
        if polygon.is_simple() {
            polygons.push(polygon);
        } else {
            let mid = start + (end - start) / 2;
            pending.push((mid, end));
            pending.push((start, mid));
            splits += 1;
        }
    }

    if splits > 0 {
        debug!("Outline ranges split {} times to stay simple", splits);
    }
    polygons
}

/// Left rail forward, end cap, right rail backward, start cap
fn chunk(rails: &Rails, start: usize, end: usize, cap_steps: u32) -> OutlinePolygon {
    let mut ring = Vec::with_capacity((end - start + 1) * 2 + cap_steps as usize * 2);
    ring.extend_from_slice(&rails.left[start..=end]);
    ring.extend(round_cap(
        rails.centers[end],
        rails.radii[end],
        rails.normal(end),
        rails.tangents[end],
        cap_steps,
    ));
    ring.extend(rails.right[start..=end].iter().rev());
    ring.extend(round_cap(
        rails.centers[start],
        rails.radii[start],
        -rails.normal(start),
        -rails.tangents[start],
        cap_steps,
    ));
    OutlinePolygon::from_ring(ring)
}

/// Tapered capsule around the single step `start` -> `start + 1`
fn capsule(rails: &Rails, start: usize, cap_steps: u32) -> OutlinePolygon {
    let p0 = rails.centers[start];
    let p1 = rails.centers[start + 1];
    let r0 = rails.radii[start];
    let r1 = rails.radii[start + 1];
    let t = rails.tangents[start];
    let n = t.perp();

    let mut ring = Vec::with_capacity(4 + cap_steps as usize * 2);
    ring.push(p0 + n * r0);
    ring.push(p1 + n * r1);
    ring.extend(round_cap(p1, r1, n, t, cap_steps));
    ring.push(p1 - n * r1);
    ring.push(p0 - n * r0);
    ring.extend(round_cap(p0, r0, -n, -t, cap_steps));
    OutlinePolygon::from_ring(ring)
}
