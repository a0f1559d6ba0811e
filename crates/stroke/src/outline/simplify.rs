//! Forward-only polyline simplification for outline input

use glam::Vec2;

use crate::types::Sample;

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Greedy forward simplification
///
/// From the current anchor, the look-ahead point advances while every
/// skipped sample stays within `tolerance` of the anchor-to-look-ahead
/// chord. When a sample falls outside, the point before the look-ahead
/// becomes the next anchor. The first and last samples are always kept and
/// kept samples carry their own pressure.
pub fn simplify_forward(samples: &[Sample], tolerance: f32) -> Vec<Sample> {
    if tolerance <= 0.0 || samples.len() <= 2 {
        return samples.to_vec();
    }

    let mut kept = vec![samples[0]];
    let mut anchor = 0;
    let mut lookahead = 1;

    while lookahead < samples.len() - 1 {
        let a = samples[anchor].position();
        let b = samples[lookahead].position();

        let exceeds = samples[anchor + 1..lookahead]
            .iter()
            .any(|s| distance_to_segment(s.position(), a, b) > tolerance);

        if exceeds {
            anchor = lookahead - 1;
            kept.push(samples[anchor]);
            lookahead = anchor + 1;
        } else {
            lookahead += 1;
        }
    }

    kept.push(samples[samples.len() - 1]);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: f32, y: f32) -> Sample {
        Sample::new(x, y, 1.0, 0.0)
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Vec2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }

    #[test]
    fn test_straight_line_collapses() {
        let samples: Vec<Sample> = (0..10).map(|i| s(i as f32, 0.0)).collect();
        let out = simplify_forward(&samples, 0.5);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].x, 0.0);
        assert_eq!(out[1].x, 9.0);
    }

    #[test]
    fn test_corner_is_kept() {
        let samples = [s(0.0, 0.0), s(5.0, 0.0), s(10.0, 0.0), s(10.0, 5.0), s(10.0, 10.0)];
        let out = simplify_forward(&samples, 0.5);
        assert!(out.iter().any(|p| p.x == 10.0 && p.y == 0.0));
        assert_eq!(out.first().unwrap().position(), Vec2::ZERO);
        assert_eq!(out.last().unwrap().position(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_zero_tolerance_and_short_input_untouched() {
        let samples = [s(0.0, 0.0), s(1.0, 0.0), s(2.0, 0.0)];
        assert_eq!(simplify_forward(&samples, 0.0).len(), 3);
        assert_eq!(simplify_forward(&samples[..2], 5.0).len(), 2);
    }
}
