//! Rounded end caps

use std::f32::consts::PI;

use glam::Vec2;

/// Interior points of a half circle around `center`
///
/// The arc starts at `center + radius * from` (excluded), bulges along
/// `bulge` and ends at `center - radius * from` (excluded). Both vectors
/// are expected to be unit length and perpendicular. The endpoints are
/// left out so callers can join the arc to rail points exactly.
pub fn round_cap(center: Vec2, radius: f32, from: Vec2, bulge: Vec2, steps: u32) -> Vec<Vec2> {
    let steps = steps.max(2);
    (1..steps)
        .map(|k| {
            let theta = PI * k as f32 / steps as f32;
            center + radius * (from * theta.cos() + bulge * theta.sin())
        })
        .collect()
}
