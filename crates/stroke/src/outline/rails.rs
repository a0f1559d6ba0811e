//! Left/right offset rails of a centerline

use glam::Vec2;

/// Offset curves on either side of a polyline
///
/// Point `i` is offset along the normal of the direction towards point
/// `i + 1`; the last point reuses the final direction. `left` lies on the
/// `perp()` side of the travel direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Rails {
    pub centers: Vec<Vec2>,
    pub tangents: Vec<Vec2>,
    pub radii: Vec<f32>,
    pub left: Vec<Vec2>,
    pub right: Vec<Vec2>,
}

impl Rails {
    /// Build rails; `None` for fewer than two points or a zero-length step
    pub fn build(centers: &[Vec2], radii: &[f32]) -> Option<Rails> {
        let n = centers.len();
        if n < 2 || radii.len() != n {
            return None;
        }

        let mut tangents = Vec::with_capacity(n);
        for pair in centers.windows(2) {
            tangents.push((pair[1] - pair[0]).try_normalize()?);
        }
        tangents.push(tangents[n - 2]);

        let (left, right): (Vec<Vec2>, Vec<Vec2>) = centers
            .iter()
            .zip(&tangents)
            .zip(radii)
            .map(|((&c, t), &r)| {
                let n = t.perp() * r;
                (c + n, c - n)
            })
            .unzip();

        Some(Rails {
            centers: centers.to_vec(),
            tangents,
            radii: radii.to_vec(),
            left,
            right,
        })
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Unit normal at point `i` (towards the left rail)
    pub fn normal(&self, i: usize) -> Vec2 {
        self.tangents[i].perp()
    }
}
