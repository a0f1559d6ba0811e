//! Segment intersection tests used to find where offset rails cross
//!
//! Orientation signs are evaluated in f64 so inputs that came in as f32
//! produce exact signs for the cases that matter here (shared endpoints,
//! collinear overlaps).

use std::collections::BTreeSet;

use glam::Vec2;

/// Sign of the turn a -> b -> c: 1 left, -1 right, 0 collinear
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> i8 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let cross = (b.x as f64 - ax) * (c.y as f64 - ay) - (b.y as f64 - ay) * (c.x as f64 - ax);
    if cross > 0.0 {
        1
    } else if cross < 0.0 {
        -1
    } else {
        0
    }
}

/// `c` lies on segment a-b, given the three are collinear
fn on_segment(a: Vec2, b: Vec2, c: Vec2) -> bool {
    c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
}

/// Closed-segment intersection test (touching and collinear overlap count)
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, p2, q2))
        || (o3 == 0 && on_segment(q1, q2, p1))
        || (o4 == 0 && on_segment(q1, q2, p2))
}

/// Record both edge indices of every crossing between non-neighbouring
/// edges of one rail
pub fn collect_self_crossings(rail: &[Vec2], indices: &mut BTreeSet<usize>) {
    let edges = rail.len().saturating_sub(1);
    for i in 0..edges {
        for j in (i + 2)..edges {
            if segments_intersect(rail[i], rail[i + 1], rail[j], rail[j + 1]) {
                indices.insert(i);
                indices.insert(j);
            }
        }
    }
}

/// Record both edge indices of every crossing between the two rails
pub fn collect_cross_rail_crossings(left: &[Vec2], right: &[Vec2], indices: &mut BTreeSet<usize>) {
    let left_edges = left.len().saturating_sub(1);
    let right_edges = right.len().saturating_sub(1);
    for i in 0..left_edges {
        for j in 0..right_edges {
            if segments_intersect(left[i], left[i + 1], right[j], right[j + 1]) {
                indices.insert(i);
                indices.insert(j);
            }
        }
    }
}

/// True when a closed ring has no self-contact other than shared vertices
/// of consecutive edges
///
/// `ring` may repeat its first point at the end or not. Rings with fewer
/// than three distinct vertices, zero-length edges, or an edge folding back
/// onto its predecessor are not simple.
pub fn polygon_is_simple(ring: &[Vec2]) -> bool {
    let mut points = ring;
    if points.len() >= 2 && points.first() == points.last() {
        points = &points[..points.len() - 1];
    }

    let n = points.len();
    if n < 3 {
        return false;
    }

    let edge = |i: usize| (points[i], points[(i + 1) % n]);

    for i in 0..n {
        let (a, b) = edge(i);
        if a == b {
            return false;
        }

        // Consecutive edges may only share their common vertex
        let (_, c) = edge((i + 1) % n);
        if orientation(a, b, c) == 0 && (b - a).dot(c - b) < 0.0 {
            return false;
        }
    }

    for i in 0..n {
        let (a, b) = edge(i);
        for j in (i + 2)..n {
            // First and last edge are neighbours on a closed ring
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = edge(j);
            if segments_intersect(a, b, c, d) {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(v(0.0, 0.0), v(10.0, 10.0), v(0.0, 10.0), v(10.0, 0.0)));
        assert!(!segments_intersect(v(0.0, 0.0), v(10.0, 0.0), v(0.0, 1.0), v(10.0, 1.0)));
        assert!(!segments_intersect(v(0.0, 0.0), v(1.0, 1.0), v(3.0, 0.0), v(2.0, 5.0)));
    }

    #[test]
    fn test_touching_and_collinear() {
        // T-junction
        assert!(segments_intersect(v(0.0, 0.0), v(10.0, 0.0), v(5.0, 0.0), v(5.0, 5.0)));
        // Collinear overlap
        assert!(segments_intersect(v(0.0, 0.0), v(10.0, 0.0), v(5.0, 0.0), v(15.0, 0.0)));
        // Collinear but apart
        assert!(!segments_intersect(v(0.0, 0.0), v(4.0, 0.0), v(5.0, 0.0), v(15.0, 0.0)));
    }

    #[test]
    fn test_self_crossings_of_loop() {
        // A figure with edge 0 crossing edge 2
        let rail = [v(0.0, 0.0), v(10.0, 0.0), v(10.0, 5.0), v(5.0, -5.0)];
        let mut indices = BTreeSet::new();
        collect_self_crossings(&rail, &mut indices);
        assert_eq!(indices.into_iter().collect::<Vec<_>>(), vec![0, 2]);

        let straight = [v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0), v(3.0, 0.0)];
        let mut indices = BTreeSet::new();
        collect_self_crossings(&straight, &mut indices);
        assert!(indices.is_empty());
    }

    #[test]
    fn test_cross_rail_crossings() {
        let left = [v(0.0, 1.0), v(5.0, 1.0), v(10.0, -3.0)];
        let right = [v(0.0, -1.0), v(5.0, -1.0), v(10.0, 3.0)];
        let mut indices = BTreeSet::new();
        collect_cross_rail_crossings(&left, &right, &mut indices);
        assert_eq!(indices.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_polygon_is_simple() {
        let square = [v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0), v(0.0, 0.0)];
        assert!(polygon_is_simple(&square));
        // Open form of the same ring
        assert!(polygon_is_simple(&square[..4]));

        let bowtie = [v(0.0, 0.0), v(1.0, 1.0), v(1.0, 0.0), v(0.0, 1.0), v(0.0, 0.0)];
        assert!(!polygon_is_simple(&bowtie));

        let spike = [v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 0.0)];
        assert!(!polygon_is_simple(&spike));

        assert!(!polygon_is_simple(&[v(0.0, 0.0), v(1.0, 0.0), v(0.0, 0.0)]));
    }
}
