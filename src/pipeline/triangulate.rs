use crate::core::geometry::Vertex;
use log::debug;

/// Tolerance for duplicate-vertex and convexity tests.
pub const EPSILON: f32 = 0.0001;

/// Signed area (times two) of the loop `first..last` projected on model axes
/// `d1`, `d2`. Positive means counter-clockwise.
fn signed_area(vertices: &[Vertex], first: usize, last: usize, d1: usize, d2: usize) -> f64 {
    let mut area = 0.0;
    let mut p = last - 1;
    for q in first..last {
        let (px, py) = (vertices[p].model[d1] as f64, vertices[p].model[d2] as f64);
        let (qx, qy) = (vertices[q].model[d1] as f64, vertices[q].model[d2] as f64);
        area += px * qy - qx * py;
        p = q;
    }
    area
}

#[inline]
fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Point-in-triangle for a counter-clockwise triangle, edges inclusive.
#[inline]
fn contains(a: (f64, f64), b: (f64, f64), c: (f64, f64), p: (f64, f64)) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clipping triangulation of the polygon loop `first..last`.
///
/// Works on model-space positions. The loop is projected onto the XY plane,
/// or onto XZ / YZ when it is perpendicular to it. Degenerate or
/// self-intersecting input yields a partial (possibly empty) result rather
/// than an error. Returned triangles are counter-clockwise in the projection
/// plane.
pub fn triangulate(vertices: &[Vertex], first: usize, last: usize) -> Vec<[usize; 3]> {
    let mut out = Vec::new();
    if last < first + 3 {
        return out;
    }

    // 1. Pick the projection plane from the winding area
    let (mut d1, mut d2) = (0, 1);
    let mut area = signed_area(vertices, first, last, d1, d2);
    if area == 0.0 {
        let varies = |axis: usize| {
            (first..last).any(|i| vertices[i].model[axis] != vertices[first].model[axis])
        };
        if varies(0) {
            d2 = 2;
        } else if varies(1) {
            d1 = 1;
            d2 = 2;
        } else {
            debug!("Triangulation skipped: all {} vertices coincide", last - first);
            return out;
        }
        area = signed_area(vertices, first, last, d1, d2);
    }

    // 2. Drop a closing vertex that repeats the first one
    let mut end = last;
    if vertices[first].same_position(&vertices[last - 1], EPSILON) {
        end -= 1;
    }

    // 3. Counter-clockwise ring of vertex indices
    let mut ring: Vec<usize> = if area > 0.0 {
        (first..end).collect()
    } else {
        (first..end).rev().collect()
    };

    let pt = |i: usize| (vertices[i].model[d1] as f64, vertices[i].model[d2] as f64);
    let eps = EPSILON as f64;

    // 4. Clip ears until a single triangle's worth of ring is left
    let mut budget = 2 * ring.len();
    let mut v = ring.len() - 1;
    while ring.len() > 2 {
        if budget == 0 {
            debug!(
                "Triangulation gave up with {} vertices left (complex polygon?)",
                ring.len()
            );
            break;
        }
        budget -= 1;

        let n = ring.len();
        let u = if v < n { v } else { 0 };
        v = if u + 1 < n { u + 1 } else { 0 };
        let w = if v + 1 < n { v + 1 } else { 0 };

        let a = pt(ring[u]);
        let b = pt(ring[v]);
        let c = pt(ring[w]);

        // reflex or flat corner
        if cross(a, b, c) < eps {
            continue;
        }

        let blocked = (0..n)
            .filter(|&p| p != u && p != v && p != w)
            .any(|p| contains(a, b, c, pt(ring[p])));
        if blocked {
            continue;
        }

        out.push([ring[u], ring[v], ring[w]]);
        ring.remove(v);
        budget = 2 * ring.len();
    }

    out
}
