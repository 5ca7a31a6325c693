use nalgebra::{Point3, Vector3};

const EPSILON: f32 = 1e-5;

/// Barycentric weights of the pixel center `(px, py)` with respect to the
/// screen-space triangle `tri` (only x and y are used).
///
/// Returns `None` for a degenerate (zero-area) triangle.
pub fn barycentric_coordinates(px: f32, py: f32, tri: &[Point3<f32>; 3]) -> Option<Vector3<f32>> {
    let [a, b, c] = tri;
    let e1x = b.x - a.x;
    let e1y = b.y - a.y;
    let e2x = c.x - a.x;
    let e2y = c.y - a.y;
    let apx = px - a.x;
    let apy = py - a.y;

    // Twice the signed area
    let area_x2 = e1x * e2y - e1y * e2x;
    if area_x2.abs() < EPSILON {
        return None;
    }
    let inv = 1.0 / area_x2;

    let beta = (apx * e2y - apy * e2x) * inv;
    let gamma = (e1x * apy - e1y * apx) * inv;
    Some(Vector3::new(1.0 - beta - gamma, beta, gamma))
}

#[inline(always)]
pub fn is_inside_triangle(bary: &Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// Re-weights screen-space barycentrics by the camera-space depth of each
/// corner so attributes interpolate linearly in camera space.
///
/// `depths` are distances along the view direction (positive in front of the
/// eye). Returns `None` if any depth is too close to zero.
pub fn perspective_correct_barycentric(bary: &Vector3<f32>, depths: [f32; 3]) -> Option<Vector3<f32>> {
    if depths.iter().any(|d| d.abs() < EPSILON) {
        return None;
    }
    let wa = bary.x / depths[0];
    let wb = bary.y / depths[1];
    let wc = bary.z / depths[2];
    let sum = wa + wb + wc;
    if sum.abs() < EPSILON {
        return None;
    }
    Some(Vector3::new(wa / sum, wb / sum, wc / sum))
}
