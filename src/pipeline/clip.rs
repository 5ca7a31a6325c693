use crate::core::geometry::Vertex;
use serde::Deserialize;

/// Default near-plane threshold in view space. The camera looks down -Z, so
/// anything with z above this value is too close to the eye.
pub const DEFAULT_NEAR_CLIP: f32 = -8.0;

/// What to emit when a triangle loses exactly one corner to the near plane
/// and the visible part is a quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadClip {
    /// Both triangles of the quadrilateral.
    #[default]
    Split,
    /// Only the triangle that keeps the two original visible corners.
    Single,
}

/// Clips lines and triangles against a plane of constant view-space z.
///
/// Clipping never edits existing vertices. Intersection points are appended
/// to the vertex buffer and referenced by index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearClipper {
    pub near_z: f32,
    pub quad_clip: QuadClip,
}

impl Default for NearClipper {
    fn default() -> Self {
        Self {
            near_z: DEFAULT_NEAR_CLIP,
            quad_clip: QuadClip::default(),
        }
    }
}

impl NearClipper {
    pub fn new(near_z: f32, quad_clip: QuadClip) -> Self {
        Self { near_z, quad_clip }
    }

    /// True if the vertex lies on the eye side of the plane.
    #[inline]
    pub fn is_clipped(&self, v: &Vertex) -> bool {
        v.depth() > self.near_z
    }

    /// Appends the point where edge `far`-`near` crosses the plane and
    /// returns its index. Every attribute is interpolated and the result is
    /// unlit. If both ends sit at the same depth, `far` is returned as is.
    pub fn intersect(&self, vertices: &mut Vec<Vertex>, far: usize, near: usize) -> usize {
        let a = vertices[far];
        let b = vertices[near];
        let dz = a.depth() - b.depth();
        if dz == 0.0 {
            return far;
        }
        let wa = (self.near_z - b.depth()) / dz;
        vertices.push(Vertex::interpolate(&a, &b, wa));
        vertices.len() - 1
    }

    /// Clips segment `a`-`b`. Returns `None` when it is entirely clipped.
    pub fn clip_line(&self, vertices: &mut Vec<Vertex>, a: usize, b: usize) -> Option<[usize; 2]> {
        let a_clipped = self.is_clipped(&vertices[a]);
        let b_clipped = self.is_clipped(&vertices[b]);

        match (a_clipped, b_clipped) {
            (true, true) => None,
            (true, false) => Some([self.intersect(vertices, b, a), b]),
            (false, true) => Some([a, self.intersect(vertices, a, b)]),
            (false, false) => Some([a, b]),
        }
    }

    /// Clips a triangle and appends the visible pieces to `out`, keeping the
    /// original winding. Returns the number of triangles appended.
    pub fn clip_triangle(&self, vertices: &mut Vec<Vertex>, tri: [usize; 3], out: &mut Vec<[usize; 3]>) -> usize {
        let clipped = tri.map(|i| self.is_clipped(&vertices[i]));
        let count = clipped.iter().filter(|c| **c).count();

        match count {
            0 => {
                out.push(tri);
                1
            }

            // One visible corner: the tip survives as a single triangle.
            2 => {
                let Some(k) = clipped.iter().position(|c| !*c) else {
                    return 0;
                };
                let ca = tri[k];
                let cb = tri[(k + 1) % 3];
                let cc = tri[(k + 2) % 3];
                let cd = self.intersect(vertices, ca, cb);
                let ce = self.intersect(vertices, ca, cc);
                out.push([ca, cd, ce]);
                1
            }

            // One clipped corner: the visible part is ca, cb, on(cb-cc), on(cc-ca).
            1 => {
                let Some(k) = clipped.iter().position(|c| *c) else {
                    return 0;
                };
                let cc = tri[k];
                let ca = tri[(k + 1) % 3];
                let cb = tri[(k + 2) % 3];
                let on_bc = self.intersect(vertices, cb, cc);
                out.push([ca, cb, on_bc]);
                if self.quad_clip == QuadClip::Single {
                    return 1;
                }
                let on_ca = self.intersect(vertices, ca, cc);
                out.push([ca, on_bc, on_ca]);
                2
            }

            _ => 0,
        }
    }
}
