use crate::core::color::{Rgb, Rgba, clamp_rgb, clamp_unit};
use crate::scene::material::{StrokeCap, StrokeJoin};
use crate::scene::texture::Texture;
use nalgebra::{Point3, Vector2, Vector3, Vector4};
use std::sync::Arc;

/// Lit color of one triangle corner, or of a vertex lit once for all its
/// triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerColor {
    pub diffuse: Rgba,
    pub specular: Rgb,
}

impl CornerColor {
    pub fn new(diffuse: Rgba, specular: Rgb) -> Self {
        Self { diffuse, specular }
    }

    /// Diffuse plus specular, clamped; alpha comes from the diffuse term.
    pub fn blended(&self) -> Rgba {
        let rgb = clamp_rgb(&(self.diffuse.xyz() + self.specular));
        Vector4::new(rgb.x, rgb.y, rgb.z, clamp_unit(self.diffuse.w))
    }
}

impl Default for CornerColor {
    fn default() -> Self {
        Self::new(Vector4::zeros(), Vector3::zeros())
    }
}

/// One emitted vertex with every attribute the pipeline carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position as passed to `vertex()`.
    pub model: Point3<f32>,
    /// Position after model-view (w divided out, then 1).
    pub view: Vector4<f32>,
    /// x, y in pixels, z in [0, 1].
    pub screen: Point3<f32>,
    pub normal: Vector3<f32>,

    // --- Material snapshot ---
    pub diffuse: Rgba,
    pub ambient: Rgb,
    pub specular: Rgba,
    pub emissive: Rgb,
    pub shininess: f32,

    // --- Stroke snapshot ---
    pub stroke: Rgba,
    pub stroke_weight: f32,

    pub uv: Vector2<f32>,

    /// Set once the vertex has been lit in per-vertex normal mode.
    /// `None` means unlit.
    pub lit: Option<CornerColor>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            model: Point3::origin(),
            view: Vector4::new(0.0, 0.0, 0.0, 1.0),
            screen: Point3::origin(),
            normal: Vector3::new(0.0, 0.0, 1.0),
            diffuse: Vector4::zeros(),
            ambient: Vector3::zeros(),
            specular: Vector4::zeros(),
            emissive: Vector3::zeros(),
            shininess: 0.0,
            stroke: Vector4::zeros(),
            stroke_weight: 0.0,
            uv: Vector2::zeros(),
            lit: None,
        }
    }
}

impl Vertex {
    /// View-space position as a point.
    #[inline]
    pub fn view_point(&self) -> Point3<f32> {
        Point3::new(self.view.x, self.view.y, self.view.z)
    }

    /// Depth used by the near-plane test.
    #[inline]
    pub fn depth(&self) -> f32 {
        self.view.z
    }

    /// Weighted blend `a * wa + b * (1 - wa)` of every attribute.
    /// The result is always unlit.
    pub fn interpolate(a: &Vertex, b: &Vertex, wa: f32) -> Vertex {
        let wb = 1.0 - wa;
        Vertex {
            model: Point3::from(a.model.coords * wa + b.model.coords * wb),
            view: a.view * wa + b.view * wb,
            screen: Point3::from(a.screen.coords * wa + b.screen.coords * wb),
            normal: a.normal * wa + b.normal * wb,
            diffuse: a.diffuse * wa + b.diffuse * wb,
            ambient: a.ambient * wa + b.ambient * wb,
            specular: a.specular * wa + b.specular * wb,
            emissive: a.emissive * wa + b.emissive * wb,
            shininess: a.shininess * wa + b.shininess * wb,
            stroke: a.stroke * wa + b.stroke * wb,
            stroke_weight: a.stroke_weight * wa + b.stroke_weight * wb,
            uv: a.uv * wa + b.uv * wb,
            lit: None,
        }
    }

    /// True if the model positions agree within `eps` on every axis.
    pub fn same_position(&self, other: &Vertex, eps: f32) -> bool {
        (self.model.x - other.model.x).abs() < eps
            && (self.model.y - other.model.y).abs() < eps
            && (self.model.z - other.model.z).abs() < eps
    }
}

/// A triangle waiting to be handed to the sink.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [usize; 3],
    /// Filled by the lighting stage.
    pub colors: [CornerColor; 3],
    pub texture: Option<Arc<Texture>>,
    /// Opaque id of the shape that produced the triangle.
    pub shape_index: usize,
}

impl Triangle {
    pub fn new(vertices: [usize; 3], texture: Option<Arc<Texture>>, shape_index: usize) -> Self {
        Self {
            vertices,
            colors: [CornerColor::default(); 3],
            texture,
            shape_index,
        }
    }
}

/// A stroked segment. Colors and weight come from its vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub vertices: [usize; 2],
    pub shape_index: usize,
    /// First segment of a stroke path.
    pub path_start: bool,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub vertex: usize,
    pub shape_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_resets_lit_flag() {
        let mut a = Vertex::default();
        a.lit = Some(CornerColor::default());
        a.diffuse = Vector4::new(1.0, 0.0, 0.0, 1.0);
        let mut b = Vertex::default();
        b.diffuse = Vector4::new(0.0, 0.0, 1.0, 1.0);
        b.model = Point3::new(2.0, 0.0, 0.0);

        let mid = Vertex::interpolate(&a, &b, 0.25);
        assert!(mid.lit.is_none());
        assert!((mid.model.x - 1.5).abs() < 1e-6);
        assert!((mid.diffuse.x - 0.25).abs() < 1e-6);
        assert!((mid.diffuse.z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_blended_clamps() {
        let c = CornerColor::new(Vector4::new(0.8, 0.2, 0.0, 0.5), Vector3::new(0.5, 0.5, 0.5));
        let out = c.blended();
        let expected = Vector4::new(1.0, 0.7, 0.5, 0.5);
        assert!((out - expected).norm() < 1e-6);
    }
}
