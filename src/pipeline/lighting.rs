use crate::core::color::{Rgb, clamp_rgb, clamp_unit};
use crate::core::geometry::{CornerColor, Triangle, Vertex};
use crate::core::math::transform::transform_normal;
use crate::scene::context::NormalMode;
use crate::scene::light::{Light, LightKind, LightSet};
use log::trace;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

//=================================
// Light accumulation
//=================================

/// Per-term light totals at one surface point, before the material is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSum {
    pub ambient: Rgb,
    pub diffuse: Rgb,
    pub specular: Rgb,
}

impl Default for LightSum {
    fn default() -> Self {
        Self {
            ambient: Vector3::zeros(),
            diffuse: Vector3::zeros(),
            specular: Vector3::zeros(),
        }
    }
}

impl LightSum {
    /// Folds the totals into a corner color using the vertex's material:
    /// `emissive + ambient * A + diffuse * D` and `specular * S`, clamped.
    pub fn apply(&self, vertex: &Vertex) -> CornerColor {
        let rgb = vertex.emissive
            + vertex.ambient.component_mul(&self.ambient)
            + vertex.diffuse.xyz().component_mul(&self.diffuse);
        let rgb = clamp_rgb(&rgb);
        let specular = clamp_rgb(&vertex.specular.xyz().component_mul(&self.specular));

        CornerColor::new(
            Vector4::new(rgb.x, rgb.y, rgb.z, clamp_unit(vertex.diffuse.w)),
            specular,
        )
    }
}

/// Sums every light at view-space `position` for the view-space `normal`.
///
/// The normal is normalized and turned toward the eye first, so single-sided
/// geometry is lit from whichever side is visible.
pub fn accumulate(lights: &[Light], position: &Point3<f32>, normal: &Vector3<f32>, shininess: f32) -> LightSum {
    let mut sum = LightSum::default();

    let to_eye = -position.coords;
    let mut n = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
    if n.dot(&to_eye) < 0.0 {
        n = -n;
    }
    let view_dir = position.coords.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);

    for light in lights {
        let distance = (light.position - *position).norm();

        // 1. Direction toward the light and cone factor
        let (to_light, spot, denom) = match light.kind {
            LightKind::Ambient => {
                sum.ambient += light.diffuse / light.falloff.denominator(distance);
                continue;
            }
            LightKind::Directional { direction } => (-direction, 1.0, 1.0),
            LightKind::Point => {
                let to_light = (light.position - *position).try_normalize(f32::EPSILON);
                let Some(to_light) = to_light else { continue };
                (to_light, 1.0, light.falloff.denominator(distance))
            }
            LightKind::Spot {
                direction,
                cos_angle,
                concentration,
            } => {
                let to_light = (light.position - *position).try_normalize(f32::EPSILON);
                let Some(to_light) = to_light else { continue };
                let axis_dot = -direction.dot(&to_light);
                if axis_dot <= cos_angle {
                    continue;
                }
                (to_light, axis_dot.powf(concentration), light.falloff.denominator(distance))
            }
        };

        // 2. Diffuse, only for lights in front of the surface
        let n_dot_l = n.dot(&to_light);
        if n_dot_l <= 0.0 {
            continue;
        }
        sum.diffuse += light.diffuse * (n_dot_l * spot / denom);

        // 3. Specular (Blinn half vector)
        if light.has_specular() {
            let Some(half) = (to_light - view_dir).try_normalize(f32::EPSILON) else {
                continue;
            };
            let n_dot_h = half.dot(&n);
            if n_dot_h > 0.0 {
                sum.specular += light.specular * (n_dot_h.powf(shininess) * spot / denom);
            }
        }
    }

    sum
}

/// Lights one vertex with a view-space normal.
pub fn shade_vertex(lights: &[Light], vertex: &Vertex, view_normal: &Vector3<f32>) -> CornerColor {
    accumulate(lights, &vertex.view_point(), view_normal, vertex.shininess).apply(vertex)
}

/// Color of a corner when lighting is off: the fill snapshot, no highlight.
pub fn unlit(vertex: &Vertex) -> CornerColor {
    CornerColor::new(vertex.diffuse, Vector3::zeros())
}

/// Unit normal of the triangle in view space, or zero if it is degenerate.
pub fn face_normal(a: &Vertex, b: &Vertex, c: &Vertex) -> Vector3<f32> {
    let ab = b.view.xyz() - a.view.xyz();
    let ac = c.view.xyz() - a.view.xyz();
    ab.cross(&ac).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

//=================================
// Shape-level dispatch
//=================================

/// How much lighting work a finished shape needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingTier {
    /// No lights or no fill: corners take the fill color.
    Unlit,
    /// One evaluation broadcast to every corner.
    PerShape,
    /// One evaluation per vertex, shared by all triangles using it.
    PerVertex,
    /// One evaluation per triangle, using its face normal.
    PerFace,
    /// One evaluation per corner, for position-dependent lights.
    PerCorner,
}

/// Picks the cheapest tier that gives the same result as lighting every corner.
pub fn choose_tier(lights: &LightSet, fill: bool, normal_mode: NormalMode) -> LightingTier {
    if lights.is_empty() || !fill {
        return LightingTier::Unlit;
    }
    match (normal_mode, lights.depends_on_position()) {
        (NormalMode::Vertex, _) => LightingTier::PerVertex,
        (NormalMode::Shape, false) => LightingTier::PerShape,
        (NormalMode::Auto, false) => LightingTier::PerFace,
        (_, true) => LightingTier::PerCorner,
    }
}

/// Writes corner colors into `triangles`.
///
/// `modelview_inv` carries the vertices' model-space normals into view space.
/// In per-vertex mode the vertex `lit` cache is filled as a side effect.
pub fn light_triangles(
    tier: LightingTier,
    lights: &[Light],
    normal_mode: NormalMode,
    vertices: &mut [Vertex],
    triangles: &mut [Triangle],
    modelview_inv: &Matrix4<f32>,
) {
    trace!("Lighting {} triangles as {:?}", triangles.len(), tier);

    match tier {
        LightingTier::Unlit => {
            for tri in triangles.iter_mut() {
                tri.colors = tri.vertices.map(|i| unlit(&vertices[i]));
            }
        }

        LightingTier::PerShape => {
            let Some(first) = triangles.first().map(|t| t.vertices[0]) else {
                return;
            };
            let v = &vertices[first];
            let normal = transform_normal(modelview_inv, &v.normal);
            let sum = accumulate(lights, &v.view_point(), &normal, v.shininess);
            for tri in triangles.iter_mut() {
                tri.colors = tri.vertices.map(|i| sum.apply(&vertices[i]));
            }
        }

        LightingTier::PerVertex => {
            for tri in triangles.iter_mut() {
                for (corner, &i) in tri.vertices.iter().enumerate() {
                    let color = match vertices[i].lit {
                        Some(color) => color,
                        None => {
                            let v = &vertices[i];
                            let normal = transform_normal(modelview_inv, &v.normal);
                            let color = shade_vertex(lights, v, &normal);
                            vertices[i].lit = Some(color);
                            color
                        }
                    };
                    tri.colors[corner] = color;
                }
            }
        }

        LightingTier::PerFace => {
            for tri in triangles.iter_mut() {
                let [a, b, c] = tri.vertices.map(|i| &vertices[i]);
                let normal = face_normal(a, b, c);
                let sum = accumulate(lights, &a.view_point(), &normal, a.shininess);
                tri.colors = tri.vertices.map(|i| sum.apply(&vertices[i]));
            }
        }

        LightingTier::PerCorner => {
            for tri in triangles.iter_mut() {
                let [a, b, c] = tri.vertices.map(|i| &vertices[i]);
                let face = face_normal(a, b, c);
                tri.colors = tri.vertices.map(|i| {
                    let v = &vertices[i];
                    let normal = match normal_mode {
                        NormalMode::Auto => face,
                        _ => transform_normal(modelview_inv, &v.normal),
                    };
                    shade_vertex(lights, v, &normal)
                });
            }
        }
    }
}
