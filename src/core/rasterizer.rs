use crate::core::color::{Rgb, Rgba};
use crate::core::framebuffer::FrameBuffer;
use crate::core::math::interpolation::{
    barycentric_coordinates, is_inside_triangle, perspective_correct_barycentric,
};
use crate::pipeline::sink::{RasterSink, ScreenLine, ScreenPoint, ScreenTriangle};
use crate::scene::texture::Texture;
use nalgebra::{Point3, Vector2, Vector3};

/// Strokes are pulled this much toward the eye so they win against the
/// faces they outline.
const STROKE_DEPTH_BIAS: f32 = 1e-4;

/// Counters of what reached the rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    pub triangles: usize,
    pub lines: usize,
    pub points: usize,
    pub pixels: usize,
}

/// A small single-threaded scan converter used as the default sink.
///
/// Triangles are Gouraud shaded from their corner colors, optionally
/// modulated by a bilinear texture sample, z-tested and alpha blended.
/// Wide lines become screen-space quads; points become squares.
pub struct Rasterizer {
    pub framebuffer: FrameBuffer,
    stats: RasterStats,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            stats: RasterStats::default(),
        }
    }

    pub fn clear(&mut self, background: Rgb) {
        self.framebuffer.clear(background);
        self.stats = RasterStats::default();
    }

    pub fn stats(&self) -> RasterStats {
        self.stats
    }

    /// Scan converts one triangle given in screen space.
    ///
    /// `depths` are positive eye distances for perspective-correct
    /// interpolation; `None` interpolates linearly in screen space.
    fn fill_triangle(
        &mut self,
        positions: &[Point3<f32>; 3],
        colors: &[Rgba; 3],
        uvs: Option<(&Texture, [Vector2<f32>; 3])>,
        depths: Option<[f32; 3]>,
        depth_bias: f32,
    ) {
        // 1. Bounding box clamped to the surface
        let min_x = positions.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor();
        let min_y = positions.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor();
        let max_x = positions.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil();
        let max_y = positions.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil();
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return;
        }

        let fb_w = self.framebuffer.width as i64;
        let fb_h = self.framebuffer.height as i64;
        let start_x = (min_x as i64).max(0);
        let start_y = (min_y as i64).max(0);
        let end_x = (max_x as i64).min(fb_w - 1);
        let end_y = (max_y as i64).min(fb_h - 1);
        if start_x > end_x || start_y > end_y {
            return;
        }

        // 2. Pixel loop
        for y in start_y..=end_y {
            for x in start_x..=end_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let Some(bary) = barycentric_coordinates(px, py, positions) else {
                    return;
                };
                if !is_inside_triangle(&bary) {
                    continue;
                }

                // screen z is already linear in screen space
                let z = bary.x * positions[0].z + bary.y * positions[1].z + bary.z * positions[2].z;
                let weights = match depths {
                    Some(d) => match perspective_correct_barycentric(&bary, d) {
                        Some(w) => w,
                        None => continue,
                    },
                    None => bary,
                };

                let mut color = colors[0] * weights.x + colors[1] * weights.y + colors[2] * weights.z;
                if let Some((texture, uv)) = &uvs {
                    let st = uv[0] * weights.x + uv[1] * weights.y + uv[2] * weights.z;
                    color = color.component_mul(&texture.sample(st.x, st.y));
                }

                let (ux, uy) = (x as usize, y as usize);
                if self.framebuffer.depth_test_and_update(ux, uy, z - depth_bias) {
                    self.framebuffer.blend_pixel(ux, uy, &color);
                    self.stats.pixels += 1;
                }
            }
        }
    }

    /// One pixel wide DDA line with interpolated color and depth.
    fn thin_line(&mut self, a: &Point3<f32>, b: &Point3<f32>, ca: &Rgba, cb: &Rgba) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.x + dx * t).floor() as i64;
            let y = (a.y + dy * t).floor() as i64;
            if !self.framebuffer.in_bounds(x, y) {
                continue;
            }
            let z = a.z + (b.z - a.z) * t;
            let color = ca * (1.0 - t) + cb * t;
            let (ux, uy) = (x as usize, y as usize);
            if self.framebuffer.depth_test_and_update(ux, uy, z - STROKE_DEPTH_BIAS) {
                self.framebuffer.blend_pixel(ux, uy, &color);
                self.stats.pixels += 1;
            }
        }
    }
}

impl RasterSink for Rasterizer {
    fn triangle(&mut self, triangle: &ScreenTriangle) {
        self.stats.triangles += 1;
        let positions = triangle.corners.map(|c| c.position);
        let colors = triangle.corners.map(|c| c.color);
        let uvs = triangle
            .texture
            .as_deref()
            .map(|texture| (texture, triangle.corners.map(|c| c.uv)));
        let depths = triangle.camera.map(|cam| cam.map(|p| -p.z));
        self.fill_triangle(&positions, &colors, uvs, depths, 0.0);
    }

    fn line(&mut self, line: &ScreenLine) {
        self.stats.lines += 1;
        let [a, b] = line.positions;
        let [ca, cb] = line.colors;

        if line.weight <= 1.5 {
            self.thin_line(&a, &b, &ca, &cb);
            return;
        }

        // quad around the segment, half the weight on each side
        let dir = Vector2::new(b.x - a.x, b.y - a.y);
        let len = dir.norm();
        if len == 0.0 {
            return;
        }
        let half = line.weight / 2.0;
        let offset = Vector3::new(-dir.y / len * half, dir.x / len * half, 0.0);
        let a0 = a + offset;
        let a1 = a - offset;
        let b0 = b + offset;
        let b1 = b - offset;
        self.fill_triangle(&[a0, b0, b1], &[ca, cb, cb], None, None, STROKE_DEPTH_BIAS);
        self.fill_triangle(&[a0, b1, a1], &[ca, cb, ca], None, None, STROKE_DEPTH_BIAS);
    }

    fn point(&mut self, point: &ScreenPoint) {
        self.stats.points += 1;
        let half = (point.weight / 2.0).max(0.5);
        let p = point.position;
        let x0 = (p.x - half).floor() as i64;
        let x1 = (p.x + half).ceil() as i64 - 1;
        let y0 = (p.y - half).floor() as i64;
        let y1 = (p.y + half).ceil() as i64 - 1;

        for y in y0..=y1 {
            for x in x0..=x1 {
                if !self.framebuffer.in_bounds(x, y) {
                    continue;
                }
                let (ux, uy) = (x as usize, y as usize);
                if self.framebuffer.depth_test_and_update(ux, uy, p.z - STROKE_DEPTH_BIAS) {
                    self.framebuffer.blend_pixel(ux, uy, &point.color);
                    self.stats.pixels += 1;
                }
            }
        }
    }
}
