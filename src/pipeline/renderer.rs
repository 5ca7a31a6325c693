use crate::core::color::{Rgb, Rgba, gray, rgba};
use crate::core::geometry::{Line, Point, Triangle, Vertex};
use crate::core::math::matrix_stack::MatrixStack;
use crate::core::math::transform::{apply_perspective_division, ndc_to_screen};
use crate::error::PipelineError;
use crate::pipeline::assembler::{CloseMode, ShapeKind, fill_triangles, stroke_edges};
use crate::pipeline::clip::NearClipper;
use crate::pipeline::lighting::{choose_tier, light_triangles};
use crate::pipeline::sink::{
    PrimitiveKind, RasterSink, RawSink, RawVertex, ScreenCorner, ScreenLine, ScreenPoint, ScreenTriangle,
};
use crate::pipeline::sort::depth_sort;
use crate::pipeline::triangulate::{EPSILON, triangulate};
use crate::scene::camera::Camera;
use crate::scene::context::{Hint, NormalMode, RenderContext, TextureMode};
use crate::scene::light::Falloff;
use crate::scene::material::{StrokeCap, StrokeJoin};
use crate::scene::texture::Texture;
use log::{debug, trace, warn};
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use std::sync::Arc;

/// Immediate-mode 3D front end.
///
/// Shapes are described between `begin_shape` and `end_shape`; each finished
/// shape is transformed, clipped, lit and projected, then handed to the sink.
/// With the depth-sort hint on, primitives are held back until `flush` or
/// `end_draw` and delivered back to front.
pub struct Renderer<S: RasterSink> {
    pub matrices: MatrixStack,
    pub context: RenderContext,
    pub clipper: NearClipper,

    sink: S,
    raw: Option<Box<dyn RawSink>>,
    width: usize,
    height: usize,

    // --- Geometry buffers ---
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    lines: Vec<Line>,
    points: Vec<Point>,

    // --- Current shape ---
    shape: Option<ShapeKind>,
    shape_first: usize,
    shape_index: usize,
}

impl<S: RasterSink> Renderer<S> {
    /// A renderer for a `width x height` surface with the default camera
    /// and perspective.
    pub fn new(width: usize, height: usize, sink: S) -> Self {
        let mut matrices = MatrixStack::new();
        Camera::default_for(width, height).apply(&mut matrices);

        Self {
            matrices,
            context: RenderContext::default(),
            clipper: NearClipper::default(),
            sink,
            raw: None,
            width,
            height,
            vertices: Vec::new(),
            triangles: Vec::new(),
            lines: Vec::new(),
            points: Vec::new(),
            shape: None,
            shape_first: 0,
            shape_index: 0,
        }
    }

    pub fn with_clipper(mut self, clipper: NearClipper) -> Self {
        self.clipper = clipper;
        self
    }

    //=================================
    // Accessors
    //=================================

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Installs a secondary sink that mirrors every primitive.
    pub fn set_raw_sink(&mut self, raw: Box<dyn RawSink>) {
        self.raw = Some(raw);
    }

    pub fn take_raw_sink(&mut self) -> Option<Box<dyn RawSink>> {
        self.raw.take()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangles waiting for `flush` (only non-empty while depth sorting).
    pub fn pending_triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn pending_lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn pending_points(&self) -> &[Point] {
        &self.points
    }

    //=================================
    // Frame lifecycle
    //=================================

    /// Drops all buffered geometry and any open shape, and restores the
    /// model-view matrix. Use after an error aborted a frame.
    pub fn reset(&mut self) {
        self.clear_buffers();
        self.shape = None;
        self.shape_first = 0;
        self.matrices.begin_frame();
    }

    pub fn begin_draw(&mut self) {
        debug!("begin_draw ({}x{})", self.width, self.height);
        self.reset();
        self.context.lights.reset();
        self.context.normal = Vector3::new(0.0, 0.0, 1.0);
        self.shape_index = 0;
    }

    pub fn end_draw(&mut self) -> Result<(), PipelineError> {
        if self.shape.is_some() {
            warn!("end_draw called with an open shape; it is discarded");
            self.shape = None;
        }
        if self.context.hints.depth_sort {
            self.flush()?;
        }
        debug!("end_draw");
        Ok(())
    }

    /// Delivers everything buffered so far, back to front when depth sorting.
    pub fn flush(&mut self) -> Result<(), PipelineError> {
        if self.context.hints.depth_sort {
            let vertices = &self.vertices;
            depth_sort(&mut self.triangles, |t| {
                t.vertices.iter().map(|&i| vertices[i].screen.z).sum()
            })?;
            depth_sort(&mut self.lines, |l| {
                l.vertices.iter().map(|&i| vertices[i].screen.z).sum()
            })?;
        }
        self.render_buffers();
        Ok(())
    }

    pub fn hint(&mut self, hint: Hint) {
        self.context.hints.set(hint, true);
    }

    /// Turning depth sorting off delivers what it was holding back.
    pub fn no_hint(&mut self, hint: Hint) -> Result<(), PipelineError> {
        if hint == Hint::DepthSort && self.context.hints.depth_sort {
            self.flush()?;
        }
        self.context.hints.set(hint, false);
        Ok(())
    }

    fn clear_buffers(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.lines.clear();
        self.points.clear();
    }

    //=================================
    // Style
    //=================================

    pub fn fill(&mut self, color: Rgba) {
        self.context.style.set_fill(color);
    }

    pub fn no_fill(&mut self) {
        self.context.style.fill = None;
    }

    pub fn stroke(&mut self, color: Rgba) {
        self.context.style.stroke = Some(color);
    }

    pub fn no_stroke(&mut self) {
        self.context.style.stroke = None;
    }

    pub fn stroke_weight(&mut self, weight: f32) {
        self.context.style.stroke_weight = weight;
    }

    pub fn stroke_cap(&mut self, cap: StrokeCap) {
        self.context.style.stroke_cap = cap;
    }

    pub fn stroke_join(&mut self, join: StrokeJoin) {
        self.context.style.stroke_join = join;
    }

    pub fn ambient(&mut self, color: Rgb) {
        self.context.style.set_ambient(color);
    }

    pub fn specular(&mut self, color: Rgb) {
        self.context.style.material.specular = rgba(color.x, color.y, color.z, 1.0);
    }

    pub fn emissive(&mut self, color: Rgb) {
        self.context.style.material.emissive = color;
    }

    pub fn shininess(&mut self, shininess: f32) {
        self.context.style.material.shininess = shininess;
    }

    //=================================
    // Lights
    //=================================

    /// Replaces the light list with a gray ambient light and a gray
    /// directional light shining into the screen.
    pub fn lights(&mut self) -> Result<(), PipelineError> {
        self.context.lights.reset();
        self.ambient_light(gray(0.5), None)?;
        self.directional_light(gray(0.5), Vector3::new(0.0, 0.0, -1.0))
    }

    /// Removes every light. Buffered primitives are delivered first unless a
    /// shape is still open.
    pub fn no_lights(&mut self) -> Result<(), PipelineError> {
        if self.shape.is_some() {
            warn!("no_lights called inside begin_shape/end_shape; buffers kept");
        } else {
            self.flush()?;
        }
        self.context.lights.clear();
        Ok(())
    }

    pub fn ambient_light(&mut self, color: Rgb, position: Option<Point3<f32>>) -> Result<(), PipelineError> {
        self.context.lights.ambient(color, position, &self.matrices)
    }

    pub fn directional_light(&mut self, color: Rgb, direction: Vector3<f32>) -> Result<(), PipelineError> {
        self.context.lights.directional(color, direction, &self.matrices)
    }

    pub fn point_light(&mut self, color: Rgb, position: Point3<f32>) -> Result<(), PipelineError> {
        self.context.lights.point(color, position, &self.matrices)
    }

    pub fn spot_light(
        &mut self,
        color: Rgb,
        position: Point3<f32>,
        direction: Vector3<f32>,
        angle_rad: f32,
        concentration: f32,
    ) -> Result<(), PipelineError> {
        self.context
            .lights
            .spot(color, position, direction, angle_rad, concentration, &self.matrices)
    }

    pub fn light_falloff(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.context.lights.set_falloff(Falloff::new(constant, linear, quadratic));
    }

    pub fn light_specular(&mut self, color: Rgb) {
        self.context.lights.set_specular(color);
    }

    //=================================
    // Matrices and camera
    //=================================

    pub fn push_matrix(&mut self) -> Result<(), PipelineError> {
        self.matrices.push_matrix()
    }

    pub fn pop_matrix(&mut self) -> Result<(), PipelineError> {
        self.matrices.pop_matrix()
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.matrices.translate(x, y, z);
    }

    pub fn rotate_x(&mut self, angle_rad: f32) {
        self.matrices.rotate_x(angle_rad);
    }

    pub fn rotate_y(&mut self, angle_rad: f32) {
        self.matrices.rotate_y(angle_rad);
    }

    pub fn rotate_z(&mut self, angle_rad: f32) {
        self.matrices.rotate_z(angle_rad);
    }

    pub fn rotate(&mut self, angle_rad: f32, axis: &Vector3<f32>) {
        self.matrices.rotate(angle_rad, axis);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.matrices.scale(x, y, z);
    }

    pub fn reset_matrix(&mut self) {
        self.matrices.reset_matrix();
    }

    pub fn apply_matrix(&mut self, m: &Matrix4<f32>) -> Result<(), PipelineError> {
        self.matrices.apply_matrix(m)
    }

    pub fn begin_camera(&mut self) -> Result<(), PipelineError> {
        self.matrices.begin_camera()
    }

    pub fn end_camera(&mut self) -> Result<(), PipelineError> {
        self.matrices.end_camera()
    }

    pub fn camera(&mut self, eye: Point3<f32>, center: Point3<f32>, up: Vector3<f32>) {
        self.matrices.camera(&eye, &center, &up);
    }

    /// Restores the default camera and perspective for this surface.
    pub fn camera_default(&mut self) {
        Camera::default_for(self.width, self.height).apply(&mut self.matrices);
    }

    pub fn perspective(&mut self, fov_y_rad: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.matrices.perspective(fov_y_rad, aspect_ratio, near, far);
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.matrices.frustum(left, right, bottom, top, near, far);
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.matrices.ortho(left, right, bottom, top, near, far);
    }

    /// Orthographic box covering the surface in pixels, z in [-10, 10].
    pub fn ortho_default(&mut self) {
        self.matrices
            .ortho(0.0, self.width as f32, 0.0, self.height as f32, -10.0, 10.0);
    }

    //=================================
    // Coordinate queries
    //=================================

    fn screen_of(&self, x: f32, y: f32, z: f32) -> Point3<f32> {
        self.matrices
            .screen_point(&Point3::new(x, y, z), self.width as f32, self.height as f32)
    }

    pub fn screen_x(&self, x: f32, y: f32, z: f32) -> f32 {
        self.screen_of(x, y, z).x
    }

    pub fn screen_y(&self, x: f32, y: f32, z: f32) -> f32 {
        self.screen_of(x, y, z).y
    }

    pub fn screen_z(&self, x: f32, y: f32, z: f32) -> f32 {
        self.screen_of(x, y, z).z
    }

    pub fn model_x(&self, x: f32, y: f32, z: f32) -> f32 {
        self.matrices.model_point(&Point3::new(x, y, z)).x
    }

    pub fn model_y(&self, x: f32, y: f32, z: f32) -> f32 {
        self.matrices.model_point(&Point3::new(x, y, z)).y
    }

    pub fn model_z(&self, x: f32, y: f32, z: f32) -> f32 {
        self.matrices.model_point(&Point3::new(x, y, z)).z
    }

    //=================================
    // Shape input
    //=================================

    pub fn begin_shape(&mut self, kind: ShapeKind) {
        if self.shape.is_some() {
            warn!("begin_shape called before the previous shape was ended");
        }
        if !self.context.hints.depth_sort {
            self.clear_buffers();
        }
        self.shape = Some(kind);
        self.shape_first = self.vertices.len();
        self.shape_index += 1;
        self.context.texture = None;
        self.context.normal_mode = NormalMode::Auto;
    }

    /// Sets the normal for the following vertices. The first call inside a
    /// shape gives the whole shape one normal; calling again after a vertex
    /// switches to per-vertex normals.
    pub fn normal(&mut self, nx: f32, ny: f32, nz: f32) {
        self.context.normal = Vector3::new(nx, ny, nz);
        if self.shape.is_none() {
            return;
        }
        self.context.normal_mode = match self.context.normal_mode {
            NormalMode::Auto => NormalMode::Shape,
            NormalMode::Shape if self.vertices.len() > self.shape_first => NormalMode::Vertex,
            mode => mode,
        };
    }

    /// Binds an image to the vertices that follow, until the shape ends.
    pub fn texture(&mut self, texture: Option<Arc<Texture>>) {
        self.context.texture = texture;
    }

    pub fn texture_mode(&mut self, mode: TextureMode) {
        self.context.texture_mode = mode;
    }

    pub fn vertex_2d(&mut self, x: f32, y: f32) {
        self.vertex(x, y, 0.0);
    }

    pub fn vertex(&mut self, x: f32, y: f32, z: f32) {
        self.push_vertex(x, y, z, Vector2::zeros());
    }

    /// Textured vertex. Ignored, with a warning, if no texture is bound.
    pub fn vertex_uv(&mut self, x: f32, y: f32, z: f32, u: f32, v: f32) {
        let Some(texture) = &self.context.texture else {
            warn!("vertex_uv called without a bound texture; vertex ignored");
            return;
        };
        let (u, v) = match self.context.texture_mode {
            TextureMode::Image => (
                u / texture.width.max(1) as f32,
                v / texture.height.max(1) as f32,
            ),
            TextureMode::Normal => (u, v),
        };
        let uv = Vector2::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0));
        self.push_vertex(x, y, z, uv);
    }

    fn push_vertex(&mut self, x: f32, y: f32, z: f32, uv: Vector2<f32>) {
        let Some(kind) = self.shape else {
            warn!("vertex called outside begin_shape/end_shape");
            return;
        };

        let model = Point3::new(x, y, z);

        // consecutive duplicates would hand the triangulator a zero-length edge
        if kind == ShapeKind::Polygon && self.vertices.len() > self.shape_first {
            if let Some(prev) = self.vertices.last() {
                if (prev.model - model).abs().max() < EPSILON {
                    return;
                }
            }
        }

        let style = &self.context.style;
        let mut vertex = Vertex {
            model,
            normal: self.context.normal,
            uv,
            ..Vertex::default()
        };

        let textured = self.context.texture.is_some();
        if style.fill.is_some() || textured {
            vertex.diffuse = match (textured, style.fill) {
                (false, Some(fill)) => fill,
                _ => rgba(1.0, 1.0, 1.0, 1.0),
            };
            vertex.ambient = style.ambient();
            vertex.specular = style.material.specular;
            vertex.emissive = style.material.emissive;
            vertex.shininess = style.material.shininess;
        }
        if let Some(stroke) = style.stroke {
            vertex.stroke = stroke;
            vertex.stroke_weight = style.stroke_weight;
        }

        self.vertices.push(vertex);
    }

    /// Finishes the current shape: builds its lines, points and triangles,
    /// clips, lights and projects them, and delivers them unless depth
    /// sorting holds them back.
    pub fn end_shape(&mut self, close: CloseMode) -> Result<(), PipelineError> {
        let Some(kind) = self.shape.take() else {
            warn!("end_shape called without begin_shape");
            return Ok(());
        };
        let first = self.shape_first;
        let last = self.vertices.len();
        if first == last {
            return Ok(());
        }

        // 1. Model -> view
        let modelview = *self.matrices.modelview();
        for v in &mut self.vertices[first..last] {
            let h = modelview * v.model.to_homogeneous();
            v.view = if h.w != 0.0 && h.w != 1.0 {
                Vector4::new(h.x / h.w, h.y / h.w, h.z / h.w, 1.0)
            } else {
                h
            };
        }

        // 2. Stroke
        let first_line = self.lines.len();
        let first_point = self.points.len();
        let style = &self.context.style;
        if style.stroke.is_some() {
            if kind == ShapeKind::Points {
                for i in first..last {
                    if !self.clipper.is_clipped(&self.vertices[i]) {
                        self.points.push(Point {
                            vertex: i,
                            shape_index: self.shape_index,
                        });
                    }
                }
            } else {
                let mut broken = false;
                for edge in stroke_edges(kind, first, last, close) {
                    match self.clipper.clip_line(&mut self.vertices, edge.a, edge.b) {
                        Some(vertices) => {
                            self.lines.push(Line {
                                vertices,
                                shape_index: self.shape_index,
                                path_start: edge.path_start || broken,
                                cap: style.stroke_cap,
                                join: style.stroke_join,
                            });
                            broken = false;
                        }
                        None => broken = true,
                    }
                }
            }
        }

        // 3. Fill
        let first_triangle = self.triangles.len();
        let filled = style.fill.is_some() || self.context.texture.is_some();
        if filled {
            let corners = match kind {
                ShapeKind::Polygon => triangulate(&self.vertices, first, last),
                _ => fill_triangles(kind, first, last),
            };
            let mut visible = Vec::with_capacity(corners.len());
            for tri in corners {
                self.clipper.clip_triangle(&mut self.vertices, tri, &mut visible);
            }
            for tri in visible {
                self.triangles
                    .push(Triangle::new(tri, self.context.texture.clone(), self.shape_index));
            }
        }

        // 4. Lighting
        let normal_mode = self.context.normal_mode;
        let tier = choose_tier(&self.context.lights, filled, normal_mode);
        light_triangles(
            tier,
            self.context.lights.lights(),
            normal_mode,
            &mut self.vertices,
            &mut self.triangles[first_triangle..],
            self.matrices.modelview_inverse(),
        );

        // 5. View -> screen, clip-plane vertices included
        let projection = *self.matrices.projection();
        let (w, h) = (self.width as f32, self.height as f32);
        for v in &mut self.vertices[first..] {
            let ndc = apply_perspective_division(&(projection * v.view));
            v.screen = ndc_to_screen(&ndc, w, h);
        }

        trace!(
            "end_shape {:?}: {} vertices, {} triangles, {} lines, {} points",
            kind,
            self.vertices.len() - first,
            self.triangles.len() - first_triangle,
            self.lines.len() - first_line,
            self.points.len() - first_point,
        );

        if !self.context.hints.depth_sort {
            self.render_buffers();
        }
        Ok(())
    }

    //=================================
    // Output
    //=================================

    /// Sends triangles, then points, then lines to the sinks and empties
    /// the buffers.
    fn render_buffers(&mut self) {
        let with_camera = self.context.hints.accurate_textures && self.matrices.is_frustum();

        if !self.triangles.is_empty() {
            if let Some(raw) = self.raw.as_mut() {
                raw.begin_batch(PrimitiveKind::Triangles);
            }
        }
        for tri in &self.triangles {
            let screen = screen_triangle(&self.vertices, tri, with_camera);
            self.sink.triangle(&screen);
            if let Some(raw) = self.raw.as_mut() {
                let three_d = raw.is_3d();
                let corners = [0, 1, 2].map(|k| {
                    raw_vertex(&self.vertices[tri.vertices[k]], screen.corners[k].color, three_d)
                });
                if let [Some(a), Some(b), Some(c)] = corners {
                    raw.triangle(&[a, b, c]);
                }
            }
        }

        if !self.points.is_empty() {
            if let Some(raw) = self.raw.as_mut() {
                raw.begin_batch(PrimitiveKind::Points);
            }
        }
        for point in &self.points {
            let v = &self.vertices[point.vertex];
            self.sink.point(&ScreenPoint {
                position: v.screen,
                color: v.stroke,
                weight: v.stroke_weight,
                shape_index: point.shape_index,
            });
            if let Some(raw) = self.raw.as_mut() {
                if let Some(rv) = raw_vertex(v, v.stroke, raw.is_3d()) {
                    raw.point(&rv, v.stroke_weight);
                }
            }
        }

        if !self.lines.is_empty() {
            if let Some(raw) = self.raw.as_mut() {
                raw.begin_batch(PrimitiveKind::Lines);
            }
        }
        for line in &self.lines {
            let a = &self.vertices[line.vertices[0]];
            let b = &self.vertices[line.vertices[1]];
            self.sink.line(&ScreenLine {
                positions: [a.screen, b.screen],
                colors: [a.stroke, b.stroke],
                weight: a.stroke_weight,
                cap: line.cap,
                join: line.join,
                path_start: line.path_start,
                shape_index: line.shape_index,
            });
            if let Some(raw) = self.raw.as_mut() {
                let three_d = raw.is_3d();
                if let (Some(ra), Some(rb)) = (raw_vertex(a, a.stroke, three_d), raw_vertex(b, b.stroke, three_d)) {
                    raw.line(&[ra, rb], a.stroke_weight);
                }
            }
        }

        self.clear_buffers();
    }
}

fn screen_triangle(vertices: &[Vertex], tri: &Triangle, with_camera: bool) -> ScreenTriangle {
    let corners = [0, 1, 2].map(|k| {
        let v = &vertices[tri.vertices[k]];
        ScreenCorner {
            position: v.screen,
            color: tri.colors[k].blended(),
            uv: v.uv,
        }
    });
    let camera = with_camera.then(|| tri.vertices.map(|i| vertices[i].view_point()));

    ScreenTriangle {
        corners,
        texture: tri.texture.clone(),
        camera,
        shape_index: tri.shape_index,
    }
}

/// `None` when a 3D sink would need a point at infinity.
fn raw_vertex(v: &Vertex, color: Rgba, three_d: bool) -> Option<RawVertex> {
    let position = if three_d {
        if v.view.w == 0.0 {
            return None;
        }
        v.view_point()
    } else {
        Point3::new(v.screen.x, v.screen.y, 0.0)
    };
    Some(RawVertex {
        position,
        color,
        uv: v.uv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sink::{RawRecorder, RecordingSink};
    use crate::scene::light::MAX_LIGHTS;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn renderer() -> Renderer<RecordingSink> {
        let mut r = Renderer::new(100, 100, RecordingSink::new());
        r.begin_draw();
        r.reset_matrix();
        r
    }

    fn triangle_at(r: &mut Renderer<RecordingSink>, z: f32) {
        r.begin_shape(ShapeKind::Triangles);
        r.vertex(0.0, 0.0, z);
        r.vertex(1.0, 0.0, z);
        r.vertex(0.0, 1.0, z);
        r.end_shape(CloseMode::Open).unwrap();
    }

    #[test]
    fn test_white_triangle_passes_through() {
        let mut r = renderer();
        r.no_stroke();
        triangle_at(&mut r, -10.0);

        let sink = r.sink();
        assert_eq!(sink.triangles.len(), 1);
        for corner in &sink.triangles[0].corners {
            assert_eq!(corner.color, rgba(1.0, 1.0, 1.0, 1.0));
        }
        assert!(sink.lines.is_empty());
        assert!(r.vertices().is_empty());
    }

    #[test]
    fn test_stroke_only_triangle_outline() {
        let mut r = renderer();
        r.no_fill();
        triangle_at(&mut r, -10.0);

        let sink = r.sink();
        assert!(sink.triangles.is_empty());
        assert_eq!(sink.lines.len(), 3);
        assert!(sink.lines[0].path_start);
        assert!(!sink.lines[1].path_start);
        assert_eq!(sink.lines[0].colors[0], rgba(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_triangle_behind_near_plane_dropped() {
        let mut r = renderer();
        triangle_at(&mut r, -2.0);
        assert!(r.sink().triangles.is_empty());
        assert!(r.sink().lines.is_empty());
    }

    #[test]
    fn test_polygon_skips_repeated_vertex() {
        let mut r = renderer();
        r.no_stroke();
        r.begin_shape(ShapeKind::Polygon);
        r.vertex(0.0, 0.0, -10.0);
        r.vertex(0.0, 0.0, -10.0);
        r.vertex(1.0, 0.0, -10.0);
        r.vertex(1.0, 1.0, -10.0);
        r.vertex(0.0, 1.0, -10.0);
        assert_eq!(r.vertices().len(), 4);
        r.end_shape(CloseMode::Close).unwrap();
        assert_eq!(r.sink().triangles.len(), 2);
    }

    #[test]
    fn test_normal_mode_transitions() {
        let mut r = renderer();
        r.begin_shape(ShapeKind::Triangles);
        assert_eq!(r.context.normal_mode, NormalMode::Auto);
        r.normal(0.0, 0.0, 1.0);
        assert_eq!(r.context.normal_mode, NormalMode::Shape);
        r.normal(0.0, 1.0, 0.0);
        assert_eq!(r.context.normal_mode, NormalMode::Shape);
        r.vertex(0.0, 0.0, -10.0);
        r.normal(1.0, 0.0, 0.0);
        assert_eq!(r.context.normal_mode, NormalMode::Vertex);
        r.end_shape(CloseMode::Open).unwrap();

        r.begin_shape(ShapeKind::Triangles);
        assert_eq!(r.context.normal_mode, NormalMode::Auto);
        assert_eq!(r.context.normal, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_lit_shape_normal_broadcast() {
        let mut r = renderer();
        r.no_stroke();
        r.lights().unwrap();
        r.begin_shape(ShapeKind::Triangles);
        r.normal(0.0, 0.0, 1.0);
        r.vertex(0.0, 0.0, -10.0);
        r.vertex(1.0, 0.0, -10.0);
        r.vertex(0.0, 1.0, -10.0);
        r.end_shape(CloseMode::Open).unwrap();

        let tri = &r.sink().triangles[0];
        // 0.5 ambient + 0.5 head-on directional
        for corner in &tri.corners {
            assert!((corner.color.x - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_depth_sort_defers_and_orders() {
        let mut r = renderer();
        r.no_stroke();
        r.hint(Hint::DepthSort);
        triangle_at(&mut r, -10.0);
        triangle_at(&mut r, -50.0);
        triangle_at(&mut r, -20.0);
        assert!(r.sink().triangles.is_empty());
        assert_eq!(r.pending_triangles().len(), 3);

        r.end_draw().unwrap();
        let tris = &r.sink().triangles;
        assert_eq!(tris.len(), 3);
        let keys: Vec<f32> = tris
            .iter()
            .map(|t| t.corners.iter().map(|c| c.position.z).sum())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] >= w[1]), "{keys:?}");
        assert_eq!(tris[0].shape_index, 2);
        assert!(r.pending_triangles().is_empty());
    }

    #[test]
    fn test_no_hint_flushes() {
        let mut r = renderer();
        r.hint(Hint::DepthSort);
        triangle_at(&mut r, -10.0);
        r.no_hint(Hint::DepthSort).unwrap();
        assert_eq!(r.sink().triangles.len(), 1);
        assert_eq!(r.sink().lines.len(), 3);
    }

    #[test]
    fn test_points_dropped_when_clipped() {
        let mut r = renderer();
        r.stroke_weight(4.0);
        r.begin_shape(ShapeKind::Points);
        r.vertex(0.0, 0.0, -10.0);
        r.vertex(0.0, 0.0, 0.0);
        r.vertex(5.0, 5.0, -30.0);
        r.end_shape(CloseMode::Open).unwrap();
        let points = &r.sink().points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].weight, 4.0);
        assert!(r.sink().triangles.is_empty());
    }

    #[test]
    fn test_too_many_lights_propagates() {
        let mut r = renderer();
        for _ in 0..MAX_LIGHTS {
            r.ambient_light(gray(0.1), None).unwrap();
        }
        assert_eq!(
            r.point_light(gray(1.0), Point3::origin()),
            Err(PipelineError::TooManyLights { max: MAX_LIGHTS })
        );
    }

    #[test]
    fn test_vertex_uv_requires_texture() {
        let mut r = renderer();
        r.fill(rgba(1.0, 0.0, 0.0, 1.0));
        r.begin_shape(ShapeKind::Triangles);
        r.vertex_uv(0.0, 0.0, -10.0, 0.5, 0.5);
        assert!(r.vertices().is_empty());

        let img = image::DynamicImage::new_rgba8(4, 2);
        r.texture(Some(Arc::new(Texture::from_image(img))));
        r.vertex_uv(0.0, 0.0, -10.0, 2.0, 8.0);
        let uv = r.vertices()[0].uv;
        assert!((uv.x - 0.5).abs() < 1e-6);
        assert_eq!(uv.y, 1.0);
        // textured vertices are not tinted by the fill
        assert_eq!(r.vertices()[0].diffuse, rgba(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_accurate_textures_forward_camera_coords() {
        let mut r = renderer();
        r.hint(Hint::AccurateTextures);
        triangle_at(&mut r, -10.0);
        let camera = r.sink().triangles[0].camera.expect("camera coordinates");
        assert!((camera[1].x - 1.0).abs() < 1e-6);
        assert!((camera[1].z + 10.0).abs() < 1e-6);

        r.ortho_default();
        triangle_at(&mut r, -10.0);
        assert!(r.sink().triangles[1].camera.is_none());
    }

    #[test]
    fn test_raw_sink_mirrors_primitives() {
        let mut r = renderer();
        let raw = Rc::new(RefCell::new(RawRecorder::new(true)));
        r.set_raw_sink(Box::new(raw.clone()));
        triangle_at(&mut r, -10.0);

        let raw = raw.borrow();
        assert_eq!(raw.batches, vec![PrimitiveKind::Triangles, PrimitiveKind::Lines]);
        assert_eq!(raw.triangles.len(), 1);
        assert_eq!(raw.lines.len(), 3);
        assert!((raw.triangles[0][2].position.y - 1.0).abs() < 1e-6);
        assert!((raw.triangles[0][2].position.z + 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_after_error() {
        let mut r = renderer();
        r.hint(Hint::DepthSort);
        triangle_at(&mut r, -10.0);
        r.push_matrix().unwrap();
        r.reset();
        assert!(r.pending_triangles().is_empty());
        assert_eq!(r.matrices.depth(), 0);
        assert_eq!(r.pop_matrix(), Err(PipelineError::MatrixStackUnderflow));
    }

    #[test]
    fn test_light_specular_survives_no_lights() {
        let mut r = renderer();
        r.no_stroke();
        r.light_specular(gray(1.0));
        r.no_lights().unwrap();
        r.directional_light(gray(0.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        r.specular(gray(1.0));
        r.shininess(20.0);

        r.begin_shape(ShapeKind::Triangles);
        r.normal(0.0, 0.0, 1.0);
        r.vertex(0.0, 0.0, -10.0);
        r.vertex(40.0, 0.0, -10.0);
        r.vertex(0.0, 40.0, -10.0);
        r.end_shape(CloseMode::Open).unwrap();

        // the highlight sits on the corner straight ahead of the eye only
        let corners = &r.sink().triangles[0].corners;
        assert!((corners[0].color.x - 1.0).abs() < 1e-5);
        assert!(corners[1].color.x < 0.05);
        assert!(corners[2].color.x < 0.05);
    }

    #[test]
    fn test_no_lights_inside_shape_keeps_vertices() {
        let mut r = renderer();
        r.no_stroke();
        r.lights().unwrap();
        r.begin_shape(ShapeKind::Triangles);
        r.vertex(0.0, 0.0, -10.0);
        r.vertex(1.0, 0.0, -10.0);
        r.no_lights().unwrap();
        assert_eq!(r.vertices().len(), 2);
        r.vertex(0.0, 1.0, -10.0);
        r.end_shape(CloseMode::Open).unwrap();

        let tri = &r.sink().triangles[0];
        assert!(tri.corners.iter().all(|c| c.color == rgba(1.0, 1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_camera_block_and_light_reset() {
        let mut r = renderer();
        r.lights().unwrap();
        r.no_lights().unwrap();
        assert!(r.context.lights.is_empty());

        r.begin_camera().unwrap();
        assert!(r.matrices.is_editing_camera());
        assert_eq!(r.begin_camera(), Err(PipelineError::CameraAlreadyActive));
        r.end_camera().unwrap();
        assert_eq!(r.end_camera(), Err(PipelineError::CameraNotActive));

        // back to the default eye, so z = 0 is in view again
        r.camera_default();
        r.hint(Hint::DepthSort);
        r.begin_shape(ShapeKind::Lines);
        r.vertex_2d(10.0, 10.0);
        r.vertex_2d(20.0, 10.0);
        r.end_shape(CloseMode::Open).unwrap();
        assert_eq!(r.pending_lines().len(), 1);
        assert!(r.pending_points().is_empty());
        assert!(r.take_raw_sink().is_none());

        r.end_draw().unwrap();
        assert_eq!(r.sink().lines.len(), 1);
        r.sink_mut().clear();
        assert!(r.sink().lines.is_empty());
    }

    #[test]
    fn test_screen_and_model_queries() {
        let mut r = Renderer::new(200, 100, RecordingSink::new());
        assert!((r.screen_x(30.0, 20.0, 0.0) - 30.0).abs() < 1e-2);
        assert!((r.screen_y(30.0, 20.0, 0.0) - 20.0).abs() < 1e-2);
        let z_near = r.screen_z(100.0, 50.0, 10.0);
        let z_far = r.screen_z(100.0, 50.0, -10.0);
        assert!(z_far > z_near);

        r.translate(5.0, 6.0, 7.0);
        assert!((r.model_x(1.0, 2.0, 3.0) - 6.0).abs() < 1e-3);
        assert!((r.model_y(1.0, 2.0, 3.0) - 8.0).abs() < 1e-3);
        assert!((r.model_z(1.0, 2.0, 3.0) - 10.0).abs() < 1e-3);
    }
}
