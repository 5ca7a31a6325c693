use crate::core::color::Rgba;
use crate::scene::material::{StrokeCap, StrokeJoin};
use crate::scene::texture::Texture;
use nalgebra::{Point3, Vector2};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

//=================================
// Screen-space records
//=================================

/// One corner of a finished triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCorner {
    /// x, y in pixels, z in [0, 1].
    pub position: Point3<f32>,
    /// Diffuse plus specular, clamped. Alpha comes from the diffuse term.
    pub color: Rgba,
    pub uv: Vector2<f32>,
}

#[derive(Debug, Clone)]
pub struct ScreenTriangle {
    pub corners: [ScreenCorner; 3],
    pub texture: Option<Arc<Texture>>,
    /// View-space corners, present only with the accurate-textures hint
    /// under a perspective projection.
    pub camera: Option<[Point3<f32>; 3]>,
    pub shape_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLine {
    pub positions: [Point3<f32>; 2],
    pub colors: [Rgba; 2],
    pub weight: f32,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
    /// First segment of a stroke path.
    pub path_start: bool,
    pub shape_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub position: Point3<f32>,
    pub color: Rgba,
    pub weight: f32,
    pub shape_index: usize,
}

/// Consumer of the pipeline's output, typically a scanline rasterizer.
pub trait RasterSink {
    fn triangle(&mut self, triangle: &ScreenTriangle);
    fn line(&mut self, line: &ScreenLine);
    fn point(&mut self, point: &ScreenPoint);
}

//=================================
// Raw (non-raster) output
//=================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    Lines,
    Points,
}

/// A vertex as seen by a raw sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVertex {
    /// View-space position for 3D sinks, screen x/y with z = 0 otherwise.
    pub position: Point3<f32>,
    pub color: Rgba,
    pub uv: Vector2<f32>,
}

/// Secondary output mirroring every primitive, e.g. for vector export.
pub trait RawSink {
    /// True if the sink wants view-space coordinates instead of screen ones.
    fn is_3d(&self) -> bool;

    /// Called before each run of primitives of the same kind.
    fn begin_batch(&mut self, _kind: PrimitiveKind) {}

    fn triangle(&mut self, vertices: &[RawVertex; 3]);
    fn line(&mut self, vertices: &[RawVertex; 2], weight: f32);
    fn point(&mut self, vertex: &RawVertex, weight: f32);
}

/// Shared handle, so a caller can keep reading a sink the renderer owns.
impl<T: RawSink> RawSink for Rc<RefCell<T>> {
    fn is_3d(&self) -> bool {
        self.borrow().is_3d()
    }

    fn begin_batch(&mut self, kind: PrimitiveKind) {
        self.borrow_mut().begin_batch(kind);
    }

    fn triangle(&mut self, vertices: &[RawVertex; 3]) {
        self.borrow_mut().triangle(vertices);
    }

    fn line(&mut self, vertices: &[RawVertex; 2], weight: f32) {
        self.borrow_mut().line(vertices, weight);
    }

    fn point(&mut self, vertex: &RawVertex, weight: f32) {
        self.borrow_mut().point(vertex, weight);
    }
}

//=================================
// Recorders
//=================================

/// Keeps every primitive it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub triangles: Vec<ScreenTriangle>,
    pub lines: Vec<ScreenLine>,
    pub points: Vec<ScreenPoint>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.triangles.clear();
        self.lines.clear();
        self.points.clear();
    }
}

impl RasterSink for RecordingSink {
    fn triangle(&mut self, triangle: &ScreenTriangle) {
        self.triangles.push(triangle.clone());
    }

    fn line(&mut self, line: &ScreenLine) {
        self.lines.push(*line);
    }

    fn point(&mut self, point: &ScreenPoint) {
        self.points.push(*point);
    }
}

/// Raw-sink counterpart of `RecordingSink`.
#[derive(Debug, Clone, Default)]
pub struct RawRecorder {
    pub three_d: bool,
    pub batches: Vec<PrimitiveKind>,
    pub triangles: Vec<[RawVertex; 3]>,
    pub lines: Vec<([RawVertex; 2], f32)>,
    pub points: Vec<(RawVertex, f32)>,
}

impl RawRecorder {
    pub fn new(three_d: bool) -> Self {
        Self {
            three_d,
            ..Self::default()
        }
    }
}

impl RawSink for RawRecorder {
    fn is_3d(&self) -> bool {
        self.three_d
    }

    fn begin_batch(&mut self, kind: PrimitiveKind) {
        self.batches.push(kind);
    }

    fn triangle(&mut self, vertices: &[RawVertex; 3]) {
        self.triangles.push(*vertices);
    }

    fn line(&mut self, vertices: &[RawVertex; 2], weight: f32) {
        self.lines.push((*vertices, weight));
    }

    fn point(&mut self, vertex: &RawVertex, weight: f32) {
        self.points.push((*vertex, weight));
    }
}
