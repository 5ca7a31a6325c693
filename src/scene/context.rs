use crate::scene::light::LightSet;
use crate::scene::material::Style;
use crate::scene::texture::Texture;
use nalgebra::Vector3;
use std::sync::Arc;

/// Granularity at which normals were supplied for the current shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalMode {
    /// No `normal()` call: one face normal per triangle.
    #[default]
    Auto,
    /// One `normal()` call before the first vertex.
    Shape,
    /// `normal()` called between vertices.
    Vertex,
}

/// How `vertex_uv` coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureMode {
    /// Pixels of the bound image.
    #[default]
    Image,
    /// Already in [0, 1].
    Normal,
}

/// Rendering switches toggled with `Renderer::hint` / `no_hint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// Defer all shapes to `end_draw` and sort them back to front.
    DepthSort,
    /// Forward camera-space corners to the sink for perspective-correct texturing.
    AccurateTextures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hints {
    pub depth_sort: bool,
    pub accurate_textures: bool,
}

impl Hints {
    pub fn set(&mut self, hint: Hint, on: bool) {
        match hint {
            Hint::DepthSort => self.depth_sort = on,
            Hint::AccurateTextures => self.accurate_textures = on,
        }
    }
}

/// All mutable drawing state of a renderer, apart from the matrices and the
/// geometry buffers.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub style: Style,
    pub lights: LightSet,
    pub hints: Hints,

    // --- Per-shape state ---
    pub normal: Vector3<f32>,
    pub normal_mode: NormalMode,
    pub texture: Option<Arc<Texture>>,
    pub texture_mode: TextureMode,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            style: Style::default(),
            lights: LightSet::default(),
            hints: Hints::default(),
            normal: Vector3::new(0.0, 0.0, 1.0),
            normal_mode: NormalMode::Auto,
            texture: None,
            texture_mode: TextureMode::Image,
        }
    }
}
