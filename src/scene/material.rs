use crate::core::color::{Rgb, Rgba, gray, rgba};
use nalgebra::Vector4;

/// Surface response snapshotted into each vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Rgb,
    pub specular: Rgba,
    pub emissive: Rgb,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: gray(1.0),
            specular: Vector4::new(0.5, 0.5, 0.5, 1.0),
            emissive: gray(0.0),
            shininess: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeCap {
    #[default]
    Round,
    Square,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

/// Current fill, stroke and material settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// `None` disables filling.
    pub fill: Option<Rgba>,
    /// `None` disables stroking.
    pub stroke: Option<Rgba>,
    pub stroke_weight: f32,
    pub stroke_cap: StrokeCap,
    pub stroke_join: StrokeJoin,
    pub material: Material,
    /// Ambient tracks the fill color until `ambient()` is set explicitly.
    pub ambient_follows_fill: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(rgba(1.0, 1.0, 1.0, 1.0)),
            stroke: Some(rgba(0.0, 0.0, 0.0, 1.0)),
            stroke_weight: 1.0,
            stroke_cap: StrokeCap::default(),
            stroke_join: StrokeJoin::default(),
            material: Material::default(),
            ambient_follows_fill: true,
        }
    }
}

impl Style {
    pub fn set_fill(&mut self, color: Rgba) {
        self.fill = Some(color);
        if self.ambient_follows_fill {
            self.material.ambient = color.xyz();
        }
    }

    pub fn set_ambient(&mut self, color: Rgb) {
        self.material.ambient = color;
        self.ambient_follows_fill = false;
    }

    /// Ambient color a vertex should carry right now.
    pub fn ambient(&self) -> Rgb {
        match (self.ambient_follows_fill, self.fill) {
            (true, Some(fill)) => fill.xyz(),
            _ => self.material.ambient,
        }
    }
}
