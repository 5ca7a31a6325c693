use crate::core::color::{Rgb, gray};
use crate::core::math::matrix_stack::MatrixStack;
use crate::core::math::transform::{transform_normal, transform_point};
use crate::error::PipelineError;
use nalgebra::{Point3, Vector3};

/// Maximum number of lights per frame.
pub const MAX_LIGHTS: usize = 8;

/// Distance attenuation `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Falloff {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

impl Falloff {
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// True if attenuation does not depend on distance.
    pub fn is_constant(&self) -> bool {
        self.linear == 0.0 && self.quadratic == 0.0
    }

    /// Attenuation denominator at `distance`. A zero result is replaced by 1.
    pub fn denominator(&self, distance: f32) -> f32 {
        let mut denom = self.constant;
        if !self.is_constant() {
            denom += self.linear * distance + self.quadratic * distance * distance;
        }
        if denom == 0.0 { 1.0 } else { denom }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Rays travel along `direction` (view space, unit length).
    Directional { direction: Vector3<f32> },
    Point,
    Spot {
        /// Cone axis, view space, unit length.
        direction: Vector3<f32>,
        /// Cosine of the cone half-angle, never negative.
        cos_angle: f32,
        /// Exponent applied to the cosine between axis and light ray.
        concentration: f32,
    },
}

/// A light baked into view space at declaration time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub diffuse: Rgb,
    pub specular: Rgb,
    /// View-space position. Ambient lights use it only for falloff.
    pub position: Point3<f32>,
    pub falloff: Falloff,
}

impl Light {
    pub fn has_specular(&self) -> bool {
        self.specular.iter().any(|c| *c > 0.0)
    }
}

/// The frame's light list plus the settings baked into each new light.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSet {
    lights: Vec<Light>,
    falloff: Falloff,
    specular: Rgb,
    position_dependent: bool,
}

impl Default for LightSet {
    fn default() -> Self {
        Self {
            lights: Vec::with_capacity(MAX_LIGHTS),
            falloff: Falloff::default(),
            specular: gray(0.0),
            position_dependent: false,
        }
    }
}

impl LightSet {
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// True when some light's contribution varies with vertex position
    /// (point or spot lights, distance falloff, or light specular).
    pub fn depends_on_position(&self) -> bool {
        self.position_dependent
    }

    /// Clears the list and restores the default falloff and specular.
    pub fn reset(&mut self) {
        self.lights.clear();
        self.falloff = Falloff::default();
        self.specular = gray(0.0);
        self.position_dependent = false;
    }

    /// Removes all lights but keeps falloff/specular settings. Lights
    /// declared afterwards still bake those settings in.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.position_dependent = !self.falloff.is_constant() || self.specular.iter().any(|c| *c > 0.0);
    }

    pub fn set_falloff(&mut self, falloff: Falloff) {
        if !falloff.is_constant() {
            self.position_dependent = true;
        }
        self.falloff = falloff;
    }

    pub fn set_specular(&mut self, specular: Rgb) {
        if specular.iter().any(|c| *c > 0.0) {
            self.position_dependent = true;
        }
        self.specular = specular;
    }

    fn push(&mut self, kind: LightKind, diffuse: Rgb, position: Point3<f32>) -> Result<(), PipelineError> {
        if self.lights.len() == MAX_LIGHTS {
            return Err(PipelineError::TooManyLights { max: MAX_LIGHTS });
        }
        self.lights.push(Light {
            kind,
            diffuse,
            specular: self.specular,
            position,
            falloff: self.falloff,
        });
        Ok(())
    }

    /// Ambient light. `position` (model space) only matters with distance falloff.
    pub fn ambient(&mut self, color: Rgb, position: Option<Point3<f32>>, matrices: &MatrixStack) -> Result<(), PipelineError> {
        let position = position
            .map(|p| transform_point(matrices.modelview(), &p))
            .unwrap_or_else(Point3::origin);
        self.push(LightKind::Ambient, color, position)
    }

    pub fn directional(&mut self, color: Rgb, direction: Vector3<f32>, matrices: &MatrixStack) -> Result<(), PipelineError> {
        let direction = transform_normal(matrices.modelview_inverse(), &direction);
        self.push(LightKind::Directional { direction }, color, Point3::origin())
    }

    pub fn point(&mut self, color: Rgb, position: Point3<f32>, matrices: &MatrixStack) -> Result<(), PipelineError> {
        let position = transform_point(matrices.modelview(), &position);
        self.push(LightKind::Point, color, position)?;
        self.position_dependent = true;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spot(
        &mut self,
        color: Rgb,
        position: Point3<f32>,
        direction: Vector3<f32>,
        angle_rad: f32,
        concentration: f32,
        matrices: &MatrixStack,
    ) -> Result<(), PipelineError> {
        let position = transform_point(matrices.modelview(), &position);
        let direction = transform_normal(matrices.modelview_inverse(), &direction);
        let kind = LightKind::Spot {
            direction,
            cos_angle: angle_rad.cos().max(0.0),
            concentration,
        };
        self.push(kind, color, position)?;
        self.position_dependent = true;
        Ok(())
    }
}
