use crate::core::math::matrix_stack::MatrixStack;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionType {
    Perspective { fov_y_rad: f32, aspect_ratio: f32 },
    /// Box from (left, bottom) to (right, top) in view units.
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },
}

/// Camera placement and projection, applied to a `MatrixStack` in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub center: Point3<f32>,
    pub up: Vector3<f32>,
    pub near: f32,
    pub far: f32,
    pub projection_type: ProjectionType,
}

/// Field of view of the default camera.
pub const DEFAULT_FOV_DEG: f32 = 60.0;

impl Camera {
    /// The default camera for a `width x height` surface: looking down -Z at
    /// the surface center from the distance where one unit is one pixel.
    pub fn default_for(width: usize, height: usize) -> Self {
        let w = width as f32;
        let h = height as f32;
        let fov_y_rad = DEFAULT_FOV_DEG.to_radians();
        let eye_z = (h / 2.0) / (fov_y_rad / 2.0).tan();

        Self {
            eye: Point3::new(w / 2.0, h / 2.0, eye_z),
            center: Point3::new(w / 2.0, h / 2.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            near: eye_z / 10.0,
            far: eye_z * 10.0,
            projection_type: ProjectionType::Perspective {
                fov_y_rad,
                aspect_ratio: if h > 0.0 { w / h } else { 1.0 },
            },
        }
    }

    /// Orthographic box of the surface size around the view axis, so the
    /// default eye keeps one unit per pixel at any depth.
    pub fn centered_ortho(width: usize, height: usize) -> ProjectionType {
        let (w, h) = (width as f32, height as f32);
        ProjectionType::Orthographic {
            left: -w / 2.0,
            right: w / 2.0,
            bottom: -h / 2.0,
            top: h / 2.0,
        }
    }

    /// Loads camera and projection into the matrix stack.
    pub fn apply(&self, matrices: &mut MatrixStack) {
        matrices.camera(&self.eye, &self.center, &self.up);

        match self.projection_type {
            ProjectionType::Perspective {
                fov_y_rad,
                aspect_ratio,
            } => matrices.perspective(fov_y_rad, aspect_ratio, self.near, self.far),

            ProjectionType::Orthographic {
                left,
                right,
                bottom,
                top,
            } => matrices.ortho(left, right, bottom, top, self.near, self.far),
        }
    }
}
