use crate::core::math::transform::{TransformFactory, ndc_to_screen, transform_point};
use crate::error::PipelineError;
use nalgebra::{Matrix4, Point3, Vector3};

/// Maximum number of nested `push_matrix` calls.
pub const MATRIX_STACK_DEPTH: usize = 32;

/// Which matrix pair the transform calls currently edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Editing {
    /// forward = model-view, reverse = its inverse.
    ModelView,
    /// forward = camera inverse, reverse = camera (between begin/end_camera).
    Camera,
}

/// Model-view, camera and projection matrices.
///
/// Model-view and camera are stored together with their inverses and every
/// edit updates both sides, so the inverse-transpose needed for normals is
/// always at hand. The projection has no inverse and is only ever replaced.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    modelview: Matrix4<f32>,
    modelview_inv: Matrix4<f32>,
    camera: Matrix4<f32>,
    camera_inv: Matrix4<f32>,
    projection: Matrix4<f32>,
    frustum_mode: bool,
    stack: Vec<(Matrix4<f32>, Matrix4<f32>)>,
    editing: Editing,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            modelview: Matrix4::identity(),
            modelview_inv: Matrix4::identity(),
            camera: Matrix4::identity(),
            camera_inv: Matrix4::identity(),
            projection: Matrix4::identity(),
            frustum_mode: false,
            stack: Vec::with_capacity(MATRIX_STACK_DEPTH),
            editing: Editing::ModelView,
        }
    }

    //=================================
    // Accessors
    //=================================

    pub fn modelview(&self) -> &Matrix4<f32> {
        &self.modelview
    }

    pub fn modelview_inverse(&self) -> &Matrix4<f32> {
        &self.modelview_inv
    }

    pub fn camera_matrix(&self) -> &Matrix4<f32> {
        &self.camera
    }

    pub fn camera_inverse(&self) -> &Matrix4<f32> {
        &self.camera_inv
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// True when the projection was set through `frustum`/`perspective`.
    pub fn is_frustum(&self) -> bool {
        self.frustum_mode
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_editing_camera(&self) -> bool {
        self.editing == Editing::Camera
    }

    //=================================
    // Frame lifecycle
    //=================================

    /// Restores model-view to the camera and empties the push stack.
    /// Called at the start of every frame.
    pub fn begin_frame(&mut self) {
        self.modelview = self.camera;
        self.modelview_inv = self.camera_inv;
        self.stack.clear();
        self.editing = Editing::ModelView;
    }

    //=================================
    // Forward / reverse editing
    //=================================

    fn roles(&mut self) -> (&mut Matrix4<f32>, &mut Matrix4<f32>) {
        match self.editing {
            Editing::ModelView => (&mut self.modelview, &mut self.modelview_inv),
            Editing::Camera => (&mut self.camera_inv, &mut self.camera),
        }
    }

    /// Post-multiplies `forward` into the forward matrix and pre-multiplies
    /// `inverse` into the reverse one.
    fn apply_pair(&mut self, forward: Matrix4<f32>, inverse: Matrix4<f32>) {
        let (f, r) = self.roles();
        *f *= forward;
        *r = inverse * *r;
    }

    pub fn push_matrix(&mut self) -> Result<(), PipelineError> {
        if self.stack.len() == MATRIX_STACK_DEPTH {
            return Err(PipelineError::MatrixStackOverflow {
                depth: MATRIX_STACK_DEPTH,
            });
        }
        let (f, r) = self.roles();
        let saved = (*f, *r);
        self.stack.push(saved);
        Ok(())
    }

    pub fn pop_matrix(&mut self) -> Result<(), PipelineError> {
        let (forward, reverse) = self
            .stack
            .pop()
            .ok_or(PipelineError::MatrixStackUnderflow)?;
        let (f, r) = self.roles();
        *f = forward;
        *r = reverse;
        Ok(())
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let t = Vector3::new(x, y, z);
        self.apply_pair(
            TransformFactory::translation(&t),
            TransformFactory::translation(&-t),
        );
    }

    pub fn rotate_x(&mut self, angle_rad: f32) {
        self.apply_pair(
            TransformFactory::rotation_x(angle_rad),
            TransformFactory::rotation_x(-angle_rad),
        );
    }

    pub fn rotate_y(&mut self, angle_rad: f32) {
        self.apply_pair(
            TransformFactory::rotation_y(angle_rad),
            TransformFactory::rotation_y(-angle_rad),
        );
    }

    pub fn rotate_z(&mut self, angle_rad: f32) {
        self.apply_pair(
            TransformFactory::rotation_z(angle_rad),
            TransformFactory::rotation_z(-angle_rad),
        );
    }

    /// Rotation about an arbitrary axis.
    pub fn rotate(&mut self, angle_rad: f32, axis: &Vector3<f32>) {
        self.apply_pair(
            TransformFactory::rotation(axis, angle_rad),
            TransformFactory::rotation(axis, -angle_rad),
        );
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        let s = Vector3::new(x, y, z);
        self.apply_pair(
            TransformFactory::scaling_nonuniform(&s),
            TransformFactory::scaling_inverse(&s),
        );
    }

    /// Resets the matrix pair being edited to identity.
    pub fn reset_matrix(&mut self) {
        let (f, r) = self.roles();
        *f = Matrix4::identity();
        *r = Matrix4::identity();
    }

    /// Multiplies an arbitrary matrix into the edited pair.
    ///
    /// The matrix must be invertible, since the reverse side has to follow.
    pub fn apply_matrix(&mut self, m: &Matrix4<f32>) -> Result<(), PipelineError> {
        let inverse = m.try_inverse().ok_or(PipelineError::SingularMatrix)?;
        self.apply_pair(*m, inverse);
        Ok(())
    }

    //=================================
    // Camera
    //=================================

    /// Starts editing the camera. Transform calls until `end_camera` are
    /// composed into the camera inverse (and, reversed, into the camera).
    pub fn begin_camera(&mut self) -> Result<(), PipelineError> {
        if self.editing == Editing::Camera {
            return Err(PipelineError::CameraAlreadyActive);
        }
        self.editing = Editing::Camera;
        Ok(())
    }

    /// Finishes editing the camera and reloads model-view from it.
    pub fn end_camera(&mut self) -> Result<(), PipelineError> {
        if self.editing != Editing::Camera {
            return Err(PipelineError::CameraNotActive);
        }
        self.modelview = self.camera;
        self.modelview_inv = self.camera_inv;
        self.editing = Editing::ModelView;
        Ok(())
    }

    /// Replaces the camera with a look-at transform and resets model-view.
    pub fn camera(&mut self, eye: &Point3<f32>, center: &Point3<f32>, up: &Vector3<f32>) {
        let basis = TransformFactory::look_at_basis(eye, center, up);
        self.camera = basis * TransformFactory::translation(&-eye.coords);
        self.camera_inv = TransformFactory::translation(&eye.coords) * basis.transpose();
        self.modelview = self.camera;
        self.modelview_inv = self.camera_inv;
    }

    //=================================
    // Projection
    //=================================

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.projection = TransformFactory::frustum(left, right, bottom, top, near, far);
        self.frustum_mode = true;
    }

    pub fn perspective(&mut self, fov_y_rad: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.projection = TransformFactory::perspective(fov_y_rad, aspect_ratio, near, far);
        self.frustum_mode = true;
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.projection = TransformFactory::orthographic(left, right, bottom, top, near, far);
        self.frustum_mode = false;
    }

    //=================================
    // Queries
    //=================================

    /// Projects a model-space point all the way to screen space.
    pub fn screen_point(&self, p: &Point3<f32>, width: f32, height: f32) -> Point3<f32> {
        let view = transform_point(&self.modelview, p);
        let ndc = transform_point(&self.projection, &view);
        ndc_to_screen(&ndc, width, height)
    }

    /// Returns the world-space position of a model-space point, i.e. the
    /// point carried through model-view and back out through the camera.
    pub fn model_point(&self, p: &Point3<f32>) -> Point3<f32> {
        let view = transform_point(&self.modelview, p);
        transform_point(&self.camera_inv, &view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_identity(m: &Matrix4<f32>) {
        let id = Matrix4::<f32>::identity();
        for (a, b) in m.iter().zip(id.iter()) {
            assert!((a - b).abs() < 1e-4, "{m:?} is not identity");
        }
    }

    #[test]
    fn test_forward_and_reverse_stay_inverse() {
        let mut stack = MatrixStack::new();
        stack.translate(10.0, -4.0, 2.0);
        stack.rotate_x(0.3);
        stack.rotate_y(-1.1);
        stack.rotate(0.8, &Vector3::new(1.0, 1.0, 0.0));
        stack.scale(2.0, 0.5, 3.0);
        stack.rotate_z(0.2);
        assert_identity(&(stack.modelview() * stack.modelview_inverse()));
    }

    #[test]
    fn test_push_pop_restores_both_matrices() {
        let mut stack = MatrixStack::new();
        stack.translate(1.0, 2.0, 3.0);
        let before = *stack.modelview();
        let before_inv = *stack.modelview_inverse();

        stack.push_matrix().unwrap();
        stack.scale(5.0, 5.0, 5.0);
        stack.pop_matrix().unwrap();

        assert_eq!(*stack.modelview(), before);
        assert_eq!(*stack.modelview_inverse(), before_inv);
    }

    #[test]
    fn test_stack_overflow() {
        let mut stack = MatrixStack::new();
        for _ in 0..MATRIX_STACK_DEPTH {
            stack.push_matrix().unwrap();
        }
        assert_eq!(
            stack.push_matrix(),
            Err(PipelineError::MatrixStackOverflow {
                depth: MATRIX_STACK_DEPTH
            })
        );
    }

    #[test]
    fn test_stack_underflow() {
        let mut stack = MatrixStack::new();
        assert_eq!(stack.pop_matrix(), Err(PipelineError::MatrixStackUnderflow));
    }

    #[test]
    fn test_camera_brackets() {
        let mut stack = MatrixStack::new();
        assert_eq!(stack.end_camera(), Err(PipelineError::CameraNotActive));
        stack.begin_camera().unwrap();
        assert_eq!(stack.begin_camera(), Err(PipelineError::CameraAlreadyActive));
        stack.end_camera().unwrap();
    }

    #[test]
    fn test_camera_edit_moves_the_eye() {
        // Translating the camera by +5 in x moves the world by -5 in view space.
        let mut stack = MatrixStack::new();
        stack.begin_camera().unwrap();
        stack.translate(5.0, 0.0, 0.0);
        stack.end_camera().unwrap();

        let view = transform_point(stack.modelview(), &Point3::new(5.0, 0.0, 0.0));
        assert!(view.coords.norm() < 1e-5);
        assert_identity(&(stack.camera_matrix() * stack.camera_inverse()));
    }

    #[test]
    fn test_look_at_puts_center_on_negative_z() {
        let mut stack = MatrixStack::new();
        stack.camera(
            &Point3::new(0.0, 0.0, 10.0),
            &Point3::origin(),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        let view = transform_point(stack.modelview(), &Point3::origin());
        assert!((view.z + 10.0).abs() < 1e-5);
        assert_identity(&(stack.modelview() * stack.modelview_inverse()));
    }

    #[test]
    fn test_apply_singular_matrix_fails() {
        let mut stack = MatrixStack::new();
        assert_eq!(
            stack.apply_matrix(&Matrix4::zeros()),
            Err(PipelineError::SingularMatrix)
        );
    }

    #[test]
    fn test_model_point_returns_world_coordinates() {
        let mut stack = MatrixStack::new();
        stack.camera(
            &Point3::new(3.0, 1.0, 7.0),
            &Point3::origin(),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        stack.translate(1.0, 2.0, 3.0);
        let world = stack.model_point(&Point3::origin());
        assert!((world - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-4);
    }

    #[test]
    fn test_screen_point_center() {
        let mut stack = MatrixStack::new();
        stack.camera(
            &Point3::new(0.0, 0.0, 10.0),
            &Point3::origin(),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        stack.perspective(1.0, 1.0, 1.0, 100.0);
        let s = stack.screen_point(&Point3::origin(), 200.0, 100.0);
        assert!((s.x - 100.0).abs() < 1e-3);
        assert!((s.y - 50.0).abs() < 1e-3);
        assert!(s.z > 0.0 && s.z < 1.0);
    }
}
