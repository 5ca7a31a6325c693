use nalgebra::{Matrix4, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for the homogeneous matrices used by the matrix stack.
///
/// Every forward transform has a matching `*_inverse` constructor so the stack
/// can keep a matrix and its inverse in lockstep without a general inversion.
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Rotation about an arbitrary axis (Rodrigues' formula).
    /// A zero-length axis yields the identity.
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let norm = axis.norm();
        if norm == 0.0 {
            return Matrix4::identity();
        }
        let x = axis.x / norm;
        let y = axis.y / norm;
        let z = axis.z / norm;
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        let t = 1.0 - c;

        Matrix4::new(
            t * x * x + c,     t * x * y - z * s, t * x * z + y * s, 0.0,
            t * x * y + z * s, t * y * y + c,     t * y * z - x * s, 0.0,
            t * x * z - y * s, t * y * z + x * s, t * z * z + c,     0.0,
            0.0,               0.0,               0.0,               1.0,
        )
    }

    pub fn rotation_x(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,  -s,   0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_z(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,  -s,   0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    /// Inverse of `scaling_nonuniform`. Zero components stay zero.
    pub fn scaling_inverse(scale: &Vector3<f32>) -> Matrix4<f32> {
        let inv = |s: f32| if s == 0.0 { 0.0 } else { 1.0 / s };
        Self::scaling_nonuniform(&Vector3::new(inv(scale.x), inv(scale.y), inv(scale.z)))
    }

    /// Orthonormal view basis for a camera at `eye` looking at `center`.
    ///
    /// Returns the rotation part only (rows are the x, y, z camera axes).
    /// The camera looks down its -Z axis. Degenerate inputs (eye == center,
    /// or up parallel to the view direction) leave the offending axis zero.
    pub fn look_at_basis(eye: &Point3<f32>, center: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        // Gram-Schmidt: z first, then x from up, then y from z and x
        let z_axis = normalize_or_zero(eye - center);
        let x_axis = normalize_or_zero(up.cross(&z_axis));
        let y_axis = normalize_or_zero(z_axis.cross(&x_axis));

        Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        )
    }

    /// General perspective frustum (OpenGL convention, camera looking down -Z).
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
        let rl = 1.0 / (right - left);
        let tb = 1.0 / (top - bottom);
        let fn_ = 1.0 / (far - near);

        Matrix4::new(
            2.0 * near * rl, 0.0,             (right + left) * rl, 0.0,
            0.0,             2.0 * near * tb, (top + bottom) * tb, 0.0,
            0.0,             0.0,            -(far + near) * fn_, -2.0 * far * near * fn_,
            0.0,             0.0,            -1.0,                 0.0,
        )
    }

    /// Symmetric perspective projection expressed as a frustum.
    pub fn perspective(fov_y_rad: f32, aspect_ratio: f32, near: f32, far: f32) -> Matrix4<f32> {
        let ymax = near * (fov_y_rad / 2.0).tan();
        let xmax = ymax * aspect_ratio;
        Self::frustum(-xmax, xmax, -ymax, ymax, near, far)
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
        let rl = 1.0 / (right - left);
        let tb = 1.0 / (top - bottom);
        let fn_ = 1.0 / (far - near);

        Matrix4::new(
            2.0 * rl, 0.0,       0.0,        -(right + left) * rl,
            0.0,      2.0 * tb,  0.0,        -(top + bottom) * tb,
            0.0,      0.0,      -2.0 * fn_,  -(far + near) * fn_,
            0.0,      0.0,       0.0,         1.0,
        )
    }
}

//=================================
// Core Transformation Functions
//=================================

#[inline]
fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let n = v.norm();
    if n > 0.0 { v / n } else { v }
}

/// Transforms a point and divides by w.
///
/// The divide is skipped when w is exactly 0 or 1, so affine transforms are
/// exact and a vanishing w never produces infinities.
#[inline]
pub fn transform_point(m: &Matrix4<f32>, p: &Point3<f32>) -> Point3<f32> {
    let h = m * Vector4::new(p.x, p.y, p.z, 1.0);
    apply_perspective_division(&h)
}

/// Performs perspective division (clip space to NDC) with the same w rule as
/// `transform_point`.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    let w = clip.w;
    if w != 0.0 && w != 1.0 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::new(clip.x, clip.y, clip.z)
    }
}

/// Carries a normal through the inverse-transpose of the matrix whose
/// inverse is `inverse`, then normalizes it.
///
/// `n' = (M^-1)^T * n`, with the homogeneous w divided out when non-trivial.
#[inline]
pub fn transform_normal(inverse: &Matrix4<f32>, n: &Vector3<f32>) -> Vector3<f32> {
    let h = inverse.transpose() * Vector4::new(n.x, n.y, n.z, 0.0);
    let mut out = Vector3::new(h.x, h.y, h.z);
    if h.w != 0.0 && h.w != 1.0 {
        out /= h.w;
    }
    normalize_or_zero(out)
}

/// Converts NDC coordinates to screen coordinates.
///
/// x and y map [-1, 1] onto [0, width] and [0, height] without flipping y;
/// z maps [-1, 1] onto [0, 1].
#[inline]
pub fn ndc_to_screen(ndc: &Point3<f32>, width: f32, height: f32) -> Point3<f32> {
    Point3::new(
        width * (1.0 + ndc.x) / 2.0,
        height * (1.0 + ndc.y) / 2.0,
        (ndc.z + 1.0) / 2.0,
    )
}
