use nalgebra::{Vector3, Vector4};

/// Linear RGBA color, each channel nominally in [0, 1].
pub type Rgba = Vector4<f32>;
/// Linear RGB color.
pub type Rgb = Vector3<f32>;

/// Clamps to [0, 1]. NaN maps to 0.
#[inline]
pub fn clamp_unit(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}

#[inline]
pub fn clamp_rgb(c: &Rgb) -> Rgb {
    c.map(clamp_unit)
}

#[inline]
pub fn gray(v: f32) -> Rgb {
    Vector3::new(v, v, v)
}

#[inline]
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Rgba {
    Vector4::new(r, g, b, a)
}

/// "Source over" compositing of a straight-alpha color onto an opaque one.
#[inline]
pub fn blend_over(dst: &Rgb, src: &Rgba) -> Rgb {
    let a = clamp_unit(src.w);
    src.xyz() * a + dst * (1.0 - a)
}

/// Packs an opaque color as 0RGB.
pub fn to_rgb_u32(c: &Rgb) -> u32 {
    let r = (clamp_unit(c.x) * 255.0 + 0.5) as u32;
    let g = (clamp_unit(c.y) * 255.0 + 0.5) as u32;
    let b = (clamp_unit(c.z) * 255.0 + 0.5) as u32;
    (r << 16) | (g << 8) | b
}
