use crate::core::color::Rgba;
use image::{DynamicImage, RgbaImage};
use log::info;
use nalgebra::Vector4;
use std::path::Path;

/// An image bound to shapes with `Renderer::texture`.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, image::ImageError> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)?;
        info!("Loaded texture: {:?} ({}x{})", path_ref, img.width(), img.height());
        Ok(Self::from_image(img))
    }

    pub fn from_image(img: DynamicImage) -> Self {
        let image = img.into_rgba8();
        Self {
            width: image.width(),
            height: image.height(),
            image,
        }
    }

    /// Samples with bilinear filtering. `u`, `v` are clamped to [0, 1];
    /// texels outside the image clamp to the edge.
    pub fn sample(&self, u: f32, v: f32) -> Rgba {
        if self.width == 0 || self.height == 0 {
            return Vector4::new(1.0, 1.0, 1.0, 1.0);
        }

        // 1. Map to texel space (texel centers at +0.5)
        let x = u.clamp(0.0, 1.0) * self.width as f32 - 0.5;
        let y = v.clamp(0.0, 1.0) * self.height as f32 - 0.5;

        // 2. The 2x2 block and weights
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let wx = x - x.floor();
        let wy = y - y.floor();

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        // 3. Lerp x, then y
        let top = c00 * (1.0 - wx) + c10 * wx;
        let bottom = c01 * (1.0 - wx) + c11 * wx;
        top * (1.0 - wy) + bottom * wy
    }

    /// Texel as [0, 1] RGBA, clamped to the image edge.
    fn texel(&self, x: i64, y: i64) -> Rgba {
        let xc = x.clamp(0, self.width as i64 - 1) as u32;
        let yc = y.clamp(0, self.height as i64 - 1) as u32;
        let p = self.image.get_pixel(xc, yc);
        Vector4::new(
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
            p[3] as f32 / 255.0,
        )
    }
}
