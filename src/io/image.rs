use crate::core::color::to_rgb_u32;
use crate::core::framebuffer::FrameBuffer;
use image::ImageBuffer;
use log::{error, info};
use std::path::Path;

/// Writes the color plane of a framebuffer to an image file; the format
/// follows the extension. Row 0 of the framebuffer is the top row.
pub fn save_framebuffer<P: AsRef<Path>>(fb: &FrameBuffer, path: P) -> Result<(), image::ImageError> {
    let path = path.as_ref();
    let mut img_buf = ImageBuffer::new(fb.width as u32, fb.height as u32);

    for (x, y, pixel) in img_buf.enumerate_pixels_mut() {
        let color_u32 = fb
            .get_pixel(x as usize, y as usize)
            .map(|c| to_rgb_u32(&c))
            .unwrap_or(0);

        let r = ((color_u32 >> 16) & 0xFF) as u8;
        let g = ((color_u32 >> 8) & 0xFF) as u8;
        let b = (color_u32 & 0xFF) as u8;

        *pixel = image::Rgb([r, g, b]);
    }

    if let Err(e) = img_buf.save(path) {
        error!("Failed to save image to '{}': {}", path.display(), e);
        return Err(e);
    }
    info!("Saved {}x{} image to '{}'", fb.width, fb.height, path.display());
    Ok(())
}
