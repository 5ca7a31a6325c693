use crate::core::color::{Rgb, Rgba, blend_over};
use nalgebra::Vector3;

/// Color and depth planes of the demo rasterizer.
///
/// Depth is the screen z in [0, 1]; smaller is nearer. Cleared depth is
/// `f32::INFINITY`, so anything drawn passes the first test.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color_buffer: Vec<Rgb>,
    depth_buffer: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color_buffer: vec![Vector3::zeros(); size],
            depth_buffer: vec![f32::INFINITY; size],
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        self.color_buffer.fill(color);
        self.depth_buffer.fill(f32::INFINITY);
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Returns true and stores `depth` if it is nearer than what is there.
    #[inline]
    pub fn depth_test_and_update(&mut self, x: usize, y: usize, depth: f32) -> bool {
        let idx = self.index(x, y);
        if depth >= self.depth_buffer[idx] {
            return false;
        }
        self.depth_buffer[idx] = depth;
        true
    }

    /// Composites a straight-alpha color over the pixel.
    #[inline]
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: &Rgba) {
        let idx = self.index(x, y);
        self.color_buffer[idx] = blend_over(&self.color_buffer[idx], color);
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.color_buffer[self.index(x, y)])
    }

    pub fn get_depth(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth_buffer[self.index(x, y)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::{gray, rgba};

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut fb = FrameBuffer::new(4, 4);
        assert!(fb.depth_test_and_update(1, 1, 0.5));
        assert!(!fb.depth_test_and_update(1, 1, 0.7));
        assert!(fb.depth_test_and_update(1, 1, 0.2));
        assert_eq!(fb.get_depth(1, 1), Some(0.2));
    }

    #[test]
    fn test_blend_and_clear() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.clear(gray(0.0));
        fb.blend_pixel(0, 1, &rgba(1.0, 1.0, 1.0, 0.25));
        let p = fb.get_pixel(0, 1).unwrap();
        assert!((p.x - 0.25).abs() < 1e-6);
        assert_eq!(fb.get_pixel(2, 0), None);
        assert!(!fb.in_bounds(-1, 0));
        assert!(fb.in_bounds(1, 1));
    }
}
