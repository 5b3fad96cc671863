use crate::mask::BoundaryMask;

/// An RGBA pixel buffer handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// White where the mask is set, black elsewhere. Shown while the
    /// boundary pass is still running.
    pub fn from_mask(mask: &BoundaryMask) -> Self {
        let mut buf = Self::new(mask.width, mask.height);
        for (chunk, &set) in buf.pixels.chunks_exact_mut(4).zip(mask.cells()) {
            let v = if set { 255 } else { 0 };
            chunk[..3].fill(v);
        }
        buf
    }

    /// Overlay a progress bar along the bottom edge, `progress · width`
    /// pixels long. Negative progress (no scan running) draws nothing.
    pub fn draw_progress_bar(&mut self, progress: f64, thickness: u32, color: [u8; 4]) {
        if progress < 0.0 || self.width == 0 {
            return;
        }
        let len = ((progress.min(1.0) * self.width as f64).round() as u32).min(self.width);
        let rows = thickness.min(self.height);
        let stride = self.width as usize * 4;
        for row in self.height - rows..self.height {
            let start = row as usize * stride;
            for px in self.pixels[start..start + len as usize * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(buf: &RenderBuffer, row: u32, col: u32) -> [u8; 4] {
        let i = (row as usize * buf.width as usize + col as usize) * 4;
        [
            buf.pixels[i],
            buf.pixels[i + 1],
            buf.pixels[i + 2],
            buf.pixels[i + 3],
        ]
    }

    #[test]
    fn new_buffer_is_black_opaque() {
        let buf = RenderBuffer::new(4, 4);
        assert_eq!(buf.pixels.len(), 4 * 4 * 4);
        for chunk in buf.pixels.chunks_exact(4) {
            assert_eq!(chunk, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn mask_preview_is_white_on_black() {
        let mut mask = BoundaryMask::new(3, 2);
        mask.set(1, 2, true);
        let buf = RenderBuffer::from_mask(&mask);
        assert_eq!(pixel(&buf, 1, 2), [255, 255, 255, 255]);
        assert_eq!(pixel(&buf, 0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn progress_bar_covers_bottom_rows() {
        let mut buf = RenderBuffer::new(10, 5);
        let green = [0, 255, 0, 255];
        buf.draw_progress_bar(0.5, 2, green);
        assert_eq!(pixel(&buf, 4, 0), green);
        assert_eq!(pixel(&buf, 3, 4), green);
        assert_eq!(pixel(&buf, 4, 5), [0, 0, 0, 255]);
        assert_eq!(pixel(&buf, 2, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn idle_progress_draws_nothing() {
        let mut buf = RenderBuffer::new(4, 4);
        buf.draw_progress_bar(-1.0, 4, [255, 0, 0, 255]);
        assert!(buf.pixels.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }
}
