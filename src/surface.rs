// surface.rs — owned RGBA frame buffer
//
// One frame worth of straight-alpha RGBA8 pixels. The display backend owns
// it; the painter borrows it mutably for the duration of a draw pass.

use crate::pixelui::Color;

pub struct PixelSurface {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width as usize * 4;
        Self {
            width,
            height,
            stride,
            data: vec![0u8; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn stride(&self) -> usize {
        self.stride
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride + x as usize * 4
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if !self.contains(x, y) {
            return None;
        }
        let i = self.offset(x, y);
        Some(Color(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    /// Opaque overwrite. Out-of-bounds writes are dropped.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, c: Color) {
        if !self.contains(x, y) {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&[c.0, c.1, c.2, c.3]);
    }

    /// Fill the physical rectangle `[x, x+w) × [y, y+h)` clipped to bounds.
    pub fn fill(&mut self, x: i32, y: i32, w: i32, h: i32, c: Color) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let px = [c.0, c.1, c.2, c.3];
        for row in y0..y1 {
            let start = self.offset(x0, row);
            let end = self.offset(x1, row);
            for chunk in self.data[start..end].chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    pub fn clear(&mut self, c: Color) {
        let px = [c.0, c.1, c.2, c.3];
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Porter-Duff "over" of a straight-alpha source onto the pixel at (x, y).
    pub fn blend(&mut self, x: i32, y: i32, src: Color) {
        if !self.contains(x, y) || src.3 == 0 {
            return;
        }
        let i = self.offset(x, y);
        let sa = src.3 as f32 / 255.0;
        let da = self.data[i + 3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| -> u8 {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.clamp(0.0, 255.0) as u8
        };
        self.data[i] = mix(src.0, self.data[i]);
        self.data[i + 1] = mix(src.1, self.data[i + 1]);
        self.data[i + 2] = mix(src.2, self.data[i + 2]);
        self.data[i + 3] = (out_a.clamp(0.0, 1.0) * 255.0) as u8;
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_len_matches_stride() {
        let s = PixelSurface::new(7, 5);
        assert_eq!(s.stride(), 28);
        assert_eq!(s.as_bytes().len(), s.stride() * 5);
    }

    #[test]
    fn fill_is_clipped() {
        let mut s = PixelSurface::new(4, 4);
        s.fill(-2, -2, 4, 4, Color::WHITE);
        assert_eq!(s.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(s.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(s.pixel(2, 2), Some(Color(0, 0, 0, 0)));
        s.fill(3, 3, 100, 100, Color::WHITE);
        assert_eq!(s.pixel(3, 3), Some(Color::WHITE));
    }

    #[test]
    fn opaque_over_replaces() {
        let mut s = PixelSurface::new(1, 1);
        s.clear(Color::BLACK);
        s.blend(0, 0, Color::rgb(10, 20, 30));
        assert_eq!(s.pixel(0, 0), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn half_alpha_over_black() {
        let mut s = PixelSurface::new(1, 1);
        s.clear(Color::BLACK);
        s.blend(0, 0, Color::rgba(255, 255, 255, 128));
        let p = s.pixel(0, 0).unwrap();
        assert!((126..=129).contains(&p.0));
        assert_eq!(p.3, 255);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut s = PixelSurface::new(2, 2);
        s.put(-1, 0, Color::WHITE);
        s.put(2, 0, Color::WHITE);
        s.blend(0, 5, Color::WHITE);
        assert!(s.as_bytes().iter().all(|&b| b == 0));
    }
}
