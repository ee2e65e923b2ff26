// pixelui/raster.rs — software rasterizer over a PixelSurface
//
// Pages draw in the fixed 480×480 logical grid; the Painter scales every
// coordinate to the physical surface (round(v * scale)) and clips every
// write. Nothing here returns an error or panics on out-of-range input.
//
// Blending: only the anti-aliased shapes, glyph coverage and `overlay`
// composite against the destination. Everything else overwrites.

use super::bitmap;
use super::{Color, Rect};
use crate::font::{FontSet, FontWeight};
use crate::surface::PixelSurface;

pub const LOGICAL_W: i32 = 480;
pub const LOGICAL_H: i32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDir {
    Vertical,
    Horizontal,
}

pub struct Painter<'a> {
    surface: &'a mut PixelSurface,
    fonts: &'a FontSet,
    scale_x: f64,
    scale_y: f64,
}

impl<'a> Painter<'a> {
    pub fn new(surface: &'a mut PixelSurface, fonts: &'a FontSet) -> Self {
        let mut scale_x = surface.width() as f64 / LOGICAL_W as f64;
        let mut scale_y = surface.height() as f64 / LOGICAL_H as f64;
        if scale_x <= 0.0 {
            scale_x = 1.0;
        }
        if scale_y <= 0.0 {
            scale_y = 1.0;
        }
        Self {
            surface,
            fonts,
            scale_x,
            scale_y,
        }
    }

    pub fn surface(&self) -> &PixelSurface {
        self.surface
    }

    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// False when text falls back to the 8×8 bitmap table (ASCII only).
    pub fn has_outline(&self) -> bool {
        self.fonts.has_outline()
    }

    // ── scaling ───────────────────────────────────────────────────────────────

    #[inline]
    fn sx(&self, v: i32) -> i32 {
        (v as f64 * self.scale_x).round() as i32
    }
    #[inline]
    fn sy(&self, v: i32) -> i32 {
        (v as f64 * self.scale_y).round() as i32
    }
    /// Radii and stroke widths use the mean scale so circles stay round.
    #[inline]
    fn sr(&self, v: i32) -> i32 {
        (v as f64 * (self.scale_x + self.scale_y) * 0.5).round() as i32
    }

    // ── rectangles ────────────────────────────────────────────────────────────

    pub fn clear(&mut self, c: Color) {
        self.surface.clear(c);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Color) {
        let (px, py, pw, ph) = (self.sx(x), self.sy(y), self.sx(w), self.sy(h));
        self.surface.fill(px, py, pw, ph, c);
    }

    pub fn fill(&mut self, r: Rect, c: Color) {
        self.fill_rect(r.x, r.y, r.w, r.h, c);
    }

    /// Translucent wash over a rectangle (dialog backdrops).
    pub fn overlay(&mut self, r: Rect, c: Color) {
        let (x, y) = (self.sx(r.x) as i64, self.sy(r.y) as i64);
        let (w, h) = (self.sx(r.w) as i64, self.sy(r.h) as i64);
        let (x0, x1) = self.clip_cols(x, x + w - 1);
        let (y0, y1) = self.clip_rows(y, y + h - 1);
        for py in y0..=y1 {
            for px in x0..=x1 {
                self.surface.blend(px, py, c);
            }
        }
    }

    pub fn rounded_rect(&mut self, x: i32, y: i32, w: i32, h: i32, radius: i32, c: Color) {
        let (x, y) = (self.sx(x) as i64, self.sy(y) as i64);
        let (w, h) = (self.sx(w) as i64, self.sy(h) as i64);
        if w <= 0 || h <= 0 {
            return;
        }
        let r = (self.sr(radius) as i64).clamp(0, w.min(h) / 2);

        self.fill_px(x + r, y, w - 2 * r, h, c);
        self.fill_px(x, y + r, w, h - 2 * r, c);
        if r == 0 {
            return;
        }
        self.quarter_disc(x + r, y + r, r, c, Quadrant::TopLeft);
        self.quarter_disc(x + w - r, y + r, r, c, Quadrant::TopRight);
        self.quarter_disc(x + r, y + h - r, r, c, Quadrant::BottomLeft);
        self.quarter_disc(x + w - r, y + h - r, r, c, Quadrant::BottomRight);
    }

    fn quarter_disc(&mut self, cx: i64, cy: i64, r: i64, c: Color, q: Quadrant) {
        let ((ax, bx), (ay, by)) = match q {
            Quadrant::TopLeft => ((cx - r, cx), (cy - r, cy)),
            Quadrant::TopRight => ((cx, cx + r), (cy - r, cy)),
            Quadrant::BottomLeft => ((cx - r, cx), (cy, cy + r)),
            Quadrant::BottomRight => ((cx, cx + r), (cy, cy + r)),
        };
        let (x0, x1) = self.clip_cols(ax, bx);
        let (y0, y1) = self.clip_rows(ay, by);
        for y in y0..=y1 {
            let dy = y as i64 - cy;
            for x in x0..=x1 {
                if dist2(x as i64 - cx, dy) <= r * r {
                    self.surface.put(x, y, c);
                }
            }
        }
    }

    /// Physical fill with i64 extents, clipped before it reaches the surface.
    fn fill_px(&mut self, x: i64, y: i64, w: i64, h: i64, c: Color) {
        let (x0, x1) = self.clip_cols(x, x + w - 1);
        let (y0, y1) = self.clip_rows(y, y + h - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        self.surface.fill(x0, y0, x1 - x0 + 1, y1 - y0 + 1, c);
    }

    // ── lines ─────────────────────────────────────────────────────────────────

    /// Integer Bresenham between scaled endpoints, both inclusive. The
    /// segment is clipped to the surface first, so only visible pixels are
    /// stepped.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: Color) {
        let a = (self.sx(x0) as f64, self.sy(y0) as f64);
        let b = (self.sx(x1) as f64, self.sy(y1) as f64);
        let max_x = self.surface.width() as f64 - 1.0;
        let max_y = self.surface.height() as f64 - 1.0;
        let Some(((mut x0, mut y0), (x1, y1))) = clip_segment(a, b, max_x, max_y) else {
            return;
        };

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let step_x = if x0 < x1 { 1 } else { -1 };
        let step_y = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.surface.put(x0 as i32, y0 as i32, c);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = err * 2;
            if e2 > -dy {
                err -= dy;
                x0 += step_x;
            }
            if e2 < dx {
                err += dx;
                y0 += step_y;
            }
        }
    }

    // ── circles ───────────────────────────────────────────────────────────────

    /// Solid disc, squared-distance test, no anti-aliasing.
    pub fn circle(&mut self, cx: i32, cy: i32, r: i32, c: Color) {
        let (cx, cy, r) = (self.sx(cx) as i64, self.sy(cy) as i64, self.sr(r) as i64);
        if r < 0 {
            return;
        }
        let (y0, y1) = self.clip_rows(cy - r, cy + r);
        let (x0, x1) = self.clip_cols(cx - r, cx + r);
        for y in y0..=y1 {
            let dy = y as i64 - cy;
            for x in x0..=x1 {
                if dist2(x as i64 - cx, dy) <= r * r {
                    self.surface.put(x, y, c);
                }
            }
        }
    }

    /// Anti-aliased disc. Full coverage inside `r - 0.5`, nothing beyond
    /// `r + 0.5`, linear coverage `r + 0.5 - d` in between.
    pub fn circle_aa(&mut self, cx: i32, cy: i32, r: i32, c: Color) {
        let (cx, cy, r) = (self.sx(cx) as i64, self.sy(cy) as i64, self.sr(r) as i64);
        if r <= 0 {
            return;
        }
        let rr = r as f64;
        let inner = rr - 0.5;
        let outer = rr + 0.5;
        let inner2 = inner * inner;
        let outer2 = outer * outer;

        let (y0, y1) = self.clip_rows(cy - r - 1, cy + r + 1);
        let (x0, x1) = self.clip_cols(cx - r - 1, cx + r + 1);
        for y in y0..=y1 {
            let dy = (y as i64 - cy) as f64;
            for x in x0..=x1 {
                let dx = (x as i64 - cx) as f64;
                let d2 = dx * dx + dy * dy;
                if d2 <= inner2 {
                    self.surface.blend(x, y, c);
                    continue;
                }
                if d2 >= outer2 {
                    continue;
                }
                let cover = (outer - d2.sqrt()).clamp(0.0, 1.0);
                if cover <= 0.0 {
                    continue;
                }
                self.surface
                    .blend(x, y, c.with_alpha((c.3 as f64 * cover) as u8));
            }
        }
    }

    /// Anti-aliased ellipse. `d = sqrt((dx/rx)² + (dy/ry)²) - 1`: full inside
    /// `d <= -0.5`, skipped at `d >= 0.5`, coverage `0.5 - d` in between.
    pub fn ellipse_aa(&mut self, cx: i32, cy: i32, rx: i32, ry: i32, c: Color) {
        let (cx, cy) = (self.sx(cx) as i64, self.sy(cy) as i64);
        let (rx, ry) = (self.sx(rx) as i64, self.sy(ry) as i64);
        if rx <= 0 || ry <= 0 {
            return;
        }
        let (frx, fry) = (rx as f64, ry as f64);

        let (y0, y1) = self.clip_rows(cy - ry - 2, cy + ry + 2);
        let (x0, x1) = self.clip_cols(cx - rx - 2, cx + rx + 2);
        for y in y0..=y1 {
            let ny = (y as i64 - cy) as f64 / fry;
            for x in x0..=x1 {
                let nx = (x as i64 - cx) as f64 / frx;
                let v = nx * nx + ny * ny;
                let d = v.sqrt() - 1.0;
                if d <= -0.5 {
                    self.surface.blend(x, y, c);
                    continue;
                }
                if d >= 0.5 {
                    continue;
                }
                let cover = (0.5 - d).clamp(0.0, 1.0);
                if cover <= 0.0 {
                    continue;
                }
                self.surface
                    .blend(x, y, c.with_alpha((c.3 as f64 * cover) as u8));
            }
        }
    }

    /// Inclusive physical row range clipped to the surface; empty when
    /// `first > last`.
    #[inline]
    fn clip_rows(&self, y0: i64, y1: i64) -> (i32, i32) {
        clip_span(y0, y1, self.surface.height())
    }
    #[inline]
    fn clip_cols(&self, x0: i64, x1: i64) -> (i32, i32) {
        clip_span(x0, x1, self.surface.width())
    }

    // ── gradient ──────────────────────────────────────────────────────────────

    /// Multi-stop linear gradient. `t` runs from 0 at the first physical
    /// row/column to `(n-1)/n` at the last; fewer than two stops is a no-op.
    /// Only the visible rows/columns are computed.
    pub fn gradient(&mut self, x: i32, y: i32, w: i32, h: i32, stops: &[Color], dir: GradientDir) {
        if stops.len() < 2 {
            return;
        }
        let (x, y) = (self.sx(x) as i64, self.sy(y) as i64);
        let (w, h) = (self.sx(w) as i64, self.sy(h) as i64);
        if w <= 0 || h <= 0 {
            return;
        }
        let segments = stops.len() - 1;
        let color_at = |pos: i64, span: i64| -> Color {
            let t = pos as f64 / span as f64;
            let seg = t * segments as f64;
            let idx = (seg as usize).min(segments - 1);
            stops[idx].lerp(stops[idx + 1], seg - idx as f64)
        };

        match dir {
            GradientDir::Vertical => {
                let (r0, r1) = self.clip_rows(y, y + h - 1);
                for row in r0..=r1 {
                    let c = color_at(row as i64 - y, h);
                    self.fill_px(x, row as i64, w, 1, c);
                }
            }
            GradientDir::Horizontal => {
                let (c0, c1) = self.clip_cols(x, x + w - 1);
                for col in c0..=c1 {
                    let c = color_at(col as i64 - x, w);
                    self.fill_px(col as i64, y, 1, h, c);
                }
            }
        }
    }

    // ── text ──────────────────────────────────────────────────────────────────

    /// Draw `text` with its top at logical `y`. The baseline sits `size`
    /// below the top; the pixel size is `size × scaleX` at 72 DPI.
    pub fn text(&mut self, text: &str, x: i32, y: i32, c: Color, size: f32, weight: FontWeight) {
        if text.is_empty() {
            return;
        }
        let size_px = ((size as f64) * self.scale_x).max(1.0);
        let px = (x as f64 * self.scale_x).round() as i32;
        let baseline = (y as f64 * self.scale_y + size_px).round() as i32;
        if self
            .fonts
            .draw(self.surface, text, px, baseline, size_px as f32, weight, c)
        {
            return;
        }
        self.bitmap_text(text, x, y, c, size);
    }

    /// Horizontally and vertically center `text` inside `r`.
    pub fn text_centered(&mut self, text: &str, r: Rect, c: Color, size: f32, weight: FontWeight) {
        let tw = self.measure_text(text, size, weight);
        let top = super::text_top_for_center(r.y, r.h, size);
        let x = r.x.saturating_add(r.w.saturating_sub(tw) / 2);
        self.text(text, x, top, c, size, weight);
    }

    /// Advance width in logical pixels.
    pub fn measure_text(&self, text: &str, size: f32, weight: FontWeight) -> i32 {
        measure_text(self.fonts, text, size, weight)
    }

    /// Advance width in physical pixels.
    pub fn measure_text_px(&self, text: &str, size: f32, weight: FontWeight) -> i32 {
        (self.measure_text(text, size, weight) as f64 * self.scale_x).round() as i32
    }

    fn bitmap_text(&mut self, text: &str, x: i32, y: i32, c: Color, size: f32) {
        let adv = bitmap::advance(size) as f64 * self.scale_x;
        let cell_w = adv / 8.0;
        let cell_h = size as f64 * self.scale_y / 8.0;
        let ox = x as f64 * self.scale_x;
        let oy = y as f64 * self.scale_y;

        for (i, ch) in text.chars().enumerate() {
            let rows = bitmap::glyph(ch);
            let gx = ox + i as f64 * adv;
            for row in 0..8u32 {
                let ya = (oy + row as f64 * cell_h).round() as i32;
                let yb = (oy + (row + 1) as f64 * cell_h).round() as i32;
                for col in 0..8u32 {
                    if !bitmap::bit(rows, col, row) {
                        continue;
                    }
                    let xa = (gx + col as f64 * cell_w).round() as i32;
                    let xb = (gx + (col + 1) as f64 * cell_w).round() as i32;
                    self.surface
                        .fill(xa, ya, xb.saturating_sub(xa).max(1), yb.saturating_sub(ya).max(1), c);
                }
            }
        }
    }
}

/// Logical advance width of `text`; usable without a surface (layout code).
pub fn measure_text(fonts: &FontSet, text: &str, size: f32, weight: FontWeight) -> i32 {
    match fonts.measure(text, size, weight) {
        Some(w) => w.round() as i32,
        None => bitmap::measure(text, size).round() as i32,
    }
}

/// Clamp an inclusive span to `[0, len)`. Disjoint spans come back with
/// `first > last`, so `first..=last` iterates nothing.
fn clip_span(a: i64, b: i64, len: u32) -> (i32, i32) {
    let len = len as i64;
    (a.clamp(0, len) as i32, b.clamp(-1, len - 1) as i32)
}

/// Squared distance; saturates instead of wrapping for far-off centres.
#[inline]
fn dist2(dx: i64, dy: i64) -> i64 {
    dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
}

/// Liang-Barsky clip of `a → b` to `[0, max_x] × [0, max_y]`, endpoints
/// rounded back onto the pixel grid.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    max_x: f64,
    max_y: f64,
) -> Option<((i64, i64), (i64, i64))> {
    if max_x < 0.0 || max_y < 0.0 {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    let at = |t: f64| {
        (
            (a.0 + t * dx).round().clamp(0.0, max_x) as i64,
            (a.1 + t * dy).round().clamp(0.0, max_y) as i64,
        )
    };
    Some((at(t0), at(t1)))
}

#[derive(Clone, Copy)]
enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    fn black(w: u32, h: u32) -> PixelSurface {
        let mut s = PixelSurface::new(w, h);
        s.clear(Color::BLACK);
        s
    }

    fn changed(s: &PixelSurface) -> Vec<(i32, i32)> {
        let mut out = vec![];
        for y in 0..s.height() as i32 {
            for x in 0..s.width() as i32 {
                if s.pixel(x, y) != Some(Color::BLACK) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    fn expected_rect(x: i32, y: i32, w: i32, h: i32, sx: f64, sy: f64, sw: i32, sh: i32) -> Vec<(i32, i32)> {
        let r = |v: i32, s: f64| (v as f64 * s).round() as i32;
        let (x0, y0) = (r(x, sx), r(y, sy));
        let (x1, y1) = (x0 + r(w, sx), y0 + r(h, sy));
        let mut out = vec![];
        for py in y0.max(0)..y1.min(sh) {
            for px in x0.max(0)..x1.min(sw) {
                out.push((px, py));
            }
        }
        out
    }

    #[test]
    fn fill_rect_exact_at_unit_scale() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).fill_rect(10, 20, 30, 5, RED);
        assert_eq!(changed(&s), expected_rect(10, 20, 30, 5, 1.0, 1.0, 480, 480));
    }

    #[test]
    fn fill_rect_exact_when_scaled() {
        let fonts = FontSet::bitmap_only();
        for &(pw, ph) in &[(720u32, 720u32), (320, 240), (800, 480)] {
            for &(x, y, w, h) in &[(0, 0, 7, 3), (13, 477, 9, 9), (470, 5, 30, 11), (-5, -5, 12, 12)] {
                let mut s = black(pw, ph);
                Painter::new(&mut s, &fonts).fill_rect(x, y, w, h, RED);
                let sx = pw as f64 / 480.0;
                let sy = ph as f64 / 480.0;
                assert_eq!(
                    changed(&s),
                    expected_rect(x, y, w, h, sx, sy, pw as i32, ph as i32),
                    "surface {pw}x{ph} rect {x},{y},{w},{h}"
                );
            }
        }
    }

    #[test]
    fn circle_aa_center_full_and_far_pixel_untouched() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).circle_aa(100, 100, 10, Color::WHITE);
        assert_eq!(s.pixel(100, 100), Some(Color::WHITE));
        // r + 1.5 along each axis is outside the blend band.
        assert_eq!(s.pixel(100 + 12, 100), Some(Color::BLACK));
        assert_eq!(s.pixel(100, 100 - 12), Some(Color::BLACK));
    }

    #[test]
    fn circle_aa_band_decreases_with_distance() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).circle_aa(100, 100, 10, Color::WHITE);
        // distances 10.0, 10.05, 10.20, 10.44, all inside the ±0.5 band
        let samples: Vec<u8> = [0, 1, 2, 3]
            .iter()
            .map(|&dy| s.pixel(110, 100 + dy).map(|c| c.0).unwrap_or(0))
            .collect();
        for w in samples.windows(2) {
            assert!(w[0] > w[1], "coverage not decreasing: {samples:?}");
        }
        assert!(samples[0] > 0 && samples[0] < 255);
    }

    #[test]
    fn ellipse_aa_center_and_outside() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).ellipse_aa(200, 200, 20, 6, Color::WHITE);
        assert_eq!(s.pixel(200, 200), Some(Color::WHITE));
        assert_eq!(s.pixel(200, 200 + 9), Some(Color::BLACK));
        assert_eq!(s.pixel(200 + 30, 200), Some(Color::BLACK));
    }

    #[test]
    fn gradient_midpoint_is_channel_mean() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        let a = Color::rgb(10, 200, 31);
        let b = Color::rgb(250, 0, 100);
        Painter::new(&mut s, &fonts).gradient(0, 0, 20, 100, &[a, b], GradientDir::Vertical);
        let mid = s.pixel(5, 50).unwrap();
        assert_eq!(mid, Color(130, 100, 65, 255));
        assert_eq!(s.pixel(5, 0), Some(a));
    }

    #[test]
    fn gradient_single_stop_is_noop() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).gradient(0, 0, 50, 50, &[RED], GradientDir::Horizontal);
        assert!(changed(&s).is_empty());
    }

    #[test]
    fn line_endpoints_inclusive() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).line(5, 5, 15, 10, RED);
        assert_eq!(s.pixel(5, 5), Some(RED));
        assert_eq!(s.pixel(15, 10), Some(RED));
        // one pixel per major-axis step
        assert_eq!(changed(&s).len(), 11);
    }

    #[test]
    fn rounded_rect_corner_left_clear() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).rounded_rect(100, 100, 100, 50, 20, RED);
        assert_eq!(s.pixel(100, 100), Some(Color::BLACK));
        assert_eq!(s.pixel(150, 125), Some(RED));
        assert_eq!(s.pixel(150, 100), Some(RED));
        assert_eq!(s.pixel(199, 149), Some(Color::BLACK));
    }

    #[test]
    fn circle_is_solid_and_clipped() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        let mut p = Painter::new(&mut s, &fonts);
        p.circle(0, 0, 5, RED);
        p.circle(10_000, 10_000, 5, RED);
        assert_eq!(s.pixel(0, 0), Some(RED));
        assert_eq!(s.pixel(3, 3), Some(RED));
        assert_eq!(s.pixel(4, 4), Some(Color::BLACK));
    }

    #[test]
    fn bitmap_text_draws_and_measures() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        let mut p = Painter::new(&mut s, &fonts);
        assert_eq!(p.measure_text("ab", 20.0, FontWeight::Regular), 24);
        p.text("H", 0, 0, RED, 16.0, FontWeight::Regular);
        assert!(!changed(&s).is_empty());
        assert!(changed(&s).iter().all(|&(x, y)| x < 10 && y < 16));
    }

    #[test]
    fn overlay_blends() {
        let fonts = FontSet::bitmap_only();
        let mut s = PixelSurface::new(480, 480);
        s.clear(Color::WHITE);
        Painter::new(&mut s, &fonts).overlay(Rect::new(0, 0, 10, 10), Color::rgba(0, 0, 0, 128));
        let p = s.pixel(5, 5).unwrap();
        assert!(p.0 > 100 && p.0 < 140);
        assert_eq!(s.pixel(20, 20), Some(Color::WHITE));
    }

    #[test]
    fn extreme_arguments_clip_without_panicking() {
        let fonts = FontSet::bitmap_only();
        let (max, min) = (i32::MAX, i32::MIN);
        for &(pw, ph) in &[(480u32, 480u32), (800, 480), (240, 240)] {
            let mut s = black(pw, ph);
            let mut p = Painter::new(&mut s, &fonts);
            p.circle(240, 240, 50_000, RED);
            p.circle(min, max, max, RED);
            p.rounded_rect(0, 0, 200_000, 200_000, 100_000, RED);
            p.rounded_rect(max - 10, 0, 100, 100, 10, RED);
            p.rounded_rect(min, min, max, max, max, RED);
            p.line(0, 0, max, 0, RED);
            p.line(min, min, max, max, RED);
            p.line(max, 5, max - 1, 5, RED);
            p.overlay(Rect::new(max - 5, 0, 100, 10), RED);
            p.overlay(Rect::new(min, min, max, max), RED);
            p.circle_aa(min + 2, 0, 10, RED);
            p.circle_aa(240, 240, max, RED);
            p.ellipse_aa(min, max, max, max, RED);
            p.ellipse_aa(max, min, 10, 10, RED);
            p.gradient(min, min, max, max, &[RED, Color::WHITE], GradientDir::Vertical);
            p.gradient(max - 1, 0, max, 10, &[RED, Color::WHITE], GradientDir::Horizontal);
            p.fill_rect(min, min, max, max, RED);
            p.text("far", max, max, RED, 16.0, FontWeight::Regular);
            p.text_centered("far", Rect::new(max, max, max, max), RED, 16.0, FontWeight::Regular);
        }
    }

    #[test]
    fn huge_circle_covers_whole_surface() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).circle(240, 240, 50_000, RED);
        assert_eq!(changed(&s).len(), 480 * 480);
    }

    #[test]
    fn line_crossing_the_edge_is_clipped() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).line(-100, 10, 1_000_000, 10, RED);
        let px = changed(&s);
        assert_eq!(px.len(), 480);
        assert!(px.iter().all(|&(_, y)| y == 10));

        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).line(-50, -50, -10, 600, RED);
        assert!(changed(&s).is_empty());
    }

    #[test]
    fn line_fully_inside_is_unchanged_by_clipping() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).line(0, 479, 479, 0, RED);
        assert_eq!(s.pixel(0, 479), Some(RED));
        assert_eq!(s.pixel(479, 0), Some(RED));
        assert_eq!(changed(&s).len(), 480);
    }

    #[test]
    fn rounded_rect_past_the_right_edge_fills_visible_part() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).rounded_rect(460, 100, 100, 40, 10, RED);
        assert_eq!(s.pixel(479, 120), Some(RED));
        assert_eq!(s.pixel(460, 100), Some(Color::BLACK));
        // the bottom corner discs reach one row past the rect, like the top ones
        assert!(changed(&s).iter().all(|&(x, y)| x >= 460 && (100..=140).contains(&y)));
    }

    #[test]
    fn overlay_clips_at_edges() {
        let fonts = FontSet::bitmap_only();
        let mut s = PixelSurface::new(480, 480);
        s.clear(Color::WHITE);
        Painter::new(&mut s, &fonts).overlay(Rect::new(-10, 470, 30, 30), Color::rgba(0, 0, 0, 128));
        assert_ne!(s.pixel(0, 479), Some(Color::WHITE));
        assert_ne!(s.pixel(19, 470), Some(Color::WHITE));
        assert_eq!(s.pixel(20, 470), Some(Color::WHITE));
        assert_eq!(s.pixel(0, 469), Some(Color::WHITE));
    }

    #[test]
    fn circle_aa_at_corner_draws_visible_quarter() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).circle_aa(479, 479, 10, Color::WHITE);
        assert_eq!(s.pixel(479, 479), Some(Color::WHITE));
        assert_eq!(s.pixel(470, 479), Some(Color::WHITE));
        assert!(changed(&s).iter().all(|&(x, y)| x >= 467 && y >= 467));
    }

    #[test]
    fn circle_aa_radius_uses_mean_scale() {
        let fonts = FontSet::bitmap_only();
        // 800x480: scale (5/3, 1), mean 4/3, so r = 30 becomes 40 px.
        let mut s = black(800, 480);
        Painter::new(&mut s, &fonts).circle_aa(240, 240, 30, Color::WHITE);
        assert_eq!(s.pixel(400, 240), Some(Color::WHITE));
        assert_eq!(s.pixel(400 + 39, 240), Some(Color::WHITE));
        assert_eq!(s.pixel(400 + 42, 240), Some(Color::BLACK));
        assert_eq!(s.pixel(400, 240 + 39), Some(Color::WHITE));
        assert_eq!(s.pixel(400, 240 + 42), Some(Color::BLACK));
    }

    #[test]
    fn ellipse_aa_clips_at_edge() {
        let fonts = FontSet::bitmap_only();
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).ellipse_aa(0, 240, 40, 10, Color::WHITE);
        assert_eq!(s.pixel(0, 240), Some(Color::WHITE));
        assert_eq!(s.pixel(15, 240), Some(Color::WHITE));
        assert!(changed(&s).iter().all(|&(x, y)| x <= 42 && (228..=252).contains(&y)));
    }

    #[test]
    fn gradient_starting_above_surface_keeps_its_phase() {
        let fonts = FontSet::bitmap_only();
        let a = Color::rgb(10, 200, 31);
        let b = Color::rgb(250, 0, 100);
        let mut s = black(480, 480);
        Painter::new(&mut s, &fonts).gradient(0, -50, 20, 100, &[a, b], GradientDir::Vertical);
        // row 0 on screen is row 50 of the gradient
        assert_eq!(s.pixel(5, 0), Some(Color(130, 100, 65, 255)));
        assert_eq!(s.pixel(5, 50), Some(Color::BLACK));
        assert_eq!(s.pixel(25, 10), Some(Color::BLACK));
    }
}
