// pixelui/mod.rs — native pixel-space UI kit for the 480×480 panel.
//
// Everything a page touches lives here: colors, logical rectangles, the
// Painter (rasterizer), the theme palette and the stock widgets.

pub mod bitmap;
pub mod raster;
pub mod theme;
pub mod widgets;

pub use self::layout::Rect;
pub use self::raster::{GradientDir, Painter, LOGICAL_H, LOGICAL_W};
pub use self::style::Color;

// ── Color ─────────────────────────────────────────────────────────────────────

pub mod style {
    /// Straight-alpha RGBA8.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Color(pub u8, pub u8, pub u8, pub u8);

    impl Color {
        pub const BLACK: Self = Self(0, 0, 0, 255);
        pub const WHITE: Self = Self(255, 255, 255, 255);
        pub const TRANSPARENT: Self = Self(0, 0, 0, 0);

        pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
            Self(r, g, b, 255)
        }
        pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
            Self(r, g, b, a)
        }
        pub const fn with_alpha(self, a: u8) -> Self {
            Self(self.0, self.1, self.2, a)
        }

        /// Linear interpolation per channel, truncated.
        pub fn lerp(self, other: Self, t: f64) -> Self {
            let t = t.clamp(0.0, 1.0);
            let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t) as u8;
            Self(
                mix(self.0, other.0),
                mix(self.1, other.1),
                mix(self.2, other.2),
                mix(self.3, other.3),
            )
        }

        /// Parse `#RRGGBB` or `#RRGGBBAA`.
        pub fn from_hex(s: &str) -> Option<Self> {
            crate::util::hex_rgba(s).map(|[r, g, b, a]| Self(r, g, b, a))
        }
    }

    impl Default for Color {
        fn default() -> Self {
            Self::TRANSPARENT
        }
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

pub mod layout {
    /// Rectangle in logical (480×480) coordinates.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Rect {
        pub x: i32,
        pub y: i32,
        pub w: i32,
        pub h: i32,
    }

    impl Rect {
        pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
            Self { x, y, w, h }
        }
        pub fn right(&self) -> i32 {
            self.x + self.w
        }
        pub fn bottom(&self) -> i32 {
            self.y + self.h
        }
        pub fn is_empty(&self) -> bool {
            self.w <= 0 || self.h <= 0
        }
        /// Edges included on all four sides.
        pub fn contains(&self, x: i32, y: i32) -> bool {
            x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
        }
        /// Edges excluded on all four sides.
        pub fn contains_strict(&self, x: i32, y: i32) -> bool {
            x > self.x && x < self.right() && y > self.y && y < self.bottom()
        }
        pub fn inner(&self, px: i32) -> Self {
            Self {
                x: self.x + px,
                y: self.y + px,
                w: (self.w - px * 2).max(0),
                h: (self.h - px * 2).max(0),
            }
        }
        pub fn center(&self) -> (i32, i32) {
            (self.x + self.w / 2, self.y + self.h / 2)
        }
    }
}

/// Top coordinate that vertically centers text of `size` inside `[y, y+h)`.
pub fn text_top_for_center(y: i32, h: i32, size: f32) -> i32 {
    y.saturating_add(h.saturating_sub(size as i32) / 2)
}
