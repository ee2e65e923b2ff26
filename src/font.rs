// font.rs — outline text via rustybuzz shaping + ab_glyph rasterisation
//
// Loaded once at startup and borrowed by every Painter. Each weight may have
// its own face; a missing weight renders with Regular. When no face at all
// could be loaded the painter uses the 8×8 bitmap table instead.

use ab_glyph::{Font, FontRef, GlyphId, PxScale};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use crate::config::FontConfig;
use crate::shaper::{self, ShapedGlyph};
use crate::surface::PixelSurface;
use crate::pixelui::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Medium,
    Bold,
}

impl FontWeight {
    fn slot(self) -> usize {
        match self {
            FontWeight::Regular => 0,
            FontWeight::Medium => 1,
            FontWeight::Bold => 2,
        }
    }
}

// Owned font bytes + parsed handles together.
// FontRef/Face borrow from `_bytes`, whose heap allocation never moves or
// shrinks after construction; the 'static references never leave this module.
struct OwnedFont {
    _bytes: Vec<u8>,
    font: FontRef<'static>,
    face: rustybuzz::Face<'static>,
    /// Font units per em.
    upm: f32,
    /// ab_glyph PxScale per em pixel (ascent+|descent| over UPM).
    em_ratio: f32,
}

impl OwnedFont {
    fn new(data: Vec<u8>) -> Result<Self, String> {
        let extended: &'static [u8] = unsafe {
            let slice: &[u8] = &data;
            &*(slice as *const [u8])
        };
        let font =
            FontRef::try_from_slice(extended).map_err(|e| format!("ab_glyph parse error: {e}"))?;
        let face = rustybuzz::Face::from_slice(extended, 0)
            .ok_or_else(|| "rustybuzz: failed to parse font face".to_string())?;

        // ab_glyph PxScale(n) makes ascent+|descent| = n pixels, while a
        // 72-DPI point size makes the em square = n pixels. Convert once.
        let upm = font.units_per_em().unwrap_or(1000.0);
        let height_unscaled = font.ascent_unscaled() - font.descent_unscaled();
        let em_ratio = if upm > 0.0 { height_unscaled / upm } else { 1.0 };

        Ok(Self {
            _bytes: data,
            font,
            face,
            upm,
            em_ratio,
        })
    }

    fn px_scale(&self, size_px: f32) -> PxScale {
        PxScale::from(size_px * self.em_ratio)
    }
}

// Rasterised coverage for one glyph at one integer size.
#[derive(Debug, Clone)]
struct GlyphBitmap {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    coverage: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GlyphKey {
    slot: usize,
    id: u16,
    size_px: u32,
}

pub struct FontSet {
    faces: [Option<OwnedFont>; 3],
    cache: RefCell<HashMap<GlyphKey, Option<GlyphBitmap>>>,
}

impl FontSet {
    /// A font set with no outline faces; all text uses the bitmap table.
    pub fn bitmap_only() -> Self {
        Self {
            faces: [None, None, None],
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Load the configured faces. Never fails: every problem is logged and the
    /// affected weight (or the whole set) degrades.
    pub fn load(cfg: &FontConfig) -> Self {
        let mut set = Self::bitmap_only();

        let regular_path = cfg
            .path
            .clone()
            .or_else(|| crate::util::find_font(&cfg.search));
        let Some(regular_path) = regular_path else {
            tracing::warn!(
                "No outline font (path unset, search {:?} found nothing), using bitmap font",
                cfg.search
            );
            return set;
        };

        set.faces[0] = load_face(&regular_path);
        if set.faces[0].is_none() {
            tracing::warn!("Regular face unusable, using bitmap font");
            return set;
        }
        if let Some(p) = &cfg.medium {
            set.faces[1] = load_face(p);
        }
        if let Some(p) = &cfg.bold {
            set.faces[2] = load_face(p);
        }

        tracing::info!(
            "FontSet faces: regular: ok, medium: {}, bold: {}",
            set.faces[1].is_some(),
            set.faces[2].is_some()
        );
        set
    }

    /// Build from in-memory bytes (regular weight only).
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, String> {
        let mut set = Self::bitmap_only();
        set.faces[0] = Some(OwnedFont::new(data)?);
        Ok(set)
    }

    pub fn has_outline(&self) -> bool {
        self.faces[0].is_some()
    }

    fn face(&self, weight: FontWeight) -> Option<(usize, &OwnedFont)> {
        let slot = weight.slot();
        match &self.faces[slot] {
            Some(f) => Some((slot, f)),
            None => self.faces[0].as_ref().map(|f| (0, f)),
        }
    }

    /// Advance width of `text` in pixels at an em size of `size_px`.
    /// `None` when no outline face is loaded.
    pub fn measure(&self, text: &str, size_px: f32, weight: FontWeight) -> Option<f32> {
        let (_, f) = self.face(weight)?;
        let glyphs = shaper::shape(&f.face, text);
        Some(shaper::advance_units(&glyphs) as f32 * size_px / f.upm)
    }

    /// Draw `text` with its pen starting at physical `x` on baseline `baseline`.
    /// Returns false when no outline face is loaded (nothing drawn).
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        surface: &mut PixelSurface,
        text: &str,
        x: i32,
        baseline: i32,
        size_px: f32,
        weight: FontWeight,
        color: Color,
    ) -> bool {
        let Some((slot, f)) = self.face(weight) else {
            return false;
        };
        if size_px < 1.0 {
            return true;
        }
        let units_to_px = size_px / f.upm;
        let glyphs: Vec<ShapedGlyph> = shaper::shape(&f.face, text);

        let mut pen = 0.0f32;
        for g in glyphs {
            let gx = x.saturating_add((pen + g.x_offset as f32 * units_to_px).round() as i32);
            let gy = baseline.saturating_sub((g.y_offset as f32 * units_to_px).round() as i32);
            pen += g.x_advance as f32 * units_to_px;

            let key = GlyphKey {
                slot,
                id: g.glyph_id,
                size_px: size_px.round() as u32,
            };
            let mut cache = self.cache.borrow_mut();
            let bitmap = cache
                .entry(key)
                .or_insert_with(|| rasterise(f, g.glyph_id, size_px));
            let Some(bm) = bitmap else {
                continue;
            };
            blit_coverage(surface, bm, gx, gy, color);
        }
        true
    }
}

fn load_face(path: &Path) -> Option<OwnedFont> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("Could not read font {}: {e}", path.display());
            return None;
        }
    };
    tracing::info!(
        "Loading font {} ({:.2} MB)",
        path.display(),
        bytes.len() as f64 / 1024.0 / 1024.0
    );
    match OwnedFont::new(bytes) {
        Ok(f) => {
            tracing::info!(
                "font em_scale: UPM={} ratio={:.4}",
                f.upm,
                f.em_ratio
            );
            Some(f)
        }
        Err(e) => {
            tracing::warn!("Font {} rejected: {e}", path.display());
            None
        }
    }
}

fn rasterise(f: &OwnedFont, id: u16, size_px: f32) -> Option<GlyphBitmap> {
    let glyph = GlyphId(id).with_scale_and_position(f.px_scale(size_px), ab_glyph::point(0.0, 0.0));
    let outlined = f.font.outline_glyph(glyph)?;
    let bounds = outlined.px_bounds();
    let width = bounds.width().ceil() as u32;
    let height = bounds.height().ceil() as u32;
    if width == 0 || height == 0 {
        return None;
    }
    let mut coverage = vec![0u8; (width * height) as usize];
    outlined.draw(|px, py, cov| {
        let idx = (py * width + px) as usize;
        if idx < coverage.len() {
            coverage[idx] = (cov.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    });
    Some(GlyphBitmap {
        left: bounds.min.x.floor() as i32,
        top: bounds.min.y.floor() as i32,
        width,
        height,
        coverage,
    })
}

fn blit_coverage(surface: &mut PixelSurface, bm: &GlyphBitmap, x: i32, y: i32, color: Color) {
    for row in 0..bm.height {
        for col in 0..bm.width {
            let cov = bm.coverage[(row * bm.width + col) as usize];
            if cov == 0 {
                continue;
            }
            let a = (color.3 as u32 * cov as u32 / 255) as u8;
            surface.blend(
                x.saturating_add(bm.left).saturating_add(col as i32),
                y.saturating_add(bm.top).saturating_add(row as i32),
                color.with_alpha(a),
            );
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
