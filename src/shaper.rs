// shaper.rs — HarfBuzz run shaping via rustybuzz
//
// Pages only ever draw single-line, single-style labels, so one call shapes
// one label. Advances and offsets stay in font units; the caller scales.

use rustybuzz::{Face, GlyphBuffer, UnicodeBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    /// Font glyph index (NOT a Unicode codepoint).
    pub glyph_id: u16,
    pub x_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Shape one label. Empty input yields no glyphs.
pub fn shape(face: &Face<'_>, text: &str) -> Vec<ShapedGlyph> {
    if text.is_empty() {
        return vec![];
    }
    let mut buf = UnicodeBuffer::new();
    buf.push_str(text);
    // Let rustybuzz guess script/direction; mixed CJK/Latin labels are common.
    let output: GlyphBuffer = rustybuzz::shape(face, &[], buf);
    output
        .glyph_infos()
        .iter()
        .zip(output.glyph_positions())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            x_advance: pos.x_advance,
            x_offset: pos.x_offset,
            y_offset: pos.y_offset,
        })
        .collect()
}

/// Sum of advances in font units.
pub fn advance_units(glyphs: &[ShapedGlyph]) -> i32 {
    glyphs.iter().map(|g| g.x_advance).sum()
}
