//! Bitmap glyphs for raster output.
//!
//! Uses the Spleen bitmap font family. Every face has a 1:2 cell, matching
//! the fixed-pitch metrics the layout measures with, so a glyph scaled into
//! its cell lands exactly where layout put it.

use std::collections::HashMap;

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

/// Source face, chosen by target cell height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Face {
    Small,
    Medium,
    Large,
}

impl Face {
    fn for_height(height: u32) -> Face {
        match height {
            0..=14 => Face::Small,
            15..=20 => Face::Medium,
            _ => Face::Large,
        }
    }

    fn dimensions(self) -> (usize, usize) {
        match self {
            Face::Small => (6, 12),
            Face::Medium => (8, 16),
            Face::Large => (12, 24),
        }
    }

    fn data(self) -> &'static [u8] {
        match self {
            Face::Small => FONT_6X12,
            Face::Medium => FONT_8X16,
            Face::Large => FONT_12X24,
        }
    }
}

/// A glyph scaled to a cell: row-major coverage, `width × height`.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<bool>,
}

impl Glyph {
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }
}

/// Glyphs cached per character and cell size.
#[derive(Default)]
pub struct GlyphCache {
    glyphs: HashMap<(char, u32, u32), Glyph>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyph for `ch` scaled into a `width × height` cell.
    pub fn glyph(&mut self, ch: char, width: u32, height: u32) -> &Glyph {
        let key = (ch, width.max(1), height.max(1));
        if !self.glyphs.contains_key(&key) {
            let glyph = self.build(ch, key.1, key.2);
            self.glyphs.insert(key, glyph);
        }
        &self.glyphs[&key]
    }

    fn build(&self, ch: char, width: u32, height: u32) -> Glyph {
        let face = Face::for_height(height);
        let (src_w, src_h) = face.dimensions();

        let mut source = vec![false; src_w * src_h];
        let mut found = false;
        if let Ok(mut font) = PSF2Font::new(face.data()) {
            let utf8 = ch.to_string();
            if let Some(rows) = font.glyph_for_utf8(utf8.as_bytes()) {
                found = true;
                for (row_y, row) in rows.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < src_h && col_x < src_w {
                            source[row_y * src_w + col_x] = on;
                        }
                    }
                }
            }
        }

        if !found && !ch.is_whitespace() {
            draw_box(&mut source, src_w, src_h);
        }

        Glyph {
            width,
            height,
            bits: scale_bitmap(&source, src_w, src_h, width as usize, height as usize),
        }
    }
}

/// Nearest-neighbor scale.
fn scale_bitmap(src: &[bool], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<bool> {
    let mut dst = vec![false; dst_w * dst_h];
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            let sy = dy * src_h / dst_h;
            dst[dy * dst_w + dx] = src[sy * src_w + sx];
        }
    }
    dst
}

/// Outline box for characters the font lacks.
fn draw_box(glyph: &mut [bool], width: usize, height: usize) {
    let (x0, x1) = (1, width - 2);
    let (y0, y1) = (height / 4, height - 2);
    for x in x0..=x1 {
        glyph[y0 * width + x] = true;
        glyph[y1 * width + x] = true;
    }
    for y in y0..=y1 {
        glyph[y * width + x0] = true;
        glyph[y * width + x1] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_follows_height() {
        assert_eq!(Face::for_height(6), Face::Small);
        assert_eq!(Face::for_height(16), Face::Medium);
        assert_eq!(Face::for_height(48), Face::Large);
    }

    #[test]
    fn glyph_fills_requested_cell() {
        let mut cache = GlyphCache::new();
        let g = cache.glyph('A', 7, 14);
        assert_eq!((g.width, g.height), (7, 14));
        assert_eq!(g.bits.len(), 98);
        assert!(g.bits.iter().any(|b| *b));
    }

    #[test]
    fn space_is_blank() {
        let mut cache = GlyphCache::new();
        assert!(!cache.glyph(' ', 6, 12).bits.iter().any(|b| *b));
    }

    #[test]
    fn zero_cell_is_clamped() {
        let mut cache = GlyphCache::new();
        let g = cache.glyph('x', 0, 0);
        assert_eq!((g.width, g.height), (1, 1));
    }

    #[test]
    fn scale_bitmap_doubles() {
        let src = [true, false, false, true];
        let dst = scale_bitmap(&src, 2, 2, 4, 4);
        assert!(dst[0] && dst[1] && dst[4] && dst[5]);
        assert!(!dst[2] && !dst[3]);
        assert!(dst[15]);
    }

    #[test]
    fn box_outline_marks_edges() {
        let mut g = vec![false; 6 * 12];
        draw_box(&mut g, 6, 12);
        assert!(g[3 * 6 + 1]);
        assert!(!g[6 * 6 + 3]);
    }
}
