//! # Raster Output
//!
//! Paints a [`RenderedDocument`] into an RGBA buffer. Preview, thumbnail
//! and export capture all go through [`paint`]; only the scale differs.
//!
//! ```text
//! layout units (CSS px) × scale → device pixels
//!   preview    1.0   794 px wide
//!   thumbnail  0.25  199 px wide
//!   export     2.0   1588 px wide (oversampled)
//! ```

pub mod color;
pub mod font;

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::layout::text::ADVANCE_RATIO;
use crate::layout::{Align, NodeKind, Rect, RenderedDocument, Weight};
use color::{WHITE, parse_color};
use font::GlyphCache;

/// Decoded images keyed by their reference string. A missing entry paints
/// nothing.
pub type AssetMap = HashMap<String, Arc<RgbaImage>>;

/// Preview output size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSize {
    #[default]
    Full,
    Thumbnail,
}

impl PreviewSize {
    pub fn scale(self) -> f32 {
        match self {
            PreviewSize::Full => 1.0,
            PreviewSize::Thumbnail => 0.25,
        }
    }
}

// ============================================================================
// PAINTER
// ============================================================================

/// Drawing surface addressed in layout units.
pub struct Painter {
    canvas: RgbaImage,
    scale: f32,
    glyphs: GlyphCache,
}

impl Painter {
    pub fn new(width: u32, height: u32, scale: f32, background: Rgba<u8>) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width.max(1), height.max(1), background),
            scale,
            glyphs: GlyphCache::new(),
        }
    }

    /// Continue drawing on an existing raster.
    pub fn from_image(canvas: RgbaImage, scale: f32) -> Self {
        Self {
            canvas,
            scale,
            glyphs: GlyphCache::new(),
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Canvas width in device pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Canvas height in device pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    fn px(&self, v: f32) -> i64 {
        (v * self.scale).round() as i64
    }

    /// Source-over blend of one device pixel. Out-of-bounds writes are ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= self.canvas.width() as i64 || y >= self.canvas.height() as i64 {
            return;
        }
        let dst = self.canvas.get_pixel_mut(x as u32, y as u32);
        *dst = source_over(*dst, color);
    }

    /// Fill device pixels `[x0, x1) × [y0, y1)`.
    pub fn fill_px(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
        if color.0[3] == 0 {
            return;
        }
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.canvas.width() as i64);
        let y1 = y1.min(self.canvas.height() as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color);
            }
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (x0, y0) = (self.px(rect.x), self.px(rect.y));
        let (x1, y1) = (self.px(rect.right()), self.px(rect.bottom()));
        self.fill_px(x0, y0, x1, y1, color);
    }

    /// Like [`fill_rect`](Self::fill_rect), but never thinner than one pixel.
    pub fn fill_line(&mut self, rect: Rect, color: Rgba<u8>) {
        let (x0, y0) = (self.px(rect.x), self.px(rect.y));
        let x1 = self.px(rect.right()).max(x0 + 1);
        let y1 = self.px(rect.bottom()).max(y0 + 1);
        self.fill_px(x0, y0, x1, y1, color);
    }

    /// Draw one line of text with its top-left at `(x, y)` in layout units.
    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, size: f32, color: Rgba<u8>, bold: bool) {
        let advance = size * ADVANCE_RATIO;
        let cell_w = (advance * self.scale).round().max(1.0) as u32;
        let cell_h = (size * self.scale).round().max(1.0) as u32;
        let top = self.px(y);

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = self.px(x + i as f32 * advance);
            let glyph = self.glyphs.glyph(ch, cell_w, cell_h).clone();
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    if glyph.is_set(gx, gy) {
                        let (px, py) = (left + gx as i64, top + gy as i64);
                        self.blend(px, py, color);
                        if bold {
                            self.blend(px + 1, py, color);
                        }
                    }
                }
            }
        }
    }

    /// Draw `image` scaled to fit inside `rect`, centered, aspect preserved.
    pub fn draw_image(&mut self, rect: Rect, image: &RgbaImage) {
        let box_w = (rect.width * self.scale).round().max(1.0);
        let box_h = (rect.height * self.scale).round().max(1.0);
        let (iw, ih) = (image.width() as f32, image.height() as f32);
        if iw < 1.0 || ih < 1.0 {
            return;
        }
        let fit = (box_w / iw).min(box_h / ih);
        let w = (iw * fit).round().max(1.0) as u32;
        let h = (ih * fit).round().max(1.0) as u32;
        let resized = imageops::resize(image, w, h, FilterType::Triangle);

        let x = self.px(rect.x) + ((box_w as i64 - w as i64) / 2);
        let y = self.px(rect.y) + ((box_h as i64 - h as i64) / 2);
        imageops::overlay(&mut self.canvas, &resized, x, y);
    }
}

/// Straight-alpha source-over compositing.
pub fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// DOCUMENT PAINTING
// ============================================================================

/// Pixel dimensions of `doc` at `scale`.
pub fn dimensions(doc: &RenderedDocument, scale: f32) -> (u32, u32) {
    (
        (doc.width * scale).round().max(1.0) as u32,
        (doc.height * scale).round().max(1.0) as u32,
    )
}

/// Paint the document at `scale`.
pub fn paint(doc: &RenderedDocument, scale: f32, assets: &AssetMap) -> RgbaImage {
    let (width, height) = dimensions(doc, scale);
    let background = parse_color(&doc.background).unwrap_or(WHITE);
    let mut painter = Painter::new(width, height, scale, background);

    for node in doc.nodes() {
        match &node.kind {
            NodeKind::Fill { color } => {
                if let Some(c) = parse_color(color) {
                    painter.fill_rect(node.rect, c);
                }
            }
            NodeKind::Rule { color } => {
                if let Some(c) = parse_color(color) {
                    painter.fill_line(node.rect, c);
                }
            }
            NodeKind::Image { source } => {
                if let Some(image) = assets.get(source) {
                    painter.draw_image(node.rect, image);
                }
            }
            NodeKind::Text {
                text,
                size,
                color,
                weight,
                align,
                ..
            } => {
                let Some(c) = parse_color(color) else {
                    continue;
                };
                let width = crate::layout::text::text_width(text, *size);
                let x = match align {
                    Align::Left => node.rect.x,
                    Align::Center => node.rect.x + (node.rect.width - width) / 2.0,
                    Align::Right => node.rect.right() - width,
                };
                let y = node.rect.y + (node.rect.height - size) / 2.0;
                painter.draw_text(x, y, text, *size, c, *weight == Weight::Bold);
            }
        }
    }

    painter.into_image()
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Paint and encode a preview. The freeform overlay is export-only and
/// never appears here.
pub fn preview_png(
    doc: &RenderedDocument,
    size: PreviewSize,
    assets: &AssetMap,
) -> Result<Vec<u8>, image::ImageError> {
    encode_png(&paint(doc, size.scale(), assets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceDocument;
    use crate::layout::render;
    use crate::settings::TemplateSettings;

    fn sample() -> RenderedDocument {
        render(&InvoiceDocument::sample(), &TemplateSettings::default())
    }

    #[test]
    fn paint_matches_scaled_dimensions() {
        let doc = sample();
        let image = paint(&doc, 1.0, &AssetMap::new());
        assert_eq!(image.width(), 794);
        assert_eq!(image.height(), doc.height.round() as u32);

        let thumb = paint(&doc, PreviewSize::Thumbnail.scale(), &AssetMap::new());
        assert_eq!(thumb.width(), 199);
    }

    #[test]
    fn header_band_uses_primary_color() {
        let doc = sample();
        let image = paint(&doc, 1.0, &AssetMap::new());
        // top-left corner is inside the header fill, away from any text
        assert_eq!(*image.get_pixel(2, 2), Rgba([0x1e, 0x3a, 0x8a, 255]));
    }

    #[test]
    fn unparseable_color_paints_nothing() {
        let mut settings = TemplateSettings::default();
        settings.palette.primary_color = "bogus".to_string();
        let doc = render(&InvoiceDocument::sample(), &settings);
        let image = paint(&doc, 1.0, &AssetMap::new());
        assert_eq!(*image.get_pixel(2, 2), WHITE);
    }

    #[test]
    fn painting_is_deterministic() {
        let doc = sample();
        assert_eq!(paint(&doc, 2.0, &AssetMap::new()), paint(&doc, 2.0, &AssetMap::new()));
    }

    #[test]
    fn text_leaves_ink() {
        let mut painter = Painter::new(40, 20, 1.0, WHITE);
        painter.draw_text(0.0, 0.0, "AB", 12.0, color::BLACK, false);
        let image = painter.into_image();
        assert!(image.pixels().any(|p| *p == color::BLACK));
    }

    #[test]
    fn images_are_drawn_from_assets() {
        let mut doc = sample();
        doc.sections[0].nodes.push(crate::layout::Node {
            rect: Rect::new(100.0, 100.0, 20.0, 20.0),
            kind: NodeKind::Image {
                source: "dot".to_string(),
            },
            toggle: None,
        });
        let mut assets = AssetMap::new();
        assets.insert(
            "dot".to_string(),
            Arc::new(RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]))),
        );
        let image = paint(&doc, 1.0, &assets);
        assert_eq!(*image.get_pixel(110, 110), Rgba([0, 255, 0, 255]));

        // missing asset leaves the slot empty
        let image = paint(&doc, 1.0, &AssetMap::new());
        assert_ne!(*image.get_pixel(110, 110), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn source_over_blends_half_alpha() {
        let out = source_over(WHITE, Rgba([0, 0, 0, 128]));
        assert_eq!(out.0[3], 255);
        assert!((out.0[0] as i32 - 127).abs() <= 1);
    }

    #[test]
    fn png_has_signature() {
        let png = encode_png(&RgbaImage::new(2, 2)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
