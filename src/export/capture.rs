//! Raster capture capability.
//!
//! The pipeline depends on [`Rasterizer`] only; [`PixelRasterizer`] is the
//! built-in implementation backed by [`crate::raster`].

use image::RgbaImage;

use super::ExportError;
use super::stage::View;
use crate::layout::Rect;
use crate::raster::color::{BLACK, WHITE, parse_color, with_opacity};
use crate::raster::{self, AssetMap, Painter};

/// Width of the drop shadow band, in layout units.
const SHADOW_WIDTH: f32 = 6.0;

/// Turns a mounted view into a raster.
pub trait Rasterizer: Send + Sync {
    /// Capture `view` at `scale` on an opaque white background.
    fn capture(&self, view: &View, scale: f32, assets: &AssetMap) -> Result<RgbaImage, ExportError>;
}

/// Captures exactly what the view shows, editor chrome included.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelRasterizer;

impl Rasterizer for PixelRasterizer {
    fn capture(&self, view: &View, scale: f32, assets: &AssetMap) -> Result<RgbaImage, ExportError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ExportError::Capture(format!("invalid scale {}", scale)));
        }

        let mut painter = Painter::from_image(raster::paint(&view.document, scale, assets), scale);

        let doc = &view.document;
        if let Some(shadow) = view.style.box_shadow.as_deref().and_then(parse_color) {
            painter.fill_rect(Rect::new(doc.width - SHADOW_WIDTH, 0.0, SHADOW_WIDTH, doc.height), shadow);
            painter.fill_rect(Rect::new(0.0, doc.height - SHADOW_WIDTH, doc.width, SHADOW_WIDTH), shadow);
        }

        for control in view.visible_controls() {
            painter.fill_rect(control.rect, with_opacity(BLACK, 0.8));
            let size = (control.rect.height * 0.5).max(6.0);
            painter.draw_text(
                control.rect.x + 6.0,
                control.rect.y + (control.rect.height - size) / 2.0,
                &control.label,
                size,
                WHITE,
                true,
            );
        }

        Ok(painter.into_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::stage::CaptureGuard;
    use crate::invoice::InvoiceDocument;
    use crate::layout::render;
    use crate::settings::TemplateSettings;

    fn view() -> View {
        let doc = render(&InvoiceDocument::sample(), &TemplateSettings::default());
        View::new("preview", doc).with_editor_chrome()
    }

    #[test]
    fn chrome_shows_up_in_raw_capture() {
        let view = view();
        let plain = raster::paint(&view.document, 1.0, &AssetMap::new());
        let captured = PixelRasterizer.capture(&view, 1.0, &AssetMap::new()).unwrap();
        assert_ne!(plain, captured);
    }

    #[test]
    fn guarded_capture_matches_plain_paint() {
        let mut view = view();
        let plain = raster::paint(&view.document, 2.0, &AssetMap::new());
        let guard = CaptureGuard::new(&mut view);
        let captured = PixelRasterizer.capture(guard.view(), 2.0, &AssetMap::new()).unwrap();
        assert_eq!(plain, captured);
    }

    #[test]
    fn zero_scale_is_a_capture_error() {
        let view = view();
        assert!(matches!(
            PixelRasterizer.capture(&view, 0.0, &AssetMap::new()),
            Err(ExportError::Capture(_))
        ));
    }
}
