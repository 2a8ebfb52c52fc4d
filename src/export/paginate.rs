//! Pagination of a captured raster onto fixed-size pages.
//!
//! The source raster is scaled to the page width. When the scaled height
//! fits one page, the raster is emitted unchanged. Otherwise it is cut into
//! horizontal bands, each the source height of one page:
//!
//! ```text
//! sourcePageHeight = pageHeightMm / scaledTotalHeightMm × H
//!                  = pageHeightMm × W / pageWidthMm
//!
//! band i = [round(i × s), round((i + 1) × s)) ∩ [0, H)
//! ```
//!
//! Band boundaries are rounded once and shared by neighbouring bands, so the
//! bands tile `[0, H)` exactly: no gap, no duplicated row.

use image::{Rgba, RgbaImage, imageops};

use crate::raster::color::WHITE;

/// Output page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    /// Width in PDF points.
    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    /// Height in PDF points.
    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }

    /// Height, in source pixels, of the slice that fills one page when a
    /// raster `source_width` pixels wide is scaled to the page width.
    pub fn source_page_height(&self, source_width: u32) -> f64 {
        self.height_mm * source_width as f64 / self.width_mm
    }

    /// Height in millimetres of a `width × height` raster scaled to the page width.
    pub fn scaled_height_mm(&self, width: u32, height: u32) -> f64 {
        if width == 0 {
            return 0.0;
        }
        height as f64 * self.width_mm / width as f64
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

fn mm_to_pt(mm: f64) -> f32 {
    (mm * 72.0 / 25.4) as f32
}

/// A horizontal slice of the source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub top: u32,
    pub height: u32,
}

/// Cut `[0, total_height)` into bands of `source_page_height` rows.
///
/// ```
/// use proforma::export::paginate::slice_bands;
///
/// let heights: Vec<u32> = slice_bands(2500, 1000.0).iter().map(|b| b.height).collect();
/// assert_eq!(heights, vec![1000, 1000, 500]);
/// ```
pub fn slice_bands(total_height: u32, source_page_height: f64) -> Vec<Band> {
    if total_height == 0 {
        return Vec::new();
    }
    if !source_page_height.is_finite() || source_page_height <= 0.0 {
        return vec![Band {
            top: 0,
            height: total_height,
        }];
    }

    let total = total_height as f64;
    let pages = ((total / source_page_height) - 1e-9).ceil().max(1.0) as u32;

    let boundary = |i: u32| -> u32 {
        if i >= pages {
            total_height
        } else {
            ((i as f64 * source_page_height).round() as u32).min(total_height)
        }
    };

    (0..pages)
        .map(|i| (boundary(i), boundary(i + 1)))
        .filter(|(top, bottom)| bottom > top)
        .map(|(top, bottom)| Band {
            top,
            height: bottom - top,
        })
        .collect()
}

/// Split a captured raster into page images.
///
/// A raster that fits one page is returned as-is. Otherwise each band is
/// copied onto a fresh opaque-white buffer of the source width.
pub fn paginate(source: &RgbaImage, geometry: &PageGeometry) -> Vec<RgbaImage> {
    let (width, height) = source.dimensions();
    if height == 0 || width == 0 {
        return Vec::new();
    }
    if geometry.scaled_height_mm(width, height) <= geometry.height_mm {
        return vec![source.clone()];
    }

    slice_bands(height, geometry.source_page_height(width))
        .into_iter()
        .map(|band| {
            let mut page = RgbaImage::from_pixel(width, band.height, WHITE);
            let slice = imageops::crop_imm(source, 0, band.top, width, band.height).to_image();
            imageops::overlay(&mut page, &slice, 0, 0);
            page
        })
        .collect()
}

/// Flatten onto white and drop alpha: tightly packed 8-bit RGB.
pub fn to_rgb_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity((image.width() * image.height() * 3) as usize);
    for &Rgba([r, g, b, a]) in image.pixels() {
        let alpha = a as u32;
        let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.extend_from_slice(&[over_white(r), over_white(g), over_white(b)]);
    }
    out
}
