//! PDF assembly.
//!
//! One page per page image. Each image becomes a Flate-compressed RGB image
//! XObject drawn at the full page width from the top edge; a shorter final
//! slice leaves the rest of its page blank.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};
use rayon::prelude::*;

use super::ExportError;
use super::paginate::{PageGeometry, to_rgb_bytes};

const IMAGE_NAME: &[u8] = b"Im1";

fn deflate(data: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ExportError::Encode(format!("compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| ExportError::Encode(format!("compression failed: {}", e)))
}

struct EncodedPage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Build a PDF with one page per image.
pub fn assemble(pages: &[RgbaImage], geometry: &PageGeometry) -> Result<Vec<u8>, ExportError> {
    if pages.is_empty() {
        return Err(ExportError::Encode("no pages to write".to_string()));
    }

    let encoded: Vec<EncodedPage> = pages
        .par_iter()
        .map(|page| {
            Ok(EncodedPage {
                width: page.width(),
                height: page.height(),
                data: deflate(&to_rgb_bytes(page))?,
            })
        })
        .collect::<Result<_, ExportError>>()?;

    let page_width = geometry.width_pt();
    let page_height = geometry.height_pt();

    let mut next_id = 1;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let mut page_ids = Vec::with_capacity(encoded.len());

    let mut pdf = Pdf::new();

    for page in &encoded {
        let page_id = alloc();
        let image_id = alloc();
        let content_id = alloc();
        page_ids.push(page_id);

        {
            let mut image = pdf.image_xobject(image_id, &page.data);
            image.filter(Filter::FlateDecode);
            image.width(page.width as i32);
            image.height(page.height as i32);
            image.color_space().device_rgb();
            image.bits_per_component(8);
        }

        let draw_height = page.height as f32 * page_width / page.width as f32;
        let mut content = Content::new();
        content.save_state();
        content.transform([page_width, 0.0, 0.0, draw_height, 0.0, page_height - draw_height]);
        content.x_object(Name(IMAGE_NAME));
        content.restore_state();
        let stream = deflate(&content.finish())?;
        pdf.stream(content_id, &stream).filter(Filter::FlateDecode);

        let mut pdf_page = pdf.page(page_id);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, page_width, page_height))
            .parent(pages_id)
            .contents(content_id);
        pdf_page.resources().x_objects().pair(Name(IMAGE_NAME), image_id);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    Ok(pdf.finish())
}
