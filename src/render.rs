//! PDF renderer – places page bitmaps on PDF pages using `printpdf`
//! (v0.8 ops-based API).
//!
//! Every bitmap spans the full page width and is anchored to the top edge;
//! a final band shorter than the page leaves the remainder blank.

use std::io::Cursor;

// `printpdf::*` also exports an `image` module, so the crate path is absolute.
use ::image::{DynamicImage, ImageFormat, RgbaImage};
use printpdf::*;

use crate::error::{ExportError, Result};

const PT_TO_MM: f32 = 0.352778;

/// One output page: its bitmap and the page size in points.
pub struct PageImage {
    pub image: RgbaImage,
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageImage {
    /// A page exactly as tall as the bitmap's aspect ratio at `width_pt`.
    pub fn fitted(image: RgbaImage, width_pt: f32) -> Self {
        let height_pt = if image.width() == 0 {
            0.0
        } else {
            width_pt * image.height() as f32 / image.width() as f32
        };
        Self {
            image,
            width_pt,
            height_pt,
        }
    }
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    // The sheet is opaque; dropping alpha keeps the PDF free of soft masks.
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ExportError::Pdf(format!("PNG encode error: {e}")))?;
    Ok(buf)
}

/// Assemble page bitmaps into PDF bytes.
pub fn render_pages(pages: &[PageImage], title: &str) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(ExportError::Pdf("no pages to render".to_string()));
    }

    let mut doc = PdfDocument::new(title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut pdf_pages = Vec::with_capacity(pages.len());

    for (index, page) in pages.iter().enumerate() {
        let (px_width, px_height) = page.image.dimensions();
        if px_width == 0 || px_height == 0 {
            return Err(ExportError::Pdf(format!("page {} has an empty bitmap", index + 1)));
        }
        let png = encode_png(&page.image)?;
        let raw = RawImage::decode_from_bytes(&png, &mut warnings)
            .map_err(|e| ExportError::Pdf(format!("page {}: {e}", index + 1)))?;
        let xobj_id = doc.add_image(&raw);

        // At 72 dpi one pixel is one point before scaling.
        let scale = page.width_pt / px_width as f32;
        let img_height_pt = px_height as f32 * scale;
        let ops = vec![Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(page.height_pt - img_height_pt)),
                dpi: Some(72.0),
                scale_x: Some(scale),
                scale_y: Some(scale),
                rotate: None,
            },
        }];
        pdf_pages.push(PdfPage::new(
            Mm(page.width_pt * PT_TO_MM),
            Mm(page.height_pt * PT_TO_MM),
            ops,
        ));
    }
    for w in &warnings {
        log::debug!("printpdf: {w:?}");
    }

    doc.with_pages(pdf_pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!("built PDF with {} page(s), {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::Rgba;

    fn page(w: u32, h: u32) -> PageImage {
        PageImage {
            image: RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])),
            width_pt: 612.0,
            height_pt: 792.0,
        }
    }

    #[test]
    fn renders_pdf_magic() {
        let bytes = render_pages(&[page(40, 50)], "Invoice").unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn fitted_page_follows_aspect() {
        let p = PageImage::fitted(RgbaImage::new(100, 50), 612.0);
        assert!((p.height_pt - 306.0).abs() < 0.01);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(render_pages(&[], "x").is_err());
        assert!(render_pages(&[page(0, 0)], "x").is_err());
    }
}
