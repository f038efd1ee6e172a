//! Client strategy: rasterize the invoice off-screen and wrap the bitmap in
//! US-Letter-wide PDF pages.

use std::sync::Arc;

use super::{ExportJob, ExportMethod, ExportProgress, ExportedPdf};
use crate::error::{ExportError, Result};
use crate::pagination::{page_height_px, PaginationMode};
use crate::raster::Rasterizer;
use crate::render::{render_pages, PageImage};

pub const DEFAULT_SCALE: f32 = 2.0;
pub const LETTER_WIDTH_PT: f32 = 612.0;
pub const LETTER_HEIGHT_PT: f32 = 792.0;

pub struct ClientRasterize {
    rasterizer: Arc<dyn Rasterizer>,
    pub scale: f32,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub pagination: PaginationMode,
}

impl ClientRasterize {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            rasterizer,
            scale: DEFAULT_SCALE,
            page_width_pt: LETTER_WIDTH_PT,
            page_height_pt: LETTER_HEIGHT_PT,
            pagination: PaginationMode::Auto,
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationMode) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_page_size(mut self, width_pt: f32, height_pt: f32) -> Self {
        self.page_width_pt = width_pt;
        self.page_height_pt = height_pt;
        self
    }

    pub fn export(
        &self,
        job: &ExportJob,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> Result<ExportedPdf> {
        progress(ExportProgress::Rendering);
        progress(ExportProgress::Capturing);
        let empty = || {
            ExportError::RenderTarget(format!(
                "invoice {} produced an empty bitmap",
                job.document.id
            ))
        };

        let pages: Vec<PageImage> = if self.pagination == PaginationMode::SinglePage {
            let bitmap = self.rasterizer.rasterize(&job.document, self.scale)?;
            if bitmap.width() == 0 || bitmap.height() == 0 {
                return Err(empty());
            }
            vec![PageImage::fitted(bitmap, self.page_width_pt)]
        } else {
            let mut bands = self.rasterizer.rasterize_bands(
                &job.document,
                self.scale,
                self.page_width_pt,
                self.page_height_pt,
            )?;
            if bands.is_empty() || bands.iter().any(|b| b.width() == 0 || b.height() == 0) {
                return Err(empty());
            }
            let width = bands[0].width();
            let height: u32 = bands.iter().map(|b| b.height()).sum();
            let page_px = page_height_px(width, self.page_width_pt, self.page_height_pt);
            let mode = self.pagination.resolve(height, page_px);
            log::debug!("bitmap {width}x{height} px, page height {page_px} px, {mode:?}");

            match (mode, bands.len()) {
                (PaginationMode::SinglePage, 1) => {
                    vec![PageImage::fitted(bands.remove(0), self.page_width_pt)]
                }
                _ => bands
                    .into_iter()
                    .map(|image| PageImage {
                        image,
                        width_pt: self.page_width_pt,
                        height_pt: self.page_height_pt,
                    })
                    .collect(),
            }
        };

        progress(ExportProgress::BuildingPdf);
        let bytes = render_pages(&pages, &job.title)?;
        if !bytes.starts_with(b"%PDF-") {
            return Err(ExportError::Pdf("generated document is not a PDF".to_string()));
        }
        Ok(ExportedPdf {
            bytes,
            filename: job.filename.clone(),
            method: ExportMethod::Client,
            pages: Some(pages.len()),
        })
    }
}
