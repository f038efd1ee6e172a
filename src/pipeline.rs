//! Pipeline – ties together totals, palette, templates, HTML and export into
//! single function calls.

use std::sync::Arc;
use std::time::Duration;

use crate::assets::inline_image_source;
use crate::document::{RenderMode, VisualDocument};
use crate::export::client::{DEFAULT_SCALE, LETTER_HEIGHT_PT, LETTER_WIDTH_PT};
use crate::export::server::DEFAULT_TIMEOUT;
use crate::export::{
    ClientRasterize, ExportFailure, ExportJob, ExportProgress, ExportStrategy, ExportedPdf,
    Exporter, HttpPrintTransport, ServerPrint,
};
use crate::html::{render_html, PrintSettings};
use crate::labels::LabelKey;
use crate::model::{InvoiceDocument, InvoiceTheme};
use crate::pagination::PaginationMode;
use crate::palette::{resolve_palette, Palette};
use crate::raster::{Rasterizer, SvgRasterizer};
use crate::templates::render_document;
use crate::totals::{compute_totals, Totals};

pub const ENV_PRINT_ENDPOINT: &str = "INVOICE_FORGE_PRINT_ENDPOINT";
pub const ENV_PRINT_TIMEOUT_SECS: &str = "INVOICE_FORGE_PRINT_TIMEOUT_SECS";
pub const ENV_RASTER_SCALE: &str = "INVOICE_FORGE_RASTER_SCALE";

/// Configuration for the rendering and export pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Page width in points (default: US-Letter = 612).
    pub page_width: f32,
    /// Page height in points (default: US-Letter = 792).
    pub page_height: f32,
    /// Print margin in inches for the server path (default: 0.5).
    pub margin_in: f32,
    /// Device scale of the client rasterizer (default: 2.0).
    pub raster_scale: f32,
    pub pagination: PaginationMode,
    /// Print service URL. `None` exports with the client strategy only.
    pub print_endpoint: Option<String>,
    pub print_timeout: Duration,
    /// Theme of the host application; the document may override it.
    pub app_theme: InvoiceTheme,
    /// PDF metadata title. Defaults to "<title label> <invoice number>".
    pub title: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_width: LETTER_WIDTH_PT,
            page_height: LETTER_HEIGHT_PT,
            margin_in: 0.5,
            raster_scale: DEFAULT_SCALE,
            pagination: PaginationMode::Auto,
            print_endpoint: None,
            print_timeout: DEFAULT_TIMEOUT,
            app_theme: InvoiceTheme::Light,
            title: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `INVOICE_FORGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_PRINT_ENDPOINT).filter(|u| !u.trim().is_empty()) {
            self.print_endpoint = Some(url.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_PRINT_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.print_timeout = Duration::from_secs(secs),
                _ => log::warn!("Ignoring invalid {ENV_PRINT_TIMEOUT_SECS}={raw:?}"),
            }
        }
        if let Some(raw) = lookup(ENV_RASTER_SCALE) {
            match raw.trim().parse::<f32>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 => self.raster_scale = scale,
                _ => log::warn!("Ignoring invalid {ENV_RASTER_SCALE}={raw:?}"),
            }
        }
        self
    }

    pub fn print_settings(&self) -> PrintSettings {
        PrintSettings {
            margin_in: self.margin_in,
            ..PrintSettings::default()
        }
    }
}

/// `invoice-{number}.pdf`, or `invoice-{id}.pdf` when the number is blank.
/// Characters unsafe in file names become `-`.
pub fn default_filename(doc: &InvoiceDocument) -> String {
    let number = doc.meta.invoice_number.trim();
    let stem = if number.is_empty() { doc.id.trim() } else { number };
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("invoice-{stem}.pdf")
}

fn pdf_title(doc: &InvoiceDocument, config: &PipelineConfig) -> String {
    if let Some(title) = &config.title {
        return title.clone();
    }
    let label = doc.labels.get(LabelKey::InvoiceTitle);
    let number = doc.meta.invoice_number.trim();
    if number.is_empty() {
        label.to_string()
    } else {
        format!("{label} {number}")
    }
}

/// Totals and palette for `doc`, computed once and shared by every output.
pub fn derive(doc: &InvoiceDocument, config: &PipelineConfig) -> (Totals, Palette) {
    let totals = compute_totals(&doc.items, &doc.fees);
    let (background, header) = doc.base_colors(config.app_theme);
    (totals, resolve_palette(&background, &header))
}

/// Visual tree for `doc` in `mode`, using the document's template.
pub fn prepare_document(
    doc: &InvoiceDocument,
    config: &PipelineConfig,
    mode: RenderMode,
) -> VisualDocument {
    let (totals, palette) = derive(doc, config);
    render_document(doc, &totals, &palette, doc.preferences.template, mode)
}

/// Editable on-screen preview.
pub fn render_preview(doc: &InvoiceDocument, config: &PipelineConfig) -> VisualDocument {
    prepare_document(doc, config, RenderMode::Interactive)
}

/// Copy of `doc` whose logo is a data URI. If the logo cannot be inlined the
/// original source is kept.
pub fn inline_logo(doc: &InvoiceDocument, timeout: Duration) -> InvoiceDocument {
    let mut doc = doc.clone();
    if let Some(src) = doc.logo_source().map(str::to_string) {
        match inline_image_source(&src, timeout) {
            Ok(uri) => doc.logo = Some(uri),
            Err(e) => log::warn!("Keeping logo source as-is: {e}"),
        }
    }
    doc
}

/// Standalone print HTML, as sent to the print service.
pub fn render_export_html(doc: &InvoiceDocument, config: &PipelineConfig) -> String {
    let doc = inline_logo(doc, config.print_timeout);
    let visual = prepare_document(&doc, config, RenderMode::Export);
    render_html(&visual, &config.print_settings())
}

/// Snapshot `doc` into an export job.
pub fn build_job(doc: &InvoiceDocument, config: &PipelineConfig) -> ExportJob {
    let inlined = inline_logo(doc, config.print_timeout);
    ExportJob {
        document: prepare_document(&inlined, config, RenderMode::Export),
        filename: default_filename(doc),
        title: pdf_title(doc, config),
    }
}

/// Server print first when an endpoint is configured, client rasterize last.
pub fn build_exporter(config: &PipelineConfig, rasterizer: Arc<dyn Rasterizer>) -> Exporter {
    let mut exporter = Exporter::default();
    if let Some(endpoint) = &config.print_endpoint {
        let transport = HttpPrintTransport::new(endpoint.clone(), config.print_timeout);
        exporter.push(ExportStrategy::ServerPrint(
            ServerPrint::new(Arc::new(transport)).with_print_settings(config.print_settings()),
        ));
    }
    exporter.push(ExportStrategy::ClientRasterize(
        ClientRasterize::new(rasterizer)
            .with_scale(config.raster_scale)
            .with_page_size(config.page_width, config.page_height)
            .with_pagination(config.pagination),
    ));
    exporter
}

/// Full pipeline: invoice → PDF bytes, with fallback between strategies.
pub fn export_pdf(
    doc: &InvoiceDocument,
    config: &PipelineConfig,
    progress: &mut dyn FnMut(ExportProgress),
) -> Result<ExportedPdf, ExportFailure> {
    export_pdf_with(doc, config, Arc::new(SvgRasterizer::default()), progress)
}

/// [`export_pdf`] with a caller-supplied rasterizer for the client strategy.
pub fn export_pdf_with(
    doc: &InvoiceDocument,
    config: &PipelineConfig,
    rasterizer: Arc<dyn Rasterizer>,
    progress: &mut dyn FnMut(ExportProgress),
) -> Result<ExportedPdf, ExportFailure> {
    let exporter = build_exporter(config, rasterizer);
    let job = build_job(doc, config);
    let result = exporter.export(&job, progress);
    if let Err(e) = &result {
        log::error!("export of {} failed: {}", job.filename, e.message);
    }
    result
}
