//! # invoice-forge – one invoice model, themeable preview, paginated PDF
//!
//! This crate turns an editable invoice record into a styled document and
//! exports it to PDF. The stages are:
//!
//! 1. **Derive** – totals ([`totals`]) and a contrast-safe palette ([`palette`])
//! 2. **Template** – build the visual tree for a template variant ([`templates`], [`document`])
//! 3. **Serialize** – standalone HTML for preview and server print ([`html`])
//! 4. **Layout** – flexbox layout with Taffy in document pixels ([`layout`])
//! 5. **Rasterize** – off-screen SVG render to a bitmap ([`raster`])
//! 6. **Paginate** – slice the bitmap into US-Letter bands ([`pagination`])
//! 7. **Render** – wrap page bitmaps in a PDF via printpdf ([`render`])
//!
//! [`export`] runs the server-print and client-rasterize strategies with
//! fallback; [`pipeline`] ties everything into single calls. A C-compatible
//! FFI surface is exposed via the [`ffi`] module.

pub mod assets;
pub mod document;
pub mod error;
pub mod export;
pub mod ffi;
pub mod fonts;
pub mod format;
pub mod html;
pub mod labels;
pub mod layout;
pub mod model;
pub mod pagination;
pub mod palette;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod store;
pub mod templates;
pub mod totals;

// Re-exports for convenience
pub use error::{ExportError, StoreError};
pub use export::{ExportFailure, ExportMethod, ExportProgress, ExportedPdf};
pub use model::{InvoiceDocument, InvoiceTheme, TemplateVariant};
pub use pipeline::{export_pdf, render_export_html, render_preview, PipelineConfig};
pub use totals::{compute_totals, Totals};
