//! Export – turns a prepared invoice into PDF bytes.
//!
//! Two strategies share one contract ([`ExportStrategy::export`]). An
//! [`Exporter`] holds them as an ordered attempt list: the first strategy to
//! succeed wins, each failure is recorded and the next one is tried. Panics
//! inside a strategy are caught and reported as [`ExportError::Unexpected`].

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::Serialize;
use thiserror::Error;

use crate::document::VisualDocument;
use crate::error::{ExportError, Result};

pub mod client;
pub mod server;

pub use client::ClientRasterize;
pub use server::{HttpPrintTransport, PrintRequest, PrintResponse, PrintTransport, ServerPrint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMethod {
    Server,
    Client,
}

impl ExportMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportMethod::Server => "server",
            ExportMethod::Client => "client",
        }
    }
}

impl fmt::Display for ExportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient states reported while an export runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportProgress {
    Rendering,
    Capturing,
    BuildingPdf,
    Submitting,
    FallingBack { from: ExportMethod, reason: String },
}

impl fmt::Display for ExportProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportProgress::Rendering => f.write_str("Rendering..."),
            ExportProgress::Capturing => f.write_str("Capturing..."),
            ExportProgress::BuildingPdf => f.write_str("Building PDF..."),
            ExportProgress::Submitting => f.write_str("Submitting to print service..."),
            ExportProgress::FallingBack { from, reason } => {
                write!(f, "Falling back after {from} export failed: {reason}")
            }
        }
    }
}

/// An immutable snapshot handed to the strategies.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Export-mode visual tree.
    pub document: VisualDocument,
    pub filename: String,
    /// PDF metadata title.
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub method: ExportMethod,
    /// Known only for client-built documents.
    pub pages: Option<usize>,
}

/// Every strategy failed.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ExportFailure {
    pub message: String,
    pub attempts: Vec<(ExportMethod, ExportError)>,
}

pub enum ExportStrategy {
    ServerPrint(ServerPrint),
    ClientRasterize(ClientRasterize),
}

impl ExportStrategy {
    pub fn method(&self) -> ExportMethod {
        match self {
            ExportStrategy::ServerPrint(_) => ExportMethod::Server,
            ExportStrategy::ClientRasterize(_) => ExportMethod::Client,
        }
    }

    pub fn export(
        &self,
        job: &ExportJob,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> Result<ExportedPdf> {
        match self {
            ExportStrategy::ServerPrint(s) => s.export(job, progress),
            ExportStrategy::ClientRasterize(c) => c.export(job, progress),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during export".to_string()
    }
}

#[derive(Default)]
pub struct Exporter {
    strategies: Vec<ExportStrategy>,
}

impl Exporter {
    pub fn new(strategies: Vec<ExportStrategy>) -> Self {
        Self { strategies }
    }

    pub fn push(&mut self, strategy: ExportStrategy) {
        self.strategies.push(strategy);
    }

    pub fn methods(&self) -> Vec<ExportMethod> {
        self.strategies.iter().map(ExportStrategy::method).collect()
    }

    /// Try each strategy in order until one produces a PDF.
    pub fn export(
        &self,
        job: &ExportJob,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> std::result::Result<ExportedPdf, ExportFailure> {
        let mut attempts: Vec<(ExportMethod, ExportError)> = Vec::new();

        for strategy in &self.strategies {
            let method = strategy.method();
            if let Some((from, err)) = attempts.last() {
                progress(ExportProgress::FallingBack {
                    from: *from,
                    reason: err.to_string(),
                });
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| strategy.export(job, &mut *progress)))
                .unwrap_or_else(|payload| Err(ExportError::Unexpected(panic_message(payload))));

            match outcome {
                Ok(pdf) => {
                    log::info!(
                        "exported {} via {} ({} bytes)",
                        pdf.filename,
                        method,
                        pdf.bytes.len()
                    );
                    return Ok(pdf);
                }
                Err(e) => {
                    log::warn!("{method} export failed: {e}");
                    attempts.push((method, e));
                }
            }
        }

        let message = match attempts.last() {
            Some((_, e)) => e.to_string(),
            None => ExportError::NoStrategy.to_string(),
        };
        Err(ExportFailure { message, attempts })
    }
}

/// Run an export on its own thread. The job is moved in, so later edits to
/// the source document cannot affect it.
pub fn spawn_export<F>(
    exporter: Arc<Exporter>,
    job: ExportJob,
    mut progress: F,
) -> JoinHandle<std::result::Result<ExportedPdf, ExportFailure>>
where
    F: FnMut(ExportProgress) + Send + 'static,
{
    thread::spawn(move || exporter.export(&job, &mut progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RenderMode;
    use crate::model::{InvoiceDocument, TemplateVariant};
    use crate::palette::resolve_palette;
    use crate::raster::Rasterizer;
    use crate::templates::render_document;
    use crate::totals::compute_totals;
    use image::RgbaImage;

    struct Panicking;

    impl Rasterizer for Panicking {
        fn rasterize(&self, _: &VisualDocument, _: f32) -> Result<RgbaImage> {
            panic!("surface exploded")
        }
    }

    struct Blank;

    impl Rasterizer for Blank {
        fn rasterize(&self, _: &VisualDocument, scale: f32) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                (816.0 * scale) as u32,
                (500.0 * scale) as u32,
                image::Rgba([255, 255, 255, 255]),
            ))
        }
    }

    fn job() -> ExportJob {
        let doc = InvoiceDocument::default();
        let totals = compute_totals(&doc.items, &doc.fees);
        let palette = resolve_palette("#ffffff", "#e5e7eb");
        ExportJob {
            document: render_document(&doc, &totals, &palette, TemplateVariant::Modern, RenderMode::Export),
            filename: "invoice-draft.pdf".to_string(),
            title: "INVOICE".to_string(),
        }
    }

    fn client(r: impl Rasterizer + 'static) -> ExportStrategy {
        ExportStrategy::ClientRasterize(ClientRasterize::new(Arc::new(r)))
    }

    #[test]
    fn progress_messages() {
        assert_eq!(ExportProgress::Rendering.to_string(), "Rendering...");
        assert_eq!(ExportProgress::Capturing.to_string(), "Capturing...");
        assert_eq!(ExportProgress::BuildingPdf.to_string(), "Building PDF...");
    }

    #[test]
    fn no_strategies_is_a_failure() {
        let err = Exporter::default().export(&job(), &mut |_| {}).unwrap_err();
        assert!(err.attempts.is_empty());
        assert_eq!(err.message, "No export strategy configured");
    }

    #[test]
    fn panic_becomes_failure_then_fallback_succeeds() {
        let exporter = Exporter::new(vec![client(Panicking), client(Blank)]);
        let mut events = Vec::new();
        let pdf = exporter.export(&job(), &mut |p| events.push(p)).unwrap();
        assert_eq!(pdf.method, ExportMethod::Client);
        assert!(events
            .iter()
            .any(|e| matches!(e, ExportProgress::FallingBack { reason, .. } if reason.contains("surface exploded"))));
    }

    #[test]
    fn all_failing_reports_each_attempt() {
        let exporter = Exporter::new(vec![client(Panicking), client(Panicking)]);
        let err = exporter.export(&job(), &mut |_| {}).unwrap_err();
        assert_eq!(err.attempts.len(), 2);
        assert!(matches!(err.attempts[0].1, ExportError::Unexpected(_)));
    }

    #[test]
    fn spawned_export_completes() {
        let exporter = Arc::new(Exporter::new(vec![client(Blank)]));
        let handle = spawn_export(exporter, job(), |_| {});
        let pdf = handle.join().unwrap().unwrap();
        assert_eq!(&pdf.bytes[..5], b"%PDF-");
        assert_eq!(pdf.pages, Some(1));
    }
}
