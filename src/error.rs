use std::time::Duration;

use thiserror::Error;

/// Failure of one export strategy (or of a stage inside one).
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Render target unavailable: {0}")]
    RenderTarget(String),

    #[error("Layout failed: {0}")]
    Layout(String),

    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("Failed to build PDF: {0}")]
    Pdf(String),

    #[error("Print service unreachable: {0}")]
    Transport(String),

    #[error("Print service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Print service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Print service returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("No print endpoint configured")]
    NoEndpoint,

    #[error("No export strategy configured")]
    NoStrategy,

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl ExportError {
    /// Errors raised by the network leg of server-side printing.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ExportError::Transport(_)
                | ExportError::Timeout(_)
                | ExportError::Status { .. }
                | ExportError::InvalidResponse(_)
                | ExportError::NoEndpoint
        )
    }
}

impl From<taffy::TaffyError> for ExportError {
    fn from(e: taffy::TaffyError) -> Self {
        ExportError::Layout(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No active document")]
    NoActiveDocument,

    #[error("Document '{0}' not found")]
    NotFound(String),

    #[error("Document '{0}' already exists")]
    AlreadyExists(String),

    #[error("Failed to parse drafts: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Unsupported image source: {0}")]
    Unsupported(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
