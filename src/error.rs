//! Error types for report generation.
//!
//! Asset errors ([`FetchError`], [`EncodeError`]) are soft: the composer logs them and leaves the
//! affected element out of the document.  [`RenderError`] is the only failure that aborts a
//! report.

use thiserror::Error;

/// A remote asset could not be retrieved or decoded.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request for {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("asset from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },
    #[error("cannot read {url}: {source}")]
    File {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no asset available at {0}")]
    NotFound(String),
}

/// The QR code for a report URL could not be generated.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot encode an empty QR payload")]
    EmptyInput,
    #[error("QR scale must be at least one pixel per module")]
    InvalidScale,
    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("QR image could not be written as PNG: {0}")]
    Png(String),
}

/// The document could not be produced.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("font setup failed: {0}")]
    Font(#[source] genpdf::error::Error),
    #[error("PDF rendering failed: {0}")]
    Pdf(#[source] genpdf::error::Error),
}

/// Writing to the object store failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to store object {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid object key {0:?}")]
    InvalidKey(String),
}

/// Failure of the end-to-end generate-and-publish workflow.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid report input: {0}")]
    Input(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
