//! PDF reports for tracked police assets (patrimônio).
//!
//! A [`ReportRequest`] holds the record fields, attachments and the report's own public URL.
//! [`ReportComposer`] fetches the logo and attachment images, encodes the URL as a QR code, lays
//! the report out page by page and renders it with `genpdf`.  [`storage`] publishes the result.

pub mod builder;
pub mod composer;
pub mod config;
pub mod elements;
pub mod error;
pub mod fetch;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod qr;
pub mod storage;

pub use composer::{plan_report, RenderedReport, ReportAssets, ReportComposer, ReportLayout};
pub use config::ReportConfig;
pub use error::{EncodeError, FetchError, RenderError, ReportError, StorageError};
pub use fetch::{AssetFetcher, HttpFetcher};
pub use model::{Arquivo, Attachment, FieldValue, Patrimonio, RecordField, ReportRequest};
pub use storage::{generate_patrimonio_report, LocalObjectStore, ObjectStore, ReportPublisher};
