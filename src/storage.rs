//! Publishing rendered reports to object storage.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::info;

use crate::composer::ReportComposer;
use crate::error::{ReportError, StorageError};
use crate::fetch::AssetFetcher;
use crate::model::{Arquivo, Patrimonio, ReportRequest};

/// Content type of published reports.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Key/value object storage with public URLs.
pub trait ObjectStore {
    /// Stores `bytes` under `key`, replacing any previous object, and returns its public URL.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;

    /// Public URL of the object stored under `key`.
    fn public_url(&self, key: &str) -> String;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        (**self).put(key, bytes, content_type)
    }

    fn public_url(&self, key: &str) -> String {
        (**self).public_url(key)
    }
}

/// Object store backed by a local directory.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `key` below the root; keys must be relative and stay inside the root.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String, StorageError> {
        let path = self.object_path(key)?;
        let io_error = |source| StorageError::Io {
            key: key.to_owned(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&path, bytes).map_err(io_error)?;

        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Stores reports under deterministic per-asset keys.
#[derive(Clone, Debug)]
pub struct ReportPublisher<S> {
    store: S,
}

impl<S: ObjectStore> ReportPublisher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn report_key(id: impl std::fmt::Display) -> String {
        format!("reports/{}.pdf", id)
    }

    /// URL the report for `id` is published at; known before the report exists.
    pub fn report_url(&self, id: impl std::fmt::Display) -> String {
        self.store.public_url(&Self::report_key(id))
    }

    /// Uploads a rendered report, replacing any earlier version, and returns its URL.
    pub fn publish(
        &self,
        id: impl std::fmt::Display,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let key = Self::report_key(id);
        let url = self.store.put(&key, bytes, PDF_CONTENT_TYPE)?;
        info!("Published {} ({} bytes) at {}", key, bytes.len(), url);
        Ok(url)
    }
}

/// Renders the report for one asset snapshot and publishes it.
///
/// The report embeds a QR code pointing at its own published URL.  Returns that URL.
pub fn generate_patrimonio_report<F, S>(
    composer: &ReportComposer<F>,
    publisher: &ReportPublisher<S>,
    id: impl std::fmt::Display + Copy,
    patrimonio: &Patrimonio,
    arquivos: &[Arquivo],
) -> Result<String, ReportError>
where
    F: AssetFetcher,
    S: ObjectStore,
{
    let report_url = publisher.report_url(id);
    let request = ReportRequest::for_patrimonio(patrimonio, arquivos, Some(report_url));
    let rendered = composer.compose(&request)?;
    Ok(publisher.publish(id, &rendered.bytes)?)
}

#[cfg(test)]
mod tests {
    use super::{LocalObjectStore, ObjectStore, ReportPublisher};
    use crate::error::StorageError;

    #[test]
    fn put_writes_nested_keys_and_returns_public_url() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LocalObjectStore::new(dir.path(), "https://files.example/");

        let url = store
            .put("reports/7.pdf", b"%PDF-1.3", "application/pdf")
            .expect("stored");

        assert_eq!(url, "https://files.example/reports/7.pdf");
        let written = std::fs::read(dir.path().join("reports/7.pdf")).expect("file exists");
        assert_eq!(written, b"%PDF-1.3");
    }

    #[test]
    fn put_overwrites_existing_object() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LocalObjectStore::new(dir.path(), "http://localhost:8080");

        store.put("a.pdf", b"first", "application/pdf").expect("stored");
        store.put("a.pdf", b"second", "application/pdf").expect("stored");

        assert_eq!(std::fs::read(dir.path().join("a.pdf")).expect("read"), b"second");
    }

    #[test]
    fn rejects_keys_escaping_the_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LocalObjectStore::new(dir.path(), "http://localhost:8080");

        for key in ["../x.pdf", "/etc/x.pdf", "", "reports/../../x.pdf"] {
            assert!(
                matches!(store.put(key, b"x", "application/pdf"), Err(StorageError::InvalidKey(_))),
                "{key:?} accepted"
            );
        }
    }

    #[test]
    fn publisher_uses_deterministic_key() {
        let dir = tempfile::tempdir().expect("temp dir");
        let publisher = ReportPublisher::new(LocalObjectStore::new(dir.path(), "http://h"));

        assert_eq!(ReportPublisher::<LocalObjectStore>::report_key(42), "reports/42.pdf");
        assert_eq!(publisher.report_url(42), "http://h/reports/42.pdf");

        let url = publisher.publish(42, b"pdf").expect("published");
        assert_eq!(url, publisher.report_url(42));
        assert!(dir.path().join("reports/42.pdf").is_file());
    }
}
