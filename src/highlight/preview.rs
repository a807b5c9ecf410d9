//! Scoped PDF previews.
//!
//! A preview owns its backing file from acquisition until it is dropped.

use crate::api::{ApiError, InvoiceApi};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("could not fetch PDF: {0}")]
    Api(#[from] ApiError),
    #[error("preview file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a PDF comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    Url(String),
    Blob(Vec<u8>),
}

impl PdfSource {
    /// Identity of the source, used to tell whether a preview must be replaced
    pub fn key(&self) -> String {
        match self {
            PdfSource::Url(url) => url.clone(),
            PdfSource::Blob(bytes) => {
                let mut hasher = DefaultHasher::new();
                bytes.hash(&mut hasher);
                format!("blob:{}:{:016x}", bytes.len(), hasher.finish())
            }
        }
    }
}

#[derive(Debug)]
pub struct PdfPreview {
    key: String,
    len: usize,
    file: NamedTempFile,
}

impl PdfPreview {
    pub fn from_bytes(key: impl Into<String>, bytes: &[u8]) -> Result<Self, PreviewError> {
        let mut file = tempfile::Builder::new()
            .prefix("invoice-preview-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let key = key.into();
        debug!(key = %key, path = %file.path().display(), "acquired PDF preview");
        Ok(Self {
            key,
            len: bytes.len(),
            file,
        })
    }

    pub async fn acquire(api: &dyn InvoiceApi, source: PdfSource) -> Result<Self, PreviewError> {
        let key = source.key();
        match source {
            PdfSource::Url(url) => {
                let bytes = api.fetch_document(&url).await?;
                Self::from_bytes(key, &bytes)
            }
            PdfSource::Blob(bytes) => Self::from_bytes(key, &bytes),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.file.path())
    }

    /// Copy the preview somewhere permanent; the preview itself is still released on drop
    pub fn save_as(&self, dest: &Path) -> Result<(), PreviewError> {
        std::fs::copy(self.file.path(), dest)?;
        Ok(())
    }
}

impl Drop for PdfPreview {
    fn drop(&mut self) {
        debug!(key = %self.key, "released PDF preview");
    }
}

/// Holds at most one preview; loading a different source releases the old one
#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Option<PdfPreview>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PdfPreview> {
        self.current.as_ref()
    }

    /// Show `source`, reusing the current preview when it already holds it.
    ///
    /// A failed acquisition keeps whatever preview was showing before.
    pub async fn load(
        &mut self,
        api: &dyn InvoiceApi,
        source: PdfSource,
    ) -> Result<&PdfPreview, PreviewError> {
        let key = source.key();
        let preview = match self.current.take() {
            Some(preview) if preview.key == key => preview,
            previous => match PdfPreview::acquire(api, source).await {
                Ok(preview) => preview,
                Err(err) => {
                    self.current = previous;
                    return Err(err);
                }
            },
        };
        Ok(&*self.current.insert(preview))
    }

    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&PdfPreview, PreviewError> {
        let key = PdfSource::Blob(bytes.to_vec()).key();
        let preview = match self.current.take() {
            Some(preview) if preview.key == key => preview,
            previous => match PdfPreview::from_bytes(key, bytes) {
                Ok(preview) => preview,
                Err(err) => {
                    self.current = previous;
                    return Err(err);
                }
            },
        };
        Ok(&*self.current.insert(preview))
    }

    pub fn release(&mut self) {
        self.current = None;
    }
}
