//! Document identity and the extraction-provider seam.
//!
//! The crate never parses document bytes. Page text arrives through a
//! [`TextSource`]; the bytes themselves are only hashed into a [`DocumentId`].

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::FurnitureConfig;
use crate::error::{Error, Result};
use crate::layout::{FurnitureDetector, FurniturePredicate, PageText};

/// Content-derived document identity (URL-safe base64 of a SHA-256 digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Hash raw document bytes into an identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::document::DocumentId;
    ///
    /// let a = DocumentId::from_bytes(b"%PDF-1.7 ...");
    /// let b = DocumentId::from_bytes(b"%PDF-1.7 ...");
    /// assert_eq!(a, b);
    /// assert!(!a.as_str().contains('+') && !a.as_str().contains('='));
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Wrap an identity computed elsewhere.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extraction provider: delivers ordered page fragments.
///
/// Pages are 1-based.
pub trait TextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Fragments and nominal size of a page.
    fn page_text(&self, page: u32) -> Result<PageText>;

    /// Title from document metadata, if any.
    fn title(&self) -> Option<String> {
        None
    }
}

impl<T: TextSource + ?Sized> TextSource for Box<T> {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page_text(&self, page: u32) -> Result<PageText> {
        (**self).page_text(page)
    }

    fn title(&self) -> Option<String> {
        (**self).title()
    }
}

/// A document whose pages were extracted ahead of time, e.g. into JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryDocument {
    /// Metadata title
    #[serde(default)]
    pub title: Option<String>,
    /// Pages in order
    pub pages: Vec<PageText>,
}

impl InMemoryDocument {
    /// Create a document from its pages.
    pub fn new(pages: Vec<PageText>) -> Self {
        Self { title: None, pages }
    }

    /// Set the metadata title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse a fragment dump.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a fragment dump from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl TextSource for InMemoryDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<PageText> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .cloned()
            .ok_or(Error::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

/// Library entry for a registered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Content hash
    pub id: DocumentId,
    /// Display title
    pub title: String,
    /// Number of pages
    pub page_count: u32,
}

impl DocumentRecord {
    /// Describe a document, falling back to `file_name` when it has no title.
    pub fn describe<S: TextSource + ?Sized>(id: DocumentId, source: &S, file_name: &str) -> Self {
        let title = source
            .title()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file_name.to_string());
        Self {
            id,
            title,
            page_count: source.page_count(),
        }
    }
}

/// A document ready for page access, with its furniture predicate compiled.
#[derive(Debug)]
pub struct LoadedDocument<S> {
    id: DocumentId,
    source: S,
    predicate: FurniturePredicate,
}

impl<S: TextSource> LoadedDocument<S> {
    /// Load a document, sampling it once for page furniture.
    pub fn load(id: DocumentId, source: S, furniture: &FurnitureConfig) -> Result<Self> {
        let predicate = FurnitureDetector::new(furniture.clone()).detect(&source)?;
        info!(
            "Loaded document {} ({} pages, furniture {:?})",
            id,
            source.page_count(),
            predicate
        );
        Ok(Self {
            id,
            source,
            predicate,
        })
    }

    /// Document identity.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.source.page_count()
    }

    /// The compiled furniture predicate.
    pub fn predicate(&self) -> &FurniturePredicate {
        &self.predicate
    }

    /// Page text for a 1-based page, range-checked.
    pub fn page_text(&self, page: u32) -> Result<PageText> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(Error::PageOutOfRange { page, page_count });
        }
        self.source.page_text(page)
    }
}
