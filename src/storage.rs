//! Durable store for the document library and reading progress.
//!
//! Exactly one [`ReadingProgress`] exists per registered document. It is
//! created by [`ProgressStore::add_document`] and removed only together with
//! its document.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, DocumentRecord};
use crate::error::{Error, Result};

/// Persisted reading position of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingProgress {
    /// Content hash of the document
    pub document_id: DocumentId,
    /// 1-based page; 0 in a fresh record
    pub page_index: u32,
    /// Paragraph index on that page
    pub paragraph_index: usize,
}

impl ReadingProgress {
    /// Zero-initialized progress for a document.
    pub fn zero(document_id: DocumentId) -> Self {
        Self {
            document_id,
            page_index: 0,
            paragraph_index: 0,
        }
    }

    /// Progress at a position.
    pub fn at(document_id: DocumentId, page_index: u32, paragraph_index: usize) -> Self {
        Self {
            document_id,
            page_index,
            paragraph_index,
        }
    }

    /// Page to resume on; a fresh record resumes on page 1.
    pub fn resume_page(&self) -> u32 {
        self.page_index.max(1)
    }
}

/// Key-value persistence keyed by document identity.
pub trait ProgressStore {
    /// Register a document and create its zero progress record.
    ///
    /// Re-adding a known document refreshes its record and keeps its progress.
    fn add_document(&mut self, record: DocumentRecord) -> Result<()>;

    /// Progress for a document; unknown ids yield a zero record.
    fn get_progress(&self, id: &DocumentId) -> Result<ReadingProgress>;

    /// Overwrite a document's progress.
    fn put_progress(&mut self, progress: ReadingProgress) -> Result<()>;

    /// Registered documents in insertion order.
    fn list_documents(&self) -> Result<Vec<DocumentRecord>>;

    /// Remove a document and its progress. Returns whether it existed.
    fn delete_document(&mut self, id: &DocumentId) -> Result<bool>;
}

/// Store contents, shared by both backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Library {
    #[serde(default)]
    documents: IndexMap<DocumentId, DocumentRecord>,
    #[serde(default)]
    progress: IndexMap<DocumentId, ReadingProgress>,
}

impl Library {
    fn add_document(&mut self, record: DocumentRecord) {
        let id = record.id.clone();
        self.progress
            .entry(id.clone())
            .or_insert_with(|| ReadingProgress::zero(id.clone()));
        self.documents.insert(id, record);
    }

    fn get_progress(&self, id: &DocumentId) -> ReadingProgress {
        self.progress
            .get(id)
            .cloned()
            .unwrap_or_else(|| ReadingProgress::zero(id.clone()))
    }

    fn put_progress(&mut self, progress: ReadingProgress) {
        self.progress.insert(progress.document_id.clone(), progress);
    }

    fn delete_document(&mut self, id: &DocumentId) -> bool {
        let had_progress = self.progress.shift_remove(id).is_some();
        self.documents.shift_remove(id).is_some() || had_progress
    }
}

/// Volatile store, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    library: Library,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn add_document(&mut self, record: DocumentRecord) -> Result<()> {
        self.library.add_document(record);
        Ok(())
    }

    fn get_progress(&self, id: &DocumentId) -> Result<ReadingProgress> {
        Ok(self.library.get_progress(id))
    }

    fn put_progress(&mut self, progress: ReadingProgress) -> Result<()> {
        self.library.put_progress(progress);
        Ok(())
    }

    fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        Ok(self.library.documents.values().cloned().collect())
    }

    fn delete_document(&mut self, id: &DocumentId) -> Result<bool> {
        Ok(self.library.delete_document(id))
    }
}

/// Store persisted as a single JSON file, rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    library: Library,
}

impl JsonFileStore {
    /// Open a store file, starting empty when it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let library = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)
                .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?
        } else {
            Library::default()
        };
        info!(
            "Opened progress store {} ({} documents)",
            path.display(),
            library.documents.len()
        );
        Ok(Self { path, library })
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.library)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Flushed progress store to {}", self.path.display());
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn add_document(&mut self, record: DocumentRecord) -> Result<()> {
        self.library.add_document(record);
        self.flush()
    }

    fn get_progress(&self, id: &DocumentId) -> Result<ReadingProgress> {
        Ok(self.library.get_progress(id))
    }

    fn put_progress(&mut self, progress: ReadingProgress) -> Result<()> {
        self.library.put_progress(progress);
        self.flush()
    }

    fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        Ok(self.library.documents.values().cloned().collect())
    }

    fn delete_document(&mut self, id: &DocumentId) -> Result<bool> {
        let existed = self.library.delete_document(id);
        if existed {
            self.flush()?;
        }
        Ok(existed)
    }
}
