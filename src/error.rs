//! Error types for the narrator library.
//!
//! This module defines all error types that can occur while loading documents,
//! building page layouts, and driving the reading session.

/// Result type alias for narrator library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction and narration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation that needs a loaded document was called before loading finished
    #[error("No document loaded")]
    NotLoaded,

    /// Requested page does not exist in the loaded document
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Requested page (1-based)
        page: u32,
        /// Number of pages in the document
        page_count: u32,
    },

    /// Requested paragraph does not exist on the page
    #[error("Paragraph {index} out of range on page {page} ({count} paragraphs)")]
    ParagraphOutOfRange {
        /// Page the paragraph was requested on (1-based)
        page: u32,
        /// Requested paragraph index
        index: usize,
        /// Number of paragraphs on the page
        count: usize,
    },

    /// The extraction provider failed to deliver page text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The durable store rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// The narration engine could not speak (e.g. no voice available)
    #[error("Narration error: {0}")]
    Narration(String),

    /// The rendering surface failed to paint a page
    #[error("Render error: {0}")]
    Render(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
