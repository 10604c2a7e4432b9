// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Narrator
//!
//! Reading-order reconstruction and read-aloud sessions for pre-extracted PDF text.
//!
//! ## Core Features
//!
//! ### Layout
//! - **Furniture Filter**: detects the running page-number band from sampled pages
//! - **Line Builder**: groups positioned fragments sharing a baseline
//! - **Paragraph Builder**: 2 pluggable strategies (fragment-level, line-level)
//!   with de-hyphenation and headline detection
//! - **Coordinate Projector**: maps document-space boxes onto a top-down overlay
//!
//! ### Reading
//! - **Reading Session**: explicit state machine over `(page, paragraph)` with
//!   self-chaining narration, pause/resume, and manual selection
//! - **Highlighting**: every paragraph up to the active one is marked read
//! - **Progress**: persisted per document, keyed by a content hash
//!
//! ## Architecture
//! - **Injected Collaborators**: extraction, rendering, narration, and storage are traits
//! - **Borrowed Layout**: lines and paragraphs reference fragments, never copy them
//!
//! ## Quick Start
//!
//! ```
//! use pdf_narrator::config::LayoutConfig;
//! use pdf_narrator::layout::{create_builder, FurniturePredicate, TextFragment};
//! use pdf_narrator::config::ParagraphStrategy;
//!
//! let fragments = vec![
//!     TextFragment::new("Hel-", 72.0, 100.0, 20.0, 10.0, "F1"),
//!     TextFragment::new("lo world.", 92.0, 100.05, 45.0, 10.0, "F1"),
//! ];
//! let builder = create_builder(ParagraphStrategy::FragmentLevel, &LayoutConfig::default());
//! let paragraphs = builder.build(&fragments, &FurniturePredicate::accept_all());
//! assert_eq!(paragraphs[0].full_text(), "Hello world.");
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry primitives
pub mod geometry;

// Layout reconstruction
pub mod layout;

// Collaborator seams
pub mod document;
pub mod narration;
pub mod storage;

// Reading sessions
pub mod reader;

// Re-exports
pub use config::{LayoutConfig, ParagraphStrategy, SessionConfig};
pub use document::{DocumentId, DocumentRecord, InMemoryDocument, TextSource};
pub use error::{Error, Result};
pub use reader::{ReaderEvent, ReaderState, ReadingCursor, ReadingSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
