//! Reading cursor and session state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A (page, paragraph) position. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadingCursor {
    /// 1-based page
    pub page: u32,
    /// Paragraph index on the page
    pub paragraph: usize,
}

impl ReadingCursor {
    /// Create a cursor.
    pub fn new(page: u32, paragraph: usize) -> Self {
        Self { page, paragraph }
    }

    /// The position after this one.
    ///
    /// `paragraph_count` is the number of paragraphs on the cursor's page.
    /// Past the last paragraph the cursor moves to paragraph 0 of the next
    /// page; past the last page there is no next position.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::reader::ReadingCursor;
    ///
    /// let cursor = ReadingCursor::new(3, 4);
    /// assert_eq!(cursor.next(5, 10), Some(ReadingCursor::new(4, 0)));
    /// assert_eq!(cursor.next(6, 10), Some(ReadingCursor::new(3, 5)));
    /// assert_eq!(ReadingCursor::new(10, 0).next(1, 10), None);
    /// ```
    pub fn next(self, paragraph_count: usize, page_count: u32) -> Option<Self> {
        if self.paragraph + 1 < paragraph_count {
            Some(Self::new(self.page, self.paragraph + 1))
        } else if self.page < page_count {
            Some(Self::new(self.page + 1, 0))
        } else {
            None
        }
    }
}

impl fmt::Display for ReadingCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} paragraph {}", self.page, self.paragraph)
    }
}

/// State of a reading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderState {
    /// Nothing is being narrated.
    #[default]
    Idle,
    /// Narrating the paragraph at the cursor.
    Narrating(ReadingCursor),
    /// Narration paused by the user; the highlight stays.
    PausedManual(ReadingCursor),
}

impl ReaderState {
    /// Cursor of an active or paused narration.
    pub fn cursor(&self) -> Option<ReadingCursor> {
        match self {
            ReaderState::Idle => None,
            ReaderState::Narrating(cursor) | ReaderState::PausedManual(cursor) => Some(*cursor),
        }
    }

    /// Whether narration is running.
    pub fn is_narrating(&self) -> bool {
        matches!(self, ReaderState::Narrating(_))
    }

    /// Whether narration is paused.
    pub fn is_paused(&self) -> bool {
        matches!(self, ReaderState::PausedManual(_))
    }
}
