//! The page currently on screen and its paragraphs.

use crate::geometry::Rect;
use crate::layout::{FragmentId, PageText, Paragraph};

/// Owned snapshot of a detected paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphSummary {
    /// Narration text
    pub text: String,
    /// Member fragments in reading order
    pub fragment_ids: Vec<FragmentId>,
    /// Bounding box in document space
    pub bbox: Rect,
}

impl From<&Paragraph<'_>> for ParagraphSummary {
    fn from(paragraph: &Paragraph<'_>) -> Self {
        Self {
            text: paragraph.full_text().to_string(),
            fragment_ids: paragraph.fragment_ids(),
            bbox: paragraph.bbox(),
        }
    }
}

/// Extracted text and paragraphs of the displayed page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 1-based page
    pub page: u32,
    /// Extracted fragments
    pub text: PageText,
    /// Paragraphs in reading order
    pub paragraphs: Vec<ParagraphSummary>,
}

impl PageLayout {
    /// Index of the paragraph containing a fragment.
    pub fn paragraph_of(&self, fragment: FragmentId) -> Option<usize> {
        self.paragraphs
            .iter()
            .position(|p| p.fragment_ids.contains(&fragment))
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }
}
