//! Positioned text fragments as delivered by the extraction provider.

use serde::{Deserialize, Serialize};

use crate::geometry::{Matrix, Rect};

/// Identity of a fragment within its page (its position in extraction order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(pub u32);

/// One positioned run of extracted text.
///
/// Coordinates are in document space (origin bottom-left, `y` grows upward).
/// Fragments are never mutated after extraction; lines and paragraphs borrow
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Position in the page's extraction order
    #[serde(default)]
    pub id: FragmentId,
    /// Text content
    pub content: String,
    /// Baseline origin x
    pub origin_x: f32,
    /// Baseline origin y
    pub origin_y: f32,
    /// Advance width
    pub width: f32,
    /// Glyph height (used as font size)
    pub height: f32,
    /// Font resource identifier
    #[serde(default)]
    pub font_id: String,
    /// True when the horizontal scale component of the text matrix is zero
    #[serde(default)]
    pub is_vertical: bool,
    /// True when the extractor marked an explicit end of line after this run
    #[serde(default)]
    pub ends_line: bool,
}

impl TextFragment {
    /// Create a horizontal fragment.
    pub fn new(
        content: impl Into<String>,
        origin_x: f32,
        origin_y: f32,
        width: f32,
        height: f32,
        font_id: impl Into<String>,
    ) -> Self {
        Self {
            id: FragmentId::default(),
            content: content.into(),
            origin_x,
            origin_y,
            width,
            height,
            font_id: font_id.into(),
            is_vertical: false,
            ends_line: false,
        }
    }

    /// Create a fragment from an extractor's text matrix.
    ///
    /// The origin is the matrix translation; the fragment is vertical when
    /// the horizontal scale component `a` is zero.
    pub fn from_matrix(
        content: impl Into<String>,
        matrix: &Matrix,
        width: f32,
        height: f32,
        font_id: impl Into<String>,
    ) -> Self {
        let mut fragment = Self::new(content, matrix.e, matrix.f, width, height, font_id);
        fragment.is_vertical = matrix.a == 0.0;
        fragment
    }

    /// Mark this fragment as ending its line.
    pub fn with_line_end(mut self, ends_line: bool) -> Self {
        self.ends_line = ends_line;
        self
    }

    /// Mark this fragment as vertical writing.
    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.is_vertical = vertical;
        self
    }

    /// Whether the content is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether all geometry is finite with non-negative extents.
    pub fn has_valid_geometry(&self) -> bool {
        self.origin_x.is_finite()
            && self.origin_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Document-space bounding box, from the baseline upward.
    pub fn bbox(&self) -> Rect {
        Rect::new(self.origin_x, self.origin_y, self.width, self.height)
    }

    /// Origin y rounded to the nearest whole unit.
    pub fn rounded_y(&self) -> i64 {
        self.origin_y.round() as i64
    }
}

/// All fragments of one page plus its nominal (unscaled) size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPageText")]
pub struct PageText {
    /// Nominal page width in document units
    pub width: f32,
    /// Nominal page height in document units
    pub height: f32,
    /// Fragments in extraction order; `fragments[i].id == FragmentId(i)`
    pub fragments: Vec<TextFragment>,
}

#[derive(Deserialize)]
struct RawPageText {
    width: f32,
    height: f32,
    #[serde(default)]
    fragments: Vec<TextFragment>,
}

impl From<RawPageText> for PageText {
    fn from(raw: RawPageText) -> Self {
        PageText::new(raw.width, raw.height, raw.fragments)
    }
}

impl PageText {
    /// Create page text, numbering fragments by their extraction order.
    pub fn new(width: f32, height: f32, mut fragments: Vec<TextFragment>) -> Self {
        for (i, fragment) in fragments.iter_mut().enumerate() {
            fragment.id = FragmentId(i as u32);
        }
        Self {
            width,
            height,
            fragments,
        }
    }

    /// Look up a fragment by id.
    pub fn fragment(&self, id: FragmentId) -> Option<&TextFragment> {
        self.fragments.get(id.0 as usize)
    }
}
