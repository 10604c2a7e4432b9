//! Line Builder: clusters fragments that share a baseline.
//!
//! Lines are formed in extraction order. A retained fragment joins the open
//! line when its origin y is within a fixed tolerance of the previously
//! retained fragment; otherwise the open line is closed and a new one begins.
//! The tolerance does not scale with font size.

use log::debug;

use crate::geometry::Rect;
use crate::layout::furniture::FurniturePredicate;
use crate::layout::fragment::TextFragment;
use crate::layout::paragraph::append_joined;

/// A non-empty run of fragments believed to share a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line<'a> {
    fragments: Vec<&'a TextFragment>,
    bbox: Rect,
}

impl<'a> Line<'a> {
    /// Start a line with its first fragment.
    pub fn new(first: &'a TextFragment) -> Self {
        Self {
            fragments: vec![first],
            bbox: first.bbox(),
        }
    }

    /// Append a fragment and grow the bounding box.
    pub fn add(&mut self, fragment: &'a TextFragment) {
        self.bbox = self.bbox.union(&fragment.bbox());
        self.fragments.push(fragment);
    }

    /// Member fragments in order.
    pub fn fragments(&self) -> &[&'a TextFragment] {
        &self.fragments
    }

    /// Union of the member fragments' boxes.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Width of the line's bounding box.
    pub fn width(&self) -> f32 {
        self.bbox.width
    }

    /// Line text with the paragraph join rules applied between fragments.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for fragment in &self.fragments {
            append_joined(&mut text, &fragment.content);
        }
        text
    }
}

/// Groups a page's fragment stream into lines.
#[derive(Debug, Clone)]
pub struct LineBuilder {
    tolerance: f32,
}

impl LineBuilder {
    /// Create a line builder with the given same-line tolerance.
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// Build lines from fragments in extraction order.
    ///
    /// Blank fragments, fragments with malformed geometry, and fragments the
    /// furniture predicate rejects are skipped. An empty input yields no lines.
    pub fn build<'a>(
        &self,
        fragments: &'a [TextFragment],
        filter: &FurniturePredicate,
    ) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        let mut current: Option<Line<'a>> = None;
        let mut previous_y: Option<f32> = None;

        for fragment in retained(fragments, filter) {
            match (current.as_mut(), previous_y) {
                (Some(line), Some(prev)) if (fragment.origin_y - prev).abs() <= self.tolerance => {
                    line.add(fragment);
                },
                _ => {
                    if let Some(done) = current.take() {
                        lines.push(done);
                    }
                    current = Some(Line::new(fragment));
                },
            }
            previous_y = Some(fragment.origin_y);
        }

        if let Some(done) = current {
            lines.push(done);
        }

        debug!("Built {} lines from {} fragments", lines.len(), fragments.len());
        lines
    }
}

/// Fragments that survive blank, geometry, and furniture filtering.
pub(crate) fn retained<'a, 'f>(
    fragments: &'a [TextFragment],
    filter: &'f FurniturePredicate,
) -> impl Iterator<Item = &'a TextFragment> + 'f
where
    'a: 'f,
{
    fragments.iter().filter(move |fragment| {
        if fragment.is_blank() {
            return false;
        }
        if !fragment.has_valid_geometry() {
            debug!("Skipping fragment {:?} with malformed geometry", fragment.id);
            return false;
        }
        filter.accepts(fragment)
    })
}
