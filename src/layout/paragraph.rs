//! Paragraph Builder: clusters fragments or lines into paragraphs.
//!
//! Two strategies implement [`ParagraphBuilder`]:
//!
//! - [`FragmentParagraphBuilder`]: walks the filtered fragment stream and
//!   decides per fragment whether it continues the open paragraph.
//! - [`LineParagraphBuilder`]: groups fragments into lines with a loose
//!   tolerance, then merges consecutive lines with similar width and spacing.
//!
//! Both join text the same way: a trailing `-` on the accumulated text is
//! dropped before the next piece (de-hyphenation), otherwise a single space is
//! inserted unless the paragraph is still empty. Emitted text is trimmed at
//! the ends only.

use log::{debug, trace};

use crate::config::{LayoutConfig, ParagraphStrategy};
use crate::geometry::Rect;
use crate::layout::fragment::{FragmentId, TextFragment};
use crate::layout::furniture::FurniturePredicate;
use crate::layout::line::{retained, Line, LineBuilder};

/// Glyphs that mark a list item and therefore start a new paragraph.
const BULLET_GLYPHS: &[char] = &[
    '•', '●', '○', '◦', '▪', '▫', '■', '□', '‣', '⁃', '∙', '·',
];

/// Append `piece` to `text` using the paragraph join rules.
pub fn append_joined(text: &mut String, piece: &str) {
    if text.ends_with('-') {
        text.pop();
    } else if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(piece);
}

fn starts_with_bullet(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| BULLET_GLYPHS.contains(&c))
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// An ordered, non-empty group of fragments read as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph<'a> {
    fragments: Vec<&'a TextFragment>,
    lines: Vec<Line<'a>>,
    full_text: String,
    bbox: Rect,
}

impl<'a> Paragraph<'a> {
    /// Trimmed paragraph text after de-hyphenation and space insertion.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Member fragments in reading order.
    pub fn fragments(&self) -> &[&'a TextFragment] {
        &self.fragments
    }

    /// Member lines; empty when built by the fragment-level strategy.
    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Ids of the member fragments, in order.
    pub fn fragment_ids(&self) -> Vec<FragmentId> {
        self.fragments.iter().map(|f| f.id).collect()
    }

    /// Union of the member fragments' boxes (document space).
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Re-concatenate member text with the join rules used during construction.
    pub fn rebuild_text(&self) -> String {
        let mut text = String::new();
        for fragment in &self.fragments {
            append_joined(&mut text, &fragment.content);
        }
        text.trim().to_string()
    }
}

/// Open paragraph state while a strategy walks its input.
#[derive(Default)]
struct ParagraphAccumulator<'a> {
    fragments: Vec<&'a TextFragment>,
    lines: Vec<Line<'a>>,
    text: String,
    bbox: Option<Rect>,
}

impl<'a> ParagraphAccumulator<'a> {
    fn push_fragment(&mut self, fragment: &'a TextFragment) {
        append_joined(&mut self.text, &fragment.content);
        let bbox = fragment.bbox();
        self.bbox = Some(match self.bbox {
            Some(current) => current.union(&bbox),
            None => bbox,
        });
        self.fragments.push(fragment);
    }

    fn push_line(&mut self, line: Line<'a>) {
        for &fragment in line.fragments() {
            self.push_fragment(fragment);
        }
        self.lines.push(line);
    }

    /// Close the paragraph, emitting it when its trimmed text is non-empty.
    fn close_into(self, out: &mut Vec<Paragraph<'a>>) {
        let full_text = self.text.trim();
        if full_text.is_empty() {
            return;
        }
        if let Some(bbox) = self.bbox {
            trace!("Closed paragraph {}: {:?}", out.len(), full_text);
            out.push(Paragraph {
                full_text: full_text.to_string(),
                fragments: self.fragments,
                lines: self.lines,
                bbox,
            });
        }
    }
}

/// A paragraph clustering strategy.
pub trait ParagraphBuilder: Send + Sync {
    /// Cluster a page's fragments into paragraphs.
    ///
    /// Fragments arrive in extraction order; the furniture predicate is
    /// applied before clustering. Paragraphs come out in the order of their
    /// first fragment.
    fn build<'a>(
        &self,
        fragments: &'a [TextFragment],
        filter: &FurniturePredicate,
    ) -> Vec<Paragraph<'a>>;

    /// Return the name of this strategy for debugging.
    fn name(&self) -> &'static str;
}

/// Create a paragraph builder for the configured strategy.
pub fn create_builder(
    strategy: ParagraphStrategy,
    config: &LayoutConfig,
) -> Box<dyn ParagraphBuilder> {
    match strategy {
        ParagraphStrategy::FragmentLevel => Box::new(FragmentParagraphBuilder::new(config.clone())),
        ParagraphStrategy::LineLevel => Box::new(LineParagraphBuilder::new(config.clone())),
    }
}

/// Fragment-level paragraph strategy.
///
/// A fragment continues the open paragraph when it belongs to the same block
/// as its predecessor (same font and identical origin x), or when it sits
/// within one predecessor-height of it with a near-identical font size and
/// does not open with a bullet glyph.
///
/// Independently, every explicit line end is a chance to force-close the
/// paragraph: short lines and lines whose width diverges from the previous
/// line's are treated as headlines. A line's words and width are counted
/// from the fragments since the last line end, paragraph break, or vertical
/// jump beyond `same_line_tolerance`.
#[derive(Debug, Clone, Default)]
pub struct FragmentParagraphBuilder {
    config: LayoutConfig,
}

impl FragmentParagraphBuilder {
    /// Create a fragment-level builder.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn continues(&self, previous: &TextFragment, current: &TextFragment) -> bool {
        let same_block =
            current.font_id == previous.font_id && current.origin_x == previous.origin_x;
        if same_block {
            return true;
        }
        let vertical_gap = (current.origin_y - previous.origin_y).abs() - previous.height;
        let font_size_delta = (current.height - previous.height).abs();
        vertical_gap < previous.height
            && font_size_delta < self.config.font_size_delta
            && !starts_with_bullet(&current.content)
    }

    fn is_headline(&self, width: f32, words: usize, previous_width: Option<f32>) -> bool {
        let short = words < self.config.headline_word_cutoff;
        let diverges = previous_width
            .is_some_and(|prev| (prev - width).abs() > self.config.headline_width_tolerance);
        short || diverges
    }
}

impl ParagraphBuilder for FragmentParagraphBuilder {
    fn build<'a>(
        &self,
        fragments: &'a [TextFragment],
        filter: &FurniturePredicate,
    ) -> Vec<Paragraph<'a>> {
        let mut paragraphs = Vec::new();
        let mut current = ParagraphAccumulator::default();
        let mut previous: Option<&'a TextFragment> = None;

        let mut line_bbox: Option<Rect> = None;
        let mut line_words = 0usize;
        let mut previous_line_width: Option<f32> = None;

        for fragment in retained(fragments, filter) {
            if let Some(prev) = previous {
                if !self.continues(prev, fragment) {
                    std::mem::take(&mut current).close_into(&mut paragraphs);
                    previous_line_width = None;
                    line_bbox = None;
                    line_words = 0;
                } else if (fragment.origin_y - prev.origin_y).abs()
                    > self.config.same_line_tolerance
                {
                    // New visual line without an explicit line end
                    line_bbox = None;
                    line_words = 0;
                }
            }
            current.push_fragment(fragment);
            previous = Some(fragment);

            let bbox = fragment.bbox();
            line_bbox = Some(line_bbox.map_or(bbox, |b| b.union(&bbox)));
            line_words += word_count(&fragment.content);

            if fragment.ends_line {
                let width = line_bbox.map_or(0.0, |b| b.width);
                if self.is_headline(width, line_words, previous_line_width) {
                    std::mem::take(&mut current).close_into(&mut paragraphs);
                    previous_line_width = None;
                } else {
                    previous_line_width = Some(width);
                }
                line_bbox = None;
                line_words = 0;
            }
        }
        current.close_into(&mut paragraphs);

        debug!(
            "{}: {} paragraphs from {} fragments",
            self.name(),
            paragraphs.len(),
            fragments.len()
        );
        paragraphs
    }

    fn name(&self) -> &'static str {
        "FragmentLevel"
    }
}

/// Line-level paragraph strategy.
///
/// Lines are built with the loose same-line tolerance. Consecutive lines
/// merge when the gap between their boxes is at most `height_multiplier`
/// times the later line's height and `earlier.width / later.width` exceeds
/// `width_ratio_threshold`. A narrower closing line is accepted; a narrow
/// line followed by a much wider one is not.
#[derive(Debug, Clone, Default)]
pub struct LineParagraphBuilder {
    config: LayoutConfig,
}

impl LineParagraphBuilder {
    /// Create a line-level builder.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Whether `later` continues the paragraph that `earlier` belongs to.
    pub fn continues(&self, earlier: &Rect, later: &Rect) -> bool {
        let gap = earlier.vertical_gap(later);
        let close_enough = gap <= self.config.height_multiplier * later.height;
        let width_ratio = if later.width > 0.0 {
            earlier.width / later.width
        } else {
            f32::INFINITY
        };
        close_enough && width_ratio > self.config.width_ratio_threshold
    }

    /// Group pre-built lines into paragraphs.
    pub fn group_lines<'a>(&self, lines: Vec<Line<'a>>) -> Vec<Paragraph<'a>> {
        let mut paragraphs = Vec::new();
        let mut lines = lines.into_iter();
        let Some(first) = lines.next() else {
            return paragraphs;
        };

        let mut previous_bbox = first.bbox();
        let mut current = ParagraphAccumulator::default();
        current.push_line(first);

        for line in lines {
            let bbox = line.bbox();
            if !self.continues(&previous_bbox, &bbox) {
                std::mem::take(&mut current).close_into(&mut paragraphs);
            }
            current.push_line(line);
            previous_bbox = bbox;
        }
        current.close_into(&mut paragraphs);
        paragraphs
    }
}

impl ParagraphBuilder for LineParagraphBuilder {
    fn build<'a>(
        &self,
        fragments: &'a [TextFragment],
        filter: &FurniturePredicate,
    ) -> Vec<Paragraph<'a>> {
        let lines = LineBuilder::new(self.config.loose_line_tolerance).build(fragments, filter);
        let line_count = lines.len();
        let paragraphs = self.group_lines(lines);
        debug!(
            "{}: {} paragraphs from {} lines",
            self.name(),
            paragraphs.len(),
            line_count
        );
        paragraphs
    }

    fn name(&self) -> &'static str {
        "LineLevel"
    }
}
