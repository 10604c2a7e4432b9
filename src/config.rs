//! Configuration for layout reconstruction and reading sessions.
//!
//! All clustering thresholds live here as named fields with documented
//! defaults. Every struct deserializes from JSON with missing fields falling
//! back to their defaults, so a config file only needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Thresholds for line and paragraph clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum |Δy| (document units) for two fragments to share a line
    /// in the Line Builder.
    pub same_line_tolerance: f32,

    /// Looser same-line tolerance used by the line-level paragraph strategy.
    pub loose_line_tolerance: f32,

    /// Maximum font-size (fragment height) difference for a paragraph merge.
    pub font_size_delta: f32,

    /// Minimum ratio `earlier.width / later.width` for two lines to share a
    /// paragraph.
    pub width_ratio_threshold: f32,

    /// Maximum vertical gap between lines, as a multiple of the later line's
    /// height.
    pub height_multiplier: f32,

    /// Lines ending with fewer words than this close their paragraph.
    pub headline_word_cutoff: usize,

    /// Lines whose width differs from the previous line's by more than this
    /// close their paragraph.
    pub headline_width_tolerance: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            same_line_tolerance: 2.0,
            loose_line_tolerance: 4.0,
            font_size_delta: 1.0,
            width_ratio_threshold: 0.8,
            height_multiplier: 1.5,
            headline_word_cutoff: 5,
            headline_width_tolerance: 2.0,
        }
    }
}

impl LayoutConfig {
    /// Create a layout configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Line Builder's same-line tolerance.
    pub fn with_same_line_tolerance(mut self, tolerance: f32) -> Self {
        self.same_line_tolerance = tolerance;
        self
    }

    /// Set the line-level strategy's same-line tolerance.
    pub fn with_loose_line_tolerance(mut self, tolerance: f32) -> Self {
        self.loose_line_tolerance = tolerance;
        self
    }

    /// Set the maximum font-size delta for merging.
    pub fn with_font_size_delta(mut self, delta: f32) -> Self {
        self.font_size_delta = delta;
        self
    }

    /// Set the column-width ratio threshold.
    pub fn with_width_ratio_threshold(mut self, ratio: f32) -> Self {
        self.width_ratio_threshold = ratio;
        self
    }

    /// Set the line-gap height multiplier.
    pub fn with_height_multiplier(mut self, multiplier: f32) -> Self {
        self.height_multiplier = multiplier;
        self
    }

    /// Set the headline word cutoff.
    pub fn with_headline_word_cutoff(mut self, words: usize) -> Self {
        self.headline_word_cutoff = words;
        self
    }

    /// Set the headline width tolerance.
    pub fn with_headline_width_tolerance(mut self, tolerance: f32) -> Self {
        self.headline_width_tolerance = tolerance;
        self
    }
}

/// Sampling parameters for page-furniture detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FurnitureConfig {
    /// Maximum number of pages sampled.
    pub sample_pages: u32,

    /// A page-number band must occur strictly more often than this.
    pub min_band_occurrences: usize,
}

impl Default for FurnitureConfig {
    fn default() -> Self {
        Self {
            sample_pages: 10,
            min_band_occurrences: 5,
        }
    }
}

/// Which paragraph clustering strategy a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStrategy {
    /// Cluster the filtered fragment stream directly.
    #[default]
    FragmentLevel,
    /// Group fragments into lines first, then lines into paragraphs.
    LineLevel,
}

/// Reading session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Debounce window for page navigation requests, in milliseconds.
    pub page_debounce_ms: u64,

    /// Paragraph clustering strategy.
    pub strategy: ParagraphStrategy,

    /// Raster resolution multiplier handed to the rendering surface.
    pub resolution_multiplier: f32,

    /// Clustering thresholds.
    pub layout: LayoutConfig,

    /// Furniture sampling parameters.
    pub furniture: FurnitureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_debounce_ms: 10,
            strategy: ParagraphStrategy::default(),
            resolution_multiplier: 2.0,
            layout: LayoutConfig::default(),
            furniture: FurnitureConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a session configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the paragraph strategy.
    pub fn with_strategy(mut self, strategy: ParagraphStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the page debounce window.
    pub fn with_page_debounce_ms(mut self, ms: u64) -> Self {
        self.page_debounce_ms = ms;
        self
    }

    /// Replace the clustering thresholds.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_defaults() {
        let c = LayoutConfig::default();
        assert_eq!(c.width_ratio_threshold, 0.8);
        assert_eq!(c.height_multiplier, 1.5);
        assert_eq!(c.headline_word_cutoff, 5);
        assert!(c.loose_line_tolerance > c.same_line_tolerance);
    }

    #[test]
    fn test_builder_methods() {
        let c = LayoutConfig::new()
            .with_width_ratio_threshold(0.5)
            .with_headline_word_cutoff(3);
        assert_eq!(c.width_ratio_threshold, 0.5);
        assert_eq!(c.headline_word_cutoff, 3);
        assert_eq!(c.height_multiplier, 1.5);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{ "strategy": "line_level", "layout": { "height_multiplier": 2.0 } }"#;
        let c = SessionConfig::from_json_str(json).unwrap();
        assert_eq!(c.strategy, ParagraphStrategy::LineLevel);
        assert_eq!(c.layout.height_multiplier, 2.0);
        assert_eq!(c.layout.width_ratio_threshold, 0.8);
        assert_eq!(c.page_debounce_ms, 10);
        assert_eq!(c.furniture.sample_pages, 10);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(SessionConfig::from_json_str("{ not json").is_err());
    }
}
