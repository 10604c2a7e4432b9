//! Furniture pre-filter: detects the running page-number band.
//!
//! A handful of pages starting about a quarter into the document are sampled.
//! Purely numeric fragments are bucketed by their rounded origin y; when one
//! bucket recurs often enough it is taken as the page-number band and every
//! fragment on its far side of the page is rejected.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::FurnitureConfig;
use crate::document::TextSource;
use crate::error::Result;
use crate::layout::fragment::{PageText, TextFragment};

/// Inclusion predicate compiled once per document.
///
/// Bands are rounded document-space y coordinates (y grows upward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "band", rename_all = "snake_case")]
pub enum FurniturePredicate {
    /// No band detected; every fragment is content.
    #[default]
    AcceptAll,
    /// Page numbers sit at the bottom: keep fragments strictly above the band.
    KeepAbove(i64),
    /// Page numbers sit at the top: keep fragments strictly below the band.
    KeepBelow(i64),
}

impl FurniturePredicate {
    /// A predicate that accepts every fragment.
    pub fn accept_all() -> Self {
        Self::AcceptAll
    }

    /// Whether the fragment is page content (not furniture).
    pub fn accepts(&self, fragment: &TextFragment) -> bool {
        match *self {
            Self::AcceptAll => true,
            Self::KeepAbove(band) => fragment.rounded_y() > band,
            Self::KeepBelow(band) => fragment.rounded_y() < band,
        }
    }

    /// The detected band, if any.
    pub fn band(&self) -> Option<i64> {
        match *self {
            Self::AcceptAll => None,
            Self::KeepAbove(band) | Self::KeepBelow(band) => Some(band),
        }
    }
}

fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Samples pages and compiles a [`FurniturePredicate`].
#[derive(Debug, Clone, Default)]
pub struct FurnitureDetector {
    config: FurnitureConfig,
}

impl FurnitureDetector {
    /// Create a detector with the given sampling parameters.
    pub fn new(config: FurnitureConfig) -> Self {
        Self { config }
    }

    /// The 1-based pages sampled for a document of `page_count` pages.
    ///
    /// Sampling starts at `round(page_count / 4) + 1` and covers at most
    /// `sample_pages` pages, never running past the last page.
    pub fn sample_pages(&self, page_count: u32) -> std::ops::RangeInclusive<u32> {
        let offset = (page_count as f32 / 4.0).round() as u32;
        let first = offset + 1;
        let last = offset.saturating_add(self.config.sample_pages).min(page_count);
        first..=last
    }

    /// Sample the document and compile its predicate.
    pub fn detect<S: TextSource + ?Sized>(&self, source: &S) -> Result<FurniturePredicate> {
        let page_count = source.page_count();
        let mut pages = Vec::new();
        for page in self.sample_pages(page_count) {
            pages.push(source.page_text(page)?);
        }
        Ok(self.from_pages(&pages))
    }

    /// Compile a predicate from already-extracted sample pages.
    pub fn from_pages<'a>(
        &self,
        pages: impl IntoIterator<Item = &'a PageText>,
    ) -> FurniturePredicate {
        let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
        let mut max_y = 0.0f32;
        let mut sampled = 0usize;

        for page in pages {
            sampled += 1;
            for fragment in &page.fragments {
                if fragment.is_blank() || fragment.is_vertical || !fragment.has_valid_geometry() {
                    continue;
                }
                if is_numeric(&fragment.content) {
                    *buckets.entry(fragment.rounded_y()).or_insert(0) += 1;
                }
                max_y = max_y.max(fragment.origin_y);
            }
        }

        // Ties resolve to the lowest coordinate
        let mut best: Option<(i64, usize)> = None;
        for (&y, &count) in &buckets {
            match best {
                Some((_, best_count)) if count <= best_count => {},
                _ => best = Some((y, count)),
            }
        }

        let predicate = match best {
            Some((band, count)) if count > self.config.min_band_occurrences => {
                if (band as f32) < max_y / 2.0 {
                    FurniturePredicate::KeepAbove(band)
                } else {
                    FurniturePredicate::KeepBelow(band)
                }
            },
            _ => FurniturePredicate::AcceptAll,
        };

        debug!(
            "Furniture sampling: {} pages, {} numeric buckets, max y {:.1}",
            sampled,
            buckets.len(),
            max_y
        );
        info!("Furniture predicate: {:?}", predicate);
        predicate
    }
}
