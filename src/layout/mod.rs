//! Layout reconstruction for pre-extracted page text.
//!
//! This module turns a flat stream of positioned fragments into reading order:
//! - Furniture pre-filter (running page-number band)
//! - Line clustering by vertical proximity
//! - Paragraph clustering (fragment-level or line-level strategy)
//! - Projection of fragment boxes onto the overlay layer

pub mod fragment;
pub mod furniture;
pub mod line;
pub mod paragraph;
pub mod projection;

// Re-export main types
pub use fragment::{FragmentId, PageText, TextFragment};
pub use furniture::{FurnitureDetector, FurniturePredicate};
pub use line::{Line, LineBuilder};
pub use paragraph::{
    create_builder, FragmentParagraphBuilder, LineParagraphBuilder, Paragraph, ParagraphBuilder,
};
pub use projection::{
    fit_text_transform, project_rect, text_transform, unproject_rect, CoordinateProjector,
    OverlayBox, OverlayHandle, OverlaySurface, Viewport,
};
