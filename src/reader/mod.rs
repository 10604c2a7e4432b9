//! Reading sessions: cursor, navigation, highlighting, and narration chaining.

pub mod cursor;
pub mod debounce;
pub mod page;
pub mod session;
pub mod surface;

pub use cursor::{ReaderState, ReadingCursor};
pub use debounce::PageDebouncer;
pub use page::{PageLayout, ParagraphSummary};
pub use session::{ReaderEvent, ReadingSession};
pub use surface::{Fill, RenderRequest, RenderSurface};
