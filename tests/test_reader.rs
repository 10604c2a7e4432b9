//! Integration tests for reading sessions.
//!
//! A mock rendering surface, narration engine, and store stand in for the
//! collaborators so the state machine can be driven event by event.

use std::collections::HashMap;

use pdf_narrator::config::SessionConfig;
use pdf_narrator::document::{DocumentId, DocumentRecord, InMemoryDocument};
use pdf_narrator::error::{Error, Result};
use pdf_narrator::geometry::{Matrix, Point, Rect};
use pdf_narrator::layout::{
    FragmentId, OverlayHandle, OverlaySurface, PageText, TextFragment, Viewport,
};
use pdf_narrator::narration::{NarrationEngine, UtteranceId, VoiceSettings};
use pdf_narrator::reader::{
    Fill, ReaderEvent, ReaderState, ReadingCursor, ReadingSession, RenderRequest, RenderSurface,
};
use pdf_narrator::storage::{MemoryStore, ProgressStore, ReadingProgress};

// ============================================================================
// Mock Collaborators
// ============================================================================

#[derive(Default)]
struct MockSurface {
    next_handle: u64,
    placed: HashMap<OverlayHandle, FragmentId>,
    fills: HashMap<FragmentId, Fill>,
    rendered: Vec<u32>,
}

impl MockSurface {
    fn fill_of(&self, fragment: u32) -> Fill {
        self.fills.get(&FragmentId(fragment)).copied().unwrap_or_default()
    }
}

impl OverlaySurface for MockSurface {
    fn place_box(&mut self, fragment: &TextFragment, _: &Rect, _: &Matrix) -> OverlayHandle {
        self.next_handle += 1;
        let handle = OverlayHandle(self.next_handle);
        self.placed.insert(handle, fragment.id);
        handle
    }

    fn measure_text(&self, _: OverlayHandle) -> Option<(f32, f32)> {
        None
    }

    fn set_text_transform(&mut self, _: OverlayHandle, _: &Matrix) {}
}

impl RenderSurface for MockSurface {
    fn render_page(&mut self, request: &RenderRequest) -> Result<Viewport> {
        self.rendered.push(request.page);
        Ok(Viewport {
            scale: 1.0,
            device_pixel_ratio: 1.0,
            resolution_multiplier: 1.0,
            width: request.width,
            height: request.height,
        })
    }

    fn set_fill(&mut self, handle: OverlayHandle, fill: Fill) {
        if let Some(fragment) = self.placed.get(&handle) {
            self.fills.insert(*fragment, fill);
        }
    }

    fn clear_overlay(&mut self) {
        self.placed.clear();
        self.fills.clear();
    }
}

#[derive(Default)]
struct MockNarrator {
    spoken: Vec<(UtteranceId, String)>,
    paused: bool,
    cancels: usize,
    fail: bool,
}

impl MockNarrator {
    fn last_text(&self) -> &str {
        self.spoken.last().map(|(_, text)| text.as_str()).unwrap_or("")
    }
}

impl NarrationEngine for MockNarrator {
    fn speak(&mut self, id: UtteranceId, text: &str, _: &VoiceSettings) -> Result<()> {
        if self.fail {
            return Err(Error::Narration("no voice available".to_string()));
        }
        self.spoken.push((id, text.to_string()));
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.paused = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.paused = false;
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.cancels += 1;
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        !self.spoken.is_empty() && !self.paused
    }
}

/// Store whose writes always fail.
#[derive(Default)]
struct BrokenStore;

impl ProgressStore for BrokenStore {
    fn add_document(&mut self, _: DocumentRecord) -> Result<()> {
        Err(Error::Storage("disk full".to_string()))
    }

    fn get_progress(&self, id: &DocumentId) -> Result<ReadingProgress> {
        Ok(ReadingProgress::zero(id.clone()))
    }

    fn put_progress(&mut self, _: ReadingProgress) -> Result<()> {
        Err(Error::Storage("disk full".to_string()))
    }

    fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        Ok(Vec::new())
    }

    fn delete_document(&mut self, _: &DocumentId) -> Result<bool> {
        Ok(false)
    }
}

// ============================================================================
// Helper Functions for Creating Mock Data
// ============================================================================

/// Text of paragraph `index` on `page`.
fn paragraph_text(page: u32, index: usize) -> String {
    format!("page {} paragraph {}", page, index)
}

/// A page whose paragraphs are single short lines 40 units apart.
///
/// Paragraph `i` lies at overlay y `82 + 40 * i` when rendered at scale 1.
fn page_with(page: u32, paragraphs: usize) -> PageText {
    let fragments = (0..paragraphs)
        .map(|i| {
            TextFragment::new(
                paragraph_text(page, i),
                72.0,
                700.0 - 40.0 * i as f32,
                200.0,
                10.0,
                "Body",
            )
            .with_line_end(true)
        })
        .collect();
    PageText::new(612.0, 792.0, fragments)
}

fn document(paragraphs_per_page: &[usize]) -> InMemoryDocument {
    InMemoryDocument::new(
        paragraphs_per_page
            .iter()
            .enumerate()
            .map(|(i, &count)| page_with(i as u32 + 1, count))
            .collect(),
    )
}

type TestSession = ReadingSession<MockSurface, MockNarrator, MemoryStore>;

fn session() -> TestSession {
    ReadingSession::new(
        MockSurface::default(),
        MockNarrator::default(),
        MemoryStore::new(),
        SessionConfig::default(),
    )
}

fn opened(paragraphs_per_page: &[usize]) -> TestSession {
    let mut session = session();
    session
        .open(b"%PDF test bytes", Box::new(document(paragraphs_per_page)), "book.pdf")
        .unwrap();
    session
}

fn finish_current(session: &mut TestSession) {
    let id = session.live_utterance().expect("an utterance is live");
    session.handle_event(ReaderEvent::NarrationFinished(id)).unwrap();
}

fn narrating(page: u32, paragraph: usize) -> ReaderState {
    ReaderState::Narrating(ReadingCursor::new(page, paragraph))
}

// ============================================================================
// Preconditions
// ============================================================================

#[test]
fn test_operations_require_loaded_document() {
    let mut session = session();
    assert!(matches!(session.start(1, 0, true), Err(Error::NotLoaded)));
    assert!(matches!(session.show_page(1), Err(Error::NotLoaded)));
    assert!(matches!(session.select_paragraph(0), Err(Error::NotLoaded)));
    assert!(matches!(session.select_at(&Point::new(0.0, 0.0)), Err(Error::NotLoaded)));
    assert!(matches!(session.request_page(2, 0), Err(Error::NotLoaded)));
    assert!(matches!(session.advance(), Err(Error::NotLoaded)));
    assert_eq!(session.state(), ReaderState::Idle);
}

#[test]
fn test_document_without_pages_has_nothing_to_read() {
    let mut session = session();
    let record = session
        .open(b"empty", Box::new(InMemoryDocument::new(Vec::new())), "empty.pdf")
        .unwrap();
    assert_eq!(record.page_count, 0);
    assert_eq!(session.current_page(), None);
    assert!(matches!(
        session.continue_reading(),
        Err(Error::PageOutOfRange { page: 1, page_count: 0 })
    ));
    assert!(matches!(
        session.select_paragraph(0),
        Err(Error::PageOutOfRange { page: 1, page_count: 0 })
    ));
    assert_eq!(session.state(), ReaderState::Idle);
}

#[test]
fn test_out_of_range_paragraph() {
    let mut session = opened(&[2]);
    let err = session.start(1, 9, true).unwrap_err();
    assert!(matches!(err, Error::ParagraphOutOfRange { page: 1, index: 9, count: 2 }));
    assert_eq!(session.state(), ReaderState::Idle);
    assert!(matches!(session.start(4, 0, true), Err(Error::PageOutOfRange { .. })));
}

// ============================================================================
// Opening and Resuming
// ============================================================================

#[test]
fn test_open_registers_document_and_shows_first_page() {
    let session = opened(&[2, 3]);
    let records = session.store().list_documents().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "book.pdf");
    assert_eq!(records[0].page_count, 2);
    assert_eq!(records[0].id, DocumentId::from_bytes(b"%PDF test bytes"));

    assert_eq!(session.current_page(), Some(1));
    assert_eq!(session.paragraphs().len(), 2);
    assert_eq!(session.surface().rendered, vec![1]);
    assert_eq!(session.resume_at(), Some(ReadingCursor::new(1, 0)));
}

#[test]
fn test_reopen_resumes_stored_position() {
    let mut session = opened(&[2, 3, 1]);
    session.start(2, 1, true).unwrap();
    session.close();
    assert_eq!(session.state(), ReaderState::Idle);
    assert_eq!(session.current_page(), None);

    let record = session
        .open(b"%PDF test bytes", Box::new(document(&[2, 3, 1]).with_title("Atlas")), "x.pdf")
        .unwrap();
    assert_eq!(record.title, "Atlas");
    assert_eq!(session.current_page(), Some(2));
    assert_eq!(session.resume_at(), Some(ReadingCursor::new(2, 1)));

    session.continue_reading().unwrap();
    assert_eq!(session.state(), narrating(2, 1));
    assert_eq!(session.narrator().last_text(), paragraph_text(2, 1));
}

// ============================================================================
// Narration Chaining
// ============================================================================

#[test]
fn test_last_paragraph_advances_to_next_page() {
    let mut session = opened(&[2, 2, 5, 3]);
    session.start(3, 4, true).unwrap();
    assert_eq!(session.state(), narrating(3, 4));
    assert_eq!(session.narrator().last_text(), paragraph_text(3, 4));

    finish_current(&mut session);
    assert_eq!(session.state(), narrating(4, 0));
    assert_eq!(session.current_page(), Some(4));
    assert_eq!(session.narrator().last_text(), paragraph_text(4, 0));

    let id = session.document().unwrap().id().clone();
    assert_eq!(session.store().get_progress(&id).unwrap(), ReadingProgress::at(id, 4, 0));
}

#[test]
fn test_read_through_is_monotonic_and_skips_empty_pages() {
    let mut session = opened(&[2, 0, 3, 0]);
    session.start(1, 0, true).unwrap();

    let mut visited = vec![session.state().cursor().unwrap()];
    while session.state().is_narrating() {
        finish_current(&mut session);
        if let Some(cursor) = session.state().cursor() {
            visited.push(cursor);
        }
    }

    let expected: Vec<ReadingCursor> = [(1, 0), (1, 1), (3, 0), (3, 1), (3, 2)]
        .iter()
        .map(|&(p, i)| ReadingCursor::new(p, i))
        .collect();
    assert_eq!(visited, expected);
    assert!(visited.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(session.state(), ReaderState::Idle);
    assert_eq!(session.live_utterance(), None);
}

#[test]
fn test_highlight_marks_paragraphs_up_to_active() {
    let mut session = opened(&[4]);
    session.start(1, 2, true).unwrap();
    let surface = session.surface();
    assert_eq!(surface.fill_of(0), Fill::Read);
    assert_eq!(surface.fill_of(1), Fill::Read);
    assert_eq!(surface.fill_of(2), Fill::Read);
    assert_eq!(surface.fill_of(3), Fill::None);

    session.start(1, 0, true).unwrap();
    assert_eq!(session.surface().fill_of(0), Fill::Read);
    assert_eq!(session.surface().fill_of(1), Fill::None);
}

#[test]
fn test_stale_completion_is_ignored() {
    let mut session = opened(&[3]);
    session.start(1, 0, true).unwrap();
    let superseded = session.live_utterance().unwrap();

    session.select_paragraph(2).unwrap();
    assert!(session.narrator().cancels >= 1);
    session
        .handle_event(ReaderEvent::NarrationFinished(superseded))
        .unwrap();
    assert_eq!(session.state(), narrating(1, 2));
    assert_eq!(session.narrator().spoken.len(), 2);
}

// ============================================================================
// Pause, Stop, Selection
// ============================================================================

#[test]
fn test_pause_toggle_keeps_position_and_highlight() {
    let mut session = opened(&[3]);
    session.start(1, 1, true).unwrap();

    let paused = session.pause_toggle();
    assert_eq!(paused, ReaderState::PausedManual(ReadingCursor::new(1, 1)));
    assert!(session.narrator().paused);
    assert_eq!(session.surface().fill_of(1), Fill::Read);

    assert_eq!(session.pause_toggle(), narrating(1, 1));
    assert!(!session.narrator().paused);
    assert_eq!(session.narrator().spoken.len(), 1);
}

#[test]
fn test_completion_while_paused_continues_on_resume() {
    let mut session = opened(&[3]);
    session.start(1, 0, true).unwrap();
    session.pause_toggle();

    let id = session.live_utterance().unwrap();
    session.handle_event(ReaderEvent::NarrationFinished(id)).unwrap();
    assert_eq!(session.state(), ReaderState::PausedManual(ReadingCursor::new(1, 0)));
    assert_eq!(session.narrator().spoken.len(), 1);

    assert_eq!(session.pause_toggle(), narrating(1, 1));
    assert_eq!(session.narrator().spoken.len(), 2);
    assert_eq!(session.narrator().last_text(), paragraph_text(1, 1));
    assert_ne!(session.live_utterance(), Some(id));

    finish_current(&mut session);
    assert_eq!(session.state(), narrating(1, 2));
}

#[test]
fn test_stop_discards_completion_held_while_paused() {
    let mut session = opened(&[3]);
    session.start(1, 0, true).unwrap();
    session.pause_toggle();
    let id = session.live_utterance().unwrap();
    session.handle_event(ReaderEvent::NarrationFinished(id)).unwrap();

    session.stop();
    session.start(1, 1, true).unwrap();
    session.pause_toggle();
    assert_eq!(session.pause_toggle(), narrating(1, 1));
    assert_eq!(session.narrator().spoken.len(), 2);
}

#[test]
fn test_pause_toggle_when_idle_does_nothing() {
    let mut session = opened(&[1]);
    assert_eq!(session.pause_toggle(), ReaderState::Idle);
    assert!(!session.narrator().paused);
}

#[test]
fn test_stop_ends_chaining() {
    let mut session = opened(&[3]);
    session.start(1, 0, true).unwrap();
    let id = session.live_utterance().unwrap();
    session.stop();
    assert_eq!(session.state(), ReaderState::Idle);
    session.handle_event(ReaderEvent::NarrationFinished(id)).unwrap();
    assert_eq!(session.state(), ReaderState::Idle);
    assert_eq!(session.narrator().spoken.len(), 1);
}

#[test]
fn test_select_at_point_starts_that_paragraph() {
    let mut session = opened(&[4]);
    let hit = session.select_at(&Point::new(100.0, 82.0 + 40.0 * 2.0 + 5.0)).unwrap();
    assert_eq!(hit, Some(2));
    assert_eq!(session.state(), narrating(1, 2));

    let miss = session.select_at(&Point::new(5.0, 5.0)).unwrap();
    assert_eq!(miss, None);
    assert_eq!(session.state(), narrating(1, 2));
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_page_requests_are_debounced() {
    let mut session = opened(&[1, 1, 1, 1, 1]);
    session.request_page(3, 0).unwrap();
    session.request_page(4, 5).unwrap();
    assert_eq!(session.tick(12).unwrap(), None);
    assert_eq!(session.tick(15).unwrap(), Some(4));
    assert_eq!(session.current_page(), Some(4));
    assert_eq!(session.surface().rendered, vec![1, 4]);

    let id = session.document().unwrap().id().clone();
    assert_eq!(session.store().get_progress(&id).unwrap().page_index, 4);
}

#[test]
fn test_next_and_previous_are_clamped() {
    let mut session = opened(&[1, 1, 1]);
    assert_eq!(session.previous_page(0).unwrap(), 1);
    assert_eq!(session.next_page(1).unwrap(), 2);
    assert_eq!(session.next_page(2).unwrap(), 3);
    assert_eq!(session.next_page(3).unwrap(), 3);
    assert_eq!(session.request_page(99, 4).unwrap(), 3);
    assert_eq!(session.tick(100).unwrap(), Some(3));
    assert_eq!(session.previous_page(101).unwrap(), 2);
}

// ============================================================================
// Collaborator Failures
// ============================================================================

#[test]
fn test_failed_progress_write_does_not_stop_narration() {
    let mut session = ReadingSession::new(
        MockSurface::default(),
        MockNarrator::default(),
        BrokenStore,
        SessionConfig::default(),
    );
    session.open(b"bytes", Box::new(document(&[2, 1])), "a.pdf").unwrap();
    session.start(1, 1, true).unwrap();
    let id = session.live_utterance().unwrap();
    session.handle_event(ReaderEvent::NarrationFinished(id)).unwrap();
    assert_eq!(session.state(), narrating(2, 0));
}

#[test]
fn test_missing_voice_is_not_fatal() {
    let mut narrator = MockNarrator::default();
    narrator.fail = true;
    let mut session = ReadingSession::new(
        MockSurface::default(),
        narrator,
        MemoryStore::new(),
        SessionConfig::default(),
    );
    session.open(b"bytes", Box::new(document(&[2])), "a.pdf").unwrap();
    session.start(1, 0, true).unwrap();
    assert_eq!(session.state(), narrating(1, 0));
    assert!(session.narrator().spoken.is_empty());
}
