//! Reading-position state machine.
//!
//! A [`ReadingSession`] owns the loaded document, the page on screen, the
//! overlay projection, and the three injected collaborators (rendering
//! surface, narration engine, progress store). Narration is self-chaining:
//! each [`ReaderEvent::NarrationFinished`] for the live utterance advances
//! the cursor and starts the next paragraph until the document ends or the
//! session is stopped.

use log::{debug, info, warn};

use crate::config::SessionConfig;
use crate::document::{DocumentId, DocumentRecord, LoadedDocument, TextSource};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::layout::line::retained;
use crate::layout::{create_builder, CoordinateProjector, ParagraphBuilder};
use crate::narration::{NarrationEngine, UtteranceId, VoiceSettings};
use crate::reader::cursor::{ReaderState, ReadingCursor};
use crate::reader::debounce::PageDebouncer;
use crate::reader::page::{PageLayout, ParagraphSummary};
use crate::reader::surface::{Fill, RenderRequest, RenderSurface};
use crate::storage::{ProgressStore, ReadingProgress};

/// Events delivered to the session from its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderEvent {
    /// The narration engine finished an utterance.
    NarrationFinished(UtteranceId),
}

/// Reading session over one document at a time.
pub struct ReadingSession<R, N, S> {
    config: SessionConfig,
    voice: VoiceSettings,
    surface: R,
    narrator: N,
    store: S,
    builder: Box<dyn ParagraphBuilder>,
    projector: CoordinateProjector,
    debouncer: PageDebouncer,
    document: Option<LoadedDocument<Box<dyn TextSource>>>,
    layout: Option<PageLayout>,
    state: ReaderState,
    resume_at: Option<ReadingCursor>,
    last_utterance: UtteranceId,
    live_utterance: Option<UtteranceId>,
    finished_while_paused: bool,
}

impl<R, N, S> ReadingSession<R, N, S>
where
    R: RenderSurface,
    N: NarrationEngine,
    S: ProgressStore,
{
    /// Create a session with no document loaded.
    pub fn new(surface: R, narrator: N, store: S, config: SessionConfig) -> Self {
        let builder = create_builder(config.strategy, &config.layout);
        debug!("Reading session using {} paragraphs", builder.name());
        Self {
            debouncer: PageDebouncer::new(config.page_debounce_ms),
            config,
            voice: VoiceSettings::default(),
            surface,
            narrator,
            store,
            builder,
            projector: CoordinateProjector::new(),
            document: None,
            layout: None,
            state: ReaderState::Idle,
            resume_at: None,
            last_utterance: UtteranceId(0),
            live_utterance: None,
            finished_while_paused: false,
        }
    }

    /// Set the voice used for subsequent utterances.
    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = voice;
        self
    }

    /// Replace the voice settings.
    pub fn set_voice(&mut self, voice: VoiceSettings) {
        self.voice = voice;
    }

    /// Load a document, register it, and show the page its progress points at.
    ///
    /// `bytes` are the raw document bytes, hashed into the document identity.
    /// The stored paragraph position becomes the [`resume_at`](Self::resume_at)
    /// cursor. Any previous document is closed first.
    pub fn open(
        &mut self,
        bytes: &[u8],
        source: Box<dyn TextSource>,
        file_name: &str,
    ) -> Result<DocumentRecord> {
        let id = DocumentId::from_bytes(bytes);
        self.open_with_id(id, source, file_name)
    }

    /// Like [`open`](Self::open), with a precomputed identity.
    pub fn open_with_id(
        &mut self,
        id: DocumentId,
        source: Box<dyn TextSource>,
        file_name: &str,
    ) -> Result<DocumentRecord> {
        self.close();

        let record = DocumentRecord::describe(id.clone(), &source, file_name);
        let document = LoadedDocument::load(id.clone(), source, &self.config.furniture)?;
        if let Err(e) = self.store.add_document(record.clone()) {
            warn!("Failed to register document {}: {}", id, e);
        }
        let progress = self.store.get_progress(&id).unwrap_or_else(|e| {
            warn!("Failed to read progress of {}: {}", id, e);
            ReadingProgress::zero(id.clone())
        });
        let page_count = document.page_count();
        self.document = Some(document);

        if page_count == 0 {
            info!("Document {} has no pages", id);
            return Ok(record);
        }
        let page = progress.resume_page().min(page_count);
        self.resume_at = Some(ReadingCursor::new(page, progress.paragraph_index));
        info!("Opened '{}' at page {} of {}", record.title, page, page_count);
        self.show_page(page)?;
        Ok(record)
    }

    /// Stop narration and unload the document.
    pub fn close(&mut self) {
        self.stop();
        self.surface.clear_overlay();
        self.projector.clear();
        self.debouncer.cancel();
        self.document = None;
        self.layout = None;
        self.resume_at = None;
    }

    /// Render a page, rebuild its paragraphs, and project its overlay.
    ///
    /// The previous page's overlay is discarded wholesale.
    pub fn show_page(&mut self, page: u32) -> Result<()> {
        let document = self.document.as_ref().ok_or(Error::NotLoaded)?;
        let text = document.page_text(page)?;

        self.surface.clear_overlay();
        let request = RenderRequest {
            page,
            width: text.width,
            height: text.height,
            resolution_multiplier: self.config.resolution_multiplier,
        };
        let viewport = self.surface.render_page(&request)?;

        let paragraphs: Vec<ParagraphSummary> = self
            .builder
            .build(&text.fragments, document.predicate())
            .iter()
            .map(ParagraphSummary::from)
            .collect();
        self.projector.project_page(
            viewport,
            retained(&text.fragments, document.predicate()),
            &mut self.surface,
        );
        let corrected = self.projector.correct_text(&mut self.surface);
        debug!(
            "Page {}: {} paragraphs, {} overlay boxes, {} text corrections",
            page,
            paragraphs.len(),
            self.projector.boxes().len(),
            corrected
        );

        self.layout = Some(PageLayout {
            page,
            text,
            paragraphs,
        });
        let active = match self.state.cursor() {
            Some(cursor) if cursor.page == page => Some(cursor.paragraph),
            _ => None,
        };
        self.apply_highlight(active);
        Ok(())
    }

    /// Begin narrating a paragraph.
    ///
    /// Shows `page` if it is not on screen, highlights every paragraph up to
    /// and including `paragraph`, speaks it, and persists the position. With
    /// `immediate` the in-flight utterance is cancelled before speaking.
    pub fn start(&mut self, page: u32, paragraph: usize, immediate: bool) -> Result<()> {
        if self.document.is_none() {
            return Err(Error::NotLoaded);
        }
        if self.current_page() != Some(page) {
            self.show_page(page)?;
        }
        let text = {
            let layout = self.layout.as_ref().ok_or(Error::NotLoaded)?;
            let summary = layout.paragraphs.get(paragraph).ok_or(Error::ParagraphOutOfRange {
                page,
                index: paragraph,
                count: layout.paragraph_count(),
            })?;
            summary.text.clone()
        };

        let cursor = ReadingCursor::new(page, paragraph);
        self.state = ReaderState::Narrating(cursor);
        self.apply_highlight(Some(paragraph));

        if immediate {
            if let Err(e) = self.narrator.cancel() {
                warn!("Failed to cancel narration: {}", e);
            }
        }
        let id = self.last_utterance.next();
        self.last_utterance = id;
        self.live_utterance = Some(id);
        self.finished_while_paused = false;
        debug!("Narrating {} as utterance {:?}", cursor, id);
        if let Err(e) = self.narrator.speak(id, &text, &self.voice) {
            warn!("Narration of {} failed: {}", cursor, e);
        }

        self.persist(cursor);
        Ok(())
    }

    /// Handle a collaborator event.
    ///
    /// Completions of superseded utterances are ignored. A completion of the
    /// live utterance while paused is held until [`pause_toggle`] resumes.
    ///
    /// [`pause_toggle`]: Self::pause_toggle
    pub fn handle_event(&mut self, event: ReaderEvent) -> Result<()> {
        match event {
            ReaderEvent::NarrationFinished(id) => {
                if self.live_utterance != Some(id) {
                    debug!("Ignoring stale completion of utterance {:?}", id);
                    return Ok(());
                }
                if self.state.is_paused() {
                    debug!("Utterance {:?} finished while paused", id);
                    self.finished_while_paused = true;
                    return Ok(());
                }
                if !self.state.is_narrating() {
                    return Ok(());
                }
                self.live_utterance = None;
                self.advance().map(|_| ())
            },
        }
    }

    /// Move to the next paragraph and narrate it.
    ///
    /// Pages without paragraphs are skipped. Past the last paragraph of the
    /// document the session returns to [`ReaderState::Idle`]. Returns the new
    /// cursor, or `None` when nothing is left (or nothing was active).
    pub fn advance(&mut self) -> Result<Option<ReadingCursor>> {
        let page_count = self.document.as_ref().ok_or(Error::NotLoaded)?.page_count();
        let Some(mut cursor) = self.state.cursor() else {
            return Ok(None);
        };

        loop {
            if self.current_page() != Some(cursor.page) {
                self.show_page(cursor.page)?;
            }
            let paragraph_count = self.paragraph_count();
            let Some(next) = cursor.next(paragraph_count, page_count) else {
                info!("Reached the end of the document");
                self.state = ReaderState::Idle;
                self.live_utterance = None;
                return Ok(None);
            };
            if next.page != cursor.page {
                self.show_page(next.page)?;
                if self.paragraph_count() == 0 {
                    debug!("Page {} has no paragraphs, skipping", next.page);
                    cursor = next;
                    continue;
                }
            }
            self.start(next.page, next.paragraph, false)?;
            return Ok(Some(next));
        }
    }

    /// Pause a running narration or resume a paused one.
    ///
    /// Resuming after the live utterance already finished moves straight on
    /// to the next paragraph.
    pub fn pause_toggle(&mut self) -> ReaderState {
        match self.state {
            ReaderState::Narrating(cursor) => {
                if let Err(e) = self.narrator.pause() {
                    warn!("Failed to pause narration: {}", e);
                }
                self.state = ReaderState::PausedManual(cursor);
            },
            ReaderState::PausedManual(cursor) => {
                if let Err(e) = self.narrator.resume() {
                    warn!("Failed to resume narration: {}", e);
                }
                self.state = ReaderState::Narrating(cursor);
                if std::mem::take(&mut self.finished_while_paused) {
                    self.live_utterance = None;
                    if let Err(e) = self.advance() {
                        warn!("Failed to continue after {}: {}", cursor, e);
                    }
                }
            },
            ReaderState::Idle => {},
        }
        self.state
    }

    /// Stop narrating. The highlight stays as it is.
    pub fn stop(&mut self) {
        if self.state == ReaderState::Idle {
            return;
        }
        if let Err(e) = self.narrator.cancel() {
            warn!("Failed to cancel narration: {}", e);
        }
        self.live_utterance = None;
        self.finished_while_paused = false;
        self.state = ReaderState::Idle;
    }

    /// Start narrating a paragraph of the page on screen, preempting narration.
    pub fn select_paragraph(&mut self, paragraph: usize) -> Result<()> {
        let page = self.displayed_page()?;
        self.start(page, paragraph, true)
    }

    /// Start narrating the paragraph under an overlay-space point.
    ///
    /// Returns the selected paragraph, or `None` if the point hits nothing.
    pub fn select_at(&mut self, point: &Point) -> Result<Option<usize>> {
        let layout = self.layout.as_ref().ok_or(Error::NotLoaded)?;
        let Some(paragraph) = self
            .projector
            .hit_test(point)
            .and_then(|fragment| layout.paragraph_of(fragment))
        else {
            return Ok(None);
        };
        self.select_paragraph(paragraph)?;
        Ok(Some(paragraph))
    }

    /// Resume from the stored position, or from the top of the page on screen.
    pub fn continue_reading(&mut self) -> Result<()> {
        let page = self.displayed_page()?;
        let paragraph = match self.resume_at.take() {
            Some(cursor) if cursor.page == page => cursor.paragraph,
            _ => 0,
        };
        if self.paragraph_count() == 0 {
            self.state = ReaderState::Narrating(ReadingCursor::new(page, 0));
            return self.advance().map(|_| ());
        }
        let paragraph = paragraph.min(self.paragraph_count() - 1);
        self.start(page, paragraph, true)
    }

    /// Request a page through the debouncer, clamped to the document.
    pub fn request_page(&mut self, page: u32, now_ms: u64) -> Result<u32> {
        let page_count = self.document.as_ref().ok_or(Error::NotLoaded)?.page_count();
        let page = page.clamp(1, page_count.max(1));
        self.debouncer.request(page, now_ms);
        Ok(page)
    }

    /// Request the page after the latest requested or displayed one.
    pub fn next_page(&mut self, now_ms: u64) -> Result<u32> {
        let base = self.navigation_base()?;
        self.request_page(base.saturating_add(1), now_ms)
    }

    /// Request the page before the latest requested or displayed one.
    pub fn previous_page(&mut self, now_ms: u64) -> Result<u32> {
        let base = self.navigation_base()?;
        self.request_page(base.saturating_sub(1), now_ms)
    }

    /// Show a debounced page once its window has elapsed.
    ///
    /// Returns the page shown, if any.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<u32>> {
        let Some(page) = self.debouncer.poll(now_ms) else {
            return Ok(None);
        };
        self.show_page(page)?;
        if self.state == ReaderState::Idle {
            self.persist(ReadingCursor::new(page, 0));
        }
        Ok(Some(page))
    }

    /// Page on screen; a loaded document with no pages has none to show.
    fn displayed_page(&self) -> Result<u32> {
        let document = self.document.as_ref().ok_or(Error::NotLoaded)?;
        self.current_page().ok_or(Error::PageOutOfRange {
            page: 1,
            page_count: document.page_count(),
        })
    }

    fn navigation_base(&self) -> Result<u32> {
        if self.document.is_none() {
            return Err(Error::NotLoaded);
        }
        Ok(self
            .debouncer
            .pending_page()
            .or_else(|| self.current_page())
            .unwrap_or(1))
    }

    fn apply_highlight(&mut self, active: Option<usize>) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        for (index, paragraph) in layout.paragraphs.iter().enumerate() {
            let fill = match active {
                Some(active) if index <= active => Fill::Read,
                _ => Fill::None,
            };
            for id in &paragraph.fragment_ids {
                if let Some(overlay) = self.projector.get(*id) {
                    self.surface.set_fill(overlay.handle, fill);
                }
            }
        }
    }

    fn persist(&mut self, cursor: ReadingCursor) {
        let Some(document) = self.document.as_ref() else {
            return;
        };
        let progress = ReadingProgress::at(document.id().clone(), cursor.page, cursor.paragraph);
        if let Err(e) = self.store.put_progress(progress) {
            warn!("Failed to save progress at {}: {}", cursor, e);
        }
    }

    /// Current state.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Page on screen.
    pub fn current_page(&self) -> Option<u32> {
        self.layout.as_ref().map(|l| l.page)
    }

    /// Layout of the page on screen.
    pub fn layout(&self) -> Option<&PageLayout> {
        self.layout.as_ref()
    }

    /// Paragraphs of the page on screen.
    pub fn paragraphs(&self) -> &[ParagraphSummary] {
        self.layout.as_ref().map(|l| l.paragraphs.as_slice()).unwrap_or(&[])
    }

    fn paragraph_count(&self) -> usize {
        self.paragraphs().len()
    }

    /// Position restored from storage on open, until reading continues.
    pub fn resume_at(&self) -> Option<ReadingCursor> {
        self.resume_at
    }

    /// The loaded document, if any.
    pub fn document(&self) -> Option<&LoadedDocument<Box<dyn TextSource>>> {
        self.document.as_ref()
    }

    /// The utterance whose completion the session is waiting for.
    pub fn live_utterance(&self) -> Option<UtteranceId> {
        self.live_utterance
    }

    /// Overlay projection of the page on screen.
    pub fn projector(&self) -> &CoordinateProjector {
        &self.projector
    }

    /// Rendering surface.
    pub fn surface(&self) -> &R {
        &self.surface
    }

    /// Narration engine.
    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// Progress store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable progress store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
