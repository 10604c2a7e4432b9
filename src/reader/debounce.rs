//! Debouncing of page navigation requests.
//!
//! Time is supplied by the caller in milliseconds, so the debouncer has no
//! clock of its own and is driven by [`PageDebouncer::poll`].

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPage {
    page: u32,
    due_ms: u64,
}

/// Keeps only the latest page request within the debounce window.
#[derive(Debug, Clone)]
pub struct PageDebouncer {
    window_ms: u64,
    pending: Option<PendingPage>,
}

impl PageDebouncer {
    /// Create a debouncer with the given window.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: None,
        }
    }

    /// Request a page, superseding any pending request.
    pub fn request(&mut self, page: u32, now_ms: u64) {
        if let Some(previous) = self.pending {
            trace!("Page request {} supersedes {}", page, previous.page);
        }
        self.pending = Some(PendingPage {
            page,
            due_ms: now_ms.saturating_add(self.window_ms),
        });
    }

    /// Take the pending page if its window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<u32> {
        match self.pending {
            Some(pending) if now_ms >= pending.due_ms => {
                self.pending = None;
                Some(pending.page)
            },
            _ => None,
        }
    }

    /// Page awaiting its window, if any.
    pub fn pending_page(&self) -> Option<u32> {
        self.pending.map(|p| p.page)
    }

    /// Drop the pending request.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
