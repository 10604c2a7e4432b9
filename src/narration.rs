//! Narration engine seam.
//!
//! The engine is an injected capability: the reading session owns it and
//! drives it with one utterance at a time. Completion is reported back to the
//! session as a [`ReaderEvent`](crate::reader::ReaderEvent) carrying the
//! [`UtteranceId`] that finished.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identity of one `speak` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl UtteranceId {
    /// The id issued after this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Voice selection and prosody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Index into the engine's voice list
    pub voice_index: usize,
    /// Speaking rate, 1.0 is normal
    pub rate: f32,
    /// Pitch, 1.0 is normal
    pub pitch: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_index: 0,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

impl VoiceSettings {
    /// Select a voice.
    pub fn with_voice_index(mut self, index: usize) -> Self {
        self.voice_index = index;
        self
    }

    /// Set the speaking rate.
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Set the pitch.
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

/// A text-to-speech backend.
///
/// `speak` must supersede any in-flight utterance. Completion of an
/// utterance is delivered out of band, tagged with its id.
pub trait NarrationEngine {
    /// Start speaking `text`, cancelling whatever was playing.
    fn speak(&mut self, id: UtteranceId, text: &str, voice: &VoiceSettings) -> Result<()>;

    /// Pause the current utterance.
    fn pause(&mut self) -> Result<()>;

    /// Resume a paused utterance.
    fn resume(&mut self) -> Result<()>;

    /// Stop and discard the current utterance.
    fn cancel(&mut self) -> Result<()>;

    /// Whether audio is currently playing.
    fn is_speaking(&self) -> bool;
}

/// Engine that produces no audio. Completion must be reported by the caller.
#[derive(Debug, Default)]
pub struct SilentEngine {
    current: Option<UtteranceId>,
    paused: bool,
}

impl SilentEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// The utterance most recently started and not cancelled.
    pub fn current(&self) -> Option<UtteranceId> {
        self.current
    }
}

impl NarrationEngine for SilentEngine {
    fn speak(&mut self, id: UtteranceId, _text: &str, _voice: &VoiceSettings) -> Result<()> {
        self.current = Some(id);
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
        self.current = None;
        self.paused = false;
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.current.is_some() && !self.paused
    }
}
