//! Rendering surface seam.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::{OverlayHandle, OverlaySurface, Viewport};

/// Highlight fill of an overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    /// No fill
    #[default]
    None,
    /// Already read, or being read
    Read,
}

/// What the session asks the surface to paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// 1-based page
    pub page: u32,
    /// Nominal page width in document units
    pub width: f32,
    /// Nominal page height in document units
    pub height: f32,
    /// Raster resolution multiplier
    pub resolution_multiplier: f32,
}

/// Paints page rasters and hosts the interactive overlay above them.
pub trait RenderSurface: OverlaySurface {
    /// Paint a page and report the realized viewport.
    fn render_page(&mut self, request: &RenderRequest) -> Result<Viewport>;

    /// Change the fill of an overlay element.
    fn set_fill(&mut self, handle: OverlayHandle, fill: Fill);

    /// Remove every overlay element.
    fn clear_overlay(&mut self);
}
