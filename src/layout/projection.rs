//! Coordinate Projector: maps document-space fragments onto the overlay.
//!
//! Document space is bottom-up (PDF user space); overlay space is top-down and
//! scaled to match the raster painted by the rendering surface. For each
//! fragment the projector derives an overlay rectangle, asks the surface to
//! place an element for it, and keeps the result keyed by fragment id. The
//! whole map is rebuilt on every page render.

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::geometry::{Matrix, Point, Rect};
use crate::layout::fragment::{FragmentId, TextFragment};

/// Realized viewport geometry reported by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Page-to-viewport scale factor
    pub scale: f32,
    /// Device pixel ratio of the display
    pub device_pixel_ratio: f32,
    /// Raster resolution multiplier
    pub resolution_multiplier: f32,
    /// Overlay width
    pub width: f32,
    /// Overlay height
    pub height: f32,
}

impl Viewport {
    /// Scale from document units to overlay units.
    pub fn effective_scale(&self) -> f32 {
        self.scale * self.device_pixel_ratio / self.resolution_multiplier
    }

    /// Viewport transform from document space into overlay space (with y-flip).
    pub fn transform(&self) -> Matrix {
        let s = self.effective_scale();
        Matrix::new(s, 0.0, 0.0, -s, 0.0, self.height)
    }
}

/// Opaque handle to the overlay element representing a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayHandle(pub u64);

/// A fragment's overlay rectangle and the element placed for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBox {
    /// Originating fragment
    pub fragment: FragmentId,
    /// Rectangle in overlay space
    pub rect: Rect,
    /// Transform for the overlay text glyphs (font size 1)
    pub text_transform: Matrix,
    /// Element handle issued by the surface
    pub handle: OverlayHandle,
}

/// The overlay layer the projector places elements on.
pub trait OverlaySurface {
    /// Place a hit/highlight rectangle and its text for a fragment.
    fn place_box(
        &mut self,
        fragment: &TextFragment,
        rect: &Rect,
        text_transform: &Matrix,
    ) -> OverlayHandle;

    /// Realized (width, height) of the laid-out text for an element, if known.
    fn measure_text(&self, handle: OverlayHandle) -> Option<(f32, f32)>;

    /// Replace an element's text transform.
    fn set_text_transform(&mut self, handle: OverlayHandle, transform: &Matrix);
}

/// Project a fragment's box into overlay space.
///
/// Vertical-writing fragments have their box flipped after projection.
pub fn project_rect(fragment: &TextFragment, viewport: &Viewport) -> Rect {
    let s = viewport.effective_scale();
    let rect = Rect::new(
        fragment.origin_x * s,
        viewport.height - (fragment.origin_y + fragment.height) * s,
        fragment.width * s,
        fragment.height * s,
    );
    if fragment.is_vertical {
        rect.flip()
    } else {
        rect
    }
}

/// Inverse of [`project_rect`] for horizontal fragments.
///
/// Returns the document-space box `(origin_x, origin_y, width, height)`.
pub fn unproject_rect(rect: &Rect, viewport: &Viewport) -> Rect {
    let s = viewport.effective_scale();
    let height = rect.height / s;
    Rect::new(
        rect.x / s,
        (viewport.height - rect.y) / s - height,
        rect.width / s,
        height,
    )
}

/// Transform placing a fragment's glyphs (laid out at font size 1) on the overlay.
///
/// Composes the glyph y-flip, the fragment's text matrix, and the viewport
/// transform.
pub fn text_transform(fragment: &TextFragment, viewport: &Viewport) -> Matrix {
    let h = fragment.height;
    let text_matrix = if fragment.is_vertical {
        Matrix::new(0.0, h, -h, 0.0, fragment.origin_x, fragment.origin_y)
    } else {
        Matrix::new(h, 0.0, 0.0, h, fragment.origin_x, fragment.origin_y)
    };
    let glyph_flip = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 0.0);
    glyph_flip.multiply(&text_matrix).multiply(&viewport.transform())
}

/// Post-layout correction of a text transform.
///
/// Scales the transform about its origin, independently per overlay axis, so
/// that text realized at `realized` size covers `target`. Returns `None` when
/// any extent or resulting factor is zero or non-finite (e.g. empty text).
pub fn fit_text_transform(
    transform: &Matrix,
    target: &Rect,
    realized: (f32, f32),
) -> Option<Matrix> {
    let (realized_width, realized_height) = realized;
    let sx = target.width / realized_width;
    let sy = target.height / realized_height;
    if !sx.is_finite() || !sy.is_finite() || sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some(Matrix {
        a: transform.a * sx,
        b: transform.b * sy,
        c: transform.c * sx,
        d: transform.d * sy,
        e: transform.e,
        f: transform.f,
    })
}

/// Owns the fragment-to-overlay map for the page currently on screen.
#[derive(Debug, Default)]
pub struct CoordinateProjector {
    boxes: IndexMap<FragmentId, OverlayBox>,
    viewport: Option<Viewport>,
}

impl CoordinateProjector {
    /// Create an empty projector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a page's fragments, discarding every previous entry.
    pub fn project_page<'a, S>(
        &mut self,
        viewport: Viewport,
        fragments: impl IntoIterator<Item = &'a TextFragment>,
        surface: &mut S,
    ) -> &IndexMap<FragmentId, OverlayBox>
    where
        S: OverlaySurface + ?Sized,
    {
        self.boxes.clear();
        self.viewport = Some(viewport);

        for fragment in fragments {
            let rect = project_rect(fragment, &viewport);
            if !rect.is_finite() {
                debug!("Skipping fragment {:?}: non-finite overlay box", fragment.id);
                continue;
            }
            let transform = text_transform(fragment, &viewport);
            let handle = surface.place_box(fragment, &rect, &transform);
            trace!("Fragment {:?} -> {:?}", fragment.id, rect);
            self.boxes.insert(
                fragment.id,
                OverlayBox {
                    fragment: fragment.id,
                    rect,
                    text_transform: transform,
                    handle,
                },
            );
        }

        debug!("Projected {} overlay boxes", self.boxes.len());
        &self.boxes
    }

    /// Run the corrective pass once the surface has laid out the text.
    ///
    /// Returns how many elements were rescaled.
    pub fn correct_text<S: OverlaySurface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let mut corrected = 0;
        for overlay in self.boxes.values_mut() {
            let Some(realized) = surface.measure_text(overlay.handle) else {
                continue;
            };
            let fitted = fit_text_transform(&overlay.text_transform, &overlay.rect, realized);
            if let Some(fitted) = fitted {
                surface.set_text_transform(overlay.handle, &fitted);
                overlay.text_transform = fitted;
                corrected += 1;
            }
        }
        corrected
    }

    /// Overlay box for a fragment.
    pub fn get(&self, id: FragmentId) -> Option<&OverlayBox> {
        self.boxes.get(&id)
    }

    /// All boxes in projection order.
    pub fn boxes(&self) -> &IndexMap<FragmentId, OverlayBox> {
        &self.boxes
    }

    /// Viewport of the last projection.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// First fragment whose overlay box contains the point.
    pub fn hit_test(&self, point: &Point) -> Option<FragmentId> {
        self.boxes
            .values()
            .find(|overlay| overlay.rect.contains_point(point))
            .map(|overlay| overlay.fragment)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.boxes.clear();
        self.viewport = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSurface {
        next: u64,
        realized: Option<(f32, f32)>,
        transforms: Vec<(OverlayHandle, Matrix)>,
    }

    impl CountingSurface {
        fn new(realized: Option<(f32, f32)>) -> Self {
            Self {
                next: 0,
                realized,
                transforms: Vec::new(),
            }
        }
    }

    impl OverlaySurface for CountingSurface {
        fn place_box(&mut self, _: &TextFragment, _: &Rect, _: &Matrix) -> OverlayHandle {
            self.next += 1;
            OverlayHandle(self.next)
        }

        fn measure_text(&self, _: OverlayHandle) -> Option<(f32, f32)> {
            self.realized
        }

        fn set_text_transform(&mut self, handle: OverlayHandle, transform: &Matrix) {
            self.transforms.push((handle, *transform));
        }
    }

    fn viewport() -> Viewport {
        Viewport {
            scale: 1.5,
            device_pixel_ratio: 2.0,
            resolution_multiplier: 2.0,
            width: 918.0,
            height: 1188.0,
        }
    }

    #[test]
    fn test_effective_scale() {
        assert_eq!(viewport().effective_scale(), 1.5);
    }

    #[test]
    fn test_project_rect_flips_y() {
        let f = TextFragment::new("Hello", 100.0, 700.0, 40.0, 12.0, "F1");
        let r = project_rect(&f, &viewport());
        assert_eq!(r.x, 150.0);
        assert_eq!(r.y, 1188.0 - 712.0 * 1.5);
        assert_eq!(r.width, 60.0);
        assert_eq!(r.height, 18.0);
    }

    #[test]
    fn test_vertical_fragment_is_flipped() {
        let f = TextFragment::new("縦", 100.0, 700.0, 40.0, 12.0, "F1").with_vertical(true);
        let r = project_rect(&f, &viewport());
        assert_eq!(r.width, 18.0);
        assert_eq!(r.height, 60.0);
    }

    #[test]
    fn test_unproject_inverts_projection() {
        let f = TextFragment::new("x", 72.5, 431.25, 33.0, 9.5, "F1");
        let back = unproject_rect(&project_rect(&f, &viewport()), &viewport());
        assert!((back.x - 72.5).abs() < 1e-3);
        assert!((back.y - 431.25).abs() < 1e-3);
        assert!((back.width - 33.0).abs() < 1e-3);
        assert!((back.height - 9.5).abs() < 1e-3);
    }

    #[test]
    fn test_text_transform_places_baseline() {
        let f = TextFragment::new("x", 100.0, 700.0, 40.0, 12.0, "F1");
        let m = text_transform(&f, &viewport());
        assert_eq!(m.a, 18.0);
        assert_eq!(m.d, 18.0);
        assert_eq!(m.e, 150.0);
        assert_eq!(m.f, 1188.0 - 1050.0);
    }

    #[test]
    fn test_fit_rejects_degenerate_extents() {
        let m = Matrix::identity();
        let target = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(fit_text_transform(&m, &target, (0.0, 5.0)).is_none());
        assert!(fit_text_transform(&m, &Rect::new(0.0, 0.0, 0.0, 10.0), (5.0, 5.0)).is_none());
        assert!(fit_text_transform(&m, &target, (f32::NAN, 5.0)).is_none());
        let fitted = fit_text_transform(&m, &target, (5.0, 20.0)).unwrap();
        assert_eq!(fitted.a, 2.0);
        assert_eq!(fitted.d, 0.5);
    }

    #[test]
    fn test_project_page_rebuilds_map() {
        let mut projector = CoordinateProjector::new();
        let mut surface = CountingSurface::new(None);
        let page_one = vec![
            TextFragment::new("a", 0.0, 10.0, 5.0, 10.0, "F1"),
            TextFragment::new("b", 10.0, 10.0, 5.0, 10.0, "F1"),
        ];
        let mut page_one = crate::layout::fragment::PageText::new(100.0, 100.0, page_one);
        projector.project_page(viewport(), &page_one.fragments, &mut surface);
        assert_eq!(projector.boxes().len(), 2);

        page_one.fragments.truncate(1);
        projector.project_page(viewport(), &page_one.fragments, &mut surface);
        assert_eq!(projector.boxes().len(), 1);
        assert_eq!(projector.get(FragmentId(0)).unwrap().handle, OverlayHandle(3));
        assert!(projector.get(FragmentId(1)).is_none());
    }

    #[test]
    fn test_correct_text_skips_unmeasured() {
        let mut projector = CoordinateProjector::new();
        let page = crate::layout::fragment::PageText::new(
            100.0,
            100.0,
            vec![TextFragment::new("abc", 0.0, 10.0, 30.0, 10.0, "F1")],
        );
        let mut unmeasured = CountingSurface::new(None);
        projector.project_page(viewport(), &page.fragments, &mut unmeasured);
        assert_eq!(projector.correct_text(&mut unmeasured), 0);

        let mut measured = CountingSurface::new(Some((90.0, 15.0)));
        projector.project_page(viewport(), &page.fragments, &mut measured);
        assert_eq!(projector.correct_text(&mut measured), 1);
        assert_eq!(measured.transforms.len(), 1);
    }

    #[test]
    fn test_hit_test() {
        let mut projector = CoordinateProjector::new();
        let mut surface = CountingSurface::new(None);
        let page = crate::layout::fragment::PageText::new(
            100.0,
            100.0,
            vec![TextFragment::new("abc", 10.0, 700.0, 40.0, 12.0, "F1")],
        );
        projector.project_page(viewport(), &page.fragments, &mut surface);
        let inside = Point::new(20.0, 1188.0 - 705.0 * 1.5);
        assert_eq!(projector.hit_test(&inside), Some(FragmentId(0)));
        assert_eq!(projector.hit_test(&Point::new(0.0, 0.0)), None);
    }
}
