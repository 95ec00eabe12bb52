//! Viewport geometry and visible-band policies.
//!
//! The stock viewer derives the visible band from the scrolling container's
//! own client height. When the embedding lets the container grow taller than
//! the screen (the window scrolls instead), that band covers every page and
//! nothing gets virtualized. A [`VisibleBand`] policy decides where the band
//! comes from; [`ViewportOverride`] swaps in the window's height for the
//! vertical axis and leaves everything else alone.

use super::visibility::{PageView, ViewportBounds, VisibleSet, compute_visible};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Scroll offsets and client size of one scrolling element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub width: f64,
    pub height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_left: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_top,
            scroll_left,
            width,
            height,
        }
    }
}

/// Geometry snapshot taken at recompute time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSample {
    /// The viewer's scrolling container
    pub container: ScrollMetrics,
    /// The top-level window (or screen) hosting the container
    pub window: ScrollMetrics,
}

/// Host-side source of live viewport geometry.
pub trait ViewportHost {
    fn sample(&self) -> ViewportSample;
}

/// Which element an axis of the band is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisSource {
    Container,
    #[default]
    Window,
}

impl AxisSource {
    fn metrics(self, sample: &ViewportSample) -> &ScrollMetrics {
        match self {
            AxisSource::Container => &sample.container,
            AxisSource::Window => &sample.window,
        }
    }
}

/// Strategy deriving the visible band from a geometry sample.
pub trait VisibleBand {
    /// `(top, bottom)` of the band.
    fn vertical(&self, sample: &ViewportSample) -> (f64, f64);

    /// `(left, right)` of the band.
    fn horizontal(&self, sample: &ViewportSample) -> (f64, f64);

    /// Vertical scroll offset the band is anchored to; scroll direction is
    /// tracked against this value.
    fn scroll_offset(&self, sample: &ViewportSample) -> f64 {
        self.vertical(sample).0
    }

    fn bounds(&self, sample: &ViewportSample) -> ViewportBounds {
        let (top, bottom) = self.vertical(sample);
        let (left, right) = self.horizontal(sample);
        ViewportBounds::new(top, bottom, left, right)
    }
}

/// Default policy: both axes from the scrolling container.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerBand;

impl VisibleBand for ContainerBand {
    fn vertical(&self, sample: &ViewportSample) -> (f64, f64) {
        let c = &sample.container;
        (c.scroll_top, c.scroll_top + c.height)
    }

    fn horizontal(&self, sample: &ViewportSample) -> (f64, f64) {
        let c = &sample.container;
        (c.scroll_left, c.scroll_left + c.width)
    }
}

/// Vertical band from the window's scroll offset and height.
///
/// Only the vertical derivation differs from [`ContainerBand`]. The
/// horizontal axis is configurable because embeddings disagree on whether
/// the window or the container scrolls sideways.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportOverride {
    pub horizontal: AxisSource,
}

impl ViewportOverride {
    pub fn new(horizontal: AxisSource) -> Self {
        Self { horizontal }
    }
}

impl VisibleBand for ViewportOverride {
    fn vertical(&self, sample: &ViewportSample) -> (f64, f64) {
        let w = &sample.window;
        (w.scroll_top, w.scroll_top + w.height)
    }

    fn horizontal(&self, sample: &ViewportSample) -> (f64, f64) {
        let m = self.horizontal.metrics(sample);
        (m.scroll_left, m.scroll_left + m.width)
    }
}

/// Serializable choice of band policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum ViewportMode {
    /// The renderer's stock behavior
    Container,
    /// Window height drives the vertical band
    Override { horizontal: AxisSource },
}

impl Default for ViewportMode {
    fn default() -> Self {
        ViewportMode::Override {
            horizontal: AxisSource::Window,
        }
    }
}

impl ViewportMode {
    /// Builds the policy object for this mode.
    pub fn band(self) -> Rc<dyn VisibleBand> {
        match self {
            ViewportMode::Container => Rc::new(ContainerBand),
            ViewportMode::Override { horizontal } => Rc::new(ViewportOverride::new(horizontal)),
        }
    }
}

/// Generic virtualized page list: which pages to keep rendered.
///
/// The band policy is injected rather than baked into a viewer subclass.
#[derive(Clone)]
pub struct PageVirtualizer {
    band: Rc<dyn VisibleBand>,
    sort_by_visibility: bool,
}

impl PageVirtualizer {
    pub fn new(band: Rc<dyn VisibleBand>, sort_by_visibility: bool) -> Self {
        Self {
            band,
            sort_by_visibility,
        }
    }

    pub fn band(&self) -> &Rc<dyn VisibleBand> {
        &self.band
    }

    /// Computes the visible set for `pages` under the current geometry.
    pub fn visible_pages(&self, sample: &ViewportSample, pages: &[PageView]) -> VisibleSet {
        compute_visible(&self.band.bounds(sample), pages, self.sort_by_visibility)
    }
}
