//! Seams to the document renderer.
//!
//! The renderer parses and paints; this crate only feeds it bytes and tells
//! it which pages are on screen. Everything it needs from the renderer side
//! is expressed by the three traits below.

use super::error::ViewerResult;
use super::range_transport::RangeTransport;
use super::scroll_watcher::ScrollState;
use super::visibility::{PageView, VisibleSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Zoom setting understood by the page viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleValue {
    /// Fit the page width to the viewport
    PageWidth,
    /// Fit the whole page into the viewport
    PageFit,
    /// 100%
    PageActual,
    /// Let the viewer pick
    Auto,
    /// Explicit factor, 1.0 = 100%
    Custom(f64),
}

impl ScaleValue {
    /// Viewer-facing name, `None` for explicit factors.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            ScaleValue::PageWidth => Some("page-width"),
            ScaleValue::PageFit => Some("page-fit"),
            ScaleValue::PageActual => Some("page-actual"),
            ScaleValue::Auto => Some("auto"),
            ScaleValue::Custom(_) => None,
        }
    }
}

impl fmt::Display for ScaleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleValue::Custom(factor) => write!(f, "{}", factor),
            named => f.write_str(named.as_str().unwrap_or_default()),
        }
    }
}

/// Parameters of an open request.
#[derive(Clone)]
pub struct OpenParams {
    /// Total document length in bytes
    pub length: usize,
    /// Source of every byte the renderer reads
    pub range: Rc<RangeTransport>,
    pub range_chunk_size: usize,
    /// Reads only happen through explicit range requests
    pub disable_auto_fetch: bool,
    pub disable_stream: bool,
}

impl fmt::Debug for OpenParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenParams")
            .field("length", &self.length)
            .field("range_chunk_size", &self.range_chunk_size)
            .field("disable_auto_fetch", &self.disable_auto_fetch)
            .field("disable_stream", &self.disable_stream)
            .finish_non_exhaustive()
    }
}

/// Document engine that loads through a [`RangeTransport`].
///
/// `open` resolves once the engine has read enough to hand out a document.
/// Range data arrives through the transport's listeners while the future is
/// pending, so implementations register a listener before requesting.
#[allow(async_fn_in_trait)]
pub trait DocumentRenderer {
    type Document: Clone + 'static;

    async fn open(&self, params: OpenParams) -> ViewerResult<Self::Document>;
}

/// Virtualized page list fed by the visibility computation.
pub trait PageViewer<D> {
    fn set_document(&self, document: &D);

    /// Lends the current page layout, ordered by ascending `offset_top`.
    fn with_pages(&self, f: &mut dyn FnMut(&[PageView]));

    /// Activates the visible pages and deactivates the rest.
    fn update(&self, visible: &VisibleSet, scroll: &ScrollState);

    fn set_scale(&self, scale: ScaleValue);
}

/// Link navigation bound to the opened document.
pub trait LinkService<D> {
    fn set_document(&self, document: &D);
}
