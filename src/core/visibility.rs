//! Page visibility computation.
//!
//! Given the visible band of the viewport and the page views in layout order,
//! works out which pages intersect the band and how much of each page's
//! height is on screen. This runs on every scroll frame, so it locates the
//! first candidate with a binary search and stops scanning as soon as pages
//! start below the band.
//!
//! Mirrors `getVisibleElements` / `binarySearchFirstItem` from PDF.js's
//! `ui_utils.js`.

use smallvec::SmallVec;
use std::cmp::Ordering;

/// Percentages closer than this are treated as equal when sorting.
const PERCENT_TOLERANCE: f64 = 0.001;

/// Inline capacity for visible entries; a handful of pages fit on screen at once.
pub const INLINE_VISIBLE: usize = 8;

/// Layout rectangle of a page, in viewport-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageRect {
    pub offset_top: f64,
    pub offset_left: f64,
    pub width: f64,
    pub height: f64,
}

impl PageRect {
    pub fn new(offset_top: f64, offset_left: f64, width: f64, height: f64) -> Self {
        Self {
            offset_top,
            offset_left,
            width,
            height,
        }
    }

    /// Bottom edge (`offset_top + height`).
    pub fn bottom(&self) -> f64 {
        self.offset_top + self.height
    }

    /// Right edge (`offset_left + width`).
    pub fn right(&self) -> f64 {
        self.offset_left + self.width
    }
}

/// One page as laid out by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageView {
    /// 1-based page number, stable, matches render order
    pub id: u32,
    pub rect: PageRect,
}

impl PageView {
    pub fn new(id: u32, rect: PageRect) -> Self {
        Self { id, rect }
    }
}

/// The visible band, in the same coordinate space as [`PageRect`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportBounds {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl ViewportBounds {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Bounds from scroll offsets plus viewport size.
    pub fn from_scroll(scroll_top: f64, height: f64, scroll_left: f64, width: f64) -> Self {
        Self::new(scroll_top, scroll_top + height, scroll_left, scroll_left + width)
    }
}

/// A page intersecting the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    /// Share of the page height inside the band, 0..=100, truncated
    pub percent: u32,
}

/// Result of a visibility computation.
///
/// `first` and `last` are the spatial extremes of the visible set (the first
/// and last pages met while scanning in layout order). Sorting `views` by
/// visibility never changes them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleSet {
    pub first: Option<VisibilityEntry>,
    pub last: Option<VisibilityEntry>,
    pub views: SmallVec<[VisibilityEntry; INLINE_VISIBLE]>,
}

impl VisibleSet {
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns true if page `id` intersects the viewport.
    pub fn contains(&self, id: u32) -> bool {
        self.views.iter().any(|entry| entry.id == id)
    }

    /// Page ids in `views` order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.views.iter().map(|entry| entry.id)
    }
}

/// Returns the index of the first item for which `condition` holds.
///
/// `items` must be partitioned by `condition`: every item failing it comes
/// before every item satisfying it. Returns `items.len()` when no item
/// satisfies the condition, including for an empty slice.
pub fn binary_search_first_item<T, F>(items: &[T], condition: F) -> usize
where
    F: Fn(&T) -> bool,
{
    items.partition_point(|item| !condition(item))
}

/// Computes which pages intersect `bounds` and by how much.
///
/// `pages` must be sorted by ascending `offset_top` with finite geometry. A
/// NaN offset or height breaks the binary search and visible pages can be
/// skipped; debug builds assert against it. With
/// `sort_by_visibility`, `views` is reordered most-visible first (ties by
/// ascending id) so callers can render in priority order.
///
/// # Example
/// ```
/// use pdf_x_viewport::core::visibility::{compute_visible, PageRect, PageView, ViewportBounds};
///
/// let pages: Vec<PageView> = (0..3)
///     .map(|i| PageView::new(i + 1, PageRect::new(i as f64 * 100.0, 0.0, 100.0, 100.0)))
///     .collect();
/// let visible = compute_visible(&ViewportBounds::new(50.0, 150.0, 0.0, 100.0), &pages, false);
///
/// assert_eq!(visible.ids().collect::<Vec<_>>(), vec![1, 2]);
/// assert_eq!(visible.views[0].percent, 50);
/// ```
pub fn compute_visible(bounds: &ViewportBounds, pages: &[PageView], sort_by_visibility: bool) -> VisibleSet {
    let ViewportBounds {
        top,
        bottom,
        left,
        right,
    } = *bounds;

    debug_assert!(
        pages
            .iter()
            .all(|p| !p.rect.offset_top.is_nan() && !p.rect.height.is_nan()),
        "page geometry must not be NaN"
    );

    let first_candidate = binary_search_first_item(pages, |page| page.rect.bottom() > top);

    let mut views: SmallVec<[VisibilityEntry; INLINE_VISIBLE]> = SmallVec::new();
    for page in &pages[first_candidate..] {
        let rect = &page.rect;

        // Layout order: everything after this starts lower still.
        if rect.offset_top > bottom {
            break;
        }

        // A horizontal miss says nothing about the next page.
        if rect.right() < left || rect.offset_left > right {
            continue;
        }

        views.push(VisibilityEntry {
            id: page.id,
            x: rect.offset_left,
            y: rect.offset_top,
            percent: visible_percent(rect, top, bottom),
        });
    }

    let first = views.first().copied();
    let last = views.last().copied();

    if sort_by_visibility {
        // Stable: equal keys keep layout order, though ids already break ties.
        views.sort_by(compare_by_visibility);
    }

    VisibleSet { first, last, views }
}

/// Share of the page's height inside `[top, bottom]`, truncated to an integer.
///
/// Zero-height pages report 0.
fn visible_percent(rect: &PageRect, top: f64, bottom: f64) -> u32 {
    let height = rect.height;
    if height <= 0.0 {
        return 0;
    }

    let hidden = (top - rect.offset_top).max(0.0) + (rect.bottom() - bottom).max(0.0);
    let percent = ((height - hidden) * 100.0 / height).clamp(0.0, 100.0);
    percent as u32
}

fn compare_by_visibility(a: &VisibilityEntry, b: &VisibilityEntry) -> Ordering {
    let delta = f64::from(a.percent) - f64::from(b.percent);
    if delta.abs() > PERCENT_TOLERANCE {
        // Higher percentage first
        b.percent.cmp(&a.percent)
    } else {
        a.id.cmp(&b.id)
    }
}
