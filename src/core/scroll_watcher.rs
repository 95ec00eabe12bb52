//! Frame-aligned scroll sampling.
//!
//! Scroll notifications arrive far more often than frames are painted. The
//! watcher turns them into at most one recompute per animation frame and
//! tracks the scroll direction so the renderer can prefetch ahead of the
//! user. Mirrors `watchScroll` from PDF.js's `ui_utils.js`.

use super::error::ViewerResult;
use super::event_loop::EventLoop;
use log::{error, trace};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// Direction-tracking state shared with the recompute callback.
///
/// Only the watcher's frame callback writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// True while the last observed movement was downwards
    pub down: bool,
    /// Scroll offset observed at the last frame
    pub last_y: f64,
}

/// Current vertical scroll offset of the watched element.
pub trait ScrollSource {
    fn scroll_offset(&self) -> f64;
}

impl<F> ScrollSource for F
where
    F: Fn() -> f64,
{
    fn scroll_offset(&self) -> f64 {
        self()
    }
}

/// Recompute callback run once per frame that saw scroll activity.
pub type RecomputeCallback = Box<dyn FnMut(&ScrollState) -> ViewerResult<()>>;

struct WatcherInner {
    source: Rc<dyn ScrollSource>,
    event_loop: Rc<dyn EventLoop>,
    state: Cell<ScrollState>,
    /// Set while a frame is requested and has not fired yet
    frame_pending: Cell<bool>,
    attached: Cell<bool>,
    callback: RefCell<RecomputeCallback>,
}

/// Coalescing scroll listener.
///
/// The host forwards every scroll notification from the watched element and
/// from any of its descendants to [`on_scroll`](Self::on_scroll), the same
/// way a capture-phase listener would see them.
///
/// Callback panics are caught only where panics unwind. Under
/// `panic = "abort"` (the `release-wasm` profile) a panicking callback still
/// ends sampling.
pub struct ScrollWatcher {
    inner: Rc<WatcherInner>,
}

impl ScrollWatcher {
    /// Starts watching `source`.
    ///
    /// The initial state is `down = true` with `last_y` at the current offset.
    pub fn watch(
        source: Rc<dyn ScrollSource>,
        event_loop: Rc<dyn EventLoop>,
        callback: RecomputeCallback,
    ) -> Self {
        let initial = ScrollState {
            down: true,
            last_y: source.scroll_offset(),
        };

        ScrollWatcher {
            inner: Rc::new(WatcherInner {
                source,
                event_loop,
                state: Cell::new(initial),
                frame_pending: Cell::new(false),
                attached: Cell::new(true),
                callback: RefCell::new(callback),
            }),
        }
    }

    /// Scroll notification. Dropped if a frame is already pending.
    pub fn on_scroll(&self) {
        let inner = &self.inner;
        if !inner.attached.get() || inner.frame_pending.get() {
            return;
        }
        inner.frame_pending.set(true);

        let weak = Rc::downgrade(inner);
        inner
            .event_loop
            .request_frame(Box::new(move || WatcherInner::frame_fired(&weak)));
    }

    /// Current direction state.
    pub fn state(&self) -> ScrollState {
        self.inner.state.get()
    }

    /// Returns true while a frame is requested for this watcher.
    pub fn is_frame_pending(&self) -> bool {
        self.inner.frame_pending.get()
    }

    /// Stops sampling. A frame that is already requested does nothing.
    pub fn unwatch(&self) {
        self.inner.attached.set(false);
    }

    pub fn is_watching(&self) -> bool {
        self.inner.attached.get()
    }
}

impl WatcherInner {
    fn frame_fired(weak: &Weak<WatcherInner>) {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        // Cleared first so notifications raised by the callback schedule the next frame.
        inner.frame_pending.set(false);
        if !inner.attached.get() {
            return;
        }

        let current_y = inner.source.scroll_offset();
        let mut state = inner.state.get();
        if current_y != state.last_y {
            state.down = current_y > state.last_y;
        }
        state.last_y = current_y;
        inner.state.set(state);

        trace!("Scroll frame: y={} down={}", state.last_y, state.down);

        let Ok(mut callback) = inner.callback.try_borrow_mut() else {
            error!("Recompute callback is still running, skipping frame");
            return;
        };

        // Nothing may unwind out of a frame callback: it would end sampling for good.
        match panic::catch_unwind(AssertUnwindSafe(|| (*callback)(&state))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Visibility recompute failed: {}", e),
            Err(_) => error!("Visibility recompute panicked"),
        }
    }
}
