//! Deferred-task and animation-frame primitives.
//!
//! Everything in this crate runs on one thread. The only two places where work
//! is postponed are range delivery (which must never happen inside the
//! renderer's own request call) and scroll sampling (which is aligned to
//! animation frames). Both go through [`EventLoop`] so the embedding decides
//! what a "later turn" and a "frame" actually are.

use super::config::SessionConfig;
use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Scheduling surface for the single-threaded event loop.
pub trait EventLoop {
    /// Runs `task` on a later turn, after the current call stack has unwound.
    fn defer(&self, task: Task);

    /// Runs `callback` on the next animation frame.
    ///
    /// All callbacks requested before a frame fires run in that frame, in
    /// request order.
    fn request_frame(&self, callback: Task);
}

/// [`EventLoop`] backed by tokio's `LocalSet`.
///
/// Must be used from inside a `LocalSet` (e.g. `LocalSet::run_until`), since
/// tasks are spawned with `tokio::task::spawn_local`.
pub struct TokioEventLoop {
    frame_interval: Duration,
    frame_queue: Rc<RefCell<Vec<Task>>>,
    frame_armed: Rc<Cell<bool>>,
}

impl TokioEventLoop {
    /// Creates an event loop whose frame clock ticks every `frame_interval`.
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            frame_queue: Rc::new(RefCell::new(Vec::new())),
            frame_armed: Rc::new(Cell::new(false)),
        }
    }

    /// Creates an event loop ticking at the configured `frameIntervalMs`.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.frame_interval())
    }

    /// Returns the frame interval.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

impl EventLoop for TokioEventLoop {
    fn defer(&self, task: Task) {
        tokio::task::spawn_local(async move {
            task();
        });
    }

    fn request_frame(&self, callback: Task) {
        self.frame_queue.borrow_mut().push(callback);

        if self.frame_armed.replace(true) {
            return;
        }

        let queue = self.frame_queue.clone();
        let armed = self.frame_armed.clone();
        let interval = self.frame_interval;

        tokio::task::spawn_local(async move {
            tokio::time::sleep(interval).await;
            armed.set(false);
            let batch = std::mem::take(&mut *queue.borrow_mut());
            trace!("Animation frame: {} callback(s)", batch.len());
            for callback in batch {
                callback();
            }
        });
    }
}

/// [`EventLoop`] driven explicitly by the host.
///
/// For embeddings that own their loop (a native vsync callback, a UI
/// toolkit's idle handler) and for deterministic tests.
#[derive(Default)]
pub struct ManualEventLoop {
    tasks: RefCell<VecDeque<Task>>,
    frames: RefCell<Vec<Task>>,
}

impl ManualEventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs deferred tasks until none are left, including ones queued while
    /// running. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs: tasks may defer more work.
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    /// Fires one animation frame. Callbacks requested during the frame wait
    /// for the next one. Returns how many ran.
    pub fn fire_frame(&self) -> usize {
        let batch = std::mem::take(&mut *self.frames.borrow_mut());
        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }

    /// Number of deferred tasks waiting.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }
}

impl EventLoop for ManualEventLoop {
    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }

    fn request_frame(&self, callback: Task) {
        self.frames.borrow_mut().push(callback);
    }
}
