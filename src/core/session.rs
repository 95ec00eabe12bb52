//! Document session: from "how long is it" to a scrolling, virtualized viewer.

use super::bridge::ChunkBridge;
use super::config::SessionConfig;
use super::error::{ViewerError, ViewerResult};
use super::event_loop::EventLoop;
use super::range_transport::RangeTransport;
use super::renderer::{DocumentRenderer, LinkService, OpenParams, PageViewer};
use super::scroll_watcher::{ScrollSource, ScrollState, ScrollWatcher};
use super::viewport::{PageVirtualizer, ViewportHost, VisibleBand};
use super::visibility::{PageView, VisibleSet};
use log::{debug, error, info, trace};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Lifecycle of a [`DocumentSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LengthKnown { length: usize },
    Opening { length: usize },
    Ready,
    /// Open was rejected; carries the renderer's reason
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::LengthKnown { .. } => "LengthKnown",
            SessionState::Opening { .. } => "Opening",
            SessionState::Ready => "Ready",
            SessionState::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::LengthKnown { length } | SessionState::Opening { length } => {
                write!(f, "{} ({} bytes)", self.name(), length)
            }
            SessionState::Failed(reason) => write!(f, "Failed ({})", reason),
            _ => f.write_str(self.name()),
        }
    }
}

/// Scroll offset as seen by the band policy.
struct BandOffset {
    host: Rc<dyn ViewportHost>,
    band: Rc<dyn VisibleBand>,
}

impl ScrollSource for BandOffset {
    fn scroll_offset(&self) -> f64 {
        self.band.scroll_offset(&self.host.sample())
    }
}

/// One visibility recompute: sample, compute, hand to the viewer.
struct VisibilityPass<D> {
    host: Rc<dyn ViewportHost>,
    virtualizer: PageVirtualizer,
    viewer: Rc<dyn PageViewer<D>>,
}

impl<D> VisibilityPass<D> {
    fn run(&self, scroll: &ScrollState) -> VisibleSet {
        let sample = self.host.sample();
        let mut visible = VisibleSet::default();
        self.viewer.with_pages(&mut |pages: &[PageView]| {
            visible = self.virtualizer.visible_pages(&sample, pages);
        });

        trace!(
            "Visible pages: {:?} (first={:?}, last={:?})",
            visible.ids().collect::<Vec<_>>(),
            visible.first.map(|e| e.id),
            visible.last.map(|e| e.id)
        );
        self.viewer.update(&visible, scroll);
        visible
    }
}

/// Orchestrates one document from length discovery to a ready viewer.
///
/// All collaborators are passed in; nothing is looked up globally. The
/// session lives on the event-loop thread and is driven through `&self`, so
/// the host can keep forwarding scroll notifications while
/// [`open`](Self::open) is awaiting the renderer.
pub struct DocumentSession<R: DocumentRenderer> {
    config: SessionConfig,
    bridge: Rc<dyn ChunkBridge>,
    renderer: R,
    viewer: Rc<dyn PageViewer<R::Document>>,
    links: Rc<dyn LinkService<R::Document>>,
    host: Rc<dyn ViewportHost>,
    event_loop: Rc<dyn EventLoop>,
    pass: Rc<VisibilityPass<R::Document>>,
    state: RefCell<SessionState>,
    transport: RefCell<Option<Rc<RangeTransport>>>,
    document: RefCell<Option<R::Document>>,
    watcher: RefCell<Option<ScrollWatcher>>,
}

impl<R: DocumentRenderer> DocumentSession<R> {
    /// Creates an idle session.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(
        config: SessionConfig,
        bridge: Rc<dyn ChunkBridge>,
        renderer: R,
        viewer: Rc<dyn PageViewer<R::Document>>,
        links: Rc<dyn LinkService<R::Document>>,
        host: Rc<dyn ViewportHost>,
        event_loop: Rc<dyn EventLoop>,
    ) -> ViewerResult<Self> {
        config.validate()?;

        let virtualizer = PageVirtualizer::new(config.viewport.band(), config.sort_by_visibility);
        let pass = Rc::new(VisibilityPass {
            host: host.clone(),
            virtualizer,
            viewer: viewer.clone(),
        });

        Ok(DocumentSession {
            config,
            bridge,
            renderer,
            viewer,
            links,
            host,
            event_loop,
            pass,
            state: RefCell::new(SessionState::Idle),
            transport: RefCell::new(None),
            document: RefCell::new(None),
            watcher: RefCell::new(None),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The transport serving the renderer, once opening has begun.
    pub fn transport(&self) -> Option<Rc<RangeTransport>> {
        self.transport.borrow().clone()
    }

    pub fn document(&self) -> Option<R::Document> {
        self.document.borrow().clone()
    }

    /// Direction state of the running watcher.
    pub fn scroll_state(&self) -> Option<ScrollState> {
        self.watcher.borrow().as_ref().map(ScrollWatcher::state)
    }

    /// Asks the bridge for the document length. `Idle -> LengthKnown`.
    pub fn learn_length(&self) -> ViewerResult<usize> {
        self.expect_state("Idle", |s| matches!(s, SessionState::Idle))?;

        let length = self.bridge.get_size();
        info!("Document length: {} bytes", length);
        self.state.replace(SessionState::LengthKnown { length });
        Ok(length)
    }

    /// Builds the transport and the open request. `LengthKnown -> Opening`.
    pub fn begin_open(&self) -> ViewerResult<OpenParams> {
        let length = match &*self.state.borrow() {
            SessionState::LengthKnown { length } => *length,
            other => {
                return Err(ViewerError::InvalidState {
                    expected: "LengthKnown",
                    actual: other.to_string(),
                });
            }
        };

        let transport = Rc::new(
            RangeTransport::new(
                length,
                Vec::new(),
                self.bridge.clone(),
                self.event_loop.clone(),
            )
            .with_encoding(self.config.chunk_encoding)
            .with_chunk_size_hint(self.config.range_chunk_size),
        );
        self.transport.replace(Some(transport.clone()));
        self.state.replace(SessionState::Opening { length });

        debug!(
            "Opening document: chunk size {}, auto fetch {}, stream {}",
            self.config.range_chunk_size,
            !self.config.disable_auto_fetch,
            !self.config.disable_stream
        );

        Ok(OpenParams {
            length,
            range: transport,
            range_chunk_size: self.config.range_chunk_size,
            disable_auto_fetch: self.config.disable_auto_fetch,
            disable_stream: self.config.disable_stream,
        })
    }

    /// Runs the whole startup and reports the outcome to the bridge.
    ///
    /// Learns the length if that has not happened yet. On success the
    /// document is bound to the viewer and the link service, scroll sampling
    /// starts, and `on_load` is called. On failure `on_failure` is called
    /// once and the session stays `Failed`; nothing is retried.
    pub async fn open(&self) -> ViewerResult<()> {
        if matches!(*self.state.borrow(), SessionState::Idle) {
            self.learn_length()?;
        }
        let params = self.begin_open()?;

        match self.renderer.open(params).await {
            Ok(document) => {
                self.finish_open(document);
                Ok(())
            }
            Err(e) => Err(self.fail_open(e)),
        }
    }

    fn finish_open(&self, document: R::Document) {
        self.document.replace(Some(document.clone()));
        self.viewer.set_document(&document);
        self.links.set_document(&document);

        let source = Rc::new(BandOffset {
            host: self.host.clone(),
            band: self.pass.virtualizer.band().clone(),
        });
        let pass = self.pass.clone();
        let watcher = ScrollWatcher::watch(
            source,
            self.event_loop.clone(),
            Box::new(move |scroll| {
                pass.run(scroll);
                Ok(())
            }),
        );
        self.watcher.replace(Some(watcher));

        self.state.replace(SessionState::Ready);
        info!("Document ready");
        self.bridge.on_load();
    }

    fn fail_open(&self, cause: ViewerError) -> ViewerError {
        let reason = match cause {
            ViewerError::OpenFailed(reason) => reason,
            other => other.to_string(),
        };
        error!("Failed to open document: {}", reason);

        self.state.replace(SessionState::Failed(reason.clone()));
        self.bridge.on_failure();
        ViewerError::OpenFailed(reason)
    }

    /// Scroll notification from the viewer container or any descendant.
    pub fn on_scroll(&self) {
        match &*self.watcher.borrow() {
            Some(watcher) => watcher.on_scroll(),
            None => trace!("Scroll before the document is ready, ignored"),
        }
    }

    /// The viewer finished laying out its pages; applies the initial scale.
    pub fn on_pages_init(&self) -> ViewerResult<()> {
        self.expect_state("Ready", |s| matches!(s, SessionState::Ready))?;

        if let Some(scale) = self.config.initial_scale {
            info!("Applying initial scale {}", scale);
            self.viewer.set_scale(scale);
        }
        self.refresh().map(|_| ())
    }

    /// Recomputes visibility now, outside the scroll path (resize, relayout).
    pub fn refresh(&self) -> ViewerResult<VisibleSet> {
        let scroll = self
            .scroll_state()
            .ok_or_else(|| ViewerError::InvalidState {
                expected: "Ready",
                actual: self.state.borrow().to_string(),
            })?;
        Ok(self.pass.run(&scroll))
    }

    fn expect_state(
        &self,
        expected: &'static str,
        accept: impl Fn(&SessionState) -> bool,
    ) -> ViewerResult<()> {
        let state = self.state.borrow();
        if accept(&*state) {
            Ok(())
        } else {
            Err(ViewerError::InvalidState {
                expected,
                actual: state.to_string(),
            })
        }
    }
}
