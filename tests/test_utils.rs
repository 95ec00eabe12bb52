//! Test utilities and helpers for viewport tests
//!
//! In-memory stand-ins for the host bridge, the document renderer, the page
//! viewer and the host geometry, shared by the integration tests.

#![allow(dead_code)]

use pdf_x_viewport::core::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Installs a test logger once; repeated calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Document bytes: a `%PDF-1.7` header followed by `i % 251` filler.
pub fn sample_document(length: usize) -> Vec<u8> {
    let mut data: Vec<u8> = (0..length).map(|i| (i % 251) as u8).collect();
    let header = b"%PDF-1.7\n";
    let n = header.len().min(length);
    data[..n].copy_from_slice(&header[..n]);
    data
}

/// Bridge serving an in-memory byte buffer.
pub struct MemoryBridge {
    data: Vec<u8>,
    encoding: ChunkEncoding,
    pub chunk_calls: RefCell<Vec<(usize, usize)>>,
    pub size_calls: Cell<usize>,
    pub loads: Cell<usize>,
    pub failures: Cell<usize>,
}

impl MemoryBridge {
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_encoding(data, ChunkEncoding::Base64)
    }

    pub fn with_encoding(data: Vec<u8>, encoding: ChunkEncoding) -> Self {
        MemoryBridge {
            data,
            encoding,
            chunk_calls: RefCell::new(Vec::new()),
            size_calls: Cell::new(0),
            loads: Cell::new(0),
            failures: Cell::new(0),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl ChunkBridge for MemoryBridge {
    fn get_size(&self) -> usize {
        self.size_calls.set(self.size_calls.get() + 1);
        self.data.len()
    }

    fn get_chunk(&self, begin: usize, end: usize) -> String {
        self.chunk_calls.borrow_mut().push((begin, end));
        let end = end.min(self.data.len());
        encode_chunk(&self.data[begin..end], self.encoding)
    }

    fn on_load(&self) {
        self.loads.set(self.loads.get() + 1);
    }

    fn on_failure(&self) {
        self.failures.set(self.failures.get() + 1);
    }
}

/// What the mock renderer produces.
#[derive(Debug, Clone, PartialEq)]
pub struct MockDocument {
    pub length: usize,
    pub header: Vec<u8>,
}

/// Options the renderer was opened with, minus the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeenParams {
    pub length: usize,
    pub range_chunk_size: usize,
    pub disable_auto_fetch: bool,
    pub disable_stream: bool,
}

/// Renderer that reads the header and the trailer through the transport
/// and accepts the document if it starts with `%PDF`.
#[derive(Default)]
pub struct MockRenderer {
    pub seen: RefCell<Option<SeenParams>>,
    /// Chunks received, in delivery order
    pub received: Rc<RefCell<Vec<(usize, usize)>>>,
}

pub const PROBE_SIZE: usize = 1024;

impl DocumentRenderer for MockRenderer {
    type Document = MockDocument;

    async fn open(&self, params: OpenParams) -> ViewerResult<MockDocument> {
        self.seen.replace(Some(SeenParams {
            length: params.length,
            range_chunk_size: params.range_chunk_size,
            disable_auto_fetch: params.disable_auto_fetch,
            disable_stream: params.disable_stream,
        }));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let received = self.received.clone();
        params.range.add_range_listener(Box::new(move |begin, bytes| {
            received.borrow_mut().push((begin, bytes.len()));
            let _ = tx.send((begin, bytes.to_vec()));
        }));

        let length = params.length;
        let probe = PROBE_SIZE.min(length);
        params.range.request_range(0, probe)?;
        params.range.request_range(length - probe, length)?;

        let mut header = None;
        for _ in 0..2 {
            let (begin, bytes) = rx
                .recv()
                .await
                .ok_or_else(|| ViewerError::OpenFailed("transport closed".into()))?;
            if begin == 0 {
                header = Some(bytes);
            }
        }

        match header {
            Some(header) if header.starts_with(b"%PDF") => Ok(MockDocument { length, header }),
            _ => Err(ViewerError::OpenFailed("Invalid PDF structure".into())),
        }
    }
}

/// Page viewer holding a fixed layout and recording what it is told.
#[derive(Default)]
pub struct MockViewer {
    pub pages: RefCell<Vec<PageView>>,
    pub document: RefCell<Option<MockDocument>>,
    pub updates: RefCell<Vec<(VisibleSet, ScrollState)>>,
    pub scales: RefCell<Vec<ScaleValue>>,
}

impl MockViewer {
    /// `count` pages of 600x`height`, stacked with no gap.
    pub fn stacked(count: u32, height: f64) -> Self {
        let viewer = MockViewer::default();
        viewer.pages.replace(
            (0..count)
                .map(|i| PageView::new(i + 1, PageRect::new(f64::from(i) * height, 0.0, 600.0, height)))
                .collect(),
        );
        viewer
    }

    pub fn last_visible_ids(&self) -> Option<Vec<u32>> {
        self.updates
            .borrow()
            .last()
            .map(|(visible, _)| visible.ids().collect())
    }
}

impl PageViewer<MockDocument> for MockViewer {
    fn set_document(&self, document: &MockDocument) {
        self.document.replace(Some(document.clone()));
    }

    fn with_pages(&self, f: &mut dyn FnMut(&[PageView])) {
        f(self.pages.borrow().as_slice());
    }

    fn update(&self, visible: &VisibleSet, scroll: &ScrollState) {
        self.updates.borrow_mut().push((visible.clone(), *scroll));
    }

    fn set_scale(&self, scale: ScaleValue) {
        self.scales.borrow_mut().push(scale);
    }
}

#[derive(Default)]
pub struct MockLinks {
    pub document: RefCell<Option<MockDocument>>,
}

impl LinkService<MockDocument> for MockLinks {
    fn set_document(&self, document: &MockDocument) {
        self.document.replace(Some(document.clone()));
    }
}

/// Host geometry the tests move around.
pub struct MockHost {
    pub sample: Cell<ViewportSample>,
}

impl MockHost {
    /// Container stretched to `content_height`, window showing `window_height`.
    pub fn stretched(content_height: f64, window_height: f64) -> Self {
        MockHost {
            sample: Cell::new(ViewportSample {
                container: ScrollMetrics::new(0.0, 0.0, 600.0, content_height),
                window: ScrollMetrics::new(0.0, 0.0, 600.0, window_height),
            }),
        }
    }

    pub fn scroll_window_to(&self, y: f64) {
        let mut sample = self.sample.get();
        sample.window.scroll_top = y;
        self.sample.set(sample);
    }

    pub fn scroll_container_to(&self, y: f64) {
        let mut sample = self.sample.get();
        sample.container.scroll_top = y;
        self.sample.set(sample);
    }
}

impl ViewportHost for MockHost {
    fn sample(&self) -> ViewportSample {
        self.sample.get()
    }
}

/// Session wired to the mocks, with handles to inspect them.
pub struct Fixture {
    pub bridge: Rc<MemoryBridge>,
    pub viewer: Rc<MockViewer>,
    pub links: Rc<MockLinks>,
    pub host: Rc<MockHost>,
    pub session: DocumentSession<MockRenderer>,
}

/// Ten 1000px pages, an 800px window, and a session over `data`.
pub fn fixture(
    config: SessionConfig,
    data: Vec<u8>,
    event_loop: Rc<dyn EventLoop>,
) -> ViewerResult<Fixture> {
    let bridge = Rc::new(MemoryBridge::with_encoding(data, config.chunk_encoding));
    let viewer = Rc::new(MockViewer::stacked(10, 1000.0));
    let links = Rc::new(MockLinks::default());
    let host = Rc::new(MockHost::stretched(10_000.0, 800.0));

    let session = DocumentSession::new(
        config,
        bridge.clone(),
        MockRenderer::default(),
        viewer.clone(),
        links.clone(),
        host.clone(),
        event_loop,
    )?;

    Ok(Fixture {
        bridge,
        viewer,
        links,
        host,
        session,
    })
}
