use super::bridge::ChunkBridge;
use super::config::DEFAULT_RANGE_CHUNK_SIZE;
use super::decode::{ChunkEncoding, decode_chunk};
use super::error::{ViewerError, ViewerResult};
use super::event_loop::EventLoop;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives `(begin, bytes)` for every completed range request.
pub type RangeListener = Box<dyn Fn(usize, &[u8])>;

/// Receives `(loaded, total)` after every completed range request.
pub type ProgressListener = Box<dyn Fn(usize, usize)>;

/// State shared with deferred deliveries.
#[derive(Default)]
struct Delivery {
    range_listeners: Vec<Rc<RangeListener>>,
    progress_listeners: Vec<Rc<ProgressListener>>,
    /// Outstanding requests per `begin`
    in_flight: FxHashMap<usize, usize>,
    /// Bytes handed to the renderer so far
    loaded: usize,
}

/// Range transport between a renderer and a synchronous host bridge.
///
/// This is analogous to PDF.js's `PDFDataRangeTransport`: the renderer asks
/// for `[begin, end)` and later receives the bytes through its range
/// listeners. The bridge is queried synchronously, but delivery always
/// happens on a later turn of the event loop. Renderers of this kind are not
/// re-entrant while they issue a request, so delivering inside
/// `request_range` would corrupt their state.
///
/// Nothing is cached: every request is a bridge round-trip, and concurrent
/// requests complete independently.
///
/// # Example
/// ```
/// use pdf_x_viewport::core::{ChunkBridge, ManualEventLoop, RangeTransport};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// struct Zeros;
/// impl ChunkBridge for Zeros {
///     fn get_size(&self) -> usize { 1024 }
///     fn get_chunk(&self, begin: usize, end: usize) -> String {
///         "A".repeat((end - begin) / 3 * 4)
///     }
///     fn on_load(&self) {}
///     fn on_failure(&self) {}
/// }
///
/// let event_loop = Rc::new(ManualEventLoop::new());
/// let transport = RangeTransport::new(1024, Vec::new(), Rc::new(Zeros), event_loop.clone());
///
/// let received = Rc::new(RefCell::new(Vec::new()));
/// let sink = received.clone();
/// transport.add_range_listener(Box::new(move |begin, bytes| {
///     sink.borrow_mut().push((begin, bytes.len()));
/// }));
///
/// transport.request_range(0, 300).unwrap();
/// assert!(received.borrow().is_empty());
///
/// event_loop.run_until_idle();
/// assert_eq!(*received.borrow(), vec![(0, 300)]);
/// ```
pub struct RangeTransport {
    /// Total document length (fixed at construction)
    length: usize,
    /// Bytes the renderer may use before issuing any request
    initial_data: Vec<u8>,
    bridge: Rc<dyn ChunkBridge>,
    event_loop: Rc<dyn EventLoop>,
    encoding: ChunkEncoding,
    /// Expected upper bound of a request span
    chunk_size_hint: usize,
    delivery: Rc<RefCell<Delivery>>,
}

impl RangeTransport {
    /// Creates a transport for a document of `length` bytes.
    ///
    /// # Arguments
    /// * `length` - Total document length as reported by the bridge
    /// * `initial_data` - Leading bytes already available (usually empty)
    /// * `bridge` - Host-side chunk source
    /// * `event_loop` - Where deliveries are deferred to
    pub fn new(
        length: usize,
        initial_data: Vec<u8>,
        bridge: Rc<dyn ChunkBridge>,
        event_loop: Rc<dyn EventLoop>,
    ) -> Self {
        RangeTransport {
            length,
            initial_data,
            bridge,
            event_loop,
            encoding: ChunkEncoding::default(),
            chunk_size_hint: DEFAULT_RANGE_CHUNK_SIZE,
            delivery: Rc::new(RefCell::new(Delivery::default())),
        }
    }

    /// Sets the encoding the bridge uses for payloads.
    pub fn with_encoding(mut self, encoding: ChunkEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the chunk size the renderer was configured with.
    pub fn with_chunk_size_hint(mut self, chunk_size: usize) -> Self {
        self.chunk_size_hint = chunk_size;
        self
    }

    /// Returns the total document length.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn initial_data(&self) -> &[u8] {
        &self.initial_data
    }

    pub fn encoding(&self) -> ChunkEncoding {
        self.encoding
    }

    pub fn chunk_size_hint(&self) -> usize {
        self.chunk_size_hint
    }

    /// Registers a listener for completed ranges.
    pub fn add_range_listener(&self, listener: RangeListener) {
        self.delivery.borrow_mut().range_listeners.push(Rc::new(listener));
    }

    /// Registers a listener for download progress.
    pub fn add_progress_listener(&self, listener: ProgressListener) {
        self.delivery.borrow_mut().progress_listeners.push(Rc::new(listener));
    }

    /// Number of requests issued but not delivered yet.
    pub fn pending_requests(&self) -> usize {
        self.delivery.borrow().in_flight.values().sum()
    }

    /// Total bytes delivered to listeners.
    pub fn bytes_loaded(&self) -> usize {
        self.delivery.borrow().loaded
    }

    /// Requests bytes `[begin, end)`.
    ///
    /// Fetches and decodes synchronously, then schedules delivery of
    /// `(begin, bytes)` on the event loop. Listeners are never called before
    /// this method returns. A payload shorter than requested is delivered as-is.
    ///
    /// # Errors
    /// * `InvalidByteRange` if the range is empty or exceeds the document
    /// * `ChunkDecode` if the bridge payload is not valid for the encoding
    pub fn request_range(&self, begin: usize, end: usize) -> ViewerResult<()> {
        if begin >= end || end > self.length {
            return Err(ViewerError::InvalidByteRange {
                begin,
                end,
                length: self.length,
            });
        }

        let requested = end - begin;
        if requested > self.chunk_size_hint {
            debug!(
                "Range {}..{} spans {} bytes (chunk size {})",
                begin, end, requested, self.chunk_size_hint
            );
        }

        let encoded = self.bridge.get_chunk(begin, end);
        let bytes = decode_chunk(&encoded, self.encoding)?;

        if bytes.len() != requested {
            warn!(
                "Bridge returned {} bytes for range {}..{} ({} requested)",
                bytes.len(),
                begin,
                end,
                requested
            );
        }

        *self.delivery.borrow_mut().in_flight.entry(begin).or_insert(0) += 1;
        debug!("Range {}..{} fetched, delivery deferred", begin, end);

        let delivery = self.delivery.clone();
        let total = self.length;
        self.event_loop.defer(Box::new(move || {
            Self::deliver(&delivery, begin, &bytes, total);
        }));

        Ok(())
    }

    fn deliver(delivery: &RefCell<Delivery>, begin: usize, bytes: &[u8], total: usize) {
        // Listeners run without the borrow held; they may issue new requests.
        let (range_listeners, progress_listeners, loaded) = {
            let mut state = delivery.borrow_mut();
            if let Some(count) = state.in_flight.get_mut(&begin) {
                *count -= 1;
                if *count == 0 {
                    state.in_flight.remove(&begin);
                }
            }
            state.loaded += bytes.len();
            (
                state.range_listeners.clone(),
                state.progress_listeners.clone(),
                state.loaded,
            )
        };

        for listener in &range_listeners {
            listener(begin, bytes);
        }
        for listener in &progress_listeners {
            listener(loaded.min(total), total);
        }
    }
}
