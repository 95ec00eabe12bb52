pub mod bridge;
pub mod config;
pub mod decode;
pub mod error;
pub mod event_loop;
pub mod range_transport;
pub mod renderer;
pub mod scroll_watcher;
pub mod session;
pub mod viewport;
pub mod visibility;

pub use bridge::{ChunkBridge, FileChunkBridge, LoadOutcome};
pub use config::{DEFAULT_FRAME_INTERVAL_MS, DEFAULT_RANGE_CHUNK_SIZE, SessionConfig};
pub use decode::{ChunkEncoding, decode_chunk, encode_chunk};
pub use error::{ViewerError, ViewerResult};
pub use event_loop::{EventLoop, ManualEventLoop, Task, TokioEventLoop};
pub use range_transport::{ProgressListener, RangeListener, RangeTransport};
pub use renderer::{DocumentRenderer, LinkService, OpenParams, PageViewer, ScaleValue};
pub use scroll_watcher::{RecomputeCallback, ScrollSource, ScrollState, ScrollWatcher};
pub use session::{DocumentSession, SessionState};
pub use viewport::{
    AxisSource, ContainerBand, PageVirtualizer, ScrollMetrics, ViewportHost, ViewportMode,
    ViewportOverride, ViewportSample, VisibleBand,
};
pub use visibility::{
    PageRect, PageView, ViewportBounds, VisibilityEntry, VisibleSet, binary_search_first_item,
    compute_visible,
};
