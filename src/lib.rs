pub mod core;

// Re-export main types for convenience
pub use core::{
    ChunkBridge, DocumentRenderer, DocumentSession, EventLoop, FileChunkBridge, LinkService,
    ManualEventLoop, PageView, PageViewer, PageVirtualizer, RangeTransport, ScrollWatcher,
    SessionConfig, SessionState, TokioEventLoop, ViewerError, ViewerResult, ViewportHost,
    ViewportOverride, VisibleSet, compute_visible,
};
