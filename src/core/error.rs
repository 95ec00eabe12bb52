use thiserror::Error;

/// Universal error type for viewer operations.
///
/// Covers everything that can go wrong while streaming byte ranges from the
/// host bridge, driving the document session, and wiring the viewer.
/// Geometry degeneracies (empty page lists, zero-height pages) are never
/// errors; the visibility computation resolves them locally.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Requested byte range violates `0 <= begin < end <= length`
    #[error("Invalid byte range: {begin}..{end} (document length {length})")]
    InvalidByteRange {
        begin: usize,
        end: usize,
        length: usize,
    },

    /// The bridge returned a payload that is not valid for the configured encoding
    #[error("Chunk decode error: {0}")]
    ChunkDecode(String),

    /// Session operation invoked in the wrong lifecycle state
    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// The renderer rejected the byte stream
    #[error("Failed to open document: {0}")]
    OpenFailed(String),

    /// A recompute callback reported a failure
    #[error("Callback failed: {0}")]
    Callback(String),

    /// I/O failure in a host-side bridge implementation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session configuration could not be parsed
    #[error("Malformed configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Session configuration parsed but holds an unusable value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;
