use super::decode::{ChunkEncoding, encode_chunk};
use super::error::ViewerResult;
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Host-side provider of document bytes.
///
/// This is the contract the embedding application implements (on Android it
/// is a JavaScript interface object, on desktop it can be a file or a cache).
/// It is a plain synchronous interface: the asynchronous behavior the
/// renderer expects is layered on top by [`RangeTransport`].
///
/// Implementers are responsible for:
/// - Knowing the total document length up front
/// - Returning `[begin, end)` in the agreed text-safe encoding
/// - Accepting exactly one of `on_load` / `on_failure` per session
///
/// [`RangeTransport`]: super::range_transport::RangeTransport
pub trait ChunkBridge {
    /// Returns the total document length in bytes.
    fn get_size(&self) -> usize;

    /// Returns the bytes `[begin, end)` in the bridge's encoding.
    ///
    /// The payload should represent exactly `end - begin` bytes. A shorter
    /// payload is forwarded to the renderer untouched.
    fn get_chunk(&self, begin: usize, end: usize) -> String;

    /// The document opened successfully.
    fn on_load(&self);

    /// The document could not be opened.
    fn on_failure(&self);
}

/// Outcome reported to a bridge at the end of the opening phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// A bridge that serves byte ranges from a file on disk.
///
/// Only the requested range is read per call; nothing is cached, the renderer
/// owns whatever it keeps. Useful for desktop embeddings and as a reference
/// host implementation.
pub struct FileChunkBridge {
    /// File handle for reading ranges
    file: RefCell<File>,
    /// Path to the file (stored for reference)
    file_path: PathBuf,
    /// Total file length, read once at open
    total_length: usize,
    /// Encoding applied to every payload
    encoding: ChunkEncoding,
    /// Set by `on_load` / `on_failure`
    outcome: Cell<Option<LoadOutcome>>,
}

impl FileChunkBridge {
    /// Opens a file and records its length.
    ///
    /// # Arguments
    /// * `path` - Path to the document
    /// * `encoding` - Encoding to apply to payloads (must match the transport's)
    pub fn open<P: AsRef<Path>>(path: P, encoding: ChunkEncoding) -> ViewerResult<Self> {
        let file_path = path.as_ref().to_path_buf();
        let mut file = File::open(&file_path)?;

        let length = file.seek(SeekFrom::End(0))? as usize;
        file.seek(SeekFrom::Start(0))?;

        debug!("Opened {} ({} bytes)", file_path.display(), length);

        Ok(FileChunkBridge {
            file: RefCell::new(file),
            file_path,
            total_length: length,
            encoding,
            outcome: Cell::new(None),
        })
    }

    /// Returns the path this bridge reads from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the outcome the session reported, if any.
    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.outcome.get()
    }

    fn read_range(&self, begin: usize, end: usize) -> ViewerResult<Vec<u8>> {
        let end = end.min(self.total_length);
        if begin >= end {
            return Ok(Vec::new());
        }

        let mut guard = self.file.borrow_mut();
        let file: &mut File = &mut guard;
        file.seek(SeekFrom::Start(begin as u64))?;

        let mut buffer = Vec::with_capacity(end - begin);
        file.take((end - begin) as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn record(&self, outcome: LoadOutcome) {
        if let Some(previous) = self.outcome.replace(Some(outcome)) {
            warn!(
                "{}: outcome reported twice ({:?} then {:?})",
                self.file_path.display(),
                previous,
                outcome
            );
        }
    }
}

impl ChunkBridge for FileChunkBridge {
    fn get_size(&self) -> usize {
        self.total_length
    }

    fn get_chunk(&self, begin: usize, end: usize) -> String {
        let bytes = match self.read_range(begin, end) {
            Ok(bytes) => bytes,
            Err(e) => {
                // A short payload is the renderer's problem, not ours.
                error!("{}: failed to read {}..{}: {}", self.file_path.display(), begin, end, e);
                Vec::new()
            }
        };
        encode_chunk(&bytes, self.encoding)
    }

    fn on_load(&self) {
        info!("{}: document loaded", self.file_path.display());
        self.record(LoadOutcome::Loaded);
    }

    fn on_failure(&self) {
        warn!("{}: document failed to load", self.file_path.display());
        self.record(LoadOutcome::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decode::decode_chunk;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_document(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_file_bridge_size() {
        let doc = temp_document(b"%PDF-1.7\n%%EOF\n");
        let bridge = FileChunkBridge::open(doc.path(), ChunkEncoding::Base64).unwrap();
        assert_eq!(bridge.get_size(), 15);
    }

    #[test]
    fn test_file_bridge_range() {
        let contents: Vec<u8> = (0..=255).collect();
        let doc = temp_document(&contents);
        let bridge = FileChunkBridge::open(doc.path(), ChunkEncoding::Base64).unwrap();

        let encoded = bridge.get_chunk(16, 48);
        let bytes = decode_chunk(&encoded, ChunkEncoding::Base64).unwrap();
        assert_eq!(&bytes[..], &contents[16..48]);
    }

    #[test]
    fn test_file_bridge_range_past_end_is_short() {
        let doc = temp_document(b"0123456789");
        let bridge = FileChunkBridge::open(doc.path(), ChunkEncoding::Latin1).unwrap();

        let encoded = bridge.get_chunk(6, 20);
        assert_eq!(encoded, "6789");
    }

    #[test]
    fn test_file_bridge_records_outcome() {
        let doc = temp_document(b"x");
        let bridge = FileChunkBridge::open(doc.path(), ChunkEncoding::Base64).unwrap();

        assert_eq!(bridge.outcome(), None);
        bridge.on_load();
        assert_eq!(bridge.outcome(), Some(LoadOutcome::Loaded));
    }

    #[test]
    fn test_file_bridge_missing_file() {
        let result = FileChunkBridge::open("nonexistent.pdf", ChunkEncoding::Base64);
        assert!(result.is_err());
    }
}
