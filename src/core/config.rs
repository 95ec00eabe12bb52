use super::decode::ChunkEncoding;
use super::error::{ViewerError, ViewerResult};
use super::renderer::ScaleValue;
use super::viewport::ViewportMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Range chunk size shared by the transport and the renderer: 256KB
pub const DEFAULT_RANGE_CHUNK_SIZE: usize = 262_144;

/// Animation frame interval (~60Hz)
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Session configuration.
///
/// Every field has a default, so hosts only send what they change:
///
/// ```
/// use pdf_x_viewport::core::config::SessionConfig;
///
/// let config = SessionConfig::from_json(r#"{ "rangeChunkSize": 65536 }"#).unwrap();
/// assert_eq!(config.range_chunk_size, 65536);
/// assert!(config.disable_auto_fetch);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Chunk size hint passed to both transport and renderer
    pub range_chunk_size: usize,
    /// Keep the renderer from fetching beyond explicit requests
    pub disable_auto_fetch: bool,
    /// Keep the renderer from treating the transport as a stream
    pub disable_stream: bool,
    /// Order visible pages most-visible first
    pub sort_by_visibility: bool,
    /// Where the visible band comes from
    pub viewport: ViewportMode,
    /// Scale applied once pages are initialized; `None` keeps the renderer's
    pub initial_scale: Option<ScaleValue>,
    /// Payload encoding used by the bridge
    pub chunk_encoding: ChunkEncoding,
    pub frame_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            range_chunk_size: DEFAULT_RANGE_CHUNK_SIZE,
            disable_auto_fetch: true,
            disable_stream: true,
            sort_by_visibility: true,
            viewport: ViewportMode::default(),
            initial_scale: Some(ScaleValue::PageWidth),
            chunk_encoding: ChunkEncoding::Base64,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> ViewerResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ViewerResult<()> {
        if self.range_chunk_size == 0 {
            return Err(ViewerError::InvalidConfig("rangeChunkSize must be positive".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(ViewerError::InvalidConfig("frameIntervalMs must be positive".into()));
        }
        if let Some(ScaleValue::Custom(scale)) = self.initial_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ViewerError::InvalidConfig(format!("initial scale {} is not usable", scale)));
            }
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::viewport::AxisSource;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.range_chunk_size, 262_144);
        assert!(config.disable_auto_fetch);
        assert!(config.disable_stream);
        assert_eq!(config.initial_scale, Some(ScaleValue::PageWidth));
        assert_eq!(config.frame_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_viewport_mode_json() {
        let config = SessionConfig::from_json(
            r#"{ "viewport": { "mode": "override", "horizontal": "container" }, "initialScale": null }"#,
        )
        .unwrap();
        assert_eq!(
            config.viewport,
            ViewportMode::Override {
                horizontal: AxisSource::Container
            }
        );
        assert_eq!(config.initial_scale, None);

        let config = SessionConfig::from_json(r#"{ "viewport": { "mode": "container" } }"#).unwrap();
        assert_eq!(config.viewport, ViewportMode::Container);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let result = SessionConfig::from_json(r#"{ "rangeChunkSize": 0 }"#);
        assert!(matches!(result, Err(ViewerError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = SessionConfig::from_json("{ rangeChunkSize: ");
        assert!(matches!(result, Err(ViewerError::Config(_))));
    }
}
