//! Application state.

use std::sync::Arc;

use livepair_media::{ExifTool, Ffmpeg, MetadataTool, RemuxTool};

use crate::config::AppConfig;
use crate::scratch::Janitor;

/// Shared application state.
///
/// The tool handles are trait objects so the pipeline can be exercised with
/// fakes; `new` wires up the real ffmpeg/exiftool implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub remux: Arc<dyn RemuxTool>,
    pub metadata: Arc<dyn MetadataTool>,
    pub janitor: Janitor,
}

impl AppState {
    /// Create application state backed by the real external tools.
    pub fn new(config: AppConfig) -> Self {
        let remux = Arc::new(Ffmpeg::new(config.remux_timeout, config.convert_timeout));
        let metadata = Arc::new(ExifTool::new(config.inject_timeout));
        Self::with_tools(config, remux, metadata)
    }

    /// Create application state with explicit tool implementations.
    pub fn with_tools(
        config: AppConfig,
        remux: Arc<dyn RemuxTool>,
        metadata: Arc<dyn MetadataTool>,
    ) -> Self {
        Self {
            config,
            remux,
            metadata,
            janitor: Janitor::new(),
        }
    }
}
