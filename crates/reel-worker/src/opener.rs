//! How the pipeline turns a source path into a media handle.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reel_media::{FfmpegSource, MediaHandle, MediaResult};

#[async_trait]
pub trait MediaOpener: Send + Sync {
    async fn open(&self, path: &Path, timeout: Duration) -> MediaResult<Arc<dyn MediaHandle>>;
}

/// Opens files with the FFmpeg-backed decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

#[async_trait]
impl MediaOpener for FfmpegOpener {
    async fn open(&self, path: &Path, timeout: Duration) -> MediaResult<Arc<dyn MediaHandle>> {
        let source = FfmpegSource::open(path, timeout).await?;
        Ok(Arc::new(source))
    }
}
