//! Persistence of finished analysis records.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use reel_models::AnalysisRecord;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for complete analysis records. One call per source.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn store(&self, record: &AnalysisRecord) -> Result<(), SinkError>;
}

/// Writes each record as pretty JSON to `<dir>/<record-id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, record: &AnalysisRecord) -> PathBuf {
        self.dir.join(format!("{}.json", record.id()))
    }
}

#[async_trait]
impl AnalysisSink for JsonFileSink {
    async fn store(&self, record: &AnalysisRecord) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(record)?;

        // Readers never see a half-written record.
        let path = self.path_for(record);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), bytes = json.len(), "Stored analysis record");
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryAnalysisSink {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl MemoryAnalysisSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnalysisSink for MemoryAnalysisSink {
    async fn store(&self, record: &AnalysisRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Unavailable("record store lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
