use crate::core::ingest::{IngestReport, PortIngestor};
use crate::domain::model::{Port, RepositoryStats};
use crate::domain::ports::{PortRepository, PortService};
use crate::utils::error::{PortError, Result, ValidationError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// [`PortService`] over any [`PortRepository`].
#[derive(Clone)]
pub struct PortServiceImpl {
    repository: Arc<dyn PortRepository>,
}

impl PortServiceImpl {
    pub fn new(repository: Arc<dyn PortRepository>) -> Self {
        Self { repository }
    }

    pub fn statistics(&self) -> RepositoryStats {
        self.repository.statistics()
    }

    pub fn close(&self, cancel: &CancellationToken) -> Result<()> {
        self.repository.close(cancel)
    }
}

#[async_trait]
impl PortService for PortServiceImpl {
    async fn create_or_update_port(
        &self,
        cancel: &CancellationToken,
        port: Option<Port>,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(PortError::Cancelled);
        }
        let port = port.ok_or(PortError::NilInput)?;
        port.validate()?;
        self.repository.save_port(cancel, port)
    }

    async fn get_port(&self, cancel: &CancellationToken, id: &str) -> Result<Option<Port>> {
        if cancel.is_cancelled() {
            return Err(PortError::Cancelled);
        }
        if id.is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        self.repository.get_port(cancel, id)
    }

    /// The decode loop blocks on file reads, so it runs on the blocking pool.
    async fn process_ports_file(
        &self,
        cancel: &CancellationToken,
        path: &Path,
    ) -> Result<IngestReport> {
        let ingestor = PortIngestor::new(Arc::clone(&self.repository), cancel.clone());
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || ingestor.ingest_path(&path)).await?
    }
}
