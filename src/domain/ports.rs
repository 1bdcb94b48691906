use crate::core::ingest::IngestReport;
use crate::domain::model::{Port, RepositoryStats};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Secondary port: where validated ports are kept.
///
/// Every operation except [`statistics`](PortRepository::statistics) checks
/// the cancellation token on entry and fails with `PortError::Cancelled` if
/// it is set. Implementations must serialise writers so that key detection
/// and counter updates are applied together.
pub trait PortRepository: Send + Sync {
    /// Insert or overwrite `port` under its ID.
    fn save_port(&self, cancel: &CancellationToken, port: Port) -> Result<()>;

    /// `Ok(None)` when no record exists under `id`.
    fn get_port(&self, cancel: &CancellationToken, id: &str) -> Result<Option<Port>>;

    fn statistics(&self) -> RepositoryStats;

    /// Drop every record and reset the counters. The repository stays usable.
    fn close(&self, cancel: &CancellationToken) -> Result<()>;
}

/// Primary port: what an embedding application drives.
#[async_trait]
pub trait PortService: Send + Sync {
    async fn create_or_update_port(
        &self,
        cancel: &CancellationToken,
        port: Option<Port>,
    ) -> Result<()>;

    async fn get_port(&self, cancel: &CancellationToken, id: &str) -> Result<Option<Port>>;

    async fn process_ports_file(
        &self,
        cancel: &CancellationToken,
        path: &Path,
    ) -> Result<IngestReport>;
}

/// Resolved settings the binary runs with.
pub trait ConfigProvider: Send + Sync {
    fn source_path(&self) -> &Path;
    fn shutdown_grace(&self) -> std::time::Duration;
    fn lookups(&self) -> &[String];
}
