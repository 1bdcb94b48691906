pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{FileConfig, Settings};

pub use adapters::memory::InMemoryPortRepository;
pub use crate::core::{
    ingest::{IngestReport, PortIngestor},
    service::PortServiceImpl,
};
pub use domain::model::{Coordinate, Port, PortDraft, RepositoryStats};
pub use domain::ports::{ConfigProvider, PortRepository, PortService};
pub use utils::error::{PortError, Result, ValidationError};
