pub mod extract;
pub mod ingest;
pub mod service;

pub use crate::domain::model::{Coordinate, Port, PortDraft, RepositoryStats};
pub use crate::domain::ports::{PortRepository, PortService};
pub use crate::utils::error::Result;
