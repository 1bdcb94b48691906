use crate::domain::model::{Port, RepositoryStats};
use crate::domain::ports::PortRepository;
use crate::utils::error::{PortError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct State {
    ports: HashMap<String, Port>,
    stats: RepositoryStats,
}

/// Volatile [`PortRepository`] backed by a `HashMap`.
///
/// Records and counters share one `RwLock`, so a statistics snapshot never
/// sees half of a write. Data is lost when the repository is dropped.
#[derive(Debug, Default)]
pub struct InMemoryPortRepository {
    state: RwLock<State>,
}

impl InMemoryPortRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|e| PortError::Storage {
            message: format!("lock poisoned: {e}"),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|e| PortError::Storage {
            message: format!("lock poisoned: {e}"),
        })
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(PortError::Cancelled);
    }
    Ok(())
}

impl PortRepository for InMemoryPortRepository {
    fn save_port(&self, cancel: &CancellationToken, port: Port) -> Result<()> {
        ensure_active(cancel)?;
        port.validate()?;

        let mut state = self.write()?;
        let is_new = state.ports.insert(port.id.clone(), port).is_none();
        if is_new {
            state.stats.total_ports += 1;
        }
        state.stats.total_updates += 1;
        state.stats.last_update = Some(Utc::now());
        Ok(())
    }

    fn get_port(&self, cancel: &CancellationToken, id: &str) -> Result<Option<Port>> {
        ensure_active(cancel)?;
        let state = self.read()?;
        Ok(state.ports.get(id).cloned())
    }

    fn statistics(&self) -> RepositoryStats {
        // A poisoned lock still holds the last fully applied counters.
        match self.state.read() {
            Ok(state) => state.stats,
            Err(poisoned) => poisoned.into_inner().stats,
        }
    }

    fn close(&self, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        let mut state = self.write()?;
        let dropped = state.ports.len();
        *state = State::default();
        tracing::debug!(dropped, "repository cleared");
        Ok(())
    }
}
