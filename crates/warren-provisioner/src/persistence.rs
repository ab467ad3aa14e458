use std::path::PathBuf;

use crate::error::ProvisionerError;
use crate::state::ProvisionerState;

/// Local JSON state file.
pub struct StatePersistence {
    pub path: PathBuf,
}

impl StatePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write state atomically: tmp file + rename.
    pub async fn flush(&self, state: &ProvisionerState) -> Result<(), ProvisionerError> {
        let mut stamped = state.clone();
        stamped.version = ProvisionerState::VERSION;
        let json = serde_json::to_vec_pretty(&stamped)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "state flushed");
        Ok(())
    }

    /// Load state, or start fresh if no file exists yet.
    pub async fn load(&self) -> Result<ProvisionerState, ProvisionerError> {
        let json = match tokio::fs::read(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no existing state found, starting fresh");
                return Ok(ProvisionerState::default());
            }
            Err(e) => return Err(e.into()),
        };

        let state: ProvisionerState = serde_json::from_slice(&json)?;
        if state.version > ProvisionerState::VERSION {
            return Err(ProvisionerError::State(format!(
                "state version {} is newer than this build supports ({})",
                state.version,
                ProvisionerState::VERSION
            )));
        }

        tracing::debug!(
            path = %self.path.display(),
            resources = state.resources.len(),
            "state loaded"
        );
        Ok(state)
    }
}
