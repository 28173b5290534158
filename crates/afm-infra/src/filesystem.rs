//! Reading agent documents from disk.

use std::path::{Path, PathBuf};

use afm_core::document;
use afm_types::agent::AgentRecord;
use afm_types::error::AfmError;

/// Errors loading an agent file.
#[derive(Debug, thiserror::Error)]
pub enum AgentLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: AfmError,
    },
}

/// Read and parse the AFM document at `path`.
pub async fn load_agent_file(path: &Path) -> Result<AgentRecord, AgentLoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AgentLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let record = document::parse_afm(&content).map_err(|source| AgentLoadError::Document {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), "loaded agent document");
    Ok(record)
}
