use thiserror::Error;

use super::config::{ConfigError, ResidueEdit};
use crate::core::forcefield::registry::RegistryError;
use crate::core::io::error::IoError;
use crate::core::topology::TopologyError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Force-field registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Structure I/O failed: {0}")]
    Io(#[from] IoError),

    #[error("Topology output failed: {0}")]
    Topology(#[from] TopologyError),

    #[error("Stage '{stage}' failed: {message}")]
    Structural { stage: &'static str, message: String },

    #[error("Stage '{stage}' found no residue matching '{edit}'")]
    ResidueNotFound {
        stage: &'static str,
        edit: ResidueEdit,
    },

    #[error("External tool '{tool}' failed: {source}")]
    ExternalTool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

impl EngineError {
    pub(crate) fn structural(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Structural {
            stage,
            message: message.into(),
        }
    }
}
