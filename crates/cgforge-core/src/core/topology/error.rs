use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Cannot write a topology for a system without molecules")]
    EmptySystem,
    #[error("Molecule {index} has no moltype; molecules must be named before topology output")]
    MissingMoltype { index: usize },
    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
