use super::error::IoError;
use super::gro::GroFile;
use super::pdb::PdbFile;
use super::traits::{MolecularFile, ReadOptions, WriteOptions};
use crate::core::models::system::System;
use std::fmt;
use std::path::Path;

/// Structure file formats understood by the reader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureFormat {
    Pdb,
    Gro,
}

impl StructureFormat {
    /// Infers the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdb") | Some("ent") => Ok(Self::Pdb),
            Some("gro") => Ok(Self::Gro),
            _ => Err(IoError::UnsupportedFormat {
                path: path.to_string_lossy().to_string(),
            }),
        }
    }

    /// Whether a file of this format can hold several models.
    pub fn supports_models(self) -> bool {
        match self {
            Self::Pdb => true,
            Self::Gro => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pdb => "PDB",
            Self::Gro => "GRO",
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Reads a structure, choosing the parser from the file extension.
pub fn read_structure(path: &Path, options: &ReadOptions) -> Result<System, IoError> {
    match StructureFormat::from_path(path)? {
        StructureFormat::Pdb => PdbFile::read_from_path(path, options),
        StructureFormat::Gro => GroFile::read_from_path(path, options),
    }
}

/// Writes a structure, choosing the writer from the file extension.
pub fn write_structure(
    system: &System,
    path: &Path,
    options: &WriteOptions,
) -> Result<(), IoError> {
    match StructureFormat::from_path(path)? {
        StructureFormat::Pdb => PdbFile::write_to_path(system, path, options),
        StructureFormat::Gro => GroFile::write_to_path(system, path, options),
    }
}
