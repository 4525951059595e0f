use super::error::IoError;
use crate::core::models::system::System;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Filters applied while reading a structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Residue names to drop entirely (e.g., solvent).
    pub exclude_residues: BTreeSet<String>,
    /// Drop hydrogen atoms.
    pub ignore_hydrogens: bool,
    /// Model number to read from multi-model formats. `None` reads the first model.
    pub model: Option<usize>,
}

impl ReadOptions {
    pub(crate) fn keeps(&self, resname: &str, is_hydrogen: bool) -> bool {
        !(self.exclude_residues.contains(resname) || (self.ignore_hydrogens && is_hydrogen))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write nodes without coordinates at the origin instead of failing.
    pub allow_undefined_positions: bool,
}

/// Defines the interface for reading and writing molecular structure formats.
///
/// Implementors handle format-specific parsing and serialization; the
/// provided methods add file handling on top.
pub trait MolecularFile {
    /// Reads a system from a buffered reader, applying `options` while parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails, the selected model does not exist,
    /// or no atoms remain after filtering.
    fn read_from(reader: &mut impl BufRead, options: &ReadOptions) -> Result<System, IoError>;

    /// Writes a system to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails, or if a node has no coordinates and
    /// `options.allow_undefined_positions` is not set.
    fn write_to(
        system: &System,
        writer: &mut impl Write,
        options: &WriteOptions,
    ) -> Result<(), IoError>;

    /// Reads a system from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<System, IoError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, options)
    }

    /// Writes a system to a file path.
    fn write_to_path<P: AsRef<Path>>(
        system: &System,
        path: P,
        options: &WriteOptions,
    ) -> Result<(), IoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(system, &mut writer, options)?;
        writer.flush()?;
        Ok(())
    }
}
