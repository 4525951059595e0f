use crate::core::forcefield::library::FEATURE_COLLAGEN;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::{MolecularFile, WriteOptions};
use crate::core::models::molecule::ResidueRef;
use crate::core::models::system::System;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, instrument};

pub const DSSP_NAME: &str = "annotate-dssp";
pub const SEQUENCE_NAME: &str = "annotate-sequence";
pub const COLLAGEN_NAME: &str = "annotate-collagen";

const COLLAGEN_CODE: char = 'F';
const COIL_CODE: char = 'C';

/// Sets the secondary-structure code of every node of every residue, in
/// system order. Returns the number of residues left without a code.
fn assign_codes(
    system: &mut System,
    mut code_for: impl FnMut(usize, &ResidueRef) -> Option<char>,
) -> usize {
    let mut index = 0;
    let mut missing = 0;
    for molecule in system.molecules_mut() {
        for residue in molecule.residues() {
            let code = code_for(index, &residue);
            index += 1;
            if code.is_none() {
                missing += 1;
            }
            for &id in &residue.nodes {
                if let Some(node) = molecule.node_mut(id) {
                    node.secstruct = code;
                }
            }
        }
    }
    missing
}

/// Annotates residues with the output of the DSSP executable.
pub struct AnnotateDssp {
    pub executable: PathBuf,
}

impl Processor for AnnotateDssp {
    fn name(&self) -> &'static str {
        DSSP_NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(DSSP_NAME, system)?;
        let report = run_dssp(&self.executable, system)?;
        let codes = parse_dssp(&report).map_err(|m| EngineError::structural(DSSP_NAME, m))?;
        debug!(residues = codes.len(), "Parsed DSSP report");

        let missing = assign_codes(system, |_, residue| {
            codes.get(&(residue.chain, residue.resid)).copied()
        });
        if missing > 0 {
            ctx.diagnostics.warn(
                DSSP_NAME,
                format!("DSSP assigned no code to {} residue(s)", missing),
            );
        }
        Ok(())
    }
}

fn tool_error(executable: &Path, source: io::Error) -> EngineError {
    EngineError::ExternalTool {
        tool: executable.display().to_string(),
        source,
    }
}

#[instrument(skip_all, name = "dssp")]
fn run_dssp(executable: &Path, system: &System) -> Result<String, EngineError> {
    let input = tempfile::Builder::new()
        .prefix("cgforge-")
        .suffix(".pdb")
        .tempfile()
        .map_err(|e| tool_error(executable, e))?;
    let output = tempfile::Builder::new()
        .prefix("cgforge-")
        .suffix(".dssp")
        .tempfile()
        .map_err(|e| tool_error(executable, e))?;

    let options = WriteOptions {
        allow_undefined_positions: true,
    };
    PdbFile::write_to_path(system, input.path(), &options).map_err(|source| {
        EngineError::Write {
            path: input.path().to_path_buf(),
            source,
        }
    })?;

    let result = Command::new(executable)
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(output.path())
        .output()
        .map_err(|e| tool_error(executable, e))?;
    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(tool_error(
            executable,
            io::Error::other(format!("{}: {}", result.status, stderr.trim())),
        ));
    }

    fs::read_to_string(output.path()).map_err(|e| tool_error(executable, e))
}

/// Parses a classic DSSP report into `(chain, resid) -> code`.
///
/// Blank structure codes become coil. Chain-break records are skipped.
pub(crate) fn parse_dssp(report: &str) -> Result<HashMap<(char, isize), char>, String> {
    let mut lines = report.lines();
    if !lines.any(|l| l.starts_with("  #  RESIDUE")) {
        return Err("no residue table in DSSP output".to_string());
    }

    let mut codes = HashMap::new();
    for line in lines {
        let bytes = line.as_bytes();
        if bytes.len() < 17 || bytes[13] == b'!' {
            continue;
        }
        let resid: isize = std::str::from_utf8(&bytes[5..10])
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| format!("invalid residue number in DSSP line '{}'", line))?;
        let chain = bytes[11] as char;
        let code = match bytes[16] as char {
            ' ' => COIL_CODE,
            c => c,
        };
        codes.insert((chain, resid), code);
    }
    Ok(codes)
}

/// Assigns a literal code string: one code for everything, or one per residue.
pub struct AnnotateSequence {
    pub sequence: String,
}

impl Processor for AnnotateSequence {
    fn name(&self) -> &'static str {
        SEQUENCE_NAME
    }

    fn apply(&self, system: &mut System, _ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(SEQUENCE_NAME, system)?;
        let codes: Vec<char> = self.sequence.chars().collect();
        let residues = system.residue_count();

        match codes.as_slice() {
            [single] => {
                assign_codes(system, |_, _| Some(*single));
            }
            _ if codes.len() == residues => {
                assign_codes(system, |i, _| codes.get(i).copied());
            }
            _ => {
                return Err(EngineError::structural(
                    SEQUENCE_NAME,
                    format!(
                        "secondary structure has {} codes but the system has {} residues",
                        codes.len(),
                        residues
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Marks every residue as collagen.
pub struct AnnotateCollagen {
    pub force_field: String,
}

impl Processor for AnnotateCollagen {
    fn name(&self) -> &'static str {
        COLLAGEN_NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(COLLAGEN_NAME, system)?;
        if !ctx.registry.has_feature(&self.force_field, FEATURE_COLLAGEN) {
            ctx.diagnostics.warn(
                COLLAGEN_NAME,
                format!(
                    "'{}' has no collagen parameters; the default backbone parameters will be used",
                    self.force_field
                ),
            );
        }
        assign_codes(system, |_, _| Some(COLLAGEN_CODE));
        Ok(())
    }
}
