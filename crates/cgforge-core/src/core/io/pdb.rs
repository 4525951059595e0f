use super::error::{IoError, ParseErrorKind, parse_float, parse_int, slice_and_trim};
use super::traits::{MolecularFile, ReadOptions, WriteOptions};
use crate::core::models::molecule::Molecule;
use crate::core::models::node::Node;
use crate::core::models::system::System;
use nalgebra::Point3;
use std::io::{BufRead, Write};

const ANGSTROM_PER_NM: f64 = 10.0;
const MIN_ATOM_LINE_LEN: usize = 54;

pub struct PdbFile;

/// Tracks which MODEL block the reader is in and whether it is the selected one.
struct ModelTracker {
    requested: Option<usize>,
    seen: usize,
    current: Option<usize>,
    selected: Option<usize>,
}

impl ModelTracker {
    fn new(requested: Option<usize>) -> Self {
        Self {
            requested,
            seen: 0,
            current: None,
            selected: None,
        }
    }

    fn enter(&mut self, number: usize) {
        self.seen += 1;
        self.current = Some(number);
        if self.selected.is_none() && self.requested.is_none_or(|r| r == number) {
            self.selected = Some(number);
        }
    }

    /// Whether atoms encountered now belong to the model being read.
    fn is_active(&self) -> bool {
        match self.current {
            // Files without MODEL records hold a single implicit model 1.
            None => self.requested.is_none_or(|r| r == 1),
            Some(n) => self.selected == Some(n),
        }
    }

    fn leaving_selected(&self) -> bool {
        self.current.is_some() && self.current == self.selected
    }
}

fn finish_molecule(system: &mut System, current: &mut Molecule) {
    if !current.is_empty() {
        system.add_molecule(std::mem::take(current));
    }
}

fn pdb_atom_name(name: &str) -> String {
    if name.len() < 4 {
        format!(" {:<3}", name)
    } else {
        name.to_string()
    }
}

impl MolecularFile for PdbFile {
    fn read_from(reader: &mut impl BufRead, options: &ReadOptions) -> Result<System, IoError> {
        let mut system = System::new();
        let mut current = Molecule::new();
        let mut models = ModelTracker::new(options.model);
        let mut last_chain: Option<char> = None;
        let mut atoms_read = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "TITLE" | "HEADER" if system.title.is_empty() => {
                    system.title = slice_and_trim(&line, 10, 80).to_string();
                }
                "CRYST1" => {
                    let a = parse_float(&line, 6, 15, line_num)?;
                    let b = parse_float(&line, 15, 24, line_num)?;
                    let c = parse_float(&line, 24, 33, line_num)?;
                    system.box_vectors =
                        Some([a / ANGSTROM_PER_NM, b / ANGSTROM_PER_NM, c / ANGSTROM_PER_NM]);
                }
                "MODEL" => {
                    let number = slice_and_trim(&line, 6, 80)
                        .parse::<usize>()
                        .unwrap_or(models.seen + 1);
                    models.enter(number);
                }
                "ENDMDL" => {
                    if models.leaving_selected() {
                        finish_molecule(&mut system, &mut current);
                        break;
                    }
                }
                "TER" => {
                    if models.is_active() {
                        finish_molecule(&mut system, &mut current);
                        last_chain = None;
                    }
                }
                "ATOM" | "HETATM" => {
                    if !models.is_active() {
                        continue;
                    }
                    if line.len() < MIN_ATOM_LINE_LEN {
                        return Err(IoError::Parse {
                            line: line_num,
                            kind: ParseErrorKind::LineTooShort {
                                min: MIN_ATOM_LINE_LEN,
                            },
                        });
                    }
                    let alt_loc = line.as_bytes()[16] as char;
                    if alt_loc != ' ' && alt_loc != 'A' {
                        continue;
                    }

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(IoError::Parse {
                            line: line_num,
                            kind: ParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let resname = slice_and_trim(&line, 17, 21);
                    let chain = line.as_bytes()[21] as char;
                    let resid = parse_int(&line, 22, 26, line_num)?;
                    let x = parse_float(&line, 30, 38, line_num)?;
                    let y = parse_float(&line, 38, 46, line_num)?;
                    let z = parse_float(&line, 46, 54, line_num)?;
                    let element = slice_and_trim(&line, 76, 78);

                    let mut node = Node::new(name, resname, resid, chain).with_position(
                        Point3::new(x, y, z) / ANGSTROM_PER_NM,
                    );
                    if !element.is_empty() {
                        node = node.with_element(element);
                    }
                    if !options.keeps(resname, node.is_hydrogen()) {
                        continue;
                    }

                    if last_chain.is_some_and(|c| c != chain) {
                        finish_molecule(&mut system, &mut current);
                    }
                    last_chain = Some(chain);
                    current.add_node(node);
                    atoms_read += 1;
                }
                "END" => break,
                _ => {}
            }
        }
        finish_molecule(&mut system, &mut current);

        if let Some(requested) = options.model {
            let found = if models.seen == 0 {
                requested == 1
            } else {
                models.selected == Some(requested)
            };
            if !found {
                return Err(IoError::ModelNotFound {
                    requested,
                    available: models.seen.max(1),
                });
            }
        }
        if atoms_read == 0 {
            return Err(IoError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok(system)
    }

    fn write_to(
        system: &System,
        writer: &mut impl Write,
        options: &WriteOptions,
    ) -> Result<(), IoError> {
        if !system.title.is_empty() {
            writeln!(writer, "TITLE     {}", system.title)?;
        }
        if let Some([a, b, c]) = system.box_vectors {
            writeln!(
                writer,
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
                a * ANGSTROM_PER_NM,
                b * ANGSTROM_PER_NM,
                c * ANGSTROM_PER_NM,
                90.0,
                90.0,
                90.0
            )?;
        }

        let mut serial = 0usize;
        for molecule in system.molecules() {
            for (_, node) in molecule.nodes() {
                serial += 1;
                let position = match node.position {
                    Some(p) => p * ANGSTROM_PER_NM,
                    None if options.allow_undefined_positions => Point3::origin(),
                    None => {
                        return Err(IoError::UndefinedPosition {
                            name: node.name.clone(),
                            resname: node.resname.clone(),
                            resid: node.resid,
                            chain: node.chain,
                        });
                    }
                };
                let res_field = format!("{:<4}", format!("{:>3}", node.resname));
                writeln!(
                    writer,
                    "{:<6}{:>5} {:<4} {}{:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                    "ATOM",
                    serial % 100_000,
                    pdb_atom_name(&node.name),
                    res_field,
                    node.chain,
                    node.resid % 10_000,
                    position.x,
                    position.y,
                    position.z,
                    1.0,
                    0.0,
                    node.element.as_deref().unwrap_or("")
                )?;
            }
            writeln!(writer, "TER")?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_CHAINS: &str = "\
TITLE     TEST PEPTIDE
CRYST1   50.000   60.000   70.000  90.00  90.00  90.00 P 1           1
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  HA  ALA A   1      11.500   7.000  -5.000  1.00  0.00           H
ATOM      4  N   GLY B   2      12.000   6.000  -4.000  1.00  0.00           N
HETATM    5  O   HOH W 101      20.000  20.000  20.000  1.00  0.00           O
END
";

    const TWO_MODELS: &str = "\
MODEL        1
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       4.000   5.000   6.000  1.00  0.00           C
ATOM      2  CB  ALA A   1       4.500   5.500   6.500  1.00  0.00           C
ENDMDL
END
";

    fn read(content: &str, options: &ReadOptions) -> Result<System, IoError> {
        PdbFile::read_from(&mut Cursor::new(content), options)
    }

    #[test]
    fn chains_become_separate_molecules_and_units_convert_to_nm() {
        let system = read(TWO_CHAINS, &ReadOptions::default()).unwrap();

        assert_eq!(system.title, "TEST PEPTIDE");
        assert_eq!(system.box_vectors, Some([5.0, 6.0, 7.0]));
        assert_eq!(system.molecule_count(), 3);
        assert_eq!(system.molecules()[0].len(), 3);

        let (_, n) = system.molecules()[0].nodes().next().unwrap();
        let p = n.position.unwrap();
        assert!((p.x - 1.1104).abs() < 1e-9);
        assert_eq!(n.element.as_deref(), Some("N"));
        assert_eq!(system.molecules()[2].chain(), Some('W'));
    }

    #[test]
    fn read_options_filter_hydrogens_and_residues() {
        let mut options = ReadOptions {
            ignore_hydrogens: true,
            ..Default::default()
        };
        options.exclude_residues.insert("HOH".to_string());

        let system = read(TWO_CHAINS, &options).unwrap();

        assert_eq!(system.molecule_count(), 2);
        assert_eq!(system.molecules()[0].len(), 2);
        assert!(
            system.molecules()[0]
                .nodes()
                .all(|(_, n)| n.name != "HA")
        );
    }

    #[test]
    fn first_model_is_read_by_default() {
        let system = read(TWO_MODELS, &ReadOptions::default()).unwrap();
        assert_eq!(system.node_count(), 1);
    }

    #[test]
    fn requested_model_is_selected() {
        let options = ReadOptions {
            model: Some(2),
            ..Default::default()
        };
        let system = read(TWO_MODELS, &options).unwrap();
        assert_eq!(system.node_count(), 2);
        let (_, ca) = system.molecules()[0].nodes().next().unwrap();
        assert!((ca.position.unwrap().x - 0.4).abs() < 1e-9);
    }

    #[test]
    fn missing_model_is_an_error() {
        let options = ReadOptions {
            model: Some(5),
            ..Default::default()
        };
        let err = read(TWO_MODELS, &options).unwrap_err();
        assert!(matches!(
            err,
            IoError::ModelNotFound {
                requested: 5,
                available: 2
            }
        ));
    }

    #[test]
    fn file_without_atoms_is_rejected() {
        let err = read("TITLE     EMPTY\nEND\n", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::MissingRecord(_)));
    }

    #[test]
    fn malformed_coordinate_reports_line() {
        let bad = "ATOM      1  N   ALA A   1      11.10x   6.134  -6.504  1.00  0.00           N\n";
        let err = read(bad, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 1, .. }));
    }

    #[test]
    fn written_structure_reads_back_with_same_atoms() {
        let system = read(TWO_CHAINS, &ReadOptions::default()).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&system, &mut buffer, &WriteOptions::default()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("CRYST1   50.000   60.000   70.000"));
        assert!(text.lines().any(|l| l.starts_with("ATOM      2  CA  ALA A   1")));

        let again = read(&text, &ReadOptions::default()).unwrap();
        assert_eq!(again.node_count(), system.node_count());
        assert_eq!(again.molecule_count(), system.molecule_count());
    }

    #[test]
    fn undefined_positions_fail_unless_allowed() {
        let mut system = System::new();
        let mut mol = Molecule::new();
        mol.add_node(Node::new("BB", "ALA", 1, 'A'));
        system.add_molecule(mol);

        let mut buffer = Vec::new();
        let err = PdbFile::write_to(&system, &mut buffer, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::UndefinedPosition { .. }));

        let mut buffer = Vec::new();
        let options = WriteOptions {
            allow_undefined_positions: true,
        };
        PdbFile::write_to(&system, &mut buffer, &options).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("   0.000   0.000   0.000"));
    }
}
