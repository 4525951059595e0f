use super::error::{IoError, ParseErrorKind, parse_float, parse_int, slice_and_trim};
use super::traits::{MolecularFile, ReadOptions, WriteOptions};
use crate::core::models::molecule::Molecule;
use crate::core::models::node::Node;
use crate::core::models::system::System;
use nalgebra::Point3;
use std::io::{BufRead, Write};

const MIN_ATOM_LINE_LEN: usize = 44;
/// GRO has no chain column.
const NO_CHAIN: char = ' ';

pub struct GroFile;

fn parse_box(line: &str, line_num: usize) -> Result<[f64; 3], IoError> {
    let values: Vec<&str> = line.split_whitespace().collect();
    if values.len() < 3 {
        return Err(IoError::Parse {
            line: line_num,
            kind: ParseErrorKind::MissingRequiredField {
                columns: "box vectors".into(),
            },
        });
    }
    let mut dims = [0.0; 3];
    for (dim, value) in dims.iter_mut().zip(&values) {
        *dim = value.parse().map_err(|_| IoError::Parse {
            line: line_num,
            kind: ParseErrorKind::InvalidFloat {
                columns: "box vectors".into(),
                value: value.to_string(),
            },
        })?;
    }
    Ok(dims)
}

impl MolecularFile for GroFile {
    fn read_from(reader: &mut impl BufRead, options: &ReadOptions) -> Result<System, IoError> {
        if options.model.is_some() {
            return Err(IoError::ModelsUnsupported { format: "GRO" });
        }

        let mut lines = reader.lines();
        let title = lines
            .next()
            .transpose()?
            .ok_or_else(|| IoError::MissingRecord("title line".into()))?;
        let count_line = lines
            .next()
            .transpose()?
            .ok_or_else(|| IoError::MissingRecord("atom count line".into()))?;
        let expected = parse_int(&count_line, 0, count_line.len(), 2)?.max(0) as usize;

        let mut system = System::new();
        system.title = title.trim().to_string();
        let mut current = Molecule::new();
        let mut last_resid: Option<isize> = None;
        let mut found = 0usize;

        for (offset, line_res) in lines.by_ref().take(expected).enumerate() {
            let line = line_res?;
            let line_num = offset + 3;
            if line.len() < MIN_ATOM_LINE_LEN {
                return Err(IoError::Parse {
                    line: line_num,
                    kind: ParseErrorKind::LineTooShort {
                        min: MIN_ATOM_LINE_LEN,
                    },
                });
            }
            found += 1;

            let resid = parse_int(&line, 0, 5, line_num)?;
            let resname = slice_and_trim(&line, 5, 10);
            let name = slice_and_trim(&line, 10, 15);
            let x = parse_float(&line, 20, 28, line_num)?;
            let y = parse_float(&line, 28, 36, line_num)?;
            let z = parse_float(&line, 36, 44, line_num)?;

            let node = Node::new(name, resname, resid, NO_CHAIN).with_position(Point3::new(x, y, z));
            if !options.keeps(resname, node.is_hydrogen()) {
                continue;
            }
            if last_resid.is_some_and(|last| resid < last) && !current.is_empty() {
                system.add_molecule(std::mem::take(&mut current));
            }
            last_resid = Some(resid);
            current.add_node(node);
        }

        if found != expected {
            return Err(IoError::Parse {
                line: found + 3,
                kind: ParseErrorKind::AtomCountMismatch { expected, found },
            });
        }
        if let Some(box_line) = lines.next().transpose()? {
            if !box_line.trim().is_empty() {
                system.box_vectors = Some(parse_box(&box_line, expected + 3)?);
            }
        }
        if !current.is_empty() {
            system.add_molecule(current);
        }
        if system.is_empty() {
            return Err(IoError::MissingRecord("atom records".into()));
        }
        Ok(system)
    }

    fn write_to(
        system: &System,
        writer: &mut impl Write,
        options: &WriteOptions,
    ) -> Result<(), IoError> {
        let title = if system.title.is_empty() {
            "Generated by cgforge"
        } else {
            system.title.as_str()
        };
        writeln!(writer, "{}", title)?;
        writeln!(writer, "{:>5}", system.node_count())?;

        let mut serial = 0usize;
        for molecule in system.molecules() {
            for (_, node) in molecule.nodes() {
                serial += 1;
                let position = match node.position {
                    Some(p) => p,
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
                writeln!(
                    writer,
                    "{:>5}{:<5}{:>5}{:>5}{:>8.3}{:>8.3}{:>8.3}",
                    node.resid.rem_euclid(100_000),
                    node.resname,
                    node.name,
                    serial % 100_000,
                    position.x,
                    position.y,
                    position.z
                )?;
            }
        }

        let [a, b, c] = system.box_vectors.unwrap_or([0.0; 3]);
        writeln!(writer, "{:>10.5}{:>10.5}{:>10.5}", a, b, c)?;
        Ok(())
    }
}
