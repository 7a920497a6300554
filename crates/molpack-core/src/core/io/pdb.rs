//! Reader and writer for the minimal slice of the PDB format the packing
//! pipeline needs: `ATOM`/`HETATM` coordinates, `CONECT` bonds and the
//! `CRYST1` cell record.
//!
//! Parsing is column-oriented per the PDB 3.3 description. Atom serials
//! that do not parse (Fortran writers emit `*****` past 99999) are
//! tolerated; the atom is kept and only `CONECT` resolution loses access
//! to it. All other malformed fields are hard errors carrying the line
//! number and column range.

use crate::core::models::structure::{Structure, StructureError};
use crate::core::models::topology::BondOrder;
use crate::core::utils::elements;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent record on line {line}: {source}")]
    Structure {
        line: usize,
        #[source]
        source: StructureError,
    },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer in columns {columns}: '{value}'")]
    InvalidInt {
        columns: &'static str,
        value: String,
    },
    #[error("Invalid float in columns {columns}: '{value}'")]
    InvalidFloat {
        columns: &'static str,
        value: String,
    },
    #[error("Line too short: expected at least {expected} columns, got {actual}")]
    LineTooShort { expected: usize, actual: usize },
    #[error("Atom record carries neither an element symbol nor an alphabetic atom name")]
    MissingElement,
    #[error("CONECT record references unknown atom serial {serial}")]
    UnknownSerial { serial: usize },
}

/// Column-oriented PDB codec over [`Structure`].
pub struct PdbFile;

impl PdbFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Structure, PdbError> {
        let mut structure = Structure::new();
        let mut serial_to_index: HashMap<usize, usize> = HashMap::new();
        let mut seen_bonds: HashSet<(usize, usize)> = HashSet::new();

        for (offset, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = offset + 1;
            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    parse_atom_record(&line, line_number, &mut structure, &mut serial_to_index)?;
                }
                "CRYST1" => {
                    let cell = parse_cryst1(&line, line_number)?;
                    structure
                        .set_periodic_cell(cell)
                        .map_err(|source| PdbError::Structure {
                            line: line_number,
                            source,
                        })?;
                }
                "CONECT" => {
                    parse_conect(
                        &line,
                        line_number,
                        &mut structure,
                        &serial_to_index,
                        &mut seen_bonds,
                    )?;
                }
                // TER, REMARK, END and anything else are ignored.
                _ => {}
            }
        }

        Ok(structure)
    }

    pub fn read_str(text: &str) -> Result<Structure, PdbError> {
        let mut reader = text.as_bytes();
        Self::read_from(&mut reader)
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Structure, PdbError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), PdbError> {
        if let Some([a, b, c, alpha, beta, gamma]) = structure.cell() {
            writeln!(
                writer,
                "CRYST1{a:9.3}{b:9.3}{c:9.3}{alpha:7.2}{beta:7.2}{gamma:7.2} P 1           1"
            )?;
        }

        for (index, (symbol, position)) in structure
            .symbols()
            .iter()
            .zip(structure.coordinates())
            .enumerate()
        {
            let serial = (index % 99_999) + 1;
            writeln!(
                writer,
                "HETATM{serial:>5} {name} MOL A   1    {x:8.3}{y:8.3}{z:8.3}{occupancy:6.2}{temperature:6.2}          {element:>2}",
                name = format_atom_name(symbol),
                x = position.x,
                y = position.y,
                z = position.z,
                occupancy = 1.0,
                temperature = 0.0,
                element = element_field(symbol),
            )?;
        }

        // Serial numbers wrap past 99999, at which point CONECT records
        // would be ambiguous, so they are only written below that limit.
        if structure.atom_count() <= 99_999 {
            let mut neighbors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for bond in structure.bonds() {
                neighbors.entry(bond.atom1).or_default().push(bond.atom2);
                neighbors.entry(bond.atom2).or_default().push(bond.atom1);
            }
            for (atom, bonded) in &neighbors {
                for chunk in bonded.chunks(4) {
                    let mut record = format!("CONECT{:>5}", atom + 1);
                    for other in chunk {
                        record.push_str(&format!("{:>5}", other + 1));
                    }
                    writeln!(writer, "{record}")?;
                }
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }

    pub fn write_string(structure: &Structure) -> Result<String, PdbError> {
        let mut buffer = Vec::new();
        Self::write_to(structure, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| PdbError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    pub fn write_to_path(structure: &Structure, path: impl AsRef<Path>) -> Result<(), PdbError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_float(line: &str, start: usize, end: usize, columns: &'static str) -> Result<f64, PdbParseErrorKind> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbParseErrorKind::InvalidFloat {
        columns,
        value: value.to_string(),
    })
}

fn parse_atom_record(
    line: &str,
    line_number: usize,
    structure: &mut Structure,
    serial_to_index: &mut HashMap<usize, usize>,
) -> Result<(), PdbError> {
    if line.len() < 54 {
        return Err(PdbError::Parse {
            line: line_number,
            kind: PdbParseErrorKind::LineTooShort {
                expected: 54,
                actual: line.len(),
            },
        });
    }

    let wrap = |kind| PdbError::Parse {
        line: line_number,
        kind,
    };

    let x = parse_float(line, 30, 38, "31-38").map_err(wrap)?;
    let y = parse_float(line, 38, 46, "39-46").map_err(wrap)?;
    let z = parse_float(line, 46, 54, "47-54").map_err(wrap)?;
    let symbol = extract_symbol(line).ok_or_else(|| wrap(PdbParseErrorKind::MissingElement))?;

    let index = structure.add_atom(symbol, Point3::new(x, y, z));

    // Overflowed serials (e.g. '*****') lose CONECT addressability only.
    if let Ok(serial) = slice_and_trim(line, 6, 11).parse::<usize>() {
        serial_to_index.insert(serial, index);
    }

    Ok(())
}

/// Element from columns 77-78, falling back to the alphabetic prefix of
/// the atom name for writers that omit the element field.
fn extract_symbol(line: &str) -> Option<String> {
    let element = slice_and_trim(line, 76, 78);
    if !element.is_empty() {
        return Some(
            elements::canonical_symbol(element)
                .map(str::to_string)
                .unwrap_or_else(|| element.to_string()),
        );
    }

    let name = slice_and_trim(line, 12, 16);
    let prefix: String = name.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if prefix.is_empty() {
        return None;
    }
    Some(
        elements::canonical_symbol(&prefix)
            .map(str::to_string)
            .unwrap_or(prefix),
    )
}

fn parse_cryst1(line: &str, line_number: usize) -> Result<[f64; 6], PdbError> {
    if line.len() < 54 {
        return Err(PdbError::Parse {
            line: line_number,
            kind: PdbParseErrorKind::LineTooShort {
                expected: 54,
                actual: line.len(),
            },
        });
    }
    let wrap = |kind| PdbError::Parse {
        line: line_number,
        kind,
    };
    Ok([
        parse_float(line, 6, 15, "7-15").map_err(wrap)?,
        parse_float(line, 15, 24, "16-24").map_err(wrap)?,
        parse_float(line, 24, 33, "25-33").map_err(wrap)?,
        parse_float(line, 33, 40, "34-40").map_err(wrap)?,
        parse_float(line, 40, 47, "41-47").map_err(wrap)?,
        parse_float(line, 47, 54, "48-54").map_err(wrap)?,
    ])
}

fn parse_conect(
    line: &str,
    line_number: usize,
    structure: &mut Structure,
    serial_to_index: &HashMap<usize, usize>,
    seen_bonds: &mut HashSet<(usize, usize)>,
) -> Result<(), PdbError> {
    let wrap = |kind| PdbError::Parse {
        line: line_number,
        kind,
    };

    let resolve = |start: usize,
                   end: usize,
                   columns: &'static str|
     -> Result<Option<usize>, PdbError> {
        let field = slice_and_trim(line, start, end);
        if field.is_empty() {
            return Ok(None);
        }
        let serial: usize = field.parse().map_err(|_| {
            wrap(PdbParseErrorKind::InvalidInt {
                columns,
                value: field.to_string(),
            })
        })?;
        let index = serial_to_index
            .get(&serial)
            .copied()
            .ok_or_else(|| wrap(PdbParseErrorKind::UnknownSerial { serial }))?;
        Ok(Some(index))
    };

    let Some(base) = resolve(6, 11, "7-11")? else {
        return Ok(());
    };

    const FIELDS: [(usize, usize, &str); 4] =
        [(11, 16, "12-16"), (16, 21, "17-21"), (21, 26, "22-26"), (26, 31, "27-31")];
    for (start, end, columns) in FIELDS {
        let Some(other) = resolve(start, end, columns)? else {
            break;
        };
        let key = (base.min(other), base.max(other));
        if seen_bonds.insert(key) {
            structure
                .add_bond(base, other, BondOrder::Single)
                .map_err(|source| PdbError::Structure {
                    line: line_number,
                    source,
                })?;
        }
    }

    Ok(())
}

fn format_atom_name(symbol: &str) -> String {
    let short: String = symbol.chars().take(4).collect();
    // Single-letter element names start in column 14 by convention.
    if short.len() == 1 {
        format!(" {short}  ")
    } else {
        format!("{short:<4}")
    }
}

fn element_field(symbol: &str) -> String {
    symbol.chars().take(2).collect()
}
