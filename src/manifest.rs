// seqqa: Quality assurance of delivered sequencing files against a file manifest.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! The file manifest of a delivery.
//!
//! A manifest is a tab-delimited table with one row per delivered file. The
//! columns `filename`, `checksum`, `flow_cell_name`, and
//! `library_aliquot_name` are required. The auxiliary report columns
//! `demultiplex_stats_filename`, `run_parameters_filename`, and
//! `top_unknown_barcodes_filename` are optional and may be empty.
//!
//! Any other column is carried through unchanged so that a rewritten manifest
//! has the same columns as the input.
//!
//! ## Usage
//!
//! ```rust
//! use seqqa::manifest::read_manifest;
//! use std::io::Cursor;
//!
//! let mut input = Cursor::new(b"filename\tchecksum\tflow_cell_name\tlibrary_aliquot_name\tfile_format\n\
//!                               LIB1_S1_L001_R1_001.fastq.gz\t0cc175b9c0f1b6a831c399e269772661\tHXYZ\tLIB1\tfastq\n".to_vec());
//!
//! let manifest = read_manifest(&mut input).unwrap();
//!
//! assert_eq!(manifest.records[0].library_aliquot_name, "LIB1");
//! assert_eq!(manifest.records[0].demultiplex_stats_filename, None);
//! assert_eq!(manifest.records[0].extra.get("file_format").map(|x| x.as_str()), Some("fastq"));
//! ```
//!
use crate::table::Table;
use crate::table::read_delimited;
use crate::table::write_delimited;

use std::collections::HashSet;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;

type E = Box<dyn std::error::Error>;

pub const FILENAME: &str = "filename";
pub const CHECKSUM: &str = "checksum";
pub const FLOW_CELL_NAME: &str = "flow_cell_name";
pub const LIBRARY_ALIQUOT_NAME: &str = "library_aliquot_name";

#[derive(Debug, Clone)]
pub struct MissingColumn {
    pub column: String,
}

impl std::fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Manifest is missing the required column '{}'", self.column)
    }
}

impl std::error::Error for MissingColumn {}

#[derive(Debug, Clone)]
pub struct DuplicateFilename {
    pub filename: String,
}

impl std::fmt::Display for DuplicateFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Manifest lists '{}' more than once", self.filename)
    }
}

impl std::error::Error for DuplicateFilename {}

#[derive(Debug, Clone)]
pub struct EmptyFilename {
    pub row: usize,
}

impl std::fmt::Display for EmptyFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Manifest row {} has an empty filename", self.row)
    }
}

impl std::error::Error for EmptyFilename {}

#[derive(Debug, Clone)]
pub struct ConflictingAuxiliary {
    pub column: String,
    pub values: Vec<String>,
}

impl std::fmt::Display for ConflictingAuxiliary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Manifest column '{}' names more than one file: {}", self.column, self.values.join(", "))
    }
}

impl std::error::Error for ConflictingAuxiliary {}

/// Columns naming the auxiliary report files of a flow cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuxColumn {
    DemultiplexStats,
    RunParameters,
    TopUnknownBarcodes,
}

impl AuxColumn {
    pub const ALL: [AuxColumn; 3] = [AuxColumn::DemultiplexStats, AuxColumn::RunParameters, AuxColumn::TopUnknownBarcodes];

    pub fn name(
        &self,
    ) -> &'static str {
        match self {
            AuxColumn::DemultiplexStats => "demultiplex_stats_filename",
            AuxColumn::RunParameters => "run_parameters_filename",
            AuxColumn::TopUnknownBarcodes => "top_unknown_barcodes_filename",
        }
    }
}

/// One row of the manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestRecord {
    pub filename: String,
    /// Expected MD5 digest of the file.
    pub checksum: String,
    pub flow_cell_name: String,
    pub library_aliquot_name: String,
    pub demultiplex_stats_filename: Option<String>,
    pub run_parameters_filename: Option<String>,
    pub top_unknown_barcodes_filename: Option<String>,
    /// Values of all other columns.
    pub extra: IndexMap<String, String>,
}

impl ManifestRecord {
    pub fn auxiliary(
        &self,
        column: AuxColumn,
    ) -> Option<&str> {
        match column {
            AuxColumn::DemultiplexStats => self.demultiplex_stats_filename.as_deref(),
            AuxColumn::RunParameters => self.run_parameters_filename.as_deref(),
            AuxColumn::TopUnknownBarcodes => self.top_unknown_barcodes_filename.as_deref(),
        }
    }

    /// Copy of the record with `column` set to `value`.
    pub fn with_auxiliary(
        &self,
        column: AuxColumn,
        value: Option<String>,
    ) -> ManifestRecord {
        let mut record = self.clone();
        match column {
            AuxColumn::DemultiplexStats => record.demultiplex_stats_filename = value,
            AuxColumn::RunParameters => record.run_parameters_filename = value,
            AuxColumn::TopUnknownBarcodes => record.top_unknown_barcodes_filename = value,
        }
        record
    }

    fn value(
        &self,
        column: &str,
    ) -> String {
        match column {
            FILENAME => self.filename.clone(),
            CHECKSUM => self.checksum.clone(),
            FLOW_CELL_NAME => self.flow_cell_name.clone(),
            LIBRARY_ALIQUOT_NAME => self.library_aliquot_name.clone(),
            _ => {
                if let Some(aux) = AuxColumn::ALL.iter().find(|x| x.name() == column) {
                    self.auxiliary(*aux).unwrap_or_default().to_string()
                } else {
                    self.extra.get(column).cloned().unwrap_or_default()
                }
            },
        }
    }
}

/// Manifest records and the column order they were read in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    pub columns: Vec<String>,
    pub records: Vec<ManifestRecord>,
}

fn non_null(
    cell: &str,
) -> Option<String> {
    match cell.trim() {
        "" | "NA" | "nan" | "NaN" | "None" => None,
        x => Some(x.to_string()),
    }
}

impl Manifest {
    /// Interpret a [Table] as a manifest.
    ///
    /// ## Errors
    ///
    /// Returns [MissingColumn] if a required column is absent,
    /// [EmptyFilename] for a row without a filename, [DuplicateFilename]
    /// if a filename appears twice, and [ConflictingAuxiliary] if an
    /// auxiliary column holds more than one distinct non-null value.
    pub fn from_table(
        table: &Table,
    ) -> Result<Self, E> {
        let required = |name: &str| -> Result<usize, E> {
            table.column(name).ok_or_else(|| Box::new(MissingColumn{ column: name.to_string() }) as E)
        };
        let filename_col = required(FILENAME)?;
        let checksum_col = required(CHECKSUM)?;
        let flow_cell_col = required(FLOW_CELL_NAME)?;
        let aliquot_col = required(LIBRARY_ALIQUOT_NAME)?;
        let aux_cols: Vec<(AuxColumn, Option<usize>)> = AuxColumn::ALL.iter().map(|x| (*x, table.column(x.name()))).collect();

        let known: HashSet<&str> = [FILENAME, CHECKSUM, FLOW_CELL_NAME, LIBRARY_ALIQUOT_NAME].into_iter()
            .chain(AuxColumn::ALL.iter().map(|x| x.name()))
            .collect();

        let mut seen: HashSet<String> = HashSet::new();
        let mut aux_values: Vec<Option<String>> = vec![None; aux_cols.len()];
        let mut records: Vec<ManifestRecord> = Vec::with_capacity(table.rows.len());
        for (idx, row) in table.rows.iter().enumerate() {
            let filename = row[filename_col].trim().to_string();
            if filename.is_empty() {
                return Err(Box::new(EmptyFilename{ row: idx + 1 }));
            }
            if !seen.insert(filename.clone()) {
                return Err(Box::new(DuplicateFilename{ filename }));
            }

            let mut record = ManifestRecord{
                filename,
                checksum: row[checksum_col].trim().to_string(),
                flow_cell_name: row[flow_cell_col].trim().to_string(),
                library_aliquot_name: row[aliquot_col].trim().to_string(),
                ..Default::default()
            };
            for (idx, (aux, col)) in aux_cols.iter().enumerate() {
                let value = col.and_then(|x| non_null(&row[x]));
                // One shared file per flow cell, or none.
                if let Some(other) = value.as_deref() {
                    match aux_values[idx].as_deref() {
                        Some(first) if first != other => {
                            return Err(Box::new(ConflictingAuxiliary{ column: aux.name().to_string(), values: vec![first.to_string(), other.to_string()] }));
                        },
                        Some(_) => (),
                        None => aux_values[idx] = Some(other.to_string()),
                    }
                }
                record = record.with_auxiliary(*aux, value);
            }
            table.header.iter().enumerate()
                .filter(|(_, name)| !known.contains(name.as_str()))
                .for_each(|(col, name)| {
                    record.extra.insert(name.clone(), row[col].clone());
                });

            records.push(record);
        }

        Ok(Manifest{ columns: table.header.clone(), records })
    }

    /// Convert back to a [Table] with the original columns.
    pub fn to_table(
        &self,
    ) -> Table {
        let rows = self.records.iter().map(|record| {
            self.columns.iter().map(|column| record.value(column)).collect::<Vec<String>>()
        }).collect();
        Table{ header: self.columns.clone(), rows }
    }

    pub fn filenames(
        &self,
    ) -> impl Iterator<Item = &str> {
        self.records.iter().map(|x| x.filename.as_str())
    }

    /// Distinct non-empty flow cell names in order of appearance.
    pub fn flow_cells(
        &self,
    ) -> Vec<&str> {
        let mut flow_cells: Vec<&str> = Vec::new();
        self.records.iter()
            .map(|x| x.flow_cell_name.as_str())
            .filter(|x| !x.is_empty())
            .for_each(|x| if !flow_cells.contains(&x) { flow_cells.push(x) });
        flow_cells
    }

    /// Records whose filename contains `aliquot`.
    pub fn for_aliquot(
        &self,
        aliquot: &str,
    ) -> Vec<&ManifestRecord> {
        self.records.iter().filter(|x| x.filename.contains(aliquot)).collect()
    }
}

/// Read a tab-delimited manifest from [Read](std::io::Read).
pub fn read_manifest<R: Read>(
    conn: &mut R,
) -> Result<Manifest, E> {
    let table = read_delimited('\t', conn)?;
    Manifest::from_table(&table)
}

/// Read a tab-delimited manifest from `path`.
pub fn read_manifest_file(
    path: &Path,
) -> Result<Manifest, E> {
    let table = crate::table::read_delimited_file('\t', path)?;
    Manifest::from_table(&table)
}

/// Write a manifest as tab-delimited text to [Write](std::io::Write).
pub fn write_manifest<W: Write>(
    manifest: &Manifest,
    conn: &mut W,
) -> Result<(), E> {
    write_delimited(&manifest.to_table(), '\t', conn)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn read_manifest_with_auxiliary_columns() {
        use super::read_manifest;
        use std::io::Cursor;

        let data: Vec<u8> = b"filename\tchecksum\tflow_cell_name\tlibrary_aliquot_name\tdemultiplex_stats_filename\trun_parameters_filename\n\
                              LIB1_L001_R1.fastq\tabc\tHXYZ\tLIB1\tStats.json\tNA\n\
                              Stats.json\tdef\tHXYZ\tLIB1\tStats.json\t\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_manifest(&mut input).unwrap();

        assert_eq!(got.records.len(), 2);
        assert_eq!(got.records[0].demultiplex_stats_filename, Some("Stats.json".to_string()));
        assert_eq!(got.records[0].run_parameters_filename, None);
        assert_eq!(got.records[1].run_parameters_filename, None);
        assert_eq!(got.records[0].top_unknown_barcodes_filename, None);
        assert_eq!(got.flow_cells(), vec!["HXYZ"]);
    }

    #[test]
    fn read_manifest_missing_column() {
        use super::read_manifest;
        use std::io::Cursor;

        let data: Vec<u8> = b"filename\tchecksum\tflow_cell_name\nA.fastq\tabc\tHXYZ\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_manifest(&mut input);

        assert!(got.is_err());
        assert!(got.unwrap_err().to_string().contains("library_aliquot_name"));
    }

    #[test]
    fn read_manifest_duplicate_filename() {
        use super::read_manifest;
        use std::io::Cursor;

        let data: Vec<u8> = b"filename\tchecksum\tflow_cell_name\tlibrary_aliquot_name\n\
                              A.fastq\tabc\tHXYZ\tLIB1\n\
                              A.fastq\tabd\tHXYZ\tLIB1\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_manifest(&mut input);

        assert!(got.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn read_manifest_conflicting_auxiliary_files() {
        use super::read_manifest;
        use std::io::Cursor;

        let data: Vec<u8> = b"filename\tchecksum\tflow_cell_name\tlibrary_aliquot_name\tdemultiplex_stats_filename\n\
                              LIB1_L001_R1.fastq\tabc\tHXYZ\tLIB1\tStats.json\n\
                              LIB1_L001_R2.fastq\tabd\tHXYZ\tLIB1\t\n\
                              LIB1_L002_R1.fastq\tabe\tHXYZ\tLIB1\tOtherStats.json\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_manifest(&mut input);

        let message = got.unwrap_err().to_string();
        assert!(message.contains("demultiplex_stats_filename"));
        assert!(message.contains("Stats.json, OtherStats.json"));
    }

    #[test]
    fn write_manifest_keeps_columns() {
        use super::{read_manifest, write_manifest};
        use std::io::Cursor;

        let data: Vec<u8> = b"file_format\tfilename\tchecksum\tflow_cell_name\tlibrary_aliquot_name\ttop_unknown_barcodes_filename\tdata_type\n\
                              fastq\tLIB1_L001_R1.fastq\tabc\tHXYZ\tLIB1\tTop.csv\traw\n".to_vec();
        let mut input = Cursor::new(data.clone());

        let manifest = read_manifest(&mut input).unwrap();
        let mut got: Vec<u8> = Vec::new();
        write_manifest(&manifest, &mut got).unwrap();

        assert_eq!(got, data);
    }

    #[test]
    fn for_aliquot_filters_by_filename() {
        use super::{Manifest, ManifestRecord};

        let manifest = Manifest{
            columns: Vec::new(),
            records: vec![
                ManifestRecord{ filename: "LIB1_L001_R1.fastq".to_string(), ..Default::default() },
                ManifestRecord{ filename: "LIB2_L001_R1.fastq".to_string(), ..Default::default() },
            ],
        };

        let got: Vec<&str> = manifest.for_aliquot("LIB2").iter().map(|x| x.filename.as_str()).collect();

        assert_eq!(got, vec!["LIB2_L001_R1.fastq"]);
    }
}
