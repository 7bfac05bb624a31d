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

//! Plain text delimited tables.
//!
//! The manifest is tab-delimited and the technique lists are comma-delimited.
//! Both are read into a [Table] that holds the header line and the rows as
//! strings. Interpreting the columns is left to the callers.
//!
//! ## Usage
//!
//! ```rust
//! use seqqa::table::{read_delimited, write_delimited};
//! use std::io::Cursor;
//!
//! let mut input = Cursor::new(b"name,aliquot\r\n10xv3,\"LIB1\"\n\n".to_vec());
//! let table = read_delimited(',', &mut input).unwrap();
//!
//! assert_eq!(table.header, vec!["name".to_string(), "aliquot".to_string()]);
//! assert_eq!(table.rows, vec![vec!["10xv3".to_string(), "LIB1".to_string()]]);
//!
//! let mut output: Vec<u8> = Vec::new();
//! write_delimited(&table, '\t', &mut output).unwrap();
//! assert_eq!(output, b"name\taliquot\n10xv3\tLIB1\n".to_vec());
//! ```
//!
use std::fs::File;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

type E = Box<dyn std::error::Error>;

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone)]
pub struct MissingHeader;

impl std::fmt::Display for MissingHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Input table has no header line")
    }
}

impl std::error::Error for MissingHeader {}

/// A delimited text table.
///
/// Every row has exactly as many cells as the header, short rows are padded
/// with empty cells when read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the column called `name`, if present.
    pub fn column(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.header.iter().position(|x| x == name)
    }
}

/// Read a delimited table from [Read](std::io::Read).
///
/// The first non-empty line is the header. Blank lines are skipped,
/// Windows line endings are accepted, and cells are trimmed.
pub fn read_delimited<R: Read>(
    separator: char,
    conn: &mut R,
) -> Result<Table, E> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(u8::try_from(separator)?)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(conn);

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|x| x.trim().is_empty()) {
            continue;
        }
        match header {
            None => {
                header = Some(record.iter().map(|x| x.trim_start_matches(BYTE_ORDER_MARK).trim().to_string()).collect());
            },
            Some(ref names) => {
                let mut cells: Vec<String> = record.iter().map(|x| x.to_string()).collect();
                cells.resize(names.len(), String::new());
                rows.push(cells);
            },
        }
    }

    let header = header.ok_or(MissingHeader)?;
    Ok(Table{ header, rows })
}

/// Write a delimited table to [Write](std::io::Write).
///
/// Cells containing the separator, quotes or line breaks are quoted.
pub fn write_delimited<W: Write>(
    table: &Table,
    separator: char,
    conn: &mut W,
) -> Result<(), E> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(u8::try_from(separator)?)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(conn);

    writer.write_record(&table.header)?;
    for row in table.rows.iter() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a delimited table from the file at `path`.
pub fn read_delimited_file(
    separator: char,
    path: &Path,
) -> Result<Table, E> {
    let mut conn = File::open(path)?;
    read_delimited(separator, &mut conn)
}

/// Write a delimited table to a new file at `path`.
pub fn write_delimited_file(
    table: &Table,
    separator: char,
    path: &Path,
) -> Result<(), E> {
    let f = File::create(path)?;
    let mut conn = BufWriter::new(f);
    write_delimited(table, separator, &mut conn)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn read_delimited_tsv() {
        use super::read_delimited;
        use std::io::Cursor;

        let data: Vec<u8> = b"filename\tchecksum\nA_R1.fastq\tabc\nA_R2.fastq\tdef\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_delimited('\t', &mut input).unwrap();

        assert_eq!(got.header, vec!["filename".to_string(), "checksum".to_string()]);
        assert_eq!(got.rows.len(), 2);
        assert_eq!(got.rows[1], vec!["A_R2.fastq".to_string(), "def".to_string()]);
    }

    #[test]
    fn read_delimited_crlf_and_blank_lines() {
        use super::read_delimited;
        use std::io::Cursor;

        let data: Vec<u8> = b"\r\nname,aliquot\r\n\r\n10xv3,LIB1\r\n   \r\nsmartseq,LIB2\r\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_delimited(',', &mut input).unwrap();

        assert_eq!(got.header, vec!["name".to_string(), "aliquot".to_string()]);
        assert_eq!(got.rows, vec![
            vec!["10xv3".to_string(), "LIB1".to_string()],
            vec!["smartseq".to_string(), "LIB2".to_string()],
        ]);
    }

    #[test]
    fn read_delimited_quoted_cells() {
        use super::read_delimited;
        use std::io::Cursor;

        let data: Vec<u8> = b"technique,data_type,note\n10xv3,raw,\"lanes 1,2 \"\"only\"\"\"\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_delimited(',', &mut input).unwrap();

        assert_eq!(got.rows[0][2], "lanes 1,2 \"only\"");
    }

    #[test]
    fn read_delimited_pads_short_rows() {
        use super::read_delimited;
        use std::io::Cursor;

        let data: Vec<u8> = b"a\tb\tc\n1\t2\n1\t2\t3\t4\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_delimited('\t', &mut input).unwrap();

        assert_eq!(got.rows[0], vec!["1".to_string(), "2".to_string(), String::new()]);
        assert_eq!(got.rows[1], vec!["1".to_string(), "2".to_string(), "3".to_string()]);
        assert_eq!(got.column("c"), Some(2));
        assert_eq!(got.column("d"), None);
    }

    #[test]
    fn read_delimited_empty_input() {
        use super::read_delimited;
        use std::io::Cursor;

        let mut input = Cursor::new(Vec::<u8>::new());
        assert!(read_delimited('\t', &mut input).is_err());
    }

    #[test]
    fn write_delimited_quotes_separator() {
        use super::{write_delimited, Table};

        let table = Table{
            header: vec!["filename".to_string(), "updated_filename".to_string()],
            rows: vec![vec!["a,b.fastq".to_string(), "c.fastq".to_string()]],
        };

        let mut got: Vec<u8> = Vec::new();
        write_delimited(&table, ',', &mut got).unwrap();

        assert_eq!(got, b"filename,updated_filename\n\"a,b.fastq\",c.fastq\n".to_vec());
    }

    #[test]
    fn read_delimited_byte_order_mark() {
        use super::read_delimited;
        use std::io::Cursor;

        let data: Vec<u8> = b"\xef\xbb\xbffilename\tchecksum\nA_R1.fastq\t abc \n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_delimited('\t', &mut input).unwrap();

        assert_eq!(got.column("filename"), Some(0));
        assert_eq!(got.rows[0], vec!["A_R1.fastq".to_string(), "abc".to_string()]);
    }

    #[test]
    fn write_delimited_reads_back_quoted_cells() {
        use super::{read_delimited, write_delimited, Table};
        use std::io::Cursor;

        let table = Table{
            header: vec!["filename".to_string(), "note".to_string()],
            rows: vec![vec!["A_R1.fastq".to_string(), "lane\t\"2\"".to_string()]],
        };

        let mut written: Vec<u8> = Vec::new();
        write_delimited(&table, '\t', &mut written).unwrap();
        let got = read_delimited('\t', &mut Cursor::new(written)).unwrap();

        assert_eq!(got, table);
    }
}
