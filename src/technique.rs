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

//! Sequencing techniques and the lane bundle [Shape] each one produces.
//!
//! The techniques to check in a run are listed in a comma-delimited file
//! with the columns `name` and `aliquot`. The aliquot is matched as a
//! substring of the manifest filenames.
//!
//! Which shape a technique has is hard coded in this module. Only raw data
//! has lane bundles. A technique shape master file with the columns
//! `technique` and `data_type` can be used to restrict the catalog to the
//! techniques it lists and to assign their data types.
//!
//! ## Usage
//!
//! ```rust
//! use seqqa::bundle::Shape;
//! use seqqa::technique::TechniqueShapeCatalog;
//!
//! let catalog = TechniqueShapeCatalog::builtin();
//!
//! assert_eq!(catalog.shape("10xv3"), Ok(Shape::FourFile));
//! assert!(catalog.shape("nanopore").is_err());
//! ```
//!
use crate::bundle::Shape;
use crate::table::Table;

use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;

type E = Box<dyn std::error::Error>;

const RAW: &str = "raw";

/// Techniques with raw data and the shape of their lane bundles.
const RAW_TECHNIQUE_SHAPES: &[(&str, Shape)] = &[
    ("smartseq2", Shape::TwoFile),
    ("smartseq3", Shape::TwoFile),
    ("bulk_rnaseq", Shape::TwoFile),
    ("snmc_seq2", Shape::TwoFile),
    ("patchseq", Shape::TwoFile),
    ("10xv2", Shape::FourFile),
    ("10xv3", Shape::FourFile),
    ("10xv3.1", Shape::FourFile),
    ("10x_5prime", Shape::FourFile),
    ("10x_multiome_gex", Shape::FourFile),
    ("10x_atac", Shape::FiveFile),
    ("10x_multiome_atac", Shape::FiveFile),
    ("10xv3_cellhash", Shape::ThreeFileHash),
    ("multiseq", Shape::ThreeFileHash),
];

#[derive(Debug, Clone)]
pub struct MissingTechniqueColumn {
    pub column: String,
}

impl std::fmt::Display for MissingTechniqueColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Technique table is missing the required column '{}'", self.column)
    }
}

impl std::error::Error for MissingTechniqueColumn {}

/// A technique to validate for one aliquot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TechniqueEntry {
    pub name: String,
    pub aliquot: String,
}

fn required_column(
    table: &Table,
    name: &str,
) -> Result<usize, E> {
    table.column(name).ok_or_else(|| Box::new(MissingTechniqueColumn{ column: name.to_string() }) as E)
}

/// Interpret a [Table] with the columns `name` and `aliquot`.
///
/// Rows with an empty name or aliquot are skipped.
pub fn techniques_from_table(
    table: &Table,
) -> Result<Vec<TechniqueEntry>, E> {
    let name_col = required_column(table, "name")?;
    let aliquot_col = required_column(table, "aliquot")?;
    let entries = table.rows.iter()
        .map(|row| TechniqueEntry{ name: row[name_col].trim().to_string(), aliquot: row[aliquot_col].trim().to_string() })
        .filter(|x| !x.name.is_empty() && !x.aliquot.is_empty())
        .collect();
    Ok(entries)
}

/// Read the comma-delimited technique list from [Read](std::io::Read).
pub fn read_techniques<R: Read>(
    conn: &mut R,
) -> Result<Vec<TechniqueEntry>, E> {
    let table = crate::table::read_delimited(',', conn)?;
    techniques_from_table(&table)
}

/// Read the comma-delimited technique list from `path`.
pub fn read_techniques_file(
    path: &Path,
) -> Result<Vec<TechniqueEntry>, E> {
    let table = crate::table::read_delimited_file(',', path)?;
    techniques_from_table(&table)
}

/// Shape of a technique that produces raw data.
pub fn raw_shape(
    technique: &str,
) -> Option<Shape> {
    let name = technique.trim().to_ascii_lowercase();
    RAW_TECHNIQUE_SHAPES.iter()
        .find(|(x, _)| *x == name)
        .map(|(_, shape)| *shape)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub data_type: String,
    /// None if the technique has no lane bundle rule for its data type.
    pub shape: Option<Shape>,
}

/// Technique name to data type and lane bundle shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TechniqueShapeCatalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl TechniqueShapeCatalog {
    /// Every technique with a known raw data shape.
    pub fn builtin() -> Self {
        let entries = RAW_TECHNIQUE_SHAPES.iter()
            .map(|(name, shape)| (name.to_string(), CatalogEntry{ data_type: RAW.to_string(), shape: Some(*shape) }))
            .collect();
        Self { entries }
    }

    /// Catalog of the techniques in a shape master table.
    ///
    /// The table must have the columns `technique` and `data_type`. Only
    /// techniques with the `raw` data type get a shape.
    pub fn from_master(
        table: &Table,
    ) -> Result<Self, E> {
        let technique_col = required_column(table, "technique")?;
        let data_type_col = required_column(table, "data_type")?;

        let mut entries: IndexMap<String, CatalogEntry> = IndexMap::new();
        for row in table.rows.iter() {
            let name = row[technique_col].trim().to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            let data_type = row[data_type_col].trim().to_string();
            let shape = if data_type.eq_ignore_ascii_case(RAW) { raw_shape(&name) } else { None };
            entries.insert(name, CatalogEntry{ data_type, shape });
        }
        Ok(Self { entries })
    }

    /// Read a comma-delimited shape master from `path`.
    pub fn from_master_file(
        path: &Path,
    ) -> Result<Self, E> {
        let table = crate::table::read_delimited_file(',', path)?;
        Self::from_master(&table)
    }

    pub fn get(
        &self,
        technique: &str,
    ) -> Option<&CatalogEntry> {
        self.entries.get(&technique.trim().to_ascii_lowercase())
    }

    /// Shape of `technique`, or why it has none.
    pub fn shape(
        &self,
        technique: &str,
    ) -> Result<Shape, String> {
        match self.get(technique) {
            None => Err("technique is not in the catalog".to_string()),
            Some(CatalogEntry{ data_type, shape: None }) => Err(format!("no lane bundle rule for {} data", data_type)),
            Some(CatalogEntry{ shape: Some(shape), .. }) => Ok(*shape),
        }
    }

    pub fn len(
        &self,
    ) -> usize {
        self.entries.len()
    }

    pub fn is_empty(
        &self,
    ) -> bool {
        self.entries.is_empty()
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn read_techniques_list() {
        use super::{read_techniques, TechniqueEntry};
        use std::io::Cursor;

        let data: Vec<u8> = b"name,aliquot\n10xv3,LIB1\nsmartseq2,SS2_A01\n,\n".to_vec();
        let mut input = Cursor::new(data);

        let got = read_techniques(&mut input).unwrap();

        assert_eq!(got, vec![
            TechniqueEntry{ name: "10xv3".to_string(), aliquot: "LIB1".to_string() },
            TechniqueEntry{ name: "smartseq2".to_string(), aliquot: "SS2_A01".to_string() },
        ]);
    }

    #[test]
    fn read_techniques_missing_column() {
        use super::read_techniques;
        use std::io::Cursor;

        let data: Vec<u8> = b"technique,aliquot\n10xv3,LIB1\n".to_vec();
        let mut input = Cursor::new(data);

        assert!(read_techniques(&mut input).is_err());
    }

    #[test]
    fn builtin_shapes() {
        use super::TechniqueShapeCatalog;
        use crate::bundle::Shape;

        let catalog = TechniqueShapeCatalog::builtin();

        assert_eq!(catalog.shape("smartseq2"), Ok(Shape::TwoFile));
        assert_eq!(catalog.shape("10xV3"), Ok(Shape::FourFile));
        assert_eq!(catalog.shape("10x_atac"), Ok(Shape::FiveFile));
        assert_eq!(catalog.shape("multiseq"), Ok(Shape::ThreeFileHash));
        assert!(catalog.shape("pacbio_hifi").is_err());
    }

    #[test]
    fn builtin_agrees_with_raw_shape() {
        use super::{raw_shape, TechniqueShapeCatalog, RAW_TECHNIQUE_SHAPES};

        let catalog = TechniqueShapeCatalog::builtin();

        assert_eq!(catalog.len(), RAW_TECHNIQUE_SHAPES.len());
        for (name, shape) in RAW_TECHNIQUE_SHAPES.iter() {
            assert_eq!(catalog.shape(name), Ok(*shape));
            assert_eq!(raw_shape(&name.to_ascii_uppercase()), Some(*shape));
        }
        assert_eq!(raw_shape("10x_visium"), None);
    }

    #[test]
    fn master_restricts_and_types() {
        use super::TechniqueShapeCatalog;
        use crate::bundle::Shape;
        use crate::table::read_delimited;
        use std::io::Cursor;

        let data: Vec<u8> = b"technique,data_type,modality\n10xv3,raw,transcriptomics\n10x_atac,counts,epigenomics\n".to_vec();
        let mut input = Cursor::new(data);
        let table = read_delimited(',', &mut input).unwrap();

        let catalog = TechniqueShapeCatalog::from_master(&table).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.shape("10xv3"), Ok(Shape::FourFile));
        assert_eq!(catalog.shape("10x_atac"), Err("no lane bundle rule for counts data".to_string()));
        assert_eq!(catalog.shape("smartseq2"), Err("technique is not in the catalog".to_string()));
    }
}
