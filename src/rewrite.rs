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

//! Embed the flow cell name in the delivered filenames.
//!
//! [rewrite] derives the new names and returns an updated copy of the
//! manifest together with the list of renames. It does not touch the
//! filesystem. The renames are carried out by [apply_renames] and the
//! updated manifest and the mapping are written by [write_outputs].
//!
//! Read files are renamed from `{aliquot}_{rest}` to
//! `{aliquot}_{flow cell}_{rest}`. Auxiliary report files referenced in the
//! manifest get the flow cell name as a prefix. Names that already contain
//! the flow cell name are left as is, so a second rewrite changes nothing.
//!
//! ## Usage
//!
//! ```rust
//! use seqqa::manifest::{Manifest, ManifestRecord};
//! use seqqa::rewrite::rewrite;
//! use std::collections::BTreeSet;
//! use std::path::Path;
//!
//! let record = ManifestRecord{
//!     filename: "LIB1_S1_L001_R1_001.fastq.gz".to_string(),
//!     flow_cell_name: "HWT3KDSX3".to_string(),
//!     library_aliquot_name: "LIB1".to_string(),
//!     ..Default::default()
//! };
//! let manifest = Manifest{ columns: Vec::new(), records: vec![record] };
//!
//! let got = rewrite(&manifest, Path::new("run"), &BTreeSet::new()).unwrap();
//!
//! assert_eq!(got.manifest.records[0].filename, "LIB1_HWT3KDSX3_S1_L001_R1_001.fastq.gz");
//! assert_eq!(got.mapping[0].to, Path::new("run").join("LIB1_HWT3KDSX3_S1_L001_R1_001.fastq.gz"));
//! ```
//!
use crate::event::Event;
use crate::event::Sink;
use crate::manifest::write_manifest;
use crate::manifest::AuxColumn;
use crate::manifest::Manifest;
use crate::manifest::ManifestRecord;
use crate::table::Table;

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;

type E = Box<dyn std::error::Error>;

const READ_FILE_MARKERS: [&str; 2] = ["fastq", "fq"];
const MAPPING_FILENAME: &str = "rename_mapping.tsv";

#[derive(Debug, Clone)]
pub struct NoFlowCell;

impl std::fmt::Display for NoFlowCell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Manifest has no flow_cell_name values")
    }
}

impl std::error::Error for NoFlowCell {}

#[derive(Debug, Clone)]
pub struct MultipleFlowCells {
    pub flow_cells: Vec<String>,
}

impl std::fmt::Display for MultipleFlowCells {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Manifest has more than one flow cell: {}", self.flow_cells.join(", "))
    }
}

impl std::error::Error for MultipleFlowCells {}

#[derive(Debug, Clone)]
pub struct OutputWouldOverwrite {
    pub path: PathBuf,
}

impl std::fmt::Display for OutputWouldOverwrite {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Refusing to overwrite the input manifest {}", self.path.display())
    }
}

impl std::error::Error for OutputWouldOverwrite {}

/// One file to rename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameMapping {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Output of [rewrite].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rewrite {
    pub manifest: Manifest,
    /// Renames in manifest order, then auxiliary files without a row.
    pub mapping: Vec<RenameMapping>,
    /// Files that were left alone, as [Event::RenameSkipped].
    pub skipped: Vec<Event>,
}

impl Rewrite {
    /// Copy with the renames in `failed` undone.
    ///
    /// Used to describe what is on disk after some renames failed.
    pub fn without(
        &self,
        failed: &[RenameMapping],
    ) -> Rewrite {
        let name = |x: &Path| x.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let reverted: HashMap<String, String> = failed.iter().map(|x| (name(x.to.as_path()), name(x.from.as_path()))).collect();

        let records = self.manifest.records.iter().map(|record| {
            let mut record = AuxColumn::ALL.iter().fold(record.clone(), |acc, column| {
                let old = acc.auxiliary(*column).and_then(|x| reverted.get(x)).cloned();
                match old {
                    Some(old) => acc.with_auxiliary(*column, Some(old)),
                    None => acc,
                }
            });
            if let Some(old) = reverted.get(&record.filename) {
                record.filename = old.clone();
            }
            record
        }).collect();
        let mapping = self.mapping.iter().filter(|x| !failed.contains(x)).cloned().collect();

        Rewrite{ manifest: Manifest{ columns: self.manifest.columns.clone(), records }, mapping, skipped: self.skipped.clone() }
    }
}

/// Result of [apply_renames] or [rename_all].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenameOutcome {
    pub renamed: Vec<RenameMapping>,
    pub failed: Vec<RenameMapping>,
    /// Nothing was attempted because [preflight] found a problem.
    pub aborted: bool,
}

/// Paths written by [write_outputs].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub manifest: PathBuf,
    pub mapping: PathBuf,
}

/// Whether `filename` is a sequencing read file.
pub fn is_read_file(
    filename: &str,
) -> bool {
    READ_FILE_MARKERS.iter().any(|x| filename.contains(x))
}

/// Replace every run of `_` with a single `_`.
pub fn collapse_separators(
    name: &str,
) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_sep = false;
    for c in name.chars() {
        if c == '_' && prev_sep {
            continue;
        }
        prev_sep = c == '_';
        out.push(c);
    }
    out
}

/// The single flow cell of `manifest`.
pub fn flow_cell(
    manifest: &Manifest,
) -> Result<String, E> {
    let flow_cells = manifest.flow_cells();
    match flow_cells.len() {
        0 => Err(Box::new(NoFlowCell)),
        1 => Ok(flow_cells[0].to_string()),
        _ => Err(Box::new(MultipleFlowCells{ flow_cells: flow_cells.iter().map(|x| x.to_string()).collect() })),
    }
}

fn read_file_name(
    filename: &str,
    aliquot: &str,
    flow_cell: &str,
) -> Result<String, String> {
    if aliquot.is_empty() {
        return Err("record has no library_aliquot_name".to_string());
    }
    match filename.find(aliquot) {
        Some(idx) => {
            let suffix = &filename[(idx + aliquot.len())..];
            Ok(collapse_separators(&format!("{}_{}_{}", aliquot, flow_cell, suffix)))
        },
        None => Err(format!("filename does not contain the aliquot name {}", aliquot)),
    }
}

/// Derive the new filenames of `manifest`.
///
/// `present` is the listing of `target_dir`. An auxiliary file that is
/// named in an auxiliary column but has no manifest row is renamed only if
/// it is in `present`. Otherwise the column is left as is and the file is
/// reported as [Event::RenameSkipped].
///
/// Paths in the returned mapping are `target_dir` joined with the old and
/// new filename.
///
/// ## Errors
///
/// Returns [NoFlowCell] or [MultipleFlowCells] unless the manifest has
/// exactly one flow cell.
///
pub fn rewrite(
    manifest: &Manifest,
    target_dir: &Path,
    present: &BTreeSet<String>,
) -> Result<Rewrite, E> {
    let flow_cell = flow_cell(manifest)?;
    let declared: HashSet<&str> = manifest.filenames().collect();
    let mut skipped: Vec<Event> = Vec::new();

    // Auxiliary files
    let mut aux_renames: IndexMap<String, String> = IndexMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let aux_values = manifest.records.iter()
        .flat_map(|record| AuxColumn::ALL.into_iter().filter_map(move |column| record.auxiliary(column)));
    for value in aux_values {
        if value.contains(&flow_cell) || !seen.insert(value) {
            continue;
        }
        if declared.contains(value) || present.contains(value) {
            aux_renames.insert(value.to_string(), collapse_separators(&format!("{}_{}", flow_cell, value)));
        } else {
            skipped.push(Event::RenameSkipped{ filename: value.to_string(), detail: "auxiliary file is not in the manifest or the directory".to_string() });
        }
    }

    let mut records: Vec<ManifestRecord> = manifest.records.iter().map(|record| {
        AuxColumn::ALL.iter().fold(record.clone(), |acc, column| {
            match record.auxiliary(*column).and_then(|x| aux_renames.get(x)) {
                Some(renamed) => acc.with_auxiliary(*column, Some(renamed.clone())),
                None => acc,
            }
        })
    }).collect();

    for record in records.iter_mut() {
        if let Some(renamed) = aux_renames.get(&record.filename) {
            record.filename = renamed.clone();
        } else if is_read_file(&record.filename) && !record.filename.contains(&flow_cell) {
            match read_file_name(&record.filename, &record.library_aliquot_name, &flow_cell) {
                Ok(renamed) => record.filename = renamed,
                Err(detail) => skipped.push(Event::RenameSkipped{ filename: record.filename.clone(), detail }),
            }
        }
    }

    let mut mapping: Vec<RenameMapping> = manifest.records.iter().zip(records.iter())
        .filter(|(old, new)| old.filename != new.filename)
        .map(|(old, new)| RenameMapping{ from: target_dir.join(&old.filename), to: target_dir.join(&new.filename) })
        .collect();
    // Auxiliary files that are only on disk go last.
    mapping.extend(aux_renames.iter()
        .filter(|(old, _)| !declared.contains(old.as_str()))
        .map(|(old, new)| RenameMapping{ from: target_dir.join(old), to: target_dir.join(new) }));

    Ok(Rewrite{ manifest: Manifest{ columns: manifest.columns.clone(), records }, mapping, skipped })
}

/// Check that every rename in `mapping` can be started.
///
/// Returns a description of each problem found.
pub fn preflight(
    mapping: &[RenameMapping],
) -> Vec<String> {
    let mut problems: Vec<String> = Vec::new();
    let mut destinations: HashSet<&Path> = HashSet::new();
    for rename in mapping {
        if !rename.from.exists() {
            problems.push(format!("{} does not exist", rename.from.display()));
        }
        if rename.to.exists() {
            problems.push(format!("{} already exists", rename.to.display()));
        }
        if !destinations.insert(rename.to.as_path()) {
            problems.push(format!("{} is the target of more than one rename", rename.to.display()));
        }
    }
    problems
}

/// Rename the files in `mapping` in order without checking them first.
///
/// A failed rename is reported as [Event::RenameFault] and the rest are
/// still attempted.
pub fn rename_all<S: Sink + ?Sized>(
    mapping: &[RenameMapping],
    sink: &mut S,
) -> RenameOutcome {
    let mut outcome = RenameOutcome::default();
    for rename in mapping {
        let from = rename.from.display().to_string();
        let to = rename.to.display().to_string();
        match std::fs::rename(&rename.from, &rename.to) {
            Ok(()) => {
                outcome.renamed.push(rename.clone());
                sink.record(Event::Renamed{ from, to });
            },
            Err(e) => {
                outcome.failed.push(rename.clone());
                sink.record(Event::RenameFault{ from, to, detail: e.to_string() });
            },
        }
    }
    outcome
}

/// Rename the files in `mapping` in order.
///
/// Nothing is renamed if [preflight] finds a problem, which is reported
/// as [Event::RenameAborted]. Otherwise this is [rename_all]. Completed
/// renames are not rolled back.
pub fn apply_renames<S: Sink + ?Sized>(
    mapping: &[RenameMapping],
    sink: &mut S,
) -> RenameOutcome {
    let problems = preflight(mapping);
    if !problems.is_empty() {
        sink.record(Event::RenameAborted{ detail: problems.join("; ") });
        return RenameOutcome{ aborted: true, ..Default::default() };
    }
    rename_all(mapping, sink)
}

/// The mapping as a table with the columns `filename` and `updated_filename`.
pub fn mapping_table(
    mapping: &[RenameMapping],
) -> Table {
    let rows = mapping.iter()
        .map(|x| vec![x.from.display().to_string(), x.to.display().to_string()])
        .collect();
    Table{ header: vec!["filename".to_string(), "updated_filename".to_string()], rows }
}

fn same_path(
    first: &Path,
    second: &Path,
) -> bool {
    match (first.canonicalize(), second.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => first == second,
    }
}

/// Where [write_outputs] puts its files.
///
/// The manifest goes to `<stem of manifest_path>.updated.tsv` and the
/// mapping to `rename_mapping.tsv`, both in `output_dir`.
///
/// ## Errors
///
/// Returns [OutputWouldOverwrite] if either output is `manifest_path`.
///
pub fn output_paths(
    manifest_path: &Path,
    output_dir: &Path,
) -> Result<OutputPaths, E> {
    let stem = manifest_path.file_stem().map(|x| x.to_string_lossy().to_string()).unwrap_or_else(|| "manifest".to_string());
    let paths = OutputPaths{
        manifest: output_dir.join(format!("{}.updated.tsv", stem)),
        mapping: output_dir.join(MAPPING_FILENAME),
    };
    for path in [&paths.manifest, &paths.mapping] {
        if same_path(path, manifest_path) {
            return Err(Box::new(OutputWouldOverwrite{ path: manifest_path.to_path_buf() }));
        }
    }
    Ok(paths)
}

/// Write the updated manifest and the rename mapping into `output_dir`.
///
/// ## Errors
///
/// Returns [OutputWouldOverwrite] if either output is `manifest_path`, see
/// [output_paths], and any error from creating or writing the files.
///
pub fn write_outputs(
    rewritten: &Rewrite,
    manifest_path: &Path,
    output_dir: &Path,
) -> Result<OutputPaths, E> {
    let paths = output_paths(manifest_path, output_dir)?;

    let mut conn = BufWriter::new(File::create(&paths.manifest)?);
    write_manifest(&rewritten.manifest, &mut conn)?;
    conn.flush()?;

    crate::table::write_delimited_file(&mapping_table(&rewritten.mapping), '\t', &paths.mapping)?;

    log::info!("Wrote updated manifest to {}", paths.manifest.display());
    log::info!("Wrote rename mapping to {}", paths.mapping.display());
    Ok(paths)
}
