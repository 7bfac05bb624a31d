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

//! seqqa is a library and a command-line client for checking a delivery of
//! sequencing files against the manifest that came with it:
//!
//!   - Comparing the files in the delivery directory to the manifest.
//!   - Verifying the MD5 checksums listed in the manifest.
//!   - Checking that each lane of each library has the files its
//!     sequencing technique produces, named consistently.
//!   - Renaming the files to include the flow cell and writing an updated
//!     manifest.
//!
//! The lane rules are known for these bundles of files:
//!   - 2-file: read 1 and read 2 (eg. Smart-seq2).
//!   - 4-file: read 1, read 2, and optional index reads (eg. 10x Genomics 3').
//!   - 5-file: reads 1 to 3 and optional index reads (eg. 10x Genomics ATAC).
//!   - 3-file-hash: read 1, read 2, and a cell hashing file.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The seqqa CLI supports the following subcommands:
//!   - `seqqa check` validate a delivery directory against its manifest.
//!   - `seqqa digest` print the MD5 digest of files.
//!
//! `check` needs the delivery directory, the tab-delimited manifest, and a
//! comma-delimited list of the techniques and aliquots in the delivery. The
//! files are renamed only with `--rename` and only if the delivery passed.
//!
//! ### Rust API
//!
//! [run_qa] runs all of the checks. The individual steps are in their own
//! modules and can be used separately:
//!
//!   - [reconcile](reconcile::reconcile): compare a directory listing to the manifest.
//!   - [verify](checksum::verify): compare checksums, optionally in parallel.
//!   - [validate](dispatch::validate): run the lane rules of each technique.
//!   - [rewrite](rewrite::rewrite): derive the new filenames and the updated manifest.
//!
//! All of them report what they find to an [event::Sink].
//!
use std::path::Path;
use std::path::PathBuf;

pub mod bundle;
pub mod checksum;
pub mod dispatch;
pub mod event;
pub mod lane;
pub mod manifest;
pub mod name_match;
pub mod reconcile;
pub mod report;
pub mod rewrite;
pub mod table;
pub mod technique;

use event::Sink;
use report::QaReport;
use rewrite::OutputPaths;
use technique::TechniqueShapeCatalog;

type E = Box<dyn std::error::Error>;

/// Input files of a QA run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaInputs {
    /// Directory containing the delivered files.
    pub directory: PathBuf,
    /// Tab-delimited manifest.
    pub manifest: PathBuf,
    /// Comma-delimited technique list.
    pub techniques: PathBuf,
    /// Comma-delimited technique shape master.
    pub technique_master: Option<PathBuf>,
}

/// Options for [run_qa].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaOptions {
    pub skip_checksum: bool,
    /// Rename the files if the run passed.
    pub rename: bool,
    /// Threads for checksum verification.
    pub threads: usize,
    /// Where to write the updated manifest, defaults to the manifest's directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for QaOptions {
    fn default() -> QaOptions {
        QaOptions {
            skip_checksum: false,
            rename: false,
            threads: 1,
            output_dir: None,
        }
    }
}

/// Outcome of [run_qa].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaOutcome {
    pub report: QaReport,
    /// Written only if the run passed and renaming was not aborted.
    pub outputs: Option<OutputPaths>,
    pub n_renamed: usize,
    /// Renaming was aborted or a rename failed.
    pub rename_failed: bool,
}

impl QaOutcome {
    /// True if the report passed and every requested rename succeeded.
    pub fn passed(
        &self,
    ) -> bool {
        self.report.passed() && !self.rename_failed
    }
}

fn manifest_dir(
    manifest: &Path,
) -> PathBuf {
    match manifest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check a delivery and, if it passed, write the updated manifest.
///
/// Findings are reported to `sink`. The files are renamed only if the run
/// passed and `opts.rename` is set. The updated manifest is written after
/// renaming and lists the names the files ended up with. If renaming is
/// aborted nothing is written and the run fails.
///
/// ## Errors
///
/// Returns an error if an input cannot be read or is malformed, if the
/// manifest does not have exactly one flow cell, or if the outputs cannot be
/// written. QA failures are not errors, see [QaOutcome::passed].
///
/// ## Usage
///
/// ```rust
/// use seqqa::{run_qa, QaInputs, QaOptions};
/// use seqqa::event::Event;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("SS2_S1_L001_R1_001.fastq"), b"").unwrap();
/// std::fs::write(dir.path().join("SS2_S1_L001_R2_001.fastq"), b"").unwrap();
///
/// let empty = "d41d8cd98f00b204e9800998ecf8427e";
/// let manifest = format!("filename\tchecksum\tflow_cell_name\tlibrary_aliquot_name\n\
///                         SS2_S1_L001_R1_001.fastq\t{}\tHFC1\tSS2\n\
///                         SS2_S1_L001_R2_001.fastq\t{}\tHFC1\tSS2\n", empty, empty);
/// std::fs::write(dir.path().join("manifest.tsv"), manifest).unwrap();
/// std::fs::write(dir.path().join("techniques.csv"), "name,aliquot\nsmartseq2,SS2\n").unwrap();
///
/// let inputs = QaInputs{
///     directory: dir.path().to_path_buf(),
///     manifest: dir.path().join("manifest.tsv"),
///     techniques: dir.path().join("techniques.csv"),
///     technique_master: None,
/// };
/// let opts = QaOptions{ rename: true, ..Default::default() };
///
/// let mut events: Vec<Event> = Vec::new();
/// let got = run_qa(&inputs, &opts, &mut events).unwrap();
///
/// assert!(got.passed());
/// assert_eq!(got.n_renamed, 2);
/// assert!(dir.path().join("SS2_HFC1_S1_L001_R1_001.fastq").exists());
/// ```
///
pub fn run_qa<S: Sink + ?Sized>(
    inputs: &QaInputs,
    opts: &QaOptions,
    sink: &mut S,
) -> Result<QaOutcome, E> {
    let manifest = manifest::read_manifest_file(&inputs.manifest)?;
    let techniques = technique::read_techniques_file(&inputs.techniques)?;
    let catalog = match &inputs.technique_master {
        Some(path) => TechniqueShapeCatalog::from_master_file(path)?,
        None => TechniqueShapeCatalog::builtin(),
    };
    log::info!("Read {} manifest records and {} techniques", manifest.records.len(), techniques.len());

    let directory_files = reconcile::list_directory(&inputs.directory)?;
    let reconciliation = reconcile::reconcile(&directory_files, &manifest, sink);

    let checksums = if opts.skip_checksum {
        log::info!("Skipping checksum verification");
        None
    } else {
        log::info!("Verifying checksums of {} files", manifest.records.len());
        let rows = checksum::ChecksumRow::from_manifest(&manifest, &inputs.directory);
        Some(checksum::verify(&rows, opts.threads, sink)?)
    };

    let verdicts = dispatch::validate(&manifest, &techniques, &catalog, &reconciliation.declared_missing, sink);
    let report = report::build_report(&verdicts, &reconciliation, checksums.as_ref());

    if !report.passed() {
        log::error!("QA failed, not writing an updated manifest");
        return Ok(QaOutcome{ report, outputs: None, n_renamed: 0, rename_failed: false });
    }
    log::info!("QA passed");

    let mut rewritten = rewrite::rewrite(&manifest, &inputs.directory, &directory_files)?;
    rewritten.skipped.iter().for_each(|event| sink.record(event.clone()));

    let output_dir = opts.output_dir.clone().unwrap_or_else(|| manifest_dir(&inputs.manifest));
    rewrite::output_paths(&inputs.manifest, &output_dir)?;

    let mut n_renamed = 0;
    let mut rename_failed = false;
    if opts.rename {
        let renames = rewrite::apply_renames(&rewritten.mapping, sink);
        if renames.aborted {
            log::error!("Renaming aborted, not writing an updated manifest");
            return Ok(QaOutcome{ report, outputs: None, n_renamed: 0, rename_failed: true });
        }
        if !renames.failed.is_empty() {
            log::error!("{} files could not be renamed", renames.failed.len());
            rewritten = rewritten.without(&renames.failed);
        }
        n_renamed = renames.renamed.len();
        rename_failed = !renames.failed.is_empty();
    } else {
        log::info!("{} files can be renamed with --rename", rewritten.mapping.len());
    }

    // Describes the directory as it is after renaming.
    let outputs = rewrite::write_outputs(&rewritten, &inputs.manifest, &output_dir)?;

    Ok(QaOutcome{ report, outputs: Some(outputs), n_renamed, rename_failed })
}
