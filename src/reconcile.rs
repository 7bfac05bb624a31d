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

//! Compare the files in a directory against the files in a manifest.
use crate::event::Event;
use crate::event::Sink;
use crate::manifest::Manifest;

use std::collections::BTreeSet;
use std::path::Path;

type E = Box<dyn std::error::Error>;

/// Outcome of comparing a directory listing to a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub declared_and_present: BTreeSet<String>,
    /// Only a warning, these do not fail validation.
    pub present_not_declared: BTreeSet<String>,
    pub declared_missing: BTreeSet<String>,
    pub all_present: bool,
}

/// Names of the regular files directly under `dir`.
pub fn list_directory(
    dir: &Path,
) -> Result<BTreeSet<String>, E> {
    let mut files: BTreeSet<String> = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.insert(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(files)
}

/// Classify the files in `directory_files` and `manifest`.
///
/// Every declared-but-missing file is reported as [Event::MissingFile] and
/// every undeclared file as [Event::UndeclaredFile].
///
/// ## Usage
///
/// ```rust
/// use seqqa::event::Event;
/// use seqqa::manifest::{Manifest, ManifestRecord};
/// use seqqa::reconcile::reconcile;
/// use std::collections::BTreeSet;
///
/// let manifest = Manifest{ columns: Vec::new(), records: vec![
///     ManifestRecord{ filename: "A_R1.fastq".to_string(), ..Default::default() },
///     ManifestRecord{ filename: "A_R2.fastq".to_string(), ..Default::default() },
/// ]};
/// let directory: BTreeSet<String> = ["A_R1.fastq".to_string(), "notes.txt".to_string()].into();
///
/// let mut events: Vec<Event> = Vec::new();
/// let got = reconcile(&directory, &manifest, &mut events);
///
/// assert!(!got.all_present);
/// assert!(got.declared_missing.contains("A_R2.fastq"));
/// assert!(got.present_not_declared.contains("notes.txt"));
/// ```
///
pub fn reconcile<S: Sink + ?Sized>(
    directory_files: &BTreeSet<String>,
    manifest: &Manifest,
    sink: &mut S,
) -> ReconciliationResult {
    let declared: BTreeSet<String> = manifest.filenames().map(|x| x.to_string()).collect();

    let declared_and_present: BTreeSet<String> = declared.intersection(directory_files).cloned().collect();
    let declared_missing: BTreeSet<String> = declared.difference(directory_files).cloned().collect();
    let present_not_declared: BTreeSet<String> = directory_files.difference(&declared).cloned().collect();

    declared_missing.iter().for_each(|filename| {
        sink.record(Event::MissingFile{ filename: filename.clone() });
    });
    present_not_declared.iter().for_each(|filename| {
        sink.record(Event::UndeclaredFile{ filename: filename.clone() });
    });

    let all_present = declared_missing.is_empty();
    ReconciliationResult{ declared_and_present, present_not_declared, declared_missing, all_present }
}
