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

//! Summary table of a QA run.
//!
//! One row per validated technique and aliquot with the columns
//! `technique`, `aliquot`, `MissingFiles`, `CheckSumQA`, `Required` and
//! `Optional`, followed by an `overall` row. The missing file and checksum
//! columns only consider filenames that contain the aliquot name.
//!
use crate::checksum::ChecksumReport;
use crate::dispatch::Status;
use crate::dispatch::TechniqueVerdict;
use crate::reconcile::ReconciliationResult;
use crate::table::Table;

use std::io::Write;
use std::path::Path;

type E = Box<dyn std::error::Error>;

const OVERALL: &str = "overall";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub technique: String,
    pub aliquot: String,
    pub missing_files: Status,
    pub checksum_qa: Status,
    pub required: Status,
    pub optional: Status,
}

impl ReportRow {
    fn cells(
        &self,
    ) -> Vec<String> {
        vec![
            self.technique.clone(),
            self.aliquot.clone(),
            self.missing_files.to_string(),
            self.checksum_qa.to_string(),
            self.required.to_string(),
            self.optional.to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaReport {
    pub rows: Vec<ReportRow>,
    pub overall: ReportRow,
}

impl QaReport {
    /// True if no file is missing, no checksum failed, and every
    /// technique passed its required files.
    ///
    /// Failed optional files do not count.
    pub fn passed(
        &self,
    ) -> bool {
        !self.overall.missing_files.is_failed() && !self.overall.checksum_qa.is_failed() && !self.overall.required.is_failed()
    }

    pub fn to_table(
        &self,
    ) -> Table {
        let header = ["technique", "aliquot", "MissingFiles", "CheckSumQA", "Required", "Optional"]
            .iter().map(|x| x.to_string()).collect();
        let rows = self.rows.iter().chain(std::iter::once(&self.overall)).map(|x| x.cells()).collect();
        Table{ header, rows }
    }
}

fn checksum_status<F: Fn(&str) -> bool>(
    checksums: Option<&ChecksumReport>,
    select: F,
) -> Status {
    match checksums {
        None => Status::Skipped,
        Some(report) => Status::from_bool(!report.mismatched().iter().any(|x| select(*x))),
    }
}

/// Combine the results of a run into a [QaReport].
///
/// `checksums` is None if checksum verification was skipped.
pub fn build_report(
    verdicts: &[TechniqueVerdict],
    reconciliation: &ReconciliationResult,
    checksums: Option<&ChecksumReport>,
) -> QaReport {
    let rows: Vec<ReportRow> = verdicts.iter().map(|verdict| {
        let aliquot = verdict.aliquot.as_str();
        ReportRow{
            technique: verdict.technique.clone(),
            aliquot: verdict.aliquot.clone(),
            missing_files: Status::from_bool(!reconciliation.declared_missing.iter().any(|x| x.contains(aliquot))),
            checksum_qa: checksum_status(checksums, |x| x.contains(aliquot)),
            required: verdict.required,
            optional: verdict.optional,
        }
    }).collect();

    let optional = if rows.iter().any(|x| x.optional.is_failed()) {
        Status::Failed
    } else if rows.iter().any(|x| x.optional == Status::Passed) {
        Status::Passed
    } else {
        Status::Skipped
    };
    let overall = ReportRow{
        technique: OVERALL.to_string(),
        aliquot: String::new(),
        missing_files: Status::from_bool(reconciliation.declared_missing.is_empty()),
        checksum_qa: checksum_status(checksums, |_| true),
        required: Status::from_bool(!rows.iter().any(|x| x.required.is_failed())),
        optional,
    };

    QaReport{ rows, overall }
}

/// Write `report` as tab-delimited text to [Write](std::io::Write).
pub fn write_report<W: Write>(
    report: &QaReport,
    conn: &mut W,
) -> Result<(), E> {
    crate::table::write_delimited(&report.to_table(), '\t', conn)
}

/// Write `report` as tab-delimited text to `path`.
pub fn write_report_file(
    report: &QaReport,
    path: &Path,
) -> Result<(), E> {
    crate::table::write_delimited_file(&report.to_table(), '\t', path)
}
