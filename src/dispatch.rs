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

//! Run the lane rules of each technique and aggregate the results.
//!
//! Every technique in the technique list is checked for one aliquot. The
//! manifest records whose filename contains the aliquot are grouped into
//! lanes `L001` to `L008` and each lane is checked against the [Shape] of
//! the technique. The lane verdicts are then folded into one [Status] for
//! the required files and one for the optional files.
//!
//! ## Usage
//!
//! ```rust
//! use seqqa::dispatch::{validate, Status};
//! use seqqa::event::Event;
//! use seqqa::manifest::{Manifest, ManifestRecord};
//! use seqqa::technique::{TechniqueEntry, TechniqueShapeCatalog};
//! use std::collections::BTreeSet;
//!
//! let records = ["SS2_S1_L001_R1_001.fastq.gz", "SS2_S1_L001_R2_001.fastq.gz"].iter()
//!     .map(|x| ManifestRecord{ filename: x.to_string(), ..Default::default() })
//!     .collect();
//! let manifest = Manifest{ columns: Vec::new(), records };
//! let techniques = vec![TechniqueEntry{ name: "smartseq2".to_string(), aliquot: "SS2".to_string() }];
//! let missing: BTreeSet<String> = BTreeSet::new();
//!
//! let mut events: Vec<Event> = Vec::new();
//! let got = validate(&manifest, &techniques, &TechniqueShapeCatalog::builtin(), &missing, &mut events);
//!
//! assert_eq!(got[0].required, Status::Passed);
//! assert_eq!(got[0].optional, Status::Skipped);
//! ```
//!
use crate::bundle::check_lane;
use crate::bundle::BundleVerdict;
use crate::bundle::LaneBundle;
use crate::bundle::LaneContext;
use crate::bundle::Shape;
use crate::event::Event;
use crate::event::Sink;
use crate::lane::Lane;
use crate::manifest::Manifest;
use crate::technique::TechniqueEntry;
use crate::technique::TechniqueShapeCatalog;

use std::collections::BTreeSet;

/// Outcome of one check in the QA report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

impl Status {
    pub fn from_bool(
        passed: bool,
    ) -> Self {
        if passed { Status::Passed } else { Status::Failed }
    }

    pub fn is_failed(
        &self,
    ) -> bool {
        *self == Status::Failed
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Status::Passed => write!(f, "PASSED"),
            Status::Failed => write!(f, "FAILED"),
            Status::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Aggregated result for one technique and aliquot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TechniqueVerdict {
    pub technique: String,
    pub aliquot: String,
    pub shape: Shape,
    pub required: Status,
    pub optional: Status,
    /// Verdicts of the lanes that had files.
    pub lanes: Vec<BundleVerdict>,
}

/// Fold the required verdicts of submitted lanes.
///
/// Failed if any lane failed or if no lane was submitted.
pub fn aggregate_required(
    lanes: &[BundleVerdict],
) -> Status {
    if lanes.is_empty() || lanes.iter().any(|x| x.required == Some(false)) {
        Status::Failed
    } else {
        Status::Passed
    }
}

/// Fold the optional verdicts of submitted lanes.
///
/// Failed if any lane failed, otherwise passed if any lane passed, and
/// skipped if no lane had optional files.
pub fn aggregate_optional(
    lanes: &[BundleVerdict],
) -> Status {
    if lanes.iter().any(|x| x.optional == Some(false)) {
        Status::Failed
    } else if lanes.iter().any(|x| x.optional == Some(true)) {
        Status::Passed
    } else {
        Status::Skipped
    }
}

/// Check every lane of one aliquot against `shape`.
pub fn validate_aliquot<S: Sink + ?Sized>(
    shape: Shape,
    filenames: &[&str],
    ctx: &LaneContext,
    sink: &mut S,
) -> Vec<BundleVerdict> {
    Lane::all().filter_map(|lane| {
        let bundle = LaneBundle::new(lane, filenames.iter().copied());
        check_lane(shape, &bundle, ctx, sink)
    }).collect()
}

/// Validate the lane bundles of each technique in `techniques`.
///
/// Techniques without a shape in `catalog` are reported as
/// [Event::UnrecognizedShape] and get no verdict. An aliquot without files
/// in any lane is reported as [Event::NoLanesSubmitted].
///
/// Verdicts are returned in the order of `techniques`.
pub fn validate<S: Sink + ?Sized>(
    manifest: &Manifest,
    techniques: &[TechniqueEntry],
    catalog: &TechniqueShapeCatalog,
    missing: &BTreeSet<String>,
    sink: &mut S,
) -> Vec<TechniqueVerdict> {
    let mut verdicts: Vec<TechniqueVerdict> = Vec::with_capacity(techniques.len());
    for entry in techniques {
        let shape = match catalog.shape(&entry.name) {
            Ok(shape) => shape,
            Err(detail) => {
                sink.record(Event::UnrecognizedShape{
                    technique: entry.name.clone(),
                    aliquot: entry.aliquot.clone(),
                    lane: None,
                    detail,
                });
                continue;
            },
        };

        let filenames: Vec<&str> = manifest.for_aliquot(&entry.aliquot).iter().map(|x| x.filename.as_str()).collect();
        let ctx = LaneContext{ technique: &entry.name, aliquot: &entry.aliquot, missing };

        log::info!("Checking {} lanes of {} as {}", entry.name, entry.aliquot, shape);
        let lanes = validate_aliquot(shape, &filenames, &ctx, sink);
        if lanes.is_empty() {
            sink.record(Event::NoLanesSubmitted{ technique: entry.name.clone(), aliquot: entry.aliquot.clone() });
        }

        verdicts.push(TechniqueVerdict{
            technique: entry.name.clone(),
            aliquot: entry.aliquot.clone(),
            shape,
            required: aggregate_required(&lanes),
            optional: aggregate_optional(&lanes),
            lanes,
        });
    }
    verdicts
}
