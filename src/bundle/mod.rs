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

//! Rules for the files delivered in one lane.
//!
//! Each sequencing technique produces a fixed bundle of files per lane, its
//! [Shape]. For example a 10x Genomics 3' library has read 1 and read 2 as
//! required files and the two index reads as optional files.
//!
//! The rules for each shape are in their own modules:
//!
//!   - [paired]: 2-file bundles, read 1 and read 2 only.
//!   - [indexed]: 4-file and 5-file bundles, reads plus optional index reads.
//!   - [hashed]: 3-file bundles with a cell hashing file.
//!
//! All rules work the same way. The files in a lane are grouped by their
//! [Role], each role is resolved to exactly one filename preferring `fastq`
//! over `fq`, and the resolved names in a group must match each other with
//! [matches](crate::name_match::matches). A resolved file that is declared
//! in the manifest but missing from the directory fails its group and is
//! reported as missing rather than misnamed.
//!
//! The outcome is a [BundleVerdict] where `None` means that the check does
//! not apply to the lane, which is distinct from a failure.
//!
//! ## Usage
//!
//! ```rust
//! use seqqa::bundle::{check_lane, LaneBundle, LaneContext, Shape};
//! use seqqa::event::Event;
//! use seqqa::lane::Lane;
//! use std::collections::BTreeSet;
//!
//! let lane = Lane::new(1).unwrap();
//! let files = vec!["A_L001_R1.fastq", "A_L001_R2.fastq", "A_L001_I1.fastq", "A_L001_I2.fastq"];
//! let bundle = LaneBundle::new(lane, files.iter().copied());
//!
//! let missing: BTreeSet<String> = ["A_L001_I2.fastq".to_string()].into();
//! let ctx = LaneContext{ technique: "10xv3", aliquot: "A", missing: &missing };
//!
//! let mut events: Vec<Event> = Vec::new();
//! let verdict = check_lane(Shape::FourFile, &bundle, &ctx, &mut events).unwrap();
//!
//! assert_eq!(verdict.required, Some(true));
//! assert_eq!(verdict.optional, Some(false));
//! ```
//!

pub mod hashed;
pub mod indexed;
pub mod paired;

use crate::event::Event;
use crate::event::Sink;
use crate::lane::Lane;
use crate::lane::Role;
use crate::name_match::matches;

use std::collections::BTreeSet;

const PRIMARY_EXTENSION: &str = "fastq";
const SECONDARY_EXTENSION: &str = "fq";

/// Expected composition of the files in one lane.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Read 1 and read 2.
    TwoFile,
    /// Read 1 and read 2, optionally index 1 and index 2.
    FourFile,
    /// Reads 1 to 3, optionally index 1 and index 2.
    FiveFile,
    /// Read 1, read 2, and a cell hashing file.
    ThreeFileHash,
}

impl Shape {
    /// Number of files in a complete bundle.
    pub fn file_count(
        &self,
    ) -> usize {
        match self {
            Shape::TwoFile => 2,
            Shape::FourFile => 4,
            Shape::FiveFile => 5,
            Shape::ThreeFileHash => 3,
        }
    }

    pub fn required_roles(
        &self,
    ) -> &'static [Role] {
        match self {
            Shape::TwoFile => &[Role::R1, Role::R2],
            Shape::FourFile => &[Role::R1, Role::R2],
            Shape::FiveFile => &[Role::R1, Role::R2, Role::R3],
            Shape::ThreeFileHash => &[Role::R1, Role::R2],
        }
    }

    pub fn optional_roles(
        &self,
    ) -> &'static [Role] {
        match self {
            Shape::TwoFile => &[],
            Shape::FourFile => &[Role::I1, Role::I2],
            Shape::FiveFile => &[Role::I1, Role::I2],
            Shape::ThreeFileHash => &[Role::Hash],
        }
    }

    /// Whether a lane with `n_files` files can be checked against this shape.
    ///
    /// Bundles with optional files accept any count between the required
    /// files only and the complete bundle.
    pub fn accepts(
        &self,
        n_files: usize,
    ) -> bool {
        match self {
            Shape::ThreeFileHash => n_files == self.file_count(),
            _ => (self.required_roles().len()..=self.file_count()).contains(&n_files),
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Shape::TwoFile => write!(f, "2-file"),
            Shape::FourFile => write!(f, "4-file"),
            Shape::FiveFile => write!(f, "5-file"),
            Shape::ThreeFileHash => write!(f, "3-file-hash"),
        }
    }
}

/// Filenames of one aliquot in one lane, sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaneBundle<'a> {
    pub lane: Lane,
    pub filenames: Vec<&'a str>,
}

impl<'a> LaneBundle<'a> {
    /// Collect the filenames that contain the tag of `lane`.
    pub fn new<I: IntoIterator<Item = &'a str>>(
        lane: Lane,
        filenames: I,
    ) -> Self {
        let tag = lane.tag();
        let mut filenames: Vec<&'a str> = filenames.into_iter().filter(|x| x.contains(&tag)).collect();
        filenames.sort_unstable();
        Self { lane, filenames }
    }

    pub fn len(
        &self,
    ) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(
        &self,
    ) -> bool {
        self.filenames.is_empty()
    }

    /// Resolve the single file that fills `role`.
    ///
    /// Files with `fastq` in the name are preferred. If there is not exactly
    /// one of them, files with `fq` in the name are tried instead.
    ///
    /// Returns the number of candidates if the role cannot be resolved.
    pub fn resolve(
        &self,
        role: Role,
    ) -> Result<&'a str, usize> {
        let candidates: Vec<&'a str> = self.filenames.iter().copied().filter(|x| role.matches(x)).collect();
        for extension in [PRIMARY_EXTENSION, SECONDARY_EXTENSION] {
            let resolved: Vec<&'a str> = candidates.iter().copied().filter(|x| x.contains(extension)).collect();
            if resolved.len() == 1 {
                return Ok(resolved[0]);
            }
        }
        Err(candidates.len())
    }

    /// Whether any file carries the marker of `role`.
    pub fn has_role(
        &self,
        role: Role,
    ) -> bool {
        self.filenames.iter().any(|x| role.matches(x))
    }
}

/// What a lane rule needs to know besides the files.
#[derive(Clone, Copy, Debug)]
pub struct LaneContext<'a> {
    pub technique: &'a str,
    pub aliquot: &'a str,
    /// Files declared in the manifest but absent from the directory.
    pub missing: &'a BTreeSet<String>,
}

/// Result of checking one lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BundleVerdict {
    pub lane: Lane,
    /// None if the required files were not checked.
    pub required: Option<bool>,
    /// None if the lane has no optional files.
    pub optional: Option<bool>,
}

fn role_list(
    roles: &[Role],
) -> String {
    roles.iter().map(|x| x.to_string()).collect::<Vec<String>>().join(", ")
}

/// Check that every role in `roles` resolves, is present, and that the
/// resolved names match pairwise.
pub fn check_group<S: Sink + ?Sized>(
    bundle: &LaneBundle,
    roles: &[Role],
    ctx: &LaneContext,
    sink: &mut S,
) -> bool {
    let mut resolved: Vec<&str> = Vec::with_capacity(roles.len());
    let mut ok = true;
    for role in roles {
        match bundle.resolve(*role) {
            Ok(filename) => resolved.push(filename),
            Err(n_candidates) => {
                sink.record(Event::NamingMismatch{
                    aliquot: ctx.aliquot.to_string(),
                    lane: bundle.lane,
                    detail: format!("expected one {} file, found {}", role, n_candidates),
                });
                ok = false;
            },
        }
    }
    if !ok {
        return false;
    }

    let missing: Vec<&str> = resolved.iter().copied().filter(|x| ctx.missing.contains(*x)).collect();
    if !missing.is_empty() {
        missing.iter().for_each(|filename| {
            sink.record(Event::MissingLaneFile{ aliquot: ctx.aliquot.to_string(), lane: bundle.lane, filename: filename.to_string() });
        });
        return false;
    }

    for (idx, first) in resolved.iter().enumerate() {
        for second in resolved.iter().skip(idx + 1) {
            if !matches(first, second) {
                sink.record(Event::NamingMismatch{
                    aliquot: ctx.aliquot.to_string(),
                    lane: bundle.lane,
                    detail: format!("{} and {} differ in more than one character", first, second),
                });
                ok = false;
            }
        }
    }
    ok
}

/// Check the optional files of a lane.
///
/// Returns None if none of `roles` is present, Some(false) if only some of
/// them are, and otherwise the result of [check_group].
pub fn check_optional<S: Sink + ?Sized>(
    bundle: &LaneBundle,
    roles: &[Role],
    ctx: &LaneContext,
    sink: &mut S,
) -> Option<bool> {
    let present: Vec<Role> = roles.iter().copied().filter(|x| bundle.has_role(*x)).collect();
    if present.is_empty() {
        return None;
    }
    if present.len() < roles.len() {
        sink.record(Event::NamingMismatch{
            aliquot: ctx.aliquot.to_string(),
            lane: bundle.lane,
            detail: format!("found optional {} but expected {}", role_list(&present), role_list(roles)),
        });
        return Some(false);
    }
    Some(check_group(bundle, roles, ctx, sink))
}

/// Verdict for a lane whose file count fits no form of `shape`.
pub fn unrecognized<S: Sink + ?Sized>(
    shape: Shape,
    bundle: &LaneBundle,
    ctx: &LaneContext,
    sink: &mut S,
) -> BundleVerdict {
    sink.record(Event::UnrecognizedShape{
        technique: ctx.technique.to_string(),
        aliquot: ctx.aliquot.to_string(),
        lane: Some(bundle.lane),
        detail: format!("{} files do not fit the {} bundle", bundle.len(), shape),
    });
    BundleVerdict{ lane: bundle.lane, required: Some(false), optional: None }
}

/// Check one lane against `shape`.
///
/// Returns None for a lane without files, which is reported with
/// [Event::LaneNotSubmitted] and is not a failure.
pub fn check_lane<S: Sink + ?Sized>(
    shape: Shape,
    bundle: &LaneBundle,
    ctx: &LaneContext,
    sink: &mut S,
) -> Option<BundleVerdict> {
    if bundle.is_empty() {
        sink.record(Event::LaneNotSubmitted{ aliquot: ctx.aliquot.to_string(), lane: bundle.lane });
        return None;
    }
    let verdict = match shape {
        Shape::TwoFile => paired::check_paired(bundle, ctx, sink),
        Shape::FourFile | Shape::FiveFile => indexed::check_indexed(shape, bundle, ctx, sink),
        Shape::ThreeFileHash => hashed::check_hashed(bundle, ctx, sink),
    };
    Some(verdict)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn lane_bundle_selects_lane_and_sorts() {
        use super::LaneBundle;
        use crate::lane::Lane;

        let files = vec!["A_L002_R2.fastq", "A_L001_R2.fastq", "A_L001_R1.fastq", "Stats.json"];
        let got = LaneBundle::new(Lane::new(1).unwrap(), files.iter().copied());

        assert_eq!(got.filenames, vec!["A_L001_R1.fastq", "A_L001_R2.fastq"]);
    }

    #[test]
    fn resolve_prefers_fastq() {
        use super::LaneBundle;
        use crate::lane::{Lane, Role};

        let files = vec!["A_L001_R1.fq.gz", "A_L001_R1.fastq.gz"];
        let got = LaneBundle::new(Lane::new(1).unwrap(), files.iter().copied());

        assert_eq!(got.resolve(Role::R1), Ok("A_L001_R1.fastq.gz"));
    }

    #[test]
    fn resolve_falls_back_to_fq() {
        use super::LaneBundle;
        use crate::lane::{Lane, Role};

        let files = vec!["A_L001_R1.fq.gz", "A_L001_R2.fq.gz"];
        let got = LaneBundle::new(Lane::new(1).unwrap(), files.iter().copied());

        assert_eq!(got.resolve(Role::R2), Ok("A_L001_R2.fq.gz"));
        assert_eq!(got.resolve(Role::I1), Err(0));
    }

    #[test]
    fn resolve_ambiguous() {
        use super::LaneBundle;
        use crate::lane::{Lane, Role};

        let files = vec!["A_L001_R1_001.fastq.gz", "A_L001_R1_002.fastq.gz"];
        let got = LaneBundle::new(Lane::new(1).unwrap(), files.iter().copied());

        assert_eq!(got.resolve(Role::R1), Err(2));
    }

    #[test]
    fn shape_accepts_counts() {
        use super::Shape;

        assert!(Shape::TwoFile.accepts(2));
        assert!(!Shape::TwoFile.accepts(3));
        assert!(Shape::FourFile.accepts(2));
        assert!(Shape::FourFile.accepts(3));
        assert!(Shape::FourFile.accepts(4));
        assert!(!Shape::FourFile.accepts(5));
        assert!(Shape::FiveFile.accepts(3));
        assert!(!Shape::FiveFile.accepts(2));
        assert!(Shape::ThreeFileHash.accepts(3));
        assert!(!Shape::ThreeFileHash.accepts(2));
    }

    #[test]
    fn check_lane_empty_is_not_submitted() {
        use super::{check_lane, LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let lane = Lane::new(7).unwrap();
        let bundle = LaneBundle::new(lane, Vec::<&str>::new());
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3", aliquot: "LIB1", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_lane(Shape::FourFile, &bundle, &ctx, &mut events);

        assert_eq!(got, None);
        assert_eq!(events, vec![Event::LaneNotSubmitted{ aliquot: "LIB1".to_string(), lane }]);
    }

    #[test]
    fn check_group_reports_missing_before_naming() {
        use super::{check_group, LaneBundle, LaneContext};
        use crate::event::Event;
        use crate::lane::{Lane, Role};
        use std::collections::BTreeSet;

        let lane = Lane::new(1).unwrap();
        let files = vec!["A_S1_L001_R1.fastq", "A_S22_L001_R2.fastq"];
        let bundle = LaneBundle::new(lane, files.iter().copied());
        let missing: BTreeSet<String> = ["A_S22_L001_R2.fastq".to_string()].into();
        let ctx = LaneContext{ technique: "smartseq", aliquot: "A", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_group(&bundle, &[Role::R1, Role::R2], &ctx, &mut events);

        assert!(!got);
        assert_eq!(events, vec![Event::MissingLaneFile{ aliquot: "A".to_string(), lane, filename: "A_S22_L001_R2.fastq".to_string() }]);
    }
}
