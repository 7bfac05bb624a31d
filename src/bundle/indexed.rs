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
use crate::bundle::BundleVerdict;
use crate::bundle::LaneBundle;
use crate::bundle::LaneContext;
use crate::bundle::Shape;
use crate::bundle::check_group;
use crate::bundle::check_optional;
use crate::bundle::unrecognized;
use crate::event::Sink;

/// Check a lane with reads and optional index reads
///
/// Handles both [Shape::FourFile] (read 1, read 2) and [Shape::FiveFile]
/// (read 1, read 2, read 3). Index 1 and index 2 are optional in both: a lane
/// with no index files has optional verdict None, a lane with only one of
/// them fails the optional check.
///
pub fn check_indexed<S: Sink + ?Sized>(
    shape: Shape,
    bundle: &LaneBundle,
    ctx: &LaneContext,
    sink: &mut S,
) -> BundleVerdict {
    if !shape.accepts(bundle.len()) {
        return unrecognized(shape, bundle, ctx, sink);
    }

    let required = check_group(bundle, shape.required_roles(), ctx, sink);
    let optional = check_optional(bundle, shape.optional_roles(), ctx, sink);
    BundleVerdict{ lane: bundle.lane, required: Some(required), optional }
}

// Tests
#[cfg(test)]
mod tests {

    fn ten_x_lane(lane: u8) -> Vec<String> {
        ["R1", "R2", "I1", "I2"].iter()
            .map(|role| format!("LIB7_S3_L00{}_{}_001.fastq.gz", lane, role))
            .collect()
    }

    #[test]
    fn check_four_file_complete() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files = ten_x_lane(1);
        let bundle = LaneBundle::new(Lane::new(1).unwrap(), files.iter().map(|x| x.as_str()));
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3", aliquot: "LIB7", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FourFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, Some(true));
        assert!(events.is_empty());
    }

    #[test]
    fn check_four_file_missing_index_fails_optional_only() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files = vec!["A_R1.fastq", "A_R2.fastq", "A_I1.fastq", "A_I2.fastq"];
        let lane = Lane::new(1).unwrap();
        let bundle = LaneBundle{ lane, filenames: files };
        let missing: BTreeSet<String> = ["A_I2.fastq".to_string()].into();
        let ctx = LaneContext{ technique: "10xv3", aliquot: "A", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FourFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, Some(false));
        assert_eq!(events, vec![Event::MissingLaneFile{ aliquot: "A".to_string(), lane, filename: "A_I2.fastq".to_string() }]);
    }

    #[test]
    fn check_four_file_degraded_three_files() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files: Vec<String> = ten_x_lane(5).into_iter().filter(|x| !x.contains("_I2_")).collect();
        let bundle = LaneBundle::new(Lane::new(5).unwrap(), files.iter().map(|x| x.as_str()));
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3", aliquot: "LIB7", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FourFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, Some(false));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn check_four_file_without_index() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files: Vec<String> = ten_x_lane(2).into_iter().filter(|x| x.contains("_R")).collect();
        let bundle = LaneBundle::new(Lane::new(2).unwrap(), files.iter().map(|x| x.as_str()));
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3", aliquot: "LIB7", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FourFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, None);
    }

    #[test]
    fn check_four_file_index_name_mismatch() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files = vec![
            "X_S1_L001_R1_001.fastq.gz",
            "X_S1_L001_R2_001.fastq.gz",
            "X_S1_L001_I1_001.fastq.gz",
            "X_S542_L001_I2_001.fastq.gz",
        ];
        let bundle = LaneBundle::new(Lane::new(1).unwrap(), files.iter().copied());
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3", aliquot: "X", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FourFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, Some(false));
        assert!(matches!(events[0], Event::NamingMismatch{ .. }));
    }

    #[test]
    fn check_five_file_complete_with_fq() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files = vec![
            "ATAC9_S2_L003_I1_001.fq.gz",
            "ATAC9_S2_L003_I2_001.fq.gz",
            "ATAC9_S2_L003_R1_001.fq.gz",
            "ATAC9_S2_L003_R2_001.fq.gz",
            "ATAC9_S2_L003_R3_001.fq.gz",
        ];
        let bundle = LaneBundle::new(Lane::new(3).unwrap(), files.iter().copied());
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10x_atac", aliquot: "ATAC9", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FiveFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, Some(true));
        assert!(events.is_empty());
    }

    #[test]
    fn check_five_file_missing_read_three() {
        use super::check_indexed;
        use crate::bundle::{LaneBundle, LaneContext, Shape};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let files = vec![
            "ATAC9_S2_L003_I1_001.fastq.gz",
            "ATAC9_S2_L003_I2_001.fastq.gz",
            "ATAC9_S2_L003_R1_001.fastq.gz",
            "ATAC9_S2_L003_R2_001.fastq.gz",
        ];
        let bundle = LaneBundle::new(Lane::new(3).unwrap(), files.iter().copied());
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10x_atac", aliquot: "ATAC9", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_indexed(Shape::FiveFile, &bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(false));
        assert_eq!(got.optional, Some(true));
    }
}
