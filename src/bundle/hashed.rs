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
use crate::bundle::unrecognized;
use crate::event::Event;
use crate::event::Sink;
use crate::lane::Role;

/// Check a 3-file lane with a cell hashing file
///
/// Read 1 and read 2 are checked like a [2-file](crate::bundle::paired)
/// lane. What the hashing file must look like has not been settled, so it is
/// not judged: the optional verdict is None and an
/// [UnspecifiedRule](Event::UnspecifiedRule) warning is reported.
///
pub fn check_hashed<S: Sink + ?Sized>(
    bundle: &LaneBundle,
    ctx: &LaneContext,
    sink: &mut S,
) -> BundleVerdict {
    let shape = Shape::ThreeFileHash;
    if !shape.accepts(bundle.len()) {
        return unrecognized(shape, bundle, ctx, sink);
    }

    let required = check_group(bundle, shape.required_roles(), ctx, sink);

    let detail = if bundle.has_role(Role::Hash) {
        "hash file present but not checked".to_string()
    } else {
        format!("no file with the {} marker, not checked", Role::Hash)
    };
    sink.record(Event::UnspecifiedRule{ aliquot: ctx.aliquot.to_string(), lane: bundle.lane, detail });

    BundleVerdict{ lane: bundle.lane, required: Some(required), optional: None }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn check_hashed_reads_checked_hash_not_judged() {
        use super::check_hashed;
        use crate::bundle::{LaneBundle, LaneContext};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let lane = Lane::new(1).unwrap();
        let files = vec!["HTO4_S1_L001_R1_001.fastq.gz", "HTO4_S1_L001_R2_001.fastq.gz", "HTO4_S1_L001_hash_001.csv"];
        let bundle = LaneBundle::new(lane, files.iter().copied());
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3_cellhash", aliquot: "HTO4", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_hashed(&bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(true));
        assert_eq!(got.optional, None);
        assert!(matches!(events[0], Event::UnspecifiedRule{ .. }));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn check_hashed_two_files_is_unrecognized() {
        use super::check_hashed;
        use crate::bundle::{LaneBundle, LaneContext};
        use crate::event::Event;
        use crate::lane::Lane;
        use std::collections::BTreeSet;

        let lane = Lane::new(1).unwrap();
        let files = vec!["HTO4_S1_L001_R1_001.fastq.gz", "HTO4_S1_L001_R2_001.fastq.gz"];
        let bundle = LaneBundle::new(lane, files.iter().copied());
        let missing: BTreeSet<String> = BTreeSet::new();
        let ctx = LaneContext{ technique: "10xv3_cellhash", aliquot: "HTO4", missing: &missing };

        let mut events: Vec<Event> = Vec::new();
        let got = check_hashed(&bundle, &ctx, &mut events);

        assert_eq!(got.required, Some(false));
        assert!(matches!(events[0], Event::UnrecognizedShape{ .. }));
    }
}
