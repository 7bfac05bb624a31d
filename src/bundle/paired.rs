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
use crate::event::Sink;

/// Check a 2-file lane
///
/// The lane must contain exactly read 1 and read 2. There are no optional
/// files so the optional verdict is always None.
///
pub fn check_paired<S: Sink + ?Sized>(
    bundle: &LaneBundle,
    ctx: &LaneContext,
    sink: &mut S,
) -> BundleVerdict {
    let shape = Shape::TwoFile;
    if !shape.accepts(bundle.len()) {
        return unrecognized(shape, bundle, ctx, sink);
    }

    let required = check_group(bundle, shape.required_roles(), ctx, sink);
    BundleVerdict{ lane: bundle.lane, required: Some(required), optional: None }
}
