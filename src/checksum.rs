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

//! Verify MD5 checksums of delivered files against the manifest.
//!
//! A file that cannot be read gets no digest at all, so it never matches
//! the expected value and is reported as a mismatch. A single unreadable
//! file does not stop the remaining files from being checked.
//!
use crate::event::Event;
use crate::event::Sink;
use crate::manifest::Manifest;

use std::fs::File;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use md5::Digest;
use md5::Md5;
use rayon::prelude::*;

type E = Box<dyn std::error::Error>;

const BLOCKSIZE: usize = 65536;

/// A file and the digest the manifest expects it to have.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecksumRow {
    /// Name reported on mismatch.
    pub filename: String,
    pub path: PathBuf,
    pub expected: String,
}

impl ChecksumRow {
    /// One row per manifest record, with paths resolved under `dir`.
    pub fn from_manifest(
        manifest: &Manifest,
        dir: &Path,
    ) -> Vec<ChecksumRow> {
        manifest.records.iter().map(|record| ChecksumRow{
            filename: record.filename.clone(),
            path: dir.join(&record.filename),
            expected: record.checksum.clone(),
        }).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecksumOutcome {
    pub filename: String,
    /// None if the digest could not be computed.
    pub observed: Option<String>,
    pub matches: bool,
}

/// Outcomes of [verify] in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChecksumReport {
    pub outcomes: Vec<ChecksumOutcome>,
}

impl ChecksumReport {
    /// True if every file matched its expected digest.
    pub fn passed(
        &self,
    ) -> bool {
        self.outcomes.iter().all(|x| x.matches)
    }

    /// Filenames whose digest did not match.
    pub fn mismatched(
        &self,
    ) -> Vec<&str> {
        self.outcomes.iter().filter(|x| !x.matches).map(|x| x.filename.as_str()).collect()
    }
}

/// Compute the MD5 digest of the file at `path` as lowercase hex.
///
/// The file is read in blocks of 64 KiB.
pub fn md5_file(
    path: &Path,
) -> Result<String, E> {
    let mut conn = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf: Vec<u8> = vec![0; BLOCKSIZE];
    loop {
        let nbytes = match conn.read(&mut buf) {
            Ok(nbytes) => nbytes,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Box::new(e)),
        };
        if nbytes == 0 {
            break;
        }
        hasher.update(&buf[0..nbytes]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn digests_match(
    observed: &str,
    expected: &str,
) -> bool {
    observed.eq_ignore_ascii_case(expected.trim())
}

fn observe(
    row: &ChecksumRow,
) -> Result<String, String> {
    md5_file(&row.path).map_err(|e| e.to_string())
}

/// Compute the digest of every row and compare it to the expected value.
///
/// With `threads` > 1 the digests are computed on a pool of that many
/// threads. The outcomes and the events are in input order either way.
///
/// Reports [Event::ChecksumFault] for each file that could not be read and
/// [Event::ChecksumMismatch] for each file that did not match.
///
/// ## Errors
///
/// Returns an error only if the thread pool cannot be built.
///
pub fn verify<S: Sink + ?Sized>(
    rows: &[ChecksumRow],
    threads: usize,
    sink: &mut S,
) -> Result<ChecksumReport, E> {
    let observed: Vec<Result<String, String>> = if threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        pool.install(|| rows.par_iter().map(observe).collect())
    } else {
        rows.iter().map(observe).collect()
    };

    let mut outcomes: Vec<ChecksumOutcome> = Vec::with_capacity(rows.len());
    for (row, digest) in rows.iter().zip(observed) {
        let observed = match digest {
            Ok(digest) => Some(digest),
            Err(detail) => {
                sink.record(Event::ChecksumFault{ filename: row.filename.clone(), detail });
                None
            },
        };
        let matches = observed.as_deref().is_some_and(|x| digests_match(x, &row.expected));
        if !matches {
            sink.record(Event::ChecksumMismatch{ filename: row.filename.clone() });
        }
        outcomes.push(ChecksumOutcome{ filename: row.filename.clone(), observed, matches });
    }

    Ok(ChecksumReport{ outcomes })
}
