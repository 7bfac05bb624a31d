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

//! Reportable outcomes of a QA run.
//!
//! Every component takes a [Sink] and reports what it finds as an [Event].
//! None of the events abort a run, they are recorded and the run continues.
//!
//! The command line client uses [LogSink] to forward the events to the
//! [log] facade. A `Vec<Event>` is also a [Sink], which is what the tests use.
//!
use crate::lane::Lane;

/// Something found while validating or renaming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Declared in the manifest but absent from the directory.
    MissingFile { filename: String },
    /// A declared-but-absent file resolved as part of a lane bundle.
    MissingLaneFile { aliquot: String, lane: Lane, filename: String },
    /// Present in the directory but not declared in the manifest.
    UndeclaredFile { filename: String },
    ChecksumMismatch { filename: String },
    /// The checksum could not be computed.
    ChecksumFault { filename: String, detail: String },
    NamingMismatch { aliquot: String, lane: Lane, detail: String },
    /// Technique without a lane rule, or a lane file count that fits no shape.
    UnrecognizedShape { technique: String, aliquot: String, lane: Option<Lane>, detail: String },
    LaneNotSubmitted { aliquot: String, lane: Lane },
    NoLanesSubmitted { technique: String, aliquot: String },
    /// A bundle component whose rule has not been settled.
    UnspecifiedRule { aliquot: String, lane: Lane, detail: String },
    RenameSkipped { filename: String, detail: String },
    Renamed { from: String, to: String },
    RenameFault { from: String, to: String, detail: String },
    RenameAborted { detail: String },
}

impl Event {
    /// Severity of the event when written to a log.
    pub fn level(
        &self,
    ) -> log::Level {
        match self {
            Event::MissingFile { .. } => log::Level::Error,
            Event::MissingLaneFile { .. } => log::Level::Error,
            Event::UndeclaredFile { .. } => log::Level::Warn,
            Event::ChecksumMismatch { .. } => log::Level::Error,
            Event::ChecksumFault { .. } => log::Level::Error,
            Event::NamingMismatch { .. } => log::Level::Error,
            Event::UnrecognizedShape { .. } => log::Level::Error,
            Event::LaneNotSubmitted { .. } => log::Level::Warn,
            Event::NoLanesSubmitted { .. } => log::Level::Error,
            Event::UnspecifiedRule { .. } => log::Level::Warn,
            Event::RenameSkipped { .. } => log::Level::Warn,
            Event::Renamed { .. } => log::Level::Info,
            Event::RenameFault { .. } => log::Level::Error,
            Event::RenameAborted { .. } => log::Level::Error,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::MissingFile { filename } => write!(f, "{} is listed in the manifest but missing from the directory", filename),
            Event::MissingLaneFile { aliquot, lane, filename } => write!(f, "{} {}: {} is missing from the directory", aliquot, lane, filename),
            Event::UndeclaredFile { filename } => write!(f, "{} is in the directory but not listed in the manifest", filename),
            Event::ChecksumMismatch { filename } => write!(f, "Checksum of {} does not match the value in the manifest", filename),
            Event::ChecksumFault { filename, detail } => write!(f, "Unable to compute checksum of {}: {}", filename, detail),
            Event::NamingMismatch { aliquot, lane, detail } => write!(f, "{} {}: {}", aliquot, lane, detail),
            Event::UnrecognizedShape { technique, aliquot, lane: Some(lane), detail } => write!(f, "{} {} {}: {}", technique, aliquot, lane, detail),
            Event::UnrecognizedShape { technique, aliquot, lane: None, detail } => write!(f, "{} {}: {}", technique, aliquot, detail),
            Event::LaneNotSubmitted { aliquot, lane } => write!(f, "{} {}: lane not submitted", aliquot, lane),
            Event::NoLanesSubmitted { technique, aliquot } => write!(f, "{} {}: no files submitted for any lane", technique, aliquot),
            Event::UnspecifiedRule { aliquot, lane, detail } => write!(f, "{} {}: {}", aliquot, lane, detail),
            Event::RenameSkipped { filename, detail } => write!(f, "Not renaming {}: {}", filename, detail),
            Event::Renamed { from, to } => write!(f, "Renamed {} to {}", from, to),
            Event::RenameFault { from, to, detail } => write!(f, "Unable to rename {} to {}: {}", from, to, detail),
            Event::RenameAborted { detail } => write!(f, "Renaming aborted before any file was touched: {}", detail),
        }
    }
}

/// Receiver of [Event]s.
pub trait Sink {
    fn record(&mut self, event: Event);
}

/// Forwards events to the [log] facade at their [level](Event::level).
#[derive(Clone, Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn record(&mut self, event: Event) {
        log::log!(event.level(), "{}", event);
    }
}

impl Sink for Vec<Event> {
    fn record(&mut self, event: Event) {
        self.push(event);
    }
}
