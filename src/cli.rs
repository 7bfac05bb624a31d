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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Validate a delivery directory against its manifest
    Check {
        // Directory containing the delivered files
        #[arg(short = 'd', long = "directory", required = true)]
        directory: PathBuf,

        // Tab-delimited manifest
        #[arg(short = 'm', long = "manifest", required = true)]
        manifest: PathBuf,

        // Comma-delimited list of techniques and aliquots
        #[arg(short = 't', long = "techniques", required = true)]
        techniques: PathBuf,

        // Comma-delimited technique shape master
        #[arg(long = "technique-master", required = false)]
        technique_master: Option<PathBuf>,

        // Skip MD5 checksum verification
        #[arg(long = "skip-checksum", default_value_t = false)]
        skip_checksum: bool,

        // Rename the files if the delivery passed
        #[arg(long = "rename", default_value_t = false)]
        rename: bool,

        // Threads for checksum verification
        #[arg(long = "threads", default_value_t = 1)]
        threads: usize,

        // Directory for the updated manifest and the rename mapping
        #[arg(short = 'o', long = "output-dir", required = false)]
        output_dir: Option<PathBuf>,

        // Write the QA report here instead of stdout
        #[arg(long = "report", required = false)]
        report: Option<PathBuf>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Print MD5 digests of files
    Digest {
        // Input file(s)
        #[arg(group = "input", required = true, help = "Input file(s)")]
        input_files: Vec<PathBuf>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
