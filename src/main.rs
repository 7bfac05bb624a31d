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
use std::io::Write;
use std::process::ExitCode;

use clap::CommandFactory;
use clap::Parser;

use seqqa::event::LogSink;

mod cli;

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    // Only fails if a logger was already set.
    let _ = stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init();
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Subcommands:
    match &cli.command {
        // Check
        Some(cli::Commands::Check {
            directory,
            manifest,
            techniques,
            technique_master,
            skip_checksum,
            rename,
            threads,
            output_dir,
            report,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let inputs = seqqa::QaInputs{
                directory: directory.clone(),
                manifest: manifest.clone(),
                techniques: techniques.clone(),
                technique_master: technique_master.clone(),
            };
            let opts = seqqa::QaOptions{
                skip_checksum: *skip_checksum,
                rename: *rename,
                threads: *threads,
                output_dir: output_dir.clone(),
            };

            let outcome = match seqqa::run_qa(&inputs, &opts, &mut LogSink) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("{}", e);
                    return ExitCode::from(EXIT_CONFIG);
                },
            };

            let written = match report {
                Some(path) => seqqa::report::write_report_file(&outcome.report, path),
                None => {
                    let mut conn = std::io::stdout().lock();
                    seqqa::report::write_report(&outcome.report, &mut conn)
                },
            };
            if let Err(e) = written {
                log::error!("Unable to write the QA report: {}", e);
                return ExitCode::from(EXIT_CONFIG);
            }

            if outcome.passed() { ExitCode::SUCCESS } else { ExitCode::from(EXIT_FAILED) }
        },

        // Digest
        Some(cli::Commands::Digest {
            input_files,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let mut conn = std::io::stdout().lock();
            let mut status = ExitCode::SUCCESS;
            for file in input_files.iter() {
                match seqqa::checksum::md5_file(file) {
                    Ok(digest) => {
                        let _ = writeln!(conn, "{}  {}", digest, file.display());
                    },
                    Err(e) => {
                        log::error!("Unable to compute checksum of {}: {}", file.display(), e);
                        status = ExitCode::from(EXIT_FAILED);
                    },
                }
            }
            status
        },

        None => {
            let _ = cli::Cli::command().print_help();
            ExitCode::from(EXIT_CONFIG)
        },
    }
}
