//! `hostblock` builds a hosts file that blocks advertising and tracking
//! domains. The `run` function is the whole program: the `args` module parses
//! the command line, `io` and `fetch` hide the I/O details, and `assemble`
//! does the merging, using `entry` to recognize host definitions and `hosts`
//! to collect them.
//!
//! Current Limitations:
//! * Blocklists are fetched one after another, with no retries. One bad
//!   source ends the run.
//! * Once the first override file is read, definitions for any address are
//!   accepted for the rest of the run, and the lines kept from the old hosts
//!   file are never checked at all.

#![cfg_attr(debug_assertions, allow(dead_code, unused_imports))]
#![deny(unused_must_use)]
#![deny(clippy::all)]
#![allow(clippy::needless_return)]
#![deny(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![deny(missing_docs)]

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::fs::File;
use std::io::BufWriter;

pub mod args;
pub mod assemble;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod hosts;
pub mod io;
pub mod logging;

use crate::args::Args;
use crate::assemble::assemble;
use crate::fetch::HttpFetcher;
use crate::io::{override_paths, read_hosts_file, Overrides};

/// Reads the old hosts file, merges in the blocklists and override files,
/// and writes the result where `args` says. Nothing is written unless every
/// step succeeds.
pub fn run(args: &Args) -> Result<()> {
    let old_hosts = read_hosts_file(&args.hosts_file)?;
    let overrides = override_paths(&args.overrides_dir, args.output.as_deref())?;
    let fetcher = HttpFetcher::new(args.timeout);

    let assembled =
        assemble(args.policy, &old_hosts, &fetcher, &args.sources, Overrides::from(overrides))?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Can't create file: {}", path.display()))?;
            assembled
                .output_to(BufWriter::new(file))
                .with_context(|| format!("Error writing file: {}", path.display()))
        }
        None => {
            let stdout = std::io::stdout().lock();
            if stdout.is_terminal() {
                assembled.output_to(stdout)
            } else {
                assembled.output_to(BufWriter::new(stdout))
            }
        }
    }
}
