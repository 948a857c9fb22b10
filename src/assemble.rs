//! Houses the `assemble` function, which puts a new hosts file together from
//! the old one, the remote blocklists, and the local override files.
//!
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::entry::classify;
use crate::fetch::Fetch;
use crate::hosts::{HostsFile, Ingested, Policy, MARKER};
use crate::io::{framing_of, lines_of, strip_bom, Framing, OverrideFile};

/// The finished hosts file: its lines, and how to frame them on output.
#[derive(Debug)]
pub struct Assembled {
    /// The lines, without terminators
    pub lines: Vec<Vec<u8>>,
    /// Byte Order Mark and line terminator, taken from the old hosts file
    pub framing: Framing,
}

impl Assembled {
    /// Writes the hosts file to `out`.
    pub fn output_to(&self, out: impl std::io::Write) -> Result<()> {
        crate::io::output_to(&self.lines, self.framing, out)
    }
}

/// Builds the new hosts file:
///
/// 1. Keep the part of `old_hosts` that matters: everything up to and
///    including its last line that defines a protected name, a non-loopback
///    address, or an IPv6 address.
/// 2. Add the definitions of each of the `sources`, fetched with `fetcher`,
///    in order. These must all be loopback definitions.
/// 3. Add the definitions in each of the `overrides`, which may use any
///    address.
///
/// Each source and override gets a header comment. Domains are kept only
/// the first time they're seen. The first error ends the whole process.
pub fn assemble<F: Fetch, O: OverrideFile>(
    policy: Policy,
    old_hosts: &[u8],
    fetcher: &F,
    sources: &[String],
    overrides: impl Iterator<Item = Result<O>>,
) -> Result<Assembled> {
    let (framing, old_hosts) = framing_of(old_hosts);
    let mut hosts = HostsFile::new(policy);

    let old_lines: Vec<&[u8]> = lines_of(old_hosts).collect();
    let kept = preserved_prefix(&old_lines);
    debug!(kept = kept.len(), of = old_lines.len(), "preserving the start of the old hosts file");
    hosts.ingest_bulk(kept, true);

    for url in sources {
        hosts.ingest_bulk(header(url), true);
        info!(url = url.as_str(), "fetching");
        let body = crate::io::decode_if_utf16(fetcher.fetch(url)?);
        let mut tally = Tally::default();
        for line in lines_of(strip_bom(&body)) {
            tally.record(hosts.ingest(line).with_context(|| format!("In blocklist {url}"))?);
        }
        tally.log(url);
    }

    for operand in overrides {
        let operand = operand?;
        let name = operand.name();
        hosts.ingest_bulk(header(&name), true);
        hosts.allow_all();
        let mut tally = Tally::default();
        operand.try_for_byte_line(|line| {
            tally.record(hosts.ingest(line)?);
            Ok(())
        })?;
        tally.log(&name);
    }

    info!(domains = hosts.known_domains().count(), "blocking");
    Ok(Assembled { lines: hosts.finish(), framing })
}

/// Returns the lines up to and including the last one that must survive:
/// a definition of a protected name, of a non-loopback address, or of an IPv6
/// address. If there's no such line, nothing survives.
pub fn preserved_prefix<'a, 'data>(lines: &'a [&'data [u8]]) -> &'a [&'data [u8]] {
    let end = lines
        .iter()
        .rposition(|line| classify(line).is_some_and(|entry| entry.must_preserve()))
        .map_or(0, |last| last + 1);
    &lines[..end]
}

/// The blank-comment-blank block that introduces each source.
fn header(name: &str) -> [Vec<u8>; 3] {
    [Vec::new(), format!("# {MARKER} {name}").into_bytes(), Vec::new()]
}

/// Counts what happened to the lines of one source, for the log.
#[derive(Default)]
struct Tally {
    added: usize,
    duplicate: usize,
    protected: usize,
    other: usize,
}

impl Tally {
    fn record(&mut self, outcome: Ingested) {
        match outcome {
            Ingested::Added => self.added += 1,
            Ingested::Duplicate => self.duplicate += 1,
            Ingested::Protected => self.protected += 1,
            Ingested::Unclassified => self.other += 1,
        }
    }

    fn log(&self, source: &str) {
        info!(
            source,
            added = self.added,
            duplicate = self.duplicate,
            protected = self.protected,
            other = self.other,
            "source merged"
        );
    }
}
