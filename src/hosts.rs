//! Provides the `HostsFile` structure, which accumulates the lines of the
//! hosts file we're building and remembers every domain it has accepted.
use fxhash::FxBuildHasher;
use indexmap::IndexSet;

use crate::entry::classify;
use crate::error::HostsError;

/// Tag for the comment lines we write ourselves.
pub const MARKER: &str = "[hostblock]";

/// The address used for every line of a sorted block.
const BLOCKING_ADDRESS: &[u8] = b"0.0.0.0 ";

/// The domains accepted so far, in the order we first saw them.
pub(crate) type KnownDomains = IndexSet<Vec<u8>, FxBuildHasher>;

/// How the output should look.
///
/// * `clean` writes nothing from the blocklists and override files, not even
///   their definitions: only the preserved part of the existing hosts file
///   and our own section headers survive. Domains are still remembered, so
///   `clean` is mostly useful through `sort`,
/// * `sort` replaces the blocklist lines with a single sorted block, and
///   implies `clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Policy {
    clean: bool,
    sort: bool,
}

impl Policy {
    /// Note that `sort` implies `clean`.
    #[must_use]
    pub fn new(sort: bool, clean: bool) -> Self {
        Policy { clean: clean || sort, sort }
    }
    /// Are comments and blank lines being dropped?
    #[must_use]
    pub fn clean(self) -> bool {
        self.clean
    }
    /// Will the domains be emitted as a sorted block?
    #[must_use]
    pub fn sort(self) -> bool {
        self.sort
    }
}

/// What `HostsFile::ingest` did with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Not a host definition: a comment, a blank line, or junk
    Unclassified,
    /// A new domain, now remembered
    Added,
    /// A domain we'd already accepted
    Duplicate,
    /// A system name like `localhost`, left to the existing hosts file
    Protected,
}

/// The hosts file under construction.
pub struct HostsFile {
    policy: Policy,
    known: KnownDomains,
    lines: Vec<Vec<u8>>,
    allow_all: bool,
}

impl HostsFile {
    /// An empty hosts file that accepts only loopback definitions.
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        HostsFile { policy, known: KnownDomains::default(), lines: Vec::new(), allow_all: false }
    }

    /// From now on, accept definitions for any address. There's no way back:
    /// once local override files are being read, they're trusted.
    pub fn allow_all(&mut self) {
        self.allow_all = true;
    }

    /// Add a single line from a blocklist or override file.
    ///
    /// A host definition for a non-loopback address is an error unless
    /// `allow_all` has been called. Definitions for protected names and for
    /// domains we've already seen are dropped. New definitions, and lines
    /// that aren't definitions at all, are kept unless the policy is `clean`
    /// (in which case the domain is still remembered).
    pub fn ingest(&mut self, line: &[u8]) -> Result<Ingested, HostsError> {
        let outcome = match classify(line) {
            None => Ingested::Unclassified,
            Some(entry) => {
                if !self.allow_all && !entry.is_loopback() {
                    return Err(HostsError::NonLoopbackDefinition {
                        line: String::from_utf8_lossy(line).into_owned(),
                    });
                } else if entry.is_protected() {
                    return Ok(Ingested::Protected);
                } else if !self.known.insert(entry.domain.to_vec()) {
                    return Ok(Ingested::Duplicate);
                }
                Ingested::Added
            }
        };
        if !self.policy.clean {
            self.lines.push(line.to_vec());
        }
        Ok(outcome)
    }

    /// Append `lines` verbatim, without looking at them. Unless `force` is
    /// set, a `clean` policy makes this a no-op.
    pub fn ingest_bulk<I>(&mut self, lines: I, force: bool)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        if force || !self.policy.clean {
            self.lines.extend(lines.into_iter().map(|line| line.as_ref().to_vec()));
        }
    }

    /// The domains accepted so far, in order of arrival.
    pub fn known_domains(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.known.iter().map(Vec::as_slice)
    }

    /// Returns the finished list of lines. With a `sort` policy, every
    /// accepted domain is appended as `0.0.0.0 domain`, ordered so that
    /// subdomains sit next to their parents.
    #[must_use]
    pub fn finish(self) -> Vec<Vec<u8>> {
        let HostsFile { policy, known, mut lines, .. } = self;
        if policy.sort {
            lines.push(Vec::new());
            lines.push(format!("# {MARKER} sorted").into_bytes());
            lines.push(Vec::new());
            lines.extend(sorted_by_reversed_labels(&known).into_iter().map(|domain| {
                let mut line = BLOCKING_ADDRESS.to_vec();
                line.extend_from_slice(&domain);
                line
            }));
        }
        lines
    }
}

/// Sorts domains by their labels read right to left, so `a.com` comes
/// before `z.a.com`, which comes before `b.com`.
fn sorted_by_reversed_labels(known: &KnownDomains) -> Vec<Vec<u8>> {
    let mut keys: Vec<Vec<&[u8]>> = known
        .iter()
        .map(|domain| {
            let mut labels: Vec<&[u8]> = domain.split(|&b| b == b'.').collect();
            // `example.com.` is written as `example.com`
            while labels.last().is_some_and(|label| label.is_empty()) {
                labels.pop();
            }
            labels.reverse();
            labels
        })
        .collect();
    keys.sort_unstable();
    keys.into_iter()
        .map(|mut labels| {
            labels.reverse();
            labels.join(&b'.')
        })
        .collect()
}
