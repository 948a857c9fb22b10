//! Code to parse the command line using `clap`, and definitions of the
//! parsed result

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::DEFAULT_SOURCES;
use crate::hosts::Policy;

#[cfg(windows)]
const HOSTS_FILE: &str = r"C:\Windows\System32\drivers\etc\hosts";
#[cfg(not(windows))]
const HOSTS_FILE: &str = "/etc/hosts";

/// Returns the parsed command line.
#[must_use]
pub fn parsed() -> Args {
    CliArgs::parse().into()
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// How to shape the output
    pub policy: Policy,
    /// Where to write the result; standard output if `None`
    pub output: Option<PathBuf>,
    /// The existing hosts file
    pub hosts_file: PathBuf,
    /// Blocklist URLs, in order. Empty when running offline.
    pub sources: Vec<String>,
    /// Directory searched for `*.txt` override files
    pub overrides_dir: PathBuf,
    /// Per-request download timeout, if any
    pub timeout: Option<Duration>,
    /// Number of `-v` flags
    pub verbosity: u8,
}

impl From<CliArgs> for Args {
    fn from(cli: CliArgs) -> Self {
        let sources = if cli.offline {
            Vec::new()
        } else if cli.sources.is_empty() {
            DEFAULT_SOURCES.iter().map(|url| (*url).to_string()).collect()
        } else {
            cli.sources
        };
        Args {
            policy: Policy::new(cli.sort, cli.clean),
            output: cli.output,
            hosts_file: cli.hosts_file,
            sources,
            overrides_dir: cli.overrides_dir,
            timeout: cli.timeout.map(Duration::from_secs),
            verbosity: cli.verbose,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "hostblock", version)]
/// Build a hosts file that blocks ad and tracking domains, from the existing
/// hosts file, remote blocklists, and local `*.txt` override files.
struct CliArgs {
    #[arg(short = 'o', value_name = "FILE")]
    /// File to output, stdout if omitted
    output: Option<PathBuf>,

    #[arg(short = 's')]
    /// Sort output, implies -c
    sort: bool,

    #[arg(short = 'c')]
    /// Clean output: write only the kept hosts lines and section headers
    /// (blocked domains then appear only through -s)
    clean: bool,

    #[arg(long, value_name = "PATH", default_value = HOSTS_FILE)]
    /// The existing hosts file to start from
    hosts_file: PathBuf,

    #[arg(long = "source", value_name = "URL")]
    /// Blocklist to fetch instead of the built-in ones (repeatable, in order)
    sources: Vec<String>,

    #[arg(long, conflicts_with = "sources")]
    /// Don't fetch any blocklists
    offline: bool,

    #[arg(long, value_name = "DIR", default_value = ".")]
    /// Directory to search for *.txt override files
    overrides_dir: PathBuf,

    #[arg(long, value_name = "SECS")]
    /// Give up on a blocklist download after this many seconds
    timeout: Option<u64>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    /// More logging on stderr (repeat for more); RUST_LOG overrides
    verbose: u8,
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        CliArgs::try_parse_from(std::iter::once("hostblock").chain(args.iter().copied()))
            .unwrap()
            .into()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.policy, Policy::new(false, false));
        assert_eq!(args.output, None);
        assert_eq!(args.hosts_file, PathBuf::from(HOSTS_FILE));
        assert_eq!(args.sources, DEFAULT_SOURCES.to_vec());
        assert_eq!(args.overrides_dir, PathBuf::from("."));
        assert_eq!(args.timeout, None);
        assert_eq!(args.verbosity, 0);
    }

    #[test]
    fn short_flags_combine() {
        let args = parse(&["-sc", "-ohosts.new", "-vv"]);
        assert!(args.policy.sort() && args.policy.clean());
        assert_eq!(args.output, Some(PathBuf::from("hosts.new")));
        assert_eq!(args.verbosity, 2);
    }

    #[test]
    fn sources_replace_the_defaults_in_order() {
        let args = parse(&["--source", "http://b", "--source", "http://a", "--timeout", "7"]);
        assert_eq!(args.sources, vec!["http://b", "http://a"]);
        assert_eq!(args.timeout, Some(Duration::from_secs(7)));
        assert!(parse(&["--offline"]).sources.is_empty());
    }

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(CliArgs::try_parse_from(["hostblock", "extra"]).is_err());
        assert!(CliArgs::try_parse_from(["hostblock", "--offline", "--source", "http://a"]).is_err());
    }
}
