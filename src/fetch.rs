//! Downloads remote blocklists.
//!
//! The driver only needs something that turns a URL into bytes, so the HTTP
//! client sits behind the `Fetch` trait and tests can serve blocklists from
//! memory.
use std::time::Duration;

use tracing::debug;

use crate::error::HostsError;

/// The blocklists used when none are given on the command line, in the
/// order their entries take precedence.
pub const DEFAULT_SOURCES: [&str; 4] = [
    "http://winhelp2002.mvps.org/hosts.txt",
    "http://someonewhocares.org/hosts/hosts",
    "http://hosts-file.net/download/hosts.txt",
    "http://pgl.yoyo.org/adservers/serverlist.php?hostformat=hosts&showintro=0&mimetype=plaintext",
];

/// Turns a URL into the bytes of the resource it names.
pub trait Fetch {
    /// Fetch `url` with a plain GET.
    ///
    /// # Errors
    ///
    /// Returns `HostsError::SourceUnavailable` if the request fails for any
    /// reason, including a non-success status.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HostsError>;
}

/// HTTP-based fetcher using `ureq`. No retries, no size limit.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// A fetcher whose requests give up after `timeout`, or never if `None`.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder().timeout_global(timeout).build();
        HttpFetcher { agent: ureq::Agent::new_with_config(config) }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HostsError> {
        let response = self.agent.get(url).call().map_err(|e| unavailable(url, &e))?;
        debug!(url, status = %response.status(), "response received");
        response
            .into_body()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| unavailable(url, &e))
    }
}

fn unavailable(url: &str, err: &ureq::Error) -> HostsError {
    HostsError::SourceUnavailable { url: url.to_owned(), reason: err.to_string() }
}
