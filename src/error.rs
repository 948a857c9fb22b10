//! The error kinds that abort a run. Anything else (an unreadable override
//! file, a failed write) travels as a plain `anyhow` error with context.
use std::path::PathBuf;

/// Fatal conditions with a meaning of their own. Callers holding an
/// `anyhow::Error` can recover the kind with `downcast_ref::<HostsError>()`.
#[derive(Debug, thiserror::Error)]
pub enum HostsError {
    /// A blocklist tried to point a domain somewhere other than a loopback
    /// address.
    #[error("non-loopback definition: {line}")]
    NonLoopbackDefinition {
        /// The offending line, lossily converted to UTF-8
        line: String,
    },

    /// The existing hosts file can't be read.
    #[error("can't read hosts file {}: {source}", path.display())]
    MissingPrerequisite {
        /// Where we looked for the hosts file
        path: PathBuf,
        /// Why reading it failed
        source: std::io::Error,
    },

    /// A blocklist couldn't be downloaded.
    #[error("can't fetch {url}: {reason}")]
    SourceUnavailable {
        /// The URL that was requested
        url: String,
        /// A human-readable description of the failure
        reason: String,
    },
}
