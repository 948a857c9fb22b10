//! Recognizes host-definition lines: an address, whitespace, and a domain
//! name, with anything after the domain (usually a `#` comment) ignored.
use memchr::memchr;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Addresses that send a domain nowhere. These are the only addresses a
/// blocklist may use.
pub const LOOPBACK: [&[u8]; 4] = [b"0.0.0.0", b"::1", b"127.0.0.1", b"255.255.255.255"];

/// Names every hosts file needs. Blocklists often repeat them; we keep the
/// definitions from the existing hosts file instead.
pub const PROTECTED: [&[u8]; 4] = [b"localhost", b"broadcasthost", b"localdomain", b"local"];

// `(?-u)`: work on raw bytes, so `\s` is ASCII whitespace and the domain may
// contain bytes that aren't valid UTF-8.
static HOST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\s*([[:xdigit:]:.]+)\s+([^\s#]+)")
        .expect("host line pattern is valid")
});

/// The pieces of a host-definition line, borrowed from the line itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEntry<'line> {
    /// The address token: hex digits, `:` and `.`
    pub address: &'line [u8],
    /// The domain token: everything up to whitespace or `#`
    pub domain: &'line [u8],
    /// Whatever follows the domain, unexamined
    pub rest: &'line [u8],
}

impl HostEntry<'_> {
    /// Is the address one of the `LOOPBACK` addresses?
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        LOOPBACK.contains(&self.address)
    }

    /// Is the domain one of the `PROTECTED` names?
    #[must_use]
    pub fn is_protected(&self) -> bool {
        PROTECTED.contains(&self.domain)
    }

    /// Any address containing a colon counts as IPv6.
    #[must_use]
    pub fn is_ipv6(&self) -> bool {
        memchr(b':', self.address).is_some()
    }

    /// Lines the existing hosts file must keep: system names, real
    /// (non-loopback) mappings, and IPv6 definitions.
    #[must_use]
    pub fn must_preserve(&self) -> bool {
        self.is_protected() || !self.is_loopback() || self.is_ipv6()
    }
}

/// Returns the `HostEntry` for `line`, or `None` for blank lines, comments
/// and anything else that doesn't look like a host definition.
#[must_use]
pub fn classify(line: &[u8]) -> Option<HostEntry<'_>> {
    let captures = HOST_LINE.captures(line)?;
    let address = captures.get(1)?;
    let domain = captures.get(2)?;
    Some(HostEntry {
        address: address.as_bytes(),
        domain: domain.as_bytes(),
        rest: &line[domain.end()..],
    })
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    fn parts(line: &str) -> Option<(&str, &str)> {
        classify(line.as_bytes()).map(|e| {
            (std::str::from_utf8(e.address).unwrap(), std::str::from_utf8(e.domain).unwrap())
        })
    }

    #[test]
    fn plain_definitions_are_split_into_address_and_domain() {
        assert_eq!(parts("0.0.0.0 ads.example.com"), Some(("0.0.0.0", "ads.example.com")));
        assert_eq!(parts("127.0.0.1\tlocalhost"), Some(("127.0.0.1", "localhost")));
        assert_eq!(parts("  ::1   ip6-localhost"), Some(("::1", "ip6-localhost")));
        assert_eq!(parts("fe80::1 router.lan"), Some(("fe80::1", "router.lan")));
    }

    #[test]
    fn the_domain_stops_at_a_comment() {
        let entry = classify(b"0.0.0.0 tracker.example#ads").unwrap();
        assert_eq!(entry.domain, b"tracker.example");
        assert_eq!(entry.rest, b"#ads");

        let entry = classify(b"0.0.0.0 tracker.example  # ads").unwrap();
        assert_eq!(entry.domain, b"tracker.example");
        assert_eq!(entry.rest, b"  # ads");
    }

    #[test]
    fn non_data_lines_are_not_classified() {
        for line in ["", "   ", "# 0.0.0.0 commented.out", "0.0.0.0", "0.0.0.0   ", "0.0.0.0 #x"] {
            assert_eq!(parts(line), None, "for {line:?}");
        }
        // `%` isn't an address character, and there's no whitespace before it
        assert_eq!(parts("fe80::1%lo0 link.local"), None);
        // no leading whitespace allowed before something that isn't an address
        assert_eq!(parts("ads.example.com"), None);
    }

    #[test]
    fn hex_words_look_like_addresses() {
        assert_eq!(parts("cafe babe.example"), Some(("cafe", "babe.example")));
    }

    #[test]
    fn domains_may_contain_non_utf8_bytes() {
        let entry = classify(b"0.0.0.0 bad\xff.example").unwrap();
        assert_eq!(entry.domain, b"bad\xff.example");
    }

    #[test]
    fn loopback_protected_and_ipv6_predicates() {
        let entry = classify(b"127.0.0.1 localhost").unwrap();
        assert!(entry.is_loopback() && entry.is_protected() && !entry.is_ipv6());
        assert!(entry.must_preserve());

        let entry = classify(b"0.0.0.0 ads.example").unwrap();
        assert!(entry.is_loopback() && !entry.is_protected());
        assert!(!entry.must_preserve());

        let entry = classify(b"::1 ads.example").unwrap();
        assert!(entry.is_loopback() && entry.is_ipv6());
        assert!(entry.must_preserve());

        let entry = classify(b"192.168.1.10 nas").unwrap();
        assert!(!entry.is_loopback());
        assert!(entry.must_preserve());
    }

    #[test]
    fn protected_names_match_exactly() {
        assert!(!classify(b"127.0.0.1 localhost.localdomain").unwrap().is_protected());
        assert!(classify(b"127.0.0.1 localdomain").unwrap().is_protected());
        assert!(classify(b"255.255.255.255 broadcasthost").unwrap().is_protected());
    }
}
