//! Domain extraction from classified hosts-file data lines
//!
//! Every token after the leading IP address is a candidate host name. Each is
//! validated by parsing it as the host of an `http://` URL. The first token
//! that fails validation ends the line: later aliases on the same line are
//! never looked at.

use std::str::SplitWhitespace;

use url::Url;

const PARSE_SCHEME: &str = "http://";

/// Lazy iterator over the domain entries of one data line.
#[derive(Debug, Clone)]
pub struct DomainEntries<'a> {
    tokens: SplitWhitespace<'a>,
    done: bool,
}

/// Extract domain entries from a data line (comment already stripped).
pub fn extract_domains(data_line: &str) -> DomainEntries<'_> {
    let mut tokens = data_line.split_whitespace();
    // IP address field
    let done = tokens.next().is_none();
    DomainEntries { tokens, done }
}

impl Iterator for DomainEntries<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let token = self.tokens.next();
        let domain = token.and_then(normalize_host);
        if domain.is_none() {
            self.done = true;
        }
        domain
    }
}

fn normalize_host(token: &str) -> Option<String> {
    let url = Url::parse(&format!("{}{}", PARSE_SCHEME, token)).ok()?;
    let host = url.host_str()?;

    // The URL parser rewrites some hosts (numeric IPv4 forms, percent
    // escapes, leading slashes); only accept hosts kept as written.
    if !host.eq_ignore_ascii_case(written_host(token)) {
        return None;
    }

    let first_label = host.split('.').next().unwrap_or_default();
    if host.is_empty() || first_label.eq_ignore_ascii_case("localhost") {
        return None;
    }
    Some(host.to_string())
}

/// Host text of `token` as it would appear in an `http://` authority.
fn written_host(token: &str) -> &str {
    let authority = token
        .find(|c| matches!(c, '/' | '?' | '#' | '\\'))
        .map_or(token, |end| &token[..end]);
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.starts_with('[') {
        return host;
    }
    host.rsplit_once(':').map_or(host, |(host, _)| host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{classify, LineKind};

    fn domains(line: &str) -> Vec<String> {
        match classify(line) {
            LineKind::Data(data) => extract_domains(data).collect(),
            LineKind::Skip => Vec::new(),
        }
    }

    #[test]
    fn test_extracts_every_alias_after_the_ip() {
        assert_eq!(
            domains("10.0.0.1 ads.example.com trk.example.com # tracker"),
            vec!["ads.example.com", "trk.example.com"]
        );
    }

    #[test]
    fn test_collapses_runs_of_whitespace() {
        assert_eq!(
            domains("0.0.0.0\t\tads.example.com   \t pixel.example.net"),
            vec!["ads.example.com", "pixel.example.net"]
        );
    }

    #[test]
    fn test_lowercases_hosts() {
        assert_eq!(domains("0.0.0.0 ADS.Example.COM"), vec!["ads.example.com"]);
    }

    #[test]
    fn test_ip_only_line_has_no_entries() {
        assert!(domains("0.0.0.0").is_empty());
        assert!(domains("0.0.0.0    # nothing here").is_empty());
        assert!(extract_domains("").next().is_none());
    }

    #[test]
    fn test_localhost_stops_the_line() {
        assert!(domains("127.0.0.1 localhost").is_empty());
        assert!(domains("127.0.0.1 LocalHost ads.example.com").is_empty());
        assert!(domains("127.0.0.1 localhost.localdomain ads.example.com").is_empty());
        assert_eq!(
            domains("0.0.0.0 ads.example.com localhost trk.example.com"),
            vec!["ads.example.com"]
        );
    }

    #[test]
    fn test_localhost_only_matches_first_label() {
        assert_eq!(domains("0.0.0.0 my.localhost.example"), vec!["my.localhost.example"]);
    }

    #[test]
    fn test_invalid_token_stops_rather_than_skips() {
        // `<` is a forbidden host code point
        let line = "0.0.0.0 ads.example.com bad<host.example trk.example.com";
        assert_eq!(domains(line), vec!["ads.example.com"]);

        let skipped: Vec<String> = line
            .split_whitespace()
            .skip(1)
            .filter_map(normalize_host)
            .collect();
        assert_eq!(skipped, vec!["ads.example.com", "trk.example.com"]);
    }

    #[test]
    fn test_invalid_second_token_yields_nothing() {
        assert!(domains("0.0.0.0 bad|host.example ads.example.com").is_empty());
    }

    #[test]
    fn test_path_is_dropped_from_token() {
        assert_eq!(domains("0.0.0.0 ads.example.com/banner"), vec!["ads.example.com"]);
    }

    #[test]
    fn test_port_and_userinfo_are_dropped_from_token() {
        assert_eq!(domains("0.0.0.0 ads.example.com:8080"), vec!["ads.example.com"]);
        assert_eq!(domains("0.0.0.0 user@ads.example.com"), vec!["ads.example.com"]);
    }

    #[test]
    fn test_numeric_host_is_not_rewritten_as_ipv4() {
        assert!(domains("0.0.0.0 1234").is_empty());
        assert!(domains("0.0.0.0 0x7f.1").is_empty());
        assert_eq!(
            domains("0.0.0.0 ads.example.com 1234 trk.example.com"),
            vec!["ads.example.com"]
        );
    }

    #[test]
    fn test_percent_escape_is_not_decoded() {
        assert!(domains("0.0.0.0 a%41.com").is_empty());
    }

    #[test]
    fn test_leading_slash_stops_the_line() {
        assert!(domains("0.0.0.0 /ads.example.com").is_empty());
        assert!(domains("0.0.0.0 //ads.example.com trk.example.com").is_empty());
    }

    #[test]
    fn test_iterator_is_fused_after_stop() {
        let mut entries = extract_domains("0.0.0.0 localhost ads.example.com");
        assert_eq!(entries.next(), None);
        assert_eq!(entries.next(), None);
    }
}
