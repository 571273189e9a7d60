//! Content-blocker rule list format
//!
//! A compiled list is a JSON array of exactly two rules: a fixed rule that
//! blocks third-party scripts everywhere, followed by one block rule whose
//! `if-domain` array carries every listed domain.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Fixed first rule of every compiled list.
pub const THIRD_PARTY_SCRIPT_RULE: &str = r#"{"action":{"type":"block"},"trigger":{"url-filter":".*","resource-type":["script"],"load-type":["third-party"]}}"#;

const DOMAIN_RULE_OPEN: &str = r#"{"action":{"type":"block"},"trigger":{"url-filter":".*","if-domain":["#;
const DOMAIN_RULE_CLOSE: &str = "]}}]";

/// Prefix marking an `if-domain` entry as covering all subdomains.
pub const WILDCARD_PREFIX: char = '*';

/// Streams a rule list to `W` without holding the domain list in memory.
///
/// The header is written when the writer is created; [`RuleListWriter::finish`]
/// closes the JSON structure. A writer dropped without `finish` leaves a
/// truncated document behind.
pub struct RuleListWriter<W: Write> {
    inner: W,
    prefix: Option<char>,
    entries: u64,
}

impl<W: Write> RuleListWriter<W> {
    /// Writer for the exact-match list.
    pub fn exact(inner: W) -> io::Result<Self> {
        Self::new(inner, None)
    }

    /// Writer for the wildcard list; every domain gets a `*` prefix.
    pub fn wildcard(inner: W) -> io::Result<Self> {
        Self::new(inner, Some(WILDCARD_PREFIX))
    }

    fn new(mut inner: W, prefix: Option<char>) -> io::Result<Self> {
        inner.write_all(b"[")?;
        inner.write_all(THIRD_PARTY_SCRIPT_RULE.as_bytes())?;
        inner.write_all(b",")?;
        inner.write_all(DOMAIN_RULE_OPEN.as_bytes())?;
        Ok(Self {
            inner,
            prefix,
            entries: 0,
        })
    }

    /// Append one domain to the `if-domain` list.
    pub fn push(&mut self, domain: &str) -> io::Result<()> {
        if self.entries > 0 {
            self.inner.write_all(b",")?;
        }

        let entry = match self.prefix {
            Some(prefix) => format!("{}{}", prefix, domain),
            None => domain.to_string(),
        };
        serde_json::to_writer(&mut self.inner, &entry).map_err(io::Error::from)?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Close the JSON document, flush, and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(DOMAIN_RULE_CLOSE.as_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

// =============================================================================
// Typed view (for validation and inspection)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRule {
    pub action: RuleAction,
    pub trigger: RuleTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleTrigger {
    pub url_filter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_domain: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_type: Option<Vec<String>>,
}

/// Read a committed rule list back into typed rules.
pub fn read_rule_list(path: &Path) -> io::Result<Vec<ContentRule>> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(io::Error::from)
}
