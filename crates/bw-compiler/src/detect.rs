//! Downloaded list format detection
//!
//! A download that parses as a JSON array is treated as a pre-compiled rule
//! list and must pass structural validation as a whole. Anything else is a
//! raw hosts file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;

use bw_core::UpdateError;

/// Detected shape of a downloaded list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListFormat {
    /// Hosts-file text that needs compiling
    Raw,
    /// Already a JSON rule array (not yet validated)
    Structured(Vec<Value>),
}

/// Detect the format of a list read from `reader`.
///
/// Non-JSON input is rejected by the parser at its first bytes, so large
/// hosts files are not buffered here.
pub fn detect<R: Read>(reader: R) -> ListFormat {
    match serde_json::from_reader::<_, Vec<Value>>(reader) {
        Ok(elements) => ListFormat::Structured(elements),
        Err(e) => {
            log::debug!("not a JSON rule list ({}), treating as hosts file", e);
            ListFormat::Raw
        }
    }
}

pub fn detect_file(path: &Path) -> Result<ListFormat, UpdateError> {
    let file = File::open(path).map_err(|e| {
        log::error!("Failed to open '{}': {}", path.display(), e);
        UpdateError::ErrorParsingFile
    })?;
    Ok(detect(BufReader::new(file)))
}

/// Validate a pre-compiled rule list and return its rule count.
///
/// Every element must be an object with exactly two object-valued keys,
/// `action` and `trigger` (matched case-insensitively). The first violation
/// rejects the whole list.
pub fn validate_rule_list(elements: &[Value]) -> Result<u64, UpdateError> {
    let mut count = 0u64;

    for (index, element) in elements.iter().enumerate() {
        let Some(rule) = element.as_object() else {
            log::warn!("rule {} is not an object", index);
            return Err(UpdateError::InvalidJson);
        };

        if rule.len() != 2 || !rule.values().all(Value::is_object) {
            log::warn!("rule {} does not have exactly two object fields", index);
            return Err(UpdateError::InvalidJson);
        }

        let has_key = |name: &str| rule.keys().any(|k| k.eq_ignore_ascii_case(name));
        if !has_key("action") || !has_key("trigger") {
            log::warn!("rule {} is missing action or trigger", index);
            return Err(UpdateError::InvalidJson);
        }

        count += 1;
    }

    Ok(count)
}
