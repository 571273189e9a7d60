//! Hosts-file line classification
//!
//! Data lines in a hosts file start with an IP address, so anything whose
//! first character is not a lowercase hex digit is noise.

/// Result of classifying one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Host entry with any trailing `#` comment removed
    Data(&'a str),
    /// Blank line, comment, or anything else without a leading IP
    Skip,
}

/// Classify a single line of hosts-file text.
pub fn classify(line: &str) -> LineKind<'_> {
    match line.as_bytes().first() {
        Some(b) if is_data_start(*b) => LineKind::Data(strip_comment(line)),
        _ => LineKind::Skip,
    }
}

#[inline]
fn is_data_start(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

#[inline]
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
