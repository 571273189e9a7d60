//! Rule compiler
//!
//! Streams a downloaded list into the committed rule files. Hosts files are
//! read one line at a time and written to the exact and wildcard lists in
//! lockstep; pre-compiled JSON lists are validated and moved over the exact
//! list only.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use bw_core::{classify, extract_domains, FileType, LineKind, UpdateError, UpdateStatus};

use crate::detect::{detect_file, validate_rule_list, ListFormat};
use crate::format::RuleListWriter;

/// Entry count above which a compiled list is reported as `TooManyEntries`.
pub const MAX_ENTRIES: u64 = 50_000;

/// Locations of the two committed rule files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFilePaths {
    pub exact: PathBuf,
    pub wildcard: PathBuf,
}

/// Result of a successful compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileReport {
    /// `UpdateSuccessful` or `TooManyEntries`
    pub status: UpdateStatus,
    pub file_type: FileType,
    pub entry_count: u64,
}

/// Compile a downloaded list into the rule files at `paths`.
///
/// The raw artifact is consumed: it is moved into place (JSON lists) or
/// deleted once compilation ends, whatever the outcome.
pub fn compile_artifact(raw: &Path, paths: &RuleFilePaths) -> Result<CompileReport, UpdateError> {
    let _raw = RawArtifact(raw);

    let (file_type, entry_count) = match detect_file(raw)? {
        ListFormat::Structured(elements) => {
            let count = validate_rule_list(&elements)?;
            drop(elements);
            install_rule_list(raw, &paths.exact)?;
            (FileType::Json, count)
        }
        ListFormat::Raw => (FileType::Hosts, compile_hosts_file(raw, paths)?),
    };

    let status = if entry_count > MAX_ENTRIES {
        log::warn!("{} entries exceeds the {} entry limit", entry_count, MAX_ENTRIES);
        UpdateStatus::TooManyEntries
    } else {
        UpdateStatus::UpdateSuccessful
    };

    log::info!("Compiled {} list with {} entries", file_type, entry_count);

    Ok(CompileReport {
        status,
        file_type,
        entry_count,
    })
}

/// Stream hosts-file text from `input` into both rule writers.
///
/// Returns the number of domain entries written to each list.
pub fn compile_hosts<R, E, W>(
    mut input: R,
    exact: &mut RuleListWriter<E>,
    wildcard: &mut RuleListWriter<W>,
) -> Result<u64, UpdateError>
where
    R: BufRead,
    E: Write,
    W: Write,
{
    let mut buf = Vec::new();
    let mut entry_count = 0u64;

    loop {
        buf.clear();
        let read = input.read_until(b'\n', &mut buf).map_err(|e| {
            log::error!("Failed to read hosts file: {}", e);
            UpdateError::ErrorParsingFile
        })?;
        if read == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(&['\n', '\r'][..]);

        let LineKind::Data(data) = classify(line) else {
            continue;
        };

        for domain in extract_domains(data) {
            exact.push(&domain).map_err(write_error)?;
            wildcard.push(&domain).map_err(write_error)?;
            entry_count += 1;
        }
    }

    Ok(entry_count)
}

fn compile_hosts_file(raw: &Path, paths: &RuleFilePaths) -> Result<u64, UpdateError> {
    let input = File::open(raw).map_err(|e| {
        log::error!("Failed to open '{}': {}", raw.display(), e);
        UpdateError::ErrorParsingFile
    })?;

    remove_stale(&paths.exact);
    remove_stale(&paths.wildcard);

    let mut exact = RuleListWriter::exact(create_output(&paths.exact)?).map_err(write_error)?;
    let mut wildcard = RuleListWriter::wildcard(create_output(&paths.wildcard)?).map_err(write_error)?;

    let entry_count = compile_hosts(BufReader::new(input), &mut exact, &mut wildcard)?;

    exact.finish().map_err(write_error)?;
    wildcard.finish().map_err(write_error)?;

    Ok(entry_count)
}

fn install_rule_list(raw: &Path, exact: &Path) -> Result<(), UpdateError> {
    remove_stale(exact);
    fs::rename(raw, exact).map_err(|e| {
        log::error!("Failed to move '{}' to '{}': {}", raw.display(), exact.display(), e);
        UpdateError::ErrorSavingToLocalFilesystem
    })
}

fn create_output(path: &Path) -> Result<BufWriter<File>, UpdateError> {
    File::create(path).map(BufWriter::new).map_err(|e| {
        log::error!("Failed to create '{}': {}", path.display(), e);
        UpdateError::ErrorSavingParsedFile
    })
}

fn write_error(e: io::Error) -> UpdateError {
    log::error!("Failed to write rule list: {}", e);
    UpdateError::ErrorSavingParsedFile
}

fn remove_stale(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("Failed to remove '{}': {}", path.display(), e);
        }
    }
}

/// Deletes the downloaded artifact when compilation ends.
struct RawArtifact<'a>(&'a Path);

impl Drop for RawArtifact<'_> {
    fn drop(&mut self) {
        remove_stale(self.0);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::format::{read_rule_list, ContentRule};

    use super::*;

    fn paths(dir: &Path) -> RuleFilePaths {
        RuleFilePaths {
            exact: dir.join("blockerList.json"),
            wildcard: dir.join("wildcardBlockerList.json"),
        }
    }

    fn if_domain(rules: &[ContentRule]) -> Vec<String> {
        assert_eq!(rules.len(), 2);
        rules[1].trigger.if_domain.clone().expect("if-domain present")
    }

    #[test]
    fn compiles_hosts_into_both_lists() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("downloadedBlocklist.txt");
        fs::write(
            &raw,
            "# Title: test hosts\n\
             127.0.0.1 localhost\n\
             ::1 localhost\n\
             0.0.0.0 ads.example.com\r\n\
             10.0.0.1 trk.example.com pixel.example.net # tracker\n\
             \n\
             0.0.0.0 Banner.Example.ORG",
        )
        .unwrap();
        let paths = paths(dir.path());

        let report = compile_artifact(&raw, &paths).unwrap();
        assert_eq!(
            report,
            CompileReport {
                status: UpdateStatus::UpdateSuccessful,
                file_type: FileType::Hosts,
                entry_count: 4,
            }
        );

        let exact = if_domain(&read_rule_list(&paths.exact).unwrap());
        assert_eq!(
            exact,
            vec!["ads.example.com", "trk.example.com", "pixel.example.net", "banner.example.org"]
        );

        let wildcard = if_domain(&read_rule_list(&paths.wildcard).unwrap());
        assert_eq!(
            wildcard,
            vec!["*ads.example.com", "*trk.example.com", "*pixel.example.net", "*banner.example.org"]
        );

        assert!(!raw.exists(), "raw artifact should be deleted");
    }

    #[test]
    fn localhost_never_reaches_the_output() {
        let mut exact = RuleListWriter::exact(Vec::new()).unwrap();
        let mut wildcard = RuleListWriter::wildcard(Vec::new()).unwrap();
        let input = "127.0.0.1 localhost\n127.0.0.1 LOCALHOST\n0.0.0.0 ads.example.com localhost.lan\n";

        let count = compile_hosts(Cursor::new(input), &mut exact, &mut wildcard).unwrap();
        assert_eq!(count, 1);

        for bytes in [exact.finish().unwrap(), wildcard.finish().unwrap()] {
            let text = String::from_utf8(bytes).unwrap();
            assert!(!text.to_ascii_lowercase().contains("localhost"));
        }
    }

    #[test]
    fn entry_counts_match_n_unique_domains() {
        let n = 250;
        let input: String = (0..n).map(|i| format!("0.0.0.0 host{}.example.com\n", i)).collect();
        let mut exact = RuleListWriter::exact(Vec::new()).unwrap();
        let mut wildcard = RuleListWriter::wildcard(Vec::new()).unwrap();

        let count = compile_hosts(Cursor::new(input), &mut exact, &mut wildcard).unwrap();
        assert_eq!(count, n);
        assert_eq!(exact.entries(), n);
        assert_eq!(wildcard.entries(), n);

        let exact: Vec<ContentRule> = serde_json::from_slice(&exact.finish().unwrap()).unwrap();
        let wildcard: Vec<ContentRule> = serde_json::from_slice(&wildcard.finish().unwrap()).unwrap();
        assert_eq!(if_domain(&exact).len() as u64, n);
        assert!(if_domain(&wildcard).iter().all(|d| d.starts_with('*')));
    }

    #[test]
    fn too_many_entries_still_writes_lists() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("downloadedBlocklist.txt");
        let hosts: String = (0..=MAX_ENTRIES)
            .map(|i| format!("0.0.0.0 h{}.example.com\n", i))
            .collect();
        fs::write(&raw, hosts).unwrap();
        let paths = paths(dir.path());

        let report = compile_artifact(&raw, &paths).unwrap();
        assert_eq!(report.status, UpdateStatus::TooManyEntries);
        assert_eq!(report.entry_count, MAX_ENTRIES + 1);
        assert!(paths.exact.exists());
        assert!(paths.wildcard.exists());
    }

    #[test]
    fn exactly_max_entries_is_not_a_warning() {
        let input: String = (0..MAX_ENTRIES).map(|i| format!("0.0.0.0 h{}.example.com\n", i)).collect();
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("downloadedBlocklist.txt");
        fs::write(&raw, input).unwrap();

        let report = compile_artifact(&raw, &paths(dir.path())).unwrap();
        assert_eq!(report.status, UpdateStatus::UpdateSuccessful);
    }

    #[test]
    fn replaces_previous_rule_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        fs::write(&paths.exact, "old").unwrap();
        fs::write(&paths.wildcard, "old").unwrap();

        let raw = dir.path().join("downloadedBlocklist.txt");
        fs::write(&raw, "0.0.0.0 ads.example.com\n").unwrap();
        compile_artifact(&raw, &paths).unwrap();

        assert_eq!(if_domain(&read_rule_list(&paths.exact).unwrap()), vec!["ads.example.com"]);
        assert_eq!(if_domain(&read_rule_list(&paths.wildcard).unwrap()), vec!["*ads.example.com"]);
    }

    #[test]
    fn structured_list_moves_into_exact_only() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        fs::write(&paths.wildcard, "previous wildcard").unwrap();

        let list = r#"[
            {"action":{"type":"block"},"trigger":{"url-filter":"ads"}},
            {"action":{"type":"css-display-none","selector":".ad"},"trigger":{"url-filter":".*"}},
            {"action":{"type":"block"},"trigger":{"url-filter":"track"}}
        ]"#;
        let raw = dir.path().join("downloadedBlocklist.txt");
        fs::write(&raw, list).unwrap();

        let report = compile_artifact(&raw, &paths).unwrap();
        assert_eq!(report.file_type, FileType::Json);
        assert_eq!(report.entry_count, 3);
        assert_eq!(report.status, UpdateStatus::UpdateSuccessful);

        assert_eq!(fs::read_to_string(&paths.exact).unwrap(), list);
        assert_eq!(fs::read_to_string(&paths.wildcard).unwrap(), "previous wildcard");
        assert!(!raw.exists());
    }

    #[test]
    fn invalid_structured_list_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        fs::write(&paths.exact, "committed").unwrap();

        let raw = dir.path().join("downloadedBlocklist.txt");
        fs::write(&raw, r#"[{"action":{"type":"block"},"trigger":{}},{"action":{}}]"#).unwrap();

        assert_eq!(compile_artifact(&raw, &paths), Err(UpdateError::InvalidJson));
        assert_eq!(fs::read_to_string(&paths.exact).unwrap(), "committed");
        assert!(!paths.wildcard.exists());
    }

    #[test]
    fn missing_raw_artifact_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("downloadedBlocklist.txt");
        assert_eq!(
            compile_artifact(&raw, &paths(dir.path())),
            Err(UpdateError::ErrorParsingFile)
        );
    }

    #[test]
    fn unwritable_output_is_a_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("downloadedBlocklist.txt");
        fs::write(&raw, "0.0.0.0 ads.example.com\n").unwrap();
        let paths = RuleFilePaths {
            exact: dir.path().join("missing").join("blockerList.json"),
            wildcard: dir.path().join("wildcardBlockerList.json"),
        };

        assert_eq!(compile_artifact(&raw, &paths), Err(UpdateError::ErrorSavingParsedFile));
    }

    #[test]
    fn non_utf8_bytes_do_not_abort_compilation() {
        let mut exact = RuleListWriter::exact(Vec::new()).unwrap();
        let mut wildcard = RuleListWriter::wildcard(Vec::new()).unwrap();
        let input: &[u8] = b"# \xff\xfe junk\n0.0.0.0 ads.example.com\n";

        let count = compile_hosts(Cursor::new(input), &mut exact, &mut wildcard).unwrap();
        assert_eq!(count, 1);
    }
}
