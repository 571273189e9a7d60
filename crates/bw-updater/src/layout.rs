//! Fixed artifact names inside the shared storage directory.

use std::path::{Path, PathBuf};

use bw_compiler::RuleFilePaths;

pub const DOWNLOADED_BLOCKLIST: &str = "downloadedBlocklist.txt";
pub const BLOCKER_LIST: &str = "blockerList.json";
pub const WILDCARD_BLOCKER_LIST: &str = "wildcardBlockerList.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Paths of every artifact owned by the update pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    dir: PathBuf,
}

impl StorageLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Transient staging file for the raw download.
    pub fn download_path(&self) -> PathBuf {
        self.dir.join(DOWNLOADED_BLOCKLIST)
    }

    pub fn rule_files(&self) -> RuleFilePaths {
        RuleFilePaths {
            exact: self.dir.join(BLOCKER_LIST),
            wildcard: self.dir.join(WILDCARD_BLOCKER_LIST),
        }
    }

    /// Rule file the content filter should load.
    pub fn active_rule_file(&self, block_subdomains: bool) -> PathBuf {
        let files = self.rule_files();
        if block_subdomains {
            files.wildcard
        } else {
            files.exact
        }
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }
}
