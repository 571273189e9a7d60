//! Blockwright Rule List Compiler
//!
//! This crate turns a downloaded blocklist into content-blocker rule files.
//! Raw hosts files are streamed line by line into two rule lists (exact and
//! wildcard); lists that are already JSON rule arrays are validated and
//! installed unchanged.

pub mod compiler;
pub mod detect;
pub mod format;

pub use compiler::{compile_artifact, compile_hosts, CompileReport, RuleFilePaths, MAX_ENTRIES};
pub use detect::{detect, detect_file, validate_rule_list, ListFormat};
pub use format::{read_rule_list, ContentRule, RuleListWriter};
