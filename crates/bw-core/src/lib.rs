//! Blockwright Core Library
//!
//! Shared building blocks for fetching hosts-style blocklists and compiling
//! them into content-blocker rule files.
//!
//! # Modules
//!
//! - `types`: Outcome enumeration, list names, file types and metadata keys
//! - `line`: Classifies raw hosts-file lines into data lines and noise
//! - `domain`: Extracts normalized domain entries from a data line
//! - `store`: Key-value metadata store and the named blocklist records
//! - `settings`: Process-wide flags persisted through the metadata store

pub mod domain;
pub mod line;
pub mod settings;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use domain::{extract_domains, DomainEntries};
pub use line::{classify, LineKind};
pub use settings::Settings;
pub use store::{BlocklistDescriptor, BlocklistRecord, JsonFileStore, MemoryStore, MetadataStore, StoreError};
pub use types::{FileType, ListName, MetadataKey, UpdateError, UpdateStatus};
