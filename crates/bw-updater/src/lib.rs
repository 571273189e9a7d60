//! Blockwright Updater
//!
//! Fetches a remote blocklist when its ETag changes, compiles it with
//! `bw-compiler`, and commits the resulting metadata.
//!
//! # Modules
//!
//! - `http`: HTTP client seam and the `reqwest` implementation
//! - `layout`: Fixed artifact names inside the storage directory
//! - `revalidate`: HEAD-based ETag revalidation
//! - `download`: Streaming download into the staging file
//! - `reload`: Signal telling the content filter to reload its rules
//! - `updater`: The acquisition pipeline and fallback actions
//! - `worker`: Background execution with a notification channel

pub mod download;
pub mod http;
pub mod layout;
pub mod reload;
pub mod revalidate;
pub mod updater;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use http::{FetchError, HeadResponse, HttpClient, ReqwestClient};
pub use layout::StorageLayout;
pub use reload::{CommandReload, LogReload, ReloadError, ReloadSignal};
pub use updater::{validate_source, UpdateReport, Updater};
pub use worker::{spawn_refresh, Notice};
