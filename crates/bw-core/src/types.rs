//! Core type definitions for Blockwright
//!
//! The outcome enumeration doubles as the user-visible status of a run, so
//! every variant carries a display message.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Update outcomes
// =============================================================================

/// Failure kinds a blocklist update can end in.
///
/// Stages return `Result<_, UpdateError>`; the orchestrator folds the final
/// result into an [`UpdateStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum UpdateError {
    #[error("The blocklist URL must begin with \"https://\".")]
    NotHttps,
    #[error("The blocklist URL is not a valid URL.")]
    InvalidUrl,
    #[error("Unable to contact the server hosting the blocklist.")]
    ServerNotFound,
    #[error("The server does not have a file at that URL.")]
    NoSuchFile,
    #[error("An error occurred while downloading the blocklist.")]
    ErrorDownloading,
    #[error("Unable to save the downloaded blocklist.")]
    ErrorSavingToLocalFilesystem,
    #[error("The blocklist is JSON but is not a valid content-blocker rule list.")]
    InvalidJson,
    #[error("Unable to read the downloaded blocklist.")]
    ErrorParsingFile,
    #[error("Unable to save the compiled rule list.")]
    ErrorSavingParsedFile,
    #[error("Unable to replace the existing blocklist.")]
    UnableToReplaceExistingBlockerlist,
    #[error("An unexpected error occurred while updating the blocklist.")]
    UnexpectedDownloadError,
}

/// Terminal, user-visible result of a blocklist update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    UpdateSuccessful,
    NoUpdateRequired,
    /// Soft warning: the rule files were written but exceed the entry ceiling.
    TooManyEntries,
    NotHttps,
    InvalidUrl,
    ServerNotFound,
    NoSuchFile,
    ErrorDownloading,
    ErrorSavingToLocalFilesystem,
    InvalidJson,
    ErrorParsingFile,
    ErrorSavingParsedFile,
    UnableToReplaceExistingBlockerlist,
    UnexpectedDownloadError,
}

impl UpdateStatus {
    pub fn is_failure(self) -> bool {
        self.error().is_some()
    }

    /// The failure behind this status, if it is one.
    pub fn error(self) -> Option<UpdateError> {
        match self {
            Self::UpdateSuccessful | Self::NoUpdateRequired | Self::TooManyEntries => None,
            Self::NotHttps => Some(UpdateError::NotHttps),
            Self::InvalidUrl => Some(UpdateError::InvalidUrl),
            Self::ServerNotFound => Some(UpdateError::ServerNotFound),
            Self::NoSuchFile => Some(UpdateError::NoSuchFile),
            Self::ErrorDownloading => Some(UpdateError::ErrorDownloading),
            Self::ErrorSavingToLocalFilesystem => Some(UpdateError::ErrorSavingToLocalFilesystem),
            Self::InvalidJson => Some(UpdateError::InvalidJson),
            Self::ErrorParsingFile => Some(UpdateError::ErrorParsingFile),
            Self::ErrorSavingParsedFile => Some(UpdateError::ErrorSavingParsedFile),
            Self::UnableToReplaceExistingBlockerlist => Some(UpdateError::UnableToReplaceExistingBlockerlist),
            Self::UnexpectedDownloadError => Some(UpdateError::UnexpectedDownloadError),
        }
    }

    pub fn message(self) -> String {
        match self {
            Self::UpdateSuccessful => "The blocklist was updated successfully.".to_string(),
            Self::NoUpdateRequired => "The blocklist is already up to date.".to_string(),
            Self::TooManyEntries => {
                "The blocklist was loaded, but it has more than 50,000 entries and may not be fully applied."
                    .to_string()
            }
            failure => failure
                .error()
                .map(|e| e.to_string())
                .unwrap_or_default(),
        }
    }
}

impl From<UpdateError> for UpdateStatus {
    fn from(error: UpdateError) -> Self {
        match error {
            UpdateError::NotHttps => Self::NotHttps,
            UpdateError::InvalidUrl => Self::InvalidUrl,
            UpdateError::ServerNotFound => Self::ServerNotFound,
            UpdateError::NoSuchFile => Self::NoSuchFile,
            UpdateError::ErrorDownloading => Self::ErrorDownloading,
            UpdateError::ErrorSavingToLocalFilesystem => Self::ErrorSavingToLocalFilesystem,
            UpdateError::InvalidJson => Self::InvalidJson,
            UpdateError::ErrorParsingFile => Self::ErrorParsingFile,
            UpdateError::ErrorSavingParsedFile => Self::ErrorSavingParsedFile,
            UpdateError::UnableToReplaceExistingBlockerlist => Self::UnableToReplaceExistingBlockerlist,
            UpdateError::UnexpectedDownloadError => Self::UnexpectedDownloadError,
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

// =============================================================================
// Blocklist metadata
// =============================================================================

/// Format of the list a descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Raw hosts file compiled by Blockwright
    #[serde(rename = "hosts")]
    Hosts,
    /// Pre-compiled rule list passed through as-is
    #[serde(rename = "JSON")]
    Json,
    /// The bundled default list
    #[serde(rename = "built-in")]
    BuiltIn,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::Json => "JSON",
            Self::BuiltIn => "built-in",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hosts" => Ok(Self::Hosts),
            "JSON" => Ok(Self::Json),
            "built-in" => Ok(Self::BuiltIn),
            other => Err(format!("unknown file type '{}'", other)),
        }
    }
}

/// The four independently persisted blocklist records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListName {
    /// Bundled default list
    Preloaded,
    /// List whose rules are currently committed
    Current,
    /// List shown to the user
    Displayed,
    /// List staged for validation but not yet loaded
    Candidate,
}

impl ListName {
    pub const ALL: [ListName; 4] = [Self::Preloaded, Self::Current, Self::Displayed, Self::Candidate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preloaded => "preloaded",
            Self::Current => "current",
            Self::Displayed => "displayed",
            Self::Candidate => "candidate",
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields stored for each blocklist record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Url,
    FileType,
    EntryCount,
    Etag,
}

impl MetadataKey {
    pub const ALL: [MetadataKey; 4] = [Self::Url, Self::FileType, Self::EntryCount, Self::Etag];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::FileType => "FileType",
            Self::EntryCount => "EntryCount",
            Self::Etag => "Etag",
        }
    }
}
