//! Blocklist acquisition pipeline
//!
//! A refresh runs these stages strictly in order:
//!
//! ```text
//! Validating -> Revalidating -> Downloading -> Compiling -> Committing
//!                     |
//!                     +-> NoUpdateRequired
//! ```
//!
//! Any stage can end the run with an [`UpdateError`]. Nothing is retried and
//! committed metadata is only touched by the Committing stage, with the
//! exception of the ETag written during revalidation.

use std::fmt;
use std::sync::Arc;

use url::Url;

use bw_compiler::{compile_artifact, CompileReport};
use bw_core::{
    BlocklistDescriptor, BlocklistRecord, FileType, ListName, MetadataKey, MetadataStore, Settings,
    StoreError, UpdateError, UpdateStatus,
};

use crate::download::download;
use crate::http::HttpClient;
use crate::layout::StorageLayout;
use crate::reload::ReloadSignal;
use crate::revalidate::revalidate;

/// Outcome of one refresh, with list metadata on success paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub status: UpdateStatus,
    pub file_type: Option<FileType>,
    pub entry_count: Option<u64>,
}

impl UpdateReport {
    fn without_metadata(status: UpdateStatus) -> Self {
        Self {
            status,
            file_type: None,
            entry_count: None,
        }
    }

    pub fn failed(error: UpdateError) -> Self {
        Self::without_metadata(error.into())
    }
}

impl From<CompileReport> for UpdateReport {
    fn from(report: CompileReport) -> Self {
        Self {
            status: report.status,
            file_type: Some(report.file_type),
            entry_count: Some(report.entry_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    Revalidating,
    Downloading,
    Compiling,
    Committing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Revalidating => "revalidating",
            Self::Downloading => "downloading",
            Self::Compiling => "compiling",
            Self::Committing => "committing",
        };
        f.write_str(name)
    }
}

/// Check that `input` is an `https://` URL.
///
/// The scheme is checked textually before parsing, so a non-HTTPS source is
/// rejected even when it is also malformed.
pub fn validate_source(input: &str) -> Result<Url, UpdateError> {
    let is_https = input
        .get(..8)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("https://"));
    if !is_https {
        return Err(UpdateError::NotHttps);
    }

    Url::parse(input).map_err(|e| {
        log::warn!("Invalid blocklist URL '{}': {}", input, e);
        UpdateError::InvalidUrl
    })
}

/// Drives refreshes and the fallback actions around them.
///
/// The updater does not serialise concurrent refreshes; callers check
/// [`Updater::is_reloading`] before starting one.
pub struct Updater<C> {
    client: C,
    store: Arc<dyn MetadataStore>,
    reload: Arc<dyn ReloadSignal>,
    layout: StorageLayout,
}

impl<C: HttpClient> Updater<C> {
    pub fn new(client: C, store: Arc<dyn MetadataStore>, reload: Arc<dyn ReloadSignal>, layout: StorageLayout) -> Self {
        Self {
            client,
            store,
            reload,
            layout,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn record(&self, name: ListName) -> BlocklistRecord<'_> {
        BlocklistRecord::new(name, self.store.as_ref())
    }

    pub fn settings(&self) -> Settings<'_> {
        Settings::new(self.store.as_ref())
    }

    pub fn is_reloading(&self) -> Result<bool, StoreError> {
        self.settings().is_reloading()
    }

    /// Fetch, compile and commit the blocklist at `input`.
    pub async fn refresh(&self, input: &str) -> UpdateReport {
        let _reloading = ReloadingFlag::raise(self.settings());

        let report = match self.run(input).await {
            Ok(report) => report,
            Err(error) => UpdateReport::failed(error),
        };

        match report.status.error() {
            Some(error) => log::warn!("Blocklist update from '{}' failed: {}", input, error),
            None => log::info!("Blocklist update from '{}': {:?}", input, report.status),
        }
        report
    }

    async fn run(&self, input: &str) -> Result<UpdateReport, UpdateError> {
        enter(Stage::Validating);
        let url = validate_source(input)?;

        enter(Stage::Revalidating);
        let current = self.record(ListName::Current);
        if revalidate(&self.client, &url, &current).await? == UpdateStatus::NoUpdateRequired {
            return Ok(UpdateReport::without_metadata(UpdateStatus::NoUpdateRequired));
        }

        enter(Stage::Downloading);
        let raw = download(&self.client, &url, &self.layout).await?;

        enter(Stage::Compiling);
        let paths = self.layout.rule_files();
        let compiled = tokio::task::spawn_blocking(move || compile_artifact(&raw, &paths))
            .await
            .map_err(|e| {
                log::error!("Compilation task failed: {}", e);
                UpdateError::UnexpectedDownloadError
            })??;

        enter(Stage::Committing);
        self.commit(&url, &compiled).map_err(|e| {
            log::error!("Failed to commit blocklist metadata: {}", e);
            UpdateError::UnableToReplaceExistingBlockerlist
        })?;
        self.signal_reload();

        Ok(compiled.into())
    }

    fn commit(&self, url: &Url, compiled: &CompileReport) -> Result<(), StoreError> {
        let current = self.record(ListName::Current);
        current.set_file_type(compiled.file_type)?;
        current.set_entry_count(compiled.entry_count)?;
        current.set(MetadataKey::Url, url.as_str())?;
        self.record(ListName::Candidate).remove_all()?;

        let settings = self.settings();
        settings.set_downloaded_list_type(compiled.file_type.as_str())?;
        if compiled.file_type == FileType::Json {
            // pre-compiled lists have no wildcard rule file
            settings.set_block_subdomains(false)?;
        }
        Ok(())
    }

    /// Record `url` as the displayed and candidate list before a refresh.
    pub fn stage_candidate(&self, url: &str) -> Result<(), StoreError> {
        self.record(ListName::Displayed).set(MetadataKey::Url, url)?;
        self.record(ListName::Candidate).set(MetadataKey::Url, url)
    }

    /// Write the bundled list's metadata into the preloaded record.
    pub fn seed_preloaded(&self, descriptor: &BlocklistDescriptor) -> Result<(), StoreError> {
        self.record(ListName::Preloaded).write_descriptor(descriptor)
    }

    /// Stop using the custom list and point `current` back at the preloaded one.
    pub fn fall_back_to_preloaded(&self) -> Result<(), StoreError> {
        self.settings().set_use_custom_blocklist(false)?;
        self.record(ListName::Current)
            .copy_from(&self.record(ListName::Preloaded))?;
        self.signal_reload();
        Ok(())
    }

    /// Reset every record and flag to the out-of-the-box state.
    pub fn restore_defaults(&self) -> Result<(), StoreError> {
        let preloaded = self.record(ListName::Preloaded);

        self.record(ListName::Candidate).remove_all()?;
        self.record(ListName::Current).copy_from(&preloaded)?;

        let displayed = self.record(ListName::Displayed);
        displayed.remove_all()?;
        if let Some(url) = preloaded.url()? {
            displayed.set(MetadataKey::Url, &url)?;
        }

        let settings = self.settings();
        settings.set_block_subdomains(false)?;
        settings.set_use_custom_blocklist(false)?;
        self.signal_reload();
        Ok(())
    }

    /// Turn wildcard (subdomain) blocking on or off and reload.
    ///
    /// Returns the effective setting: a pre-compiled JSON list has no
    /// wildcard rule file, so it always stays off.
    pub fn set_block_subdomains(&self, enabled: bool) -> Result<bool, StoreError> {
        let settings = self.settings();
        let custom_json = settings.use_custom_blocklist()?
            && self.record(ListName::Current).file_type()? == Some(FileType::Json);
        let effective = enabled && !custom_json;
        if enabled && !effective {
            log::warn!("Subdomain blocking is unavailable for pre-compiled JSON lists");
        }

        settings.set_block_subdomains(effective)?;
        self.signal_reload();
        Ok(effective)
    }

    fn signal_reload(&self) {
        if let Err(e) = self.reload.reload() {
            log::warn!("Content filter reload failed: {}", e);
        }
    }
}

fn enter(stage: Stage) {
    log::debug!("update stage: {}", stage);
}

/// Holds the process-wide reloading flag for the duration of a run.
struct ReloadingFlag<'a> {
    settings: Settings<'a>,
}

impl<'a> ReloadingFlag<'a> {
    fn raise(settings: Settings<'a>) -> Self {
        if let Err(e) = settings.set_reloading(true) {
            log::warn!("Failed to set reloading flag: {}", e);
        }
        Self { settings }
    }
}

impl Drop for ReloadingFlag<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.settings.set_reloading(false) {
            log::warn!("Failed to clear reloading flag: {}", e);
        }
    }
}
