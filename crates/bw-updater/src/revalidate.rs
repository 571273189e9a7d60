//! ETag revalidation
//!
//! A HEAD request decides whether the remote list changed since the last
//! successful fetch. The stored ETag lives on the `current` record.

use url::Url;

use bw_core::{BlocklistRecord, MetadataKey, StoreError, UpdateError, UpdateStatus};

use crate::http::HttpClient;

/// Check `url` against the ETag stored on `current`.
///
/// Returns `NoUpdateRequired` when the server's ETag equals the stored one,
/// otherwise `UpdateSuccessful` after recording the new ETag (or clearing it
/// when the server sends none, which makes every later check stale).
///
/// The new ETag is committed here, before the download and compile stages
/// run. If a later stage fails, the next revalidation reports
/// `NoUpdateRequired` for content that was never compiled. Callers that need
/// a retry must clear the ETag themselves.
pub async fn revalidate<C: HttpClient>(
    client: &C,
    url: &Url,
    current: &BlocklistRecord<'_>,
) -> Result<UpdateStatus, UpdateError> {
    let response = client.head(url).await.map_err(|e| {
        log::warn!("HEAD {} failed: {}", url, e);
        UpdateError::ServerNotFound
    })?;

    if response.status != 200 {
        log::warn!("HEAD {} returned HTTP {}", url, response.status);
        return Err(UpdateError::NoSuchFile);
    }

    record_etag(current, response.etag).map_err(|e| {
        log::error!("Failed to update stored ETag: {}", e);
        UpdateError::UnexpectedDownloadError
    })
}

fn record_etag(current: &BlocklistRecord<'_>, candidate: Option<String>) -> Result<UpdateStatus, StoreError> {
    let Some(candidate) = candidate else {
        log::debug!("server sent no ETag, clearing stored value");
        current.remove(MetadataKey::Etag)?;
        return Ok(UpdateStatus::UpdateSuccessful);
    };

    match current.etag()? {
        Some(stored) if stored == candidate => {
            log::debug!("ETag unchanged: {}", stored);
            Ok(UpdateStatus::NoUpdateRequired)
        }
        stored => {
            log::debug!("ETag changed: {:?} -> {}", stored, candidate);
            current.set(MetadataKey::Etag, &candidate)?;
            Ok(UpdateStatus::UpdateSuccessful)
        }
    }
}
