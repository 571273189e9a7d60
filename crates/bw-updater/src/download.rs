//! Download into the staging file
//!
//! The body is streamed into a temp file beside the staging path and then
//! renamed over it, so the staging file is either absent or complete.

use std::fs;
use std::io;
use std::path::PathBuf;

use url::Url;

use bw_core::UpdateError;

use crate::http::{FetchError, HttpClient};
use crate::layout::StorageLayout;

/// Download `url` to the layout's staging path and return that path.
pub async fn download<C: HttpClient>(client: &C, url: &Url, layout: &StorageLayout) -> Result<PathBuf, UpdateError> {
    let target = layout.download_path();
    let save_error = |e: io::Error| {
        log::error!("Failed to save download to '{}': {}", target.display(), e);
        UpdateError::ErrorSavingToLocalFilesystem
    };

    if let Err(e) = fs::remove_file(&target) {
        if e.kind() != io::ErrorKind::NotFound {
            return Err(save_error(e));
        }
    }
    fs::create_dir_all(layout.dir()).map_err(save_error)?;

    let mut staging = tempfile::NamedTempFile::new_in(layout.dir()).map_err(save_error)?;

    let bytes = match client.download(url, staging.as_file_mut()).await {
        Ok(bytes) => bytes,
        Err(FetchError::Io(e)) => return Err(save_error(e)),
        Err(e) => {
            log::warn!("GET {} failed: {}", url, e);
            return Err(UpdateError::ErrorDownloading);
        }
    };

    staging.persist(&target).map_err(|e| save_error(e.error))?;
    log::info!("Downloaded {} bytes from {}", bytes, url);

    Ok(target)
}

#[cfg(test)]
mod tests {
    use crate::testing::FakeClient;

    use super::*;

    fn url() -> Url {
        Url::parse("https://lists.example.com/hosts").unwrap()
    }

    #[tokio::test]
    async fn writes_body_to_staging_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        fs::write(layout.download_path(), "stale").unwrap();
        let client = FakeClient::serving(b"0.0.0.0 ads.example.com\n");

        let path = download(&client, &url(), &layout).await.unwrap();
        assert_eq!(path, layout.download_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.0.0.0 ads.example.com\n");
    }

    #[tokio::test]
    async fn http_error_removes_stale_download() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        fs::write(layout.download_path(), "stale").unwrap();
        let client = FakeClient::serving(b"").with_get_status(503);

        assert_eq!(download(&client, &url(), &layout).await, Err(UpdateError::ErrorDownloading));
        assert!(!layout.download_path().exists());
    }

    #[tokio::test]
    async fn sink_failure_is_a_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let client = FakeClient::serving(b"body").failing_sink();

        assert_eq!(
            download(&client, &url(), &layout).await,
            Err(UpdateError::ErrorSavingToLocalFilesystem)
        );
    }
}
