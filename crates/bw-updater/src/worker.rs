//! Background refresh with a single notification channel
//!
//! Network and file work runs on a tokio task; progress is reported to one
//! receiver, typically the front-end that shows activity and the final
//! status message.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use bw_core::UpdateError;

use crate::http::HttpClient;
use crate::updater::{UpdateReport, Updater};

/// Message posted to the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Activity started for this source
    Started { url: String },
    /// Activity ended; always sent exactly once per refresh
    Finished(UpdateReport),
}

/// Run a refresh of `url` in the background.
pub fn spawn_refresh<C>(updater: Arc<Updater<C>>, url: String, notices: UnboundedSender<Notice>) -> JoinHandle<()>
where
    C: HttpClient + 'static,
{
    tokio::spawn(async move {
        if notices.send(Notice::Started { url: url.clone() }).is_err() {
            log::debug!("notification receiver dropped before refresh started");
        }

        let mut finished = FinishedNotice {
            notices,
            report: UpdateReport::failed(UpdateError::UnexpectedDownloadError),
        };
        finished.report = updater.refresh(&url).await;
    })
}

/// Sends `Notice::Finished` when dropped.
///
/// A panicking refresh still reports through this guard only in unwinding
/// builds; release builds set `panic = "abort"` and send nothing.
struct FinishedNotice {
    notices: UnboundedSender<Notice>,
    report: UpdateReport,
}

impl Drop for FinishedNotice {
    fn drop(&mut self) {
        if self.notices.send(Notice::Finished(self.report)).is_err() {
            log::debug!("notification receiver dropped before refresh finished");
        }
    }
}
